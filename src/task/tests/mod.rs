//! Unit tests for the task board and the execution coordinator.

mod board_tests;
