//! Unit tests for the interaction hub.

mod hub_tests;
