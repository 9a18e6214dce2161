//! Unit tests for the session lifecycle module.

mod domain_tests;
