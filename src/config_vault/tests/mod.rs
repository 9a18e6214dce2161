//! Unit tests for the configuration vault module.

mod domain_tests;
mod service_tests;
