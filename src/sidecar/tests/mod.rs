//! Unit tests for the sidecar relay.

mod domain_tests;
