//! Unit tests for the workspace lifecycle module.
