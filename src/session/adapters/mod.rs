//! Adapter implementations for session persistence.

pub mod memory;
pub mod postgres;
