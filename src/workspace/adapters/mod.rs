//! Adapter implementations for workspace ports.

pub mod docker;
pub mod memory;
pub mod postgres;
