//! Sidecar adapter implementations.

pub mod http;
pub mod memory;
