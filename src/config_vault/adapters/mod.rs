//! Adapter implementations for the configuration vault ports.

pub mod aes;
pub mod memory;
pub mod postgres;
