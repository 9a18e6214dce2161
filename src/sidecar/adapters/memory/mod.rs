//! In-memory sidecar adapters for tests.

mod sidecar;

pub use sidecar::{InMemorySidecar, WatchPeer};
