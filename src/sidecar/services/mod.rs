//! Application services for the sidecar relay.

mod bridge;
mod cancellation;
mod proxy;

pub use bridge::{BridgeOutcome, PumpExit, bridge};
pub use cancellation::CancellationRegistry;
pub use proxy::{SidecarProxy, SidecarServiceError, SidecarServiceResult};
