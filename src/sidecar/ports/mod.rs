//! Port contracts for talking to the in-pod API.

mod agent;
mod error;
mod relay;

pub use agent::AgentRunner;
pub use error::{SidecarError, SidecarResult};
pub use relay::{ByteStream, FrameSink, FrameStream, RelayedStream, SidecarRelay, UpstreamSocket};

#[cfg(test)]
pub use relay::MockSidecarRelay;
