//! Application services for the session lifecycle.

mod lifecycle;

pub use lifecycle::{SessionLifecycleService, SessionServiceError, SessionServiceResult};
