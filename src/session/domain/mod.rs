//! Domain model for execution sessions.

mod error;
mod ids;
mod session;

pub use error::{ParseSessionStatusError, SessionDomainError};
pub use ids::SessionId;
pub use session::{PersistedSessionData, Session, SessionStatus};
