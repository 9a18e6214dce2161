//! Port contracts for session persistence.

mod repository;

pub use repository::{SessionRepository, SessionRepositoryError, SessionRepositoryResult};
