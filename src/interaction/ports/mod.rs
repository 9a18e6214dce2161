//! Port contracts for interaction persistence.

mod repository;

pub use repository::{InteractionRepository, InteractionRepositoryError, InteractionRepositoryResult};
