//! In-memory adapters for session tests and local runs.

mod repository;

pub use repository::InMemorySessionRepository;
