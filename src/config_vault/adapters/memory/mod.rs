//! In-memory adapter for the configuration log.

mod repository;

pub use repository::InMemoryConfigRepository;
