//! In-memory adapters for task tests and local runs.

mod repository;

pub use repository::InMemoryTaskRepository;
