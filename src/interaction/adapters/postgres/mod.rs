//! `PostgreSQL` adapter for interaction persistence.

mod models;
mod repository;
mod schema;

pub use repository::PostgresInteractionRepository;
