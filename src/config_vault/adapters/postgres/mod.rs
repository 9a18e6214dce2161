//! `PostgreSQL` adapter for the configuration log.

mod models;
mod repository;
mod schema;

pub use repository::PostgresConfigRepository;
