//! In-memory interaction adapters.

mod repository;

pub use repository::InMemoryInteractionRepository;
