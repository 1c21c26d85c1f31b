//! In-memory storage - used when no database is configured, and in tests.
//!
//! Applies the same unique and foreign-key rules as the PostgreSQL schema.
//! Note: Data is lost on process restart.

mod repositories;
mod store;

pub use repositories::{
    InMemoryCategoryRepository, InMemoryCommentRepository, InMemoryLocationRepository,
    InMemoryPostRepository, InMemoryRepository, InMemoryUserRepository,
};
pub use store::InMemoryStore;
