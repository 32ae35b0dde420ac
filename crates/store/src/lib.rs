//! Storage backends for Shopdesk.
//!
//! Both backends implement `CatalogStore` (read-only customer, order, and
//! product queries) and `ConversationStore` (append-only turn history).
//!
//! Backends:
//! - **SQLite**: production backend on a single `sqlx` pool
//! - **In-memory**: for tests and demos; counts catalog queries

pub mod in_memory;
pub mod seed;
pub mod sqlite;

pub use in_memory::InMemoryStore;
pub use seed::{CatalogSeed, SeedSummary};
pub use sqlite::SqliteStore;
