//! Repository 実装

pub mod inmemory;
pub mod sqlite;

pub use inmemory::{InMemoryMessageStore, InMemoryUserDirectory};
pub use sqlite::SqliteStore;
