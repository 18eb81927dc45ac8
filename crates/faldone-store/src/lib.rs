//! Faldone Store — SQLite document table, FTS4 index and match-statistics ranking.

pub mod index;
pub mod rank;
pub mod schema;
pub mod sqlite;
pub mod types;

pub use sqlite::DocumentStore;
pub use types::*;
