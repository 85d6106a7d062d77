//! Local entity stores

pub mod manager;
pub mod memory_store;
pub mod sqlite_store;

pub use manager::{DbManager, SqliteConnection};
pub use memory_store::InMemoryEntityStore;
pub use sqlite_store::SqliteEntityStore;
