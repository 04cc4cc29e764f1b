pub mod context_store;
pub mod migrations;
pub mod sqlite_store;

pub use context_store::ContextStore;
pub use sqlite_store::{SeedData, SeedProject, SqliteContextStore};
