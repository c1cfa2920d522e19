pub mod sqlite;
pub mod trait_def;

pub use sqlite::SqliteStore;
pub use trait_def::{DiagnosticsStore, StorageError, StorageResult};
