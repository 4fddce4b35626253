// TaskTrack - single-user task tracking over SQLite with JSON export/import

pub mod config;
pub mod filter;
pub mod record;
pub mod schema;
pub mod store;
pub mod transfer;

// Re-export main types for convenience
pub use config::Config;
pub use filter::Query;
pub use record::{State, Task};
pub use store::TaskStore;
pub use transfer::{ExportRecord, ImportError, ImportRecord};
