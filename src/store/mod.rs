//! Storage layer for toolbind.
//!
//! The reconciler and query engine depend only on the traits in [`traits`];
//! [`SqliteStore`] implements them on a single SQLite database that also holds
//! the tool catalog.
//!
//! # Example
//!
//! ```ignore
//! use toolbind::store::SqliteStore;
//! use toolbind::domain::NewTool;
//!
//! let store = SqliteStore::open_in_memory()?;
//! let tool = store.create_tool(NewTool::new("disk_usage"))?;
//! ```

mod query;
mod schema;
mod sqlite;
mod traits;

pub use sqlite::{DEFAULT_BUSY_TIMEOUT, SqliteStore};
pub use traits::{BindingStore, BindingWriter, ToolCatalog};
