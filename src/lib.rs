//! Toolbind - which tools an agent may use
//!
//! Agents are granted tools through bindings. A bind request replaces an
//! agent's whole tool set atomically, and the catalog can be browsed as two
//! complementary views: the active tools an agent has, and the active tools
//! it does not.

pub mod api;
pub mod binding;
pub mod config;
pub mod domain;
pub mod error;
pub mod id;
pub mod store;

pub use error::{Result, ToolbindError};
