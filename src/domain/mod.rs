//! Domain types for toolbind
//!
//! - Tool: catalog entries with status and optional category
//! - AgentToolBinding / BindResult: the agent-tool relation and bind outcome
//! - ToolFilter / Membership: shared predicates for bound and unbound queries
//! - Page / PageRequest: the pagination contract

pub mod binding;
pub mod filter;
pub mod page;
pub mod tool;

pub use binding::{AgentId, AgentToolBinding, BindResult, MAX_AGENT_ID_LEN};
pub use filter::{Membership, ToolFilter};
pub use page::{Page, PageRequest};
pub use tool::{NewTool, Tool, ToolStatus};
