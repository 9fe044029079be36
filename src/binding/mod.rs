//! Agent-tool binding: the write path (full-replacement bind) and the read
//! path (bound / unbound membership queries).

pub mod membership;
pub mod reconciler;

pub use membership::MembershipQuery;
pub use reconciler::{BindingReconciler, INVALID_TOOL_IDS_MESSAGE, dedup_tool_ids};
