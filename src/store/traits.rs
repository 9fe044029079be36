//! Repository traits consumed by the reconciler and the query engine.

use std::collections::HashSet;

use crate::domain::{AgentId, AgentToolBinding, Membership, Page, PageRequest, Tool, ToolFilter, ToolStatus};
use crate::error::Result;
use crate::id::ToolId;

/// Read access to the tool catalog.
pub trait ToolCatalog {
    /// The subset of `ids` that exist and are active.
    fn active_tool_ids(&self, ids: &[ToolId]) -> Result<HashSet<ToolId>>;

    /// Status of a tool, or `None` if it does not exist.
    fn status_of(&self, id: &ToolId) -> Result<Option<ToolStatus>>;
}

/// Operations available inside a binding write transaction.
///
/// Catalog reads made through the writer see the same snapshot the writes
/// commit against.
pub trait BindingWriter: ToolCatalog {
    /// Remove every binding of `agent`, returning how many were removed.
    fn delete_bindings(&self, agent: &AgentId) -> Result<usize>;

    /// Add one binding. A duplicate pair fails with `ToolbindError::Conflict`.
    fn insert_binding(&self, agent: &AgentId, tool: &ToolId) -> Result<()>;
}

/// Storage for the agent-tool relation.
pub trait BindingStore: Send + Sync {
    /// Run `f` in a write transaction: commit on `Ok`, roll back on `Err`.
    ///
    /// Write transactions for the same store are serialized.
    fn write_transaction<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&dyn BindingWriter) -> Result<T>;

    /// Active tools on the given side of `agent`'s binding set, filtered,
    /// ordered by name then id, and paginated. The count and the slice come
    /// from one snapshot.
    fn query_tools(
        &self,
        membership: Membership,
        agent: &AgentId,
        filter: &ToolFilter,
        page: PageRequest,
    ) -> Result<Page<Tool>>;

    /// Every binding row of `agent`, regardless of tool status.
    fn bindings_for(&self, agent: &AgentId) -> Result<Vec<AgentToolBinding>>;
}
