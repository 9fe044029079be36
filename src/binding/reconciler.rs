//! Full-replacement bind.
//!
//! A bind replaces an agent's whole tool set: dedupe the request, check every
//! id against the active catalog, then delete-and-insert inside one write
//! transaction. Validation runs inside that same transaction, so nothing is
//! written when any id is rejected.

use std::collections::HashSet;
use std::sync::Arc;

use log::{info, warn};

use crate::config::BindingConfig;
use crate::domain::{AgentId, BindResult};
use crate::error::{Result, ToolbindError};
use crate::id::ToolId;
use crate::store::BindingStore;

/// Message carried by [`ToolbindError::Validation`] for rejected tool ids
pub const INVALID_TOOL_IDS_MESSAGE: &str = "Some tool IDs do not exist or are not active";

/// Applies full-replacement binds against a [`BindingStore`]
#[derive(Debug)]
pub struct BindingReconciler<S: BindingStore> {
    store: Arc<S>,
    config: BindingConfig,
}

impl<S: BindingStore> BindingReconciler<S> {
    pub fn new(store: Arc<S>, config: BindingConfig) -> Self {
        Self { store, config }
    }

    /// Replace every binding of `agent_id` with `requested`.
    ///
    /// An empty `requested` unbinds everything. Duplicates are collapsed.
    /// Fails with `Validation` listing every missing or inactive id, in which
    /// case the agent's existing bindings are untouched. A `Conflict` from the
    /// store is retried up to `conflict_retries` times.
    pub fn bind(&self, agent_id: &AgentId, requested: &[ToolId]) -> Result<BindResult> {
        if requested.len() > self.config.max_tool_ids {
            return Err(ToolbindError::invalid_input(
                "toolIds",
                format!("at most {} tool ids per request", self.config.max_tool_ids),
            ));
        }

        let unique = dedup_tool_ids(requested);
        info!(
            "Binding {} tools ({} requested) to agent {} (full replacement)",
            unique.len(),
            requested.len(),
            agent_id
        );

        let mut attempt = 0;
        loop {
            match self.replace(agent_id, &unique) {
                Ok(removed) => {
                    info!(
                        "Successfully bound {} tools to agent {} (replaced {})",
                        unique.len(),
                        agent_id,
                        removed
                    );
                    return Ok(BindResult::new(agent_id.clone(), unique));
                }
                Err(e) if e.is_retryable() && attempt < self.config.conflict_retries => {
                    attempt += 1;
                    warn!(
                        "Bind for agent {} conflicted, retrying ({}/{}): {}",
                        agent_id, attempt, self.config.conflict_retries, e
                    );
                }
                Err(e) => {
                    if let ToolbindError::Validation { invalid_ids, .. } = &e {
                        warn!("Invalid tool IDs for agent {}: {:?}", agent_id, invalid_ids);
                    }
                    return Err(e);
                }
            }
        }
    }

    /// One transactional attempt; returns how many old bindings were removed.
    fn replace(&self, agent_id: &AgentId, tool_ids: &[ToolId]) -> Result<usize> {
        self.store.write_transaction(|writer| {
            if !tool_ids.is_empty() {
                let valid = writer.active_tool_ids(tool_ids)?;
                let invalid_ids: Vec<String> = tool_ids
                    .iter()
                    .filter(|id| !valid.contains(*id))
                    .map(ToString::to_string)
                    .collect();
                if !invalid_ids.is_empty() {
                    return Err(ToolbindError::Validation {
                        message: INVALID_TOOL_IDS_MESSAGE.to_string(),
                        invalid_ids,
                    });
                }
            }

            let removed = writer.delete_bindings(agent_id)?;
            for tool_id in tool_ids {
                writer.insert_binding(agent_id, tool_id)?;
            }
            tracing::debug!(agent = %agent_id, removed, inserted = tool_ids.len(), "binding swap staged");
            Ok(removed)
        })
    }
}

/// Collapse duplicates, keeping first-seen order.
pub fn dedup_tool_ids(ids: &[ToolId]) -> Vec<ToolId> {
    let mut seen = HashSet::with_capacity(ids.len());
    ids.iter().copied().filter(|id| seen.insert(*id)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    use crate::domain::{AgentToolBinding, Membership, NewTool, Page, PageRequest, Tool, ToolFilter};
    use crate::store::{BindingWriter, SqliteStore};

    fn setup() -> (Arc<SqliteStore>, BindingReconciler<SqliteStore>) {
        let store = Arc::new(SqliteStore::open_in_memory().unwrap());
        let reconciler = BindingReconciler::new(store.clone(), BindingConfig::default());
        (store, reconciler)
    }

    fn agent(id: &str) -> AgentId {
        AgentId::new(id).unwrap()
    }

    fn bound_ids(store: &SqliteStore, agent: &AgentId) -> HashSet<ToolId> {
        store.bindings_for(agent).unwrap().into_iter().map(|b| b.tool_id).collect()
    }

    #[test]
    fn test_dedup_keeps_first_seen_order() {
        let (a, b, c) = (ToolId::new(), ToolId::new(), ToolId::new());
        assert_eq!(dedup_tool_ids(&[b, a, b, c, a]), vec![b, a, c]);
        assert!(dedup_tool_ids(&[]).is_empty());
    }

    #[test]
    fn test_bind_deduplicates() {
        let (store, reconciler) = setup();
        let a1 = agent("a1");
        let t1 = store.create_tool(NewTool::new("t1")).unwrap();
        let t2 = store.create_tool(NewTool::new("t2")).unwrap();

        let result = reconciler.bind(&a1, &[t1.id, t1.id, t2.id]).unwrap();
        assert_eq!(result.bound_tool_count, 2);
        assert_eq!(result.tool_ids, vec![t1.id, t2.id]);
        assert_eq!(store.bindings_for(&a1).unwrap().len(), 2);
    }

    #[test]
    fn test_bind_is_idempotent() {
        let (store, reconciler) = setup();
        let a1 = agent("a1");
        let t1 = store.create_tool(NewTool::new("t1")).unwrap();
        let t2 = store.create_tool(NewTool::new("t2")).unwrap();

        let first = reconciler.bind(&a1, &[t1.id, t2.id]).unwrap();
        let after_first = bound_ids(&store, &a1);
        let second = reconciler.bind(&a1, &[t1.id, t2.id]).unwrap();

        assert_eq!(first.bound_tool_count, second.bound_tool_count);
        assert_eq!(bound_ids(&store, &a1), after_first);
    }

    #[test]
    fn test_bind_replaces_previous_set() {
        let (store, reconciler) = setup();
        let a1 = agent("a1");
        let t1 = store.create_tool(NewTool::new("t1")).unwrap();
        let t2 = store.create_tool(NewTool::new("t2")).unwrap();

        reconciler.bind(&a1, &[t1.id]).unwrap();
        reconciler.bind(&a1, &[t2.id]).unwrap();

        assert_eq!(bound_ids(&store, &a1), HashSet::from([t2.id]));
    }

    #[test]
    fn test_empty_bind_unbinds_all() {
        let (store, reconciler) = setup();
        let a1 = agent("a1");
        let t1 = store.create_tool(NewTool::new("t1")).unwrap();
        reconciler.bind(&a1, &[t1.id]).unwrap();

        let result = reconciler.bind(&a1, &[]).unwrap();
        assert_eq!(result.bound_tool_count, 0);
        assert!(result.tool_ids.is_empty());
        assert!(store.bindings_for(&a1).unwrap().is_empty());
    }

    #[test]
    fn test_bind_leaves_other_agents_alone() {
        let (store, reconciler) = setup();
        let a1 = agent("a1");
        let a2 = agent("a2");
        let t1 = store.create_tool(NewTool::new("t1")).unwrap();

        reconciler.bind(&a1, &[t1.id]).unwrap();
        reconciler.bind(&a2, &[t1.id]).unwrap();
        reconciler.bind(&a2, &[]).unwrap();

        assert_eq!(bound_ids(&store, &a1), HashSet::from([t1.id]));
    }

    #[test]
    fn test_invalid_ids_abort_without_changes() {
        let (store, reconciler) = setup();
        let a1 = agent("a1");
        let valid = store.create_tool(NewTool::new("valid")).unwrap();
        let inactive = store.create_tool(NewTool::new("inactive").inactive()).unwrap();
        let missing = ToolId::new();
        reconciler.bind(&a1, &[valid.id]).unwrap();

        let err = reconciler.bind(&a1, &[valid.id, inactive.id, missing]).unwrap_err();
        match err {
            ToolbindError::Validation { message, invalid_ids } => {
                assert_eq!(message, INVALID_TOOL_IDS_MESSAGE);
                assert_eq!(invalid_ids, vec![inactive.id.to_string(), missing.to_string()]);
            }
            other => panic!("expected validation error, got {other:?}"),
        }
        assert_eq!(bound_ids(&store, &a1), HashSet::from([valid.id]));
    }

    #[test]
    fn test_too_many_ids_rejected() {
        let store = Arc::new(SqliteStore::open_in_memory().unwrap());
        let config = BindingConfig {
            max_tool_ids: 2,
            ..BindingConfig::default()
        };
        let reconciler = BindingReconciler::new(store, config);

        let ids = [ToolId::new(), ToolId::new(), ToolId::new()];
        let err = reconciler.bind(&agent("a1"), &ids).unwrap_err();
        assert!(matches!(err, ToolbindError::InvalidInput { ref field, .. } if field == "toolIds"));
    }

    #[test]
    fn test_storage_failure_mid_swap_rolls_back() {
        let (store, reconciler) = setup();
        let a1 = agent("a1");
        let keep = store.create_tool(NewTool::new("keep")).unwrap();
        let poison = store.create_tool(NewTool::new("poison")).unwrap();
        reconciler.bind(&a1, &[keep.id]).unwrap();

        let trigger = format!(
            "CREATE TRIGGER fail_insert BEFORE INSERT ON agent_tool_bindings \
             WHEN NEW.tool_id = '{}' BEGIN SELECT RAISE(ABORT, 'injected failure'); END;",
            poison.id
        );
        store.with_connection(|conn| conn.execute_batch(&trigger));

        // delete of `keep` has already run when the insert of `poison` fails
        let err = reconciler.bind(&a1, &[poison.id]).unwrap_err();
        assert!(matches!(err, ToolbindError::Sqlite(_)));
        assert_eq!(bound_ids(&store, &a1), HashSet::from([keep.id]));
    }

    /// Delegates to a real store but reports a conflict on the first N writes.
    struct FlakyStore {
        inner: SqliteStore,
        conflicts_left: AtomicU32,
    }

    impl BindingStore for FlakyStore {
        fn write_transaction<T, F>(&self, f: F) -> Result<T>
        where
            F: FnOnce(&dyn BindingWriter) -> Result<T>,
        {
            let left = self.conflicts_left.load(Ordering::SeqCst);
            if left > 0 {
                self.conflicts_left.store(left - 1, Ordering::SeqCst);
                return Err(ToolbindError::Conflict("database is locked".to_string()));
            }
            self.inner.write_transaction(f)
        }

        fn query_tools(
            &self,
            membership: Membership,
            agent: &AgentId,
            filter: &ToolFilter,
            page: PageRequest,
        ) -> Result<Page<Tool>> {
            self.inner.query_tools(membership, agent, filter, page)
        }

        fn bindings_for(&self, agent: &AgentId) -> Result<Vec<AgentToolBinding>> {
            self.inner.bindings_for(agent)
        }
    }

    fn flaky(conflicts: u32) -> (Arc<FlakyStore>, ToolId) {
        let inner = SqliteStore::open_in_memory().unwrap();
        let tool = inner.create_tool(NewTool::new("t")).unwrap();
        let store = Arc::new(FlakyStore {
            inner,
            conflicts_left: AtomicU32::new(conflicts),
        });
        (store, tool.id)
    }

    #[test]
    fn test_conflict_is_retried() {
        let (store, tool_id) = flaky(2);
        let reconciler = BindingReconciler::new(store.clone(), BindingConfig::default());
        let a1 = agent("a1");

        let result = reconciler.bind(&a1, &[tool_id]).unwrap();
        assert_eq!(result.bound_tool_count, 1);
        assert_eq!(store.bindings_for(&a1).unwrap().len(), 1);
    }

    #[test]
    fn test_conflict_surfaces_after_retries_exhausted() {
        let (store, tool_id) = flaky(10);
        let config = BindingConfig {
            conflict_retries: 1,
            ..BindingConfig::default()
        };
        let reconciler = BindingReconciler::new(store.clone(), config);

        let err = reconciler.bind(&agent("a1"), &[tool_id]).unwrap_err();
        assert!(err.is_retryable());
        // one initial attempt plus one retry
        assert_eq!(store.conflicts_left.load(Ordering::SeqCst), 8);
    }
}
