//! SQLite-backed catalog and binding store.
//!
//! One connection sits behind a `Mutex`: rusqlite connections are `Send` but
//! not `Sync`, and every operation here is short. Several handles (or
//! processes) on the same file coordinate through SQLite's own locking.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use chrono::Utc;
use log::{debug, warn};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, Type, ValueRef};
use rusqlite::{Connection, ErrorCode, OptionalExtension, Row, ToSql, TransactionBehavior, params, params_from_iter};

use super::query::{TOOL_COLUMNS, ToolQuery};
use super::schema;
use super::traits::{BindingStore, BindingWriter, ToolCatalog};
use crate::domain::{AgentId, AgentToolBinding, Membership, NewTool, Page, PageRequest, Tool, ToolFilter, ToolStatus};
use crate::error::{Result, ToolbindError};
use crate::id::ToolId;

/// Ids per `IN (...)` lookup, well under SQLite's bound-parameter limit
const ID_CHUNK: usize = 500;

/// Default wait for a competing writer before reporting a conflict
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Catalog and binding store on a single SQLite database
pub struct SqliteStore {
    conn: Mutex<Connection>,
    path: Option<PathBuf>,
}

impl std::fmt::Debug for SqliteStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteStore").field("path", &self.path).finish_non_exhaustive()
    }
}

impl SqliteStore {
    /// Open or create a database file, creating parent directories as needed.
    pub fn open(path: impl AsRef<Path>, busy_timeout: Duration) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        conn.busy_timeout(busy_timeout)?;
        let mode: String = conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
        debug!("Opened {} (journal_mode={})", path.display(), mode);

        Self::from_connection(conn, Some(path.to_path_buf()))
    }

    /// Open a private in-memory database.
    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?, None)
    }

    fn from_connection(conn: Connection, path: Option<PathBuf>) -> Result<Self> {
        schema::init(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
            path,
        })
    }

    /// Database file path, `None` for in-memory stores.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|e| ToolbindError::Storage(e.to_string()))
    }

    /// Register a tool in the catalog.
    pub fn create_tool(&self, new_tool: NewTool) -> Result<Tool> {
        let now = Utc::now();
        let tool = Tool {
            id: new_tool.id.unwrap_or_default(),
            name: new_tool.name,
            description: new_tool.description,
            status: new_tool.status,
            category_id: new_tool.category_id,
            created_at: now,
            updated_at: now,
        };

        self.lock()?
            .execute(
                "INSERT INTO tools (id, name, description, status, category_id, created_at, updated_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    tool.id,
                    tool.name,
                    tool.description,
                    tool.status,
                    tool.category_id,
                    tool.created_at,
                    tool.updated_at,
                ],
            )
            .map_err(classify)?;

        debug!("Created tool {} ({})", tool.id, tool.name);
        Ok(tool)
    }

    /// Get a tool by id.
    pub fn get_tool(&self, id: &ToolId) -> Result<Option<Tool>> {
        let conn = self.lock()?;
        let tool = conn
            .query_row(
                &format!("SELECT {TOOL_COLUMNS} FROM tools t WHERE t.id = ?1"),
                [id],
                tool_from_row,
            )
            .optional()?;
        Ok(tool)
    }

    /// Activate or deactivate a tool. Existing bindings are kept; inactive
    /// tools simply drop out of both membership queries.
    pub fn set_tool_status(&self, id: &ToolId, status: ToolStatus) -> Result<Tool> {
        let changed = self.lock()?.execute(
            "UPDATE tools SET status = ?1, updated_at = ?2 WHERE id = ?3",
            params![status, Utc::now(), id],
        )?;
        if changed == 0 {
            return Err(ToolbindError::NotFound(format!("tool {}", id)));
        }
        self.get_tool(id)?
            .ok_or_else(|| ToolbindError::NotFound(format!("tool {}", id)))
    }

    /// Delete a tool; its bindings go with it.
    pub fn delete_tool(&self, id: &ToolId) -> Result<()> {
        let deleted = self.lock()?.execute("DELETE FROM tools WHERE id = ?1", [id])?;
        if deleted == 0 {
            return Err(ToolbindError::NotFound(format!("tool {}", id)));
        }
        debug!("Deleted tool {}", id);
        Ok(())
    }
}

impl ToolCatalog for SqliteStore {
    fn active_tool_ids(&self, ids: &[ToolId]) -> Result<HashSet<ToolId>> {
        let conn = self.lock()?;
        active_tool_ids(&conn, ids)
    }

    fn status_of(&self, id: &ToolId) -> Result<Option<ToolStatus>> {
        let conn = self.lock()?;
        status_of(&conn, id)
    }
}

impl BindingStore for SqliteStore {
    fn write_transaction<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&dyn BindingWriter) -> Result<T>,
    {
        let mut conn = self.lock()?;
        // IMMEDIATE takes the write lock up front, so catalog reads inside the
        // transaction cannot go stale before the writes land.
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(classify)?;

        let outcome = f(&SqliteWriter { conn: &tx });
        match outcome {
            Ok(value) => {
                tx.commit().map_err(classify)?;
                tracing::debug!("binding transaction committed");
                Ok(value)
            }
            Err(e) => {
                if let Err(rollback_err) = tx.rollback() {
                    warn!("Rollback failed after {}: {}", e, rollback_err);
                }
                tracing::debug!(error = %e, "binding transaction rolled back");
                Err(e)
            }
        }
    }

    fn query_tools(
        &self,
        membership: Membership,
        agent: &AgentId,
        filter: &ToolFilter,
        page: PageRequest,
    ) -> Result<Page<Tool>> {
        let query = ToolQuery::new(membership, agent, filter);
        let limit = i64::from(page.size());
        let offset = i64::try_from(page.offset()).map_err(|_| ToolbindError::invalid_input("page", "out of range"))?;

        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        let filter_params = query.filter_params();
        let total: i64 = tx.query_row(&query.count_sql(), filter_params.as_slice(), |row| row.get(0))?;

        let mut page_params = filter_params.clone();
        page_params.push((":limit", &limit as &dyn ToSql));
        page_params.push((":offset", &offset as &dyn ToSql));

        let content = {
            let mut stmt = tx.prepare(&query.page_sql())?;
            let rows = stmt.query_map(page_params.as_slice(), tool_from_row)?;
            rows.collect::<rusqlite::Result<Vec<Tool>>>()?
        };
        tx.commit()?;

        debug!(
            "{} query for agent {}: {} total, {} on page {}",
            membership,
            agent,
            total,
            content.len(),
            page.page()
        );
        Ok(Page::new(content, page, total.max(0) as u64))
    }

    fn bindings_for(&self, agent: &AgentId) -> Result<Vec<AgentToolBinding>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT agent_id, tool_id, created_at FROM agent_tool_bindings WHERE agent_id = ?1 ORDER BY id",
        )?;
        let rows = stmt.query_map([agent.as_str()], binding_from_row)?;
        let bindings = rows.collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(bindings)
    }
}

/// Writer view over an open transaction
struct SqliteWriter<'a> {
    conn: &'a Connection,
}

impl ToolCatalog for SqliteWriter<'_> {
    fn active_tool_ids(&self, ids: &[ToolId]) -> Result<HashSet<ToolId>> {
        active_tool_ids(self.conn, ids)
    }

    fn status_of(&self, id: &ToolId) -> Result<Option<ToolStatus>> {
        status_of(self.conn, id)
    }
}

impl BindingWriter for SqliteWriter<'_> {
    fn delete_bindings(&self, agent: &AgentId) -> Result<usize> {
        let deleted = self
            .conn
            .execute("DELETE FROM agent_tool_bindings WHERE agent_id = ?1", [agent.as_str()])
            .map_err(classify)?;
        Ok(deleted)
    }

    fn insert_binding(&self, agent: &AgentId, tool: &ToolId) -> Result<()> {
        self.conn
            .execute(
                "INSERT INTO agent_tool_bindings (agent_id, tool_id, created_at) VALUES (?1, ?2, ?3)",
                params![agent.as_str(), tool, Utc::now()],
            )
            .map_err(classify)?;
        Ok(())
    }
}

fn active_tool_ids(conn: &Connection, ids: &[ToolId]) -> Result<HashSet<ToolId>> {
    let mut found = HashSet::with_capacity(ids.len());
    for chunk in ids.chunks(ID_CHUNK) {
        let placeholders = vec!["?"; chunk.len()].join(", ");
        let sql = format!("SELECT id FROM tools WHERE status = 'active' AND id IN ({placeholders})");
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(chunk.iter()), |row| row.get::<_, ToolId>(0))?;
        for id in rows {
            found.insert(id?);
        }
    }
    Ok(found)
}

fn status_of(conn: &Connection, id: &ToolId) -> Result<Option<ToolStatus>> {
    let status = conn
        .query_row("SELECT status FROM tools WHERE id = ?1", [id], |row| row.get(0))
        .optional()?;
    Ok(status)
}

/// Map write-path failures that mean "someone else got there first" to
/// `Conflict`; everything else stays a storage error.
fn classify(err: rusqlite::Error) -> ToolbindError {
    if let rusqlite::Error::SqliteFailure(ref failure, _) = err {
        let unique = failure.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
            || failure.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY;
        let busy = matches!(failure.code, ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked);
        if unique || busy {
            return ToolbindError::Conflict(err.to_string());
        }
    }
    ToolbindError::Sqlite(err)
}

fn tool_from_row(row: &Row<'_>) -> rusqlite::Result<Tool> {
    Ok(Tool {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        status: row.get(3)?,
        category_id: row.get(4)?,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}

fn binding_from_row(row: &Row<'_>) -> rusqlite::Result<AgentToolBinding> {
    let raw: String = row.get(0)?;
    let agent_id =
        AgentId::new(raw).map_err(|e| rusqlite::Error::FromSqlConversionFailure(0, Type::Text, Box::new(e)))?;
    Ok(AgentToolBinding {
        agent_id,
        tool_id: row.get(1)?,
        created_at: row.get(2)?,
    })
}

impl ToSql for ToolStatus {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for ToolStatus {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let text = value.as_str()?;
        ToolStatus::from_str(text)
            .ok_or_else(|| FromSqlError::Other(format!("unknown tool status '{}'", text).into()))
    }
}

#[cfg(test)]
impl SqliteStore {
    /// Raw connection access for failure-injection tests.
    pub(crate) fn with_connection<T>(&self, f: impl FnOnce(&Connection) -> rusqlite::Result<T>) -> T {
        let conn = self.lock().unwrap();
        f(&conn).unwrap()
    }
}
