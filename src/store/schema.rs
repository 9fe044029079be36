//! SQLite schema for the catalog and the binding relation.

use rusqlite::Connection;
use rusqlite::functions::FunctionFlags;

use crate::error::Result;

/// Table and index definitions, safe to run on every open.
const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS tools (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    description TEXT NOT NULL DEFAULT '',
    status TEXT NOT NULL CHECK (status IN ('active', 'inactive')),
    category_id TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_tools_status_name ON tools(status, name, id);
CREATE INDEX IF NOT EXISTS idx_tools_category ON tools(category_id);

CREATE TABLE IF NOT EXISTS agent_tool_bindings (
    id INTEGER PRIMARY KEY,
    agent_id TEXT NOT NULL CHECK (length(agent_id) BETWEEN 1 AND 255),
    tool_id TEXT NOT NULL REFERENCES tools(id) ON DELETE CASCADE,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_agent_tool_bindings_agent ON agent_tool_bindings(agent_id);
CREATE INDEX IF NOT EXISTS idx_agent_tool_bindings_tool ON agent_tool_bindings(tool_id);
CREATE UNIQUE INDEX IF NOT EXISTS idx_agent_tool_bindings_agent_tool
    ON agent_tool_bindings(agent_id, tool_id);
"#;

/// Name of the Unicode lowercase function used by keyword matching.
const FOLD_CASE_FN: &str = "fold_case";

/// Enable foreign keys, register `fold_case`, and create tables.
///
/// Foreign keys and functions are per-connection in SQLite; without foreign
/// keys tool deletion would not cascade to bindings.
pub fn init(conn: &Connection) -> Result<()> {
    conn.pragma_update(None, "foreign_keys", true)?;
    conn.create_scalar_function(
        FOLD_CASE_FN,
        1,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| Ok(ctx.get::<String>(0)?.to_lowercase()),
    )?;
    conn.execute_batch(SCHEMA)?;
    Ok(())
}
