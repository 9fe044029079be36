//! Agent-tool binding records
//!
//! Agents are external and opaque: an `AgentId` is only checked for length,
//! never resolved against an agent table.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Result, ToolbindError};
use crate::id::ToolId;

/// Maximum agent id length, in characters
pub const MAX_AGENT_ID_LEN: usize = 255;

/// Identifier of an external agent (1-255 characters)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct AgentId(String);

impl AgentId {
    /// Validate and wrap an agent id.
    pub fn new(id: impl Into<String>) -> Result<Self> {
        let id = id.into();
        if id.is_empty() {
            return Err(ToolbindError::invalid_input("agentId", "must not be empty"));
        }
        if id.chars().count() > MAX_AGENT_ID_LEN {
            return Err(ToolbindError::invalid_input(
                "agentId",
                format!("must be at most {} characters", MAX_AGENT_ID_LEN),
            ));
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for AgentId {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        AgentId::new(raw).map_err(serde::de::Error::custom)
    }
}

/// A persisted grant of one tool to one agent
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AgentToolBinding {
    pub agent_id: AgentId,
    pub tool_id: ToolId,
    pub created_at: DateTime<Utc>,
}

/// Outcome of a full-replacement bind
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BindResult {
    pub agent_id: AgentId,
    pub bound_tool_count: usize,
    /// Deduplicated, validated ids actually bound, in first-seen request order
    pub tool_ids: Vec<ToolId>,
}

impl BindResult {
    pub fn new(agent_id: AgentId, tool_ids: Vec<ToolId>) -> Self {
        Self {
            agent_id,
            bound_tool_count: tool_ids.len(),
            tool_ids,
        }
    }
}
