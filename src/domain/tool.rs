//! Tool records from the catalog
//!
//! The binding core only reads tools; `NewTool` exists so the catalog can be
//! populated by administrative callers and tests.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::id::{CategoryId, ToolId};

/// Lifecycle status of a tool
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ToolStatus {
    /// Discoverable and bindable
    Active,
    /// Hidden from discovery, rejected by bind
    Inactive,
}

impl ToolStatus {
    /// Get the string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            ToolStatus::Active => "active",
            ToolStatus::Inactive => "inactive",
        }
    }

    /// Parse from the string representation.
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "active" => Some(ToolStatus::Active),
            "inactive" => Some(ToolStatus::Inactive),
            _ => None,
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, ToolStatus::Active)
    }
}

impl std::fmt::Display for ToolStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A tool as stored in the catalog
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Tool {
    pub id: ToolId,
    pub name: String,
    pub description: String,
    pub status: ToolStatus,
    pub category_id: Option<CategoryId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for registering a tool in the catalog
#[derive(Debug, Clone)]
pub struct NewTool {
    pub id: Option<ToolId>,
    pub name: String,
    pub description: String,
    pub status: ToolStatus,
    pub category_id: Option<CategoryId>,
}

impl NewTool {
    /// Create an active tool with an empty description
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            description: String::new(),
            status: ToolStatus::Active,
            category_id: None,
        }
    }

    /// Use a caller-chosen id instead of a random one
    pub fn with_id(mut self, id: ToolId) -> Self {
        self.id = Some(id);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_category(mut self, category_id: CategoryId) -> Self {
        self.category_id = Some(category_id);
        self
    }

    pub fn with_status(mut self, status: ToolStatus) -> Self {
        self.status = status;
        self
    }

    /// Shorthand for `with_status(ToolStatus::Inactive)`
    pub fn inactive(self) -> Self {
        self.with_status(ToolStatus::Inactive)
    }
}
