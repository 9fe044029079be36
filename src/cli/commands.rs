//! CLI command definitions using clap.
//!
//! - tool: add/get/status/delete tools in the catalog
//! - bind: replace an agent's tool set
//! - bound / unbound: list tools by membership
//! - call: send a raw method call through the envelope dispatcher

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Toolbind - agent tool bindings backed by SQLite
#[derive(Parser, Debug)]
#[command(name = "toolbind")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Optional config file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Check if verbose mode is enabled
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }
}

/// Main subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Tool catalog commands
    Tool {
        #[command(subcommand)]
        command: ToolCommands,
    },

    /// Replace the full set of tools bound to an agent
    Bind {
        /// Agent ID
        agent: String,

        /// Tool IDs to bind; none unbinds everything
        tool_ids: Vec<String>,
    },

    /// List active tools bound to an agent
    Bound(QueryArgs),

    /// List active tools not bound to an agent
    Unbound(QueryArgs),

    /// Call an API method with JSON params and print the response envelope
    Call {
        /// Method name (binding.bound, binding.unbound, binding.bind)
        method: String,

        /// JSON params
        #[arg(default_value = "{}")]
        params: String,
    },
}

/// Filters and paging shared by bound/unbound
#[derive(Args, Debug, Clone)]
pub struct QueryArgs {
    /// Agent ID
    pub agent: String,

    /// Case-insensitive match on name or description
    #[arg(short, long)]
    pub keyword: Option<String>,

    /// Restrict to one category
    #[arg(long)]
    pub category: Option<String>,

    /// Page number (1-based)
    #[arg(short, long)]
    pub page: Option<i64>,

    /// Page size
    #[arg(short, long)]
    pub size: Option<i64>,
}

/// Tool catalog subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum ToolCommands {
    /// Register a new tool
    Add {
        /// Tool name
        name: String,

        /// Description
        #[arg(short, long, default_value = "")]
        description: String,

        /// Category ID
        #[arg(long)]
        category: Option<String>,

        /// Register as inactive
        #[arg(long)]
        inactive: bool,
    },

    /// Show a tool
    Get {
        /// Tool ID
        id: String,
    },

    /// Set a tool's status (active, inactive)
    Status {
        /// Tool ID
        id: String,

        /// New status
        status: String,
    },

    /// Delete a tool and its bindings
    Delete {
        /// Tool ID
        id: String,
    },
}
