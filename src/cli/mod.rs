//! CLI module for toolbind - command-line interface and subcommands.
//!
//! Provides tool administration, binding, membership queries and a raw
//! envelope call for scripting.

pub mod commands;

pub use commands::Cli;
