//! CLI Module Organization
//!
//! - args: CLI argument structures
//! - commands: command execution logic
//! - output: tables and JSON reports

pub mod args;
pub mod commands;
pub mod output;

// Re-export commonly used items for convenience
pub use args::*;
pub use commands::*;
