//! CLI Argument Structures
//!
//! Command definitions and their arguments for the reanchor binary.

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Context-based re-anchoring of pinned code locations
#[derive(Parser)]
#[command(name = "reanchor")]
#[command(version = VERSION)]
#[command(about = "Pin syntax nodes and find them again after the code changed")]
#[command(long_about = "
Pin a function, class, block or #region to a concern point and relocate it
after the sources were edited, renamed or copied.

Common Usage:

  # Pin the function around line 42
  reanchor pin --root ./src --file service.py --line 42 --name retry-loop

  # Find every pin again, searching all files
  reanchor relocate --root ./src --global

  # Accept confident relocations and store their new context
  reanchor relocate --root ./src --update

  # Show what can be pinned in a file
  reanchor landmarks --root ./src --file service.py
")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging for debugging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Configuration file (YAML)
    #[arg(short, long, global = true, env = "REANCHOR_CONFIG")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Pin the innermost landmark covering a line
    Pin(PinArgs),

    /// Relocate every stored pin
    Relocate(RelocateArgs),

    /// List the landmarks of a file
    Landmarks(LandmarksArgs),

    /// Print default configuration in YAML format
    #[command(name = "print-default-config")]
    PrintDefaultConfig,

    /// Validate a configuration file
    #[command(name = "validate-config")]
    ValidateConfig(ValidateConfigArgs),

    /// List supported programming languages
    #[command(name = "list-languages")]
    ListLanguages,
}

/// Location of the point store
#[derive(Args)]
pub struct StoreArgs {
    /// Point store file
    #[arg(long, default_value = ".reanchor/points.json")]
    pub store: PathBuf,
}

#[derive(Args)]
pub struct PinArgs {
    /// Source root; file names are relative to it
    #[arg(long, default_value = ".")]
    pub root: PathBuf,

    /// File to pin in, relative to the root
    #[arg(long)]
    pub file: String,

    /// 1-based line inside the node to pin
    #[arg(long)]
    pub line: usize,

    /// Only consider landmarks of this syntactic type
    #[arg(long)]
    pub kind: Option<String>,

    /// Name of the concern point
    #[arg(long)]
    pub name: String,

    #[command(flatten)]
    pub store: StoreArgs,
}

#[derive(Args)]
pub struct RelocateArgs {
    /// Source root to search
    #[arg(long, default_value = ".")]
    pub root: PathBuf,

    /// Search every file instead of the origin file and its look-alikes
    #[arg(long)]
    pub global: bool,

    /// Store the new context of automatically relocated points
    #[arg(long)]
    pub update: bool,

    /// Number of candidates shown per ambiguous point
    #[arg(long, default_value_t = 3)]
    pub top: usize,

    /// Output format
    #[arg(long, value_enum, default_value = "table")]
    pub format: OutputFormat,

    #[command(flatten)]
    pub store: StoreArgs,
}

#[derive(Args)]
pub struct LandmarksArgs {
    /// Source root
    #[arg(long, default_value = ".")]
    pub root: PathBuf,

    /// File to inspect, relative to the root
    #[arg(long)]
    pub file: String,
}

#[derive(Args)]
pub struct ValidateConfigArgs {
    /// Path to configuration file to validate
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Show detailed configuration breakdown
    #[arg(long)]
    pub detailed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Console table
    Table,
    /// JSON document
    Json,
}
