//! # Reanchor-RS: Context-Based Re-Anchoring of Concern Points
//!
//! A user pins a *concern point* to a syntactic construct (function, class,
//! block, custom region) of a source file. When the file, or a renamed or
//! edited copy of it, is parsed again from scratch, the pin has to find its
//! node again. This library records a rich context for every pinned node and
//! relocates pins by comparing that context with every node of the same type
//! in the fresh trees:
//!
//! - **Context Model**: header tokens, inner text, enclosing landmarks,
//!   neighbouring text and the closest look-alike nodes
//! - **Similarity**: priority-weighted edit distance over token sequences and
//!   MinHash signatures over long text
//! - **Heuristics**: a pluggable pipeline tuning signal weights per situation
//! - **Assignment**: Kuhn-Munkres matching resolves many pins at once
//! - **Multi-language Support**: Python and Rust through tree-sitter
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                   remap (ContextFinder)                     │
//! ├─────────────────────────────────────────────────────────────┤
//! │  context      │  similarity     │  lang          │  io      │
//! │ • Extraction  │ • Sequences     │ • Profiles     │ • Points │
//! │ • TextOrHash  │ • Assignment    │ • Converter    │          │
//! │ • FuzzyHash   │                 │ • FsResolver   │          │
//! ├─────────────────────────────────────────────────────────────┤
//! │            core (ast, config, errors)                       │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use reanchor_rs::{ContextFinder, ReanchorConfig, SearchArea, SearchScope};
//! use reanchor_rs::lang::FsResolver;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ReanchorConfig::default();
//!     let finder = ContextFinder::new(config.clone())?;
//!
//!     let before = SearchArea::new(Arc::new(FsResolver::discover("./v1", config.context.clone())?));
//!     let file = before.file("service.py").expect("parsed");
//!     let node = file.parsed.innermost_landmark_at_line(12, None).expect("landmark");
//!     let point = finder.pin("retry loop", &file, node, &before);
//!
//!     let after = SearchArea::new(Arc::new(FsResolver::discover("./v2", config.context)?));
//!     let result = finder.find(&[point.clone()], &after, SearchScope::Local);
//!     println!("{} candidate(s)", result[&point.id].len());
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(unsafe_code)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![cfg_attr(docsrs, feature(doc_cfg))]

// Core data structures
pub mod core {
    //! Syntax trees, configuration and errors.

    pub mod ast;
    pub mod config;
    pub mod errors;
}

// Context model and extraction
pub mod context;

// Sequence similarity and assignment
pub mod similarity;

// Matching engine
pub mod remap;

// Tree-sitter adapters
pub mod lang;

// Point persistence
pub mod io;

// Re-export primary types for convenience
pub use crate::context::{ContextExtractor, PointContext};
pub use crate::core::ast::{FileBuilder, NodeFlags, NodeId, ParsedFile, SyntaxTree};
pub use crate::core::config::ReanchorConfig;
pub use crate::core::errors::{ReanchorError, Result, ResultExt};
pub use crate::io::PointStore;
pub use crate::remap::{
    ConcernPoint, ContextFinder, HeuristicPipeline, RemapCandidateInfo, RemapResult, SearchArea,
    SearchScope,
};

/// Library version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
