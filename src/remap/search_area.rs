//! The set of files a batch of points is searched in.
//!
//! Files are parsed on first use through a [`FileResolver`] and memoised for
//! the lifetime of the area. A file that fails to parse is logged and left
//! out; it never aborts the batch.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use once_cell::sync::OnceCell;
use rayon::prelude::*;
use tracing::warn;
use xxhash_rust::xxh3::xxh3_64;

use crate::context::extraction::file_context;
use crate::context::FileContext;
use crate::core::ast::ParsedFile;
use crate::core::errors::{Result, ReanchorError};

/// Source of parsed files
pub trait FileResolver: Send + Sync {
    /// Names of every file that can be resolved
    fn file_names(&self) -> Vec<String>;

    /// Parse one file
    fn parse_file(&self, name: &str) -> Result<Arc<ParsedFile>>;
}

/// Resolver over files that are already parsed
#[derive(Debug, Default, Clone)]
pub struct MemoryResolver {
    files: IndexMap<String, Arc<ParsedFile>>,
}

impl MemoryResolver {
    /// Resolver over the given files
    pub fn new(files: impl IntoIterator<Item = ParsedFile>) -> Self {
        Self {
            files: files
                .into_iter()
                .map(|file| (file.name.clone(), Arc::new(file)))
                .collect(),
        }
    }
}

impl FileResolver for MemoryResolver {
    fn file_names(&self) -> Vec<String> {
        self.files.keys().cloned().collect()
    }

    fn parse_file(&self, name: &str) -> Result<Arc<ParsedFile>> {
        self.files
            .get(name)
            .cloned()
            .ok_or_else(|| ReanchorError::not_found(format!("file {name}")))
    }
}

/// A parsed file with its precomputed file context
#[derive(Debug, Clone)]
pub struct AreaFile {
    /// Parsed file
    pub parsed: Arc<ParsedFile>,
    /// File context shared by every node of the file
    pub context: Arc<FileContext>,
    /// Hash of the file text, distinguishing re-parses of the same name
    pub revision: u64,
}

impl AreaFile {
    /// Wrap a parsed file
    pub fn new(parsed: Arc<ParsedFile>) -> Self {
        let context = Arc::new(file_context(&parsed));
        let revision = xxh3_64(parsed.text.as_bytes());
        Self {
            parsed,
            context,
            revision,
        }
    }

    /// File name
    pub fn name(&self) -> &str {
        &self.parsed.name
    }
}

/// Lazily parsed set of candidate files
pub struct SearchArea {
    resolver: Arc<dyn FileResolver>,
    files: IndexMap<String, OnceCell<Option<AreaFile>>>,
}

impl fmt::Debug for SearchArea {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SearchArea")
            .field("files", &self.files.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl SearchArea {
    /// Area over every file the resolver knows
    pub fn new(resolver: Arc<dyn FileResolver>) -> Self {
        let files = resolver
            .file_names()
            .into_iter()
            .map(|name| (name, OnceCell::new()))
            .collect();
        Self { resolver, files }
    }

    /// Area over already parsed files
    pub fn from_files(files: impl IntoIterator<Item = ParsedFile>) -> Self {
        Self::new(Arc::new(MemoryResolver::new(files)))
    }

    /// Names of every file in the area, parsed or not
    pub fn file_names(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(String::as_str)
    }

    /// Number of files in the area
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Whether the area holds no files
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Whether a file of that name belongs to the area
    pub fn contains(&self, name: &str) -> bool {
        self.files.contains_key(name)
    }

    /// Parsed file by name; `None` when absent or unparseable
    pub fn file(&self, name: &str) -> Option<AreaFile> {
        let cell = self.files.get(name)?;
        cell.get_or_init(|| match self.resolver.parse_file(name) {
            Ok(parsed) => Some(AreaFile::new(parsed)),
            Err(err) => {
                warn!("Excluding {} from the search area: {}", name, err);
                None
            }
        })
        .clone()
    }

    /// Every parseable file, parsing the missing ones in parallel
    pub fn files(&self) -> Vec<AreaFile> {
        let names: Vec<&str> = self.file_names().collect();
        names
            .par_iter()
            .filter_map(|name| self.file(name))
            .collect()
    }
}
