//! Filesystem-backed [`FileResolver`].

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, warn};
use walkdir::WalkDir;

use super::converter::TreeConverter;
use super::registry;
use crate::core::ast::ParsedFile;
use crate::core::config::ContextConfig;
use crate::core::errors::{ReanchorError, Result};
use crate::remap::search_area::FileResolver;

/// Directories never searched
const SKIP_DIRS: &[&str] = &["target", "node_modules", "__pycache__", "venv", "dist", "build"];

/// Resolves source files below a root directory; file names are paths
/// relative to the root with `/` separators
#[derive(Debug, Clone)]
pub struct FsResolver {
    root: PathBuf,
    files: Vec<String>,
    markers: ContextConfig,
}

impl FsResolver {
    /// Every supported source file below `root`
    pub fn discover(root: impl Into<PathBuf>, markers: ContextConfig) -> Result<Self> {
        let root = root.into();
        let mut files = Vec::new();

        let walker = WalkDir::new(&root).into_iter().filter_entry(|e| {
            let name = e.file_name().to_string_lossy();
            e.depth() == 0 || (!name.starts_with('.') && !SKIP_DIRS.iter().any(|d| name == *d))
        });

        for entry in walker {
            let entry = entry.map_err(|e| {
                ReanchorError::internal(format!("Failed to walk {}: {}", root.display(), e))
            })?;
            let path = entry.path();
            if path.is_file() && registry::path_is_supported(path) {
                let relative = path.strip_prefix(&root).unwrap_or(path);
                files.push(relative_name(relative));
            }
        }

        files.sort();
        debug!("Discovered {} source file(s) under {}", files.len(), root.display());
        Ok(Self {
            root,
            files,
            markers,
        })
    }

    /// Only the given files, named relative to `root`
    pub fn with_files(
        root: impl Into<PathBuf>,
        files: impl IntoIterator<Item = String>,
        markers: ContextConfig,
    ) -> Self {
        Self {
            root: root.into(),
            files: files.into_iter().collect(),
            markers,
        }
    }

    /// Root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute path of a file name
    pub fn path_of(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }
}

impl FileResolver for FsResolver {
    fn file_names(&self) -> Vec<String> {
        self.files.clone()
    }

    fn parse_file(&self, name: &str) -> Result<Arc<ParsedFile>> {
        let path = self.path_of(name);
        let text = read_source(&path)?;
        let mut converter = TreeConverter::for_path(&path, self.markers.clone())?;
        converter.parse(name, &text).map(Arc::new)
    }
}

/// Read a source file, replacing invalid UTF-8
pub fn read_source(path: &Path) -> Result<String> {
    match fs::read_to_string(path) {
        Ok(content) => Ok(content),
        Err(e) if e.kind() == std::io::ErrorKind::InvalidData => {
            let bytes = fs::read(path)
                .map_err(|err| ReanchorError::io("Failed to read file as bytes", err))?;
            warn!(
                "File contained invalid UTF-8, converted with lossy encoding: {}",
                path.display()
            );
            Ok(String::from_utf8_lossy(&bytes).into_owned())
        }
        Err(e) => Err(ReanchorError::io(
            format!("Failed to read file: {}", path.display()),
            e,
        )),
    }
}

fn relative_name(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
