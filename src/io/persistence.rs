//! JSON storage of pinned concern points.

use std::fs;
use std::io::Write;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::debug;
use uuid::Uuid;

use crate::core::errors::{ReanchorError, Result};
use crate::remap::ConcernPoint;

/// Format version written by this build
pub const STORE_VERSION: u32 = 1;

/// Pinned points of one project
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointStore {
    /// Format version
    pub version: u32,
    /// Points in pin order
    pub points: Vec<ConcernPoint>,
}

impl Default for PointStore {
    fn default() -> Self {
        Self {
            version: STORE_VERSION,
            points: Vec::new(),
        }
    }
}

impl PointStore {
    /// Empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a store, rejecting versions newer than this build
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            ReanchorError::io(format!("Failed to read point store: {}", path.display()), e)
        })?;

        let store: Self = serde_json::from_str(&content)?;
        if store.version > STORE_VERSION {
            return Err(ReanchorError::unsupported(format!(
                "Point store version {} is newer than supported version {}",
                store.version, STORE_VERSION
            )));
        }

        debug!("Loaded {} point(s) from {}", store.points.len(), path.display());
        Ok(store)
    }

    /// Read a store, or start an empty one when the file does not exist
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Write the store through a temporary file persisted over `path`
    pub fn save(&self, path: &Path) -> Result<()> {
        let parent = match path.parent().filter(|p| !p.as_os_str().is_empty()) {
            Some(parent) => {
                fs::create_dir_all(parent).map_err(|e| {
                    ReanchorError::io(
                        format!("Failed to create store directory: {}", parent.display()),
                        e,
                    )
                })?;
                parent
            }
            None => Path::new("."),
        };

        let mut temp = NamedTempFile::new_in(parent).map_err(|e| {
            ReanchorError::io(
                format!("Failed to create temporary store in {}", parent.display()),
                e,
            )
        })?;
        serde_json::to_writer_pretty(&mut temp, self)?;
        temp.flush().map_err(|e| {
            ReanchorError::io(format!("Failed to write point store: {}", path.display()), e)
        })?;

        temp.persist(path).map_err(|e| {
            ReanchorError::io(
                format!("Failed to replace point store: {}", path.display()),
                e.error,
            )
        })?;
        debug!("Saved {} point(s) to {}", self.points.len(), path.display());
        Ok(())
    }

    /// Add a point and return its id
    pub fn add(&mut self, point: ConcernPoint) -> Uuid {
        let id = point.id;
        self.points.push(point);
        id
    }

    /// Point by id
    pub fn get(&self, id: Uuid) -> Option<&ConcernPoint> {
        self.points.iter().find(|p| p.id == id)
    }

    /// First point with that name
    pub fn find_by_name(&self, name: &str) -> Option<&ConcernPoint> {
        self.points.iter().find(|p| p.name == name)
    }

    /// Remove a point
    pub fn remove(&mut self, id: Uuid) -> Option<ConcernPoint> {
        let index = self.points.iter().position(|p| p.id == id)?;
        Some(self.points.remove(index))
    }

    /// Mutable point by id
    pub fn get_mut(&mut self, id: Uuid) -> Option<&mut ConcernPoint> {
        self.points.iter_mut().find(|p| p.id == id)
    }

    /// Number of points
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether no point is stored
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::context::{FileContext, PointContext, TextOrHash};

    fn context(file: &str, line: usize) -> PointContext {
        PointContext::new(
            "function",
            line,
            Vec::new(),
            TextOrHash::new("return compute_total(items, discount) + shipping_cost"),
            Vec::new(),
            Arc::new(FileContext {
                name: file.to_string(),
                line_count: 10,
                content: TextOrHash::default(),
            }),
        )
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/points.json");

        let mut store = PointStore::new();
        let id = store.add(ConcernPoint::new("total", context("cart.py", 3)));
        store.save(&path).unwrap();
        let leftovers = fs::read_dir(path.parent().unwrap()).unwrap().count();
        assert_eq!(leftovers, 1);

        let loaded = PointStore::load(&path).unwrap();
        assert_eq!(loaded, store);
        assert_eq!(loaded.get(id).unwrap().name, "total");
        assert_eq!(loaded.version, STORE_VERSION);
    }

    #[test]
    fn test_stores_sharing_a_stem_do_not_collide() {
        let dir = tempfile::tempdir().unwrap();
        let json = dir.path().join("points.json");
        let other = dir.path().join("points.store");

        let mut first = PointStore::new();
        first.add(ConcernPoint::new("first", context("a.py", 1)));
        let mut second = PointStore::new();
        second.add(ConcernPoint::new("second", context("b.py", 2)));

        first.save(&json).unwrap();
        second.save(&other).unwrap();
        first.save(&json).unwrap();

        assert_eq!(PointStore::load(&json).unwrap(), first);
        assert_eq!(PointStore::load(&other).unwrap(), second);
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 2);
    }

    #[test]
    fn test_missing_store_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = PointStore::load_or_default(&dir.path().join("absent.json")).unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn test_newer_versions_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("points.json");
        fs::write(&path, r#"{"version": 99, "points": []}"#).unwrap();

        let err = PointStore::load(&path).unwrap_err();
        assert!(matches!(err, ReanchorError::Unsupported { .. }));
    }

    #[test]
    fn test_malformed_store_is_a_serialization_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("points.json");
        fs::write(&path, "{not json").unwrap();

        let err = PointStore::load(&path).unwrap_err();
        assert!(matches!(err, ReanchorError::Serialization { .. }));
    }

    #[test]
    fn test_rebind_and_remove() {
        let mut store = PointStore::new();
        let id = store.add(ConcernPoint::new("total", context("cart.py", 3)));

        store.get_mut(id).unwrap().rebind(context("checkout.py", 8));
        let point = store.find_by_name("total").unwrap();
        assert_eq!(point.file_name, "checkout.py");
        assert_eq!(point.context.line, 8);

        assert!(store.get_mut(Uuid::new_v4()).is_none());
        assert!(store.remove(id).is_some());
        assert_eq!(store.len(), 0);
    }
}
