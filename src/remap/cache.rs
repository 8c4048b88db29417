//! Memoised node contexts with pin back-references.
//!
//! Each entry remembers which pins reference it. Nothing is evicted
//! automatically: callers detach pins and then [`ContextCache::sweep`] the
//! entries nobody references any more.

use std::collections::HashSet;
use std::sync::Arc;

use dashmap::DashMap;
use tracing::debug;
use uuid::Uuid;

use crate::context::PointContext;
use crate::core::ast::NodeId;

/// How much of a context has been computed
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ContextDepth {
    /// Header, inner, ancestors and file
    Core,
    /// Core plus siblings
    WithSiblings,
    /// Siblings plus closest contexts
    WithClosest,
}

/// Cache key: file name and node id
pub type CacheKey = (String, NodeId);

#[derive(Debug)]
struct CacheEntry {
    context: Arc<PointContext>,
    depth: ContextDepth,
    revision: u64,
    pins: HashSet<Uuid>,
}

/// Concurrent context cache
#[derive(Debug, Default)]
pub struct ContextCache {
    entries: DashMap<CacheKey, CacheEntry>,
}

impl ContextCache {
    /// Empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached context of at least `depth`, computing it when missing.
    ///
    /// `compute` receives the shallower context already cached for the same
    /// revision, if any, and must return a context of the requested depth.
    /// An entry of a different revision (the file was re-parsed) is replaced
    /// and loses its pins.
    pub fn get_or_compute<F>(
        &self,
        file_name: &str,
        revision: u64,
        node: NodeId,
        depth: ContextDepth,
        compute: F,
    ) -> Arc<PointContext>
    where
        F: FnOnce(Option<&PointContext>) -> PointContext,
    {
        let key = (file_name.to_string(), node);

        let existing = self
            .entries
            .get(&key)
            .filter(|entry| entry.revision == revision)
            .map(|entry| (entry.depth, Arc::clone(&entry.context)));

        if let Some((cached_depth, context)) = &existing {
            if *cached_depth >= depth {
                return Arc::clone(context);
            }
        }

        // computed outside any shard lock: `compute` may read the cache itself
        let computed = Arc::new(compute(existing.as_ref().map(|(_, context)| context.as_ref())));

        let mut entry = self.entries.entry(key).or_insert_with(|| CacheEntry {
            context: Arc::clone(&computed),
            depth,
            revision,
            pins: HashSet::new(),
        });

        if entry.revision != revision {
            entry.revision = revision;
            entry.pins.clear();
            entry.depth = depth;
            entry.context = Arc::clone(&computed);
        } else if entry.depth < depth {
            entry.depth = depth;
            entry.context = Arc::clone(&computed);
        }

        Arc::clone(&entry.context)
    }

    /// Cached context, if any
    pub fn get(&self, file_name: &str, node: NodeId) -> Option<Arc<PointContext>> {
        self.entries
            .get(&(file_name.to_string(), node))
            .map(|entry| Arc::clone(&entry.context))
    }

    /// Record that `pin` references the node; false when the node is not cached
    pub fn attach(&self, file_name: &str, node: NodeId, pin: Uuid) -> bool {
        match self.entries.get_mut(&(file_name.to_string(), node)) {
            Some(mut entry) => {
                entry.pins.insert(pin);
                true
            }
            None => false,
        }
    }

    /// Drop the reference of `pin`; false when it was not attached
    pub fn detach(&self, file_name: &str, node: NodeId, pin: Uuid) -> bool {
        self.entries
            .get_mut(&(file_name.to_string(), node))
            .map_or(false, |mut entry| entry.pins.remove(&pin))
    }

    /// Drop every reference of `pin`; returns how many entries held it
    pub fn detach_pin(&self, pin: Uuid) -> usize {
        self.entries
            .iter_mut()
            .map(|mut entry| entry.pins.remove(&pin))
            .filter(|removed| *removed)
            .count()
    }

    /// Number of pins referencing the node
    pub fn pin_count(&self, file_name: &str, node: NodeId) -> usize {
        self.entries
            .get(&(file_name.to_string(), node))
            .map_or(0, |entry| entry.pins.len())
    }

    /// Remove every entry without pins; returns how many were removed
    pub fn sweep(&self) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.pins.is_empty());
        let removed = before.saturating_sub(self.entries.len());
        debug!("Context cache sweep removed {} entries", removed);
        removed
    }

    /// Remove every entry of a file; returns how many were removed
    pub fn invalidate_file(&self, file_name: &str) -> usize {
        let before = self.entries.len();
        self.entries.retain(|(name, _), _| name != file_name);
        before.saturating_sub(self.entries.len())
    }

    /// Number of cached contexts
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop everything
    pub fn clear(&self) {
        self.entries.clear();
    }
}
