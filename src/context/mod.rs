//! Structural fingerprints of AST nodes.
//!
//! A [`PointContext`] describes a node by what surrounds and composes it rather
//! than by its position: the tokens that name it (header), the text inside it
//! (inner), the landmarks enclosing it (ancestors), its neighbours (siblings)
//! and the file it lives in. Contexts are plain data; extraction lives in
//! [`extraction`] and scoring in [`crate::similarity`].

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use xxhash_rust::xxh3::Xxh3;

pub mod extraction;
pub mod fuzzy_hash;
pub mod text_or_hash;

pub use extraction::ContextExtractor;
pub use fuzzy_hash::FuzzyHash;
pub use text_or_hash::{TextOrHash, MAX_TEXT_LENGTH, MIN_HASHABLE_LENGTH};

/// One token group of a header context
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeaderContextElement {
    /// Syntactic type of the contributing node
    pub kind: String,
    /// Weight of the element inside the sequence
    pub priority: f64,
    /// Values must be identical to count as similar
    pub exact_match: bool,
    /// Literal tokens
    pub value: Vec<String>,
}

impl HeaderContextElement {
    /// Same kind, priority and matching mode, values ignored
    pub fn equals_ignore_value(&self, other: &Self) -> bool {
        self.kind == other.kind
            && self.priority == other.priority
            && self.exact_match == other.exact_match
    }

    /// Tokens joined with single spaces
    pub fn joined_value(&self) -> String {
        self.value.join(" ")
    }
}

/// One enclosing landmark
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AncestorsContextElement {
    /// Syntactic type of the ancestor
    pub kind: String,
    /// Header of the ancestor
    pub header: Vec<HeaderContextElement>,
}

/// Text of the neighbours inside the nearest enclosing landmark
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiblingsContext {
    /// Preceding siblings
    pub before: TextOrHash,
    /// Following siblings
    pub after: TextOrHash,
}

/// The file a node was found in
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileContext {
    /// File name
    pub name: String,
    /// Number of lines
    pub line_count: usize,
    /// Whole file content
    pub content: TextOrHash,
}

/// Full fingerprint of a node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointContext {
    /// Syntactic type of the node
    pub kind: String,
    /// One-based start line
    pub line: usize,
    /// Naming tokens
    pub header: Vec<HeaderContextElement>,
    /// Descendant text
    pub inner: TextOrHash,
    /// Enclosing landmarks, nearest first
    pub ancestors: Vec<AncestorsContextElement>,
    /// Neighbour text, computed on demand
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub siblings: Option<SiblingsContext>,
    /// Origin file
    pub file: Arc<FileContext>,
    /// Hash of header values and inner text
    pub content_hash: u64,
    /// Hash of the ancestor chain
    pub ancestors_hash: u64,
    /// Core contexts of the most similar other nodes of the same kind,
    /// recorded when the point was created
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub closest: Option<Vec<PointContext>>,
}

/// Identity of a context for deduplication inside a batch
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContextKey {
    /// Syntactic type
    pub kind: String,
    /// Content hash
    pub content_hash: u64,
    /// Ancestors hash
    pub ancestors_hash: u64,
}

impl PointContext {
    /// Assemble a core context and compute its hashes
    pub fn new(
        kind: impl Into<String>,
        line: usize,
        header: Vec<HeaderContextElement>,
        inner: TextOrHash,
        ancestors: Vec<AncestorsContextElement>,
        file: Arc<FileContext>,
    ) -> Self {
        let content_hash = content_hash(&header, &inner);
        let ancestors_hash = ancestors_hash(&ancestors);

        Self {
            kind: kind.into(),
            line,
            header,
            inner,
            ancestors,
            siblings: None,
            file,
            content_hash,
            ancestors_hash,
            closest: None,
        }
    }

    /// Key identifying structurally identical contexts
    pub fn key(&self) -> ContextKey {
        ContextKey {
            kind: self.kind.clone(),
            content_hash: self.content_hash,
            ancestors_hash: self.ancestors_hash,
        }
    }

    /// Copy without siblings and closest contexts
    pub fn core(&self) -> Self {
        Self {
            siblings: None,
            closest: None,
            ..self.clone()
        }
    }

    /// Whether header values and the ancestor chain are identical
    pub fn is_identical_to(&self, other: &Self) -> bool {
        self.content_hash == other.content_hash && self.ancestors_hash == other.ancestors_hash
    }

    /// Recorded neighbours, empty when none were recorded
    pub fn closest_contexts(&self) -> &[PointContext] {
        self.closest.as_deref().unwrap_or(&[])
    }
}

const FIELD_SEPARATOR: &[u8] = b"\x1f";
const GROUP_SEPARATOR: &[u8] = b"\x1e";

fn update_with_header(hasher: &mut Xxh3, header: &[HeaderContextElement]) {
    for element in header {
        for token in &element.value {
            hasher.update(token.as_bytes());
            hasher.update(FIELD_SEPARATOR);
        }
        hasher.update(GROUP_SEPARATOR);
    }
}

fn content_hash(header: &[HeaderContextElement], inner: &TextOrHash) -> u64 {
    let mut hasher = Xxh3::new();
    update_with_header(&mut hasher, header);
    hasher.update(GROUP_SEPARATOR);

    match (&inner.text, &inner.hash) {
        (Some(text), _) => hasher.update(text.as_bytes()),
        (None, Some(hash)) => {
            for value in &hash.signature {
                hasher.update(&value.to_le_bytes());
            }
        }
        (None, None) => {}
    }
    hasher.update(&(inner.text_length as u64).to_le_bytes());

    hasher.digest()
}

fn ancestors_hash(ancestors: &[AncestorsContextElement]) -> u64 {
    let mut hasher = Xxh3::new();
    for ancestor in ancestors {
        hasher.update(ancestor.kind.as_bytes());
        hasher.update(FIELD_SEPARATOR);
        update_with_header(&mut hasher, &ancestor.header);
        hasher.update(GROUP_SEPARATOR);
    }
    hasher.digest()
}
