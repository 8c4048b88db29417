//! Locality-sensitive fingerprints for long text fragments.
//!
//! A fuzzy hash is a MinHash signature over overlapping character shingles of
//! already normalised text. The fraction of equal signature slots estimates
//! the Jaccard similarity of the two shingle sets, so small edits in long
//! text keep most slots intact.

use serde::{Deserialize, Serialize};
use xxhash_rust::xxh3::xxh3_64_with_seed;

/// Number of hash functions (signature slots)
pub const SIGNATURE_SIZE: usize = 64;

/// Characters per shingle
pub const SHINGLE_SIZE: usize = 4;

/// MinHash signature of a text fragment
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FuzzyHash {
    /// The signature values
    pub signature: Vec<u64>,
}

impl FuzzyHash {
    /// Fingerprint normalised text; `None` when it is shorter than one shingle
    pub fn from_text(normalized: &str) -> Option<Self> {
        let shingles = create_shingles(normalized, SHINGLE_SIZE);
        if shingles.is_empty() {
            return None;
        }

        let mut signature = vec![u64::MAX; SIGNATURE_SIZE];
        for shingle in shingles {
            for (seed, slot) in signature.iter_mut().enumerate() {
                let hash = hash_with_seed(shingle, seed as u64);
                if hash < *slot {
                    *slot = hash;
                }
            }
        }

        Some(Self { signature })
    }

    /// Estimated Jaccard similarity of the underlying shingle sets
    pub fn similarity(&self, other: &Self) -> f64 {
        if self.signature.len() != other.signature.len() || self.signature.is_empty() {
            return 0.0;
        }

        let matching = self
            .signature
            .iter()
            .zip(other.signature.iter())
            .filter(|(a, b)| a == b)
            .count();

        matching as f64 / self.signature.len() as f64
    }
}

/// Overlapping windows of `size` characters
fn create_shingles(text: &str, size: usize) -> Vec<&str> {
    let boundaries: Vec<usize> = text
        .char_indices()
        .map(|(offset, _)| offset)
        .chain(std::iter::once(text.len()))
        .collect();

    if size == 0 || boundaries.len() <= size {
        return Vec::new();
    }

    (0..boundaries.len() - size)
        .map(|i| &text[boundaries[i]..boundaries[i + size]])
        .collect()
}

/// Hash a string with a seed using xxHash3.
fn hash_with_seed(data: &str, seed: u64) -> u64 {
    xxh3_64_with_seed(data.as_bytes(), seed)
}
