//! Text fragments stored either literally or as a fuzzy hash.

use serde::{Deserialize, Serialize};

use super::fuzzy_hash::FuzzyHash;
use crate::similarity::string_similarity;

/// Longest normalised text that is kept literally
pub const MAX_TEXT_LENGTH: usize = 100;

/// Texts up to this length are too short to be hashed meaningfully
pub const MIN_HASHABLE_LENGTH: usize = 25;

/// Scores below this ratio carry no signal and are reported as 0
pub const MIN_CONFIDENT_SIMILARITY: f64 = MIN_HASHABLE_LENGTH as f64 / MAX_TEXT_LENGTH as f64;

/// Normalised text with a literal and/or fuzzy representation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextOrHash {
    /// Normalised text, kept when at most [`MAX_TEXT_LENGTH`] characters
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Fuzzy hash, kept when longer than [`MIN_HASHABLE_LENGTH`] characters
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash: Option<FuzzyHash>,
    /// Length of the normalised text in characters
    pub text_length: usize,
}

impl Default for TextOrHash {
    fn default() -> Self {
        Self::new("")
    }
}

impl TextOrHash {
    /// Normalise `raw` and pick the representations its length allows
    pub fn new(raw: &str) -> Self {
        let normalized = normalize(raw);
        let text_length = normalized.chars().count();

        let hash = if text_length > MIN_HASHABLE_LENGTH {
            FuzzyHash::from_text(&normalized)
        } else {
            None
        };
        let text = (text_length <= MAX_TEXT_LENGTH).then_some(normalized);

        Self {
            text,
            hash,
            text_length,
        }
    }

    /// Whether there is any text at all
    pub fn has_content(&self) -> bool {
        self.text_length > 0
    }

    /// Whether the fragment is long enough to compare other than literally
    pub fn is_sufficient(&self) -> bool {
        self.hash.is_some() || self.text_length > MIN_HASHABLE_LENGTH
    }

    /// Similarity in `[0, 1]`
    pub fn compare(&self, other: &Self) -> f64 {
        if let (Some(a), Some(b)) = (&self.text, &other.text) {
            if a == b {
                return 1.0;
            }
        }

        if !self.is_sufficient() || !other.is_sufficient() {
            return 0.0;
        }

        let score = match (&self.hash, &other.hash) {
            (Some(a), Some(b)) => a.similarity(b),
            _ => match (&self.text, &other.text) {
                (Some(a), Some(b)) => string_similarity(a, b),
                _ => 0.0,
            },
        };

        if score < MIN_CONFIDENT_SIMILARITY {
            0.0
        } else {
            score.clamp(0.0, 1.0)
        }
    }
}

/// Lower-case and collapse every whitespace run into one space
pub fn normalize(raw: &str) -> String {
    raw.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}
