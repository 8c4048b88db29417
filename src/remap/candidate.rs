//! Scored candidates for a pinned point.

use std::cmp::Ordering;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::search_area::AreaFile;
use crate::context::PointContext;
use crate::core::ast::NodeId;
use crate::core::config::DefaultWeights;
use crate::similarity::grouped_sequence_similarity;

/// Similarity signals combined into the aggregate score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Signal {
    /// Header context
    Header,
    /// Ancestors context
    Ancestors,
    /// Inner context
    Inner,
}

impl Signal {
    /// Every signal in aggregation order
    pub const ALL: [Signal; 3] = [Signal::Header, Signal::Ancestors, Signal::Inner];
}

/// Per-signal weights; unset slots are filled by later heuristics
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ContextWeights {
    /// Header weight
    pub header: Option<f64>,
    /// Ancestors weight
    pub ancestors: Option<f64>,
    /// Inner weight
    pub inner: Option<f64>,
}

impl ContextWeights {
    /// Fully specified weights
    pub fn from_defaults(defaults: DefaultWeights) -> Self {
        Self {
            header: Some(defaults.header),
            ancestors: Some(defaults.ancestors),
            inner: Some(defaults.inner),
        }
    }

    /// Weight of a signal, if decided
    pub fn get(&self, signal: Signal) -> Option<f64> {
        match signal {
            Signal::Header => self.header,
            Signal::Ancestors => self.ancestors,
            Signal::Inner => self.inner,
        }
    }

    /// Decide the weight of a signal unless it is already decided
    pub fn fill(&mut self, signal: Signal, weight: f64) {
        let slot = match signal {
            Signal::Header => &mut self.header,
            Signal::Ancestors => &mut self.ancestors,
            Signal::Inner => &mut self.inner,
        };
        slot.get_or_insert(weight);
    }

    /// Signals still undecided
    pub fn unset(&self) -> Vec<Signal> {
        Signal::ALL
            .into_iter()
            .filter(|signal| self.get(*signal).is_none())
            .collect()
    }

    /// Weighted average of three scores; undecided weights count as 0 and
    /// all-zero weights fall back to the plain mean
    pub fn aggregate(&self, header: f64, ancestors: f64, inner: f64) -> f64 {
        let weights = [
            self.header.unwrap_or(0.0),
            self.ancestors.unwrap_or(0.0),
            self.inner.unwrap_or(0.0),
        ];
        let scores = [header, ancestors, inner];
        let total: f64 = weights.iter().sum();

        let value = if total <= 0.0 {
            scores.iter().sum::<f64>() / scores.len() as f64
        } else {
            weights
                .iter()
                .zip(scores.iter())
                .map(|(w, s)| w * s)
                .sum::<f64>()
                / total
        };

        value.clamp(0.0, 1.0)
    }
}

/// One candidate node and how well it matches a point
#[derive(Debug, Clone)]
pub struct RemapCandidateInfo {
    /// Candidate node
    pub node: NodeId,
    /// File holding the node
    pub file: AreaFile,
    /// Core context of the node (siblings added lazily)
    pub context: Arc<PointContext>,
    /// Header similarity to the point
    pub header_similarity: f64,
    /// Ancestors similarity to the point
    pub ancestors_similarity: f64,
    /// Inner similarity to the point
    pub inner_similarity: f64,
    /// Similarity of the preceding siblings, when compared
    pub before_similarity: Option<f64>,
    /// Similarity of the following siblings, when compared
    pub after_similarity: Option<f64>,
    /// Aggregate similarity, unset until a heuristic or the weighted formula decides
    pub similarity: Option<f64>,
    /// Accepted without human review
    pub is_auto: bool,
    /// Weights used for the aggregate
    pub weights: ContextWeights,
    pub(crate) slot: usize,
}

impl RemapCandidateInfo {
    /// Unscored candidate
    pub fn new(node: NodeId, file: AreaFile, context: Arc<PointContext>) -> Self {
        Self {
            node,
            file,
            context,
            header_similarity: 0.0,
            ancestors_similarity: 0.0,
            inner_similarity: 0.0,
            before_similarity: None,
            after_similarity: None,
            similarity: None,
            is_auto: false,
            weights: ContextWeights::default(),
            slot: 0,
        }
    }

    /// Copy of this candidate with raw similarities against `point`
    pub fn scored_against(&self, point: &PointContext) -> Self {
        let mut scored = self.clone();
        scored.header_similarity =
            grouped_sequence_similarity(&point.header, &self.context.header);
        scored.ancestors_similarity =
            grouped_sequence_similarity(&point.ancestors, &self.context.ancestors);
        scored.inner_similarity = point.inner.compare(&self.context.inner);
        scored
    }

    /// Raw score of one signal
    pub fn score(&self, signal: Signal) -> f64 {
        match signal {
            Signal::Header => self.header_similarity,
            Signal::Ancestors => self.ancestors_similarity,
            Signal::Inner => self.inner_similarity,
        }
    }

    /// Weighted aggregate of the raw scores
    pub fn weighted_similarity(&self) -> f64 {
        self.weights.aggregate(
            self.header_similarity,
            self.ancestors_similarity,
            self.inner_similarity,
        )
    }

    /// Decided similarity, 0 while undecided
    pub fn similarity_or_zero(&self) -> f64 {
        self.similarity.unwrap_or(0.0)
    }

    /// Whether the aggregate similarity is 1
    pub fn is_perfect(&self) -> bool {
        self.similarity.map_or(false, is_perfect)
    }

    /// Name of the file holding the node
    pub fn file_name(&self) -> &str {
        &self.file.parsed.name
    }

    /// One-based start line of the node
    pub fn line(&self) -> usize {
        self.context.line
    }

    /// Start offset of the node
    pub fn start_offset(&self) -> usize {
        self.file
            .parsed
            .tree
            .get(self.node)
            .and_then(|node| node.span)
            .map(|span| span.start)
            .unwrap_or(0)
    }
}

/// Whether a score counts as a perfect match
pub fn is_perfect(score: f64) -> bool {
    score >= 1.0 - 1e-12
}

/// Ranking order: similarity descending, then file name, then position
pub fn rank_order(a: &RemapCandidateInfo, b: &RemapCandidateInfo) -> Ordering {
    b.similarity_or_zero()
        .total_cmp(&a.similarity_or_zero())
        .then_with(|| a.file_name().cmp(b.file_name()))
        .then_with(|| a.start_offset().cmp(&b.start_offset()))
}
