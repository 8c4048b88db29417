//! Pluggable rules tuning how candidates are scored.
//!
//! Weights heuristics decide how much each signal counts for a point; the
//! first heuristic (by priority) to decide a signal wins. Similarity
//! heuristics may then override the aggregate score of individual
//! candidates. Whatever remains undecided is scored with the weighted average.

use std::cmp::Reverse;

use super::candidate::{rank_order, ContextWeights, RemapCandidateInfo, Signal};
use crate::context::PointContext;
use crate::core::config::{DefaultWeights, ReanchorConfig};

/// Decides signal weights for a point
pub trait WeightsHeuristic: Send + Sync {
    /// Unique name, used for deregistration
    fn name(&self) -> &'static str;

    /// Higher priorities run first
    fn priority(&self) -> i32;

    /// Fill undecided slots of `weights`
    fn tune(
        &self,
        point: &PointContext,
        candidates: &[RemapCandidateInfo],
        weights: &mut ContextWeights,
    );
}

/// Overrides the aggregate similarity of candidates
pub trait SimilarityHeuristic: Send + Sync {
    /// Unique name, used for deregistration
    fn name(&self) -> &'static str;

    /// Higher priorities run first
    fn priority(&self) -> i32;

    /// Set `similarity` on the candidates this rule decides
    fn apply(&self, point: &PointContext, candidates: &mut [RemapCandidateInfo]);
}

/// Zero weight for signals nobody has content for
#[derive(Debug, Default, Clone)]
pub struct EmptyContextHeuristic;

impl EmptyContextHeuristic {
    fn has_content(context: &PointContext, signal: Signal) -> bool {
        match signal {
            Signal::Header => !context.header.is_empty(),
            Signal::Ancestors => !context.ancestors.is_empty(),
            Signal::Inner => context.inner.has_content(),
        }
    }
}

impl WeightsHeuristic for EmptyContextHeuristic {
    fn name(&self) -> &'static str {
        "empty_context"
    }

    fn priority(&self) -> i32 {
        100
    }

    fn tune(
        &self,
        point: &PointContext,
        candidates: &[RemapCandidateInfo],
        weights: &mut ContextWeights,
    ) {
        for signal in weights.unset() {
            let anyone_has_content = Self::has_content(point, signal)
                || candidates
                    .iter()
                    .any(|candidate| Self::has_content(&candidate.context, signal));
            if !anyone_has_content {
                weights.fill(signal, 0.0);
            }
        }
    }
}

/// Ignore inner text when no candidate resembles the point's
#[derive(Debug, Clone)]
pub struct LowInnerSimilarityHeuristic {
    /// Inner similarity some candidate must reach
    pub ceiling: f64,
}

impl Default for LowInnerSimilarityHeuristic {
    fn default() -> Self {
        Self { ceiling: 0.7 }
    }
}

impl WeightsHeuristic for LowInnerSimilarityHeuristic {
    fn name(&self) -> &'static str {
        "low_inner_similarity"
    }

    fn priority(&self) -> i32 {
        80
    }

    fn tune(
        &self,
        _point: &PointContext,
        candidates: &[RemapCandidateInfo],
        weights: &mut ContextWeights,
    ) {
        if weights.inner.is_some() {
            return;
        }

        if !candidates
            .iter()
            .any(|candidate| candidate.inner_similarity >= self.ceiling)
        {
            weights.fill(Signal::Inner, 0.0);
        }
    }
}

/// Favour the signals that separate the best candidates most clearly
#[derive(Debug, Clone)]
pub struct SeparabilityHeuristic {
    /// Number of top values inspected per signal
    pub window: usize,
    /// Best value a signal must reach to be ranked
    pub acceptance_threshold: f64,
    /// Minimal gap between the two best values for a signal to be ranked
    pub margin: f64,
}

impl Default for SeparabilityHeuristic {
    fn default() -> Self {
        Self {
            window: 5,
            acceptance_threshold: 0.6,
            margin: 0.05,
        }
    }
}

impl SeparabilityHeuristic {
    /// Median gap between consecutive top values, or `None` when the signal
    /// does not separate the top two candidates
    fn separation(&self, mut values: Vec<f64>) -> Option<f64> {
        values.sort_by(|a, b| b.total_cmp(a));
        values.truncate(self.window.max(2));

        let best = values[0];
        if best < self.acceptance_threshold || best - values[1] < self.margin {
            return None;
        }

        let mut gaps: Vec<f64> = values.windows(2).map(|pair| pair[0] - pair[1]).collect();
        gaps.sort_by(|a, b| a.total_cmp(b));
        let middle = gaps.len() / 2;
        Some(if gaps.len() % 2 == 0 {
            (gaps[middle - 1] + gaps[middle]) / 2.0
        } else {
            gaps[middle]
        })
    }
}

impl WeightsHeuristic for SeparabilityHeuristic {
    fn name(&self) -> &'static str {
        "separability"
    }

    fn priority(&self) -> i32 {
        50
    }

    fn tune(
        &self,
        _point: &PointContext,
        candidates: &[RemapCandidateInfo],
        weights: &mut ContextWeights,
    ) {
        if candidates.len() < 2 {
            return;
        }

        let mut ranked: Vec<(Signal, f64)> = Vec::new();
        for signal in weights.unset() {
            let values = candidates.iter().map(|c| c.score(signal)).collect();
            match self.separation(values) {
                Some(gap) => ranked.push((signal, gap)),
                None => weights.fill(signal, 1.0),
            }
        }

        ranked.sort_by(|a, b| a.1.total_cmp(&b.1));
        let mut rank = 0;
        for i in 0..ranked.len() {
            if i > 0 && ranked[i].1 > ranked[i - 1].1 {
                rank += 1;
            }
            weights.fill(ranked[i].0, 1.0 + rank as f64);
        }
    }
}

/// Fixed fallback weights
#[derive(Debug, Default, Clone)]
pub struct DefaultWeightsHeuristic {
    /// Weights applied to undecided signals
    pub weights: DefaultWeights,
}

impl WeightsHeuristic for DefaultWeightsHeuristic {
    fn name(&self) -> &'static str {
        "default_weights"
    }

    fn priority(&self) -> i32 {
        0
    }

    fn tune(
        &self,
        _point: &PointContext,
        _candidates: &[RemapCandidateInfo],
        weights: &mut ContextWeights,
    ) {
        weights.fill(Signal::Header, self.weights.header);
        weights.fill(Signal::Ancestors, self.weights.ancestors);
        weights.fill(Signal::Inner, self.weights.inner);
    }
}

/// A single candidate with exactly the point's header, inner text and ancestors
#[derive(Debug, Default, Clone)]
pub struct IdenticalContextHeuristic;

impl SimilarityHeuristic for IdenticalContextHeuristic {
    fn name(&self) -> &'static str {
        "identical_context"
    }

    fn priority(&self) -> i32 {
        100
    }

    fn apply(&self, point: &PointContext, candidates: &mut [RemapCandidateInfo]) {
        let mut identical = candidates
            .iter_mut()
            .filter(|candidate| candidate.context.is_identical_to(point));

        if let (Some(only), None) = (identical.next(), identical.next()) {
            only.similarity = Some(1.0);
        }
    }
}

/// A single candidate with perfect header and ancestors, whatever its inner text
#[derive(Debug, Default, Clone)]
pub struct PerfectHeaderAncestorsHeuristic;

impl SimilarityHeuristic for PerfectHeaderAncestorsHeuristic {
    fn name(&self) -> &'static str {
        "perfect_header_ancestors"
    }

    fn priority(&self) -> i32 {
        50
    }

    fn apply(&self, _point: &PointContext, candidates: &mut [RemapCandidateInfo]) {
        let mut perfect = candidates.iter_mut().filter(|candidate| {
            super::candidate::is_perfect(candidate.header_similarity)
                && super::candidate::is_perfect(candidate.ancestors_similarity)
        });

        if let (Some(only), None) = (perfect.next(), perfect.next()) {
            only.similarity = Some(1.0);
        }
    }
}

/// Ordered weights and similarity heuristics
#[derive(Default)]
pub struct HeuristicPipeline {
    weights: Vec<Box<dyn WeightsHeuristic>>,
    similarity: Vec<Box<dyn SimilarityHeuristic>>,
}

impl std::fmt::Debug for HeuristicPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HeuristicPipeline")
            .field("weights", &self.weights.iter().map(|h| h.name()).collect::<Vec<_>>())
            .field(
                "similarity",
                &self.similarity.iter().map(|h| h.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl HeuristicPipeline {
    /// Pipeline without any heuristic
    pub fn empty() -> Self {
        Self::default()
    }

    /// The built-in heuristics parameterised by `config`
    pub fn from_config(config: &ReanchorConfig) -> Self {
        let heuristics = &config.heuristics;
        let mut pipeline = Self::empty();

        pipeline
            .register_weights(EmptyContextHeuristic)
            .register_weights(LowInnerSimilarityHeuristic {
                ceiling: heuristics.inner_similarity_ceiling,
            })
            .register_weights(SeparabilityHeuristic {
                window: heuristics.separability_window,
                acceptance_threshold: config.matching.acceptance_threshold,
                margin: heuristics.separation_margin,
            })
            .register_weights(DefaultWeightsHeuristic {
                weights: heuristics.default_weights,
            })
            .register_similarity(IdenticalContextHeuristic)
            .register_similarity(PerfectHeaderAncestorsHeuristic);

        pipeline
    }

    /// Add a weights heuristic, keeping priority order
    pub fn register_weights(&mut self, heuristic: impl WeightsHeuristic + 'static) -> &mut Self {
        self.weights.push(Box::new(heuristic));
        self.weights.sort_by_key(|h| Reverse(h.priority()));
        self
    }

    /// Add a similarity heuristic, keeping priority order
    pub fn register_similarity(
        &mut self,
        heuristic: impl SimilarityHeuristic + 'static,
    ) -> &mut Self {
        self.similarity.push(Box::new(heuristic));
        self.similarity.sort_by_key(|h| Reverse(h.priority()));
        self
    }

    /// Remove every heuristic of that name; returns whether one was removed
    pub fn remove_heuristic(&mut self, name: &str) -> bool {
        let before = self.weights.len() + self.similarity.len();
        self.weights.retain(|h| h.name() != name);
        self.similarity.retain(|h| h.name() != name);
        before != self.weights.len() + self.similarity.len()
    }

    /// Names of the registered heuristics in execution order
    pub fn names(&self) -> Vec<&'static str> {
        self.weights
            .iter()
            .map(|h| h.name())
            .chain(self.similarity.iter().map(|h| h.name()))
            .collect()
    }

    /// Decide weights and similarities of `candidates` (already holding raw
    /// scores against `point`) and sort them by rank
    pub fn evaluate(&self, point: &PointContext, candidates: &mut [RemapCandidateInfo]) {
        let mut weights = ContextWeights::default();
        for heuristic in &self.weights {
            heuristic.tune(point, candidates, &mut weights);
        }

        for candidate in candidates.iter_mut() {
            candidate.weights = weights;
            candidate.similarity = None;
        }

        for heuristic in &self.similarity {
            heuristic.apply(point, candidates);
        }

        for candidate in candidates.iter_mut() {
            if candidate.similarity.is_none() {
                candidate.similarity = Some(candidate.weighted_similarity());
            }
        }

        candidates.sort_by(rank_order);
    }
}

#[cfg(test)]
#[path = "heuristics_tests.rs"]
mod tests;
