//! Re-anchoring of concern points.
//!
//! [`ContextFinder`] owns the heuristic pipeline and the context cache and
//! relocates batches of [`ConcernPoint`]s inside a [`SearchArea`].

pub mod cache;
pub mod candidate;
pub mod finder;
pub mod heuristics;
pub mod point;
pub mod search_area;

pub use cache::{ContextCache, ContextDepth};
pub use candidate::{rank_order, ContextWeights, RemapCandidateInfo, Signal};
pub use finder::{ContextFinder, RemapResult, SearchScope};
pub use heuristics::{
    DefaultWeightsHeuristic, EmptyContextHeuristic, HeuristicPipeline,
    IdenticalContextHeuristic, LowInnerSimilarityHeuristic, PerfectHeaderAncestorsHeuristic,
    SeparabilityHeuristic, SimilarityHeuristic, WeightsHeuristic,
};
pub use point::ConcernPoint;
pub use search_area::{AreaFile, FileResolver, MemoryResolver, SearchArea};
