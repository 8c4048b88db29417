use std::sync::Arc;

use approx::assert_relative_eq;

use super::*;
use crate::context::{AncestorsContextElement, FileContext, HeaderContextElement, TextOrHash};
use crate::core::ast::{FileBuilder, NodeFlags, NodeId};
use crate::remap::search_area::AreaFile;

fn area_file() -> AreaFile {
    let mut b = FileBuilder::new("t.rs");
    let root = b.root();
    let function = b.open(root, "function", NodeFlags::land());
    b.leaf(function, "name", "t");
    b.close(function);
    AreaFile::new(Arc::new(b.finish()))
}

fn point(name: &str, inner: &str, ancestors: &[&str]) -> PointContext {
    let header = |value: &str| HeaderContextElement {
        kind: "name".into(),
        priority: 1.0,
        exact_match: false,
        value: vec![value.to_string()],
    };

    PointContext::new(
        "function",
        1,
        vec![header(name)],
        TextOrHash::new(inner),
        ancestors
            .iter()
            .map(|a| AncestorsContextElement {
                kind: "class".into(),
                header: vec![header(a)],
            })
            .collect(),
        Arc::new(FileContext {
            name: "t.rs".into(),
            line_count: 1,
            content: TextOrHash::default(),
        }),
    )
}

fn scored(h: f64, a: f64, i: f64) -> RemapCandidateInfo {
    with_context(point("other", "", &[]), h, a, i)
}

fn with_context(context: PointContext, h: f64, a: f64, i: f64) -> RemapCandidateInfo {
    let mut candidate = RemapCandidateInfo::new(NodeId(1), area_file(), Arc::new(context));
    candidate.header_similarity = h;
    candidate.ancestors_similarity = a;
    candidate.inner_similarity = i;
    candidate
}

#[test]
fn test_default_pipeline_runs_in_priority_order() {
    let pipeline = HeuristicPipeline::from_config(&ReanchorConfig::default());
    assert_eq!(
        pipeline.names(),
        vec![
            "empty_context",
            "low_inner_similarity",
            "separability",
            "default_weights",
            "identical_context",
            "perfect_header_ancestors",
        ]
    );
}

#[test]
fn test_registration_orders_by_priority_and_removal_by_name() {
    let mut pipeline = HeuristicPipeline::empty();
    pipeline
        .register_weights(DefaultWeightsHeuristic::default())
        .register_weights(EmptyContextHeuristic);
    assert_eq!(pipeline.names(), vec!["empty_context", "default_weights"]);

    assert!(pipeline.remove_heuristic("empty_context"));
    assert!(!pipeline.remove_heuristic("empty_context"));
    assert_eq!(pipeline.names(), vec!["default_weights"]);
}

#[test]
fn test_empty_context_zeroes_signals_without_content() {
    let target = point("foo", "", &[]);
    let candidates = vec![scored(0.5, 1.0, 1.0)];
    let mut weights = ContextWeights::default();

    EmptyContextHeuristic.tune(&target, &candidates, &mut weights);
    assert_eq!(weights.ancestors, Some(0.0));
    assert_eq!(weights.inner, Some(0.0));
    assert_eq!(weights.header, None);
}

#[test]
fn test_low_inner_similarity_disables_inner() {
    let target = point("foo", "return 1", &[]);
    let heuristic = LowInnerSimilarityHeuristic::default();

    let mut weights = ContextWeights::default();
    heuristic.tune(&target, &[scored(1.0, 1.0, 0.3), scored(1.0, 1.0, 0.5)], &mut weights);
    assert_eq!(weights.inner, Some(0.0));

    let mut weights = ContextWeights::default();
    heuristic.tune(&target, &[scored(1.0, 1.0, 0.3), scored(1.0, 1.0, 0.7)], &mut weights);
    assert_eq!(weights.inner, None);
}

#[test]
fn test_separability_ranks_signals_by_median_gap() {
    let target = point("foo", "return 1", &["Bar"]);
    let candidates = vec![
        scored(1.0, 1.0, 0.9),
        scored(0.5, 1.0, 0.8),
        scored(0.4, 1.0, 0.1),
    ];
    let mut weights = ContextWeights::default();

    SeparabilityHeuristic::default().tune(&target, &candidates, &mut weights);

    // header median gap 0.3, inner 0.4, ancestors do not separate at all
    assert_eq!(weights.ancestors, Some(1.0));
    assert_eq!(weights.header, Some(1.0));
    assert_eq!(weights.inner, Some(2.0));
}

#[test]
fn test_separability_needs_two_candidates() {
    let target = point("foo", "", &[]);
    let mut weights = ContextWeights::default();
    SeparabilityHeuristic::default().tune(&target, &[scored(1.0, 0.0, 0.0)], &mut weights);
    assert_eq!(weights, ContextWeights::default());
}

#[test]
fn test_separability_gives_weak_signals_unit_weight() {
    let target = point("foo", "", &[]);
    let candidates = vec![scored(0.5, 0.9, 0.9), scored(0.1, 0.88, 0.2)];
    let mut weights = ContextWeights::default();

    SeparabilityHeuristic::default().tune(&target, &candidates, &mut weights);
    // header best below acceptance, ancestors top-two gap below the margin
    assert_eq!(weights.header, Some(1.0));
    assert_eq!(weights.ancestors, Some(1.0));
    assert_eq!(weights.inner, Some(1.0));
}

#[test]
fn test_default_weights_fill_remaining_slots() {
    let target = point("foo", "", &[]);
    let mut weights = ContextWeights {
        inner: Some(0.0),
        ..ContextWeights::default()
    };
    DefaultWeightsHeuristic::default().tune(&target, &[], &mut weights);
    assert_eq!(weights.header, Some(3.0));
    assert_eq!(weights.ancestors, Some(2.0));
    assert_eq!(weights.inner, Some(0.0));
}

#[test]
fn test_perfect_header_and_ancestors_wins_regardless_of_inner() {
    let target = point("foo", "return 1", &["Bar"]);
    let mut candidates = vec![scored(0.5, 1.0, 1.0), scored(1.0, 1.0, 0.0)];

    HeuristicPipeline::from_config(&ReanchorConfig::default()).evaluate(&target, &mut candidates);

    assert_eq!(candidates[0].header_similarity, 1.0);
    assert_eq!(candidates[0].similarity, Some(1.0));
    assert!(candidates[1].similarity_or_zero() < 1.0);
}

#[test]
fn test_two_perfect_candidates_are_left_to_the_formula() {
    let target = point("foo", "return 1", &["Bar"]);
    let mut candidates = vec![scored(1.0, 1.0, 0.0), scored(1.0, 1.0, 0.0)];

    PerfectHeaderAncestorsHeuristic.apply(&target, &mut candidates);
    assert!(candidates.iter().all(|c| c.similarity.is_none()));
}

#[test]
fn test_identical_context_is_claimed() {
    let target = point("foo", "return 1", &["Bar"]);
    let mut candidates = vec![
        with_context(target.clone(), 1.0, 1.0, 1.0),
        with_context(point("foo", "return 2", &["Bar"]), 1.0, 1.0, 0.0),
    ];

    IdenticalContextHeuristic.apply(&target, &mut candidates);
    assert_eq!(candidates[0].similarity, Some(1.0));
    assert_eq!(candidates[1].similarity, None);
}

#[test]
fn test_evaluate_uses_weighted_average_and_sorts() {
    let target = point("foo", "return 1", &["Bar"]);
    let mut pipeline = HeuristicPipeline::empty();
    pipeline.register_weights(DefaultWeightsHeuristic::default());

    let mut candidates = vec![scored(0.2, 0.2, 0.2), scored(0.9, 0.6, 0.0)];
    pipeline.evaluate(&target, &mut candidates);

    // (3 * 0.9 + 2 * 0.6) / 6
    assert_relative_eq!(candidates[0].similarity_or_zero(), 0.65, epsilon = 1e-9);
    assert_relative_eq!(candidates[1].similarity_or_zero(), 0.2, epsilon = 1e-9);
    assert_eq!(candidates[0].weights.header, Some(3.0));
}
