use approx::assert_relative_eq;
use proptest::prelude::*;

use super::*;
use crate::context::{AncestorsContextElement, HeaderContextElement};

fn header(kind: &str, value: &str) -> HeaderContextElement {
    HeaderContextElement {
        kind: kind.to_string(),
        priority: 1.0,
        exact_match: false,
        value: value.split_whitespace().map(str::to_string).collect(),
    }
}

fn weighted(kind: &str, value: &str, priority: f64) -> HeaderContextElement {
    HeaderContextElement {
        priority,
        ..header(kind, value)
    }
}

fn ancestor(kind: &str, name: &str) -> AncestorsContextElement {
    AncestorsContextElement {
        kind: kind.to_string(),
        header: vec![header("name", name)],
    }
}

fn chars(text: &str) -> Vec<char> {
    text.chars().collect()
}

#[test]
fn test_empty_sequences() {
    let empty: Vec<char> = Vec::new();
    assert_eq!(sequence_similarity(&empty, &empty), 1.0);
    assert_eq!(sequence_similarity(&chars("a"), &empty), 0.0);
    assert_eq!(sequence_similarity(&empty, &chars("a")), 0.0);

    let no_header: Vec<HeaderContextElement> = Vec::new();
    assert_eq!(grouped_sequence_similarity(&no_header, &no_header), 1.0);
    assert_eq!(
        grouped_sequence_similarity(&[header("name", "foo")], &no_header),
        0.0
    );
}

#[test]
fn test_plain_sequences_use_unit_costs() {
    let score = sequence_similarity(&chars("kitten"), &chars("sitting"));
    assert_relative_eq!(score, 1.0 - 3.0 / 7.0, epsilon = 1e-9);
    assert_eq!(sequence_similarity(&chars("same"), &chars("same")), 1.0);
}

#[test]
fn test_string_similarity_counts_characters() {
    assert_eq!(string_similarity("", ""), 1.0);
    assert_eq!(string_similarity("abc", ""), 0.0);
    assert_relative_eq!(string_similarity("foo", "foobar"), 0.5, epsilon = 1e-9);
    assert_relative_eq!(string_similarity("äb", "ab"), 0.5, epsilon = 1e-9);
}

#[test]
fn test_header_elements_compare_values_of_equal_structure() {
    let foo = header("name", "foo");
    assert_eq!(foo.similarity(&header("name", "foo")), 1.0);
    assert_relative_eq!(foo.similarity(&header("name", "foobar")), 0.5, epsilon = 1e-9);
    assert_eq!(foo.similarity(&header("param", "foo")), 0.0);
    assert_eq!(foo.similarity(&weighted("name", "foo", 2.0)), 0.0);

    let mut exact = header("keyword", "pub");
    exact.exact_match = true;
    let mut other = header("keyword", "pub crate");
    other.exact_match = true;
    assert_eq!(exact.similarity(&exact.clone()), 1.0);
    assert_eq!(exact.similarity(&other), 0.0);
}

#[test]
fn test_renamed_header_keeps_partial_similarity() {
    let score = grouped_sequence_similarity(&[header("name", "foo")], &[header("name", "foobar")]);
    assert_relative_eq!(score, 0.5, epsilon = 1e-9);
}

#[test]
fn test_header_priority_weighs_insertions() {
    let base = vec![weighted("name", "run", 3.0)];
    let with_param = vec![weighted("name", "run", 3.0), header("param", "x")];

    // one extra element of priority 1 against a total weight of 4
    let score = grouped_sequence_similarity(&base, &with_param);
    assert_relative_eq!(score, 0.75, epsilon = 1e-9);
}

#[test]
fn test_unrelated_structure_is_not_zero() {
    // substitution at cost 1 against a denominator of 2
    let score = grouped_sequence_similarity(&[header("name", "foo")], &[header("param", "foo")]);
    assert_relative_eq!(score, 0.5, epsilon = 1e-9);
}

#[test]
fn test_grouped_denominator_under_swapping() {
    let a = vec![header("name", "x"), header("name", "y")];
    let b = vec![header("name", "x"), weighted("param", "z", 2.0)];

    // all of a (2) plus the unpaired param of b (2), and vice versa:
    // all of b (3) plus the unpaired second name of a (1)
    assert_relative_eq!(grouped_denominator(&a, &b), 4.0, epsilon = 1e-9);
    assert_relative_eq!(grouped_denominator(&b, &a), 4.0, epsilon = 1e-9);

    let forward = grouped_sequence_similarity(&a, &b);
    let backward = grouped_sequence_similarity(&b, &a);
    assert_relative_eq!(forward, 0.75, epsilon = 1e-9);
    assert_relative_eq!(forward, backward, epsilon = 1e-9);
}

#[test]
fn test_ancestors_compare_kind_then_header() {
    let bar = ancestor("class", "Bar");
    assert_eq!(bar.similarity(&ancestor("class", "Bar")), 1.0);
    assert_relative_eq!(
        bar.similarity(&ancestor("class", "Baz")),
        2.0 / 3.0,
        epsilon = 1e-9
    );
    assert_eq!(bar.similarity(&ancestor("module", "Bar")), 0.0);

    let chain = vec![ancestor("function", "inner"), ancestor("class", "Bar")];
    let moved = vec![ancestor("function", "inner"), ancestor("class", "Baz")];
    let score = grouped_sequence_similarity(&chain, &moved);
    assert!(score > 0.5 && score < 1.0, "got {score}");
}

#[test]
fn test_common_prefix_and_suffix_are_free() {
    let a = chars("prefix-a-suffix");
    let b = chars("prefix-b-suffix");
    assert_relative_eq!(edit_cost(&a, &b), 1.0, epsilon = 1e-9);
}

fn header_sequence() -> impl Strategy<Value = Vec<HeaderContextElement>> {
    prop::collection::vec(
        (
            prop::sample::select(vec!["name", "param", "type"]),
            "[a-z]{1,6}",
            prop::sample::select(vec![0.5, 1.0, 2.0]),
        ),
        0..6,
    )
    .prop_map(|items| {
        items
            .into_iter()
            .map(|(kind, value, priority)| weighted(kind, &value, priority))
            .collect()
    })
}

proptest! {
    #[test]
    fn test_prop_string_similarity_is_bounded_and_symmetric(a in "[a-z ]{0,20}", b in "[a-z ]{0,20}") {
        let forward = string_similarity(&a, &b);
        prop_assert!((0.0..=1.0).contains(&forward));
        prop_assert!((forward - string_similarity(&b, &a)).abs() < 1e-12);
        prop_assert_eq!(string_similarity(&a, &a), 1.0);
    }

    #[test]
    fn test_prop_header_similarity_is_bounded(a in header_sequence(), b in header_sequence()) {
        let score = grouped_sequence_similarity(&a, &b);
        prop_assert!((0.0..=1.0).contains(&score), "score {} out of range", score);
    }

    #[test]
    fn test_prop_header_similarity_identity(a in header_sequence()) {
        prop_assert_eq!(grouped_sequence_similarity(&a, &a), 1.0);
    }

    #[test]
    fn test_prop_empty_only_matches_empty(a in header_sequence()) {
        let expected = if a.is_empty() { 1.0 } else { 0.0 };
        prop_assert_eq!(grouped_sequence_similarity(&a, &[]), expected);
    }
}
