use std::sync::Arc;

use super::*;
use crate::context::{FileContext, HeaderContextElement, TextOrHash};
use crate::core::ast::{FileBuilder, NodeFlags, ParsedFile};
use crate::remap::heuristics::SimilarityHeuristic;
use crate::remap::search_area::{FileResolver, MemoryResolver};

struct Func {
    name: &'static str,
    params: &'static [&'static str],
    body: &'static str,
}

fn func(name: &'static str, params: &'static [&'static str], body: &'static str) -> Func {
    Func { name, params, body }
}

/// `class <class_name>` holding the given functions, one per line
fn class_file(file_name: &str, class_name: &str, functions: &[Func]) -> ParsedFile {
    let mut b = FileBuilder::new(file_name);
    let root = b.root();
    let class = b.open(root, "class", NodeFlags::land());
    b.leaf(class, "name", class_name);
    b.newline();
    let body = b.open(class, "body", NodeFlags::hidden());

    for f in functions {
        let function = b.open(body, "function", NodeFlags::land());
        b.leaf(function, "name", f.name);
        if !f.params.is_empty() {
            let params = b.open(function, "params", NodeFlags::default());
            for param in f.params {
                b.leaf(params, "param", param);
            }
            b.close(params);
        }
        let block = b.open(function, "block", NodeFlags::hidden());
        for token in f.body.split_whitespace() {
            b.leaf(block, "token", token);
        }
        b.close(block);
        b.close(function);
        b.newline();
    }

    b.close(body);
    b.close(class);
    b.finish()
}

fn functions_named(file: &ParsedFile, name: &str) -> Vec<NodeId> {
    file.tree
        .nodes_of_kind("function")
        .into_iter()
        .filter(|id| {
            file.tree
                .children(*id)
                .first()
                .map_or(false, |child| file.tree.node(*child).value == vec![name.to_string()])
        })
        .collect()
}

fn pin(finder: &ContextFinder, area: &SearchArea, file_name: &str, name: &str, nth: usize) -> ConcernPoint {
    let file = area.file(file_name).expect("file in area");
    let node = functions_named(&file.parsed, name)[nth];
    finder.pin(name, &file, node, area)
}

fn finder_with(configure: impl FnOnce(&mut ReanchorConfig)) -> ContextFinder {
    let mut config = ReanchorConfig::default();
    configure(&mut config);
    ContextFinder::new(config).expect("valid config")
}

fn node_name(candidate: &RemapCandidateInfo) -> String {
    candidate.context.header[0].joined_value()
}

#[test]
fn test_perfect_header_and_ancestors_beat_similar_inner() {
    let finder = finder_with(|_| {});
    let original = SearchArea::from_files([class_file(
        "bar.py",
        "Bar",
        &[func("foo", &[], "return 1 + compute_total(items, discount)")],
    )]);
    let point = pin(&finder, &original, "bar.py", "foo", 0);

    let updated = class_file(
        "bar.py",
        "Bar",
        &[
            func("foo", &[], "raise NotImplementedError('gone')"),
            func("foobar", &[], "return 1 + compute_total(items, discount)"),
        ],
    );
    let expected = functions_named(&updated, "foo")[0];
    let area = SearchArea::from_files([updated]);

    let result = finder.find(&[point.clone()], &area, SearchScope::Local);
    let candidates = &result[&point.id];

    assert_eq!(candidates.len(), 1);
    assert!(candidates[0].is_auto);
    assert_eq!(candidates[0].similarity, Some(1.0));
    assert_eq!(candidates[0].node, expected);
}

#[test]
fn test_claimed_candidate_is_not_offered_to_other_points() {
    let finder = finder_with(|_| {});
    let original = SearchArea::from_files([class_file(
        "bar.py",
        "Bar",
        &[
            func("foo", &[], "return first_branch(value)"),
            func("foo", &[], "return second_branch(value)"),
        ],
    )]);
    let first = pin(&finder, &original, "bar.py", "foo", 0);
    let second = pin(&finder, &original, "bar.py", "foo", 1);
    assert_ne!(first.context.key(), second.context.key());

    let updated = class_file("bar.py", "Bar", &[func("foo", &[], "return merged(value)")]);
    let only = functions_named(&updated, "foo")[0];
    let area = SearchArea::from_files([updated]);

    let result = finder.find(&[first.clone(), second.clone()], &area, SearchScope::Local);

    assert!(result[&first.id][0].is_auto);
    assert_eq!(result[&first.id][0].node, only);
    assert!(result[&second.id].iter().all(|c| c.node != only));
}

#[test]
fn test_identical_points_share_their_outcome() {
    let finder = finder_with(|_| {});
    let area = SearchArea::from_files([class_file(
        "bar.py",
        "Bar",
        &[func("foo", &[], "return 1"), func("baz", &[], "return 2")],
    )]);
    let a = pin(&finder, &area, "bar.py", "foo", 0);
    let b = ConcernPoint::new("copy", a.context.clone());

    let result = finder.find(&[a.clone(), b.clone()], &area, SearchScope::Local);
    assert_eq!(result.len(), 2);
    assert!(result[&a.id][0].is_auto);
    assert_eq!(result[&a.id][0].node, result[&b.id][0].node);
}

/// Similarity taken verbatim from the inner score
struct ScriptedSimilarity;

impl SimilarityHeuristic for ScriptedSimilarity {
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn priority(&self) -> i32 {
        0
    }

    fn apply(&self, _point: &PointContext, candidates: &mut [RemapCandidateInfo]) {
        for candidate in candidates.iter_mut() {
            candidate.similarity = Some(candidate.inner_similarity);
        }
    }
}

fn scripted_outcome(scores: &[f64]) -> Vec<RemapCandidateInfo> {
    let mut pipeline = HeuristicPipeline::empty();
    pipeline.register_similarity(ScriptedSimilarity);
    let finder = ContextFinder::with_pipeline(ReanchorConfig::default(), pipeline).unwrap();

    let file = AreaFile::new(Arc::new(class_file("s.py", "S", &[func("f", &[], "")])));
    let context = Arc::new(PointContext::new(
        "function",
        1,
        vec![HeaderContextElement {
            kind: "name".into(),
            priority: 1.0,
            exact_match: false,
            value: vec!["f".into()],
        }],
        TextOrHash::default(),
        Vec::new(),
        Arc::new(FileContext {
            name: "s.py".into(),
            line_count: 1,
            content: TextOrHash::default(),
        }),
    ));

    let scored: Vec<RemapCandidateInfo> = scores
        .iter()
        .enumerate()
        .map(|(slot, score)| {
            let mut candidate =
                RemapCandidateInfo::new(NodeId(slot as u32), file.clone(), Arc::clone(&context));
            candidate.inner_similarity = *score;
            candidate.slot = slot;
            candidate
        })
        .collect();

    let mut outcome = GroupMatcher::with_scores(
        &finder,
        vec![context.as_ref()],
        vec![scored],
        scores.len(),
        SearchScope::Local,
    )
    .run();
    outcome.remove(0)
}

#[test]
fn test_assignment_accepts_distinctive_winner() {
    // 1 - 0.92 = 0.08 >= (1 - 0.95) * 1.5 = 0.075
    let outcome = scripted_outcome(&[0.95, 0.92, 0.30]);
    assert_eq!(outcome.len(), 1);
    assert!(outcome[0].is_auto);
    assert_eq!(outcome[0].node, NodeId(0));
}

#[test]
fn test_assignment_rejects_narrow_margin() {
    // 1 - 0.93 = 0.07 < 0.075
    let outcome = scripted_outcome(&[0.95, 0.93, 0.30]);
    assert_eq!(outcome.len(), 3);
    assert!(outcome.iter().all(|c| !c.is_auto));
    assert_eq!(outcome[0].node, NodeId(0));
    assert_eq!(outcome[2].similarity, Some(0.30));
}

#[test]
fn test_assignment_ignores_weak_candidates() {
    let outcome = scripted_outcome(&[0.55, 0.20]);
    assert_eq!(outcome.len(), 2);
    assert!(outcome.iter().all(|c| !c.is_auto));
}

fn repository_before() -> ParsedFile {
    class_file(
        "repo.py",
        "Repo",
        &[
            func("load_user", &["id"], "return db.get(id)"),
            func("load_users", &["ids"], "return [db.get(i) for i in ids]"),
        ],
    )
}

fn repository_after() -> ParsedFile {
    class_file(
        "repo.py",
        "Repo",
        &[
            func("fetch_user", &["id"], "return cache.get(id)"),
            func("load_users", &["ids"], "return [db.get(i) for i in ids]"),
        ],
    )
}

#[test]
fn test_closest_contexts_are_recorded_at_pin_time() {
    let finder = finder_with(|_| {});
    let area = SearchArea::from_files([repository_before()]);
    let point = pin(&finder, &area, "repo.py", "load_user", 0);

    let closest = point.context.closest_contexts();
    assert_eq!(closest.len(), 1);
    assert_eq!(closest[0].header[0].joined_value(), "load_users");
    assert!(closest[0].closest.is_none());
    assert!(point.context.siblings.is_some());
}

#[test]
fn test_closest_context_demotes_the_neighbour() {
    let finder = finder_with(|_| {});
    let point = pin(
        &finder,
        &SearchArea::from_files([repository_before()]),
        "repo.py",
        "load_user",
        0,
    );

    let area = SearchArea::from_files([repository_after()]);
    let result = finder.find(&[point.clone()], &area, SearchScope::Local);
    let candidates = &result[&point.id];

    assert_eq!(candidates.len(), 1);
    assert!(candidates[0].is_auto);
    assert_eq!(node_name(&candidates[0]), "fetch_user");
}

#[test]
fn test_global_scope_skips_closest_contexts() {
    let finder = finder_with(|_| {});
    let point = pin(
        &finder,
        &SearchArea::from_files([repository_before()]),
        "repo.py",
        "load_user",
        0,
    );

    let area = SearchArea::from_files([repository_after()]);
    let result = finder.find(&[point.clone()], &area, SearchScope::Global);
    let candidates = &result[&point.id];

    assert_eq!(candidates.len(), 2);
    assert!(candidates.iter().all(|c| !c.is_auto));
    assert_eq!(node_name(&candidates[0]), "load_users");
}

#[test]
fn test_pinned_context_survives_the_sweep_after_find() {
    let finder = finder_with(|_| {});
    let area = SearchArea::from_files([repository_before()]);
    let point = pin(&finder, &area, "repo.py", "load_user", 0);

    let file = area.file("repo.py").expect("file in area");
    let node = functions_named(&file.parsed, "load_user")[0];
    assert_eq!(finder.cache().pin_count("repo.py", node), 1);
    assert!(finder.cache().len() > 1);

    let result = finder.find(&[point.clone()], &area, SearchScope::Local);
    assert!(result[&point.id][0].is_auto);
    assert_eq!(finder.cache().len(), 1);
    assert!(finder.cache().get("repo.py", node).is_some());

    assert!(finder.release(point.id));
    assert!(!finder.release(point.id));
    assert_eq!(finder.cache().sweep(), 1);
    assert!(finder.cache().is_empty());
}

#[test]
fn test_rebinding_moves_the_cache_reference() {
    let finder = finder_with(|_| {});
    let mut point = pin(
        &finder,
        &SearchArea::from_files([repository_before()]),
        "repo.py",
        "load_user",
        0,
    );

    let area = SearchArea::from_files([repository_after()]);
    let result = finder.find(&[point.clone()], &area, SearchScope::Local);
    let winner = result[&point.id][0].clone();
    assert!(winner.is_auto);

    finder.rebind(&mut point, &winner, &area);
    assert_eq!(point.context.header[0].joined_value(), "fetch_user");
    assert_eq!(point.file_name, "repo.py");
    assert_eq!(finder.cache().pin_count("repo.py", winner.node), 1);

    finder.find(&[point.clone()], &area, SearchScope::Local);
    assert!(finder.cache().get("repo.py", winner.node).is_some());
}

fn worker() -> ParsedFile {
    class_file(
        "worker.py",
        "Worker",
        &[
            func("setup", &[], "self.connection = open_connection()"),
            func("helper", &[], "pass"),
            func("teardown", &[], "self.connection.close()"),
            func("helper", &[], "pass"),
        ],
    )
}

#[test]
fn test_siblings_break_ties_between_identical_nodes() {
    let finder = finder_with(|config| config.matching.use_siblings = true);
    let area = SearchArea::from_files([worker()]);
    let point = pin(&finder, &area, "worker.py", "helper", 1);

    let fresh = worker();
    let expected = functions_named(&fresh, "helper")[1];
    let result = finder.find(&[point.clone()], &SearchArea::from_files([fresh]), SearchScope::Local);
    let candidates = &result[&point.id];

    assert_eq!(candidates.len(), 1);
    assert!(candidates[0].is_auto);
    assert_eq!(candidates[0].node, expected);
    assert_eq!(candidates[0].before_similarity, Some(1.0));
    assert_eq!(candidates[0].after_similarity, Some(1.0));
}

#[test]
fn test_identical_nodes_stay_ambiguous_without_siblings() {
    let finder = finder_with(|_| {});
    let area = SearchArea::from_files([worker()]);
    let point = pin(&finder, &area, "worker.py", "helper", 1);

    let result = finder.find(&[point.clone()], &SearchArea::from_files([worker()]), SearchScope::Local);
    let candidates = &result[&point.id];

    assert_eq!(candidates.len(), 4);
    assert!(candidates.iter().all(|c| !c.is_auto));
    assert_eq!(node_name(&candidates[0]), "helper");
    assert_eq!(node_name(&candidates[1]), "helper");
}

fn service(file_name: &str, class_name: &str, body: &'static str) -> ParsedFile {
    class_file(
        file_name,
        class_name,
        &[
            func("foo", &["request"], body),
            func(
                "validate_request_headers",
                &["request", "schema"],
                "for header in schema.required: if header not in request.headers: raise MissingHeader(header)",
            ),
            func(
                "serialize_response_payload",
                &["payload"],
                "return json.dumps(payload, sort_keys=True, default=encode_datetime)",
            ),
        ],
    )
}

#[test]
fn test_local_scope_falls_back_to_similar_files() {
    let finder = finder_with(|_| {});
    let point = pin(
        &finder,
        &SearchArea::from_files([service("service_v1.py", "Bar", "return handle(request)")]),
        "service_v1.py",
        "foo",
        0,
    );

    let unrelated = class_file(
        "other.py",
        "Bar",
        &[
            func("foo", &[], "yield from stream_chunks(buffer, size=4096)"),
            func("render", &["template", "context"], "return engine.render(template, **context)"),
        ],
    );
    let area = SearchArea::from_files([
        service("service_v2.py", "Bar", "return handle_safely(request)"),
        unrelated,
    ]);

    let result = finder.find(&[point.clone()], &area, SearchScope::Local);
    let candidates = &result[&point.id];

    assert_eq!(candidates.len(), 1);
    assert!(candidates[0].is_auto);
    assert_eq!(candidates[0].file_name(), "service_v2.py");
}

struct FlakyResolver {
    inner: MemoryResolver,
}

impl FileResolver for FlakyResolver {
    fn file_names(&self) -> Vec<String> {
        let mut names = self.inner.file_names();
        names.insert(0, "broken.py".to_string());
        names
    }

    fn parse_file(&self, name: &str) -> crate::core::errors::Result<Arc<ParsedFile>> {
        if name == "broken.py" {
            return Err(ReanchorError::parse_in_file("py", "unexpected indent", name));
        }
        self.inner.parse_file(name)
    }
}

#[test]
fn test_unparseable_files_are_skipped() {
    let finder = finder_with(|config| config.performance.max_threads = Some(2));
    let original = SearchArea::from_files([class_file("bar.py", "Bar", &[func("foo", &[], "return 1")])]);
    let point = pin(&finder, &original, "bar.py", "foo", 0);

    let area = SearchArea::new(Arc::new(FlakyResolver {
        inner: MemoryResolver::new([class_file("bar.py", "Bar", &[func("foo", &[], "return 1")])]),
    }));

    let result = finder.find(&[point.clone()], &area, SearchScope::Global);
    assert_eq!(result[&point.id].len(), 1);
    assert!(result[&point.id][0].is_auto);
}

#[test]
fn test_empty_area_yields_empty_lists() {
    let finder = finder_with(|_| {});
    let original = SearchArea::from_files([class_file("bar.py", "Bar", &[func("foo", &[], "return 1")])]);
    let point = pin(&finder, &original, "bar.py", "foo", 0);

    let result = finder.find(&[point.clone()], &SearchArea::from_files([]), SearchScope::Local);
    assert!(result[&point.id].is_empty());
}

#[test]
fn test_strict_winner_requires_both_sides() {
    let file = AreaFile::new(Arc::new(class_file("s.py", "S", &[func("f", &[], "")])));
    let context = Arc::new(crate::context::ContextExtractor::new(&file.parsed).core_context(NodeId(0)));
    let contender = |before: f64, after: f64| {
        let mut c = RemapCandidateInfo::new(NodeId(0), file.clone(), Arc::clone(&context));
        c.before_similarity = Some(before);
        c.after_similarity = Some(after);
        c
    };

    assert_eq!(
        strict_sibling_winner(&[contender(0.4, 0.2), contender(0.9, 0.8)]),
        Some(1)
    );
    assert_eq!(
        strict_sibling_winner(&[contender(0.9, 0.2), contender(0.4, 0.8)]),
        None
    );
    assert_eq!(
        strict_sibling_winner(&[contender(0.9, 0.8), contender(0.9, 0.8)]),
        None
    );
}
