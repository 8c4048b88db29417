//! Relocation of pinned points inside a freshly parsed search area.
//!
//! Points are grouped by syntactic type and origin file. Each group is
//! matched against every node of that type in its candidate files:
//!
//! 1. raw header, ancestors and inner scores are computed once, in parallel;
//! 2. rounds of heuristic evaluation over the free candidates claim every
//!    unique perfect match;
//! 3. recorded closest contexts (local scope) or sibling text (when enabled)
//!    resolve points whose best candidate really belongs to a neighbour;
//! 4. a minimum-cost assignment accepts the confident, distinctive winners;
//! 5. whatever remains is returned ranked for a human to decide.
//!
//! Scoring only reads snapshots of the pool. Claims happen serially between
//! rounds.

use std::sync::Arc;
use std::time::Instant;

use indexmap::IndexMap;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::cache::{ContextCache, ContextDepth};
use super::candidate::{ContextWeights, RemapCandidateInfo};
use super::heuristics::HeuristicPipeline;
use super::point::ConcernPoint;
use super::search_area::{AreaFile, SearchArea};
use crate::context::{ContextExtractor, ContextKey, FileContext, PointContext};
use crate::core::ast::NodeId;
use crate::core::config::ReanchorConfig;
use crate::core::errors::{Result, ReanchorError};
use crate::similarity::assignment;

/// Ranked candidates per point id
pub type RemapResult = IndexMap<Uuid, Vec<RemapCandidateInfo>>;

/// Scores closer than this count as tied
const TIE_TOLERANCE: f64 = 1e-9;

/// Which files are searched for a point
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchScope {
    /// The origin file, or files whose content resembles it
    #[default]
    Local,
    /// Every file of the search area
    Global,
}

/// The re-anchoring engine
pub struct ContextFinder {
    config: ReanchorConfig,
    pipeline: HeuristicPipeline,
    cache: ContextCache,
    pool: Option<rayon::ThreadPool>,
}

impl std::fmt::Debug for ContextFinder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContextFinder")
            .field("config", &self.config)
            .field("pipeline", &self.pipeline)
            .field("cached_contexts", &self.cache.len())
            .finish()
    }
}

impl ContextFinder {
    /// Finder with the built-in heuristics
    pub fn new(config: ReanchorConfig) -> Result<Self> {
        let pipeline = HeuristicPipeline::from_config(&config);
        Self::with_pipeline(config, pipeline)
    }

    /// Finder with a caller-assembled heuristic pipeline
    pub fn with_pipeline(config: ReanchorConfig, pipeline: HeuristicPipeline) -> Result<Self> {
        config.validate()?;

        let pool = match config.performance.max_threads {
            Some(threads) => Some(
                rayon::ThreadPoolBuilder::new()
                    .num_threads(threads)
                    .build()
                    .map_err(|e| {
                        ReanchorError::config_field(
                            format!("Failed to build scoring thread pool: {e}"),
                            "performance.max_threads",
                        )
                    })?,
            ),
            None => None,
        };

        Ok(Self {
            config,
            pipeline,
            cache: ContextCache::new(),
            pool,
        })
    }

    /// Active configuration
    pub fn config(&self) -> &ReanchorConfig {
        &self.config
    }

    /// Registered heuristics
    pub fn pipeline(&self) -> &HeuristicPipeline {
        &self.pipeline
    }

    /// Registered heuristics, for registration and removal
    pub fn pipeline_mut(&mut self) -> &mut HeuristicPipeline {
        &mut self.pipeline
    }

    /// Context cache
    pub fn cache(&self) -> &ContextCache {
        &self.cache
    }

    fn install<R, F>(&self, op: F) -> R
    where
        R: Send,
        F: FnOnce() -> R + Send,
    {
        match &self.pool {
            Some(pool) => pool.install(op),
            None => op(),
        }
    }

    /// Full context of a node: core, siblings and, when an area is given,
    /// the closest same-type contexts found in it
    pub fn get_context(
        &self,
        file: &AreaFile,
        node: NodeId,
        closest_area: Option<&SearchArea>,
    ) -> Arc<PointContext> {
        let with_siblings = self.context_with_siblings(file, node);
        let Some(area) = closest_area else {
            return with_siblings;
        };

        self.install(|| {
            self.cache.get_or_compute(
                file.name(),
                file.revision,
                node,
                ContextDepth::WithClosest,
                |_| {
                    let mut context = (*with_siblings).clone();
                    context.closest = Some(self.closest_contexts(file, node, &context, area));
                    context
                },
            )
        })
    }

    /// Pin `node` as a new concern point.
    ///
    /// The point records the full context (closest contexts searched in
    /// `area`) and is attached to the cached entry, so [`ContextCache::sweep`]
    /// keeps it until the point is released or rebound.
    pub fn pin(
        &self,
        name: impl Into<String>,
        file: &AreaFile,
        node: NodeId,
        area: &SearchArea,
    ) -> ConcernPoint {
        let context = self.get_context(file, node, Some(area));
        let point = ConcernPoint::new(name, (*context).clone());
        self.cache.attach(file.name(), node, point.id);
        point
    }

    /// Move `point` onto an accepted candidate and re-attach its cache reference
    pub fn rebind(
        &self,
        point: &mut ConcernPoint,
        candidate: &RemapCandidateInfo,
        area: &SearchArea,
    ) {
        self.cache.detach_pin(point.id);
        let context = self.get_context(&candidate.file, candidate.node, Some(area));
        point.rebind((*context).clone());
        self.cache.attach(candidate.file_name(), candidate.node, point.id);
    }

    /// Forget a removed point; returns whether any cached entry referenced it.
    /// The entry itself goes with the next sweep.
    pub fn release(&self, pin: Uuid) -> bool {
        self.cache.detach_pin(pin) > 0
    }

    /// Relocate `points` inside `area`
    pub fn find(
        &self,
        points: &[ConcernPoint],
        area: &SearchArea,
        scope: SearchScope,
    ) -> RemapResult {
        self.install(|| self.find_in_area(points, area, scope))
    }

    fn find_in_area(
        &self,
        points: &[ConcernPoint],
        area: &SearchArea,
        scope: SearchScope,
    ) -> RemapResult {
        let started = Instant::now();
        let mut result: RemapResult = points.iter().map(|p| (p.id, Vec::new())).collect();

        let mut groups: IndexMap<(String, String), Vec<&ConcernPoint>> = IndexMap::new();
        for point in points {
            groups
                .entry((point.context.kind.clone(), point.context.file.name.clone()))
                .or_default()
                .push(point);
        }

        for ((kind, origin), members) in &groups {
            let files = self.candidate_files(area, &members[0].context.file, scope);
            let candidates = self.enumerate(&files, kind);
            debug!(
                "Matching {} point(s) of kind '{}' from {} against {} candidate(s) in {} file(s)",
                members.len(),
                kind,
                origin,
                candidates.len(),
                files.len()
            );

            let mut contexts: IndexMap<ContextKey, &PointContext> = IndexMap::new();
            for point in members {
                contexts
                    .entry(point.context.key())
                    .or_insert(&point.context);
            }

            let outcome =
                GroupMatcher::new(self, contexts.values().copied().collect(), candidates, scope)
                    .run();

            for point in members {
                if let Some(index) = contexts.get_index_of(&point.context.key()) {
                    result.insert(point.id, outcome[index].clone());
                }
            }
        }

        // candidate contexts are only needed while matching
        let evicted = self.cache.sweep();

        let accepted = result
            .values()
            .filter(|list| list.first().map_or(false, |c| c.is_auto))
            .count();
        info!(
            "Relocated {} of {} point(s) automatically in {:.2?} ({} cached context(s) evicted)",
            accepted,
            points.len(),
            started.elapsed(),
            evicted
        );

        result
    }

    fn candidate_files(
        &self,
        area: &SearchArea,
        origin: &FileContext,
        scope: SearchScope,
    ) -> Vec<AreaFile> {
        match scope {
            SearchScope::Global => area.files(),
            SearchScope::Local => {
                if let Some(file) = area.file(&origin.name) {
                    return vec![file];
                }

                let threshold = self.config.matching.file_similarity_threshold;
                let similar: Vec<AreaFile> = area
                    .files()
                    .into_iter()
                    .filter(|file| file.context.content.compare(&origin.content) > threshold)
                    .collect();
                debug!(
                    "{} not found, searching {} similar file(s)",
                    origin.name,
                    similar.len()
                );
                similar
            }
        }
    }

    /// Every node of `kind` in `files`, with cached core contexts
    fn enumerate(&self, files: &[AreaFile], kind: &str) -> Vec<RemapCandidateInfo> {
        let targets: Vec<(&AreaFile, NodeId)> = files
            .iter()
            .flat_map(|file| {
                file.parsed
                    .tree
                    .nodes_of_kind(kind)
                    .into_iter()
                    .map(move |node| (file, node))
            })
            .collect();

        targets
            .par_iter()
            .enumerate()
            .map(|(slot, (file, node))| {
                let mut candidate = RemapCandidateInfo::new(
                    *node,
                    (*file).clone(),
                    self.core_context(file, *node),
                );
                candidate.slot = slot;
                candidate
            })
            .collect()
    }

    fn core_context(&self, file: &AreaFile, node: NodeId) -> Arc<PointContext> {
        self.cache.get_or_compute(
            file.name(),
            file.revision,
            node,
            ContextDepth::Core,
            |_| {
                ContextExtractor::with_file_context(&file.parsed, Arc::clone(&file.context))
                    .core_context(node)
            },
        )
    }

    fn context_with_siblings(&self, file: &AreaFile, node: NodeId) -> Arc<PointContext> {
        self.cache.get_or_compute(
            file.name(),
            file.revision,
            node,
            ContextDepth::WithSiblings,
            |existing| {
                let extractor =
                    ContextExtractor::with_file_context(&file.parsed, Arc::clone(&file.context));
                match existing {
                    Some(core) => {
                        let mut context = core.clone();
                        context.siblings = extractor.siblings(node);
                        context
                    }
                    None => extractor.context_with_siblings(node),
                }
            },
        )
    }

    fn closest_contexts(
        &self,
        origin: &AreaFile,
        node: NodeId,
        point: &PointContext,
        area: &SearchArea,
    ) -> Vec<PointContext> {
        let matching = &self.config.matching;
        let weights = ContextWeights::from_defaults(self.config.heuristics.default_weights);

        let mut neighbours: Vec<(f64, Arc<PointContext>)> = self
            .enumerate(&area.files(), &point.kind)
            .into_par_iter()
            .filter(|c| !(c.node == node && c.file_name() == origin.name()))
            .map(|c| {
                let scored = c.scored_against(point);
                let similarity = weights.aggregate(
                    scored.header_similarity,
                    scored.ancestors_similarity,
                    scored.inner_similarity,
                );
                (similarity, scored.context)
            })
            .filter(|(similarity, _)| *similarity >= matching.closest_min_similarity)
            .collect();

        neighbours.sort_by(|a, b| b.0.total_cmp(&a.0));
        neighbours.truncate(matching.closest_count);
        neighbours
            .into_iter()
            .map(|(_, context)| context.core())
            .collect()
    }
}

/// Matching state of one group of points
struct GroupMatcher<'a> {
    finder: &'a ContextFinder,
    points: Vec<&'a PointContext>,
    /// Raw scores per point, indexed by candidate slot
    scored: Vec<Vec<RemapCandidateInfo>>,
    free: Vec<bool>,
    /// Latest heuristic evaluation per point over the free candidates
    lists: Vec<Vec<RemapCandidateInfo>>,
    resolved: Vec<Option<RemapCandidateInfo>>,
    scope: SearchScope,
}

impl<'a> GroupMatcher<'a> {
    fn new(
        finder: &'a ContextFinder,
        points: Vec<&'a PointContext>,
        candidates: Vec<RemapCandidateInfo>,
        scope: SearchScope,
    ) -> Self {
        let scored: Vec<Vec<RemapCandidateInfo>> = points
            .par_iter()
            .map(|point| {
                candidates
                    .par_iter()
                    .map(|candidate| candidate.scored_against(point))
                    .collect::<Vec<_>>()
            })
            .collect();
        Self::with_scores(finder, points, scored, candidates.len(), scope)
    }

    fn with_scores(
        finder: &'a ContextFinder,
        points: Vec<&'a PointContext>,
        scored: Vec<Vec<RemapCandidateInfo>>,
        pool_size: usize,
        scope: SearchScope,
    ) -> Self {
        let count = points.len();
        Self {
            finder,
            points,
            scored,
            free: vec![true; pool_size],
            lists: vec![Vec::new(); count],
            resolved: vec![None; count],
            scope,
        }
    }

    fn run(mut self) -> Vec<Vec<RemapCandidateInfo>> {
        let use_siblings = self.finder.config.matching.use_siblings;

        self.claim_perfect_matches();
        if use_siblings {
            self.break_ties_with_siblings();
        } else if self.scope == SearchScope::Local {
            self.demote_closest_neighbours();
        }
        self.assign();

        self.resolved
            .into_iter()
            .zip(self.lists)
            .map(|(resolved, list)| match resolved {
                Some(winner) => vec![winner],
                None => list
                    .into_iter()
                    .map(|mut candidate| {
                        candidate.is_auto = false;
                        candidate
                    })
                    .collect(),
            })
            .collect()
    }

    fn open(&self) -> Vec<usize> {
        (0..self.points.len())
            .filter(|index| self.resolved[*index].is_none())
            .collect()
    }

    fn evaluate(&self, index: usize) -> Vec<RemapCandidateInfo> {
        let mut list: Vec<RemapCandidateInfo> = self.scored[index]
            .iter()
            .filter(|candidate| self.free[candidate.slot])
            .cloned()
            .collect();
        self.finder
            .pipeline
            .evaluate(self.points[index], &mut list);
        list
    }

    /// Re-evaluate every open point over the current free candidates
    fn refresh(&mut self) {
        let open = self.open();
        let lists: Vec<(usize, Vec<RemapCandidateInfo>)> = open
            .par_iter()
            .map(|&index| (index, self.evaluate(index)))
            .collect();
        for (index, list) in lists {
            self.lists[index] = list;
        }
    }

    fn claim(&mut self, index: usize, mut winner: RemapCandidateInfo) {
        debug_assert!(self.free[winner.slot], "candidate claimed twice");
        self.free[winner.slot] = false;
        winner.is_auto = true;
        self.resolved[index] = Some(winner);
    }

    fn claim_perfect_matches(&mut self) {
        let mut round = 0;
        loop {
            round += 1;
            self.refresh();

            let mut claimed = 0;
            for index in self.open() {
                let mut perfect = self.lists[index].iter().filter(|c| c.is_perfect());
                let only = match (perfect.next(), perfect.next()) {
                    (Some(only), None) => only.clone(),
                    _ => continue,
                };

                if self.free[only.slot] {
                    self.claim(index, only);
                    claimed += 1;
                }
            }

            debug!("Perfect-match round {}: {} claim(s)", round, claimed);
            if claimed == 0 {
                break;
            }
        }
    }

    /// Ignore candidates that resemble a recorded neighbour of the point more
    /// than the point itself, then claim the confident remainder
    fn demote_closest_neighbours(&mut self) {
        let finder = self.finder;
        let mut claimed = 0;

        for index in self.open() {
            let point: &'a PointContext = self.points[index];
            let neighbours = point.closest_contexts();
            if neighbours.is_empty() {
                continue;
            }

            let own: Vec<&RemapCandidateInfo> = self.lists[index]
                .iter()
                .filter(|c| self.free[c.slot] && !resembles_neighbour(c, neighbours))
                .collect();
            let Some(best) = own.first() else {
                continue;
            };

            let second = own.get(1).map(|c| c.similarity_or_zero());
            if finder
                .config
                .matching
                .is_confident(best.similarity_or_zero(), second)
            {
                let winner = (*best).clone();
                self.claim(index, winner);
                claimed += 1;
            }
        }

        debug!("Closest-context pass: {} claim(s)", claimed);
        if claimed > 0 {
            self.refresh();
        }
    }

    /// Separate structurally identical top candidates by their neighbours
    fn break_ties_with_siblings(&mut self) {
        let finder = self.finder;
        let mut claimed = 0;

        for index in self.open() {
            let point = self.points[index];
            let Some(point_siblings) = point.siblings.as_ref() else {
                continue;
            };

            let free: Vec<&RemapCandidateInfo> = self.lists[index]
                .iter()
                .filter(|c| self.free[c.slot])
                .collect();
            let Some(top) = free.first() else {
                continue;
            };

            let tied = free.iter().take_while(|c| is_tied(top, c)).count();
            if tied < 2 {
                continue;
            }

            let rest = free.get(tied).map(|c| c.similarity_or_zero());
            if !finder
                .config
                .matching
                .is_confident(top.similarity_or_zero(), rest)
            {
                continue;
            }

            let mut contenders: Vec<RemapCandidateInfo> =
                free[..tied].iter().map(|c| (*c).clone()).collect();
            contenders.par_iter_mut().for_each(|candidate| {
                let context = finder.context_with_siblings(&candidate.file, candidate.node);
                let (before, after) = match &context.siblings {
                    Some(siblings) => (
                        point_siblings.before.compare(&siblings.before),
                        point_siblings.after.compare(&siblings.after),
                    ),
                    None => (0.0, 0.0),
                };
                candidate.before_similarity = Some(before);
                candidate.after_similarity = Some(after);
                candidate.context = context;
            });

            if let Some(winner) = strict_sibling_winner(&contenders) {
                let winner = contenders.swap_remove(winner);
                self.claim(index, winner);
                claimed += 1;
            }
        }

        debug!("Sibling tie-break: {} claim(s)", claimed);
        if claimed > 0 {
            self.refresh();
        }
    }

    /// Repeatedly solve the assignment over the open points and accept the
    /// winners that are also confident on their own
    fn assign(&mut self) {
        let finder = self.finder;
        let matching = &finder.config.matching;

        loop {
            let open = self.open();
            if open.is_empty() {
                break;
            }

            let mut relevant = vec![false; self.free.len()];
            for &index in &open {
                for candidate in &self.lists[index] {
                    if candidate.similarity_or_zero() >= matching.acceptance_threshold {
                        relevant[candidate.slot] = true;
                    }
                }
            }
            let columns: Vec<usize> = (0..relevant.len()).filter(|slot| relevant[*slot]).collect();
            if columns.is_empty() {
                break;
            }

            let costs: Vec<Vec<i64>> = open
                .iter()
                .map(|&index| {
                    let mut similarity = vec![0.0; self.free.len()];
                    for candidate in &self.lists[index] {
                        similarity[candidate.slot] = candidate.similarity_or_zero();
                    }
                    columns
                        .iter()
                        .map(|slot| (matching.cost_scale * (1.0 - similarity[*slot])).round() as i64)
                        .collect()
                })
                .collect();

            let assignment = match assignment::solve(&costs) {
                Ok(assignment) => assignment,
                Err(err) => {
                    warn!("Skipping assignment step: {}", err);
                    break;
                }
            };

            let mut accepted = 0;
            for (row, column) in assignment.into_iter().enumerate() {
                if column < 0 {
                    continue;
                }
                let index = open[row];
                let slot = columns[column as usize];
                let list = &self.lists[index];
                let Some(top) = list.first() else {
                    continue;
                };

                let second = list.get(1).map(|c| c.similarity_or_zero());
                if top.slot == slot
                    && self.free[slot]
                    && matching.is_confident(top.similarity_or_zero(), second)
                {
                    let winner = top.clone();
                    self.claim(index, winner);
                    accepted += 1;
                }
            }

            debug!(
                "Assignment over {} point(s) and {} candidate(s): {} accepted",
                open.len(),
                columns.len(),
                accepted
            );
            if accepted == 0 {
                break;
            }
            self.refresh();
        }
    }
}

fn resembles_neighbour(candidate: &RemapCandidateInfo, neighbours: &[PointContext]) -> bool {
    let own = candidate.similarity_or_zero();
    neighbours.iter().any(|neighbour| {
        let scored = candidate.scored_against(neighbour);
        candidate.weights.aggregate(
            scored.header_similarity,
            scored.ancestors_similarity,
            scored.inner_similarity,
        ) > own
    })
}

fn is_tied(a: &RemapCandidateInfo, b: &RemapCandidateInfo) -> bool {
    (a.header_similarity - b.header_similarity).abs() <= TIE_TOLERANCE
        && (a.inner_similarity - b.inner_similarity).abs() <= TIE_TOLERANCE
        && (a.ancestors_similarity - b.ancestors_similarity).abs() <= TIE_TOLERANCE
}

/// Index of the contender beating every other one on both sides
fn strict_sibling_winner(contenders: &[RemapCandidateInfo]) -> Option<usize> {
    let side = |c: &RemapCandidateInfo| {
        (
            c.before_similarity.unwrap_or(0.0),
            c.after_similarity.unwrap_or(0.0),
        )
    };

    (0..contenders.len()).find(|&k| {
        let (before, after) = side(&contenders[k]);
        contenders.iter().enumerate().all(|(j, other)| {
            let (other_before, other_after) = side(other);
            j == k || (before > other_before && after > other_after)
        })
    })
}

#[cfg(test)]
#[path = "finder_tests.rs"]
mod tests;
