//! The single call a screen makes: filter, then sort, then aggregate.

use super::classifier::Thresholds;
use super::filter::{FilterSpec, filter};
use super::sort::{SortSpec, sort};
use super::stats::{Stats, StatsConfig, aggregate};
use crate::state::Entity;
use tracing::debug;

/// Rows to render plus the summary figures computed from exactly those rows.
#[derive(Debug, Clone)]
pub struct QueryResult<'a> {
    pub rows: Vec<&'a Entity>,
    pub stats: Stats,
}

impl QueryResult<'_> {
    /// Ids of the rows, in display order.
    pub fn row_ids(&self) -> Vec<&str> {
        self.rows.iter().map(|e| e.id.as_str()).collect()
    }
}

/// Filter/sort/aggregate capability a screen is written against.
///
/// `query` is provided in terms of the three steps and always runs them in
/// that order, so stats describe the filtered rows, not the full collection.
pub trait RankingEngine {
    /// Keep matching entities, in input order.
    fn filter<'a>(&self, entities: &'a [Entity], spec: &FilterSpec) -> Vec<&'a Entity>;

    /// Order rows stably.
    fn sort<'a>(&self, rows: Vec<&'a Entity>, spec: &SortSpec) -> Vec<&'a Entity>;

    /// Summarize rows.
    fn aggregate(&self, rows: &[&Entity]) -> Stats;

    /// Filter, sort and aggregate in one pass over the same input.
    fn query<'a>(
        &self,
        entities: &'a [Entity],
        filter_spec: &FilterSpec,
        sort_spec: &SortSpec,
    ) -> QueryResult<'a> {
        self.query_limited(entities, filter_spec, sort_spec, None)
    }

    /// Like `query`, showing at most `limit` rows; stats cover the shown rows.
    fn query_limited<'a>(
        &self,
        entities: &'a [Entity],
        filter_spec: &FilterSpec,
        sort_spec: &SortSpec,
        limit: Option<usize>,
    ) -> QueryResult<'a> {
        let filtered = self.filter(entities, filter_spec);
        let matched = filtered.len();
        let mut rows = self.sort(filtered, sort_spec);
        if let Some(limit) = limit {
            rows.truncate(limit);
        }
        let stats = self.aggregate(&rows);

        debug!(
            total = entities.len(),
            matched,
            shown = rows.len(),
            sort_key = %sort_spec.key,
            direction = %sort_spec.direction,
            "Query evaluated"
        );

        QueryResult { rows, stats }
    }
}

/// The default engine: configured thresholds and statistics.
#[derive(Debug, Clone, Default)]
pub struct Engine {
    thresholds: Thresholds,
    stats: StatsConfig,
}

impl Engine {
    /// Create an engine.
    pub fn new(thresholds: Thresholds, stats: StatsConfig) -> Self {
        Self { thresholds, stats }
    }

    pub fn thresholds(&self) -> &Thresholds {
        &self.thresholds
    }

    pub fn stats_config(&self) -> &StatsConfig {
        &self.stats
    }

    /// Swap the statistics a screen asks for.
    pub fn with_stats(mut self, stats: StatsConfig) -> Self {
        self.stats = stats;
        self
    }
}

impl RankingEngine for Engine {
    fn filter<'a>(&self, entities: &'a [Entity], spec: &FilterSpec) -> Vec<&'a Entity> {
        filter(entities, spec)
    }

    fn sort<'a>(&self, rows: Vec<&'a Entity>, spec: &SortSpec) -> Vec<&'a Entity> {
        sort(rows, spec)
    }

    fn aggregate(&self, rows: &[&Entity]) -> Stats {
        aggregate(rows, &self.stats, &self.thresholds)
    }
}
