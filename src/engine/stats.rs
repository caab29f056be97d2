//! Aggregate statistics over a (filtered) collection.
//!
//! Every figure here is computed from the rows handed in; nothing is cached
//! between calls. Figures that are undefined for an empty collection (means,
//! win rate) are `None` and must be guarded before display.

use super::classifier::{Sentiment, Thresholds, round_half_up};
use super::sort::{SortDirection, SortSpec, sort};
use crate::state::Entity;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Count of entities per sentiment bucket.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketCounts {
    pub bullish: usize,
    pub neutral: usize,
    pub bearish: usize,
}

impl BucketCounts {
    /// Count for one bucket.
    pub fn get(&self, sentiment: Sentiment) -> usize {
        match sentiment {
            Sentiment::Bullish => self.bullish,
            Sentiment::Neutral => self.neutral,
            Sentiment::Bearish => self.bearish,
        }
    }

    fn increment(&mut self, sentiment: Sentiment) {
        match sentiment {
            Sentiment::Bullish => self.bullish += 1,
            Sentiment::Neutral => self.neutral += 1,
            Sentiment::Bearish => self.bearish += 1,
        }
    }

    /// Total across buckets.
    pub fn total(&self) -> usize {
        self.bullish + self.neutral + self.bearish
    }
}

/// Statistics over a borrowed row set.
#[derive(Debug, Clone, Copy)]
pub struct Aggregator<'a> {
    rows: &'a [&'a Entity],
}

impl<'a> Aggregator<'a> {
    /// Aggregate over `rows`.
    pub fn new(rows: &'a [&'a Entity]) -> Self {
        Self { rows }
    }

    /// Number of rows.
    pub fn count(&self) -> usize {
        self.rows.len()
    }

    /// Sum of an attribute. Rows without it contribute nothing.
    ///
    /// Folds from `0.0`; `Iterator::sum` starts at `-0.0` for floats.
    pub fn sum(&self, attribute: &str) -> f64 {
        self.rows
            .iter()
            .filter_map(|e| e.number(attribute))
            .fold(0.0, |acc, v| acc + v)
    }

    /// Arithmetic mean of an attribute, divided by the row count.
    ///
    /// Rows without the attribute count as `0`. `None` for no rows.
    pub fn mean(&self, attribute: &str) -> Option<f64> {
        if self.rows.is_empty() {
            return None;
        }
        Some(self.sum(attribute) / self.rows.len() as f64)
    }

    /// First `n` rows after sorting by `attribute`; ties keep input order.
    pub fn top_n(&self, attribute: &str, n: usize, direction: SortDirection) -> Vec<&'a Entity> {
        let spec = SortSpec::new(attribute, direction);
        let mut ranked = sort(self.rows.iter().copied(), &spec);
        ranked.truncate(n);
        ranked
    }

    /// The `n` rows at the other end of the ranking.
    pub fn bottom_n(&self, attribute: &str, n: usize, direction: SortDirection) -> Vec<&'a Entity> {
        self.top_n(attribute, n, direction.toggled())
    }

    /// Percentage of applicable rows for which `predicate` holds.
    ///
    /// `predicate` returns `None` for rows it does not apply to (an open
    /// trade has no realized P&L); those are left out of both numerator and
    /// denominator. `None` when no row is applicable.
    pub fn win_rate<F>(&self, predicate: F) -> Option<f64>
    where
        F: Fn(&Entity) -> Option<bool>,
    {
        let (wins, applicable) = self
            .rows
            .iter()
            .filter_map(|&e| predicate(e))
            .fold((0usize, 0usize), |(wins, total), won| {
                (wins + usize::from(won), total + 1)
            });

        if applicable == 0 {
            None
        } else {
            Some(wins as f64 / applicable as f64 * 100.0)
        }
    }

    /// Classify every row's score and count per bucket.
    ///
    /// Rows without a score classify as `0`, so counts always sum to the
    /// row count.
    pub fn bucket_counts(&self, score_attribute: &str, thresholds: &Thresholds) -> BucketCounts {
        let mut counts = BucketCounts::default();
        for entity in self.rows {
            let score = entity.number(score_attribute).unwrap_or(0.0);
            counts.increment(thresholds.classify(score));
        }
        counts
    }

    /// Count rows per value of a categorical attribute.
    pub fn category_counts(&self, attribute: &str) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for value in self.rows.iter().filter_map(|e| e.category(attribute)) {
            *counts.entry(value.to_string()).or_insert(0) += 1;
        }
        counts
    }

    /// Mean of `attribute` within each group of `group_by`.
    pub fn group_mean(&self, group_by: &str, attribute: &str) -> BTreeMap<String, f64> {
        let mut groups: BTreeMap<&str, Vec<&Entity>> = BTreeMap::new();
        for &entity in self.rows {
            if let Some(group) = entity.category(group_by) {
                groups.entry(group).or_default().push(entity);
            }
        }

        groups
            .into_iter()
            .filter_map(|(group, members)| {
                Aggregator::new(&members)
                    .mean(attribute)
                    .map(|mean| (group.to_string(), mean))
            })
            .collect()
    }
}

/// A named ranking to compute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankSpec {
    pub attribute: String,
    pub n: usize,
    #[serde(default)]
    pub direction: SortDirection,
}

impl RankSpec {
    pub fn new(attribute: impl Into<String>, n: usize, direction: SortDirection) -> Self {
        Self {
            attribute: attribute.into(),
            n,
            direction,
        }
    }
}

/// Win rate over rows carrying `attribute`: a win is a value above `above`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WinRateSpec {
    pub attribute: String,
    #[serde(default)]
    pub above: f64,
}

/// Mean of `attribute` per value of `group_by`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupMeanSpec {
    pub group_by: String,
    pub attribute: String,
}

impl GroupMeanSpec {
    /// Key under which the result is reported.
    pub fn key(&self) -> String {
        format!("{}_by_{}", self.attribute, self.group_by)
    }
}

/// Which statistics a screen wants.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatsConfig {
    /// Numeric attribute holding the sentiment score, if bucket counts are wanted.
    pub sentiment_attribute: Option<String>,
    /// Attributes to sum.
    pub sum: Vec<String>,
    /// Attributes to average.
    pub mean: Vec<String>,
    /// Named rankings.
    pub rankings: BTreeMap<String, RankSpec>,
    /// Win rate definition.
    pub win_rate: Option<WinRateSpec>,
    /// Categorical attributes to count values of.
    pub category_counts: Vec<String>,
    /// Grouped means.
    pub group_means: Vec<GroupMeanSpec>,
}

impl StatsConfig {
    /// Sentiment poll cards: total votes, average bullish share.
    pub fn community_polls() -> Self {
        Self {
            sentiment_attribute: Some("aiScore".to_string()),
            sum: vec!["votes".to_string()],
            mean: vec!["bullishPercentage".to_string()],
            rankings: BTreeMap::from([(
                "mostVotes".to_string(),
                RankSpec::new("votes", 3, SortDirection::Desc),
            )]),
            ..Default::default()
        }
    }

    /// Stock activity dashboard: movers and sentiment label mix.
    pub fn stock_activity() -> Self {
        Self {
            sum: vec!["volume".to_string()],
            mean: vec!["changePercent".to_string()],
            rankings: BTreeMap::from([
                (
                    "topGainers".to_string(),
                    RankSpec::new("changePercent", 5, SortDirection::Desc),
                ),
                (
                    "topLosers".to_string(),
                    RankSpec::new("changePercent", 5, SortDirection::Asc),
                ),
            ]),
            category_counts: vec!["sentiment".to_string()],
            ..Default::default()
        }
    }

    /// Trade journal: P&L, win rate and emotion breakdown.
    pub fn trade_journal() -> Self {
        Self {
            sentiment_attribute: Some("sentimentScore".to_string()),
            sum: vec!["pnl".to_string()],
            mean: vec!["sentimentScore".to_string()],
            win_rate: Some(WinRateSpec {
                attribute: "pnl".to_string(),
                above: 0.0,
            }),
            category_counts: vec!["emotion".to_string()],
            group_means: vec![GroupMeanSpec {
                group_by: "emotion".to_string(),
                attribute: "pnl".to_string(),
            }],
            ..Default::default()
        }
    }

    /// Geo sentiment map: regional mood and the extremes.
    pub fn geo_sentiment() -> Self {
        Self {
            sentiment_attribute: Some("moodScore".to_string()),
            sum: vec!["discussions".to_string()],
            mean: vec!["moodScore".to_string(), "marketReturn".to_string()],
            rankings: BTreeMap::from([
                (
                    "topBullish".to_string(),
                    RankSpec::new("moodScore", 5, SortDirection::Desc),
                ),
                (
                    "topBearish".to_string(),
                    RankSpec::new("moodScore", 5, SortDirection::Asc),
                ),
            ]),
            ..Default::default()
        }
    }
}

/// Derived summary figures for a row set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Stats {
    pub count: usize,
    pub sums: BTreeMap<String, f64>,
    pub means: BTreeMap<String, Option<f64>>,
    pub buckets: Option<BucketCounts>,
    /// Ranked entity ids per ranking name.
    pub rankings: BTreeMap<String, Vec<String>>,
    pub win_rate: Option<f64>,
    pub category_counts: BTreeMap<String, BTreeMap<String, usize>>,
    pub group_means: BTreeMap<String, BTreeMap<String, f64>>,
}

impl Stats {
    /// A configured sum, `0` if it was not requested.
    pub fn sum(&self, attribute: &str) -> f64 {
        self.sums.get(attribute).copied().unwrap_or(0.0)
    }

    /// A configured mean; `None` if not requested or undefined.
    pub fn mean(&self, attribute: &str) -> Option<f64> {
        self.means.get(attribute).copied().flatten()
    }

    /// A configured mean rounded for display.
    pub fn rounded_mean(&self, attribute: &str) -> Option<f64> {
        self.mean(attribute).map(round_half_up)
    }

    /// Ids of a named ranking.
    pub fn ranking(&self, name: &str) -> &[String] {
        self.rankings.get(name).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// Compute the statistics `config` asks for over `rows`.
pub fn aggregate(rows: &[&Entity], config: &StatsConfig, thresholds: &Thresholds) -> Stats {
    let agg = Aggregator::new(rows);

    let sums = config
        .sum
        .iter()
        .map(|attr| (attr.clone(), agg.sum(attr)))
        .collect();
    let means = config
        .mean
        .iter()
        .map(|attr| (attr.clone(), agg.mean(attr)))
        .collect();
    let buckets = config
        .sentiment_attribute
        .as_deref()
        .map(|attr| agg.bucket_counts(attr, thresholds));
    let rankings = config
        .rankings
        .iter()
        .map(|(name, rank)| {
            let ids = agg
                .top_n(&rank.attribute, rank.n, rank.direction)
                .into_iter()
                .map(|e| e.id.clone())
                .collect();
            (name.clone(), ids)
        })
        .collect();
    let win_rate = config.win_rate.as_ref().and_then(|spec| {
        agg.win_rate(|e| e.number(&spec.attribute).map(|v| v > spec.above))
    });
    let category_counts = config
        .category_counts
        .iter()
        .map(|attr| (attr.clone(), agg.category_counts(attr)))
        .collect();
    let group_means = config
        .group_means
        .iter()
        .map(|g| (g.key(), agg.group_mean(&g.group_by, &g.attribute)))
        .collect();

    Stats {
        count: agg.count(),
        sums,
        means,
        buckets,
        rankings,
        win_rate,
        category_counts,
        group_means,
    }
}
