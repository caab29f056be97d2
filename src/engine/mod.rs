//! The sentiment aggregation and ranking engine.
//!
//! Data flows one way: entities -> [`filter`] -> [`sort`] -> [`aggregate`],
//! with [`RankingEngine::query`] running all three for a screen. Every
//! function here is a pure function of its arguments.

mod classifier;
mod filter;
pub mod normalize;
mod query;
mod sort;
mod stats;

pub use classifier::{Sentiment, Thresholds, classify, round_half_up};
pub use filter::{FilterSpec, NumericRange, WILDCARD, filter};
pub use query::{Engine, QueryResult, RankingEngine};
pub use sort::{KeyKind, SortDirection, SortSpec, resolve_key, sort};
pub use stats::{
    Aggregator, BucketCounts, GroupMeanSpec, RankSpec, Stats, StatsConfig, WinRateSpec, aggregate,
};
