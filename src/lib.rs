//! # Sentidash - Sentiment Aggregation and Ranking
//!
//! The engine behind market sentiment dashboards: community polls, stock
//! activity tables, trade journals and geographic sentiment maps all reduce
//! to "filter a collection, sort it, summarise what is left".
//!
//! ## Architecture
//!
//! - **Engine**: Pure filter, sort, classify and aggregate operations
//! - **State**: Entities, polls with single-vote-per-user semantics, and the
//!   action store a screen drives
//! - **Source**: Where entities come from (fixtures, files)
//! - **Config**: Thresholds, screen defaults and logging settings

pub mod config;
pub mod engine;
pub mod error;
pub mod source;
pub mod state;

pub use config::Config;
pub use engine::{
    Engine, FilterSpec, QueryResult, RankingEngine, Sentiment, SortDirection, SortSpec, Stats,
    StatsConfig, Thresholds,
};
pub use error::{Error, Result};
pub use source::{EntitySource, JsonFileSource, StaticSource};
pub use state::{Action, Entity, Poll, PollBook, Store, VoteChoice};
