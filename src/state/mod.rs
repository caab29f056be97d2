//! Session state for a dashboard screen.
//!
//! User actions are dispatched as [`Action`]s and applied one at a time by
//! [`Store::reduce`], so a query always observes either the state before an
//! action or the state after it, never a partial update.

mod entity;
mod poll;

pub use entity::{Entity, NumericValue};
pub use poll::{BucketPercentages, Poll, PollBook, PollSeed, Tallies, Vote, VoteChoice, VoteOutcome};

use crate::engine::{FilterSpec, NumericRange, QueryResult, RankingEngine, SortSpec};
use crate::error::Result;
use crate::source::EntitySource;
use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Actions that can be dispatched to modify state.
#[derive(Debug, Clone)]
pub enum Action {
    // Data
    EntitiesLoaded(Vec<Entity>),
    PollsLoaded(Vec<Poll>),
    SetUser(String),

    // Filtering
    Search(String),
    FilterCategory { attribute: String, value: String },
    FilterRange { attribute: String, range: NumericRange },
    SetFilter(FilterSpec),
    ClearFilters,

    // Sorting
    SortBy(String),
    ToggleSortDirection,
    SetSort(SortSpec),
    SetLimit(Option<usize>),

    // Voting
    CastVote {
        poll_id: String,
        user_id: String,
        choice: VoteChoice,
    },

    // Error handling
    ClearError,
}

/// The state store for one screen.
#[derive(Debug)]
pub struct Store {
    /// Entities shown on the screen.
    pub entities: Vec<Entity>,
    /// Polls mounted on the screen.
    pub polls: PollBook,
    /// Current filter selection.
    pub filter: FilterSpec,
    /// Current sort selection.
    pub sort: SortSpec,
    /// Maximum rows to show.
    pub limit: Option<usize>,
    /// The signed-in user, for `userVote` projection.
    pub user_id: Option<String>,
    /// Last time data or votes changed.
    pub last_updated: Option<DateTime<Utc>>,
    /// Last rejected action.
    pub error: Option<String>,
    /// Action sender for dispatching actions.
    action_tx: mpsc::UnboundedSender<Action>,
}

impl Store {
    /// Create a new store with the given action sender.
    pub fn new(action_tx: mpsc::UnboundedSender<Action>) -> Self {
        Self {
            entities: Vec::new(),
            polls: PollBook::default(),
            filter: FilterSpec::default(),
            sort: SortSpec::default(),
            limit: None,
            user_id: None,
            last_updated: None,
            error: None,
            action_tx,
        }
    }

    /// Dispatch an action to the store.
    pub fn dispatch(&self, action: Action) -> Result<()> {
        self.action_tx
            .send(action)
            .map_err(|e| crate::Error::channel(e.to_string()))
    }

    /// Load entities from a source and dispatch them.
    pub fn load_from(&self, source: &dyn EntitySource) -> Result<()> {
        let entities = source.list()?;
        self.dispatch(Action::EntitiesLoaded(entities))
    }

    /// Apply an action to update state.
    pub fn reduce(&mut self, action: Action) {
        match action {
            // Data
            Action::EntitiesLoaded(entities) => {
                debug!(count = entities.len(), "Entities loaded");
                self.entities = entities;
                self.touch();
            }
            Action::PollsLoaded(polls) => {
                debug!(count = polls.len(), "Polls loaded");
                self.polls = PollBook::new(polls);
                self.sync_polls();
                self.touch();
            }
            Action::SetUser(user_id) => {
                self.user_id = Some(user_id);
                self.sync_polls();
            }

            // Filtering
            Action::Search(query) => self.filter.text_query = Some(query),
            Action::FilterCategory { attribute, value } => {
                self.filter.categorical_equals.insert(attribute, value);
            }
            Action::FilterRange { attribute, range } => {
                self.filter.numeric_range.insert(attribute, range);
            }
            Action::SetFilter(filter) => self.filter = filter,
            Action::ClearFilters => self.filter = FilterSpec::default(),

            // Sorting
            Action::SortBy(key) => {
                if self.sort.key == key {
                    self.sort.direction = self.sort.direction.toggled();
                } else {
                    self.sort = SortSpec::desc(key);
                }
            }
            Action::ToggleSortDirection => {
                self.sort.direction = self.sort.direction.toggled();
            }
            Action::SetSort(sort) => self.sort = sort,
            Action::SetLimit(limit) => self.limit = limit,

            // Voting
            Action::CastVote {
                poll_id,
                user_id,
                choice,
            } => match self.polls.cast_vote(&poll_id, &user_id, choice) {
                Ok(VoteOutcome::Unchanged) => {}
                Ok(_) => {
                    self.sync_polls();
                    self.touch();
                }
                Err(e) => {
                    warn!(poll = %poll_id, "Vote rejected: {}", e);
                    self.error = Some(e.to_string());
                }
            },

            // Error handling
            Action::ClearError => self.error = None,
        }
    }

    /// Apply every queued action from `action_rx` without waiting.
    pub fn drain(&mut self, action_rx: &mut mpsc::UnboundedReceiver<Action>) -> usize {
        let mut applied = 0;
        while let Ok(action) = action_rx.try_recv() {
            self.reduce(action);
            applied += 1;
        }
        applied
    }

    /// Run the current filter and sort over the loaded entities.
    ///
    /// Once polls are loaded the entities are their projection, so votes
    /// show up in the next query.
    pub fn query<'a, E: RankingEngine>(&'a self, engine: &E) -> QueryResult<'a> {
        engine.query_limited(&self.entities, &self.filter, &self.sort, self.limit)
    }

    /// Project the polls for the current user.
    pub fn poll_entities(&self) -> Vec<Entity> {
        self.polls.entities(self.user_id.as_deref())
    }

    /// Rebuild `entities` from the polls, if any are mounted.
    fn sync_polls(&mut self) {
        if !self.polls.is_empty() {
            self.entities = self.poll_entities();
        }
    }

    fn touch(&mut self) {
        self.last_updated = Some(Utc::now());
    }
}
