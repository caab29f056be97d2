//! Sentiment polls and the single-vote-per-user state machine.
//!
//! Each `(poll, user)` pair is either without a vote or holds exactly one
//! live vote. Casting moves `NoVote -> Voted(choice)` or
//! `Voted(a) -> Voted(b)`; there is no way back to `NoVote`.

use super::Entity;
use crate::engine::{Sentiment, round_half_up};
use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, info};

/// A poll choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoteChoice {
    Bullish,
    Holding,
    Bearish,
}

impl VoteChoice {
    /// All choices in display order.
    pub const ALL: [VoteChoice; 3] = [Self::Bullish, Self::Holding, Self::Bearish];

    /// Lowercase label.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bullish => "bullish",
            Self::Holding => "holding",
            Self::Bearish => "bearish",
        }
    }

    /// The sentiment bucket this choice expresses.
    pub fn sentiment(&self) -> Sentiment {
        match self {
            Self::Bullish => Sentiment::Bullish,
            Self::Holding => Sentiment::Neutral,
            Self::Bearish => Sentiment::Bearish,
        }
    }
}

impl std::fmt::Display for VoteChoice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bullish => write!(f, "Bullish"),
            Self::Holding => write!(f, "Holding"),
            Self::Bearish => write!(f, "Bearish"),
        }
    }
}

impl std::str::FromStr for VoteChoice {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bullish" => Ok(Self::Bullish),
            "holding" => Ok(Self::Holding),
            "bearish" => Ok(Self::Bearish),
            other => Err(Error::invalid_input(format!("Unknown vote choice: {other}"))),
        }
    }
}

/// A user's live vote on a poll.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vote {
    pub user_id: String,
    pub choice: VoteChoice,
    pub cast_at: DateTime<Utc>,
}

/// Vote counts per choice.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tallies {
    pub bullish: u64,
    pub holding: u64,
    pub bearish: u64,
}

impl Tallies {
    pub fn new(bullish: u64, holding: u64, bearish: u64) -> Self {
        Self {
            bullish,
            holding,
            bearish,
        }
    }

    pub fn get(&self, choice: VoteChoice) -> u64 {
        match choice {
            VoteChoice::Bullish => self.bullish,
            VoteChoice::Holding => self.holding,
            VoteChoice::Bearish => self.bearish,
        }
    }

    fn get_mut(&mut self, choice: VoteChoice) -> &mut u64 {
        match choice {
            VoteChoice::Bullish => &mut self.bullish,
            VoteChoice::Holding => &mut self.holding,
            VoteChoice::Bearish => &mut self.bearish,
        }
    }

    /// Total votes across choices.
    pub fn total(&self) -> u64 {
        self.bullish + self.holding + self.bearish
    }
}

/// Whole-number share per choice.
///
/// Each share is rounded on its own, so the three need not add up to 100.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketPercentages {
    pub bullish: u32,
    pub holding: u32,
    pub bearish: u32,
}

impl BucketPercentages {
    pub fn new(bullish: u32, holding: u32, bearish: u32) -> Self {
        Self {
            bullish,
            holding,
            bearish,
        }
    }

    /// Recompute from the full tally. All zero when there are no votes.
    pub fn from_tallies(tallies: &Tallies) -> Self {
        let total = tallies.total();
        if total == 0 {
            return Self::default();
        }
        let share = |count: u64| round_half_up(count as f64 / total as f64 * 100.0) as u32;
        Self {
            bullish: share(tallies.bullish),
            holding: share(tallies.holding),
            bearish: share(tallies.bearish),
        }
    }

    pub fn get(&self, choice: VoteChoice) -> u32 {
        match choice {
            VoteChoice::Bullish => self.bullish,
            VoteChoice::Holding => self.holding,
            VoteChoice::Bearish => self.bearish,
        }
    }

    pub fn sum(&self) -> u32 {
        self.bullish + self.holding + self.bearish
    }
}

/// What a cast did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteOutcome {
    /// First vote by this user; the total went up by one.
    Created,
    /// The user's vote moved from `from`; the total is unchanged.
    Changed { from: VoteChoice },
    /// Same choice as the live vote; nothing changed.
    Unchanged,
}

/// A poll as published: a total and the shares shown next to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PollSeed {
    pub id: String,
    pub ticker: String,
    /// Defaults to `$TICKER`.
    #[serde(default)]
    pub full_name: Option<String>,
    pub votes: u64,
    pub ai_score: f64,
    pub bullish_percentage: u32,
    pub holding_percentage: u32,
    pub bearish_percentage: u32,
}

impl From<PollSeed> for Poll {
    fn from(seed: PollSeed) -> Self {
        let full_name = seed
            .full_name
            .unwrap_or_else(|| format!("${}", seed.ticker));
        let shares = BucketPercentages::new(
            seed.bullish_percentage,
            seed.holding_percentage,
            seed.bearish_percentage,
        );
        Poll::new(seed.id, seed.ticker, full_name, seed.ai_score).with_seed(seed.votes, shares)
    }
}

/// A sentiment poll on one ticker.
#[derive(Debug, Clone, Deserialize)]
#[serde(from = "PollSeed")]
pub struct Poll {
    /// Poll ID.
    pub id: String,
    /// Ticker symbol (e.g., "BTC").
    pub ticker: String,
    /// Display name (e.g., "$BTC").
    pub full_name: String,
    /// Model sentiment score for the ticker, 0-100.
    pub ai_score: f64,
    /// Counts over the full vote set, including voters loaded only as counts.
    tallies: Tallies,
    /// Live votes of individually known users.
    votes: HashMap<String, Vote>,
    percentages: BucketPercentages,
}

impl Poll {
    /// Create a poll with no votes.
    pub fn new(
        id: impl Into<String>,
        ticker: impl Into<String>,
        full_name: impl Into<String>,
        ai_score: f64,
    ) -> Self {
        Self {
            id: id.into(),
            ticker: ticker.into(),
            full_name: full_name.into(),
            ai_score,
            tallies: Tallies::default(),
            votes: HashMap::new(),
            percentages: BucketPercentages::default(),
        }
    }

    /// Builder: start from existing per-choice counts.
    pub fn with_tallies(mut self, tallies: Tallies) -> Self {
        self.tallies = tallies;
        self.percentages = BucketPercentages::from_tallies(&self.tallies);
        self
    }

    /// Builder: start from a published total and its displayed shares.
    ///
    /// Bullish and bearish counts are reconstructed from their shares and
    /// holding takes the remainder, so the tally always adds up to `total`.
    pub fn with_seed(self, total: u64, shares: BucketPercentages) -> Self {
        let count = |pct: u32| round_half_up(total as f64 * pct as f64 / 100.0) as u64;
        let bullish = count(shares.bullish).min(total);
        let bearish = count(shares.bearish).min(total - bullish);
        let holding = total - bullish - bearish;
        self.with_tallies(Tallies::new(bullish, holding, bearish))
    }

    /// Number of voters with a live vote.
    pub fn total_votes(&self) -> u64 {
        self.tallies.total()
    }

    pub fn tallies(&self) -> &Tallies {
        &self.tallies
    }

    pub fn percentages(&self) -> &BucketPercentages {
        &self.percentages
    }

    /// The live vote of a user, if any.
    pub fn vote_of(&self, user_id: &str) -> Option<&Vote> {
        self.votes.get(user_id)
    }

    /// Cast or change a user's vote now.
    pub fn cast_vote(&mut self, user_id: &str, choice: VoteChoice) -> VoteOutcome {
        self.cast_vote_at(user_id, choice, Utc::now())
    }

    /// Cast or change a user's vote at a given time.
    pub fn cast_vote_at(
        &mut self,
        user_id: &str,
        choice: VoteChoice,
        at: DateTime<Utc>,
    ) -> VoteOutcome {
        let outcome = match self.votes.get_mut(user_id) {
            Some(vote) if vote.choice == choice => return VoteOutcome::Unchanged,
            Some(vote) => {
                let from = vote.choice;
                let old = self.tallies.get_mut(from);
                *old = old.saturating_sub(1);
                *self.tallies.get_mut(choice) += 1;
                vote.choice = choice;
                vote.cast_at = at;
                VoteOutcome::Changed { from }
            }
            None => {
                *self.tallies.get_mut(choice) += 1;
                self.votes.insert(
                    user_id.to_string(),
                    Vote {
                        user_id: user_id.to_string(),
                        choice,
                        cast_at: at,
                    },
                );
                VoteOutcome::Created
            }
        };

        self.percentages = BucketPercentages::from_tallies(&self.tallies);
        debug!(
            poll = %self.id,
            user = user_id,
            %choice,
            total = self.total_votes(),
            "Vote recorded"
        );
        outcome
    }

    /// Project the poll into an entity, with `user_id`'s vote as `userVote`.
    pub fn to_entity(&self, user_id: Option<&str>) -> Entity {
        let mut entity = Entity::new(&self.id)
            .with_text(&self.ticker)
            .with_text(&self.full_name)
            .with_number("votes", self.total_votes() as f64)
            .with_number("aiScore", self.ai_score)
            .with_number("bullishPercentage", self.percentages.bullish as f64)
            .with_number("holdingPercentage", self.percentages.holding as f64)
            .with_number("bearishPercentage", self.percentages.bearish as f64);

        if let Some(vote) = user_id.and_then(|u| self.vote_of(u)) {
            entity = entity.with_category("userVote", vote.choice.as_str());
        }
        entity
    }
}

/// The polls mounted on a screen, in display order.
#[derive(Debug, Clone, Default)]
pub struct PollBook {
    polls: Vec<Poll>,
}

impl PollBook {
    pub fn new(polls: Vec<Poll>) -> Self {
        Self { polls }
    }

    pub fn polls(&self) -> &[Poll] {
        &self.polls
    }

    pub fn len(&self) -> usize {
        self.polls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.polls.is_empty()
    }

    pub fn get(&self, poll_id: &str) -> Option<&Poll> {
        self.polls.iter().find(|p| p.id == poll_id)
    }

    /// Cast a vote on a poll by id.
    pub fn cast_vote(
        &mut self,
        poll_id: &str,
        user_id: &str,
        choice: VoteChoice,
    ) -> Result<VoteOutcome> {
        let poll = self
            .polls
            .iter_mut()
            .find(|p| p.id == poll_id)
            .ok_or_else(|| Error::unknown_poll(poll_id))?;

        let outcome = poll.cast_vote(user_id, choice);
        if outcome != VoteOutcome::Unchanged {
            info!(poll = poll_id, user = user_id, %choice, ?outcome, "Vote cast");
        }
        Ok(outcome)
    }

    /// Polls the user has voted on, with their vote.
    pub fn votes_by_user(&self, user_id: &str) -> Vec<(&Poll, &Vote)> {
        self.polls
            .iter()
            .filter_map(|p| p.vote_of(user_id).map(|v| (p, v)))
            .collect()
    }

    /// Number of polls the user has voted on.
    pub fn user_vote_count(&self, user_id: &str) -> usize {
        self.polls
            .iter()
            .filter(|p| p.vote_of(user_id).is_some())
            .count()
    }

    /// Project every poll into an entity for querying.
    pub fn entities(&self, user_id: Option<&str>) -> Vec<Entity> {
        self.polls.iter().map(|p| p.to_entity(user_id)).collect()
    }
}
