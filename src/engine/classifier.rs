//! Sentiment bucketing.

use serde::{Deserialize, Serialize};

/// A sentiment bucket.
///
/// Variants are declared in rank order so the derived `Ord` gives
/// `Bearish < Neutral < Bullish`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Bearish,
    Neutral,
    Bullish,
}

impl Sentiment {
    /// All buckets, lowest rank first.
    pub const ALL: [Sentiment; 3] = [Self::Bearish, Self::Neutral, Self::Bullish];

    /// Map a source label onto a bucket.
    ///
    /// News feeds label items `positive`/`negative`, polls use `holding` for
    /// the middle choice; all of these are accepted case-insensitively.
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "bullish" | "positive" => Some(Self::Bullish),
            "neutral" | "holding" => Some(Self::Neutral),
            "bearish" | "negative" => Some(Self::Bearish),
            _ => None,
        }
    }

    /// Lowercase label as used in categorical attributes.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bearish => "bearish",
            Self::Neutral => "neutral",
            Self::Bullish => "bullish",
        }
    }
}

impl std::fmt::Display for Sentiment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bearish => write!(f, "Bearish"),
            Self::Neutral => write!(f, "Neutral"),
            Self::Bullish => write!(f, "Bullish"),
        }
    }
}

/// Lower edges of the two upper buckets.
///
/// A score exactly on an edge belongs to the higher bucket.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    /// Scores at or above this are bullish.
    pub bullish_min: f64,
    /// Scores at or above this (and below `bullish_min`) are neutral.
    pub neutral_min: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            bullish_min: 70.0,
            neutral_min: 50.0,
        }
    }
}

impl Thresholds {
    /// Create thresholds from the two lower edges.
    pub fn new(bullish_min: f64, neutral_min: f64) -> Self {
        Self {
            bullish_min,
            neutral_min,
        }
    }

    /// Check that `bullish_min > neutral_min`.
    pub fn is_valid(&self) -> bool {
        self.bullish_min > self.neutral_min
    }

    /// Classify a score with these thresholds.
    pub fn classify(&self, score: f64) -> Sentiment {
        classify(score, self)
    }
}

/// Classify a sentiment score into a bucket.
///
/// Scores outside `[0, 100]` are not rejected; they classify with the same
/// rule as any other number.
pub fn classify(score: f64, thresholds: &Thresholds) -> Sentiment {
    if score >= thresholds.bullish_min {
        Sentiment::Bullish
    } else if score >= thresholds.neutral_min {
        Sentiment::Neutral
    } else {
        Sentiment::Bearish
    }
}

/// Round half toward positive infinity, matching the dashboard's display
/// rounding (`65.5 -> 66`, `-2.5 -> -2`).
pub fn round_half_up(value: f64) -> f64 {
    let floor = value.floor();
    if value - floor >= 0.5 {
        floor + 1.0
    } else {
        floor
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boundaries() {
        let t = Thresholds::default();
        assert_eq!(classify(70.0, &t), Sentiment::Bullish);
        assert_eq!(classify(69.999, &t), Sentiment::Neutral);
        assert_eq!(classify(50.0, &t), Sentiment::Neutral);
        assert_eq!(classify(49.999, &t), Sentiment::Bearish);
    }

    #[test]
    fn test_out_of_range_scores() {
        let t = Thresholds::default();
        assert_eq!(classify(-10.0, &t), Sentiment::Bearish);
        assert_eq!(classify(150.0, &t), Sentiment::Bullish);
    }

    #[test]
    fn test_monotonic() {
        let t = Thresholds::default();
        let mut previous = classify(-5.0, &t);
        let mut score = -5.0;
        while score <= 105.0 {
            let current = classify(score, &t);
            assert!(previous <= current, "rank dropped at {score}");
            previous = current;
            score += 0.25;
        }
    }

    #[test]
    fn test_custom_thresholds() {
        let t = Thresholds::new(60.0, 40.0);
        assert!(t.is_valid());
        assert_eq!(t.classify(60.0), Sentiment::Bullish);
        assert_eq!(t.classify(45.0), Sentiment::Neutral);
        assert_eq!(t.classify(39.0), Sentiment::Bearish);
        assert!(!Thresholds::new(50.0, 50.0).is_valid());
    }

    #[test]
    fn test_from_label() {
        assert_eq!(Sentiment::from_label("positive"), Some(Sentiment::Bullish));
        assert_eq!(Sentiment::from_label("Bearish"), Some(Sentiment::Bearish));
        assert_eq!(Sentiment::from_label("holding"), Some(Sentiment::Neutral));
        assert_eq!(Sentiment::from_label("mixed"), None);
    }

    #[test]
    fn test_round_half_up() {
        assert_eq!(round_half_up(65.6), 66.0);
        assert_eq!(round_half_up(65.5), 66.0);
        assert_eq!(round_half_up(65.4), 65.0);
        assert_eq!(round_half_up(-2.5), -2.0);
        assert_eq!(round_half_up(-2.6), -3.0);
    }
}
