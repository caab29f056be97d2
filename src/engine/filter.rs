//! Filter pipeline: text search, categorical equality and numeric ranges.

use crate::state::Entity;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Categorical value that matches every entity.
pub const WILDCARD: &str = "all";

/// An inclusive numeric range; either bound may be omitted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct NumericRange {
    /// Inclusive lower bound.
    #[serde(default)]
    pub min: Option<f64>,
    /// Inclusive upper bound.
    #[serde(default)]
    pub max: Option<f64>,
}

impl NumericRange {
    /// Range with both bounds.
    pub fn between(min: f64, max: f64) -> Self {
        Self {
            min: Some(min),
            max: Some(max),
        }
    }

    /// Range with only a lower bound.
    pub fn at_least(min: f64) -> Self {
        Self {
            min: Some(min),
            max: None,
        }
    }

    /// Range with only an upper bound.
    pub fn at_most(max: f64) -> Self {
        Self {
            min: None,
            max: Some(max),
        }
    }

    /// Whether neither bound is set.
    pub fn is_unbounded(&self) -> bool {
        self.min.is_none() && self.max.is_none()
    }

    /// Check whether a value lies inside the range.
    pub fn contains(&self, value: f64) -> bool {
        self.min.is_none_or(|min| value >= min) && self.max.is_none_or(|max| value <= max)
    }
}

/// Which entities to keep.
///
/// All supplied predicates must hold (logical AND). A default spec keeps
/// everything.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FilterSpec {
    /// Case-insensitive substring matched against any text field.
    pub text_query: Option<String>,
    /// Attribute must equal the value; `"all"` matches everything.
    pub categorical_equals: BTreeMap<String, String>,
    /// Attribute must lie within the range.
    pub numeric_range: BTreeMap<String, NumericRange>,
}

impl FilterSpec {
    /// Builder: set the text query.
    pub fn with_text(mut self, query: impl Into<String>) -> Self {
        self.text_query = Some(query.into());
        self
    }

    /// Builder: require a categorical value.
    pub fn with_category(mut self, attribute: impl Into<String>, value: impl Into<String>) -> Self {
        self.categorical_equals.insert(attribute.into(), value.into());
        self
    }

    /// Builder: require a numeric range.
    pub fn with_range(mut self, attribute: impl Into<String>, range: NumericRange) -> Self {
        self.numeric_range.insert(attribute.into(), range);
        self
    }

    /// Whether this spec filters anything out at all.
    pub fn is_empty(&self) -> bool {
        self.active_query().is_none()
            && self.categorical_equals.values().all(|v| v == WILDCARD)
            && self.numeric_range.values().all(NumericRange::is_unbounded)
    }

    /// Lowercased text query, if one is set and non-empty.
    fn active_query(&self) -> Option<String> {
        self.text_query
            .as_deref()
            .filter(|q| !q.is_empty())
            .map(str::to_lowercase)
    }

    /// Check a single entity against every predicate.
    pub fn matches(&self, entity: &Entity) -> bool {
        let query = self.active_query();
        self.matches_with_query(entity, query.as_deref())
    }

    fn matches_with_query(&self, entity: &Entity, query: Option<&str>) -> bool {
        if let Some(query) = query
            && !entity.text_contains(query)
        {
            return false;
        }

        for (attribute, expected) in &self.categorical_equals {
            if expected != WILDCARD && entity.category(attribute) != Some(expected.as_str()) {
                return false;
            }
        }

        for (attribute, range) in &self.numeric_range {
            if range.is_unbounded() {
                continue;
            }
            // A missing attribute cannot satisfy a bound.
            match entity.number(attribute) {
                Some(value) if range.contains(value) => {}
                _ => return false,
            }
        }

        true
    }
}

/// Keep the entities that satisfy `spec`, preserving input order.
pub fn filter<'a, I>(entities: I, spec: &FilterSpec) -> Vec<&'a Entity>
where
    I: IntoIterator<Item = &'a Entity>,
{
    let query = spec.active_query();
    entities
        .into_iter()
        .filter(|e| spec.matches_with_query(e, query.as_deref()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn stocks() -> Vec<Entity> {
        vec![
            Entity::new("NVDA")
                .with_text("NVDA")
                .with_text("NVIDIA Corporation")
                .with_number("changePercent", 2.76)
                .with_number("volume", "89.2M")
                .with_category("sentiment", "bullish"),
            Entity::new("TSLA")
                .with_text("TSLA")
                .with_text("Tesla, Inc.")
                .with_number("changePercent", -3.21)
                .with_number("volume", "156.7M")
                .with_category("sentiment", "bearish"),
            Entity::new("AAPL")
                .with_text("AAPL")
                .with_text("Apple Inc.")
                .with_number("changePercent", 2.21)
                .with_number("volume", "67.3M")
                .with_category("sentiment", "bullish"),
            Entity::new("GOOGL")
                .with_text("GOOGL")
                .with_text("Alphabet Inc.")
                .with_number("changePercent", -2.02)
                .with_number("volume", "34.1M")
                .with_category("sentiment", "neutral"),
        ]
    }

    fn ids(rows: &[&Entity]) -> Vec<String> {
        rows.iter().map(|e| e.id.clone()).collect()
    }

    #[test]
    fn test_no_predicates_is_identity() {
        let data = stocks();
        let rows = filter(&data, &FilterSpec::default());
        assert_eq!(ids(&rows), vec!["NVDA", "TSLA", "AAPL", "GOOGL"]);
        assert!(FilterSpec::default().is_empty());
    }

    #[test]
    fn test_empty_input() {
        let data: Vec<Entity> = vec![];
        let spec = FilterSpec::default().with_text("nv");
        assert!(filter(&data, &spec).is_empty());
    }

    #[test]
    fn test_text_query_matches_any_field() {
        let data = stocks();
        let rows = filter(&data, &FilterSpec::default().with_text("inc."));
        assert_eq!(ids(&rows), vec!["TSLA", "AAPL", "GOOGL"]);

        let rows = filter(&data, &FilterSpec::default().with_text("nvidia"));
        assert_eq!(ids(&rows), vec!["NVDA"]);
    }

    #[test]
    fn test_empty_text_query_is_ignored() {
        let data = stocks();
        let rows = filter(&data, &FilterSpec::default().with_text(""));
        assert_eq!(rows.len(), 4);
    }

    #[test]
    fn test_categorical_wildcard() {
        let data = stocks();
        let rows = filter(&data, &FilterSpec::default().with_category("sentiment", "all"));
        assert_eq!(rows.len(), 4);

        let rows = filter(
            &data,
            &FilterSpec::default().with_category("sentiment", "bullish"),
        );
        assert_eq!(ids(&rows), vec!["NVDA", "AAPL"]);
    }

    #[test]
    fn test_categorical_missing_attribute_excluded() {
        let data = stocks();
        let rows = filter(&data, &FilterSpec::default().with_category("sector", "tech"));
        assert!(rows.is_empty());
    }

    #[test]
    fn test_numeric_range_inclusive() {
        let data = stocks();
        let spec =
            FilterSpec::default().with_range("changePercent", NumericRange::between(-2.02, 2.21));
        assert_eq!(ids(&filter(&data, &spec)), vec!["AAPL", "GOOGL"]);

        let spec = FilterSpec::default().with_range("changePercent", NumericRange::at_least(0.0));
        assert_eq!(ids(&filter(&data, &spec)), vec!["NVDA", "AAPL"]);

        let spec = FilterSpec::default().with_range("changePercent", NumericRange::at_most(0.0));
        assert_eq!(ids(&filter(&data, &spec)), vec!["TSLA", "GOOGL"]);
    }

    #[test]
    fn test_numeric_range_normalizes_formatted_values() {
        let data = stocks();
        let spec = FilterSpec::default().with_range("volume", NumericRange::at_least(80_000_000.0));
        assert_eq!(ids(&filter(&data, &spec)), vec!["NVDA", "TSLA"]);
    }

    #[test]
    fn test_predicates_compose_with_and() {
        let data = stocks();
        let spec = FilterSpec::default()
            .with_text("inc")
            .with_category("sentiment", "bullish")
            .with_range("changePercent", NumericRange::at_least(1.0));
        assert_eq!(ids(&filter(&data, &spec)), vec!["AAPL"]);
    }

    #[test]
    fn test_filter_is_idempotent() {
        let data = stocks();
        let spec = FilterSpec::default()
            .with_text("a")
            .with_range("changePercent", NumericRange::at_most(2.5));
        let once = filter(&data, &spec);
        let twice = filter(once.iter().copied(), &spec);
        assert_eq!(ids(&once), ids(&twice));
    }

    #[test]
    fn test_deserialize_spec() {
        let json = r#"{
            "textQuery": "aapl",
            "categoricalEquals": { "sentiment": "all" },
            "numericRange": { "changePercent": { "min": 0.0 } }
        }"#;
        let spec: FilterSpec = serde_json::from_str(json).unwrap();
        assert_eq!(spec.text_query.as_deref(), Some("aapl"));
        assert_eq!(spec.numeric_range["changePercent"], NumericRange::at_least(0.0));
    }
}
