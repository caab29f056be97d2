//! The entity shape every dashboard collection is normalized into.

use crate::engine::normalize;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A numeric attribute as it arrives from a data source.
///
/// Sources frequently ship display strings (`"45.3M"`, `"$1.2B"`) where a
/// number is meant; those are kept verbatim and normalized on read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NumericValue {
    /// A plain number.
    Number(f64),
    /// A formatted display string.
    Formatted(String),
}

impl NumericValue {
    /// Resolve to a plain number.
    ///
    /// Unparseable strings resolve to `0.0` so that sorting and filtering
    /// stay total.
    pub fn resolve(&self) -> f64 {
        match self {
            Self::Number(v) if v.is_nan() => 0.0,
            Self::Number(v) => *v,
            Self::Formatted(raw) => normalize::normalize_or_zero(raw),
        }
    }
}

impl From<f64> for NumericValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<&str> for NumericValue {
    fn from(value: &str) -> Self {
        Self::Formatted(value.to_string())
    }
}

/// A ticker, news item, poll, trade or country.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entity {
    /// Stable unique identifier.
    pub id: String,
    /// Numeric attributes (`changePercent`, `volume`, `sentimentScore`, ...).
    #[serde(default)]
    pub numeric_attributes: HashMap<String, NumericValue>,
    /// Categorical attributes (`sentiment`, `sector`, `status`, ...).
    #[serde(default)]
    pub categorical_attributes: HashMap<String, String>,
    /// Strings eligible for text search, in display order.
    #[serde(default)]
    pub text_fields: Vec<String>,
}

impl Entity {
    /// Create an entity with no attributes.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            numeric_attributes: HashMap::new(),
            categorical_attributes: HashMap::new(),
            text_fields: Vec::new(),
        }
    }

    /// Builder: add a numeric attribute.
    pub fn with_number(mut self, name: impl Into<String>, value: impl Into<NumericValue>) -> Self {
        self.numeric_attributes.insert(name.into(), value.into());
        self
    }

    /// Builder: add a categorical attribute.
    pub fn with_category(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.categorical_attributes.insert(name.into(), value.into());
        self
    }

    /// Builder: append a searchable text field.
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text_fields.push(text.into());
        self
    }

    /// Get a numeric attribute as a plain number.
    pub fn number(&self, name: &str) -> Option<f64> {
        self.numeric_attributes.get(name).map(NumericValue::resolve)
    }

    /// Get a categorical attribute.
    pub fn category(&self, name: &str) -> Option<&str> {
        self.categorical_attributes.get(name).map(String::as_str)
    }

    /// Overwrite a numeric attribute.
    pub fn set_number(&mut self, name: impl Into<String>, value: f64) {
        self.numeric_attributes
            .insert(name.into(), NumericValue::Number(value));
    }

    /// Check whether any text field contains `needle_lower`.
    ///
    /// `needle_lower` must already be lowercased.
    pub fn text_contains(&self, needle_lower: &str) -> bool {
        self.text_fields
            .iter()
            .any(|t| t.to_lowercase().contains(needle_lower))
    }
}
