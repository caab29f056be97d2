//! Stable single-key sorting over numeric or categorical attributes.

use crate::state::Entity;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl SortDirection {
    /// The opposite direction.
    pub fn toggled(self) -> Self {
        match self {
            Self::Asc => Self::Desc,
            Self::Desc => Self::Asc,
        }
    }

    /// Apply the direction to an ascending comparison.
    pub fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            Self::Asc => ordering,
            Self::Desc => ordering.reverse(),
        }
    }
}

impl std::fmt::Display for SortDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Asc => write!(f, "Ascending"),
            Self::Desc => write!(f, "Descending"),
        }
    }
}

/// Which attribute to order by, and in which direction.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SortSpec {
    /// Attribute name, looked up among numeric then categorical attributes.
    pub key: String,
    /// Sort direction.
    #[serde(default)]
    pub direction: SortDirection,
}

impl SortSpec {
    /// Create a sort spec.
    pub fn new(key: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            key: key.into(),
            direction,
        }
    }

    /// Ascending by `key`.
    pub fn asc(key: impl Into<String>) -> Self {
        Self::new(key, SortDirection::Asc)
    }

    /// Descending by `key`.
    pub fn desc(key: impl Into<String>) -> Self {
        Self::new(key, SortDirection::Desc)
    }
}

/// How a sort key resolves against a collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyKind {
    Numeric,
    Categorical,
    /// No entity carries the key; every comparison is equal.
    Unresolved,
}

/// Resolve `key` against a collection.
///
/// Numeric wins if any entity has a numeric attribute of that name.
pub fn resolve_key(entities: &[&Entity], key: &str) -> KeyKind {
    if entities
        .iter()
        .any(|e| e.numeric_attributes.contains_key(key))
    {
        KeyKind::Numeric
    } else if entities
        .iter()
        .any(|e| e.categorical_attributes.contains_key(key))
    {
        KeyKind::Categorical
    } else {
        KeyKind::Unresolved
    }
}

enum SortValue<'a> {
    Number(f64),
    Text(&'a str),
}

impl SortValue<'_> {
    fn compare(&self, other: &Self) -> Ordering {
        match (self, other) {
            // Values are NaN-free here, so partial_cmp is total.
            (Self::Number(a), Self::Number(b)) => a.partial_cmp(b).unwrap_or(Ordering::Equal),
            (Self::Text(a), Self::Text(b)) => a.cmp(b),
            _ => Ordering::Equal,
        }
    }
}

/// Order entities by `spec`.
///
/// The sort is stable: entities with equal keys keep their input order in
/// both directions. Entities missing a numeric key sort as `0`, missing a
/// categorical key sort as `""`, so the order is always total.
pub fn sort<'a, I>(entities: I, spec: &SortSpec) -> Vec<&'a Entity>
where
    I: IntoIterator<Item = &'a Entity>,
{
    let rows: Vec<&'a Entity> = entities.into_iter().collect();
    let kind = resolve_key(&rows, &spec.key);

    if kind == KeyKind::Unresolved {
        tracing::debug!(key = %spec.key, "Sort key not found, keeping input order");
        return rows;
    }

    let numeric = kind == KeyKind::Numeric;
    let mut keyed: Vec<(SortValue<'a>, &'a Entity)> = rows
        .into_iter()
        .map(|e| {
            let value = if numeric {
                SortValue::Number(e.number(&spec.key).unwrap_or(0.0))
            } else {
                SortValue::Text(e.category(&spec.key).unwrap_or(""))
            };
            (value, e)
        })
        .collect();

    // slice::sort_by is stable.
    keyed.sort_by(|(a, _), (b, _)| spec.direction.apply(a.compare(b)));
    keyed.into_iter().map(|(_, e)| e).collect()
}
