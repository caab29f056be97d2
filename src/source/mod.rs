//! Entity sources.
//!
//! The engine never loads data itself; screens hand it whatever an
//! [`EntitySource`] produced. Fixtures, files and a future network backend
//! all sit behind the same trait.

use crate::error::{Error, Result};
use crate::state::{Entity, Poll};
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use tracing::info;

/// Something that can list entities.
#[cfg_attr(test, mockall::automock)]
pub trait EntitySource {
    /// List every entity, in source order.
    fn list(&self) -> Result<Vec<Entity>>;
}

/// An in-memory source over a fixed collection.
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    entities: Vec<Entity>,
}

impl StaticSource {
    pub fn new(entities: Vec<Entity>) -> Self {
        Self { entities }
    }
}

impl EntitySource for StaticSource {
    fn list(&self) -> Result<Vec<Entity>> {
        Ok(self.entities.clone())
    }
}

/// Reads a JSON array of entities, or of published polls, from disk.
#[derive(Debug, Clone)]
pub struct JsonFileSource {
    path: PathBuf,
    name: String,
}

impl JsonFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path.display().to_string();
        Self { path, name }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Display name used in logs.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Read the file as published polls instead of entities.
    pub fn polls(&self) -> Result<Vec<Poll>> {
        let polls: Vec<Poll> = self.read()?;
        info!(source = %self.name, count = polls.len(), "Loaded polls");
        Ok(polls)
    }

    fn read<T: DeserializeOwned>(&self) -> Result<Vec<T>> {
        if !self.path.exists() {
            return Err(Error::source(format!(
                "Fixture not found: {}",
                self.path.display()
            )));
        }

        let content = std::fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&content)?)
    }
}

impl EntitySource for JsonFileSource {
    fn list(&self) -> Result<Vec<Entity>> {
        let entities: Vec<Entity> = self.read()?;
        info!(source = %self.name, count = entities.len(), "Loaded entities");
        Ok(entities)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_static_source() {
        let source = StaticSource::new(vec![Entity::new("a"), Entity::new("b")]);
        let ids: Vec<String> = source.list().unwrap().into_iter().map(|e| e.id).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[test]
    fn test_json_file_source() {
        let path = std::env::temp_dir().join(format!(
            "sentidash-source-{}.json",
            std::process::id()
        ));
        std::fs::write(
            &path,
            r#"[
                {
                    "id": "NVDA",
                    "numericAttributes": { "volume": "89.2M" },
                    "textFields": ["NVDA"]
                },
                { "id": "TSLA", "categoricalAttributes": { "sentiment": "bearish" } }
            ]"#,
        )
        .unwrap();

        let entities = JsonFileSource::new(&path).list().unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(entities.len(), 2);
        assert_eq!(entities[0].number("volume"), Some(89_200_000.0));
        assert_eq!(entities[1].category("sentiment"), Some("bearish"));
    }

    #[test]
    fn test_json_file_source_polls() {
        let source = JsonFileSource::new(
            std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("data/community_polls.json"),
        );
        let polls = source.polls().unwrap();

        assert_eq!(polls.len(), 5);
        assert_eq!(polls[0].ticker, "BTC");
        assert_eq!(polls.iter().map(Poll::total_votes).sum::<u64>(), 9594);
    }

    #[test]
    fn test_json_file_source_missing() {
        let err = JsonFileSource::new("/definitely/not/here.json")
            .list()
            .unwrap_err();
        assert!(matches!(err, Error::Source(_)));
    }

    #[test]
    fn test_json_file_source_malformed() {
        let path = std::env::temp_dir().join(format!(
            "sentidash-malformed-{}.json",
            std::process::id()
        ));
        std::fs::write(&path, "{ not json").unwrap();

        let err = JsonFileSource::new(&path).list().unwrap_err();
        std::fs::remove_file(&path).unwrap();

        assert!(matches!(err, Error::Serialization(_)));
    }
}
