//! Configuration settings for Sentidash.

use crate::engine::{Engine, FilterSpec, SortSpec, StatsConfig, Thresholds};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Prefix for environment overrides, e.g. `SENTIDASH__ENGINE__BULLISH_MIN=75`.
const ENV_PREFIX: &str = "SENTIDASH";

/// Main configuration struct.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Classification thresholds.
    pub engine: EngineConfig,
    /// Where entities come from.
    pub source: SourceConfig,
    /// The screen the demo driver renders.
    pub screen: ScreenConfig,
    /// Logging configuration.
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from the default location, returning defaults if absent.
    pub fn load_or_default() -> crate::Result<Self> {
        Self::load(None)
    }

    /// Load configuration from a TOML file, then apply environment overrides.
    pub fn load(path: Option<PathBuf>) -> crate::Result<Self> {
        let config_path = path.unwrap_or_else(default_path);
        let env = env_layer(None)?;
        Self::load_layered(&config_path, &env)
    }

    fn load_layered(config_path: &Path, env: &config::Config) -> crate::Result<Self> {
        let mut config: Self = if config_path.exists() {
            let content = std::fs::read_to_string(config_path)?;
            toml::from_str(&content).map_err(|e| crate::Error::config(e.to_string()))?
        } else {
            Self::default()
        };

        config.apply_overrides(env)?;
        config.validate()?;
        tracing::debug!(path = %config_path.display(), "Configuration loaded");
        Ok(config)
    }

    /// Apply the scalar settings present in an override layer.
    fn apply_overrides(&mut self, env: &config::Config) -> crate::Result<()> {
        if let Some(v) = lookup(env, "engine.bullish_min")? {
            self.engine.bullish_min = v;
        }
        if let Some(v) = lookup(env, "engine.neutral_min")? {
            self.engine.neutral_min = v;
        }
        if let Some(v) = lookup(env, "source.path")? {
            self.source.path = Some(v);
        }
        if let Some(v) = lookup(env, "source.kind")? {
            self.source.kind = v;
        }
        if let Some(v) = lookup(env, "source.user")? {
            self.source.user = v;
        }
        if let Some(v) = lookup(env, "screen.limit")? {
            self.screen.limit = Some(v);
        }
        if let Some(v) = lookup(env, "logging.level")? {
            self.logging.level = v;
        }
        if let Some(v) = lookup(env, "logging.file")? {
            self.logging.file = v;
        }
        Ok(())
    }

    /// Check cross-field constraints.
    pub fn validate(&self) -> crate::Result<()> {
        if !self.engine.thresholds().is_valid() {
            return Err(crate::Error::config(format!(
                "bullish_min ({}) must be greater than neutral_min ({})",
                self.engine.bullish_min, self.engine.neutral_min
            )));
        }
        Ok(())
    }

    /// Save configuration to file.
    pub fn save(&self, path: Option<PathBuf>) -> crate::Result<()> {
        let config_path = path.unwrap_or_else(default_path);

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content =
            toml::to_string_pretty(self).map_err(|e| crate::Error::config(e.to_string()))?;
        std::fs::write(&config_path, content)?;
        Ok(())
    }

    /// Build the engine for the configured screen.
    pub fn engine(&self) -> Engine {
        Engine::new(self.engine.thresholds(), self.screen.stats.clone())
    }
}

/// Build the environment override layer.
///
/// `vars` replaces the process environment, for tests.
fn env_layer(vars: Option<config::Map<String, String>>) -> crate::Result<config::Config> {
    let env = config::Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("__")
        .separator("__")
        .source(vars);
    Ok(config::Config::builder().add_source(env).build()?)
}

fn lookup<T: serde::de::DeserializeOwned>(
    layer: &config::Config,
    key: &str,
) -> crate::Result<Option<T>> {
    match layer.get::<T>(key) {
        Ok(value) => Ok(Some(value)),
        Err(config::ConfigError::NotFound(_)) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

fn default_path() -> PathBuf {
    super::config_dir()
        .map(|p| p.join("config.toml"))
        .unwrap_or_else(|_| PathBuf::from("config.toml"))
}

/// Sentiment classification settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Scores at or above this are bullish.
    pub bullish_min: f64,
    /// Scores at or above this are neutral.
    pub neutral_min: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        let thresholds = Thresholds::default();
        Self {
            bullish_min: thresholds.bullish_min,
            neutral_min: thresholds.neutral_min,
        }
    }
}

impl EngineConfig {
    pub fn thresholds(&self) -> Thresholds {
        Thresholds::new(self.bullish_min, self.neutral_min)
    }
}

/// What a fixture file holds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Plain entities.
    Entities,
    /// Published polls, which accept votes.
    #[default]
    Polls,
}

/// Entity source settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Path to a JSON fixture.
    pub path: Option<PathBuf>,
    /// What the fixture holds.
    pub kind: SourceKind,
    /// The user votes are cast as.
    pub user: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            path: None,
            kind: SourceKind::default(),
            user: "local".to_string(),
        }
    }
}

/// Default filter, sort and statistics for a screen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScreenConfig {
    pub filter: FilterSpec,
    pub sort: SortSpec,
    pub stats: StatsConfig,
    /// Maximum rows to show (unset shows all).
    pub limit: Option<usize>,
}

impl Default for ScreenConfig {
    fn default() -> Self {
        Self {
            filter: FilterSpec::default(),
            sort: SortSpec::desc("votes"),
            stats: StatsConfig::community_polls(),
            limit: None,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    pub level: String,
    /// Also write a daily rolling log file under the data directory.
    pub file: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "sentidash=info".to_string(),
            file: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::SortDirection;
    use pretty_assertions::assert_eq;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("sentidash-{}-{}.toml", name, std::process::id()))
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let config = Config::load(Some(temp_path("absent"))).unwrap();
        assert_eq!(config.engine, EngineConfig::default());
        assert_eq!(config.screen.sort, SortSpec::desc("votes"));
        assert_eq!(config.logging.level, "sentidash=info");
    }

    #[test]
    fn test_load_partial_file() {
        let path = temp_path("partial");
        std::fs::write(
            &path,
            r#"
[engine]
bullish_min = 75.0

[screen]
limit = 8

[screen.sort]
key = "changePercent"
direction = "asc"

[screen.filter]
textQuery = "nv"
"#,
        )
        .unwrap();

        let config = Config::load(Some(path.clone())).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(config.engine.bullish_min, 75.0);
        assert_eq!(config.engine.neutral_min, 50.0);
        assert_eq!(config.screen.limit, Some(8));
        assert_eq!(
            config.screen.sort,
            SortSpec::new("changePercent", SortDirection::Asc)
        );
        assert_eq!(config.screen.filter.text_query.as_deref(), Some("nv"));
    }

    #[test]
    fn test_invalid_thresholds_rejected() {
        let path = temp_path("invalid");
        std::fs::write(&path, "[engine]\nbullish_min = 40.0\nneutral_min = 50.0\n").unwrap();

        let result = Config::load(Some(path.clone()));
        std::fs::remove_file(&path).unwrap();

        assert!(matches!(result, Err(crate::Error::Config(_))));
    }

    #[test]
    fn test_save_and_reload() {
        let path = temp_path("roundtrip");
        let mut config = Config::default();
        config.engine.bullish_min = 80.0;
        config.screen.stats = StatsConfig::trade_journal();
        config.save(Some(path.clone())).unwrap();

        let loaded = Config::load(Some(path.clone())).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(loaded.engine.bullish_min, 80.0);
        assert_eq!(loaded.screen.stats, StatsConfig::trade_journal());
    }

    #[test]
    fn test_env_overrides_file() {
        let path = temp_path("env");
        std::fs::write(&path, "[engine]\nbullish_min = 75.0\n").unwrap();

        let vars = config::Map::from([
            ("SENTIDASH__ENGINE__BULLISH_MIN".to_string(), "80".to_string()),
            ("SENTIDASH__SCREEN__LIMIT".to_string(), "8".to_string()),
            ("SENTIDASH__LOGGING__FILE".to_string(), "true".to_string()),
            ("SENTIDASH__SOURCE__KIND".to_string(), "entities".to_string()),
            ("UNRELATED".to_string(), "x".to_string()),
        ]);
        let env = env_layer(Some(vars)).unwrap();
        let config = Config::load_layered(&path, &env).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(config.engine.bullish_min, 80.0);
        assert_eq!(config.screen.limit, Some(8));
        assert!(config.logging.file);
        assert_eq!(config.source.kind, SourceKind::Entities);
        assert_eq!(config.source.user, "local");
    }

    #[test]
    fn test_env_override_type_error() {
        let vars = config::Map::from([(
            "SENTIDASH__ENGINE__NEUTRAL_MIN".to_string(),
            "fifty".to_string(),
        )]);
        let env = env_layer(Some(vars)).unwrap();
        let result = Config::load_layered(&temp_path("absent-env"), &env);
        assert!(matches!(result, Err(crate::Error::Config(_))));
    }

    #[test]
    fn test_engine_from_config() {
        let config = Config::default();
        let engine = config.engine();
        assert_eq!(engine.thresholds(), &Thresholds::default());
        assert_eq!(engine.stats_config(), &StatsConfig::community_polls());
    }
}
