//! TOML-based application configuration.
//!
//! Stores:
//! - Joker ledger parameters (milestone interval, cap)
//! - The default today policy
//! - Tracker definitions (rule, calendar offset, day assignment, window)
//!
//! Configuration is stored at `<data_dir>/config.toml`.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::data_dir;
use crate::engine::{RewardPolicy, TodayPolicy, MILESTONE_INTERVAL_DAYS, REWARD_CAP};
use crate::error::{ConfigError, CoreError, Result};
use crate::tracker::{StreakService, TrackerDefinition};

/// Engine-wide configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default = "default_milestone_interval")]
    pub milestone_interval: u32,
    #[serde(default = "default_reward_cap")]
    pub reward_cap: u32,
    #[serde(default)]
    pub today_policy: TodayPolicy,
}

/// Application configuration.
///
/// Serialized to/from TOML at `<data_dir>/config.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default = "TrackerDefinition::presets")]
    pub trackers: Vec<TrackerDefinition>,
}

fn default_milestone_interval() -> u32 {
    MILESTONE_INTERVAL_DAYS
}
fn default_reward_cap() -> u32 {
    REWARD_CAP
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            milestone_interval: default_milestone_interval(),
            reward_cap: default_reward_cap(),
            today_policy: TodayPolicy::default(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            engine: EngineConfig::default(),
            trackers: TrackerDefinition::presets(),
        }
    }
}

impl EngineConfig {
    pub fn reward_policy(&self) -> RewardPolicy {
        RewardPolicy {
            milestone_interval: self.milestone_interval,
            reward_cap: self.reward_cap,
        }
    }
}

impl Config {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let unknown = || ConfigError::UnknownKey(key.to_string());
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let mut parts = key.split('.').peekable();
        if parts.peek().map_or(true, |part| part.is_empty()) {
            return Err(unknown());
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            if parts.peek().is_none() {
                let obj = current.as_object_mut().ok_or_else(unknown)?;
                let existing = obj.get(part).ok_or_else(unknown)?;

                let new_value = match existing {
                    serde_json::Value::Bool(_) => serde_json::Value::Bool(
                        value.parse::<bool>().map_err(|e| invalid(e.to_string()))?,
                    ),
                    serde_json::Value::Number(_) => {
                        if let Ok(n) = value.parse::<u64>() {
                            serde_json::Value::Number(n.into())
                        } else if let Ok(n) = value.parse::<f64>() {
                            serde_json::Number::from_f64(n)
                                .map(serde_json::Value::Number)
                                .ok_or_else(|| invalid(format!("cannot parse '{value}' as number")))?
                        } else {
                            return Err(invalid(format!("cannot parse '{value}' as number")));
                        }
                    }
                    serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                        serde_json::from_str(value).map_err(|e| invalid(e.to_string()))?
                    }
                    // Unset optional: take the literal if it parses, else a string
                    serde_json::Value::Null => serde_json::from_str(value)
                        .unwrap_or_else(|_| serde_json::Value::String(value.into())),
                    _ => serde_json::Value::String(value.into()),
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = match current {
                // Trackers are addressed by name: `trackers.noalc.window_days`
                serde_json::Value::Array(items) => items
                    .iter_mut()
                    .find(|item| item.get("name").and_then(|n| n.as_str()) == Some(part))
                    .ok_or_else(unknown)?,
                other => other.get_mut(part).ok_or_else(unknown)?,
            };
        }

        Err(unknown())
    }

    fn path() -> Result<PathBuf, ConfigError> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from the data directory, writing defaults if no file exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::path()?)
    }

    /// Load from an explicit path, writing defaults if it does not exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                let cfg: Config = toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                })?;
                cfg.validate()?;
                Ok(cfg)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = %path.display(), "writing default configuration");
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Persist to the data directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))?;
        Ok(())
    }

    /// Load from disk, returning default on error.
    /// This is a convenience method that never fails.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "falling back to default configuration");
            Self::default()
        })
    }

    /// Check engine parameters and every tracker definition.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.engine.milestone_interval == 0 {
            return Err(ConfigError::InvalidValue {
                key: "engine.milestone_interval".into(),
                message: "must be at least 1".into(),
            });
        }
        if self.engine.reward_cap == 0 {
            return Err(ConfigError::InvalidValue {
                key: "engine.reward_cap".into(),
                message: "must be at least 1".into(),
            });
        }
        let mut seen = HashSet::new();
        for tracker in &self.trackers {
            if !seen.insert(tracker.name.as_str()) {
                return Err(ConfigError::InvalidValue {
                    key: format!("trackers.{}", tracker.name),
                    message: "tracker name is used more than once".into(),
                });
            }
            tracker.validate().map_err(|e| ConfigError::InvalidValue {
                key: format!("trackers.{}", tracker.name),
                message: e.to_string(),
            })?;
        }
        Ok(())
    }

    pub fn tracker(&self, name: &str) -> Result<&TrackerDefinition> {
        self.trackers
            .iter()
            .find(|tracker| tracker.name == name)
            .ok_or_else(|| CoreError::UnknownTracker(name.to_string()))
    }

    /// Service configured with this config's engine parameters.
    pub fn service(&self) -> StreakService {
        StreakService::new(self.engine.reward_policy(), self.engine.today_policy)
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = match key.split_once('.') {
            Some(("trackers", rest)) => {
                let (name, field) = rest.split_once('.').unwrap_or((rest, ""));
                let tracker = json
                    .get("trackers")?
                    .as_array()?
                    .iter()
                    .find(|t| t.get("name").and_then(|n| n.as_str()) == Some(name))?;
                if field.is_empty() {
                    tracker
                } else {
                    Self::get_json_value_by_path(tracker, field)?
                }
            }
            _ => Self::get_json_value_by_path(&json, key)?,
        };
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by key without persisting it.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown or the value is invalid.
    pub fn apply(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut json = serde_json::to_value(&*self).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let updated: Config =
            serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
                key: key.to_string(),
                message: e.to_string(),
            })?;
        updated.validate()?;
        *self = updated;
        Ok(())
    }

    /// Set a config value by key and save. Returns error if key is unknown.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown, the value cannot be parsed,
    /// or the config cannot be saved.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.apply(key, value)?;
        self.save()
    }
}
