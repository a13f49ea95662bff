//! Configuration management for `vocab_store`.
//!
//! Configuration sources and precedence (highest wins):
//! 1. CLI overrides
//! 2. Environment variables (`VOCAB_*`)
//! 3. Store config (`vocab.yaml` next to the database file)
//! 4. User config (`~/.config/vocab/config.yaml`)
//! 5. Defaults

use crate::error::{Result, VocabError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Default database filename used by the CLI when `--db` is not given.
pub const DEFAULT_DB_FILENAME: &str = "vocab.db";
/// Config file looked up next to the database.
pub const STORE_CONFIG_FILENAME: &str = "vocab.yaml";

const DEFAULT_HISTORY_LIMIT: usize = 100;
const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// Runtime settings for a [`crate::Store`] and the lists it hands out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Maximum number of undo steps kept per list. Oldest are dropped first.
    pub history_limit: usize,
    /// Merge consecutive edits of the same entry property into one undo step.
    pub coalesce_edits: bool,
    /// How long to wait on a locked database file before failing.
    pub busy_timeout_ms: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            history_limit: DEFAULT_HISTORY_LIMIT,
            coalesce_edits: true,
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
        }
    }
}

impl StoreConfig {
    /// Build a config from a merged layer; unset keys keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns `Config` if a value does not parse.
    pub fn from_layer(layer: &ConfigLayer) -> Result<Self> {
        let mut config = Self::default();

        if let Some(value) = layer.get("history-limit") {
            config.history_limit = parse_number(value, "history-limit")?;
        }
        if let Some(value) = layer.get("coalesce-edits") {
            config.coalesce_edits = parse_bool(value).ok_or_else(|| invalid("coalesce-edits", value))?;
        }
        if let Some(value) = layer.get("busy-timeout-ms") {
            config.busy_timeout_ms = parse_number(value, "busy-timeout-ms")?;
        }

        Ok(config)
    }
}

/// A flat set of normalized `key -> value` settings from one source.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigLayer {
    pub values: HashMap<String, String>,
}

impl ConfigLayer {
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&String> {
        self.values.get(&normalize_key(key))
    }

    pub fn insert(&mut self, key: &str, value: impl Into<String>) {
        self.values.insert(normalize_key(key), value.into());
    }

    /// Merge another layer on top of this one (higher precedence wins).
    pub fn merge_from(&mut self, other: &Self) {
        for (key, value) in &other.values {
            self.values.insert(key.clone(), value.clone());
        }
    }

    /// Merge multiple layers in precedence order (lowest to highest).
    #[must_use]
    pub fn merge_layers(layers: &[Self]) -> Self {
        let mut merged = Self::default();
        for layer in layers {
            merged.merge_from(layer);
        }
        merged
    }

    /// Build a layer from a YAML file path. Missing files return empty config.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn from_yaml(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)?;
        let value: serde_yaml::Value = serde_yaml::from_str(&contents)?;
        Ok(layer_from_yaml_value(&value))
    }

    /// Build a layer from `VOCAB_*` environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_vars(env::vars())
    }

    fn from_vars(vars: impl IntoIterator<Item = (String, String)>) -> Self {
        let mut layer = Self::default();
        for (key, value) in vars {
            if key == "VOCAB_DB" {
                continue;
            }
            if let Some(stripped) = key.strip_prefix("VOCAB_") {
                layer.insert(&stripped.to_lowercase(), value);
            }
        }
        layer
    }
}

/// CLI overrides for config loading (optional).
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub history_limit: Option<usize>,
    pub busy_timeout_ms: Option<u64>,
}

impl CliOverrides {
    #[must_use]
    pub fn as_layer(&self) -> ConfigLayer {
        let mut layer = ConfigLayer::default();
        if let Some(limit) = self.history_limit {
            layer.insert("history-limit", limit.to_string());
        }
        if let Some(timeout) = self.busy_timeout_ms {
            layer.insert("busy-timeout-ms", timeout.to_string());
        }
        layer
    }
}

/// Location of the per-user config file, if `HOME` is known.
#[must_use]
pub fn user_config_path() -> Option<PathBuf> {
    env::var_os("HOME").map(|home| {
        Path::new(&home)
            .join(".config")
            .join("vocab")
            .join("config.yaml")
    })
}

/// Location of the config file that sits next to a database.
#[must_use]
pub fn store_config_path(db_path: &Path) -> PathBuf {
    db_path
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .join(STORE_CONFIG_FILENAME)
}

/// Load configuration with the documented precedence order.
///
/// # Errors
///
/// Returns an error if any config file cannot be read or parsed, or a value is invalid.
pub fn load_config(db_path: Option<&Path>, cli: &CliOverrides) -> Result<StoreConfig> {
    let user = match user_config_path() {
        Some(path) => ConfigLayer::from_yaml(&path)?,
        None => ConfigLayer::default(),
    };
    let store = match db_path {
        Some(path) => ConfigLayer::from_yaml(&store_config_path(path))?,
        None => ConfigLayer::default(),
    };
    let env_layer = ConfigLayer::from_env();
    let cli_layer = cli.as_layer();

    let merged = ConfigLayer::merge_layers(&[user, store, env_layer, cli_layer]);
    StoreConfig::from_layer(&merged)
}

fn invalid(key: &str, value: &str) -> VocabError {
    VocabError::Config(format!("invalid value '{value}' for {key}"))
}

fn parse_number<T: std::str::FromStr>(value: &str, key: &str) -> Result<T> {
    value.trim().parse().map_err(|_| invalid(key, value))
}

fn normalize_key(key: &str) -> String {
    key.trim().to_lowercase().replace('_', "-")
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn layer_from_yaml_value(value: &serde_yaml::Value) -> ConfigLayer {
    let mut flat = HashMap::new();
    flatten_yaml(value, "", &mut flat);

    let mut layer = ConfigLayer::default();
    for (key, value) in flat {
        layer.insert(&key, value);
    }
    layer
}

fn flatten_yaml(value: &serde_yaml::Value, prefix: &str, out: &mut HashMap<String, String>) {
    match value {
        serde_yaml::Value::Mapping(map) => {
            for (key, value) in map {
                let Some(key) = key.as_str() else {
                    continue;
                };
                let next = if prefix.is_empty() {
                    key.to_string()
                } else {
                    format!("{prefix}.{key}")
                };
                flatten_yaml(value, &next, out);
            }
        }
        other => {
            if let Some(text) = yaml_scalar_to_string(other) {
                out.insert(prefix.to_string(), text);
            }
        }
    }
}

fn yaml_scalar_to_string(value: &serde_yaml::Value) -> Option<String> {
    match value {
        serde_yaml::Value::Bool(v) => Some(v.to_string()),
        serde_yaml::Value::Number(n) => Some(n.to_string()),
        serde_yaml::Value::String(s) => Some(s.clone()),
        serde_yaml::Value::Null
        | serde_yaml::Value::Sequence(_)
        | serde_yaml::Value::Mapping(_) => None,
        serde_yaml::Value::Tagged(tagged) => yaml_scalar_to_string(&tagged.value),
    }
}
