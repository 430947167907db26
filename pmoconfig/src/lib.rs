//! # PMOPlayer Configuration Module
//!
//! This module provides configuration management for the PMOPlayer widget:
//! - Loading configuration from YAML files
//! - Merging with embedded default configuration
//! - Environment variable overrides
//! - Parsing the configuration object injected by the host page
//!
//! There is no global instance: the loaded [`MusicConfig`] is a plain value
//! handed to whoever needs it.
//!
//! ## Usage
//!
//! ```no_run
//! use pmoconfig::Config;
//!
//! let config = Config::load_config("")?;
//! let music = config.music()?;
//! println!("page size: {}", music.page_size);
//! # Ok::<(), anyhow::Error>(())
//! ```

use anyhow::{anyhow, Result};
use dirs::home_dir;
use serde_yaml::{Mapping, Value};
use std::{
    env, fs,
    path::{Path, PathBuf},
};
use tracing::{debug, info};

pub mod music;

pub use music::{AssetsConfig, Layout, LoggerConfig, MetingConfig, MusicConfig};

// Configuration par défaut intégrée
const DEFAULT_CONFIG: &str = include_str!("pmoplayer.yaml");

const CONFIG_FILE_NAME: &str = "config.yaml";
const DEFAULT_CONFIG_DIR: &str = ".pmoplayer";

pub const ENV_CONFIG_DIR: &str = "PMOPLAYER_CONFIG";
pub const ENV_PREFIX: &str = "PMOPLAYER_CONFIG__";

/// Configuration loader for PMOPlayer
///
/// Holds the merged YAML tree (defaults, then `config.yaml`, then environment
/// overrides) and the location it was read from.
#[derive(Debug, Clone)]
pub struct Config {
    config_dir: PathBuf,
    path: PathBuf,
    data: Value,
}

impl Config {
    /// Finds a config directory by trying different locations in order
    fn find_config_dir(directory: &str) -> PathBuf {
        // 1. Try provided directory
        if !directory.is_empty() {
            return PathBuf::from(directory);
        }

        // 2. Try environment variable
        if let Ok(env_path) = env::var(ENV_CONFIG_DIR) {
            info!(env_var = ENV_CONFIG_DIR, path = %env_path, "Trying to load config from env");
            return PathBuf::from(env_path);
        }

        // 3. Try current directory
        if Path::new(DEFAULT_CONFIG_DIR).exists() {
            return PathBuf::from(DEFAULT_CONFIG_DIR);
        }

        // 4. Try home directory
        if let Some(home) = home_dir() {
            let home_config = home.join(DEFAULT_CONFIG_DIR);
            if home_config.exists() {
                return home_config;
            }
        }

        PathBuf::from(DEFAULT_CONFIG_DIR)
    }

    /// Loads the configuration
    ///
    /// This method:
    /// 1. Determines the configuration directory
    /// 2. Loads the default embedded configuration
    /// 3. Merges it with the external config.yaml file if present
    /// 4. Applies `PMOPLAYER_CONFIG__*` environment variable overrides
    ///
    /// The directory is searched in the following order:
    /// 1. The provided `directory` parameter if not empty
    /// 2. The `PMOPLAYER_CONFIG` environment variable
    /// 3. `.pmoplayer` in the current directory
    /// 4. `.pmoplayer` in the user's home directory
    pub fn load_config(directory: &str) -> Result<Self> {
        let mut config = Self::load_without_env(directory)?;
        Self::apply_overrides(&mut config.data, env::vars());
        Ok(config)
    }

    fn load_without_env(directory: &str) -> Result<Self> {
        let config_dir = Self::find_config_dir(directory);
        info!(config_dir = %config_dir.display(), "Using config directory");

        let path = config_dir.join(CONFIG_FILE_NAME);
        let mut data: Value = serde_yaml::from_str(DEFAULT_CONFIG)?;

        match fs::read(&path) {
            Ok(bytes) => {
                info!(config_file = %path.display(), "Loaded config file");
                let external: Value = serde_yaml::from_slice(&bytes)
                    .map_err(|e| anyhow!("Invalid {}: {}", path.display(), e))?;
                merge_yaml(&mut data, &external);
            }
            Err(_) => {
                info!(config_file = %path.display(), "Config file not found, using default embedded config");
            }
        }

        Ok(Self {
            config_dir,
            path,
            data,
        })
    }

    /// Directory the configuration was resolved from
    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    /// Path of the `config.yaml` file (which may not exist)
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Typed, validated widget configuration
    pub fn music(&self) -> Result<MusicConfig> {
        let music: MusicConfig = serde_yaml::from_value(self.data.clone())?;
        music.validate()
    }

    /// Gets a configuration value at the specified path
    ///
    /// Keys are matched case-insensitively, e.g. `&["metingapi", "id"]`.
    pub fn get_value(&self, path: &[&str]) -> Result<Value> {
        let mut current = &self.data;
        for (i, key) in path.iter().enumerate() {
            let Value::Mapping(map) = current else {
                return Err(anyhow!("Path {} is not a mapping", path[..i].join(".")));
            };
            current = find_key(map, key)
                .and_then(|k| map.get(&k))
                .ok_or_else(|| anyhow!("Path {} does not exist", path[..=i].join(".")))?;
        }
        Ok(current.clone())
    }

    fn apply_overrides<I>(config: &mut Value, vars: I)
    where
        I: IntoIterator<Item = (String, String)>,
    {
        for (key, value) in vars {
            let Some(suffix) = key.strip_prefix(ENV_PREFIX) else {
                continue;
            };
            let key_path = suffix.split("__").collect::<Vec<_>>();
            debug!(key = %key, "Applying environment override");
            let _ = set_value_internal(config, &key_path, convert_env_value(&value));
        }
    }
}

/// Finds the existing key matching `key` regardless of case
fn find_key(map: &Mapping, key: &str) -> Option<Value> {
    map.keys()
        .find(|k| matches!(k, Value::String(s) if s.eq_ignore_ascii_case(key)))
        .cloned()
}

fn set_value_internal(data: &mut Value, path: &[&str], value: Value) -> Result<()> {
    if path.is_empty() {
        *data = value;
        return Ok(());
    }
    if let Value::Mapping(map) = data {
        let key = find_key(map, path[0]).unwrap_or_else(|| Value::String(path[0].to_lowercase()));
        if path.len() == 1 {
            map.insert(key, value);
        } else {
            let entry = map.entry(key).or_insert(Value::Mapping(Mapping::new()));
            set_value_internal(entry, &path[1..], value)?;
        }
        Ok(())
    } else {
        Err(anyhow!("Current node is not a map"))
    }
}

fn convert_env_value(value: &str) -> Value {
    if let Ok(parsed) = serde_yaml::from_str::<Value>(value) {
        return parsed;
    }
    Value::String(value.to_string())
}

/// Merges external YAML configuration into default configuration
///
/// Mappings are merged key by key; scalars and sequences from `external`
/// replace the default value.
fn merge_yaml(default: &mut Value, external: &Value) {
    match (default, external) {
        (Value::Mapping(dmap), Value::Mapping(emap)) => {
            for (k, v) in emap {
                match dmap.get_mut(k) {
                    Some(dv) => merge_yaml(dv, v),
                    None => {
                        dmap.insert(k.clone(), v.clone());
                    }
                }
            }
        }
        (d, e) => *d = e.clone(),
    }
}
