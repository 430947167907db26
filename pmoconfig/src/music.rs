//! Typed widget configuration
//!
//! The field names follow the object the host page injects
//! (`window.HEXO_MUSIC_CONFIG`), so the same structure deserialises from the
//! embedded YAML defaults, from a `config.yaml` file and from the host JSON.

use anyhow::{anyhow, bail, Result};
use serde::{Deserialize, Deserializer, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::warn;

/// Default Meting aggregator endpoint
pub const DEFAULT_METING_API: &str = "https://api.injahow.cn/meting/";
pub const DEFAULT_METING_SERVER: &str = "netease";
pub const DEFAULT_METING_TYPE: &str = "playlist";
pub const DEFAULT_METING_ID: &str = "2619366284";

/// Numeric playlist id used when `metingApi.id` is not a number
pub const DEFAULT_PLAYLIST_ID: u64 = 2_619_366_284;

pub const DEFAULT_PAGE_SIZE: usize = 60;
pub const DEFAULT_PRELOAD_PAGES: usize = 10;
pub const DEFAULT_VOLUME: f32 = 0.7;

/// Hard deadline of the aggregator request (15 seconds)
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 15_000;
pub const DEFAULT_RETRIES: u32 = 3;
pub const DEFAULT_RETRY_BACKOFF_MS: u64 = 500;

/// Query selectors identifying the remote playlist
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetingConfig {
    /// Aggregator base URL
    pub api: String,
    /// Music platform (`netease`, `tencent`, ...)
    pub server: String,
    /// Resource type (`playlist`, `song`, ...)
    #[serde(rename = "type")]
    pub kind: String,
    /// Resource identifier; hosts send it either as a string or as a number
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
}

impl Default for MetingConfig {
    fn default() -> Self {
        Self {
            api: DEFAULT_METING_API.to_string(),
            server: DEFAULT_METING_SERVER.to_string(),
            kind: DEFAULT_METING_TYPE.to_string(),
            id: DEFAULT_METING_ID.to_string(),
        }
    }
}

/// Side of the page the widget docks to (presentation only)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Layout {
    Left,
    #[default]
    Right,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoggerConfig {
    pub min_level: String,
    pub enable_console: bool,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            min_level: "info".to_string(),
            enable_console: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AssetsConfig {
    /// Directory holding the built `.js` / `.css` artifacts
    pub dist_dir: PathBuf,
}

impl Default for AssetsConfig {
    fn default() -> Self {
        Self {
            dist_dir: PathBuf::from("dist"),
        }
    }
}

/// Complete widget configuration
///
/// Only `meting_api`, the paging fields, the feature toggles and the network
/// tuning fields affect playlist acquisition. The presentation fields
/// (`border_radius`, widths, `layout`) are carried through for the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MusicConfig {
    pub meting_api: MetingConfig,
    pub page_size: usize,
    pub enable_keyboard_shortcuts: bool,
    pub enable_auto_play: bool,
    pub enable_shuffle: bool,
    pub enable_repeat: bool,
    pub default_volume: f32,
    pub preload_pages: usize,
    pub border_radius: String,
    pub mini_width: u32,
    pub expanded_width: u32,
    pub expanded_height: u32,
    pub layout: Layout,
    pub request_timeout_ms: u64,
    /// Total number of fetch attempts before falling back to sample data
    pub retries: u32,
    pub retry_backoff_ms: u64,
    pub logger: LoggerConfig,
    pub assets: AssetsConfig,
}

impl Default for MusicConfig {
    fn default() -> Self {
        Self {
            meting_api: MetingConfig::default(),
            page_size: DEFAULT_PAGE_SIZE,
            enable_keyboard_shortcuts: true,
            enable_auto_play: false,
            enable_shuffle: true,
            enable_repeat: false,
            default_volume: DEFAULT_VOLUME,
            preload_pages: DEFAULT_PRELOAD_PAGES,
            border_radius: "16px".to_string(),
            mini_width: 280,
            expanded_width: 360,
            expanded_height: 600,
            layout: Layout::Right,
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
            retries: DEFAULT_RETRIES,
            retry_backoff_ms: DEFAULT_RETRY_BACKOFF_MS,
            logger: LoggerConfig::default(),
            assets: AssetsConfig::default(),
        }
    }
}

impl MusicConfig {
    /// Parses the JSON object injected by the host page
    ///
    /// Missing fields take their default value; unknown fields (such as the
    /// host's own `enable` switch) are ignored.
    pub fn from_host_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| anyhow!("Invalid host music configuration: {}", e))?;
        config.validate()
    }

    /// Checks the values the playlist core depends on
    ///
    /// `pageSize` and `retries` must be at least 1 and `metingApi.api` must be
    /// an absolute URL. `preloadPages: 0` means the default page count and an
    /// out-of-range volume is clamped into `[0.0, 1.0]`.
    pub fn validate(mut self) -> Result<Self> {
        if self.page_size == 0 {
            bail!("pageSize must be at least 1");
        }
        if self.retries == 0 {
            bail!("retries must be at least 1");
        }
        url::Url::parse(&self.meting_api.api)
            .map_err(|e| anyhow!("Invalid metingApi.api '{}': {}", self.meting_api.api, e))?;

        if self.preload_pages == 0 {
            warn!("preloadPages is 0, using {}", DEFAULT_PRELOAD_PAGES);
            self.preload_pages = DEFAULT_PRELOAD_PAGES;
        }
        if !self.default_volume.is_finite() {
            warn!(volume = %self.default_volume, "defaultVolume is not a number, using default");
            self.default_volume = DEFAULT_VOLUME;
        } else if !(0.0..=1.0).contains(&self.default_volume) {
            warn!(volume = %self.default_volume, "defaultVolume out of range, clamping");
            self.default_volume = self.default_volume.clamp(0.0, 1.0);
        }

        Ok(self)
    }

    /// Numeric playlist id, falling back to [`DEFAULT_PLAYLIST_ID`]
    pub fn playlist_id(&self) -> u64 {
        self.meting_api
            .id
            .trim()
            .parse()
            .ok()
            .filter(|id| *id != 0)
            .unwrap_or(DEFAULT_PLAYLIST_ID)
    }

    /// Number of pages loaded up front; 0 stands for [`DEFAULT_PRELOAD_PAGES`]
    pub fn preload_page_count(&self) -> usize {
        match self.preload_pages {
            0 => DEFAULT_PRELOAD_PAGES,
            n => n,
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }
}

fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Unsigned(u64),
        Signed(i64),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(s) => s,
        Raw::Unsigned(n) => n.to_string(),
        Raw::Signed(n) => n.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = MusicConfig::default();
        assert_eq!(config.page_size, 60);
        assert_eq!(config.preload_pages, 10);
        assert!(config.enable_shuffle);
        assert!(!config.enable_repeat);
        assert_eq!(config.request_timeout(), Duration::from_secs(15));
        assert_eq!(config.meting_api.server, "netease");
        assert_eq!(config.playlist_id(), DEFAULT_PLAYLIST_ID);
    }

    #[test]
    fn test_host_json_partial() {
        let json = r#"{
            "enable": true,
            "metingApi": { "server": "tencent", "id": 12345 },
            "pageSize": 20,
            "enableRepeat": true,
            "layout": "left"
        }"#;
        let config = MusicConfig::from_host_json(json).unwrap();

        assert_eq!(config.meting_api.server, "tencent");
        assert_eq!(config.meting_api.id, "12345");
        assert_eq!(config.meting_api.api, DEFAULT_METING_API);
        assert_eq!(config.meting_api.kind, "playlist");
        assert_eq!(config.page_size, 20);
        assert!(config.enable_repeat);
        assert_eq!(config.layout, Layout::Left);
        assert_eq!(config.playlist_id(), 12345);
    }

    #[test]
    fn test_validate_rejects_zero_page_size() {
        let config = MusicConfig {
            page_size: 0,
            ..MusicConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_preload_pages_means_default() {
        let config = MusicConfig {
            preload_pages: 0,
            ..MusicConfig::default()
        };
        assert_eq!(config.preload_page_count(), DEFAULT_PRELOAD_PAGES);

        let config = MusicConfig::from_host_json(r#"{ "preloadPages": 0 }"#).unwrap();
        assert_eq!(config.preload_pages, DEFAULT_PRELOAD_PAGES);

        let config = MusicConfig::from_host_json(r#"{ "preloadPages": 2 }"#).unwrap();
        assert_eq!(config.preload_page_count(), 2);
    }

    #[test]
    fn test_validate_rejects_relative_api() {
        let mut config = MusicConfig::default();
        config.meting_api.api = "meting/".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_clamps_volume() {
        let config = MusicConfig {
            default_volume: 1.8,
            ..MusicConfig::default()
        };
        assert_eq!(config.validate().unwrap().default_volume, 1.0);

        let config = MusicConfig {
            default_volume: f32::NAN,
            ..MusicConfig::default()
        };
        assert_eq!(config.validate().unwrap().default_volume, DEFAULT_VOLUME);
    }

    #[test]
    fn test_non_numeric_playlist_id() {
        let mut config = MusicConfig::default();
        config.meting_api.id = "abc".to_string();
        assert_eq!(config.playlist_id(), DEFAULT_PLAYLIST_ID);
    }
}
