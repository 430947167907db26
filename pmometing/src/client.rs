//! HTTP client for Meting-compatible playlist aggregators
//!
//! A Meting API turns a playlist identifier on a music platform into a flat
//! JSON array of tracks:
//!
//! ```text
//! GET https://api.injahow.cn/meting/?server=netease&type=playlist&id=2619366284
//! [{"name": "...", "artist": "...", "url": "...", "pic": "...", "lrc": "..."}, ...]
//! ```
//!
//! # Example
//!
//! ```no_run
//! use pmometing::MetingClient;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = MetingClient::builder()
//!         .server("netease")
//!         .id("2619366284")
//!         .build()?;
//!
//!     let songs = client.fetch_songs().await?;
//!     println!("{} songs", songs.len());
//!     Ok(())
//! }
//! ```

use crate::error::{Error, Result};
use crate::models::{RawTrack, Song, SongMetadata};
use crate::normalize::normalize_all;
use crate::probe::{probe_duration, DurationProbe};
use crate::source::TrackFetcher;
use async_trait::async_trait;
use pmoconfig::MusicConfig;
use reqwest::header::{ACCEPT, CONTENT_LENGTH};
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use url::Url;

/// Default Meting API base URL
pub const DEFAULT_API: &str = pmoconfig::music::DEFAULT_METING_API;

/// Hard deadline of a playlist request (15 seconds)
pub const DEFAULT_REQUEST_TIMEOUT: Duration =
    Duration::from_millis(pmoconfig::music::DEFAULT_REQUEST_TIMEOUT_MS);

/// Default User-Agent
pub const DEFAULT_USER_AGENT: &str = "pmometing/0.1.0";

/// Meting HTTP client
///
/// A plain value built from configuration: share it by cloning (the
/// underlying connection pool is reference counted) or behind an `Arc`.
#[derive(Debug, Clone)]
pub struct MetingClient {
    pub(crate) client: Client,
    api: String,
    server: String,
    kind: String,
    id: String,
    timeout: Duration,
}

impl MetingClient {
    /// Create a new client with default settings
    pub fn new() -> Result<Self> {
        Self::builder().build()
    }

    /// Create a builder for configuring the client
    pub fn builder() -> ClientBuilder {
        ClientBuilder::default()
    }

    /// Create a client from the widget configuration
    pub fn from_config(config: &MusicConfig) -> Result<Self> {
        Self::builder()
            .api(&config.meting_api.api)
            .server(&config.meting_api.server)
            .kind(&config.meting_api.kind)
            .id(&config.meting_api.id)
            .timeout(config.request_timeout())
            .build()
    }

    /// Create a client with a custom reqwest::Client
    ///
    /// Useful for sharing HTTP connection pools or custom proxy settings.
    /// Query selectors keep their defaults.
    pub fn with_client(client: Client) -> Self {
        let defaults = pmoconfig::MetingConfig::default();
        Self {
            client,
            api: defaults.api,
            server: defaults.server,
            kind: defaults.kind,
            id: defaults.id,
            timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// Get the API base URL
    pub fn api(&self) -> &str {
        &self.api
    }

    /// Get the request deadline
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Get the internal HTTP client
    pub fn http_client(&self) -> &Client {
        &self.client
    }

    /// URL of the playlist request: `<api>?server=..&type=..&id=..`
    pub fn playlist_url(&self) -> Result<Url> {
        let mut url = Url::parse(&self.api)?;
        url.query_pairs_mut()
            .append_pair("server", &self.server)
            .append_pair("type", &self.kind)
            .append_pair("id", &self.id);
        Ok(url)
    }

    // ========================================================================
    // Playlist
    // ========================================================================

    /// Fetches the raw track records of the configured playlist
    ///
    /// The whole exchange (connection, headers and body) must complete within
    /// the client's deadline; on expiry the request is dropped, which aborts
    /// the connection, and [`Error::Timeout`] is returned.
    pub async fn fetch_all(&self) -> Result<Vec<RawTrack>> {
        let url = self.playlist_url()?;
        debug!(%url, "Calling Meting API");

        match tokio::time::timeout(self.timeout, self.request_tracks(url)).await {
            Ok(result) => result,
            Err(_) => Err(Error::Timeout(self.timeout)),
        }
    }

    async fn request_tracks(&self, url: Url) -> Result<Vec<RawTrack>> {
        let response = self
            .client
            .get(url)
            .header(ACCEPT, "application/json")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Http {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or_default().to_string(),
            });
        }

        let body = response.text().await?;
        let value: Value = serde_json::from_str(&body)
            .map_err(|e| Error::format(format!("body is not JSON: {}", e)))?;

        match value {
            Value::Array(items) => {
                debug!(count = items.len(), "Received Meting records");
                Ok(items.iter().map(RawTrack::from_json).collect())
            }
            other => Err(Error::format(format!(
                "expected an array of tracks, got {}",
                json_type_name(&other)
            ))),
        }
    }

    /// Fetches and normalizes the configured playlist
    pub async fn fetch_songs(&self) -> Result<Vec<Song>> {
        let raws = self.fetch_all().await?;
        Ok(normalize_all(&raws))
    }

    // ========================================================================
    // Song files
    // ========================================================================

    /// Checks that a song URL answers a HEAD request with a 2xx status
    pub async fn validate_song_url(&self, url: &str) -> bool {
        match self.client.head(url).timeout(self.timeout).send().await {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                debug!(url, error = %e, "Song URL is not reachable");
                false
            }
        }
    }

    /// Size and duration of a song file
    ///
    /// The size comes from a HEAD request (`content-length`, 0 when absent),
    /// the duration from `probe`, bounded by `timeout` and `cancel`.
    ///
    /// Returns `Ok(None)` when the HEAD request fails or the probe reports an
    /// error, and an error when the probe times out or is cancelled.
    pub async fn song_metadata(
        &self,
        url: &str,
        probe: &dyn DurationProbe,
        timeout: Duration,
        cancel: &CancellationToken,
    ) -> Result<Option<SongMetadata>> {
        let response = match self.client.head(url).timeout(self.timeout).send().await {
            Ok(response) if response.status().is_success() => response,
            Ok(response) => {
                debug!(url, status = %response.status(), "HEAD request rejected");
                return Ok(None);
            }
            Err(e) => {
                debug!(url, error = %e, "HEAD request failed");
                return Ok(None);
            }
        };

        let size = response
            .headers()
            .get(CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(0);

        match probe_duration(probe, url, timeout, cancel).await {
            Ok(duration) => {
                info!(url, size, ?duration, "Song metadata probed");
                Ok(Some(SongMetadata { duration, size }))
            }
            Err(Error::Probe(reason)) => {
                debug!(url, %reason, "Playback element reported an error");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }
}

#[async_trait]
impl TrackFetcher for MetingClient {
    async fn fetch_songs(&self) -> Result<Vec<Song>> {
        MetingClient::fetch_songs(self).await
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Builder for configuring a MetingClient
#[derive(Debug)]
pub struct ClientBuilder {
    client: Option<Client>,
    api: String,
    server: String,
    kind: String,
    id: String,
    timeout: Duration,
    user_agent: String,
    proxy: Option<String>,
}

impl Default for ClientBuilder {
    fn default() -> Self {
        let defaults = pmoconfig::MetingConfig::default();
        Self {
            client: None,
            api: defaults.api,
            server: defaults.server,
            kind: defaults.kind,
            id: defaults.id,
            timeout: DEFAULT_REQUEST_TIMEOUT,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            proxy: None,
        }
    }
}

impl ClientBuilder {
    /// Create a new builder with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a custom HTTP client
    pub fn client(mut self, client: Client) -> Self {
        self.client = Some(client);
        self
    }

    /// Set the aggregator base URL
    pub fn api(mut self, api: impl Into<String>) -> Self {
        self.api = api.into();
        self
    }

    /// Set the music platform (`server` query parameter)
    pub fn server(mut self, server: impl Into<String>) -> Self {
        self.server = server.into();
        self
    }

    /// Set the resource type (`type` query parameter)
    pub fn kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = kind.into();
        self
    }

    /// Set the resource identifier (`id` query parameter)
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// Set the request deadline
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set a custom User-Agent header
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Set a proxy URL
    pub fn proxy(mut self, proxy: impl Into<String>) -> Self {
        self.proxy = Some(proxy.into());
        self
    }

    /// Build the client
    ///
    /// Fails if the API URL or the proxy URL cannot be parsed.
    pub fn build(self) -> Result<MetingClient> {
        Url::parse(&self.api)?;

        let client = if let Some(client) = self.client {
            client
        } else {
            let mut builder = Client::builder().user_agent(&self.user_agent);

            if let Some(proxy_url) = &self.proxy {
                builder = builder.proxy(reqwest::Proxy::all(proxy_url)?);
            }

            builder.build()?
        };

        Ok(MetingClient {
            client,
            api: self.api,
            server: self.server,
            kind: self.kind,
            id: self.id,
            timeout: self.timeout,
        })
    }
}
