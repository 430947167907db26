//! Acquisition boundary
//!
//! [`PlaylistSource`] is the only entry point the player uses to obtain songs.
//! It never fails: once retries are exhausted, or when the aggregator answers
//! with an empty list, the result is replaced by sample data from
//! [`crate::fallback`] and the reason is reported in [`Acquired::fallback`].

use crate::error::{Error, ErrorKind, Result};
use crate::fallback::{synthetic_bulk, synthetic_page};
use crate::models::{PlaylistPage, Song, SongBatch};
use crate::paginator;
use async_trait::async_trait;
use pmoconfig::MusicConfig;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Name given to playlists fetched from the aggregator
pub const LIVE_PLAYLIST_NAME: &str = "Netease playlist";

/// Anything able to produce the normalized song list of a playlist
#[async_trait]
pub trait TrackFetcher: Send + Sync {
    async fn fetch_songs(&self) -> Result<Vec<Song>>;
}

/// Bounded retry with exponential backoff
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total number of fetches, first one included
    pub attempts: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: pmoconfig::music::DEFAULT_RETRIES,
            initial_backoff: Duration::from_millis(pmoconfig::music::DEFAULT_RETRY_BACKOFF_MS),
            max_backoff: Duration::from_secs(4),
        }
    }
}

impl RetryPolicy {
    /// A single attempt
    pub fn none() -> Self {
        Self {
            attempts: 1,
            ..Self::default()
        }
    }

    pub fn from_config(config: &MusicConfig) -> Self {
        let initial_backoff = config.retry_backoff();
        Self {
            attempts: config.retries.max(1),
            initial_backoff,
            max_backoff: Self::default().max_backoff.max(initial_backoff),
        }
    }

    /// Delay before retry number `retry` (0 for the first retry)
    pub fn backoff(&self, retry: u32) -> Duration {
        let factor = 2u32.saturating_pow(retry);
        self.initial_backoff
            .saturating_mul(factor)
            .min(self.max_backoff)
    }
}

/// Result of an acquisition
///
/// `fallback` is `None` for live data and holds the failure class when `data`
/// comes from the sample set.
#[derive(Debug, Clone, PartialEq)]
pub struct Acquired<T> {
    pub data: T,
    pub fallback: Option<ErrorKind>,
}

impl<T> Acquired<T> {
    pub fn live(data: T) -> Self {
        Self {
            data,
            fallback: None,
        }
    }

    pub fn degraded(data: T, kind: ErrorKind) -> Self {
        Self {
            data,
            fallback: Some(kind),
        }
    }

    /// True when `data` is sample data
    pub fn is_degraded(&self) -> bool {
        self.fallback.is_some()
    }
}

/// Playlist acquisition with retry and degraded mode
#[derive(Clone)]
pub struct PlaylistSource {
    fetcher: Arc<dyn TrackFetcher>,
    playlist_id: u64,
    page_size: usize,
    retry: RetryPolicy,
}

impl std::fmt::Debug for PlaylistSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaylistSource")
            .field("playlist_id", &self.playlist_id)
            .field("page_size", &self.page_size)
            .field("retry", &self.retry)
            .finish_non_exhaustive()
    }
}

impl PlaylistSource {
    pub fn new(fetcher: Arc<dyn TrackFetcher>, playlist_id: u64) -> Self {
        Self {
            fetcher,
            playlist_id,
            page_size: pmoconfig::music::DEFAULT_PAGE_SIZE,
            retry: RetryPolicy::default(),
        }
    }

    /// Source using the configured playlist id, page size and retry settings
    pub fn from_config(fetcher: Arc<dyn TrackFetcher>, config: &MusicConfig) -> Self {
        Self {
            fetcher,
            playlist_id: config.playlist_id(),
            page_size: config.page_size.max(1),
            retry: RetryPolicy::from_config(config),
        }
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn playlist_id(&self) -> u64 {
        self.playlist_id
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn retry(&self) -> RetryPolicy {
        self.retry
    }

    /// Fetches the whole list, retrying transport and format failures
    ///
    /// An empty list is returned as [`Error::EmptyResult`] without retry.
    async fn fetch_with_retry(&self) -> Result<Vec<Song>> {
        let attempts = self.retry.attempts.max(1);
        let mut attempt = 0;

        loop {
            attempt += 1;
            match self.fetcher.fetch_songs().await {
                Ok(songs) if songs.is_empty() => return Err(Error::EmptyResult),
                Ok(songs) => {
                    debug!(attempt, count = songs.len(), "Playlist fetched");
                    return Ok(songs);
                }
                Err(e) if attempt < attempts => {
                    let delay = self.retry.backoff(attempt - 1);
                    warn!(
                        attempt,
                        kind = %e.kind(),
                        error = %e,
                        ?delay,
                        "Playlist fetch failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => {
                    warn!(attempt, kind = %e.kind(), error = %e, "Playlist fetch failed");
                    return Err(e);
                }
            }
        }
    }

    /// One page of the playlist
    ///
    /// Degraded mode answers with a two-song sample page echoing `page` and
    /// `page_size`.
    pub async fn get_playlist(&self, page: usize, page_size: usize) -> Acquired<PlaylistPage> {
        match self.fetch_with_retry().await {
            Ok(all) => {
                let page = paginator::get_page(&all, page, page_size)
                    .into_page(self.playlist_id, LIVE_PLAYLIST_NAME);
                info!(
                    page = page.pagination.page,
                    songs = page.songs.len(),
                    total = page.pagination.total,
                    "Playlist page acquired"
                );
                Acquired::live(page)
            }
            Err(e) => {
                warn!(kind = %e.kind(), page, "Using sample page");
                Acquired::degraded(synthetic_page(page, page_size, self.playlist_id), e.kind())
            }
        }
    }

    /// A random selection of at most `limit` songs
    pub async fn get_all_songs(&self, limit: usize) -> Acquired<SongBatch> {
        match self.fetch_with_retry().await {
            Ok(all) => {
                let batch = paginator::get_bulk_selection(&all, limit, self.page_size);
                info!(
                    songs = batch.songs.len(),
                    total_pages = batch.total_pages,
                    "Bulk selection acquired"
                );
                Acquired::live(batch)
            }
            Err(e) => {
                warn!(kind = %e.kind(), "Using sample bulk selection");
                Acquired::degraded(synthetic_bulk(), e.kind())
            }
        }
    }

    /// The first `pages` pages of the playlist, in order
    pub async fn get_multiple_pages(&self, pages: usize, page_size: usize) -> Acquired<SongBatch> {
        match self.fetch_with_retry().await {
            Ok(all) => {
                let batch = paginator::get_multi_page_preload(&all, pages, page_size);
                info!(
                    pages,
                    songs = batch.songs.len(),
                    total_pages = batch.total_pages,
                    "Pages preloaded"
                );
                Acquired::live(batch)
            }
            Err(e) => {
                warn!(kind = %e.kind(), pages, "Using sample bulk selection");
                Acquired::degraded(synthetic_bulk(), e.kind())
            }
        }
    }

    /// Not supported by Meting playlists: always empty
    ///
    /// ```
    /// # tokio_test::block_on(async {
    /// use pmometing::{MetingClient, PlaylistSource};
    /// use std::sync::Arc;
    ///
    /// let source = PlaylistSource::new(Arc::new(MetingClient::new()?), 2619366284);
    /// assert!(source.search_songs("anything", 1, 20).await.is_empty());
    /// # Ok::<(), pmometing::Error>(())
    /// # }).unwrap();
    /// ```
    pub async fn search_songs(&self, query: &str, page: usize, page_size: usize) -> Vec<Song> {
        debug!(query, page, page_size, "Search is not available");
        Vec::new()
    }

    /// Not supported by Meting playlists: always empty
    pub async fn recommended_songs(&self, count: usize) -> Vec<Song> {
        debug!(count, "Recommendations are not available");
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn songs(n: usize) -> Vec<Song> {
        (0..n)
            .map(|i| Song {
                id: i as u64 + 1,
                name: format!("Song {}", i + 1),
                artist: "Artist".to_string(),
                url: format!("https://example.com/{}.mp3", i + 1),
                pic_url: String::new(),
            })
            .collect()
    }

    fn quick_retry(attempts: u32) -> RetryPolicy {
        RetryPolicy {
            attempts,
            initial_backoff: Duration::from_millis(1),
            max_backoff: Duration::from_millis(2),
        }
    }

    /// Fails `failures` times, then returns `songs`
    struct FlakyFetcher {
        failures: u32,
        songs: Vec<Song>,
        calls: AtomicU32,
    }

    impl FlakyFetcher {
        fn new(failures: u32, songs: Vec<Song>) -> Arc<Self> {
            Arc::new(Self {
                failures,
                songs,
                calls: AtomicU32::new(0),
            })
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl TrackFetcher for FlakyFetcher {
        async fn fetch_songs(&self) -> Result<Vec<Song>> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.failures {
                Err(Error::Http {
                    status: 502,
                    reason: "Bad Gateway".to_string(),
                })
            } else {
                Ok(self.songs.clone())
            }
        }
    }

    #[test]
    fn test_backoff_is_capped() {
        let policy = RetryPolicy {
            attempts: 10,
            initial_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(4),
        };
        assert_eq!(policy.backoff(0), Duration::from_millis(500));
        assert_eq!(policy.backoff(1), Duration::from_secs(1));
        assert_eq!(policy.backoff(3), Duration::from_secs(4));
        assert_eq!(policy.backoff(40), Duration::from_secs(4));
    }

    #[test]
    fn test_retry_from_config() {
        let mut config = MusicConfig::default();
        config.retries = 5;
        config.retry_backoff_ms = 100;
        let policy = RetryPolicy::from_config(&config);
        assert_eq!(policy.attempts, 5);
        assert_eq!(policy.initial_backoff, Duration::from_millis(100));
    }

    #[tokio::test]
    async fn test_live_page() {
        let fetcher = FlakyFetcher::new(0, songs(150));
        let source = PlaylistSource::new(fetcher.clone(), 7).with_retry(quick_retry(3));

        let acquired = source.get_playlist(2, 60).await;
        assert!(!acquired.is_degraded());
        assert_eq!(acquired.data.playlist_name, LIVE_PLAYLIST_NAME);
        assert_eq!(acquired.data.playlist_id, 7);
        assert_eq!(acquired.data.songs.len(), 60);
        assert_eq!(acquired.data.songs[0].id, 61);
        assert_eq!(fetcher.calls(), 1);
    }

    #[tokio::test]
    async fn test_retry_then_success() {
        let fetcher = FlakyFetcher::new(2, songs(10));
        let source = PlaylistSource::new(fetcher.clone(), 1).with_retry(quick_retry(3));

        let acquired = source.get_multiple_pages(1, 5).await;
        assert!(!acquired.is_degraded());
        assert_eq!(acquired.data.songs.len(), 5);
        assert_eq!(acquired.data.total_pages, 2);
        assert_eq!(fetcher.calls(), 3);
    }

    #[tokio::test]
    async fn test_exhausted_retries_fall_back() {
        let fetcher = FlakyFetcher::new(u32::MAX, songs(10));
        let source = PlaylistSource::new(fetcher.clone(), 1).with_retry(quick_retry(3));

        let acquired = source.get_playlist(1, 60).await;
        assert_eq!(acquired.fallback, Some(ErrorKind::Http));
        assert_eq!(acquired.data.songs.len(), 2);
        assert_eq!(acquired.data.pagination.total_pages, 1);
        assert_eq!(fetcher.calls(), 3);
    }

    #[tokio::test]
    async fn test_empty_result_is_not_retried() {
        let fetcher = FlakyFetcher::new(0, Vec::new());
        let source = PlaylistSource::new(fetcher.clone(), 1).with_retry(quick_retry(3));

        let acquired = source.get_all_songs(60).await;
        assert_eq!(acquired.fallback, Some(ErrorKind::EmptyResult));
        assert_eq!(acquired.data.songs.len(), 100);
        assert_eq!(acquired.data.total_pages, 5);
        assert_eq!(fetcher.calls(), 1);
    }

    #[tokio::test]
    async fn test_bulk_selection_keeps_source_page_count() {
        let fetcher = FlakyFetcher::new(0, songs(150));
        let source = PlaylistSource::new(fetcher, 1).with_page_size(60);

        let acquired = source.get_all_songs(60).await;
        assert_eq!(acquired.data.songs.len(), 60);
        assert_eq!(acquired.data.total_pages, 3);
    }

    #[tokio::test]
    async fn test_stubs_are_empty() {
        let source = PlaylistSource::new(FlakyFetcher::new(0, songs(3)), 1);
        assert!(source.search_songs("hello", 1, 20).await.is_empty());
        assert!(source.recommended_songs(10).await.is_empty());
    }
}
