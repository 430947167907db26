//! Player controller
//!
//! [`MusicPlayer`] owns the [`PlaybackState`] and runs acquisition cycles
//! against a [`PlaylistSource`]. At most one cycle is in flight per player,
//! and a cycle abandoned by [`MusicPlayer::reset`] never touches the state.

use crate::state::{CursorPolicy, PlaybackState, StateSnapshot};
use parking_lot::Mutex;
use pmoconfig::MusicConfig;
use pmometing::{ErrorKind, PlaylistSource, Song};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// How a page request was served
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Sliced from the songs already loaded
    Local,
    /// A cycle completed and rebuilt the lists; `fallback` is set when the
    /// lists hold sample songs
    Acquired { fallback: Option<ErrorKind> },
    /// No such page
    OutOfRange,
    /// Another cycle is in flight; nothing was fetched
    Busy,
    /// The result arrived after a reset and was discarded
    Superseded,
    /// The cycle was cancelled by a reset
    Cancelled,
}

struct Inner {
    state: PlaybackState,
    generation: u64,
    cancel: CancellationToken,
}

/// Clears the loading flag however the cycle ends, unless a reset already
/// took over
struct LoadingGuard<'a> {
    inner: &'a Mutex<Inner>,
    generation: u64,
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        let mut inner = self.inner.lock();
        if inner.generation == self.generation {
            inner.state.set_loading(false);
        }
    }
}

pub struct MusicPlayer {
    source: PlaylistSource,
    config: MusicConfig,
    inner: Mutex<Inner>,
}

impl std::fmt::Debug for MusicPlayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MusicPlayer")
            .field("source", &self.source)
            .finish_non_exhaustive()
    }
}

impl MusicPlayer {
    pub fn new(source: PlaylistSource, config: MusicConfig) -> Self {
        let state = PlaybackState::new(config.page_size, config.default_volume);
        Self {
            source,
            config,
            inner: Mutex::new(Inner {
                state,
                generation: 0,
                cancel: CancellationToken::new(),
            }),
        }
    }

    pub fn config(&self) -> &MusicConfig {
        &self.config
    }

    /// Applies the configured toggles, then loads the preload pages
    pub async fn init(&self) -> LoadOutcome {
        {
            let mut inner = self.inner.lock();
            inner.state.set_shuffle(self.config.enable_shuffle);
            inner.state.set_repeat(self.config.enable_repeat);
            inner.state.set_volume(self.config.default_volume);
        }
        self.refresh().await
    }

    /// Reloads the preload pages and resets the cursors
    pub async fn refresh(&self) -> LoadOutcome {
        self.run_cycle(self.config.preload_page_count(), CursorPolicy::Reset, None)
            .await
    }

    /// Shows `page`, fetching more pages when it lies beyond the loaded songs
    pub async fn load_page(&self, page: usize) -> LoadOutcome {
        {
            let mut inner = self.inner.lock();
            let total_pages = inner.state.total_pages();
            if page == 0 || page > total_pages {
                debug!(page, total_pages, "Page out of range");
                return LoadOutcome::OutOfRange;
            }
            if inner.state.covers_page(page) {
                inner.state.show_page(page);
                return LoadOutcome::Local;
            }
        }
        self.run_cycle(page, CursorPolicy::Preserve, Some(page)).await
    }

    /// Abandons the in-flight cycle, if any, and empties the playlist
    pub fn reset(&self) {
        let mut inner = self.inner.lock();
        inner.generation += 1;
        inner.cancel.cancel();
        inner.cancel = CancellationToken::new();
        inner.state.set_loading(false);
        inner.state.clear();
        debug!(generation = inner.generation, "Player reset");
    }

    async fn run_cycle(
        &self,
        pages: usize,
        policy: CursorPolicy,
        show: Option<usize>,
    ) -> LoadOutcome {
        let (generation, cancel) = {
            let mut inner = self.inner.lock();
            if inner.state.is_loading() {
                debug!(pages, "Acquisition already in flight");
                return LoadOutcome::Busy;
            }
            inner.state.set_loading(true);
            (inner.generation, inner.cancel.clone())
        };
        let _guard = LoadingGuard {
            inner: &self.inner,
            generation,
        };

        let acquired = tokio::select! {
            acquired = self.source.get_multiple_pages(pages, self.config.page_size) => acquired,
            _ = cancel.cancelled() => {
                info!(generation, "Acquisition cancelled");
                return LoadOutcome::Cancelled;
            }
        };

        let mut inner = self.inner.lock();
        if inner.generation != generation {
            debug!(generation, current = inner.generation, "Discarding stale acquisition");
            return LoadOutcome::Superseded;
        }

        if let Some(kind) = acquired.fallback {
            warn!(%kind, "Playing sample songs");
        }
        let count = acquired.data.songs.len();
        inner
            .state
            .rebuild(acquired.data.songs, acquired.data.total_pages, policy);
        if let Some(page) = show {
            inner.state.show_page(page);
        }
        inner.state.set_loading(false);
        info!(
            songs = count,
            total_pages = inner.state.total_pages(),
            page = inner.state.current_page(),
            "Playlist loaded"
        );

        LoadOutcome::Acquired {
            fallback: acquired.fallback,
        }
    }

    pub fn next(&self) -> Option<Song> {
        let mut inner = self.inner.lock();
        let song = inner.state.next().cloned();
        if song.is_none() {
            inner.state.set_playing(false);
        }
        song
    }

    pub fn prev(&self) -> Option<Song> {
        let mut inner = self.inner.lock();
        let song = inner.state.prev().cloned();
        if song.is_none() {
            inner.state.set_playing(false);
        }
        song
    }

    pub fn toggle_shuffle(&self) -> bool {
        self.inner.lock().state.toggle_shuffle()
    }

    pub fn toggle_repeat(&self) -> bool {
        self.inner.lock().state.toggle_repeat()
    }

    pub fn current_song(&self) -> Option<Song> {
        self.inner.lock().state.current_song().cloned()
    }

    pub fn snapshot(&self) -> StateSnapshot {
        self.inner.lock().state.snapshot()
    }

    /// Runs `f` on the state under the lock
    ///
    /// `f` must not block: the lock is shared with the acquisition cycle.
    pub fn with_state<R>(&self, f: impl FnOnce(&mut PlaybackState) -> R) -> R {
        f(&mut self.inner.lock().state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use pmometing::{RetryPolicy, TrackFetcher};
    use std::sync::Arc;
    use tokio::sync::Notify;

    fn songs(n: usize) -> Vec<Song> {
        (0..n)
            .map(|i| Song {
                id: i as u64 + 1,
                name: format!("Song {}", i + 1),
                artist: "Artist".to_string(),
                url: String::new(),
                pic_url: String::new(),
            })
            .collect()
    }

    /// Blocks every fetch until released
    struct GatedFetcher {
        started: Notify,
        release: Notify,
        songs: Vec<Song>,
    }

    #[async_trait]
    impl TrackFetcher for GatedFetcher {
        async fn fetch_songs(&self) -> pmometing::Result<Vec<Song>> {
            self.started.notify_one();
            self.release.notified().await;
            Ok(self.songs.clone())
        }
    }

    #[tokio::test]
    async fn test_stale_result_is_discarded() {
        let fetcher = Arc::new(GatedFetcher {
            started: Notify::new(),
            release: Notify::new(),
            songs: songs(10),
        });
        let source = PlaylistSource::new(fetcher.clone(), 1).with_retry(RetryPolicy::none());
        let player = Arc::new(MusicPlayer::new(source, MusicConfig::default()));

        let task = tokio::spawn({
            let player = player.clone();
            async move { player.refresh().await }
        });
        fetcher.started.notified().await;

        // generation moves on without cancelling the fetch
        player.inner.lock().generation += 1;
        fetcher.release.notify_one();

        assert_eq!(task.await.unwrap(), LoadOutcome::Superseded);
        assert!(player.snapshot().full_playlist.is_empty());
    }
}
