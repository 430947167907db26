//! # pmometing - Meting playlist client for Rust
//!
//! `pmometing` fetches playlists from a Meting aggregator (a service turning a
//! playlist id on a music platform into a flat list of tracks), normalizes the
//! records and derives pages, random selections and preloads from them.
//!
//! ## Features
//!
//! - **Aggregator client**: one GET per playlist with a hard 15 s deadline
//! - **Normalization**: lenient mapping of heterogeneous records to [`Song`]
//! - **Virtual pagination**: pages and preloads sliced locally
//! - **Shuffle**: unbiased Fisher–Yates permutations
//! - **Degraded mode**: failures are replaced by sample songs, never surfaced
//! - **Metadata probe**: song duration with timeout and cancellation
//!
//! ## Quick Start
//!
//! ```no_run
//! use pmometing::{MetingClient, PlaylistSource};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = MetingClient::new()?;
//!     let source = PlaylistSource::new(Arc::new(client), 2619366284);
//!
//!     let page = source.get_playlist(1, 60).await;
//!     if page.is_degraded() {
//!         println!("Aggregator unavailable, showing sample songs");
//!     }
//!     for song in &page.data.songs {
//!         println!("{} - {}", song.artist, song.name);
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod error;
pub mod fallback;
pub mod models;
pub mod normalize;
pub mod paginator;
pub mod probe;
pub mod shuffle;
pub mod source;

pub use client::{ClientBuilder, MetingClient, DEFAULT_API, DEFAULT_REQUEST_TIMEOUT};
pub use error::{Error, ErrorKind, Result};
pub use models::{
    PageSlice, Pagination, PlaylistPage, RawTrack, Song, SongBatch, SongId, SongMetadata,
};
pub use probe::{probe_duration, DurationProbe};
pub use source::{Acquired, PlaylistSource, RetryPolicy, TrackFetcher, LIVE_PLAYLIST_NAME};
