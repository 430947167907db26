//! # pmoplayer - playback core of the PMOPlayer music widget
//!
//! Holds the playback state (linear and shuffled orders, page view, cursors,
//! flags) and the [`MusicPlayer`] controller that fills it from a
//! [`pmometing::PlaylistSource`].
//!
//! ```no_run
//! use pmoconfig::MusicConfig;
//! use pmometing::{MetingClient, PlaylistSource};
//! use pmoplayer::MusicPlayer;
//! use std::sync::Arc;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = MusicConfig::default();
//!     let client = MetingClient::from_config(&config)?;
//!     let source = PlaylistSource::from_config(Arc::new(client), &config);
//!     let player = MusicPlayer::new(source, config);
//!
//!     player.init().await;
//!     if let Some(song) = player.current_song() {
//!         println!("Ready: {} - {}", song.artist, song.name);
//!     }
//!     Ok(())
//! }
//! ```

pub mod assets;
pub mod logs;
pub mod player;
pub mod state;

pub use assets::{body_snippet, collect_routes, head_snippet, router, AssetRoute};
pub use logs::init_logging;
pub use player::{LoadOutcome, MusicPlayer};
pub use state::{CursorPolicy, PlaybackState, StateSnapshot};
