//! Data models for Meting playlists

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

/// Song identifier
///
/// Not unique: the aggregator may return the same id twice, and ids missing
/// from the remote record are replaced by the position in the list.
pub type SongId = u64;

/// A song in canonical form
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Song {
    pub id: SongId,
    pub name: String,
    pub artist: String,
    pub url: String,
    pub pic_url: String,
}

/// A track record as sent by the aggregator
///
/// Every field is optional. Meting backends disagree on naming (`name` vs
/// `title`, `artist` vs `author`, `pic` vs `cover`), the normalizer resolves
/// that.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawTrack {
    pub id: Option<SongId>,
    pub name: Option<String>,
    pub title: Option<String>,
    pub artist: Option<String>,
    pub author: Option<String>,
    pub url: Option<String>,
    pub pic: Option<String>,
    pub cover: Option<String>,
}

impl RawTrack {
    /// Builds a record from any JSON value
    ///
    /// Non-object values and fields of an unexpected type are read as absent.
    /// Numeric ids may come as numbers or numeric strings.
    pub fn from_json(value: &Value) -> Self {
        let text = |key: &str| value.get(key).and_then(text_field);

        Self {
            id: value.get("id").and_then(id_field),
            name: text("name"),
            title: text("title"),
            artist: text("artist"),
            author: text("author"),
            url: text("url"),
            pic: text("pic"),
            cover: text("cover"),
        }
    }
}

impl From<&Value> for RawTrack {
    fn from(value: &Value) -> Self {
        Self::from_json(value)
    }
}

fn text_field(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn id_field(value: &Value) -> Option<SongId> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Pagination metadata of a [`PlaylistPage`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub page: usize,
    pub page_size: usize,
    pub total: usize,
    pub total_pages: usize,
    pub has_next: bool,
    pub has_prev: bool,
}

/// One page of a playlist, in the shape the widget renders
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaylistPage {
    pub code: u16,
    pub playlist_id: u64,
    pub playlist_name: String,
    pub songs: Vec<Song>,
    pub pagination: Pagination,
}

/// Songs of one page together with their pagination metadata
#[derive(Debug, Clone, PartialEq)]
pub struct PageSlice {
    pub songs: Vec<Song>,
    pub pagination: Pagination,
}

impl PageSlice {
    /// Wraps the slice into a full page response
    pub fn into_page(self, playlist_id: u64, playlist_name: impl Into<String>) -> PlaylistPage {
        PlaylistPage {
            code: 200,
            playlist_id,
            playlist_name: playlist_name.into(),
            songs: self.songs,
            pagination: self.pagination,
        }
    }
}

/// A set of songs with the page count of the collection it was taken from
///
/// `total_pages` describes the *source* collection, not `songs`: a bulk
/// selection of 60 songs out of 150 reports `ceil(150 / page_size)` pages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SongBatch {
    pub songs: Vec<Song>,
    pub total_pages: usize,
}

/// Size and duration of a song file
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SongMetadata {
    pub duration: Duration,
    /// `content-length` of the file, 0 when unknown
    pub size: u64,
}
