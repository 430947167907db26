//! Conversion of aggregator records into [`Song`]s

use crate::models::{RawTrack, Song, SongId};

/// Placeholder used when a record has neither `name` nor `title`
pub const UNKNOWN_TITLE: &str = "Unknown title";

/// Placeholder used when a record has neither `artist` nor `author`
pub const UNKNOWN_ARTIST: &str = "Unknown artist";

/// Maps one record to a song; never fails
///
/// `position` is the record's index in the response, used as `position + 1`
/// when the record carries no id. Empty strings and a zero id count as absent.
pub fn normalize(raw: &RawTrack, position: usize) -> Song {
    Song {
        id: raw
            .id
            .filter(|id| *id != 0)
            .unwrap_or(position as SongId + 1),
        name: first_present(&[&raw.name, &raw.title]).unwrap_or_else(|| UNKNOWN_TITLE.to_string()),
        artist: first_present(&[&raw.artist, &raw.author])
            .unwrap_or_else(|| UNKNOWN_ARTIST.to_string()),
        url: first_present(&[&raw.url]).unwrap_or_default(),
        pic_url: first_present(&[&raw.pic, &raw.cover]).unwrap_or_default(),
    }
}

/// Normalizes a whole response, keeping the order
pub fn normalize_all(raws: &[RawTrack]) -> Vec<Song> {
    raws.iter()
        .enumerate()
        .map(|(position, raw)| normalize(raw, position))
        .collect()
}

fn first_present(candidates: &[&Option<String>]) -> Option<String> {
    candidates
        .iter()
        .filter_map(|c| c.as_deref())
        .find(|s| !s.is_empty())
        .map(str::to_string)
}
