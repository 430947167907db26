//! Sample data used in degraded mode
//!
//! When the aggregator fails or returns nothing, the widget keeps working
//! with these synthetic songs instead of showing an error.

use crate::models::{Pagination, PlaylistPage, Song, SongBatch};
use rand::Rng;

/// Audio file every sample song points to
pub const SAMPLE_AUDIO_URL: &str = "https://www.soundjay.com/misc/sounds/bell-ringing-05.wav";

/// Name of the playlist returned by [`synthetic_page`]
pub const SAMPLE_PLAYLIST_NAME: &str = "Sample playlist";

/// Number of songs in [`synthetic_bulk`]
pub const SAMPLE_BULK_SIZE: u64 = 100;

/// Page count reported by [`synthetic_bulk`], independent of its song count
pub const SAMPLE_BULK_TOTAL_PAGES: usize = 5;

fn placeholder_cover(color: &str, text: &str) -> String {
    format!("https://via.placeholder.com/300x300/{color}/ffffff?text={text}")
}

/// 100 sample songs, ids 1 to 100, reported as 5 pages
pub fn synthetic_bulk() -> SongBatch {
    let mut rng = rand::rng();
    let songs = (1..=SAMPLE_BULK_SIZE)
        .map(|i| {
            let color = format!("{:06x}", rng.random_range(0..0xFF_FFFFu32));
            Song {
                id: i,
                name: format!("Sample song {i}"),
                artist: format!("Sample artist {}", i.div_ceil(10)),
                url: SAMPLE_AUDIO_URL.to_string(),
                pic_url: placeholder_cover(&color, &format!("Music{i}")),
            }
        })
        .collect();

    SongBatch {
        songs,
        total_pages: SAMPLE_BULK_TOTAL_PAGES,
    }
}

/// A single page holding two sample songs
///
/// `page` and `page_size` are echoed back; the pagination always describes
/// one page of two songs.
pub fn synthetic_page(page: usize, page_size: usize, playlist_id: u64) -> PlaylistPage {
    let songs = vec![
        Song {
            id: 1,
            name: "Sample song 1".to_string(),
            artist: "Sample artist".to_string(),
            url: SAMPLE_AUDIO_URL.to_string(),
            pic_url: placeholder_cover("4f46e5", "Music"),
        },
        Song {
            id: 2,
            name: "Sample song 2".to_string(),
            artist: "Sample artist 2".to_string(),
            url: SAMPLE_AUDIO_URL.to_string(),
            pic_url: placeholder_cover("7c3aed", "Music"),
        },
    ];

    PlaylistPage {
        code: 200,
        playlist_id,
        playlist_name: SAMPLE_PLAYLIST_NAME.to_string(),
        pagination: Pagination {
            page,
            page_size,
            total: songs.len(),
            total_pages: 1,
            has_next: false,
            has_prev: false,
        },
        songs,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_synthetic_bulk() {
        let batch = synthetic_bulk();

        assert_eq!(batch.songs.len(), 100);
        assert_eq!(batch.total_pages, 5);
        let ids: Vec<u64> = batch.songs.iter().map(|s| s.id).collect();
        assert_eq!(ids, (1..=100).collect::<Vec<_>>());
        assert_eq!(batch.songs[0].artist, "Sample artist 1");
        assert_eq!(batch.songs[10].artist, "Sample artist 2");
        assert_eq!(batch.songs[99].artist, "Sample artist 10");
        assert!(batch.songs.iter().all(|s| s.url == SAMPLE_AUDIO_URL));
    }

    #[test]
    fn test_synthetic_page() {
        for (page, size) in [(1usize, 60usize), (3, 10), (0, 1)] {
            let result = synthetic_page(page, size, 42);

            assert_eq!(result.code, 200);
            assert_eq!(result.playlist_id, 42);
            assert_eq!(result.songs.len(), 2);
            assert_eq!(result.pagination.page, page);
            assert_eq!(result.pagination.page_size, size);
            assert_eq!(result.pagination.total, 2);
            assert_eq!(result.pagination.total_pages, 1);
            assert!(!result.pagination.has_next);
            assert!(!result.pagination.has_prev);
        }
    }
}
