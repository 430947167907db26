//! Virtual pagination over a fully-fetched song collection
//!
//! The Meting API returns a whole playlist in one response; pages, bulk
//! selections and preloads are all derived locally from that list.

use crate::models::{PageSlice, Pagination, Song, SongBatch};
use crate::shuffle;

/// Default number of songs in a bulk selection
pub const DEFAULT_BULK_LIMIT: usize = 60;

/// `ceil(total / page_size)`; a zero page size counts as 1
pub fn total_pages(total: usize, page_size: usize) -> usize {
    total.div_ceil(page_size.max(1))
}

/// Pagination metadata for `page` of a collection of `total` songs
pub fn pagination(total: usize, page: usize, page_size: usize) -> Pagination {
    let page_size = page_size.max(1);
    let total_pages = total_pages(total, page_size);
    Pagination {
        page,
        page_size,
        total,
        total_pages,
        has_next: page < total_pages,
        has_prev: page > 1,
    }
}

/// Slices `all[(page-1)*page_size .. page*page_size]`
///
/// Pages past the end, and page 0, hold no songs.
pub fn get_page(all: &[Song], page: usize, page_size: usize) -> PageSlice {
    let pagination = pagination(all.len(), page, page_size);
    let songs = match page.checked_sub(1) {
        Some(index) => {
            let start = index.saturating_mul(pagination.page_size).min(all.len());
            let end = start.saturating_add(pagination.page_size).min(all.len());
            all[start..end].to_vec()
        }
        None => Vec::new(),
    };
    PageSlice { songs, pagination }
}

/// A random selection of at most `limit` songs
///
/// `total_pages` is computed on the source collection, not on the selection.
pub fn get_bulk_selection(all: &[Song], limit: usize, page_size: usize) -> SongBatch {
    let mut songs = shuffle::permute(all);
    songs.truncate(limit.min(all.len()));
    SongBatch {
        songs,
        total_pages: total_pages(all.len(), page_size),
    }
}

/// The first `pages` pages of the collection, in source order
pub fn get_multi_page_preload(all: &[Song], pages: usize, page_size: usize) -> SongBatch {
    let wanted = pages.saturating_mul(page_size.max(1)).min(all.len());
    SongBatch {
        songs: all[..wanted].to_vec(),
        total_pages: total_pages(all.len(), page_size),
    }
}
