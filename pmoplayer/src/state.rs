//! Playback state of the widget
//!
//! Two orderings of the same songs coexist: the linear one (`full_playlist`,
//! in fetch order) and the shuffled one. Each has its own cursor and
//! `is_shuffle` selects which one is active. `playlist` is the page of the
//! linear order currently displayed.
//!
//! The cursor of the active order set to `None` is the terminal state reached
//! by moving past either end without repeat: there is no current song until
//! the lists are rebuilt, a song is selected or shuffle is toggled.
//!
//! While shuffle is on, `current_index` stays on a concrete linear position
//! (0 after a rebuild, else the last linear song) and only `shuffle_index`
//! moves. While shuffle is off the shuffled order is empty and
//! `shuffle_index` is `None`. Both cursors are `None` when there are no songs.

use pmometing::{paginator, shuffle, Song};
use serde::Serialize;

/// What happens to the cursors when the lists are rebuilt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorPolicy {
    /// Back to the first song of page 1
    Reset,
    /// Keep the current song and page when the song is still at the same
    /// linear position, otherwise behave like [`CursorPolicy::Reset`]
    Preserve,
}

#[derive(Debug, Clone)]
pub struct PlaybackState {
    is_visible: bool,
    is_expanded: bool,
    is_playing: bool,
    is_loading: bool,
    is_shuffle: bool,
    is_repeat: bool,

    page_size: usize,
    current_page: usize,
    total_pages: usize,
    playlist: Vec<Song>,

    full_playlist: Vec<Song>,
    current_index: Option<usize>,

    shuffled_playlist: Vec<Song>,
    // shuffled position -> linear position
    shuffle_origin: Vec<usize>,
    shuffle_index: Option<usize>,

    current_time: f64,
    duration: f64,
    volume: f32,
}

/// Serializable copy of the state, in the shape the widget renders
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StateSnapshot {
    pub is_visible: bool,
    pub is_playing: bool,
    pub is_expanded: bool,
    pub is_loading: bool,
    pub current_song: Option<Song>,
    pub current_time: f64,
    pub duration: f64,
    pub volume: f32,
    pub is_shuffle: bool,
    pub is_repeat: bool,
    pub current_page: usize,
    pub total_pages: usize,
    pub playlist: Vec<Song>,
    pub current_index: Option<usize>,
    pub full_playlist: Vec<Song>,
    pub shuffled_playlist: Vec<Song>,
    pub shuffle_index: Option<usize>,
}

impl PlaybackState {
    pub fn new(page_size: usize, volume: f32) -> Self {
        let mut state = Self {
            is_visible: true,
            is_expanded: false,
            is_playing: false,
            is_loading: false,
            is_shuffle: false,
            is_repeat: false,
            page_size: page_size.max(1),
            current_page: 1,
            total_pages: 0,
            playlist: Vec::new(),
            full_playlist: Vec::new(),
            current_index: None,
            shuffled_playlist: Vec::new(),
            shuffle_origin: Vec::new(),
            shuffle_index: None,
            current_time: 0.0,
            duration: 0.0,
            volume: 0.0,
        };
        state.set_volume(volume);
        state
    }

    // ------------------------------------------------------------------
    // Lists
    // ------------------------------------------------------------------

    /// Replaces both orderings with `songs`
    pub fn rebuild(&mut self, songs: Vec<Song>, total_pages: usize, policy: CursorPolicy) {
        let kept = match policy {
            CursorPolicy::Reset => None,
            CursorPolicy::Preserve => self
                .current_linear_position()
                .filter(|&i| songs.get(i).is_some() && songs.get(i) == self.full_playlist.get(i)),
        };
        let page = match kept {
            Some(_) => self.current_page,
            None => 1,
        };

        self.full_playlist = songs;
        self.total_pages = total_pages;
        self.clear_shuffle();

        let first = (!self.full_playlist.is_empty()).then_some(0);

        self.current_index = kept.or(first);
        if self.is_shuffle {
            self.build_shuffle(kept);
            if kept.is_none() {
                self.shuffle_index = first;
            }
        }

        self.show_page(page);
    }

    /// Empties the lists and resets the cursors; toggles are kept
    pub fn clear(&mut self) {
        self.rebuild(Vec::new(), 0, CursorPolicy::Reset);
        self.is_playing = false;
        self.current_time = 0.0;
        self.duration = 0.0;
    }

    /// True when `page` lies within the songs already in `full_playlist`
    pub fn covers_page(&self, page: usize) -> bool {
        page >= 1 && (page - 1).saturating_mul(self.page_size) < self.full_playlist.len()
    }

    /// Re-slices the page view; returns the number of songs shown
    pub fn show_page(&mut self, page: usize) -> usize {
        let slice = paginator::get_page(&self.full_playlist, page, self.page_size);
        self.playlist = slice.songs;
        self.current_page = page;
        self.playlist.len()
    }

    /// Selects the song at `index` of the page view
    pub fn select(&mut self, index: usize) -> Option<&Song> {
        if index >= self.playlist.len() {
            return None;
        }
        let linear = (self.current_page - 1) * self.page_size + index;
        self.current_index = Some(linear);
        if self.is_shuffle {
            self.shuffle_index = self.shuffle_origin.iter().position(|&i| i == linear);
        }
        self.current_song()
    }

    // ------------------------------------------------------------------
    // Navigation
    // ------------------------------------------------------------------

    pub fn next(&mut self) -> Option<&Song> {
        let len = self.active_len();
        let repeat = self.is_repeat;
        let cursor = self.active_cursor_mut();
        *cursor = match *cursor {
            Some(i) if i + 1 < len => Some(i + 1),
            Some(_) if repeat && len > 0 => Some(0),
            _ => None,
        };
        self.follow_current_song();
        self.current_song()
    }

    pub fn prev(&mut self) -> Option<&Song> {
        let len = self.active_len();
        let repeat = self.is_repeat;
        let cursor = self.active_cursor_mut();
        *cursor = match *cursor {
            Some(i) if i > 0 => Some(i - 1),
            Some(_) if repeat && len > 0 => Some(len - 1),
            _ => None,
        };
        self.follow_current_song();
        self.current_song()
    }

    /// Switches between the linear and shuffled orders, keeping the current
    /// song
    pub fn toggle_shuffle(&mut self) -> bool {
        self.set_shuffle(!self.is_shuffle);
        self.is_shuffle
    }

    pub fn set_shuffle(&mut self, on: bool) {
        if on == self.is_shuffle {
            return;
        }
        let first = (!self.full_playlist.is_empty()).then_some(0);

        if on {
            let linear = self.current_index.or(first);
            self.build_shuffle(linear);
            self.current_index = linear;
        } else {
            self.current_index = self.current_linear_position().or(first);
            self.clear_shuffle();
        }
        self.is_shuffle = on;
        self.follow_current_song();
    }

    pub fn toggle_repeat(&mut self) -> bool {
        self.is_repeat = !self.is_repeat;
        self.is_repeat
    }

    pub fn set_repeat(&mut self, on: bool) {
        self.is_repeat = on;
    }

    // ------------------------------------------------------------------
    // Presentation and playback flags
    // ------------------------------------------------------------------

    pub fn set_playing(&mut self, playing: bool) {
        self.is_playing = playing;
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.is_visible = visible;
    }

    pub fn toggle_expanded(&mut self) -> bool {
        self.is_expanded = !self.is_expanded;
        self.is_expanded
    }

    pub fn set_loading(&mut self, loading: bool) {
        self.is_loading = loading;
    }

    /// Clamped to `[0, 1]`; NaN is ignored
    pub fn set_volume(&mut self, volume: f32) {
        if !volume.is_nan() {
            self.volume = volume.clamp(0.0, 1.0);
        }
    }

    pub fn set_progress(&mut self, current_time: f64, duration: f64) {
        self.current_time = current_time.max(0.0);
        self.duration = duration.max(0.0);
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    pub fn current_song(&self) -> Option<&Song> {
        if self.is_shuffle {
            self.shuffle_index.and_then(|i| self.shuffled_playlist.get(i))
        } else {
            self.current_index.and_then(|i| self.full_playlist.get(i))
        }
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    pub fn is_playing(&self) -> bool {
        self.is_playing
    }

    pub fn is_shuffle(&self) -> bool {
        self.is_shuffle
    }

    pub fn is_repeat(&self) -> bool {
        self.is_repeat
    }

    pub fn is_visible(&self) -> bool {
        self.is_visible
    }

    pub fn is_expanded(&self) -> bool {
        self.is_expanded
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    pub fn current_index(&self) -> Option<usize> {
        self.current_index
    }

    pub fn shuffle_index(&self) -> Option<usize> {
        self.shuffle_index
    }

    pub fn current_page(&self) -> usize {
        self.current_page
    }

    pub fn total_pages(&self) -> usize {
        self.total_pages
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn playlist(&self) -> &[Song] {
        &self.playlist
    }

    pub fn full_playlist(&self) -> &[Song] {
        &self.full_playlist
    }

    pub fn shuffled_playlist(&self) -> &[Song] {
        &self.shuffled_playlist
    }

    pub fn snapshot(&self) -> StateSnapshot {
        StateSnapshot {
            is_visible: self.is_visible,
            is_playing: self.is_playing,
            is_expanded: self.is_expanded,
            is_loading: self.is_loading,
            current_song: self.current_song().cloned(),
            current_time: self.current_time,
            duration: self.duration,
            volume: self.volume,
            is_shuffle: self.is_shuffle,
            is_repeat: self.is_repeat,
            current_page: self.current_page,
            total_pages: self.total_pages,
            playlist: self.playlist.clone(),
            current_index: self.current_index,
            full_playlist: self.full_playlist.clone(),
            shuffled_playlist: self.shuffled_playlist.clone(),
            shuffle_index: self.shuffle_index,
        }
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    /// Position of the current song in `full_playlist`
    fn current_linear_position(&self) -> Option<usize> {
        if self.is_shuffle {
            self.shuffle_index
                .and_then(|i| self.shuffle_origin.get(i).copied())
        } else {
            self.current_index
        }
    }

    /// New permutation; the shuffle cursor lands on `linear` when given
    fn build_shuffle(&mut self, linear: Option<usize>) {
        self.shuffle_origin = shuffle::permuted_indices(self.full_playlist.len());
        self.shuffled_playlist = self
            .shuffle_origin
            .iter()
            .map(|&i| self.full_playlist[i].clone())
            .collect();
        self.shuffle_index =
            linear.and_then(|l| self.shuffle_origin.iter().position(|&i| i == l));
    }

    fn clear_shuffle(&mut self) {
        self.shuffled_playlist.clear();
        self.shuffle_origin.clear();
        self.shuffle_index = None;
    }

    fn active_len(&self) -> usize {
        if self.is_shuffle {
            self.shuffled_playlist.len()
        } else {
            self.full_playlist.len()
        }
    }

    fn active_cursor_mut(&mut self) -> &mut Option<usize> {
        if self.is_shuffle {
            &mut self.shuffle_index
        } else {
            &mut self.current_index
        }
    }

    // linear mode only: the page view follows the current song
    fn follow_current_song(&mut self) {
        if self.is_shuffle {
            return;
        }
        if let Some(i) = self.current_index {
            let page = i / self.page_size + 1;
            if page != self.current_page {
                self.show_page(page);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

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

    fn loaded(n: usize, page_size: usize) -> PlaybackState {
        let mut state = PlaybackState::new(page_size, 0.7);
        state.rebuild(songs(n), n.div_ceil(page_size), CursorPolicy::Reset);
        state
    }

    #[test]
    fn test_rebuild_resets_cursor_and_page() {
        let state = loaded(150, 60);
        assert_eq!(state.current_index(), Some(0));
        assert_eq!(state.current_page(), 1);
        assert_eq!(state.playlist().len(), 60);
        assert_eq!(state.current_song().map(|s| s.id), Some(1));
    }

    #[test]
    fn test_rebuild_empty() {
        let state = loaded(0, 60);
        assert_eq!(state.current_index(), None);
        assert!(state.current_song().is_none());
        assert!(state.playlist().is_empty());
    }

    #[test]
    fn test_next_without_repeat_is_terminal() {
        let mut state = loaded(3, 60);
        state.select(2);
        assert_eq!(state.current_index(), Some(2));

        assert!(state.next().is_none());
        assert_eq!(state.current_index(), None);
        // stays terminal
        assert!(state.next().is_none());
        assert!(state.prev().is_none());
    }

    #[test]
    fn test_next_with_repeat_wraps() {
        let mut state = loaded(3, 60);
        state.set_repeat(true);
        state.select(2);

        assert_eq!(state.next().map(|s| s.id), Some(1));
        assert_eq!(state.current_index(), Some(0));
        assert_eq!(state.prev().map(|s| s.id), Some(3));
        assert_eq!(state.current_index(), Some(2));
    }

    #[test]
    fn test_prev_at_start_without_repeat() {
        let mut state = loaded(3, 60);
        assert!(state.prev().is_none());
        assert_eq!(state.current_index(), None);
    }

    #[test]
    fn test_page_follows_song_in_linear_mode() {
        let mut state = loaded(150, 60);
        state.show_page(1);
        state.select(59);

        assert_eq!(state.next().map(|s| s.id), Some(61));
        assert_eq!(state.current_page(), 2);
        assert_eq!(state.playlist()[0].id, 61);

        state.prev();
        assert_eq!(state.current_page(), 1);
    }

    #[test]
    fn test_shuffle_preserves_current_song() {
        let mut state = loaded(50, 10);
        state.show_page(2);
        state.select(3);
        let before = state.current_song().cloned();
        assert_eq!(before.as_ref().map(|s| s.id), Some(14));

        assert!(state.toggle_shuffle());
        assert_eq!(state.current_song().cloned(), before);
        assert_eq!(state.shuffled_playlist().len(), 50);

        let mut ids: Vec<u64> = state.shuffled_playlist().iter().map(|s| s.id).collect();
        ids.sort_unstable();
        assert_eq!(ids, (1..=50).collect::<Vec<_>>());

        // move within the shuffled order, then back to linear
        state.set_repeat(true);
        state.next();
        let shuffled_song = state.current_song().cloned().unwrap();
        assert!(!state.toggle_shuffle());
        assert_eq!(state.current_song(), Some(&shuffled_song));
        assert_eq!(
            state.current_index(),
            Some(shuffled_song.id as usize - 1)
        );
        assert_eq!(state.current_page(), (shuffled_song.id as usize - 1) / 10 + 1);
        assert!(state.shuffled_playlist().is_empty());
    }

    #[test]
    fn test_shuffle_with_duplicate_ids() {
        let mut list = songs(4);
        list[3] = list[1].clone();
        let mut state = PlaybackState::new(10, 0.5);
        state.rebuild(list, 1, CursorPolicy::Reset);
        state.select(3);

        state.toggle_shuffle();
        state.toggle_shuffle();
        assert_eq!(state.current_index(), Some(3));
    }

    #[test]
    fn test_shuffle_walks_every_song_once() {
        let mut state = loaded(20, 60);
        state.toggle_shuffle();
        // restart from the first shuffled song
        let mut seen = vec![state.shuffled_playlist()[0].id];
        while state.shuffle_index() != Some(0) {
            state.prev();
        }
        while let Some(song) = state.next() {
            seen.push(song.id);
        }
        seen.sort_unstable();
        assert_eq!(seen, (1..=20).collect::<Vec<_>>());
    }

    #[test]
    fn test_rebuild_preserve_keeps_position() {
        let mut state = loaded(120, 60);
        state.show_page(2);
        state.select(5);

        state.rebuild(songs(180), 3, CursorPolicy::Preserve);
        assert_eq!(state.current_index(), Some(65));
        assert_eq!(state.current_page(), 2);

        // a different list at that position resets
        let mut other = songs(180);
        other[65].id = 9999;
        state.rebuild(other, 3, CursorPolicy::Preserve);
        assert_eq!(state.current_index(), Some(0));
        assert_eq!(state.current_page(), 1);
    }

    #[test]
    fn test_rebuild_preserve_in_shuffle_mode() {
        let mut state = loaded(60, 60);
        state.set_repeat(true);
        state.toggle_shuffle();
        state.next();
        let current = state.current_song().cloned();

        state.rebuild(songs(120), 2, CursorPolicy::Preserve);
        assert_eq!(state.shuffled_playlist().len(), 120);
        assert_eq!(state.current_song().cloned(), current);
    }

    #[test]
    fn test_inactive_linear_cursor_stays_concrete() {
        let mut state = PlaybackState::new(60, 0.7);
        state.set_shuffle(true);
        state.rebuild(songs(30), 1, CursorPolicy::Reset);

        assert_eq!(state.current_index(), Some(0));
        assert_eq!(state.shuffle_index(), Some(0));
        let json = serde_json::to_value(state.snapshot()).unwrap();
        assert_eq!(json["currentIndex"], 0);
        assert_eq!(json["shuffleIndex"], 0);

        // the linear cursor does not move with the shuffled one
        state.set_repeat(true);
        state.next();
        assert_eq!(state.current_index(), Some(0));

        let mut state = loaded(30, 60);
        state.select(7);
        state.toggle_shuffle();
        assert_eq!(state.current_index(), Some(7));
        assert_eq!(state.current_song().map(|s| s.id), Some(8));
    }

    #[test]
    fn test_covers_page() {
        let state = loaded(120, 60);
        assert!(!state.covers_page(0));
        assert!(state.covers_page(1));
        assert!(state.covers_page(2));
        assert!(!state.covers_page(3));
    }

    #[test]
    fn test_volume_is_clamped() {
        let mut state = PlaybackState::new(60, 3.0);
        assert_eq!(state.volume(), 1.0);
        state.set_volume(-1.0);
        assert_eq!(state.volume(), 0.0);
        state.set_volume(f32::NAN);
        assert_eq!(state.volume(), 0.0);
    }

    #[test]
    fn test_snapshot_shape() {
        let state = loaded(3, 60);
        let json = serde_json::to_value(state.snapshot()).unwrap();

        assert_eq!(json["isLoading"], false);
        assert_eq!(json["currentIndex"], 0);
        assert_eq!(json["currentSong"]["pic_url"], "");
        assert_eq!(json["fullPlaylist"].as_array().unwrap().len(), 3);
        assert!(json["shuffleIndex"].is_null());
    }
}
