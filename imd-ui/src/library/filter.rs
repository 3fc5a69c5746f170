//! Library filter and search suggestions
//!
//! Both are pure derivations over the library listing: stable (library order
//! is kept), case-insensitive substring match against track OR artist, capped.
//! Surrounding whitespace only matters for the blank check; a non-blank query
//! is matched as typed.

use crate::debounce::Debouncer;
use imd_common::SongInfo;
use std::time::Duration;
use tokio::sync::mpsc;

/// Filter the library by a query, keeping library order
///
/// A blank query returns the first `limit` entries unfiltered.
pub fn filter_library<'a>(
    library: &'a [SongInfo],
    query: &str,
    limit: usize,
) -> Vec<&'a SongInfo> {
    if query.trim().is_empty() {
        return library.iter().take(limit).collect();
    }

    let needle = query.to_lowercase();
    library
        .iter()
        .filter(|song| matches_query(song, &needle))
        .take(limit)
        .collect()
}

fn matches_query(song: &SongInfo, needle_lower: &str) -> bool {
    song.track_name.to_lowercase().contains(needle_lower)
        || song.artist_name.to_lowercase().contains(needle_lower)
}

/// When the search box shows suggestions and how many
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SuggestionPolicy {
    /// Minimum query length (in characters, whitespace included)
    pub min_chars: usize,
    /// Maximum number of suggestions
    pub limit: usize,
}

impl Default for SuggestionPolicy {
    fn default() -> Self {
        Self {
            min_chars: 2,
            limit: 10,
        }
    }
}

/// Suggestions for the search box
///
/// Unlike the library panel, a short or blank query yields nothing.
pub fn search_suggestions<'a>(
    library: &'a [SongInfo],
    query: &str,
    policy: SuggestionPolicy,
) -> Vec<&'a SongInfo> {
    if query.trim().is_empty() || query.chars().count() < policy.min_chars {
        return Vec::new();
    }
    filter_library(library, query, policy.limit)
}

/// Debounced filter input
///
/// Holds the raw text as typed and the last value that stayed unchanged for
/// the debounce delay. The view depends only on the library, the debounced
/// query and the cap.
#[derive(Debug)]
pub struct LibraryFilter {
    raw_query: String,
    debounced_query: String,
    limit: usize,
    debouncer: Debouncer<String>,
    settled_rx: mpsc::UnboundedReceiver<String>,
}

impl LibraryFilter {
    pub fn new(delay: Duration, limit: usize) -> Self {
        let (debouncer, settled_rx) = Debouncer::new(delay);
        Self {
            raw_query: String::new(),
            debounced_query: String::new(),
            limit,
            debouncer,
            settled_rx,
        }
    }

    /// Text as typed
    pub fn raw_query(&self) -> &str {
        &self.raw_query
    }

    /// Last settled text
    pub fn debounced_query(&self) -> &str {
        &self.debounced_query
    }

    /// Entry cap
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Record new input; the debounced value follows after the delay
    pub fn set_query(&mut self, raw_query: impl Into<String>) {
        self.raw_query = raw_query.into();
        self.debouncer.push(self.raw_query.clone());
    }

    /// Wait for the next settled query, adopt it and return a copy
    ///
    /// Cancel-safe: a value is only taken off the channel when it is adopted.
    pub async fn settled(&mut self) -> Option<String> {
        let value = self.settled_rx.recv().await?;
        self.debounced_query = value.clone();
        Some(value)
    }

    /// Set both raw and debounced query at once, dropping any pending input
    ///
    /// This includes values that already settled but were not yet taken by
    /// [`settled`](Self::settled).
    pub fn reset(&mut self, query: impl Into<String>) {
        self.debouncer.cancel();
        while self.settled_rx.try_recv().is_ok() {}
        self.raw_query = query.into();
        self.debounced_query = self.raw_query.clone();
    }

    /// Library entries matching the debounced query
    pub fn view<'a>(&self, library: &'a [SongInfo]) -> Vec<&'a SongInfo> {
        filter_library(library, &self.debounced_query, self.limit)
    }

    /// Suggestions for the debounced query
    pub fn suggestions<'a>(
        &self,
        library: &'a [SongInfo],
        policy: SuggestionPolicy,
    ) -> Vec<&'a SongInfo> {
        search_suggestions(library, &self.debounced_query, policy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn library() -> Vec<SongInfo> {
        vec![
            SongInfo::new("Song A", "Artist X"),
            SongInfo::new("song b", "Artist Y"),
            SongInfo::new("Blue Monday", "New Order"),
            SongInfo::new("Ceremony", "New Order"),
            SongInfo::new("Wonderwall", "Oasis"),
        ]
    }

    #[test]
    fn test_case_insensitive_match_keeps_order() {
        let lib = library();
        let result = filter_library(&lib, "song", 50);

        assert_eq!(result.len(), 2);
        assert_eq!(result[0].track_name, "Song A");
        assert_eq!(result[1].track_name, "song b");
    }

    #[test]
    fn test_matches_artist_name() {
        let lib = library();
        let result = filter_library(&lib, "new ORDER", 50);

        let tracks: Vec<_> = result.iter().map(|s| s.track_name.as_str()).collect();
        assert_eq!(tracks, vec!["Blue Monday", "Ceremony"]);
    }

    #[test]
    fn test_empty_query_returns_first_n() {
        let lib = library();

        let result = filter_library(&lib, "", 3);
        assert_eq!(result.len(), 3);
        assert_eq!(result[0], &lib[0]);
        assert_eq!(result[2], &lib[2]);

        let whitespace = filter_library(&lib, "   ", 10);
        assert_eq!(whitespace.len(), lib.len());
    }

    #[test]
    fn test_surrounding_whitespace_is_part_of_the_match() {
        let lib = library();

        let result = filter_library(&lib, " b", 10);

        let tracks: Vec<_> = result.iter().map(|s| s.track_name.as_str()).collect();
        assert_eq!(tracks, vec!["song b"]);
        assert!(filter_library(&lib, "oasis ", 10).is_empty());
    }

    #[test]
    fn test_cap_applies_to_matches() {
        let lib = library();
        let result = filter_library(&lib, "o", 2);
        assert_eq!(result.len(), 2);
        assert_eq!(result[0].track_name, "Song A");
        assert_eq!(result[1].track_name, "song b");
    }

    #[test]
    fn test_no_match_is_empty() {
        let lib = library();
        assert!(filter_library(&lib, "zzz", 50).is_empty());
    }

    #[test]
    fn test_suggestions_need_min_chars() {
        let lib = library();
        let policy = SuggestionPolicy::default();

        assert!(search_suggestions(&lib, "", policy).is_empty());
        assert!(search_suggestions(&lib, "s", policy).is_empty());
        assert!(search_suggestions(&lib, "   ", policy).is_empty());
        assert_eq!(search_suggestions(&lib, "so", policy).len(), 2);

        // Length counts the raw text, so " b" qualifies
        let padded = search_suggestions(&lib, " b", policy);
        assert_eq!(padded.len(), 1);
        assert_eq!(padded[0].track_name, "song b");
    }

    #[test]
    fn test_suggestions_capped() {
        let lib: Vec<_> = (0..30)
            .map(|i| SongInfo::new(format!("Track {}", i), "Band"))
            .collect();

        let result = search_suggestions(&lib, "track", SuggestionPolicy::default());
        assert_eq!(result.len(), 10);
        assert_eq!(result[0].track_name, "Track 0");
    }

    #[tokio::test(start_paused = true)]
    async fn test_view_follows_debounced_query_only() {
        let lib = library();
        let mut filter = LibraryFilter::new(Duration::from_millis(300), 50);

        filter.set_query("oas");
        assert_eq!(filter.raw_query(), "oas");

        // Not settled yet: view is still unfiltered
        assert_eq!(filter.view(&lib).len(), lib.len());

        let settled = filter.settled().await;
        assert_eq!(settled.as_deref(), Some("oas"));

        let view = filter.view(&lib);
        assert_eq!(view.len(), 1);
        assert_eq!(view[0].artist_name, "Oasis");
    }

    #[tokio::test(start_paused = true)]
    async fn test_fast_typing_settles_once() {
        let lib = library();
        let mut filter = LibraryFilter::new(Duration::from_millis(300), 50);

        for partial in ["c", "ce", "cer"] {
            filter.set_query(partial);
            tokio::time::advance(Duration::from_millis(50)).await;
        }

        assert_eq!(filter.settled().await.as_deref(), Some("cer"));
        assert_eq!(filter.view(&lib)[0].track_name, "Ceremony");
    }

    #[tokio::test(start_paused = true)]
    async fn test_reset_sets_both_queries() {
        let mut filter = LibraryFilter::new(Duration::from_millis(300), 50);
        filter.set_query("pending");
        filter.reset("");

        assert_eq!(filter.raw_query(), "");
        assert_eq!(filter.debounced_query(), "");

        // The pending value never lands
        tokio::time::advance(Duration::from_secs(1)).await;
        assert_eq!(filter.debounced_query(), "");
    }

    #[tokio::test(start_paused = true)]
    async fn test_reset_discards_value_settled_before_it() {
        let mut filter = LibraryFilter::new(Duration::from_millis(300), 50);
        filter.set_query("pending");

        // The timer fires but nobody has taken the value yet
        tokio::time::sleep(Duration::from_millis(301)).await;
        tokio::task::yield_now().await;

        filter.reset("");

        let next = tokio::time::timeout(Duration::from_secs(1), filter.settled()).await;
        assert!(next.is_err());
        assert_eq!(filter.raw_query(), "");
        assert_eq!(filter.debounced_query(), "");
    }
}
