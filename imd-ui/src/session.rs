//! Client session
//!
//! Everything one user interaction context needs, built once and passed
//! around explicitly: the recommendation store, the library cache, the
//! now-playing selection and the event bus. Clones share all of it.

use crate::api::{ApiClient, ApiError, AudioUpload, RecommendationBackend};
use crate::library::{LibraryCache, SuggestionPolicy};
use crate::now_playing;
use crate::recommendations::{QueryOutcome, RecommendationStore, RequestState};
use chrono::Utc;
use imd_common::config::ClientConfig;
use imd_common::events::{EventBus, ImdEvent};
use imd_common::SongInfo;
use reqwest::Url;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, watch};
use tracing::{debug, info};

struct SessionInner {
    store: RecommendationStore,
    library: LibraryCache,
    now_playing: watch::Sender<Option<SongInfo>>,
    event_bus: EventBus,
    suggestion_policy: SuggestionPolicy,
}

/// Shared client context
#[derive(Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

impl Session {
    /// Build a session over any backend
    pub fn new(
        backend: Arc<dyn RecommendationBackend>,
        library_ttl: Duration,
        suggestion_policy: SuggestionPolicy,
        event_bus: EventBus,
    ) -> Self {
        let (now_playing, _) = watch::channel(None);
        Self {
            inner: Arc::new(SessionInner {
                store: RecommendationStore::new(Arc::clone(&backend), event_bus.clone()),
                library: LibraryCache::new(backend, library_ttl, event_bus.clone()),
                now_playing,
                event_bus,
                suggestion_policy,
            }),
        }
    }

    /// Build a session talking HTTP to the configured backend
    pub fn from_config(config: &ClientConfig, event_bus: EventBus) -> Result<Self, ApiError> {
        let client = ApiClient::new(config.api_base_url.clone())?;
        info!(base_url = %client.base_url(), "Recommendation backend configured");

        Ok(Self::new(
            Arc::new(client),
            config.library_cache_ttl,
            SuggestionPolicy {
                min_chars: config.suggestion_min_chars,
                limit: config.suggestion_limit,
            },
            event_bus,
        ))
    }

    pub fn store(&self) -> &RecommendationStore {
        &self.inner.store
    }

    pub fn event_bus(&self) -> &EventBus {
        &self.inner.event_bus
    }

    pub fn suggestion_policy(&self) -> SuggestionPolicy {
        self.inner.suggestion_policy
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Recommendations by song name
    ///
    /// Blank input does nothing and returns `None`.
    pub async fn search(&self, text: &str) -> Option<QueryOutcome> {
        let ticket = self.inner.store.start_name_query(text)?;
        let query = ticket.label().to_string();

        let outcome = self.inner.store.run(ticket).await;
        if let Some(song) = now_playing::after_name_query(&query, &outcome) {
            self.select_if_latest(&outcome, song);
        }
        Some(outcome)
    }

    /// Recommendations by uploaded audio (first file only)
    pub async fn upload(&self, files: Vec<AudioUpload>) -> Option<QueryOutcome> {
        let ticket = self.inner.store.start_audio_query(files)?;
        let file_name = ticket.label().to_string();

        let outcome = self.inner.store.run(ticket).await;
        if let Some(song) = now_playing::after_audio_query(&file_name, &outcome) {
            self.select_if_latest(&outcome, song);
        }
        Some(outcome)
    }

    /// Picking a library entry searches by its track name
    pub async fn select_library_song(&self, song: &SongInfo) -> Option<QueryOutcome> {
        debug!(track = %song.track_name, artist = %song.artist_name, "Library song selected");
        self.search(&song.track_name).await
    }

    /// Reset recommendations and the now-playing selection
    pub fn clear(&self) {
        self.inner.store.clear();
        self.set_now_playing(None);
    }

    /// Current recommendation state
    pub fn state(&self) -> RequestState {
        self.inner.store.snapshot()
    }

    // ========================================================================
    // Library
    // ========================================================================

    /// Song library, from cache when fresh
    pub async fn library(&self) -> Result<Arc<Vec<SongInfo>>, ApiError> {
        self.inner.library.get().await
    }

    /// Drop the cached library and fetch it again
    pub async fn refresh_library(&self) -> Result<Arc<Vec<SongInfo>>, ApiError> {
        self.inner.library.invalidate().await;
        self.inner.library.get().await
    }

    // ========================================================================
    // Now playing
    // ========================================================================

    pub fn now_playing(&self) -> Option<SongInfo> {
        self.inner.now_playing.borrow().clone()
    }

    /// Web search page for `song`, or for the now-playing song
    ///
    /// `Ok(None)` when neither is available.
    pub fn play_url(&self, song: Option<&SongInfo>) -> Result<Option<Url>, ApiError> {
        let target = match song {
            Some(song) => song.clone(),
            None => match self.now_playing() {
                Some(song) => song,
                None => return Ok(None),
            },
        };
        now_playing::web_search_url(&target).map(Some)
    }

    fn select_if_latest(&self, outcome: &QueryOutcome, song: SongInfo) {
        let generation = outcome.generation();
        let store = &self.inner.store;

        // A newer query or a clear may have happened since settling. Checked
        // under the now-playing lock: a clear consumes its generation before
        // resetting the selection, so it either wins here or resets after us.
        let applied =
            self.update_now_playing(Some(song), || store.latest_generation() == generation);
        if !applied {
            debug!(generation, "Not updating now playing for an older query");
        }
    }

    fn set_now_playing(&self, song: Option<SongInfo>) {
        self.update_now_playing(song, || true);
    }

    /// Replace the selection if `allowed` holds; false if it did not
    fn update_now_playing(
        &self,
        song: Option<SongInfo>,
        allowed: impl FnOnce() -> bool,
    ) -> bool {
        let mut permitted = false;
        self.inner.now_playing.send_if_modified(|current| {
            permitted = allowed();
            if !permitted || *current == song {
                return false;
            }
            *current = song.clone();

            debug!(song = ?song, "Now playing changed");
            self.inner.event_bus.emit_lossy(ImdEvent::NowPlayingChanged {
                song: song.clone(),
                timestamp: Utc::now(),
            });
            true
        });
        permitted
    }

    // ========================================================================
    // Subscriptions
    // ========================================================================

    pub fn subscribe_state(&self) -> watch::Receiver<RequestState> {
        self.inner.store.subscribe()
    }

    pub fn subscribe_now_playing(&self) -> watch::Receiver<Option<SongInfo>> {
        self.inner.now_playing.subscribe()
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<ImdEvent> {
        self.inner.event_bus.subscribe()
    }
}
