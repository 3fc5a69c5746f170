//! Song library cache
//!
//! The library listing changes rarely, so it is fetched once and served from
//! memory until it is older than the TTL. Callers arriving while a fetch is
//! in progress wait for it instead of issuing their own request. Failed
//! fetches are not cached.

use crate::api::{ApiError, RecommendationBackend};
use chrono::Utc;
use imd_common::events::{EventBus, ImdEvent};
use imd_common::SongInfo;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, info, warn};

#[derive(Debug)]
struct CachedLibrary {
    songs: Arc<Vec<SongInfo>>,
    fetched_at: Instant,
}

/// TTL cache in front of `GET /songs`
pub struct LibraryCache {
    backend: Arc<dyn RecommendationBackend>,
    ttl: Duration,
    // Held across the fetch so concurrent callers share one request
    entry: Mutex<Option<CachedLibrary>>,
    event_bus: EventBus,
}

impl LibraryCache {
    pub fn new(
        backend: Arc<dyn RecommendationBackend>,
        ttl: Duration,
        event_bus: EventBus,
    ) -> Self {
        Self {
            backend,
            ttl,
            entry: Mutex::new(None),
            event_bus,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Library listing, fetched if missing or expired
    pub async fn get(&self) -> Result<Arc<Vec<SongInfo>>, ApiError> {
        let mut entry = self.entry.lock().await;

        if let Some(cached) = entry.as_ref() {
            if cached.fetched_at.elapsed() < self.ttl {
                debug!(songs = cached.songs.len(), "Library served from cache");
                return Ok(Arc::clone(&cached.songs));
            }
            debug!("Cached library expired");
        }

        match self.backend.list_songs().await {
            Ok(songs) => {
                let songs = Arc::new(songs);
                info!(songs = songs.len(), "Song library loaded");
                self.event_bus.emit_lossy(ImdEvent::LibraryLoaded {
                    song_count: songs.len(),
                    timestamp: Utc::now(),
                });
                *entry = Some(CachedLibrary {
                    songs: Arc::clone(&songs),
                    fetched_at: Instant::now(),
                });
                Ok(songs)
            }
            Err(e) => {
                warn!(error = %e, "Failed to load song library");
                self.event_bus.emit_lossy(ImdEvent::LibraryLoadFailed {
                    message: e.to_string(),
                    timestamp: Utc::now(),
                });
                Err(e)
            }
        }
    }

    /// Drop the cached listing; the next `get` fetches again
    pub async fn invalidate(&self) {
        if self.entry.lock().await.take().is_some() {
            debug!("Library cache invalidated");
        }
    }

    /// True if a listing is cached and younger than the TTL
    pub async fn is_fresh(&self) -> bool {
        self.entry
            .lock()
            .await
            .as_ref()
            .map(|cached| cached.fetched_at.elapsed() < self.ttl)
            .unwrap_or(false)
    }
}
