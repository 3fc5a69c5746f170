//! Event types for the IMD client
//!
//! Provides the shared event definitions and the EventBus used by the
//! recommendation store, the library cache and the session.

use crate::models::{QueryKind, RequestStatus, SongInfo};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// IMD event types
///
/// Events are broadcast via EventBus and can be serialized for logging or
/// forwarding to another front end.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ImdEvent {
    /// A recommendation query started and the state moved to Loading
    QueryStarted {
        /// Generation tag of the query
        generation: u64,
        /// Name or audio query
        kind: QueryKind,
        /// When the query started
        timestamp: DateTime<Utc>,
    },

    /// The latest query settled and its result was applied
    QuerySettled {
        /// Generation tag of the query
        generation: u64,
        /// Succeeded or Failed
        status: RequestStatus,
        /// Number of recommendations received (0 on failure)
        song_count: usize,
        /// When the result was applied
        timestamp: DateTime<Utc>,
    },

    /// A superseded query settled; its result was dropped
    ///
    /// Not an error. Never shown to the user.
    StaleResultDiscarded {
        /// Generation tag of the superseded query
        generation: u64,
        /// When the result was dropped
        timestamp: DateTime<Utc>,
    },

    /// Recommendation state reset to Idle
    RecommendationsCleared {
        timestamp: DateTime<Utc>,
    },

    /// Song library fetched from the backend
    LibraryLoaded {
        /// Number of songs in the library
        song_count: usize,
        timestamp: DateTime<Utc>,
    },

    /// Song library fetch failed
    LibraryLoadFailed {
        /// Error description
        message: String,
        timestamp: DateTime<Utc>,
    },

    /// Highlighted "now playing" song changed
    NowPlayingChanged {
        /// New selection (None after clear)
        song: Option<SongInfo>,
        timestamp: DateTime<Utc>,
    },
}

/// Central event distribution bus
///
/// Thin wrapper over a tokio broadcast channel. Cloning shares the channel.
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<ImdEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus with specified channel capacity
    ///
    /// # Arguments
    ///
    /// * `capacity` - Number of events to buffer before dropping old events
    ///
    /// # Examples
    ///
    /// ```
    /// use imd_common::events::EventBus;
    ///
    /// let event_bus = EventBus::new(100);
    /// assert_eq!(event_bus.capacity(), 100);
    /// ```
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    ///
    /// Events emitted before subscription are not received.
    pub fn subscribe(&self) -> broadcast::Receiver<ImdEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns `Ok(subscriber_count)` if at least one subscriber exists.
    /// Returns `Err` if no subscribers are listening.
    #[allow(clippy::result_large_err)]
    pub fn emit(
        &self,
        event: ImdEvent,
    ) -> std::result::Result<usize, broadcast::error::SendError<ImdEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring if no subscribers are listening
    pub fn emit_lossy(&self, event: ImdEvent) {
        let _ = self.tx.send(event);
    }

    /// Get the current number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Get the configured channel capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(100)
    }
}
