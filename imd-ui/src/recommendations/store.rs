//! Recommendation store
//!
//! Owns the single [`RequestState`] and is the only thing that mutates it.
//! Constructed explicitly and handed to whoever needs it; clones share the
//! same state.
//!
//! Every query gets a generation number when it starts, and every `clear()`
//! consumes one too. Generations only go up, so a settlement can be matched
//! against the query currently in flight and dropped if a newer query (or a
//! clear) has happened since. A generation is allocated under the same watch
//! lock that applies its transition, so the state always reflects the highest
//! generation handed out.

use super::state::{reduce, QueryEvent, RequestState};
use crate::api::{AudioUpload, EndpointFamily, RecommendationBackend};
use chrono::Utc;
use imd_common::events::{EventBus, ImdEvent};
use imd_common::models::QueryKind;
use imd_common::{RecommendedSong, RequestStatus};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// What a started query will send to the backend
#[derive(Debug, Clone)]
enum QueryRequest {
    Name(String),
    Audio(AudioUpload),
}

/// A query that has moved the state to Loading and still has to be run
#[derive(Debug, Clone)]
pub struct QueryTicket {
    generation: u64,
    request: QueryRequest,
}

impl QueryTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn kind(&self) -> QueryKind {
        match self.request {
            QueryRequest::Name(_) => QueryKind::Name,
            QueryRequest::Audio(_) => QueryKind::Audio,
        }
    }

    /// Trimmed query text, or the uploaded file name
    pub fn label(&self) -> &str {
        match &self.request {
            QueryRequest::Name(query) => query,
            QueryRequest::Audio(upload) => &upload.file_name,
        }
    }
}

/// Result of running a query, as seen by the caller
#[derive(Debug, Clone, PartialEq)]
pub enum QueryOutcome {
    /// Applied; state is Succeeded
    Succeeded {
        generation: u64,
        recommendations: Vec<RecommendedSong>,
    },
    /// Applied; state is Failed
    Failed { generation: u64, message: String },
    /// A newer query (or a clear) came first; state untouched
    Superseded { generation: u64 },
}

impl QueryOutcome {
    pub fn generation(&self) -> u64 {
        match self {
            QueryOutcome::Succeeded { generation, .. }
            | QueryOutcome::Failed { generation, .. }
            | QueryOutcome::Superseded { generation } => *generation,
        }
    }

    pub fn is_superseded(&self) -> bool {
        matches!(self, QueryOutcome::Superseded { .. })
    }
}

struct StoreInner {
    backend: Arc<dyn RecommendationBackend>,
    state: watch::Sender<RequestState>,
    last_generation: AtomicU64,
    event_bus: EventBus,
}

/// Owner of the recommendation request state
#[derive(Clone)]
pub struct RecommendationStore {
    inner: Arc<StoreInner>,
}

impl RecommendationStore {
    pub fn new(backend: Arc<dyn RecommendationBackend>, event_bus: EventBus) -> Self {
        let (state, _) = watch::channel(RequestState::default());
        Self {
            inner: Arc::new(StoreInner {
                backend,
                state,
                last_generation: AtomicU64::new(0),
                event_bus,
            }),
        }
    }

    /// Copy of the current state
    pub fn snapshot(&self) -> RequestState {
        self.inner.state.borrow().clone()
    }

    /// Receiver notified on every state change
    pub fn subscribe(&self) -> watch::Receiver<RequestState> {
        self.inner.state.subscribe()
    }

    /// Generation consumed by the most recent start or clear (0 if none)
    pub fn latest_generation(&self) -> u64 {
        self.inner.last_generation.load(Ordering::SeqCst)
    }

    /// Allocate a generation and apply the event built from it in one step
    fn advance(&self, event_for: impl FnOnce(u64) -> QueryEvent) -> u64 {
        let mut generation = 0;
        self.inner.state.send_if_modified(|state| {
            generation = self.inner.last_generation.fetch_add(1, Ordering::SeqCst) + 1;
            match reduce(state, event_for(generation)) {
                Some(next) => {
                    let changed = next != *state;
                    *state = next;
                    changed
                }
                None => false,
            }
        });
        generation
    }

    /// Run the reducer; returns false if the event was stale
    fn dispatch(&self, event: QueryEvent) -> bool {
        let mut applied = false;
        self.inner.state.send_if_modified(|state| match reduce(state, event) {
            Some(next) => {
                applied = true;
                let changed = next != *state;
                *state = next;
                changed
            }
            None => false,
        });
        applied
    }

    // ========================================================================
    // Starting queries (synchronous transition to Loading)
    // ========================================================================

    /// Start a name query
    ///
    /// Empty or whitespace-only input is ignored: no transition, `None`.
    pub fn start_name_query(&self, raw_query: &str) -> Option<QueryTicket> {
        let query = raw_query.trim();
        if query.is_empty() {
            debug!("Ignoring empty name query");
            return None;
        }

        let generation = self.advance(|generation| QueryEvent::NameQueryStarted { generation });
        self.emit_started(generation, QueryKind::Name);

        info!(generation, query = %query, "Name query started");

        Some(QueryTicket {
            generation,
            request: QueryRequest::Name(query.to_string()),
        })
    }

    /// Start an audio query with the first of `files`
    ///
    /// The file name is visible in the state immediately, before the upload
    /// completes. No file → `None`, no transition.
    pub fn start_audio_query(&self, files: Vec<AudioUpload>) -> Option<QueryTicket> {
        let ignored = files.len().saturating_sub(1);
        let Some(upload) = files.into_iter().next() else {
            debug!("Ignoring audio query without a file");
            return None;
        };

        if ignored > 0 {
            debug!(ignored, "Multiple files selected, using only the first");
        }

        let file_name = upload.file_name.clone();
        let generation = self.advance(|generation| QueryEvent::AudioQueryStarted {
            generation,
            file_name,
        });
        self.emit_started(generation, QueryKind::Audio);

        info!(generation, file = %upload.file_name, size = upload.bytes.len(), "Audio query started");

        Some(QueryTicket {
            generation,
            request: QueryRequest::Audio(upload),
        })
    }

    // ========================================================================
    // Running queries (network call + settlement)
    // ========================================================================

    /// Call the backend for a started query and settle the state
    pub async fn run(&self, ticket: QueryTicket) -> QueryOutcome {
        let QueryTicket {
            generation,
            request,
        } = ticket;

        let (event, outcome) = match request {
            QueryRequest::Name(query) => match self.inner.backend.search_by_name(&query).await {
                Ok(result) => (
                    QueryEvent::NameQuerySucceeded {
                        generation,
                        recommendations: result.recommendations.clone(),
                    },
                    QueryOutcome::Succeeded {
                        generation,
                        recommendations: result.recommendations,
                    },
                ),
                Err(e) => {
                    warn!(generation, query = %query, error = %e, "Name query failed");
                    let message = e.user_message(EndpointFamily::Metadata);
                    (
                        QueryEvent::QueryFailed {
                            generation,
                            message: message.clone(),
                        },
                        QueryOutcome::Failed {
                            generation,
                            message,
                        },
                    )
                }
            },

            QueryRequest::Audio(upload) => {
                let file_name = upload.file_name.clone();
                match self.inner.backend.search_by_audio(upload).await {
                    Ok(result) => (
                        QueryEvent::AudioQuerySucceeded {
                            generation,
                            recommendations: result.recommendations.clone(),
                            features: result.query_audio_features,
                        },
                        QueryOutcome::Succeeded {
                            generation,
                            recommendations: result.recommendations,
                        },
                    ),
                    Err(e) => {
                        warn!(generation, file = %file_name, error = %e, "Audio query failed");
                        let message = e.user_message(EndpointFamily::Audio);
                        (
                            QueryEvent::QueryFailed {
                                generation,
                                message: message.clone(),
                            },
                            QueryOutcome::Failed {
                                generation,
                                message,
                            },
                        )
                    }
                }
            }
        };

        self.settle(event, outcome)
    }

    fn settle(&self, event: QueryEvent, outcome: QueryOutcome) -> QueryOutcome {
        let generation = outcome.generation();

        if !self.dispatch(event) {
            debug!(
                generation,
                latest = self.latest_generation(),
                "Discarding result of superseded query"
            );
            self.inner.event_bus.emit_lossy(ImdEvent::StaleResultDiscarded {
                generation,
                timestamp: Utc::now(),
            });
            return QueryOutcome::Superseded { generation };
        }

        let (status, song_count) = match &outcome {
            QueryOutcome::Succeeded {
                recommendations, ..
            } => (RequestStatus::Succeeded, recommendations.len()),
            _ => (RequestStatus::Failed, 0),
        };

        self.inner.event_bus.emit_lossy(ImdEvent::QuerySettled {
            generation,
            status,
            song_count,
            timestamp: Utc::now(),
        });

        outcome
    }

    /// Start and run a name query; `None` if the input was empty
    pub async fn submit_name_query(&self, raw_query: &str) -> Option<QueryOutcome> {
        let ticket = self.start_name_query(raw_query)?;
        Some(self.run(ticket).await)
    }

    /// Start and run an audio query; `None` if no file was given
    pub async fn submit_audio_query(&self, files: Vec<AudioUpload>) -> Option<QueryOutcome> {
        let ticket = self.start_audio_query(files)?;
        Some(self.run(ticket).await)
    }

    /// Reset to the initial state; in-flight queries become superseded
    pub fn clear(&self) {
        self.advance(|_| QueryEvent::Cleared);
        self.inner
            .event_bus
            .emit_lossy(ImdEvent::RecommendationsCleared {
                timestamp: Utc::now(),
            });
        info!("Recommendations cleared");
    }

    fn emit_started(&self, generation: u64, kind: QueryKind) {
        self.inner.event_bus.emit_lossy(ImdEvent::QueryStarted {
            generation,
            kind,
            timestamp: Utc::now(),
        });
    }
}
