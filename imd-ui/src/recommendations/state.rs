//! Request state and its reducer
//!
//! `reduce` is the only way state changes. It is pure: given the current
//! state and an event it returns the next state, or `None` when the event is
//! a settlement for a query that is no longer the latest one started.

use imd_common::models::QueryKind;
use imd_common::{AudioFeatures, RecommendedSong, RequestStatus};

/// Query that has started and not yet settled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct InFlight {
    generation: u64,
    kind: QueryKind,
}

/// State of the latest recommendation query
///
/// `RequestState::default()` is the initial shape (Idle, nothing loaded).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RequestState {
    /// Lifecycle status
    pub status: RequestStatus,
    /// Recommendations, in server order (meaningful when Succeeded)
    pub songs: Vec<RecommendedSong>,
    /// Failure message (meaningful when Failed)
    pub error: Option<String>,
    /// Uploaded file name (audio queries only, set as soon as they start)
    pub query_file_name: Option<String>,
    /// Extracted features (audio queries only, once Succeeded)
    pub query_audio_features: Option<AudioFeatures>,
    in_flight: Option<InFlight>,
}

impl RequestState {
    /// Generation of the query currently awaited, if any
    pub fn in_flight_generation(&self) -> Option<u64> {
        self.in_flight.map(|f| f.generation)
    }

    /// Kind of the query currently awaited, if any
    pub fn in_flight_kind(&self) -> Option<QueryKind> {
        self.in_flight.map(|f| f.kind)
    }

    /// True while an uploaded file is being analyzed
    pub fn is_analyzing_audio(&self) -> bool {
        self.status == RequestStatus::Loading && self.in_flight_kind() == Some(QueryKind::Audio)
    }

    fn accepts(&self, generation: u64, kind: QueryKind) -> bool {
        self.in_flight == Some(InFlight { generation, kind })
    }

    /// A start older than the query in flight never replaces it
    fn is_older_start(&self, generation: u64) -> bool {
        self.in_flight_generation()
            .is_some_and(|current| generation <= current)
    }
}

/// Events driving the request state machine
#[derive(Debug, Clone, PartialEq)]
pub enum QueryEvent {
    /// Name query submitted
    NameQueryStarted { generation: u64 },

    /// Audio query submitted
    AudioQueryStarted { generation: u64, file_name: String },

    /// Name query resolved
    NameQuerySucceeded {
        generation: u64,
        recommendations: Vec<RecommendedSong>,
    },

    /// Audio query resolved
    AudioQuerySucceeded {
        generation: u64,
        recommendations: Vec<RecommendedSong>,
        features: AudioFeatures,
    },

    /// Either query rejected
    QueryFailed { generation: u64, message: String },

    /// Explicit reset
    Cleared,
}

impl QueryEvent {
    /// Generation tag carried by the event (None for Cleared)
    pub fn generation(&self) -> Option<u64> {
        match self {
            QueryEvent::NameQueryStarted { generation }
            | QueryEvent::AudioQueryStarted { generation, .. }
            | QueryEvent::NameQuerySucceeded { generation, .. }
            | QueryEvent::AudioQuerySucceeded { generation, .. }
            | QueryEvent::QueryFailed { generation, .. } => Some(*generation),
            QueryEvent::Cleared => None,
        }
    }
}

/// Compute the next state
///
/// Starting a query moves to Loading and clears the previous cycle's output,
/// unless a query with a newer generation is already in flight. A settlement
/// applies only if its generation is the one in flight. Anything else is
/// stale and `None` is returned.
pub fn reduce(state: &RequestState, event: QueryEvent) -> Option<RequestState> {
    match event {
        QueryEvent::NameQueryStarted { generation } if state.is_older_start(generation) => None,
        QueryEvent::AudioQueryStarted { generation, .. } if state.is_older_start(generation) => {
            None
        }

        QueryEvent::NameQueryStarted { generation } => Some(RequestState {
            status: RequestStatus::Loading,
            in_flight: Some(InFlight {
                generation,
                kind: QueryKind::Name,
            }),
            ..RequestState::default()
        }),

        QueryEvent::AudioQueryStarted {
            generation,
            file_name,
        } => Some(RequestState {
            status: RequestStatus::Loading,
            query_file_name: Some(file_name),
            in_flight: Some(InFlight {
                generation,
                kind: QueryKind::Audio,
            }),
            ..RequestState::default()
        }),

        QueryEvent::NameQuerySucceeded {
            generation,
            recommendations,
        } => {
            if !state.accepts(generation, QueryKind::Name) {
                return None;
            }
            Some(RequestState {
                status: RequestStatus::Succeeded,
                songs: recommendations,
                ..RequestState::default()
            })
        }

        QueryEvent::AudioQuerySucceeded {
            generation,
            recommendations,
            features,
        } => {
            if !state.accepts(generation, QueryKind::Audio) {
                return None;
            }
            Some(RequestState {
                status: RequestStatus::Succeeded,
                songs: recommendations,
                query_file_name: state.query_file_name.clone(),
                query_audio_features: Some(features),
                in_flight: None,
                error: None,
            })
        }

        QueryEvent::QueryFailed {
            generation,
            message,
        } => {
            if state.in_flight_generation() != Some(generation) {
                return None;
            }
            Some(RequestState {
                status: RequestStatus::Failed,
                error: Some(message),
                query_file_name: state.query_file_name.clone(),
                ..RequestState::default()
            })
        }

        QueryEvent::Cleared => Some(RequestState::default()),
    }
}
