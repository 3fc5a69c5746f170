//! # IMD client library
//!
//! Client side of Intelligent Music Discovery: talks to the recommendation
//! backend, keeps the state of the latest recommendation query, and renders
//! it as text for the `imd` terminal front-end.
//!
//! **Architecture:** one [`session::Session`] per interaction context owns a
//! [`recommendations::RecommendationStore`] (the only writer of the request
//! state), a [`library::LibraryCache`] and the now-playing selection. Network
//! calls are the only suspension points; state transitions are synchronous.

pub mod api;
pub mod debounce;
pub mod library;
pub mod now_playing;
pub mod recommendations;
pub mod session;
pub mod view;

pub use api::{ApiClient, ApiError, AudioUpload, RecommendationBackend};
pub use recommendations::{QueryOutcome, RecommendationStore, RequestState};
pub use session::Session;
