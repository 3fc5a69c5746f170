//! Recommendation request state machine
//!
//! Idle → Loading → Succeeded / Failed, with clear back to Idle. The latest
//! *started* query owns the state; results of superseded queries are dropped.

mod state;
mod store;

pub use state::{reduce, QueryEvent, RequestState};
pub use store::{QueryOutcome, QueryTicket, RecommendationStore};
