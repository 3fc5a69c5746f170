//! # IMD Common Library
//!
//! Shared code for the Intelligent Music Discovery client crates:
//! - Song, recommendation and audio-feature models (backend wire format)
//! - Event types and the EventBus
//! - Configuration resolution (CLI → ENV → TOML → default)
//! - Common error type

pub mod config;
pub mod error;
pub mod events;
pub mod models;

pub use error::{Error, Result};
pub use models::{AudioFeatures, RecommendedSong, RequestStatus, SongInfo};
