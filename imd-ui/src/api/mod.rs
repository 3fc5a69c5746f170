//! Recommendation backend access
//!
//! Three calls, each a single HTTP request:
//! - `GET /songs` - full song library
//! - `POST /recommend/metadata` - recommendations by song name
//! - `POST /recommend/audio` - recommendations by uploaded audio (multipart)
//!
//! The store, the library cache and the tests talk to the backend only
//! through [`RecommendationBackend`].

mod client;
mod error;
mod upload;

pub use client::ApiClient;
pub use error::{ApiError, EndpointFamily};
pub use upload::{AudioUpload, ACCEPTED_EXTENSIONS};

use async_trait::async_trait;
use imd_common::models::{AudioRecommendations, MetadataRecommendations};
use imd_common::SongInfo;

/// Recommendation backend operations
///
/// No retries and no caching at this level; callers decide fallbacks.
#[async_trait]
pub trait RecommendationBackend: Send + Sync {
    /// Full song library, in backend order
    async fn list_songs(&self) -> Result<Vec<SongInfo>, ApiError>;

    /// Recommendations for a song name
    async fn search_by_name(&self, song_name: &str) -> Result<MetadataRecommendations, ApiError>;

    /// Recommendations and extracted features for an audio file
    async fn search_by_audio(&self, upload: AudioUpload) -> Result<AudioRecommendations, ApiError>;
}
