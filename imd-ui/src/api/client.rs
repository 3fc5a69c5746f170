//! HTTP client for the recommendation backend

use super::{ApiError, AudioUpload, RecommendationBackend};
use async_trait::async_trait;
use imd_common::models::{
    AudioRecommendations, ErrorBody, MetadataRecommendationRequest, MetadataRecommendations,
};
use imd_common::SongInfo;
use reqwest::multipart::{Form, Part};
use serde::de::DeserializeOwned;

const USER_AGENT: &str = concat!("imd/", env!("CARGO_PKG_VERSION"));

/// Recommendation backend client
///
/// No explicit timeout: requests use the HTTP client defaults.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http_client: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    /// Create a client for `base_url` (e.g. `http://127.0.0.1:8000/api/v1`)
    pub fn new(base_url: impl Into<String>) -> Result<Self, ApiError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| ApiError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Base URL without trailing slash
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Map a response to a payload or an [`ApiError`]
    ///
    /// Non-2xx: the body is parsed for a string `detail`. 2xx: the body must
    /// deserialize into `T`, otherwise the payload is malformed.
    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ApiError> {
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        if !status.is_success() {
            let detail = serde_json::from_str::<ErrorBody>(&body)
                .ok()
                .and_then(|b| b.detail_message());

            tracing::warn!(
                status = status.as_u16(),
                detail = ?detail,
                "Backend returned error response"
            );

            return Err(ApiError::Backend {
                status: status.as_u16(),
                detail,
            });
        }

        serde_json::from_str(&body).map_err(|e| ApiError::MalformedResponse(e.to_string()))
    }
}

#[async_trait]
impl RecommendationBackend for ApiClient {
    async fn list_songs(&self) -> Result<Vec<SongInfo>, ApiError> {
        let url = self.endpoint("/songs");
        tracing::debug!(url = %url, "Fetching song library");

        let response = self
            .http_client
            .get(&url)
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        let songs: Vec<SongInfo> = Self::decode(response).await?;

        tracing::info!(song_count = songs.len(), "Song library fetched");
        Ok(songs)
    }

    async fn search_by_name(&self, song_name: &str) -> Result<MetadataRecommendations, ApiError> {
        let url = self.endpoint("/recommend/metadata");
        tracing::debug!(url = %url, song_name = %song_name, "Requesting recommendations by name");

        let response = self
            .http_client
            .post(&url)
            .json(&MetadataRecommendationRequest {
                song_name: song_name.to_string(),
            })
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        let result: MetadataRecommendations = Self::decode(response).await?;

        tracing::info!(
            song_name = %song_name,
            count = result.recommendations.len(),
            "Name recommendations received"
        );
        Ok(result)
    }

    async fn search_by_audio(&self, upload: AudioUpload) -> Result<AudioRecommendations, ApiError> {
        let url = self.endpoint("/recommend/audio");
        let mime = upload.mime_type();
        let file_name = upload.file_name.clone();
        let size = upload.bytes.len();

        tracing::debug!(url = %url, file = %file_name, size, mime, "Uploading audio for recommendations");

        let part = Part::bytes(upload.bytes)
            .file_name(upload.file_name)
            .mime_str(mime)
            .map_err(|e| ApiError::InvalidRequest(e.to_string()))?;
        let form = Form::new().part("file", part);

        let response = self
            .http_client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        let result: AudioRecommendations = Self::decode(response).await?;

        result
            .query_audio_features
            .validate()
            .map_err(|e| ApiError::MalformedResponse(e.to_string()))?;

        tracing::info!(
            file = %file_name,
            count = result.recommendations.len(),
            tempo = result.query_audio_features.tempo,
            "Audio recommendations received"
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = ApiClient::new("http://127.0.0.1:8000/api/v1/");
        assert!(client.is_ok());
        assert_eq!(client.unwrap().base_url(), "http://127.0.0.1:8000/api/v1");
    }

    #[test]
    fn test_endpoint_join() {
        let client = ApiClient::new("http://localhost:8000/api/v1").unwrap();
        assert_eq!(
            client.endpoint("/recommend/metadata"),
            "http://localhost:8000/api/v1/recommend/metadata"
        );
    }
}
