//! Backend call errors and the user-facing message policy

use thiserror::Error;

/// Backend client errors
#[derive(Debug, Error)]
pub enum ApiError {
    /// Connection, timeout or transport failure (no response body)
    #[error("Network error: {0}")]
    Network(String),

    /// Backend answered with a non-2xx status
    #[error("Backend error {status}: {}", detail.as_deref().unwrap_or("no detail"))]
    Backend {
        /// HTTP status code
        status: u16,
        /// String `detail` field of the error body, if any
        detail: Option<String>,
    },

    /// 2xx response whose body does not match the expected shape
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// Request could not be built (bad URL, bad MIME type)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

/// Endpoint groups sharing a fallback error message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndpointFamily {
    /// `GET /songs`
    Library,
    /// `POST /recommend/metadata`
    Metadata,
    /// `POST /recommend/audio`
    Audio,
}

impl EndpointFamily {
    /// Fixed message used when the backend gives no usable detail
    pub fn fallback_message(self) -> &'static str {
        match self {
            EndpointFamily::Library => "Failed to load song library",
            EndpointFamily::Metadata => "Failed to fetch recommendations",
            EndpointFamily::Audio => "Failed to process audio file",
        }
    }
}

impl ApiError {
    /// Message shown to the user
    ///
    /// The backend's `detail` wins; anything else (network failure, malformed
    /// payload, error body without detail) gets the family's fixed string.
    pub fn user_message(&self, family: EndpointFamily) -> String {
        match self {
            ApiError::Backend {
                detail: Some(detail),
                ..
            } => detail.clone(),
            _ => family.fallback_message().to_string(),
        }
    }
}
