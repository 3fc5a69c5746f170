//! Data model shared between the backend wire format and the client
//!
//! All recommendation computation and feature extraction happen in the
//! backend. These types mirror its JSON payloads and add the small amount of
//! validation and derived data the client needs for display.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};

// ============================================================================
// Songs
// ============================================================================

/// Library entry as returned by `GET /songs`
///
/// Identity is the (track, artist) pair; there is no numeric ID.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SongInfo {
    /// Track title
    pub track_name: String,
    /// Artist display name
    pub artist_name: String,
}

impl SongInfo {
    pub fn new(track_name: impl Into<String>, artist_name: impl Into<String>) -> Self {
        Self {
            track_name: track_name.into(),
            artist_name: artist_name.into(),
        }
    }
}

/// Recommended track in a result set
///
/// The backend normally provides `rank` (1-based, ascending, unique within a
/// result set). Name-based results carry no `similarity_score`. Both are
/// optional here so partial entries deserialize and the presentation layer
/// can fall back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendedSong {
    /// Position in the result list (1-based)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rank: Option<u32>,
    /// Track title
    pub track_name: String,
    /// Artist display name
    pub artist_name: String,
    /// Similarity to the query (expected range 0.0-1.0)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub similarity_score: Option<f64>,
    /// Genre label
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub genre: Option<String>,
}

impl RecommendedSong {
    /// Identity of the recommended track
    pub fn song_info(&self) -> SongInfo {
        SongInfo::new(self.track_name.clone(), self.artist_name.clone())
    }

    /// Rank to display, falling back to the 0-based presentation position
    pub fn display_rank(&self, position: usize) -> u32 {
        self.rank
            .unwrap_or_else(|| u32::try_from(position + 1).unwrap_or(u32::MAX))
    }

    /// Similarity expressed as a percentage, if the backend sent one
    pub fn match_percent(&self) -> Option<f64> {
        self.similarity_score.map(|score| score * 100.0)
    }
}

// ============================================================================
// Audio features
// ============================================================================

/// Pitch-class labels in chroma order
pub const PITCH_CLASSES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// Features the backend extracted from an uploaded audio file
///
/// Attached to the query, never to individual songs. `chroma` is fixed at 12
/// entries by its type, so a payload with a different length fails to
/// deserialize instead of reaching the UI half-formed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioFeatures {
    /// Tempo in beats per minute
    pub tempo: f64,
    /// Spectral centroid in Hz (brightness / timbre)
    pub spectral_centroid: f64,
    /// Root-mean-square energy
    pub rms_energy: f64,
    /// Pitch-class strengths, C..B
    pub chroma: [f64; 12],
    /// Mel-frequency cepstral coefficients
    #[serde(default)]
    pub mfccs: Vec<f64>,
}

impl AudioFeatures {
    /// Reject physically meaningless values
    pub fn validate(&self) -> Result<()> {
        let scalars = [
            ("tempo", self.tempo),
            ("spectral_centroid", self.spectral_centroid),
            ("rms_energy", self.rms_energy),
        ];

        for (name, value) in scalars {
            if !value.is_finite() || value < 0.0 {
                return Err(Error::InvalidInput(format!(
                    "{} must be a non-negative number, got {}",
                    name, value
                )));
            }
        }

        if let Some(bad) = self.chroma.iter().find(|v| !v.is_finite()) {
            return Err(Error::InvalidInput(format!("chroma contains {}", bad)));
        }

        Ok(())
    }

    /// Chroma strengths paired with their pitch-class label
    pub fn chroma_profile(&self) -> impl Iterator<Item = (&'static str, f64)> + '_ {
        PITCH_CLASSES.iter().copied().zip(self.chroma.iter().copied())
    }

    /// Strongest pitch class (first wins on ties)
    pub fn dominant_pitch_class(&self) -> &'static str {
        let mut best = 0;
        for (i, value) in self.chroma.iter().enumerate() {
            if *value > self.chroma[best] {
                best = i;
            }
        }
        PITCH_CLASSES[best]
    }
}

// ============================================================================
// Request lifecycle
// ============================================================================

/// Lifecycle status of the latest recommendation query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    #[default]
    Idle,
    Loading,
    Succeeded,
    Failed,
}

/// How a recommendation query was issued
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryKind {
    /// Search by song name
    Name,
    /// Search by uploaded audio
    Audio,
}

// ============================================================================
// Wire payloads
// ============================================================================

/// Body of `POST /recommend/metadata`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetadataRecommendationRequest {
    pub song_name: String,
}

/// Response of `POST /recommend/metadata`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetadataRecommendations {
    pub recommendations: Vec<RecommendedSong>,
}

/// Response of `POST /recommend/audio`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioRecommendations {
    pub recommendations: Vec<RecommendedSong>,
    pub query_audio_features: AudioFeatures,
}

/// Error body returned with non-2xx responses
///
/// Only a string `detail` is surfaced to users; validation errors carry a
/// structured list there, which is ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub detail: Option<serde_json::Value>,
}

impl ErrorBody {
    /// String detail exactly as sent, if present and non-empty
    pub fn detail_message(&self) -> Option<String> {
        self.detail
            .as_ref()
            .and_then(|d| d.as_str())
            .filter(|d| !d.is_empty())
            .map(str::to_string)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn features() -> AudioFeatures {
        AudioFeatures {
            tempo: 120.0,
            spectral_centroid: 1500.0,
            rms_energy: 0.12,
            chroma: [0.1, 0.2, 0.9, 0.1, 0.3, 0.2, 0.1, 0.4, 0.1, 0.5, 0.1, 0.2],
            mfccs: vec![-200.0, 50.0],
        }
    }

    #[test]
    fn test_name_result_without_score_deserializes() {
        let json = r#"{"rank": 1, "track_name": "Song A", "artist_name": "Artist X"}"#;
        let song: RecommendedSong = serde_json::from_str(json).unwrap();

        assert_eq!(song.rank, Some(1));
        assert!(song.similarity_score.is_none());
        assert!(song.genre.is_none());
        assert!(song.match_percent().is_none());
    }

    #[test]
    fn test_display_rank_falls_back_to_position() {
        let json = r#"{"track_name": "Song A", "artist_name": "Artist X"}"#;
        let song: RecommendedSong = serde_json::from_str(json).unwrap();

        assert_eq!(song.display_rank(0), 1);
        assert_eq!(song.display_rank(4), 5);

        let ranked = RecommendedSong { rank: Some(7), ..song };
        assert_eq!(ranked.display_rank(0), 7);
    }

    #[test]
    fn test_chroma_must_have_twelve_entries() {
        let json = r#"{
            "tempo": 120.0, "spectral_centroid": 1500.0, "rms_energy": 0.1,
            "chroma": [0.1, 0.2, 0.3], "mfccs": []
        }"#;
        assert!(serde_json::from_str::<AudioFeatures>(json).is_err());
    }

    #[test]
    fn test_missing_mfccs_defaults_to_empty() {
        let json = r#"{
            "tempo": 98.5, "spectral_centroid": 2100.0, "rms_energy": 0.2,
            "chroma": [0,0,0,0,0,0,0,0,0,0,0,1]
        }"#;
        let parsed: AudioFeatures = serde_json::from_str(json).unwrap();
        assert!(parsed.mfccs.is_empty());
        assert_eq!(parsed.dominant_pitch_class(), "B");
    }

    #[test]
    fn test_validate_rejects_negative_tempo() {
        let mut f = features();
        assert!(f.validate().is_ok());

        f.tempo = -1.0;
        assert!(matches!(f.validate(), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_chroma_profile_labels() {
        let f = features();
        let profile: Vec<_> = f.chroma_profile().collect();

        assert_eq!(profile.len(), 12);
        assert_eq!(profile[0], ("C", 0.1));
        assert_eq!(profile[2], ("D", 0.9));
        assert_eq!(f.dominant_pitch_class(), "D");
    }

    #[test]
    fn test_error_body_detail() {
        let body: ErrorBody = serde_json::from_str(r#"{"detail": "Song not found"}"#).unwrap();
        assert_eq!(body.detail_message().as_deref(), Some("Song not found"));

        let structured: ErrorBody =
            serde_json::from_str(r#"{"detail": [{"loc": ["body"], "msg": "field required"}]}"#)
                .unwrap();
        assert!(structured.detail_message().is_none());

        let empty: ErrorBody = serde_json::from_str("{}").unwrap();
        assert!(empty.detail_message().is_none());

        let blank: ErrorBody = serde_json::from_str(r#"{"detail": ""}"#).unwrap();
        assert!(blank.detail_message().is_none());
    }

    #[test]
    fn test_error_body_detail_is_not_trimmed() {
        let body: ErrorBody =
            serde_json::from_str(r#"{"detail": "  Song 'xyz' not found\n"}"#).unwrap();
        assert_eq!(
            body.detail_message().as_deref(),
            Some("  Song 'xyz' not found\n")
        );
    }

    #[test]
    fn test_request_status_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&RequestStatus::Succeeded).unwrap(),
            "\"succeeded\""
        );
        assert_eq!(RequestStatus::default(), RequestStatus::Idle);
    }
}
