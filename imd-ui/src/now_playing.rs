//! "Now playing" selection
//!
//! The highlighted song shown in the now-playing bar and used as the target
//! of the web-search play action. It is derived from how the most recent
//! query settled; a superseded query never touches it.

use crate::api::ApiError;
use crate::recommendations::QueryOutcome;
use imd_common::SongInfo;
use reqwest::Url;

/// Artist shown when a name query produced nothing to highlight
pub const UNKNOWN_ARTIST: &str = "Unknown Artist";

/// Artist shown for an uploaded file
pub const UPLOADED_AUDIO_ARTIST: &str = "Uploaded Audio";

const WEB_SEARCH_BASE: &str = "https://www.youtube.com/results";

/// Selection after a name query settled
///
/// `None` means "leave the selection alone" (the query was superseded).
pub fn after_name_query(query: &str, outcome: &QueryOutcome) -> Option<SongInfo> {
    match outcome {
        QueryOutcome::Superseded { .. } => None,
        QueryOutcome::Succeeded {
            recommendations, ..
        } if !recommendations.is_empty() => Some(recommendations[0].song_info()),
        _ => Some(SongInfo::new(query.trim(), UNKNOWN_ARTIST)),
    }
}

/// Selection after an audio query settled
///
/// Success and failure alike highlight the uploaded file.
pub fn after_audio_query(file_name: &str, outcome: &QueryOutcome) -> Option<SongInfo> {
    if outcome.is_superseded() {
        return None;
    }
    Some(SongInfo::new(file_name, UPLOADED_AUDIO_ARTIST))
}

fn is_uploaded_audio(song: &SongInfo) -> bool {
    song.artist_name
        .trim()
        .eq_ignore_ascii_case(UPLOADED_AUDIO_ARTIST)
}

/// Text searched for when playing a song
///
/// Uploaded files search by file name stem only; "Uploaded Audio" is not a
/// real artist.
pub fn web_search_text(song: &SongInfo) -> String {
    if is_uploaded_audio(song) {
        let stem = song.track_name.split('.').next().unwrap_or_default();
        return stem.trim().to_string();
    }
    format!("{} {}", song.track_name, song.artist_name)
}

/// Web search results page for a song
pub fn web_search_url(song: &SongInfo) -> Result<Url, ApiError> {
    Url::parse_with_params(WEB_SEARCH_BASE, &[("search_query", web_search_text(song))])
        .map_err(|e| ApiError::InvalidRequest(format!("web search URL: {}", e)))
}
