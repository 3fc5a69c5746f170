//! Text rendering for the terminal front-end
//!
//! Every function here is pure: it takes state and returns the text to show.
//! Printing is left to the caller.

use crate::recommendations::RequestState;
use imd_common::{RecommendedSong, RequestStatus, SongInfo};
use std::fmt::Write as _;
use std::time::Duration;

/// Width of chroma and progress bars, in characters
const BAR_WIDTH: usize = 24;

/// Expected audio analysis time
const ESTIMATED_ANALYSIS: Duration = Duration::from_secs(10);

// ============================================================================
// Recommendations
// ============================================================================

/// Recommendations panel body
pub fn results_panel(state: &RequestState) -> String {
    match state.status {
        RequestStatus::Idle => "Ready to discover music?".to_string(),
        RequestStatus::Loading => "Finding matches...".to_string(),
        RequestStatus::Failed => format!("Error: {}", state.error.as_deref().unwrap_or_default()),
        RequestStatus::Succeeded if state.songs.is_empty() => "No matches found".to_string(),
        RequestStatus::Succeeded => {
            let mut out = String::new();
            for (position, song) in state.songs.iter().enumerate() {
                let _ = writeln!(out, "{}", recommendation_row(song, position));
            }
            out.trim_end().to_string()
        }
    }
}

/// One row of the recommendations list
///
/// Missing rank falls back to the position; missing score drops the badge.
pub fn recommendation_row(song: &RecommendedSong, position: usize) -> String {
    let mut row = format!(
        "{:>2}. {} - {}",
        song.display_rank(position),
        song.track_name,
        song.artist_name
    );
    if let Some(percent) = song.match_percent() {
        let _ = write!(row, "  [{:.0}% match]", percent);
    }
    if let Some(genre) = song.genre.as_deref().filter(|g| !g.is_empty()) {
        let _ = write!(row, "  ({})", genre);
    }
    row
}

/// Recommendations panel heading
pub fn recommendations_title(now_playing: Option<&SongInfo>) -> String {
    match now_playing {
        Some(song) => format!("Top Recommendations for \"{}\"", song.track_name),
        None => "Top 10 Recommendations".to_string(),
    }
}

// ============================================================================
// Audio analysis
// ============================================================================

/// Features panel for the last audio query
///
/// `None` unless both the file name and the extracted features are known.
pub fn analysis_panel(state: &RequestState) -> Option<String> {
    let file_name = state.query_file_name.as_deref()?;
    let features = state.query_audio_features.as_ref()?;

    let mut out = String::new();
    let _ = writeln!(out, "Audio Features  [{}]", file_name);
    let _ = writeln!(
        out,
        "  Tempo: {:.1} BPM   Energy: {:.3}   Timbre: {:.0} Hz",
        features.tempo, features.rms_energy, features.spectral_centroid
    );
    let _ = writeln!(
        out,
        "  Chroma Profile (dominant: {})",
        features.dominant_pitch_class()
    );

    let peak = features.chroma.iter().copied().fold(0.0_f64, f64::max);
    for (label, value) in features.chroma_profile() {
        let _ = writeln!(
            out,
            "  {:<2} {:<width$} {:.2}",
            label,
            bar(if peak > 0.0 { value / peak } else { 0.0 }),
            value,
            width = BAR_WIDTH
        );
    }

    Some(out.trim_end().to_string())
}

/// Estimated analysis progress in percent
///
/// Linear to 80 % over the first 80 % of the estimate, then 15 more points
/// over the following 70 %, then held at 95 % until the result arrives.
pub fn estimated_progress(elapsed: Duration) -> f64 {
    let elapsed = elapsed.as_secs_f64();
    let estimate = ESTIMATED_ANALYSIS.as_secs_f64();

    let progress = if elapsed < estimate * 0.8 {
        elapsed / estimate * 80.0
    } else if elapsed < estimate * 1.5 {
        80.0 + (elapsed - estimate * 0.8) / (estimate * 0.7) * 15.0
    } else {
        95.0
    };
    progress.min(95.0)
}

/// Single progress line, suitable for redrawing in place
pub fn progress_line(progress: f64) -> String {
    format!(
        "Processing audio file {} {:>3.0}%",
        bar(progress / 100.0),
        progress.round()
    )
}

/// Panel shown while an upload is being analyzed
pub fn analyzing_panel(progress: f64) -> String {
    format!("Analyzing Audio Features\n  {}", progress_line(progress))
}

// ============================================================================
// Library
// ============================================================================

/// What the library panel has to show
#[derive(Debug, Clone, PartialEq)]
pub enum LibraryListing<'a> {
    /// Listing not fetched yet
    Loading,
    /// Listing fetch failed
    Failed,
    /// Entries left after filtering
    Ready(Vec<&'a SongInfo>),
}

/// Library panel: heading plus entries or a status line
pub fn library_panel(listing: &LibraryListing<'_>, raw_query: &str) -> String {
    let count = match listing {
        LibraryListing::Ready(songs) => songs.len(),
        _ => 0,
    };

    let mut out = format!("YOUR LIBRARY ({})\n", group_thousands(count));
    match listing {
        LibraryListing::Loading => out.push_str("Loading library..."),
        LibraryListing::Failed => out.push_str("Error loading songs"),
        LibraryListing::Ready(songs) if songs.is_empty() => {
            if raw_query.is_empty() {
                out.push_str("No songs available");
            } else {
                let _ = write!(out, "No songs found for \"{}\"", raw_query);
            }
        }
        LibraryListing::Ready(songs) => {
            for song in songs {
                let _ = writeln!(out, "  {}", song_line(song));
            }
        }
    }
    out.trim_end().to_string()
}

/// Search box suggestions, numbered for selection
pub fn suggestions(songs: &[&SongInfo]) -> String {
    songs
        .iter()
        .enumerate()
        .map(|(i, song)| format!("  {}) {}", i + 1, song_line(song)))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Now-playing bar, if something is selected
pub fn now_playing_bar(song: Option<&SongInfo>) -> Option<String> {
    song.map(|song| format!("Now playing: {}", song_line(song)))
}

fn song_line(song: &SongInfo) -> String {
    format!("{} - {}", song.track_name, song.artist_name)
}

fn bar(fraction: f64) -> String {
    let fraction = if fraction.is_finite() {
        fraction.clamp(0.0, 1.0)
    } else {
        0.0
    };
    let filled = (fraction * BAR_WIDTH as f64).round() as usize;
    format!("{}{}", "#".repeat(filled), ".".repeat(BAR_WIDTH - filled))
}

fn group_thousands(n: usize) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}
