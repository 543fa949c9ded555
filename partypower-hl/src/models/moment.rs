//! Highlight moment model

use serde::{Deserialize, Serialize};

/// Title used for moments the recognizer could not identify
pub const UNKNOWN_TITLE: &str = "Unknown";

/// Song identified by the recognition service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecognizedSong {
    pub title: String,
    /// Artist names joined by ", "
    pub artist: String,
}

/// Final unit of analysis output
///
/// Ranked by `peak_score` descending, displayed by `timestamp` ascending.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HighlightMoment {
    /// Session timeline position (seconds)
    pub timestamp: f64,
    /// `None` when recognition found no match
    pub song: Option<RecognizedSong>,
    pub peak_score: f64,
    pub user_bpm: u32,
    /// Placeholder (0) until a music tempo source is matched
    pub music_bpm: u32,
    pub average_db: f64,
}

impl HighlightMoment {
    pub fn title(&self) -> Option<&str> {
        self.song.as_ref().map(|song| song.title.as_str())
    }

    /// Title as reported, [`UNKNOWN_TITLE`] when unrecognized
    pub fn display_title(&self) -> &str {
        self.title().unwrap_or(UNKNOWN_TITLE)
    }
}
