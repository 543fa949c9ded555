//! Highlight report handed to downstream persistence
//!
//! Record shape is stable: a moment without a recognized song carries the
//! sentinel title [`UNKNOWN_TITLE`] and an empty artist instead of omitting
//! fields.

use crate::error::AnalysisResult;
use crate::models::{HighlightMoment, ValidAudioRange};
use crate::services::MergeStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use uuid::Uuid;

pub use crate::models::UNKNOWN_TITLE;

/// One reported highlight
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HighlightRecord {
    /// Seconds from the start of the merged session timeline
    pub timestamp: f64,
    pub title: String,
    pub artist: String,
    pub user_bpm: u32,
    pub music_bpm: u32,
    pub average_db: f64,
    pub score: f64,
}

impl From<&HighlightMoment> for HighlightRecord {
    fn from(moment: &HighlightMoment) -> Self {
        let artist = moment
            .song
            .as_ref()
            .map(|song| song.artist.clone())
            .unwrap_or_default();

        Self {
            timestamp: moment.timestamp,
            title: moment.display_title().to_string(),
            artist,
            user_bpm: moment.user_bpm,
            music_bpm: moment.music_bpm,
            average_db: moment.average_db,
            score: moment.peak_score,
        }
    }
}

/// Result of one analysis run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HighlightReport {
    pub session_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub total_duration_secs: f64,
    /// Spans of real audio; empty when the timeline was never reconciled
    pub valid_ranges: Vec<ValidAudioRange>,
    pub merge_status: MergeStatus,
    /// Non-fatal problems the caller may want to show the user
    pub warnings: Vec<String>,
    /// Report order: `score` descending
    pub moments: Vec<HighlightRecord>,
}

impl HighlightReport {
    pub fn new(
        session_id: Uuid,
        total_duration_secs: f64,
        valid_ranges: &[ValidAudioRange],
        merge_status: MergeStatus,
        warnings: Vec<String>,
        moments: &[HighlightMoment],
    ) -> Self {
        Self {
            session_id,
            generated_at: Utc::now(),
            total_duration_secs,
            // The unbounded sentinel has no JSON representation
            valid_ranges: valid_ranges
                .iter()
                .copied()
                .filter(|range| !range.is_unbounded())
                .collect(),
            merge_status,
            warnings,
            moments: moments.iter().map(HighlightRecord::from).collect(),
        }
    }

    /// Moments in timeline order, for display
    pub fn display_order(&self) -> Vec<&HighlightRecord> {
        let mut ordered: Vec<&HighlightRecord> = self.moments.iter().collect();
        ordered.sort_by(|a, b| a.timestamp.total_cmp(&b.timestamp));
        ordered
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Write the report as pretty JSON
    pub fn write_json(&self, path: &Path) -> AnalysisResult<()> {
        let json = self
            .to_json_pretty()
            .map_err(|e| partypower_common::Error::Internal(format!("Report serialization failed: {}", e)))?;
        std::fs::write(path, json)?;
        Ok(())
    }
}
