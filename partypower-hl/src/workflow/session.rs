//! Captured session directory layout
//!
//! A session directory holds one sensor log (`*.csv`) and any number of audio
//! segments whose file names end in the segment's start timestamp.

use crate::error::{AnalysisError, AnalysisResult};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Audio containers accepted as session segments
pub const AUDIO_EXTENSIONS: &[&str] = &["wav", "m4a", "mp3", "flac", "aac", "ogg", "caf"];

/// Preferred sensor log name when a directory holds several CSV files
pub const SENSOR_LOG_NAME: &str = "sensors.csv";

/// Files making up one captured session
#[derive(Debug, Clone, PartialEq)]
pub struct SessionInputs {
    pub sensor_log: PathBuf,
    /// Sorted by file name
    pub audio_segments: Vec<PathBuf>,
}

fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)))
        .unwrap_or(false)
}

impl SessionInputs {
    /// Locate the sensor log and audio segments in `dir`
    pub fn discover(dir: &Path) -> AnalysisResult<Self> {
        let mut csv_files = Vec::new();
        let mut audio_segments = Vec::new();

        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            if !path.is_file() {
                continue;
            }
            if has_extension(&path, &["csv"]) {
                csv_files.push(path);
            } else if has_extension(&path, AUDIO_EXTENSIONS) {
                audio_segments.push(path);
            }
        }

        csv_files.sort();
        audio_segments.sort();

        let sensor_log = csv_files
            .iter()
            .find(|p| p.file_name().and_then(|n| n.to_str()) == Some(SENSOR_LOG_NAME))
            .or_else(|| csv_files.first())
            .cloned()
            .ok_or_else(|| {
                AnalysisError::SensorLog(format!("No sensor log found in {}", dir.display()))
            })?;

        debug!(
            dir = %dir.display(),
            sensor_log = %sensor_log.display(),
            segments = audio_segments.len(),
            "Session inputs discovered"
        );

        Ok(Self {
            sensor_log,
            audio_segments,
        })
    }
}
