//! Audio segment and merged timeline models

use crate::error::ExcerptError;
use crate::utils::wav_encoder;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Timestamps at or above this are epoch seconds (2001-09-09); smaller
/// values are session-relative.
pub const EPOCH_TIMESTAMP_THRESHOLD: f64 = 1.0e9;

/// One recorded audio file of a session
///
/// Capture produces a new segment each time recording is interrupted and
/// resumed (e.g. by a phone call).
#[derive(Debug, Clone, PartialEq)]
pub struct AudioSegment {
    /// Audio file on disk
    pub source: PathBuf,
    /// Recording start (epoch seconds)
    pub start_timestamp: f64,
    /// Duration in seconds
    pub duration: f64,
}

impl AudioSegment {
    pub fn new(source: impl Into<PathBuf>, start_timestamp: f64, duration: f64) -> Self {
        Self {
            source: source.into(),
            start_timestamp,
            duration,
        }
    }

    /// Whether the start is a wall-clock epoch timestamp
    pub fn has_epoch_start(&self) -> bool {
        self.start_timestamp >= EPOCH_TIMESTAMP_THRESHOLD
    }

    /// Start timestamp encoded as the trailing numeric token of the file stem
    ///
    /// `audio_1700000000.wav` → 1700000000.0, `rec-1700000123.25.m4a` → 1700000123.25
    pub fn start_timestamp_from_filename(path: &Path) -> Option<f64> {
        let stem = path.file_stem()?.to_str()?;
        let token = stem.rsplit(|c| c == '_' || c == '-').next()?;
        let value: f64 = token.parse().ok()?;
        value.is_finite().then_some(value)
    }
}

/// Session-relative span that actually contains captured audio
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValidAudioRange {
    pub start: f64,
    pub end: f64,
}

impl ValidAudioRange {
    /// Sentinel used when no reconciliation was possible at all
    pub const UNBOUNDED: ValidAudioRange = ValidAudioRange {
        start: 0.0,
        end: f64::INFINITY,
    };

    pub fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }

    /// Half-open containment: `start <= t < end`
    pub fn contains(&self, t: f64) -> bool {
        t >= self.start && t < self.end
    }

    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    pub fn is_unbounded(&self) -> bool {
        self.end.is_infinite()
    }
}

/// True when `t` falls inside any of the ranges
pub fn in_any_range(ranges: &[ValidAudioRange], t: f64) -> bool {
    ranges.iter().any(|range| range.contains(t))
}

/// Total seconds covered by (non-overlapping) ranges
pub fn covered_secs(ranges: &[ValidAudioRange]) -> f64 {
    ranges.iter().map(ValidAudioRange::duration).sum()
}

/// Merged mono PCM timeline of a session
///
/// Gaps between segments are zero-filled; only [`ValidAudioRange`]s carry
/// real audio.
#[derive(Debug, Clone)]
pub struct AudioTimeline {
    /// Mono samples in [-1.0, 1.0]
    pub samples: Vec<f32>,
    pub sample_rate: u32,
    /// Epoch seconds of timeline position 0 (earliest segment start)
    pub origin_epoch: f64,
}

impl AudioTimeline {
    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / self.sample_rate as f64
    }

    /// Encode `[start_secs, start_secs + len_secs)` as an in-memory WAV clip
    ///
    /// The end is clamped to the timeline; a start outside the timeline or an
    /// empty result is an error.
    pub fn excerpt(&self, start_secs: f64, len_secs: f64) -> Result<Vec<u8>, ExcerptError> {
        if !(start_secs.is_finite() && start_secs >= 0.0) || len_secs <= 0.0 {
            return Err(ExcerptError::OutOfRange {
                start_secs,
                duration_secs: self.duration_secs(),
            });
        }

        let rate = self.sample_rate as f64;
        let start = (start_secs * rate).round() as usize;
        let end = (((start_secs + len_secs) * rate).round() as usize).min(self.samples.len());

        if start >= end {
            return Err(ExcerptError::OutOfRange {
                start_secs,
                duration_secs: self.duration_secs(),
            });
        }

        wav_encoder::encode_wav_bytes(&self.samples[start..end], self.sample_rate)
            .map_err(|e| ExcerptError::Encode(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_timestamp_from_filename() {
        assert_eq!(
            AudioSegment::start_timestamp_from_filename(Path::new("/s/audio_1700000000.wav")),
            Some(1_700_000_000.0)
        );
        assert_eq!(
            AudioSegment::start_timestamp_from_filename(Path::new("rec-1700000123.25.m4a")),
            Some(1_700_000_123.25)
        );
        assert_eq!(
            AudioSegment::start_timestamp_from_filename(Path::new("audio.wav")),
            None
        );
        assert_eq!(
            AudioSegment::start_timestamp_from_filename(Path::new("audio_final.wav")),
            None
        );
    }

    #[test]
    fn test_range_is_half_open() {
        let range = ValidAudioRange::new(150.0, 250.0);
        assert!(range.contains(150.0));
        assert!(range.contains(249.9));
        assert!(!range.contains(250.0));
        assert!(!range.contains(149.9));
        assert_eq!(range.duration(), 100.0);
    }

    #[test]
    fn test_unbounded_sentinel() {
        assert!(ValidAudioRange::UNBOUNDED.is_unbounded());
        assert!(ValidAudioRange::UNBOUNDED.contains(1.0e9));
    }

    #[test]
    fn test_covered_secs() {
        let ranges = [
            ValidAudioRange::new(0.0, 100.0),
            ValidAudioRange::new(150.0, 250.0),
        ];
        assert_eq!(covered_secs(&ranges), 200.0);
        assert!(in_any_range(&ranges, 200.0));
        assert!(!in_any_range(&ranges, 120.0));
    }

    #[test]
    fn test_excerpt_clamps_to_timeline_end() {
        let timeline = AudioTimeline {
            samples: vec![0.25; 8000 * 10],
            sample_rate: 8000,
            origin_epoch: 0.0,
        };

        let bytes = timeline.excerpt(5.0, 20.0).unwrap();
        let reader = hound::WavReader::new(std::io::Cursor::new(bytes)).unwrap();
        assert_eq!(reader.spec().sample_rate, 8000);
        assert_eq!(reader.duration(), 8000 * 5);
    }

    #[test]
    fn test_excerpt_past_end_is_error() {
        let timeline = AudioTimeline {
            samples: vec![0.0; 8000],
            sample_rate: 8000,
            origin_epoch: 0.0,
        };
        assert!(matches!(
            timeline.excerpt(2.0, 20.0),
            Err(ExcerptError::OutOfRange { .. })
        ));
    }
}
