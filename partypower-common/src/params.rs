//! Tunable analysis parameters
//!
//! Every threshold, weight and window length used by the highlight pipeline
//! lives here. Values are empirically tuned for dance detection; none of them
//! carries meaning beyond that. Loaded from the `[analysis]` table of the
//! bootstrap TOML, with built-in defaults for anything missing.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// What to do with candidates the recognizer could not match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum UnmatchedPolicy {
    /// Drop the candidate (no highlight moment emitted)
    #[default]
    Drop,
    /// Keep the candidate as an unlabeled highlight moment
    Keep,
}

/// Default upper bound on the merged audio span (seconds)
pub const DEFAULT_MAX_SESSION_SECS: f64 = 4.0 * 3600.0;

/// Session-duration tier: sessions shorter than `max_secs` report `count` moments
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DurationTier {
    pub max_secs: f64,
    pub count: usize,
}

/// Highlight analysis parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisParams {
    // === Capture ===
    /// Sensor capture frequency (Hz)
    pub capture_hz: u32,

    // === Rhythm estimation ===
    /// Rolling buffer length for BPM estimation (seconds)
    pub rhythm_window_secs: f64,
    /// Average gravity-removed magnitude below which no rhythm is reported
    pub rhythm_min_movement: f64,
    /// Beat threshold as a multiple of the buffer average
    pub rhythm_threshold_ratio: f64,
    /// Lowest plausible dance tempo
    pub rhythm_min_bpm: u32,
    /// Highest plausible dance tempo
    pub rhythm_max_bpm: u32,

    // === PartyPower scoring ===
    pub gyro_weight: f64,
    pub yaw_weight: f64,
    /// Yaw jumps above this (radians) are wrap-around artifacts, not turns
    pub yaw_discontinuity_threshold: f64,
    pub bonus_min_bpm: u32,
    pub bonus_max_bpm: u32,
    pub rhythm_bonus_factor: f64,

    // === Audio reconciliation ===
    /// Longest span the merged audio timeline may cover (seconds); segments
    /// placed outside it are dropped
    pub max_session_secs: f64,

    // === Windowing ===
    /// Sliding window length (seconds); stride is a quarter of this
    pub window_secs: f64,

    // === Candidate selection ===
    pub min_peak_spacing_secs: f64,
    pub max_candidates: usize,

    // === Recognition ===
    /// Length of the excerpt sent to the recognizer (seconds)
    pub analysis_window_secs: f64,
    pub unmatched_policy: UnmatchedPolicy,

    // === Moment filtering ===
    /// Ascending tiers; sessions past the last tier get `max_target_count`
    pub duration_tiers: Vec<DurationTier>,
    pub max_target_count: usize,
    /// Suppress moments closer than this to an accepted one (0 disables)
    pub min_moment_spacing_secs: f64,
}

impl Default for AnalysisParams {
    fn default() -> Self {
        Self {
            capture_hz: 50,

            rhythm_window_secs: 20.0,
            rhythm_min_movement: 0.05,
            rhythm_threshold_ratio: 1.2,
            rhythm_min_bpm: 60,
            rhythm_max_bpm: 180,

            gyro_weight: 0.5,
            yaw_weight: 2.0,
            yaw_discontinuity_threshold: 3.0,
            bonus_min_bpm: 90,
            bonus_max_bpm: 150,
            rhythm_bonus_factor: 1.3,

            max_session_secs: DEFAULT_MAX_SESSION_SECS,

            window_secs: 20.0,

            min_peak_spacing_secs: 60.0,
            max_candidates: 10,

            analysis_window_secs: 20.0,
            unmatched_policy: UnmatchedPolicy::Drop,

            duration_tiers: vec![
                DurationTier { max_secs: 600.0, count: 1 },
                DurationTier { max_secs: 1500.0, count: 3 },
            ],
            max_target_count: 5,
            min_moment_spacing_secs: 0.0,
        }
    }
}

impl AnalysisParams {
    /// Sliding window stride (seconds)
    pub fn window_stride_secs(&self) -> f64 {
        self.window_secs / 4.0
    }

    /// Number of highlight moments to report for a session of this length
    pub fn target_count(&self, total_duration_secs: f64) -> usize {
        self.duration_tiers
            .iter()
            .find(|tier| total_duration_secs < tier.max_secs)
            .map(|tier| tier.count)
            .unwrap_or(self.max_target_count)
    }

    /// Largest report size any session can produce
    pub fn largest_target_count(&self) -> usize {
        self.duration_tiers
            .iter()
            .map(|tier| tier.count)
            .chain(std::iter::once(self.max_target_count))
            .max()
            .unwrap_or(0)
    }

    /// Reject parameter combinations the pipeline cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.capture_hz == 0 {
            return Err(Error::InvalidInput("capture_hz must be > 0".to_string()));
        }
        for (name, value) in [
            ("rhythm_window_secs", self.rhythm_window_secs),
            ("window_secs", self.window_secs),
            ("analysis_window_secs", self.analysis_window_secs),
            ("rhythm_threshold_ratio", self.rhythm_threshold_ratio),
            ("yaw_discontinuity_threshold", self.yaw_discontinuity_threshold),
            ("max_session_secs", self.max_session_secs),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(Error::InvalidInput(format!(
                    "{} must be a positive number, got {}",
                    name, value
                )));
            }
        }
        if self.min_peak_spacing_secs < 0.0 || self.min_moment_spacing_secs < 0.0 {
            return Err(Error::InvalidInput(
                "Spacing values must be >= 0".to_string(),
            ));
        }
        if self.rhythm_min_bpm > self.rhythm_max_bpm {
            return Err(Error::InvalidInput(format!(
                "rhythm BPM range inverted: {} > {}",
                self.rhythm_min_bpm, self.rhythm_max_bpm
            )));
        }
        if self.bonus_min_bpm > self.bonus_max_bpm {
            return Err(Error::InvalidInput(format!(
                "bonus BPM range inverted: {} > {}",
                self.bonus_min_bpm, self.bonus_max_bpm
            )));
        }
        if self.max_candidates == 0 {
            return Err(Error::InvalidInput("max_candidates must be > 0".to_string()));
        }
        if self
            .duration_tiers
            .windows(2)
            .any(|pair| pair[0].max_secs >= pair[1].max_secs)
        {
            return Err(Error::InvalidInput(
                "duration_tiers must be sorted by ascending max_secs".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(AnalysisParams::default().validate().is_ok());
    }

    #[test]
    fn test_target_count_tiers() {
        let params = AnalysisParams::default();
        assert_eq!(params.target_count(300.0), 1);
        assert_eq!(params.target_count(599.9), 1);
        assert_eq!(params.target_count(600.0), 3);
        assert_eq!(params.target_count(1499.0), 3);
        assert_eq!(params.target_count(1500.0), 5);
        assert_eq!(params.target_count(7200.0), 5);
    }

    #[test]
    fn test_stride_is_quarter_window() {
        let params = AnalysisParams {
            window_secs: 20.0,
            ..Default::default()
        };
        assert_eq!(params.window_stride_secs(), 5.0);
    }

    #[test]
    fn test_default_max_candidates_covers_largest_report() {
        let params = AnalysisParams::default();
        assert!(params.max_candidates >= 2 * params.largest_target_count());
    }

    #[test]
    fn test_validate_rejects_inverted_bonus_range() {
        let params = AnalysisParams {
            bonus_min_bpm: 160,
            bonus_max_bpm: 100,
            ..Default::default()
        };
        assert!(params.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_window() {
        let params = AnalysisParams {
            window_secs: 0.0,
            ..Default::default()
        };
        assert!(params.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_nan_window() {
        let params = AnalysisParams {
            window_secs: f64::NAN,
            ..Default::default()
        };
        assert!(params.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_unbounded_session_span() {
        let params = AnalysisParams {
            max_session_secs: f64::INFINITY,
            ..Default::default()
        };
        assert!(params.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_unsorted_tiers() {
        let params = AnalysisParams {
            duration_tiers: vec![
                DurationTier { max_secs: 1500.0, count: 3 },
                DurationTier { max_secs: 600.0, count: 1 },
            ],
            ..Default::default()
        };
        assert!(params.validate().is_err());
    }

    #[test]
    fn test_unmatched_policy_deserializes_lowercase() {
        let params: AnalysisParams = toml::from_str("unmatched_policy = \"keep\"").unwrap();
        assert_eq!(params.unmatched_policy, UnmatchedPolicy::Keep);
        // Unspecified fields keep their defaults
        assert_eq!(params.window_secs, 20.0);
    }
}
