//! PartyPower scoring and sliding-window aggregation
//!
//! Per-sample score:
//!
//! ```text
//! raw = |accel| + |gyro| * gyro_weight + yaw_delta * yaw_weight
//! raw *= rhythm_bonus_factor   if recorded_bpm in [bonus_min, bonus_max]
//! ```
//!
//! Windows of `window_secs` slide with a quarter-window stride; each window
//! averages only the samples with `t` in `[start, start + window_secs)`.

use crate::models::{PeakCandidate, SensorSample};
use partypower_common::AnalysisParams;
use tracing::{debug, warn};

/// Absolute yaw change, with wrap-around jumps suppressed to 0
///
/// Crossing the ±π boundary shows up as a jump of nearly 2π between two
/// samples; anything above `threshold` is treated as that artifact.
pub fn yaw_delta(previous_yaw: f64, yaw: f64, threshold: f64) -> f64 {
    let delta = (yaw - previous_yaw).abs();
    if delta > threshold || !delta.is_finite() {
        0.0
    } else {
        delta
    }
}

/// Sliding-window activity scorer
#[derive(Debug, Clone)]
pub struct PeakDetector {
    gyro_weight: f64,
    yaw_weight: f64,
    yaw_threshold: f64,
    bonus_min_bpm: u32,
    bonus_max_bpm: u32,
    bonus_factor: f64,
    window_secs: f64,
    stride_secs: f64,
}

impl PeakDetector {
    pub fn new(params: &AnalysisParams) -> Self {
        Self {
            gyro_weight: params.gyro_weight,
            yaw_weight: params.yaw_weight,
            yaw_threshold: params.yaw_discontinuity_threshold,
            bonus_min_bpm: params.bonus_min_bpm,
            bonus_max_bpm: params.bonus_max_bpm,
            bonus_factor: params.rhythm_bonus_factor,
            window_secs: params.window_secs,
            stride_secs: params.window_stride_secs(),
        }
    }

    pub fn window_secs(&self) -> f64 {
        self.window_secs
    }

    /// PartyPower score of one sample given the previous sample's yaw
    pub fn party_power(&self, sample: &SensorSample, previous_yaw: Option<f64>) -> f64 {
        let turn = previous_yaw
            .map(|prev| yaw_delta(prev, sample.attitude.yaw, self.yaw_threshold))
            .unwrap_or(0.0);

        let raw = sample.accel.magnitude()
            + sample.gyro.magnitude() * self.gyro_weight
            + turn * self.yaw_weight;

        if (self.bonus_min_bpm..=self.bonus_max_bpm).contains(&sample.recorded_bpm) {
            raw * self.bonus_factor
        } else {
            raw
        }
    }

    /// Score every sample in order
    pub fn score_samples(&self, samples: &[SensorSample]) -> Vec<f64> {
        let mut previous_yaw = None;
        samples
            .iter()
            .map(|sample| {
                let score = self.party_power(sample, previous_yaw);
                previous_yaw = Some(sample.attitude.yaw);
                score
            })
            .collect()
    }

    /// Produce one candidate per non-empty window
    ///
    /// Candidate times are relative to the first sample. Sessions shorter
    /// than one window yield a single window covering everything. A window
    /// or stride that cannot advance across the session yields nothing.
    pub fn detect(&self, samples: &[SensorSample]) -> Vec<PeakCandidate> {
        let (first, last) = match (samples.first(), samples.last()) {
            (Some(first), Some(last)) => (first.t, last.t),
            _ => return Vec::new(),
        };

        let advances = self.window_secs.is_finite()
            && self.stride_secs.is_finite()
            && self.stride_secs > 0.0
            && first.is_finite()
            && last.is_finite()
            && first + self.stride_secs > first;
        if !advances {
            warn!(
                window_secs = self.window_secs,
                stride_secs = self.stride_secs,
                "Window stride cannot advance, no windows scored"
            );
            return Vec::new();
        }

        let scores = self.score_samples(samples);

        // Prefix sums: score, dB, positive-BPM sum and count
        let n = samples.len();
        let mut score_sum = vec![0.0f64; n + 1];
        let mut db_sum = vec![0.0f64; n + 1];
        let mut bpm_sum = vec![0.0f64; n + 1];
        let mut bpm_count = vec![0usize; n + 1];
        for (i, sample) in samples.iter().enumerate() {
            score_sum[i + 1] = score_sum[i] + scores[i];
            db_sum[i + 1] = db_sum[i] + sample.audio_power_db;
            let positive = sample.recorded_bpm > 0;
            bpm_sum[i + 1] = bpm_sum[i] + if positive { sample.recorded_bpm as f64 } else { 0.0 };
            bpm_count[i + 1] = bpm_count[i] + usize::from(positive);
        }

        let last_start = (last - self.window_secs).max(first);
        let mut candidates = Vec::new();
        let mut k = 0u64;

        loop {
            let start = first + k as f64 * self.stride_secs;
            if start > last_start {
                break;
            }
            k += 1;

            let end = start + self.window_secs;
            let lo = samples.partition_point(|s| s.t < start);
            let hi = samples.partition_point(|s| s.t < end);
            if lo >= hi {
                // Sensor dropout: nothing to score in this window
                continue;
            }

            let count = (hi - lo) as f64;
            let positives = bpm_count[hi] - bpm_count[lo];
            let bpm = if positives > 0 {
                ((bpm_sum[hi] - bpm_sum[lo]) / positives as f64).round() as u32
            } else {
                0
            };

            candidates.push(PeakCandidate {
                t: start - first,
                score: (score_sum[hi] - score_sum[lo]) / count,
                bpm,
                db: (db_sum[hi] - db_sum[lo]) / count,
            });
        }

        debug!(
            samples = n,
            windows = candidates.len(),
            window_secs = self.window_secs,
            "Sliding-window scoring complete"
        );

        candidates
    }
}
