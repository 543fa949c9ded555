//! Real-time rolling BPM estimator
//!
//! Runs on the sensor-ingest hot path: `process` is called once per incoming
//! sample. Each call is O(1) except the once-per-second recomputation, which
//! is O(buffer).

use partypower_common::AnalysisParams;
use std::collections::VecDeque;

/// Rolling BPM estimator over gravity-removed acceleration magnitude
#[derive(Debug, Clone)]
pub struct RhythmEstimator {
    /// |magnitude - 1.0| for the last `capacity` samples
    buffer: VecDeque<f64>,
    capacity: usize,
    capture_hz: u32,
    /// Samples since last recomputation
    frames_since_update: u32,
    last_bpm: u32,

    min_movement: f64,
    threshold_ratio: f64,
    min_bpm: u32,
    max_bpm: u32,
}

impl RhythmEstimator {
    /// Create estimator from analysis parameters
    pub fn new(params: &AnalysisParams) -> Self {
        let capture_hz = params.capture_hz.max(1);
        let capacity = ((params.rhythm_window_secs * capture_hz as f64).round() as usize).max(2);
        Self {
            buffer: VecDeque::with_capacity(capacity),
            capacity,
            capture_hz,
            frames_since_update: 0,
            last_bpm: 0,
            min_movement: params.rhythm_min_movement,
            threshold_ratio: params.rhythm_threshold_ratio,
            min_bpm: params.rhythm_min_bpm,
            max_bpm: params.rhythm_max_bpm,
        }
    }

    /// Feed one accelerometer reading (g), returning the current BPM estimate
    ///
    /// 0 means "undetermined".
    pub fn process(&mut self, ax: f64, ay: f64, az: f64) -> u32 {
        let magnitude = (ax * ax + ay * ay + az * az).sqrt();
        if self.buffer.len() == self.capacity {
            self.buffer.pop_front();
        }
        self.buffer.push_back((magnitude - 1.0).abs());

        self.frames_since_update += 1;
        if self.frames_since_update >= self.capture_hz && self.buffer.len() >= self.capacity / 2 {
            self.frames_since_update = 0;
            self.last_bpm = self.estimate();
        }

        self.last_bpm
    }

    /// Last computed estimate
    pub fn current_bpm(&self) -> u32 {
        self.last_bpm
    }

    /// Drop all buffered samples
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.frames_since_update = 0;
        self.last_bpm = 0;
    }

    fn estimate(&self) -> u32 {
        if self.buffer.is_empty() {
            return 0;
        }

        let average = self.buffer.iter().sum::<f64>() / self.buffer.len() as f64;
        if average < self.min_movement {
            return 0;
        }

        // Adaptive threshold: rising edges above a multiple of the current energy
        let threshold = average * self.threshold_ratio;
        let beats = self
            .buffer
            .iter()
            .zip(self.buffer.iter().skip(1))
            .filter(|(prev, cur)| **prev <= threshold && **cur > threshold)
            .count();

        let buffer_secs = self.buffer.len() as f64 / self.capture_hz as f64;
        let bpm = (beats as f64 / buffer_secs * 60.0).round() as u32;

        if bpm < self.min_bpm || bpm > self.max_bpm {
            return 0;
        }
        bpm
    }
}
