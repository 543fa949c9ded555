//! Live sensor ingest
//!
//! Capture side of the pipeline: the capture task hands each raw reading to
//! [`SessionRecorder::record`], which stamps it with the rolling BPM estimate
//! and appends it to the session's sensor log. Only the capture task owns the
//! recorder, so no locking is involved.

use crate::error::AnalysisResult;
use crate::models::{Attitude, SensorSample, Vec3};
use crate::services::rhythm_estimator::RhythmEstimator;
use crate::services::sensor_log::SensorLogWriter;
use partypower_common::AnalysisParams;
use std::io::Write;

/// Raw reading from the capture devices (no BPM yet)
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RawReading {
    pub t: f64,
    pub accel: Vec3,
    pub gyro: Vec3,
    pub attitude: Attitude,
    pub gravity: Vec3,
    pub audio_power_db: f64,
    pub proximity: bool,
}

/// Per-session recorder: rhythm estimation + log writing
pub struct SessionRecorder<W: Write> {
    estimator: RhythmEstimator,
    writer: SensorLogWriter<W>,
}

impl<W: Write> SessionRecorder<W> {
    pub fn new(params: &AnalysisParams, writer: SensorLogWriter<W>) -> Self {
        Self {
            estimator: RhythmEstimator::new(params),
            writer,
        }
    }

    /// Record one reading, returning the stored sample
    pub fn record(&mut self, reading: RawReading) -> AnalysisResult<SensorSample> {
        let recorded_bpm =
            self.estimator
                .process(reading.accel.x, reading.accel.y, reading.accel.z);

        let sample = SensorSample {
            t: reading.t,
            accel: reading.accel,
            gyro: reading.gyro,
            attitude: reading.attitude,
            gravity: reading.gravity,
            audio_power_db: reading.audio_power_db,
            proximity: reading.proximity,
            recorded_bpm,
        };
        self.writer.append(&sample)?;
        Ok(sample)
    }

    /// Samples recorded so far
    pub fn recorded(&self) -> usize {
        self.writer.rows()
    }

    /// Flush the log and return the underlying writer
    pub fn finish(self) -> AnalysisResult<W> {
        self.writer.finish()
    }
}
