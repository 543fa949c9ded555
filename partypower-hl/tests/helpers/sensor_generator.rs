//! Synthetic sensor log generator
//!
//! Produces a calm session with optional bursts of rhythmic dancing.

use partypower_hl::models::{Attitude, SensorSample, Vec3};
use partypower_hl::services::SensorLogWriter;
use std::path::{Path, PathBuf};

/// Stretch of strong movement, relative to session start
#[derive(Debug, Clone, Copy)]
pub struct ActivityBurst {
    pub start_secs: f64,
    pub duration_secs: f64,
    /// Acceleration magnitude during the burst (g)
    pub intensity: f64,
    pub bpm: u32,
}

#[derive(Debug, Clone)]
pub struct SensorSessionConfig {
    pub start_epoch: f64,
    pub duration_secs: f64,
    pub hz: f64,
    pub bursts: Vec<ActivityBurst>,
}

impl Default for SensorSessionConfig {
    fn default() -> Self {
        Self {
            start_epoch: 1_700_000_000.0,
            duration_secs: 120.0,
            hz: 10.0,
            bursts: Vec::new(),
        }
    }
}

impl SensorSessionConfig {
    /// All samples of the session, in order
    pub fn samples(&self) -> Vec<SensorSample> {
        let count = (self.duration_secs * self.hz) as usize;
        (0..count)
            .map(|i| {
                let rel = i as f64 / self.hz;
                let burst = self
                    .bursts
                    .iter()
                    .find(|b| rel >= b.start_secs && rel < b.start_secs + b.duration_secs);
                let (accel, bpm, db) = match burst {
                    Some(b) => (b.intensity, b.bpm, -12.0),
                    None => (0.05, 0, -35.0),
                };

                SensorSample {
                    t: self.start_epoch + rel,
                    accel: Vec3::new(accel, 0.0, 0.0),
                    gyro: Vec3::default(),
                    attitude: Attitude::default(),
                    gravity: Vec3::new(0.0, 0.0, -1.0),
                    audio_power_db: db,
                    proximity: false,
                    recorded_bpm: bpm,
                }
            })
            .collect()
    }
}

/// Write the session's sensor log to `dir/sensors.csv`
pub fn generate_sensor_log(dir: &Path, config: &SensorSessionConfig) -> anyhow::Result<PathBuf> {
    let path = dir.join("sensors.csv");
    let mut writer = SensorLogWriter::create(&path)?;
    for sample in config.samples() {
        writer.append(&sample)?;
    }
    writer.finish()?;
    Ok(path)
}
