//! Sensor sample model
//!
//! One row of the motion/audio-level stream captured during a session.

use serde::{Deserialize, Serialize};

/// Three-axis reading (accelerometer, gyroscope, gravity)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Euclidean norm
    pub fn magnitude(&self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }
}

/// Device attitude in radians
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Attitude {
    pub roll: f64,
    pub pitch: f64,
    pub yaw: f64,
}

/// Sensor sample captured at the fixed capture frequency
///
/// Ordered by `t` non-decreasing within a session; immutable once written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorSample {
    /// Timestamp in seconds (epoch or session-relative)
    pub t: f64,
    /// User acceleration (g)
    pub accel: Vec3,
    /// Rotation rate (rad/s)
    pub gyro: Vec3,
    pub attitude: Attitude,
    pub gravity: Vec3,
    /// Microphone average power (dB)
    pub audio_power_db: f64,
    pub proximity: bool,
    /// BPM estimated live at capture time (0 = undetermined)
    pub recorded_bpm: u32,
}
