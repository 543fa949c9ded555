//! Test Helper Utilities
//!
//! Shared fixtures for partypower-hl integration tests

#![allow(dead_code)]

pub mod audio_generator;
pub mod fake_recognizer;
pub mod sensor_generator;

pub use audio_generator::{generate_segment, SegmentConfig};
pub use fake_recognizer::{song_response, FakeRecognizer};
pub use sensor_generator::{generate_sensor_log, ActivityBurst, SensorSessionConfig};
