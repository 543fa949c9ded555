//! Audio segment fixture generator
//!
//! Writes mono WAV segments named the way capture names them
//! (`audio_<start epoch>.wav`).

use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct SegmentConfig {
    /// Recording start (epoch seconds), embedded in the file name
    pub start_epoch: f64,
    pub duration_seconds: f64,
    pub sample_rate: u32,
    pub frequency: f32,
}

impl Default for SegmentConfig {
    fn default() -> Self {
        Self {
            start_epoch: 1_700_000_000.0,
            duration_seconds: 10.0,
            // Low rate keeps long sessions cheap to decode
            sample_rate: 2_000,
            frequency: 220.0,
        }
    }
}

/// Generate one segment in `dir` and return its path
pub fn generate_segment(dir: &Path, config: &SegmentConfig) -> anyhow::Result<PathBuf> {
    let path = dir.join(format!("audio_{}.wav", config.start_epoch));
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: config.sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut writer = hound::WavWriter::create(&path, spec)?;
    let total_samples = (config.duration_seconds * config.sample_rate as f64) as usize;

    for i in 0..total_samples {
        let t = i as f32 / config.sample_rate as f32;
        let value = 0.3 * (2.0 * std::f32::consts::PI * config.frequency * t).sin();
        writer.write_sample((value * i16::MAX as f32) as i16)?;
    }

    writer.finalize()?;
    Ok(path)
}
