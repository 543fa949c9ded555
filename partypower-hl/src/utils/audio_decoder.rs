//! Audio Decoding Utilities
//!
//! Decodes session audio segments to mono f32 PCM using symphonia
//! (WAV, M4A/AAC, MP3, FLAC, ...) and resamples with rubato when segment
//! sample rates disagree.

use anyhow::{Context, Result};
use rubato::{
    Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType, WindowFunction,
};
use std::path::Path;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::{FormatOptions, FormatReader};
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

/// Decoded audio result
#[derive(Debug)]
pub struct DecodedAudio {
    /// Mono audio samples (f32, range [-1.0, 1.0])
    pub samples: Vec<f32>,
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Original channel count
    pub channels: usize,
}

impl DecodedAudio {
    pub fn duration_seconds(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / self.sample_rate as f64
    }
}

fn open_format(file_path: &Path) -> Result<Box<dyn FormatReader>> {
    let file = std::fs::File::open(file_path)
        .with_context(|| format!("Failed to open audio file: {}", file_path.display()))?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    // Create format hint from file extension
    let mut hint = Hint::new();
    if let Some(extension) = file_path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(extension);
    }

    let probed = symphonia::default::get_probe()
        .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
        .with_context(|| format!("Failed to probe audio file: {}", file_path.display()))?;

    Ok(probed.format)
}

/// Read the track duration from container metadata without decoding
///
/// Falls back to a full decode when the container does not record a frame
/// count.
pub fn probe_duration(file_path: &Path) -> Result<f64> {
    let format = open_format(file_path)?;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .context("No audio track found in file")?;

    let params = &track.codec_params;
    if let (Some(n_frames), Some(sample_rate)) = (params.n_frames, params.sample_rate) {
        if sample_rate > 0 {
            return Ok(n_frames as f64 / sample_rate as f64);
        }
    }

    tracing::debug!(
        path = %file_path.display(),
        "Frame count missing from container, decoding to measure duration"
    );
    Ok(decode_audio_file(file_path)?.duration_seconds())
}

/// Decode audio file to mono f32 PCM samples
///
/// Multi-channel audio is mixed down by averaging channels. Corrupt packets
/// are skipped; I/O and format errors abort.
pub fn decode_audio_file(file_path: &Path) -> Result<DecodedAudio> {
    tracing::debug!(path = %file_path.display(), "Decoding audio file");

    let mut format = open_format(file_path)?;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .context("No audio track found in file")?;

    let track_id = track.id;
    let sample_rate = track
        .codec_params
        .sample_rate
        .context("Sample rate unknown")?;

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .with_context(|| format!("Failed to create decoder for: {}", file_path.display()))?;

    let mut mono: Vec<f32> = Vec::new();
    let mut channel_count = track.codec_params.channels.map(|c| c.count()).unwrap_or(1);
    let mut skipped_packets = 0usize;

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                break;
            }
            Err(e) => {
                return Err(anyhow::anyhow!("Error reading packet: {}", e));
            }
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(decoded) => decoded,
            Err(SymphoniaError::DecodeError(e)) => {
                skipped_packets += 1;
                tracing::debug!(path = %file_path.display(), error = e, "Skipping corrupt packet");
                continue;
            }
            Err(e) => {
                return Err(anyhow::anyhow!(
                    "Failed to decode packet in {}: {}",
                    file_path.display(),
                    e
                ));
            }
        };

        let spec = *decoded.spec();
        channel_count = spec.channels.count().max(1);

        let mut buffer = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
        buffer.copy_interleaved_ref(decoded);

        mono.extend(
            buffer
                .samples()
                .chunks(channel_count)
                .map(|frame| frame.iter().sum::<f32>() / frame.len() as f32),
        );
    }

    if skipped_packets > 0 {
        tracing::warn!(
            path = %file_path.display(),
            skipped_packets,
            "Some audio packets could not be decoded"
        );
    }

    tracing::debug!(
        path = %file_path.display(),
        total_samples = mono.len(),
        sample_rate,
        channels = channel_count,
        "Audio decoding complete"
    );

    Ok(DecodedAudio {
        samples: mono,
        sample_rate,
        channels: channel_count,
    })
}

/// Resample mono samples with rubato SincFixedIn
pub fn resample_mono(samples: Vec<f32>, source_rate: u32, target_rate: u32) -> Result<Vec<f32>> {
    if samples.is_empty() || source_rate == target_rate {
        return Ok(samples);
    }

    let params = SincInterpolationParameters {
        sinc_len: 256,
        f_cutoff: 0.95,
        interpolation: SincInterpolationType::Linear,
        oversampling_factor: 256,
        window: WindowFunction::BlackmanHarris2,
    };

    let ratio = target_rate as f64 / source_rate as f64;

    // Chunk size = input length for single-pass processing
    let mut resampler = SincFixedIn::<f32>::new(ratio, 2.0, params, samples.len(), 1)
        .context("Failed to create rubato resampler")?;

    let input = vec![samples];
    let mut output = resampler
        .process(&input, None)
        .context("Rubato resampling failed")?;

    Ok(output.pop().unwrap_or_default())
}
