//! 16-bit PCM WAV encoding with hound

use std::io::{Cursor, Seek, Write};
use std::path::Path;

fn wav_spec(sample_rate: u32) -> hound::WavSpec {
    hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    }
}

fn write_samples<W: Write + Seek>(
    writer: &mut hound::WavWriter<W>,
    samples: &[f32],
) -> hound::Result<()> {
    for &sample in samples {
        let clamped = sample.clamp(-1.0, 1.0);
        writer.write_sample((clamped * i16::MAX as f32) as i16)?;
    }
    Ok(())
}

/// Encode mono samples as an in-memory WAV file
pub fn encode_wav_bytes(samples: &[f32], sample_rate: u32) -> hound::Result<Vec<u8>> {
    let mut cursor = Cursor::new(Vec::with_capacity(44 + samples.len() * 2));
    {
        let mut writer = hound::WavWriter::new(&mut cursor, wav_spec(sample_rate))?;
        write_samples(&mut writer, samples)?;
        writer.finalize()?;
    }
    Ok(cursor.into_inner())
}

/// Write mono samples to a WAV file on disk
pub fn write_wav_file(path: &Path, samples: &[f32], sample_rate: u32) -> hound::Result<()> {
    let mut writer = hound::WavWriter::create(path, wav_spec(sample_rate))?;
    write_samples(&mut writer, samples)?;
    writer.finalize()
}
