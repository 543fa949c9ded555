//! Audio utilities shared by the timeline reconciler and recognition

pub mod audio_decoder;
pub mod wav_encoder;
