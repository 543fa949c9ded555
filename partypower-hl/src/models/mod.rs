//! Data models for highlight analysis

pub mod audio;
pub mod candidate;
pub mod moment;
pub mod sensor;

pub use audio::{AudioSegment, AudioTimeline, ValidAudioRange};
pub use candidate::PeakCandidate;
pub use moment::{HighlightMoment, RecognizedSong, UNKNOWN_TITLE};
pub use sensor::{Attitude, SensorSample, Vec3};
