//! Error types for partypower-hl
//!
//! Expected "no data" outcomes (empty sensor log, no candidates, recognition
//! misses) are not errors and never appear here.

use thiserror::Error;

/// Analysis error type
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Sensor log unreadable as a whole (individual bad rows are skipped)
    #[error("Sensor log error: {0}")]
    SensorLog(String),

    /// Audio decoding failed
    #[error("Audio decoding error: {0}")]
    AudioDecode(String),

    /// Merged audio export failed
    #[error("Export error: {0}")]
    Export(String),

    /// Recognizer could not be constructed
    #[error("Recognizer error: {0}")]
    Recognizer(#[from] RecognizerError),

    /// Analysis cancelled between candidates
    #[error("Analysis cancelled")]
    Cancelled,

    /// partypower-common error
    #[error("Common error: {0}")]
    Common(#[from] partypower_common::Error),
}

/// Result type for analysis operations
pub type AnalysisResult<T> = Result<T, AnalysisError>;

/// Recognition service errors
#[derive(Debug, Error)]
pub enum RecognizerError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("API error {0}: {1}")]
    ApiError(u16, String),

    #[error("Invalid access key")]
    InvalidAccessKey,
}

/// Audio excerpt extraction errors
#[derive(Debug, Error)]
pub enum ExcerptError {
    #[error("Excerpt start {start_secs:.2}s outside timeline of {duration_secs:.2}s")]
    OutOfRange { start_secs: f64, duration_secs: f64 },

    #[error("WAV encoding failed: {0}")]
    Encode(String),

    #[error("No merged audio timeline available")]
    NoTimeline,
}
