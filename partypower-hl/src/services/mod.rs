//! Analysis services
//!
//! Ordered as data flows through a session: sensor capture and parsing,
//! audio reconciliation, scoring, selection, recognition and final ranking.

pub mod candidate_selector;
pub mod ingest;
pub mod moment_filter;
pub mod peak_detector;
pub mod recognition_coordinator;
pub mod recognizer_client;
pub mod rhythm_estimator;
pub mod sensor_log;
pub mod timeline_reconciler;

pub use candidate_selector::CandidateSelector;
pub use ingest::{RawReading, SessionRecorder};
pub use moment_filter::MomentFilter;
pub use peak_detector::PeakDetector;
pub use recognition_coordinator::RecognitionCoordinator;
pub use recognizer_client::{parse_recognition, HttpRecognizer, Recognizer};
pub use rhythm_estimator::RhythmEstimator;
pub use sensor_log::{parse_sensor_file, parse_sensor_log, ParseReport, SensorLogWriter};
pub use timeline_reconciler::{
    export_timeline, MergeOutcome, MergeStatus, SegmentLoader, SymphoniaLoader, TimelineReconciler,
};
