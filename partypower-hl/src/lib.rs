//! partypower-hl library interface
//!
//! Highlight detection for captured party sessions: activity scoring over
//! the sensor stream, audio timeline reconciliation, candidate selection,
//! song recognition and final ranking.

pub mod error;
pub mod models;
pub mod services;
pub mod utils;
pub mod workflow;

pub use crate::error::{AnalysisError, AnalysisResult};
pub use crate::workflow::{HighlightPipeline, HighlightReport, SessionInputs};
