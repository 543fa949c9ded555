//! Session analysis workflow
//!
//! [`HighlightPipeline`] turns one captured session (sensor log plus audio
//! segments) into a [`HighlightReport`].

pub mod pipeline;
pub mod report;
pub mod session;

pub use pipeline::HighlightPipeline;
pub use report::{HighlightRecord, HighlightReport, UNKNOWN_TITLE};
pub use session::SessionInputs;
