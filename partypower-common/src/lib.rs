//! # PartyPower Common Library
//!
//! Shared code for the PartyPower highlight tooling including:
//! - Error types
//! - Bootstrap configuration loading (TOML)
//! - Tunable analysis parameters
//! - Analysis progress events and the event bus

pub mod config;
pub mod error;
pub mod events;
pub mod params;

pub use error::{Error, Result};
pub use params::AnalysisParams;
