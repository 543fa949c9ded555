//! Scored window candidate

use serde::{Deserialize, Serialize};

/// One sliding window of the activity score
///
/// `t` is the window start on the session timeline (seconds).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PeakCandidate {
    pub t: f64,
    /// Mean PartyPower score over the window
    pub score: f64,
    /// Mean of the non-zero recorded BPM values (0 if none)
    pub bpm: u32,
    /// Mean audio power (dB)
    pub db: f64,
}

impl PeakCandidate {
    /// Window midpoint for a window of `window_secs`
    pub fn midpoint(&self, window_secs: f64) -> f64 {
        self.t + window_secs / 2.0
    }

    /// Same candidate moved by `offset_secs` along the timeline
    pub fn shifted(self, offset_secs: f64) -> Self {
        Self {
            t: self.t + offset_secs,
            ..self
        }
    }
}
