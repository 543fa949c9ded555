//! Candidate selection: audio coverage, ranking, spacing and cap

use crate::models::audio::in_any_range;
use crate::models::{PeakCandidate, ValidAudioRange};
use partypower_common::AnalysisParams;
use tracing::debug;

/// Greedy spaced top-N selector
#[derive(Debug, Clone)]
pub struct CandidateSelector {
    window_secs: f64,
    min_spacing_secs: f64,
    max_candidates: usize,
}

impl CandidateSelector {
    pub fn new(params: &AnalysisParams) -> Self {
        Self {
            window_secs: params.window_secs,
            min_spacing_secs: params.min_peak_spacing_secs,
            max_candidates: params.max_candidates,
        }
    }

    /// Select candidates for recognition, returned in time order
    ///
    /// Windows whose midpoint has no real audio are dropped. The rest are
    /// taken by score, skipping any closer than the minimum spacing to one
    /// already taken, until the cap is reached.
    pub fn select(
        &self,
        candidates: &[PeakCandidate],
        valid_ranges: &[ValidAudioRange],
    ) -> Vec<PeakCandidate> {
        let mut covered: Vec<PeakCandidate> = candidates
            .iter()
            .copied()
            .filter(|c| in_any_range(valid_ranges, c.midpoint(self.window_secs)))
            .collect();

        let dropped = candidates.len() - covered.len();

        // Stable sort keeps earlier windows first among equal scores
        covered.sort_by(|a, b| b.score.total_cmp(&a.score));

        let mut accepted: Vec<PeakCandidate> = Vec::with_capacity(self.max_candidates);
        for candidate in covered {
            if accepted.len() >= self.max_candidates {
                break;
            }
            let too_close = accepted
                .iter()
                .any(|taken| (taken.t - candidate.t).abs() < self.min_spacing_secs);
            if !too_close {
                accepted.push(candidate);
            }
        }

        accepted.sort_by(|a, b| a.t.total_cmp(&b.t));

        debug!(
            input = candidates.len(),
            without_audio = dropped,
            selected = accepted.len(),
            "Candidate selection complete"
        );

        accepted
    }
}
