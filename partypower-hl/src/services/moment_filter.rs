//! Final ranking: duplicate-song suppression and duration-tiered trimming

use crate::models::HighlightMoment;
use partypower_common::AnalysisParams;
use std::collections::HashSet;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct MomentFilter {
    params: AnalysisParams,
}

impl MomentFilter {
    pub fn new(params: &AnalysisParams) -> Self {
        Self {
            params: params.clone(),
        }
    }

    pub fn target_count(&self, total_duration: f64) -> usize {
        self.params.target_count(total_duration)
    }

    /// Keep the strongest moment per song, up to the session's target count
    ///
    /// Output is ordered by `peak_score` descending. Unrecognized moments
    /// share the [`UNKNOWN_TITLE`](crate::models::UNKNOWN_TITLE) sentinel, so at most one of them survives
    /// and report titles stay unique.
    pub fn filter(&self, moments: Vec<HighlightMoment>, total_duration: f64) -> Vec<HighlightMoment> {
        let target = self.target_count(total_duration);
        let input = moments.len();

        let mut ranked = moments;
        ranked.sort_by(|a, b| b.peak_score.total_cmp(&a.peak_score));

        let mut seen_titles: HashSet<String> = HashSet::new();
        let mut accepted: Vec<HighlightMoment> = Vec::with_capacity(target);

        for moment in ranked {
            if accepted.len() >= target {
                break;
            }
            if seen_titles.contains(moment.display_title()) {
                continue;
            }
            let spacing = self.params.min_moment_spacing_secs;
            if spacing > 0.0
                && accepted
                    .iter()
                    .any(|m| (m.timestamp - moment.timestamp).abs() < spacing)
            {
                continue;
            }
            seen_titles.insert(moment.display_title().to_string());
            accepted.push(moment);
        }

        debug!(
            input,
            target,
            accepted = accepted.len(),
            total_duration,
            "Moment filtering complete"
        );

        accepted
    }
}
