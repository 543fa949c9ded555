//! Per-candidate excerpt extraction and recognition
//!
//! Candidates are independent: up to `max_concurrency` requests run at once,
//! but results are consumed in candidate order so progress only moves
//! forward. Failures on one candidate (excerpt or recognizer) skip that
//! candidate and never abort the batch.

use crate::error::{AnalysisError, AnalysisResult, ExcerptError};
use crate::models::{AudioTimeline, HighlightMoment, PeakCandidate};
use crate::services::recognizer_client::{parse_recognition, Recognizer};
use futures::StreamExt;
use partypower_common::params::UnmatchedPolicy;
use partypower_common::AnalysisParams;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Drives the recognizer over selected candidates
pub struct RecognitionCoordinator {
    recognizer: Arc<dyn Recognizer>,
    analysis_window_secs: f64,
    unmatched_policy: UnmatchedPolicy,
    max_concurrency: usize,
}

impl RecognitionCoordinator {
    pub fn new(
        recognizer: Arc<dyn Recognizer>,
        params: &AnalysisParams,
        max_concurrency: usize,
    ) -> Self {
        Self {
            recognizer,
            analysis_window_secs: params.analysis_window_secs,
            unmatched_policy: params.unmatched_policy,
            max_concurrency: max_concurrency.max(1),
        }
    }

    /// Recognize every candidate, returning one moment per match
    ///
    /// `on_progress(completed, total, moment)` is called after each candidate
    /// with the moment it produced, if any.
    /// Cancellation is honored between candidates: a cancelled run returns
    /// [`AnalysisError::Cancelled`] and no moments.
    pub async fn recognize_all<F>(
        &self,
        candidates: &[PeakCandidate],
        timeline: Option<&AudioTimeline>,
        cancel: &CancellationToken,
        mut on_progress: F,
    ) -> AnalysisResult<Vec<HighlightMoment>>
    where
        F: FnMut(usize, usize, Option<&HighlightMoment>),
    {
        let total = candidates.len();
        let mut moments = Vec::new();
        let mut completed = 0usize;

        let mut results = futures::stream::iter(candidates.iter().copied())
            .map(|candidate| self.recognize_one(candidate, timeline, cancel))
            .buffered(self.max_concurrency);

        while let Some(moment) = results.next().await {
            if cancel.is_cancelled() {
                info!(completed, total, "Recognition cancelled");
                return Err(AnalysisError::Cancelled);
            }

            completed += 1;
            on_progress(completed, total, moment.as_ref());
            if let Some(moment) = moment {
                moments.push(moment);
            }
        }

        info!(
            candidates = total,
            moments = moments.len(),
            "Recognition complete"
        );
        Ok(moments)
    }

    async fn recognize_one(
        &self,
        candidate: PeakCandidate,
        timeline: Option<&AudioTimeline>,
        cancel: &CancellationToken,
    ) -> Option<HighlightMoment> {
        if cancel.is_cancelled() {
            return None;
        }

        let clip = match timeline
            .ok_or(ExcerptError::NoTimeline)
            .and_then(|tl| tl.excerpt(candidate.t, self.analysis_window_secs))
        {
            Ok(clip) => clip,
            Err(e) => {
                warn!(t = candidate.t, error = %e, "Excerpt extraction failed, skipping candidate");
                return None;
            }
        };

        let response = tokio::select! {
            _ = cancel.cancelled() => return None,
            response = self.recognizer.recognize(&clip) => response,
        };

        let song = match response {
            Ok(Some(body)) => parse_recognition(&body),
            Ok(None) => None,
            Err(e) => {
                warn!(t = candidate.t, error = %e, "Recognizer request failed, skipping candidate");
                return None;
            }
        };

        match (&song, self.unmatched_policy) {
            (Some(song), _) => {
                info!(t = candidate.t, title = %song.title, artist = %song.artist, "Candidate recognized");
            }
            (None, UnmatchedPolicy::Drop) => {
                debug!(t = candidate.t, "No match, dropping candidate");
                return None;
            }
            (None, UnmatchedPolicy::Keep) => {
                debug!(t = candidate.t, "No match, keeping unlabeled moment");
            }
        }

        Some(HighlightMoment {
            timestamp: candidate.t,
            song,
            peak_score: candidate.score,
            user_bpm: candidate.bpm,
            music_bpm: 0,
            average_db: candidate.db,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RecognizerError;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Answers by call order from a fixed script
    struct ScriptedRecognizer {
        script: Vec<Result<Option<String>, u16>>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Recognizer for ScriptedRecognizer {
        async fn recognize(&self, clip: &[u8]) -> Result<Option<String>, RecognizerError> {
            assert_eq!(&clip[0..4], b"RIFF");
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.script[call % self.script.len()] {
                Ok(body) => Ok(body.clone()),
                Err(code) => Err(RecognizerError::ApiError(*code, "boom".to_string())),
            }
        }
    }

    fn hit(title: &str) -> Result<Option<String>, u16> {
        Ok(Some(format!(
            r#"{{"metadata": {{"music": [{{"title": "{}", "artists": [{{"name": "DJ"}}]}}]}}}}"#,
            title
        )))
    }

    fn timeline(seconds: usize) -> AudioTimeline {
        AudioTimeline {
            samples: vec![0.1; 1000 * seconds],
            sample_rate: 1000,
            origin_epoch: 0.0,
        }
    }

    fn candidate(t: f64) -> PeakCandidate {
        PeakCandidate {
            t,
            score: t + 1.0,
            bpm: 120,
            db: -20.0,
        }
    }

    fn coordinator(
        script: Vec<Result<Option<String>, u16>>,
        policy: UnmatchedPolicy,
    ) -> RecognitionCoordinator {
        let params = AnalysisParams {
            unmatched_policy: policy,
            ..Default::default()
        };
        RecognitionCoordinator::new(
            Arc::new(ScriptedRecognizer {
                script,
                calls: AtomicUsize::new(0),
            }),
            &params,
            1,
        )
    }

    #[tokio::test]
    async fn test_matches_become_moments() {
        let coordinator = coordinator(vec![hit("Song A"), Ok(None), hit("Song B")], UnmatchedPolicy::Drop);
        let mut progress = Vec::new();

        let moments = coordinator
            .recognize_all(
                &[candidate(0.0), candidate(100.0), candidate(200.0)],
                Some(&timeline(300)),
                &CancellationToken::new(),
                |done, total, _| progress.push((done, total)),
            )
            .await
            .unwrap();

        assert_eq!(moments.len(), 2);
        assert_eq!(moments[0].title(), Some("Song A"));
        assert_eq!(moments[1].title(), Some("Song B"));
        assert_eq!(moments[1].timestamp, 200.0);
        assert_eq!(moments[1].user_bpm, 120);
        assert_eq!(moments[1].music_bpm, 0);
        assert_eq!(progress, vec![(1, 3), (2, 3), (3, 3)]);
    }

    #[tokio::test]
    async fn test_keep_policy_retains_unmatched() {
        let coordinator = coordinator(vec![Ok(None)], UnmatchedPolicy::Keep);
        let moments = coordinator
            .recognize_all(&[candidate(0.0)], Some(&timeline(30)), &CancellationToken::new(), |_, _, _| {})
            .await
            .unwrap();

        assert_eq!(moments.len(), 1);
        assert!(moments[0].song.is_none());
    }

    #[tokio::test]
    async fn test_recognizer_errors_skip_candidate() {
        let coordinator = coordinator(vec![Err(503), hit("Later")], UnmatchedPolicy::Keep);
        let moments = coordinator
            .recognize_all(
                &[candidate(0.0), candidate(50.0)],
                Some(&timeline(100)),
                &CancellationToken::new(),
                |_, _, _| {},
            )
            .await
            .unwrap();

        assert_eq!(moments.len(), 1);
        assert_eq!(moments[0].title(), Some("Later"));
    }

    #[tokio::test]
    async fn test_extraction_failure_skips_candidate() {
        let coordinator = coordinator(vec![hit("Only")], UnmatchedPolicy::Drop);
        let moments = coordinator
            .recognize_all(
                // Second candidate starts past the end of the timeline
                &[candidate(0.0), candidate(500.0)],
                Some(&timeline(60)),
                &CancellationToken::new(),
                |_, _, _| {},
            )
            .await
            .unwrap();

        assert_eq!(moments.len(), 1);
        assert_eq!(moments[0].timestamp, 0.0);
    }

    #[tokio::test]
    async fn test_no_timeline_yields_no_moments() {
        let coordinator = coordinator(vec![hit("Never")], UnmatchedPolicy::Keep);
        let moments = coordinator
            .recognize_all(&[candidate(0.0)], None, &CancellationToken::new(), |_, _, _| {})
            .await
            .unwrap();
        assert!(moments.is_empty());
    }

    #[tokio::test]
    async fn test_cancelled_run_emits_nothing() {
        let coordinator = coordinator(vec![hit("X")], UnmatchedPolicy::Drop);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = coordinator
            .recognize_all(&[candidate(0.0), candidate(100.0)], Some(&timeline(200)), &cancel, |_, _, _| {})
            .await;
        assert!(matches!(result, Err(AnalysisError::Cancelled)));
    }

    #[tokio::test]
    async fn test_parallel_preserves_order() {
        let params = AnalysisParams::default();
        let coordinator = RecognitionCoordinator::new(
            Arc::new(ScriptedRecognizer {
                script: vec![hit("Same")],
                calls: AtomicUsize::new(0),
            }),
            &params,
            4,
        );
        let candidates: Vec<PeakCandidate> = (0..8).map(|i| candidate(i as f64 * 60.0)).collect();
        let mut last_done = 0;

        let moments = coordinator
            .recognize_all(&candidates, Some(&timeline(600)), &CancellationToken::new(), |done, _, _| {
                assert!(done > last_done);
                last_done = done;
            })
            .await
            .unwrap();

        let times: Vec<f64> = moments.iter().map(|m| m.timestamp).collect();
        assert_eq!(times, candidates.iter().map(|c| c.t).collect::<Vec<_>>());
    }
}
