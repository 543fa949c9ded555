//! Highlight analysis pipeline
//!
//! Single pass over a captured session:
//! 1. Parse the sensor log (bad rows skipped and counted)
//! 2. Reconcile audio segments into one timeline (optionally exported)
//! 3. Score sliding windows and align them onto the audio timeline
//! 4. Select spaced candidates that have real audio
//! 5. Recognize candidates (bounded parallel, cancellable)
//! 6. Filter to the final ranked report
//!
//! Every stage but recognition is synchronous and pure over materialized
//! data; audio decoding runs on the blocking pool.
//!
//! # Example
//! ```rust,ignore
//! let pipeline = HighlightPipeline::new(params, Arc::new(recognizer))?.with_events(bus);
//! let inputs = SessionInputs::discover(Path::new("session/"))?;
//! let report = pipeline.run_session(&inputs, None, &CancellationToken::new()).await?;
//! ```

use super::report::HighlightReport;
use super::session::SessionInputs;
use crate::error::{AnalysisError, AnalysisResult};
use crate::models::audio::{covered_secs, EPOCH_TIMESTAMP_THRESHOLD};
use crate::models::{PeakCandidate, SensorSample};
use crate::services::{
    parse_sensor_file, CandidateSelector, MergeOutcome, MomentFilter, PeakDetector,
    RecognitionCoordinator, Recognizer, TimelineReconciler,
};
use chrono::Utc;
use partypower_common::events::{AnalysisEvent, EventBus};
use partypower_common::AnalysisParams;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use uuid::Uuid;

/// Offset that moves session-relative candidate times onto the audio timeline
///
/// Only applies when both clocks are wall-clock epoch seconds.
pub fn timeline_offset(first_sample_t: f64, origin_epoch: f64) -> f64 {
    if first_sample_t >= EPOCH_TIMESTAMP_THRESHOLD && origin_epoch >= EPOCH_TIMESTAMP_THRESHOLD {
        first_sample_t - origin_epoch
    } else {
        0.0
    }
}

/// Highlight analysis orchestrator
///
/// Construct one per analysis run; components are built fresh from the
/// immutable parameters on every call.
pub struct HighlightPipeline {
    params: AnalysisParams,
    reconciler: Arc<TimelineReconciler>,
    recognizer: Arc<dyn Recognizer>,
    max_concurrency: usize,
    event_bus: Option<EventBus>,
}

impl HighlightPipeline {
    /// Create a pipeline, rejecting parameters the stages cannot run with
    pub fn new(params: AnalysisParams, recognizer: Arc<dyn Recognizer>) -> AnalysisResult<Self> {
        params.validate()?;
        let reconciler = TimelineReconciler::new().with_max_span(params.max_session_secs);
        Ok(Self {
            params,
            reconciler: Arc::new(reconciler),
            recognizer,
            max_concurrency: 1,
            event_bus: None,
        })
    }

    /// Replace the audio reconciler (custom segment loading)
    ///
    /// The session span limit still comes from the analysis parameters.
    pub fn with_reconciler(mut self, reconciler: TimelineReconciler) -> Self {
        self.reconciler = Arc::new(reconciler.with_max_span(self.params.max_session_secs));
        self
    }

    /// Allow up to `max_concurrency` recognizer calls in flight
    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency.max(1);
        self
    }

    /// Report progress on `event_bus`
    pub fn with_events(mut self, event_bus: EventBus) -> Self {
        self.event_bus = Some(event_bus);
        self
    }

    pub fn params(&self) -> &AnalysisParams {
        &self.params
    }

    fn emit(&self, event: AnalysisEvent) {
        if let Some(bus) = &self.event_bus {
            bus.emit_lossy(event);
        }
    }

    /// Analyze a discovered session directory
    pub async fn run_session(
        &self,
        inputs: &SessionInputs,
        merged_output: Option<&Path>,
        cancel: &CancellationToken,
    ) -> AnalysisResult<HighlightReport> {
        let session_id = Uuid::new_v4();

        let parsed = match parse_sensor_file(&inputs.sensor_log) {
            Ok(parsed) => parsed,
            Err(e) => {
                self.report_failure(session_id, &e);
                return Err(e);
            }
        };

        let mut warnings = Vec::new();
        if parsed.skipped > 0 {
            warnings.push(format!(
                "{} malformed sensor row(s) skipped (first at line {})",
                parsed.skipped,
                parsed.first_bad_line.unwrap_or_default()
            ));
        }

        self.analyze_with_warnings(
            session_id,
            &parsed.samples,
            &inputs.audio_segments,
            merged_output,
            cancel,
            warnings,
        )
        .await
    }

    /// Analyze already-parsed samples against a set of audio files
    pub async fn analyze(
        &self,
        samples: &[SensorSample],
        audio_paths: &[PathBuf],
        merged_output: Option<&Path>,
        cancel: &CancellationToken,
    ) -> AnalysisResult<HighlightReport> {
        self.analyze_with_warnings(
            Uuid::new_v4(),
            samples,
            audio_paths,
            merged_output,
            cancel,
            Vec::new(),
        )
        .await
    }

    async fn analyze_with_warnings(
        &self,
        session_id: Uuid,
        samples: &[SensorSample],
        audio_paths: &[PathBuf],
        merged_output: Option<&Path>,
        cancel: &CancellationToken,
        warnings: Vec<String>,
    ) -> AnalysisResult<HighlightReport> {
        let result = self
            .run_stages(session_id, samples, audio_paths, merged_output, cancel, warnings)
            .await;

        match &result {
            Ok(report) => {
                self.emit(AnalysisEvent::AnalysisCompleted {
                    session_id,
                    moments: report.moments.len(),
                    timestamp: Utc::now(),
                });
            }
            Err(e) => self.report_failure(session_id, e),
        }

        result
    }

    fn report_failure(&self, session_id: Uuid, error: &AnalysisError) {
        match error {
            AnalysisError::Cancelled => {
                info!(%session_id, "Analysis cancelled");
                self.emit(AnalysisEvent::AnalysisCancelled {
                    session_id,
                    timestamp: Utc::now(),
                });
            }
            e => {
                warn!(%session_id, error = %e, "Analysis failed");
                self.emit(AnalysisEvent::AnalysisFailed {
                    session_id,
                    message: e.to_string(),
                    timestamp: Utc::now(),
                });
            }
        }
    }

    async fn run_stages(
        &self,
        session_id: Uuid,
        samples: &[SensorSample],
        audio_paths: &[PathBuf],
        merged_output: Option<&Path>,
        cancel: &CancellationToken,
        mut warnings: Vec<String>,
    ) -> AnalysisResult<HighlightReport> {
        info!(
            %session_id,
            samples = samples.len(),
            segments = audio_paths.len(),
            "Starting highlight analysis"
        );
        self.emit(AnalysisEvent::AnalysisStarted {
            session_id,
            sample_count: samples.len(),
            segment_count: audio_paths.len(),
            timestamp: Utc::now(),
        });

        // Stage 1: audio timeline
        let outcome = self.reconcile(audio_paths, merged_output).await?;
        if let Some(warning) = outcome.status.warning() {
            warnings.push(warning);
        }
        self.emit(AnalysisEvent::TimelineMerged {
            session_id,
            valid_range_count: outcome.valid_ranges.len(),
            covered_secs: covered_secs(&outcome.valid_ranges),
            status: outcome.status.label().to_string(),
            timestamp: Utc::now(),
        });

        if cancel.is_cancelled() {
            return Err(AnalysisError::Cancelled);
        }

        // Stage 2: scoring, aligned to the audio timeline
        let detector = PeakDetector::new(&self.params);
        let offset = samples
            .first()
            .map(|first| timeline_offset(first.t, outcome.origin_epoch))
            .unwrap_or(0.0);
        let windows: Vec<PeakCandidate> = detector
            .detect(samples)
            .into_iter()
            .map(|candidate| candidate.shifted(offset))
            .collect();

        // Stage 3: selection
        let selected = CandidateSelector::new(&self.params).select(&windows, &outcome.valid_ranges);
        info!(
            %session_id,
            windows = windows.len(),
            selected = selected.len(),
            offset_secs = offset,
            "Candidates selected"
        );
        self.emit(AnalysisEvent::CandidatesSelected {
            session_id,
            count: selected.len(),
            timestamp: Utc::now(),
        });

        // Stage 4: recognition
        let coordinator =
            RecognitionCoordinator::new(Arc::clone(&self.recognizer), &self.params, self.max_concurrency);
        let moments = coordinator
            .recognize_all(&selected, outcome.timeline.as_ref(), cancel, |completed, total, moment| {
                self.emit(AnalysisEvent::RecognitionProgress {
                    session_id,
                    completed,
                    total,
                    fraction: completed as f64 / total as f64,
                    timestamp: Utc::now(),
                });
                if let Some(title) = moment.and_then(|m| m.title()) {
                    self.emit(AnalysisEvent::MomentRecognized {
                        session_id,
                        moment_timestamp: moment.map(|m| m.timestamp).unwrap_or_default(),
                        title: title.to_string(),
                        timestamp: Utc::now(),
                    });
                }
            })
            .await?;

        // Stage 5: final ranking
        let sensor_span = match (samples.first(), samples.last()) {
            (Some(first), Some(last)) => last.t - first.t,
            _ => 0.0,
        };
        let total_duration = outcome.total_duration.max(sensor_span);
        let ranked = MomentFilter::new(&self.params).filter(moments, total_duration);

        info!(
            %session_id,
            moments = ranked.len(),
            total_duration_secs = total_duration,
            "Highlight analysis complete"
        );

        Ok(HighlightReport::new(
            session_id,
            total_duration,
            &outcome.valid_ranges,
            outcome.status,
            warnings,
            &ranked,
        ))
    }

    async fn reconcile(
        &self,
        audio_paths: &[PathBuf],
        merged_output: Option<&Path>,
    ) -> AnalysisResult<MergeOutcome> {
        let reconciler = Arc::clone(&self.reconciler);
        let paths = audio_paths.to_vec();
        let output = merged_output.map(Path::to_path_buf);

        tokio::task::spawn_blocking(move || {
            let segments = reconciler.discover_segments(&paths);
            match output {
                Some(output) => reconciler.merge_and_export(&segments, &output),
                None => reconciler.merge(&segments),
            }
        })
        .await
        .map_err(|e| AnalysisError::AudioDecode(format!("Audio merge task failed: {}", e)))
    }
}
