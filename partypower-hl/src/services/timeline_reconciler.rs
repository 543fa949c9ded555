//! Audio timeline reconciliation
//!
//! Capture restarts recording after every interruption, leaving one audio
//! segment per uninterrupted stretch. The reconciler places each segment at
//! its wall-clock offset from the earliest segment, splices them into one
//! zero-filled mono timeline, and records which spans hold real audio.
//!
//! Failure handling:
//! - a segment whose metadata or audio cannot be loaded is skipped (partial fusion)
//! - a segment that would stretch the timeline past the session span limit is
//!   skipped, as is a session-relative start among epoch-stamped segments
//! - a failed export falls back to the first segment alone ([`MergeStatus::Degraded`])
//! - nothing loadable at all yields the unbounded sentinel range ([`MergeStatus::Unreconciled`])
//!
//! The timeline is assembled in memory and only handed out (or exported)
//! once complete.

use crate::error::{AnalysisError, AnalysisResult};
use crate::models::audio::covered_secs;
use partypower_common::params::DEFAULT_MAX_SESSION_SECS;
use crate::models::{AudioSegment, AudioTimeline, ValidAudioRange};
use crate::utils::audio_decoder::{self, DecodedAudio};
use crate::utils::wav_encoder;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Source of segment metadata and PCM
///
/// The default implementation decodes files with symphonia.
pub trait SegmentLoader: Send + Sync {
    /// Segment duration in seconds from container metadata
    fn probe_duration(&self, path: &Path) -> anyhow::Result<f64>;

    /// Decode the whole segment to mono PCM
    fn decode(&self, path: &Path) -> anyhow::Result<DecodedAudio>;
}

/// File-backed loader (symphonia)
#[derive(Debug, Default, Clone, Copy)]
pub struct SymphoniaLoader;

impl SegmentLoader for SymphoniaLoader {
    fn probe_duration(&self, path: &Path) -> anyhow::Result<f64> {
        audio_decoder::probe_duration(path)
    }

    fn decode(&self, path: &Path) -> anyhow::Result<DecodedAudio> {
        audio_decoder::decode_audio_file(path)
    }
}

/// How the merge went, for user messaging by the caller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum MergeStatus {
    /// One segment, passed through
    Single,
    /// Several segments spliced; `skipped` could not be loaded or placed
    Merged { skipped: usize },
    /// Export failed; only the first segment is considered valid
    Degraded { reason: String },
    /// No segment could be reconciled; ranges hold the unbounded sentinel
    Unreconciled { reason: String },
}

impl MergeStatus {
    pub fn label(&self) -> &'static str {
        match self {
            MergeStatus::Single => "single",
            MergeStatus::Merged { .. } => "merged",
            MergeStatus::Degraded { .. } => "degraded",
            MergeStatus::Unreconciled { .. } => "unreconciled",
        }
    }

    /// Warning text for reports, if the merge was not clean
    pub fn warning(&self) -> Option<String> {
        match self {
            MergeStatus::Single | MergeStatus::Merged { skipped: 0 } => None,
            MergeStatus::Merged { skipped } => {
                Some(format!("{} audio segment(s) could not be loaded or placed and were skipped", skipped))
            }
            MergeStatus::Degraded { reason } => Some(format!(
                "Audio merge degraded, only the first segment is used: {}",
                reason
            )),
            MergeStatus::Unreconciled { reason } => Some(format!(
                "Audio timeline could not be reconciled, recognition results are unreliable: {}",
                reason
            )),
        }
    }
}

/// Segment placed on the merged timeline
#[derive(Debug, Clone, PartialEq)]
pub struct Placement {
    pub segment: AudioSegment,
    /// Seconds from the earliest segment start
    pub offset: f64,
}

/// Pure layout of segments on the merged timeline
#[derive(Debug, Clone, PartialEq)]
pub struct TimelinePlan {
    /// Placements sorted by offset
    pub placements: Vec<Placement>,
    /// Sorted, non-overlapping spans containing audio
    pub valid_ranges: Vec<ValidAudioRange>,
    /// End of the last placed segment (seconds)
    pub total_duration: f64,
    /// Epoch seconds of timeline position 0
    pub origin_epoch: f64,
}

/// Lay segments out by their embedded start timestamps
///
/// Overlapping spans (clock skew between segments) are coalesced so the
/// ranges stay non-overlapping.
pub fn plan_timeline(segments: &[AudioSegment]) -> TimelinePlan {
    let mut sorted: Vec<AudioSegment> = segments.to_vec();
    sorted.sort_by(|a, b| a.start_timestamp.total_cmp(&b.start_timestamp));

    let origin_epoch = sorted.first().map(|s| s.start_timestamp).unwrap_or(0.0);

    let placements: Vec<Placement> = sorted
        .into_iter()
        .map(|segment| Placement {
            offset: segment.start_timestamp - origin_epoch,
            segment,
        })
        .collect();

    let mut valid_ranges: Vec<ValidAudioRange> = Vec::with_capacity(placements.len());
    for placement in &placements {
        let range = ValidAudioRange::new(
            placement.offset,
            placement.offset + placement.segment.duration,
        );
        match valid_ranges.last_mut() {
            Some(last) if range.start < last.end => last.end = last.end.max(range.end),
            _ => valid_ranges.push(range),
        }
    }

    let total_duration = valid_ranges.last().map(|r| r.end).unwrap_or(0.0);

    TimelinePlan {
        placements,
        valid_ranges,
        total_duration,
        origin_epoch,
    }
}

/// Keep the segments that fit one session span, reject the rest
///
/// Once any start is an epoch timestamp, session-relative starts cannot be
/// placed against it and are rejected. The kept set is the span-bounded run
/// holding the most segments (then the most audio, then the earliest).
/// Returns `(kept, rejected)`; kept is sorted by start.
pub fn bound_segments(
    segments: &[AudioSegment],
    max_span_secs: f64,
) -> (Vec<AudioSegment>, Vec<AudioSegment>) {
    let (mut candidates, mut rejected): (Vec<AudioSegment>, Vec<AudioSegment>) =
        segments.iter().cloned().partition(|s| {
            s.start_timestamp.is_finite() && s.duration.is_finite() && s.duration <= max_span_secs
        });

    if candidates.iter().any(AudioSegment::has_epoch_start) {
        let (epoch, relative): (Vec<_>, Vec<_>) =
            candidates.into_iter().partition(AudioSegment::has_epoch_start);
        candidates = epoch;
        rejected.extend(relative);
    }

    candidates.sort_by(|a, b| a.start_timestamp.total_cmp(&b.start_timestamp));

    let mut best: Vec<usize> = Vec::new();
    let mut best_covered = 0.0;
    for (i, anchor) in candidates.iter().enumerate() {
        let origin = anchor.start_timestamp;
        let mut run = Vec::new();
        let mut covered = 0.0;
        for (j, segment) in candidates.iter().enumerate().skip(i) {
            if segment.start_timestamp - origin > max_span_secs {
                break;
            }
            if segment.start_timestamp + segment.duration - origin <= max_span_secs {
                run.push(j);
                covered += segment.duration;
            }
        }
        if run.len() > best.len() || (run.len() == best.len() && covered > best_covered) {
            best = run;
            best_covered = covered;
        }
    }

    let mut kept = Vec::with_capacity(best.len());
    for (i, segment) in candidates.into_iter().enumerate() {
        if best.contains(&i) {
            kept.push(segment);
        } else {
            rejected.push(segment);
        }
    }

    (kept, rejected)
}

/// Result of reconciling a session's audio
#[derive(Debug, Clone)]
pub struct MergeOutcome {
    /// Merged audio, absent when nothing could be decoded
    pub timeline: Option<AudioTimeline>,
    pub valid_ranges: Vec<ValidAudioRange>,
    pub status: MergeStatus,
    /// Session length covered by the timeline (seconds)
    pub total_duration: f64,
    /// Epoch seconds of timeline position 0
    pub origin_epoch: f64,
}

impl MergeOutcome {
    fn unreconciled(reason: impl Into<String>) -> Self {
        Self {
            timeline: None,
            valid_ranges: vec![ValidAudioRange::UNBOUNDED],
            status: MergeStatus::Unreconciled {
                reason: reason.into(),
            },
            total_duration: 0.0,
            origin_epoch: 0.0,
        }
    }
}

/// Splices session audio segments into one timeline
pub struct TimelineReconciler {
    loader: Box<dyn SegmentLoader>,
    max_span_secs: f64,
}

impl Default for TimelineReconciler {
    fn default() -> Self {
        Self::new()
    }
}

impl TimelineReconciler {
    /// Create reconciler backed by symphonia decoding
    pub fn new() -> Self {
        Self::with_loader(Box::new(SymphoniaLoader))
    }

    /// Create reconciler with a custom segment loader
    pub fn with_loader(loader: Box<dyn SegmentLoader>) -> Self {
        Self {
            loader,
            max_span_secs: DEFAULT_MAX_SESSION_SECS,
        }
    }

    /// Limit the merged timeline to `max_span_secs` of wall-clock time
    pub fn with_max_span(mut self, max_span_secs: f64) -> Self {
        self.max_span_secs = max_span_secs;
        self
    }

    fn bounded(&self, segments: &[AudioSegment]) -> (Vec<AudioSegment>, usize) {
        let (kept, rejected) = bound_segments(segments, self.max_span_secs);
        for segment in &rejected {
            warn!(
                segment = %segment.source.display(),
                start = segment.start_timestamp,
                duration_secs = segment.duration,
                max_span_secs = self.max_span_secs,
                "Segment falls outside the session span, skipping"
            );
        }
        (kept, rejected.len())
    }

    /// Build segments from audio files: start from filename, duration from metadata
    ///
    /// Files whose timestamp or duration cannot be read are skipped.
    pub fn discover_segments(&self, paths: &[PathBuf]) -> Vec<AudioSegment> {
        let mut segments = Vec::with_capacity(paths.len());

        for path in paths {
            let Some(start) = AudioSegment::start_timestamp_from_filename(path) else {
                warn!(segment = %path.display(), "No start timestamp in filename, skipping segment");
                continue;
            };

            match self.loader.probe_duration(path) {
                Ok(duration) if duration > 0.0 => {
                    segments.push(AudioSegment::new(path.clone(), start, duration));
                }
                Ok(_) => {
                    warn!(segment = %path.display(), "Empty audio segment, skipping");
                }
                Err(e) => {
                    warn!(segment = %path.display(), error = %e, "Failed to load segment metadata, skipping");
                }
            }
        }

        segments
    }

    /// Merge segments into one timeline
    pub fn merge(&self, segments: &[AudioSegment]) -> MergeOutcome {
        let (kept, out_of_span) = self.bounded(segments);
        match kept.as_slice() {
            [] if out_of_span == 0 => MergeOutcome::unreconciled("no audio segments"),
            [] => MergeOutcome::unreconciled("no segment fits the session span"),
            [single] if out_of_span == 0 => self.pass_through(single),
            _ => self.splice(&kept, out_of_span),
        }
    }

    /// Merge and write the merged timeline as WAV
    ///
    /// The file is written under a temporary name and renamed into place, so
    /// a failed export never leaves a half-written timeline behind.
    pub fn merge_and_export(&self, segments: &[AudioSegment], output: &Path) -> MergeOutcome {
        let outcome = self.merge(segments);

        let Some(timeline) = outcome.timeline.as_ref() else {
            return outcome;
        };

        match export_timeline(timeline, output) {
            Ok(()) => {
                info!(path = %output.display(), "Merged audio exported");
                outcome
            }
            Err(e) => {
                warn!(path = %output.display(), error = %e, "Merged audio export failed, falling back to first segment");
                self.first_segment_fallback(segments, e.to_string())
            }
        }
    }

    fn pass_through(&self, segment: &AudioSegment) -> MergeOutcome {
        let range = ValidAudioRange::new(0.0, segment.duration);
        match self.loader.decode(&segment.source) {
            Ok(decoded) => MergeOutcome {
                timeline: Some(AudioTimeline {
                    samples: decoded.samples,
                    sample_rate: decoded.sample_rate,
                    origin_epoch: segment.start_timestamp,
                }),
                valid_ranges: vec![range],
                status: MergeStatus::Single,
                total_duration: segment.duration,
                origin_epoch: segment.start_timestamp,
            },
            Err(e) => {
                warn!(segment = %segment.source.display(), error = %e, "Failed to decode single segment");
                MergeOutcome {
                    timeline: None,
                    valid_ranges: vec![range],
                    status: MergeStatus::Degraded {
                        reason: e.to_string(),
                    },
                    total_duration: segment.duration,
                    origin_epoch: segment.start_timestamp,
                }
            }
        }
    }

    /// Splice span-bounded segments; `out_of_span` were already rejected
    fn splice(&self, segments: &[AudioSegment], out_of_span: usize) -> MergeOutcome {
        // Decode everything first, converting to the first decoded segment's
        // sample rate; drop segments that fail either step
        let mut sample_rate: Option<u32> = None;
        let mut loaded: Vec<(AudioSegment, Vec<f32>)> = Vec::with_capacity(segments.len());
        for segment in segments {
            let decoded = match self.loader.decode(&segment.source) {
                Ok(decoded) => decoded,
                Err(e) => {
                    warn!(segment = %segment.source.display(), error = %e, "Failed to decode segment, skipping");
                    continue;
                }
            };
            let target_rate = *sample_rate.get_or_insert(decoded.sample_rate);
            match audio_decoder::resample_mono(decoded.samples, decoded.sample_rate, target_rate) {
                Ok(pcm) => loaded.push((segment.clone(), pcm)),
                Err(e) => {
                    warn!(segment = %segment.source.display(), error = %e, "Failed to resample segment, skipping");
                }
            }
        }
        let skipped = out_of_span + segments.len() - loaded.len();

        let Some(sample_rate) = sample_rate.filter(|_| !loaded.is_empty()) else {
            return MergeOutcome::unreconciled("no segment could be decoded");
        };

        let plan = plan_timeline(&loaded.iter().map(|(s, _)| s.clone()).collect::<Vec<_>>());

        let mut samples: Vec<f32> =
            vec![0.0; (plan.total_duration * sample_rate as f64).ceil() as usize];

        for placement in &plan.placements {
            let Some(index) = loaded.iter().position(|(s, _)| *s == placement.segment) else {
                continue;
            };
            let (segment, pcm) = loaded.swap_remove(index);

            let start = (placement.offset * sample_rate as f64).round() as usize;
            let end = start + pcm.len();
            if samples.len() < end {
                samples.resize(end, 0.0);
            }
            samples[start..end].copy_from_slice(&pcm);

            debug!(
                segment = %segment.source.display(),
                offset_secs = placement.offset,
                duration_secs = segment.duration,
                "Segment spliced"
            );
        }

        info!(
            segments = plan.placements.len(),
            skipped,
            ranges = plan.valid_ranges.len(),
            covered_secs = covered_secs(&plan.valid_ranges),
            total_secs = plan.total_duration,
            "Audio timeline merged"
        );

        MergeOutcome {
            timeline: Some(AudioTimeline {
                samples,
                sample_rate,
                origin_epoch: plan.origin_epoch,
            }),
            valid_ranges: plan.valid_ranges,
            status: MergeStatus::Merged { skipped },
            total_duration: plan.total_duration,
            origin_epoch: plan.origin_epoch,
        }
    }

    fn first_segment_fallback(&self, segments: &[AudioSegment], reason: String) -> MergeOutcome {
        let (kept, _) = bound_segments(segments, self.max_span_secs);
        let plan = plan_timeline(&kept);
        let Some(first) = plan.placements.first().map(|p| p.segment.clone()) else {
            return MergeOutcome::unreconciled(reason);
        };

        let mut outcome = self.pass_through(&first);
        outcome.status = MergeStatus::Degraded { reason };
        outcome
    }
}

/// Write a timeline as WAV via a temporary file and rename
pub fn export_timeline(timeline: &AudioTimeline, output: &Path) -> AnalysisResult<()> {
    let partial = output.with_extension("wav.partial");
    wav_encoder::write_wav_file(&partial, &timeline.samples, timeline.sample_rate)
        .map_err(|e| AnalysisError::Export(format!("{}: {}", partial.display(), e)))?;
    std::fs::rename(&partial, output).map_err(|e| {
        let _ = std::fs::remove_file(&partial);
        AnalysisError::Export(format!("{}: {}", output.display(), e))
    })?;
    Ok(())
}
