//! Analysis progress events and broadcast bus
//!
//! The pipeline reports progress through an [`EventBus`]; an orchestrating
//! session controller (UI, CLI) subscribes and decides user messaging.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

/// Highlight analysis event types
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum AnalysisEvent {
    /// Analysis run started
    AnalysisStarted {
        session_id: Uuid,
        sample_count: usize,
        segment_count: usize,
        timestamp: DateTime<Utc>,
    },

    /// Audio segments merged into one timeline
    TimelineMerged {
        session_id: Uuid,
        valid_range_count: usize,
        covered_secs: f64,
        /// Merge status label ("single", "merged", "degraded", "unreconciled")
        status: String,
        timestamp: DateTime<Utc>,
    },

    /// Candidate windows selected for recognition
    CandidatesSelected {
        session_id: Uuid,
        count: usize,
        timestamp: DateTime<Utc>,
    },

    /// One candidate finished recognition (matched or not)
    RecognitionProgress {
        session_id: Uuid,
        completed: usize,
        total: usize,
        /// completed / total, non-decreasing within a run
        fraction: f64,
        timestamp: DateTime<Utc>,
    },

    /// A candidate was matched to a song
    MomentRecognized {
        session_id: Uuid,
        moment_timestamp: f64,
        title: String,
        timestamp: DateTime<Utc>,
    },

    /// Analysis finished with the final moment count
    AnalysisCompleted {
        session_id: Uuid,
        moments: usize,
        timestamp: DateTime<Utc>,
    },

    /// Analysis cancelled between candidates
    AnalysisCancelled {
        session_id: Uuid,
        timestamp: DateTime<Utc>,
    },

    /// Analysis failed
    AnalysisFailed {
        session_id: Uuid,
        message: String,
        timestamp: DateTime<Utc>,
    },
}

impl AnalysisEvent {
    /// Session the event belongs to
    pub fn session_id(&self) -> Uuid {
        match self {
            AnalysisEvent::AnalysisStarted { session_id, .. }
            | AnalysisEvent::TimelineMerged { session_id, .. }
            | AnalysisEvent::CandidatesSelected { session_id, .. }
            | AnalysisEvent::RecognitionProgress { session_id, .. }
            | AnalysisEvent::MomentRecognized { session_id, .. }
            | AnalysisEvent::AnalysisCompleted { session_id, .. }
            | AnalysisEvent::AnalysisCancelled { session_id, .. }
            | AnalysisEvent::AnalysisFailed { session_id, .. } => *session_id,
        }
    }
}

/// Broadcast bus for analysis events
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<AnalysisEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus with specified channel capacity
    ///
    /// Slow subscribers lose the oldest events once `capacity` is exceeded.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    pub fn subscribe(&self) -> broadcast::Receiver<AnalysisEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns `Err` if no subscribers are listening.
    #[allow(clippy::result_large_err)]
    pub fn emit(
        &self,
        event: AnalysisEvent,
    ) -> Result<usize, broadcast::error::SendError<AnalysisEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring if no subscribers are listening
    pub fn emit_lossy(&self, event: AnalysisEvent) {
        let _ = self.tx.send(event);
    }

    /// Get the current number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Get the configured channel capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
