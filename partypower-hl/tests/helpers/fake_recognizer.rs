//! Scripted recognizer for pipeline tests

use async_trait::async_trait;
use partypower_hl::error::RecognizerError;
use partypower_hl::services::Recognizer;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Recognition service response for one song
pub fn song_response(title: &str, artist: &str) -> String {
    serde_json::json!({
        "status": {"code": 0},
        "metadata": {"music": [{"title": title, "artists": [{"name": artist}]}]}
    })
    .to_string()
}

enum Mode {
    /// Same song for every clip
    Always(String),
    /// "Song 1", "Song 2", ... in call order
    Distinct,
    /// Service reachable but never matches
    NoMatch,
    /// Every request fails
    Failing,
}

pub struct FakeRecognizer {
    mode: Mode,
    calls: AtomicUsize,
}

impl FakeRecognizer {
    fn with_mode(mode: Mode) -> Self {
        Self {
            mode,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn always(title: &str) -> Self {
        Self::with_mode(Mode::Always(song_response(title, "Test Artist")))
    }

    pub fn distinct() -> Self {
        Self::with_mode(Mode::Distinct)
    }

    pub fn no_match() -> Self {
        Self::with_mode(Mode::NoMatch)
    }

    pub fn failing() -> Self {
        Self::with_mode(Mode::Failing)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Recognizer for FakeRecognizer {
    async fn recognize(&self, clip: &[u8]) -> Result<Option<String>, RecognizerError> {
        assert!(clip.starts_with(b"RIFF"), "recognizer expects WAV clips");
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;

        match &self.mode {
            Mode::Always(body) => Ok(Some(body.clone())),
            Mode::Distinct => Ok(Some(song_response(&format!("Song {}", call), "Test Artist"))),
            Mode::NoMatch => Ok(Some(r#"{"status": {"code": 1001, "msg": "No result"}}"#.to_string())),
            Mode::Failing => Err(RecognizerError::NetworkError("connection refused".to_string())),
        }
    }
}
