//! Music-recognition service client
//!
//! The recognizer is a black box: `recognize(clip) -> response text | none`.
//! A response is a JSON document; only `metadata.music[0].title` and
//! `metadata.music[0].artists[].name` are read. Any other shape is "no match".

use crate::error::RecognizerError;
use crate::models::RecognizedSong;
use async_trait::async_trait;
use partypower_common::config::RecognizerConfig;
use serde::Deserialize;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;

const USER_AGENT: &str = concat!("PartyPower/", env!("CARGO_PKG_VERSION"));
const ACCESS_KEY_HEADER: &str = "X-Access-Key";

/// Recognition service boundary
///
/// `Ok(None)` means the service answered but had nothing to say (e.g. an
/// empty body); `Err` is a transport or API failure.
#[async_trait]
pub trait Recognizer: Send + Sync {
    async fn recognize(&self, clip: &[u8]) -> Result<Option<String>, RecognizerError>;
}

#[derive(Debug, Deserialize)]
struct RecognitionResponse {
    metadata: RecognitionMetadata,
}

#[derive(Debug, Deserialize)]
struct RecognitionMetadata {
    music: Vec<MusicEntry>,
}

#[derive(Debug, Deserialize)]
struct MusicEntry {
    title: Option<String>,
    #[serde(default)]
    artists: Vec<ArtistEntry>,
}

#[derive(Debug, Deserialize)]
struct ArtistEntry {
    name: Option<String>,
}

/// Extract the first music match from a recognizer response
pub fn parse_recognition(body: &str) -> Option<RecognizedSong> {
    let response: RecognitionResponse = serde_json::from_str(body).ok()?;
    let entry = response.metadata.music.into_iter().next()?;

    let title = entry.title?.trim().to_string();
    if title.is_empty() {
        return None;
    }

    let artist = entry
        .artists
        .into_iter()
        .filter_map(|a| a.name)
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
        .collect::<Vec<_>>()
        .join(", ");

    Some(RecognizedSong { title, artist })
}

/// Spaces request starts at least `interval` apart
///
/// Each caller reserves the next free start slot and sleeps outside the
/// lock, so concurrent callers queue up in slot order while requests that
/// already started stay in flight together. Throughput is therefore bounded
/// by both `max_concurrency` and one start per `interval`.
struct RequestSpacer {
    next_slot: Mutex<Option<Instant>>,
    interval: Duration,
}

impl RequestSpacer {
    fn new(interval: Duration) -> Self {
        Self {
            next_slot: Mutex::new(None),
            interval,
        }
    }

    /// Reserve a start slot, returning when it may be used
    fn reserve(&self, now: Instant) -> Instant {
        let mut next = match self.next_slot.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let slot = next.map_or(now, |n| n.max(now));
        *next = Some(slot + self.interval);
        slot
    }

    async fn acquire(&self) {
        let now = Instant::now();
        let slot = self.reserve(now);
        if slot > now {
            tracing::debug!(wait = ?(slot - now), "Recognizer request spaced");
            tokio::time::sleep_until(slot).await;
        }
    }
}

/// HTTP recognizer: multipart upload of the WAV clip
pub struct HttpRecognizer {
    http_client: reqwest::Client,
    spacer: Arc<RequestSpacer>,
    endpoint: String,
    access_key: Option<String>,
}

impl HttpRecognizer {
    pub fn new(config: &RecognizerConfig) -> Result<Self, RecognizerError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| RecognizerError::NetworkError(e.to_string()))?;

        Ok(Self {
            http_client,
            spacer: Arc::new(RequestSpacer::new(Duration::from_millis(config.min_interval_ms))),
            endpoint: config.endpoint.clone(),
            access_key: config.access_key.clone().filter(|k| !k.trim().is_empty()),
        })
    }
}

#[async_trait]
impl Recognizer for HttpRecognizer {
    async fn recognize(&self, clip: &[u8]) -> Result<Option<String>, RecognizerError> {
        self.spacer.acquire().await;

        let part = reqwest::multipart::Part::bytes(clip.to_vec())
            .file_name("excerpt.wav")
            .mime_str("audio/wav")
            .map_err(|e| RecognizerError::NetworkError(e.to_string()))?;
        let form = reqwest::multipart::Form::new().part("sample", part);

        let mut request = self.http_client.post(&self.endpoint).multipart(form);
        if let Some(key) = &self.access_key {
            request = request.header(ACCESS_KEY_HEADER, key);
        }

        tracing::debug!(bytes = clip.len(), endpoint = %self.endpoint, "Submitting clip to recognizer");

        let response = request
            .send()
            .await
            .map_err(|e| RecognizerError::NetworkError(e.to_string()))?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(RecognizerError::InvalidAccessKey);
        }
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(RecognizerError::ApiError(status.as_u16(), error_text));
        }

        let body = response
            .text()
            .await
            .map_err(|e| RecognizerError::NetworkError(e.to_string()))?;

        Ok(Some(body).filter(|b| !b.trim().is_empty()))
    }
}
