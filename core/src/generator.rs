//! The content generation service.
//!
//! One call to [`ContentGenerator::generate_content`] runs:
//!
//! ```text
//! cache hit? ── yes ──> Success (no breaker, no network)
//!     │ no
//! breaker admits? ── no ──> Failure(circuit open)
//!     │ yes (closed, or the single half-open probe)
//! open stream → accumulate → validate   (retried on transient errors)
//!     │
//! Success: reset breaker, cache by mood   Failure: count one failure, translate
//! ```

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::sync::PoisonError;

use moodlift_ollama::GenerationTransport;
use moodlift_ollama::OllamaClient;
use moodlift_resilience::Admission;
use moodlift_resilience::CircuitBreaker;
use moodlift_resilience::CircuitState;
use moodlift_resilience::RetryConfig;
use moodlift_resilience::execute_with_backoff;
use serde::Serialize;
use tokio::time::Instant;

use crate::accumulate::accumulate;
use crate::cache::ResponseCache;
use crate::config::MoodliftConfig;
use crate::error::CIRCUIT_OPEN_MESSAGE;
use crate::mood::Mood;

/// Outcome of one generation request. Exactly one of content or message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum GenerationResult {
    Success { content: String },
    Failure { message: String },
}

impl GenerationResult {
    pub fn success(content: impl Into<String>) -> Self {
        GenerationResult::Success {
            content: content.into(),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        GenerationResult::Failure {
            message: message.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, GenerationResult::Success { .. })
    }

    pub fn content(&self) -> Option<&str> {
        match self {
            GenerationResult::Success { content } => Some(content),
            GenerationResult::Failure { .. } => None,
        }
    }

    pub fn message(&self) -> Option<&str> {
        match self {
            GenerationResult::Success { .. } => None,
            GenerationResult::Failure { message } => Some(message),
        }
    }
}

/// Resilient front door to the generation backend.
///
/// Holds the circuit breaker and the response cache for the whole process.
/// Locks are never held across an await, so concurrent calls are safe.
pub struct ContentGenerator {
    transport: Arc<dyn GenerationTransport>,
    breaker: Mutex<CircuitBreaker>,
    cache: Mutex<ResponseCache>,
    retry: RetryConfig,
    min_content_chars: usize,
}

impl ContentGenerator {
    pub fn new(transport: Arc<dyn GenerationTransport>, config: &MoodliftConfig) -> Self {
        Self {
            transport,
            breaker: Mutex::new(CircuitBreaker::new(config.circuit_breaker.clone())),
            cache: Mutex::new(ResponseCache::new()),
            retry: config.retry.clone(),
            min_content_chars: config.validation.min_content_chars,
        }
    }

    /// Build a generator talking to the Ollama server named in `config`.
    pub fn from_config(config: &MoodliftConfig) -> Self {
        let client = OllamaClient::new(&config.ollama.endpoint, &config.ollama.model)
            .with_timeout(config.ollama.timeout());
        Self::new(Arc::new(client), config)
    }

    /// Generate text for a prompt.
    ///
    /// `mood`, when given, keys the response cache. Never fails: every error
    /// comes back as [`GenerationResult::Failure`] with a user-facing message.
    pub async fn generate_content(&self, prompt: &str, mood: Option<Mood>) -> GenerationResult {
        let cached = mood.and_then(|m| self.cache().get(m).map(str::to_owned));
        if let Some(content) = cached {
            tracing::debug!(?mood, "serving cached response");
            return GenerationResult::Success { content };
        }

        let admission = self.breaker().try_acquire(Instant::now());
        let mut probe = ProbeSlot {
            breaker: &self.breaker,
            held: false,
        };
        match admission {
            Admission::Allowed => {}
            Admission::Probe => probe.held = true,
            Admission::Rejected { open_until } => {
                tracing::warn!(?mood, ?open_until, "circuit open, rejecting request");
                return GenerationResult::failure(CIRCUIT_OPEN_MESSAGE);
            }
        }

        let started = Instant::now();
        let transport = &self.transport;
        let min_chars = self.min_content_chars;
        let outcome = execute_with_backoff(
            || async move {
                let stream = transport.open_stream(prompt).await?;
                accumulate(stream, min_chars).await
            },
            &self.retry,
            |status| {
                tracing::warn!(
                    attempt = status.attempt,
                    delay_ms = status.sleep.as_millis() as u64,
                    error = %status.reason,
                    "generation attempt failed, retrying"
                );
            },
        )
        .await;
        probe.held = false;

        match outcome {
            Ok(content) => {
                self.breaker().record_success();
                if let Some(mood) = mood {
                    self.cache().put(mood, content.clone());
                }
                tracing::info!(
                    ?mood,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    chars = content.chars().count(),
                    "content generated"
                );
                GenerationResult::Success { content }
            }
            Err(err) => {
                self.breaker().record_failure(Instant::now());
                tracing::warn!(
                    ?mood,
                    attempts = err.attempts(),
                    error = %err.inner(),
                    "content generation failed"
                );
                GenerationResult::failure(err.inner().user_message())
            }
        }
    }

    /// Generate with the mood's own prompt, cached under that mood.
    pub async fn generate_for_mood(&self, mood: Mood) -> GenerationResult {
        self.generate_content(mood.prompt(), Some(mood)).await
    }

    /// When the open circuit will admit a probe; `None` if not currently open.
    pub fn circuit_open_until(&self) -> Option<Instant> {
        self.breaker().open_until(Instant::now())
    }

    /// Seconds left on the cooldown, rounded up; 0 when not open.
    pub fn cooldown_remaining(&self) -> u64 {
        self.breaker().remaining_secs(Instant::now())
    }

    pub fn circuit_state(&self) -> CircuitState {
        self.breaker().state()
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.breaker().consecutive_failures()
    }

    pub fn clear_cache(&self) {
        self.cache().clear();
        tracing::debug!("response cache cleared");
    }

    pub fn cached_moods(&self) -> usize {
        self.cache().len()
    }

    fn breaker(&self) -> MutexGuard<'_, CircuitBreaker> {
        self.breaker.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn cache(&self) -> MutexGuard<'_, ResponseCache> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Half-open probe slot, released if the call is dropped before finishing.
struct ProbeSlot<'a> {
    breaker: &'a Mutex<CircuitBreaker>,
    held: bool,
}

impl Drop for ProbeSlot<'_> {
    fn drop(&mut self) {
        if self.held {
            tracing::debug!("probe abandoned, releasing slot");
            self.breaker
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .release_probe();
        }
    }
}
