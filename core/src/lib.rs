//! Resilient mood-based content generation on top of a local Ollama server.
//!
//! [`ContentGenerator`] is the single entry point. It checks the per-mood
//! [`ResponseCache`], gates the call through a circuit breaker, retries
//! transient failures with exponential backoff, validates the accumulated
//! text and turns every failure into a user-facing message.

mod accumulate;
mod cache;
pub mod config;
mod error;
mod generator;
mod mood;

pub use accumulate::accumulate;
pub use accumulate::validate_content;
pub use cache::ResponseCache;
pub use config::ConfigError;
pub use config::MoodliftConfig;
pub use config::OllamaConfig;
pub use config::ValidationConfig;
pub use error::CIRCUIT_OPEN_MESSAGE;
pub use error::GenerationError;
pub use generator::ContentGenerator;
pub use generator::GenerationResult;
pub use mood::Mood;
