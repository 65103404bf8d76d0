//! Streaming client for a local Ollama server.
//!
//! Talks to two endpoints:
//! - `POST /api/generate` for streaming text generation (newline-delimited JSON)
//! - `GET /api/tags` for reachability and installed-model checks
//!
//! The [`GenerationTransport`] trait is the seam higher layers depend on, so
//! retry and circuit-breaking logic can be exercised without a live server.

mod client;
mod error;
mod ndjson;
mod types;

pub use client::DEFAULT_ENDPOINT;
pub use client::DEFAULT_MODEL;
pub use client::DEFAULT_TIMEOUT;
pub use client::OllamaClient;
pub use client::OllamaStream;
pub use error::TransportError;
pub use ndjson::NdjsonDecoder;
pub use types::ConnectionStatus;
pub use types::GenerateRequest;
pub use types::StreamChunk;
pub use types::StreamFragment;

use async_trait::async_trait;
use futures::stream::BoxStream;

/// Result type for transport operations.
pub type TransportResult<T> = Result<T, TransportError>;

/// Lazily produced, finite sequence of response fragments.
///
/// Errors are yielded in-band and end the sequence.
pub type FragmentStream = BoxStream<'static, TransportResult<StreamFragment>>;

/// Opens a streaming generation for a prompt.
///
/// Each call issues exactly one request. The returned stream is not
/// restartable; a retry means calling `open_stream` again.
#[async_trait]
pub trait GenerationTransport: Send + Sync {
    async fn open_stream(&self, prompt: &str) -> TransportResult<FragmentStream>;
}
