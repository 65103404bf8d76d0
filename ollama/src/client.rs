//! HTTP client for the Ollama generate and tags endpoints.

use std::pin::Pin;
use std::task::Context;
use std::task::Poll;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;
use futures::StreamExt;
use reqwest::StatusCode;
use serde::Deserialize;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tokio_util::sync::DropGuard;

use crate::FragmentStream;
use crate::GenerationTransport;
use crate::TransportResult;
use crate::error::TransportError;
use crate::ndjson::NdjsonDecoder;
use crate::types::ConnectionStatus;
use crate::types::GenerateRequest;
use crate::types::StreamFragment;
use crate::types::TagsResponse;

/// Where a stock Ollama install listens.
pub const DEFAULT_ENDPOINT: &str = "http://localhost:11434";

/// Model used when none is configured.
pub const DEFAULT_MODEL: &str = "llama3.1:8b";

/// Absolute deadline for one request, headers and body included.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(20);

const FRAGMENT_CHANNEL_CAPACITY: usize = 64;

/// Error body Ollama returns alongside non-success statuses.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

/// Client for a single Ollama server and model.
#[derive(Debug, Clone)]
pub struct OllamaClient {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    timeout: Duration,
}

impl OllamaClient {
    pub fn new(endpoint: impl Into<String>, model: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), endpoint, model)
    }

    /// Creates a client around an existing HTTP client.
    pub fn with_client(
        client: reqwest::Client,
        endpoint: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            model: model.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.endpoint.trim_end_matches('/'))
    }

    /// Probe `/api/tags` to see whether the server is up.
    pub async fn check_health(&self) -> ConnectionStatus {
        let result = self
            .client
            .get(self.url("/api/tags"))
            .timeout(self.timeout)
            .send()
            .await;

        match result {
            Ok(response) if response.status().is_success() => ConnectionStatus::Connected,
            Ok(response) => {
                tracing::warn!(status = %response.status(), "Ollama health check returned error status");
                ConnectionStatus::Error
            }
            Err(err) if err.is_connect() => {
                tracing::debug!(endpoint = %self.endpoint, "Ollama not reachable: {err}");
                ConnectionStatus::Disconnected
            }
            Err(err) => {
                tracing::warn!(endpoint = %self.endpoint, "Ollama health check failed: {err}");
                ConnectionStatus::Error
            }
        }
    }

    /// Names of the models installed on the server.
    pub async fn list_models(&self) -> TransportResult<Vec<String>> {
        let response = self
            .client
            .get(self.url("/api/tags"))
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| TransportError::from_send(e, &self.endpoint, self.timeout))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::RequestFailed {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or("unknown").to_string(),
            });
        }

        let tags: TagsResponse = response
            .json()
            .await
            .map_err(|e| TransportError::Http(e.to_string()))?;
        Ok(tags.models.into_iter().map(|m| m.name).collect())
    }

    /// Start a streaming generation.
    ///
    /// The deadline is armed here and keeps running while the body is read by
    /// a background task; the returned stream yields `Timeout` if it fires.
    pub async fn generate_stream(&self, prompt: &str) -> TransportResult<OllamaStream> {
        let deadline = Instant::now() + self.timeout;
        let request = GenerateRequest {
            model: &self.model,
            prompt,
            stream: true,
        };

        tracing::debug!(
            model = %self.model,
            prompt_chars = prompt.chars().count(),
            "opening generation stream"
        );

        let send = self
            .client
            .post(self.url("/api/generate"))
            .json(&request)
            .send();
        let response = match tokio::time::timeout_at(deadline, send).await {
            Ok(result) => {
                result.map_err(|e| TransportError::from_send(e, &self.endpoint, self.timeout))?
            }
            Err(_) => return Err(TransportError::Timeout(self.timeout)),
        };

        let status = response.status();
        if !status.is_success() {
            let body = tokio::time::timeout_at(deadline, response.text())
                .await
                .ok()
                .and_then(Result::ok)
                .unwrap_or_default();
            let reason = serde_json::from_str::<ErrorBody>(&body)
                .map(|b| b.error)
                .unwrap_or_else(|_| status.canonical_reason().unwrap_or("unknown").to_string());
            return Err(TransportError::RequestFailed {
                status: status.as_u16(),
                reason,
            });
        }
        if status == StatusCode::NO_CONTENT {
            return Err(TransportError::NoResponseBody);
        }

        let (tx, rx) = mpsc::channel(FRAGMENT_CHANNEL_CAPACITY);
        let cancel = CancellationToken::new();
        let timeout = self.timeout;
        let body = response.bytes_stream();
        let pump_cancel = cancel.clone();
        tokio::spawn(async move {
            if let Err(err) = pump_body(body, &tx, deadline, timeout, &pump_cancel).await {
                let _ = tx.send(Err(err)).await;
            }
        });

        Ok(OllamaStream {
            rx,
            _cancel: cancel.drop_guard(),
        })
    }
}

#[async_trait]
impl GenerationTransport for OllamaClient {
    async fn open_stream(&self, prompt: &str) -> TransportResult<FragmentStream> {
        Ok(self.generate_stream(prompt).await?.boxed())
    }
}

/// Fragments of one generation, fed by a background task.
///
/// Dropping the stream cancels the task and releases the connection.
pub struct OllamaStream {
    rx: mpsc::Receiver<TransportResult<StreamFragment>>,
    _cancel: DropGuard,
}

impl Stream for OllamaStream {
    type Item = TransportResult<StreamFragment>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }
}

/// Read the body until a `done` record, end of body, error, deadline or
/// cancellation, forwarding fragments to `tx`.
async fn pump_body<S>(
    body: S,
    tx: &mpsc::Sender<TransportResult<StreamFragment>>,
    deadline: Instant,
    timeout: Duration,
    cancel: &CancellationToken,
) -> TransportResult<()>
where
    S: Stream<Item = Result<Bytes, reqwest::Error>>,
{
    let mut body = std::pin::pin!(body);
    let mut decoder = NdjsonDecoder::new();

    loop {
        let next = tokio::select! {
            biased;
            () = cancel.cancelled() => return Ok(()),
            () = tokio::time::sleep_until(deadline) => return Err(TransportError::Timeout(timeout)),
            next = body.next() => next,
        };

        let Some(chunk) = next else {
            break;
        };
        let chunk = chunk.map_err(|e| TransportError::from_body(e, timeout))?;
        decoder.extend(&chunk);

        while let Some(line) = decoder.next_line() {
            if forward_line(&line, tx).await? {
                return Ok(());
            }
        }
    }

    if let Some(rest) = decoder.finish() {
        forward_line(&rest, tx).await?;
    }
    Ok(())
}

/// Decode and forward one line. Returns `true` once production should stop.
async fn forward_line(
    line: &str,
    tx: &mpsc::Sender<TransportResult<StreamFragment>>,
) -> TransportResult<bool> {
    let Some(chunk) = NdjsonDecoder::parse_line(line)? else {
        return Ok(false);
    };
    if let Some(message) = chunk.error {
        return Err(TransportError::ServiceError(message));
    }

    let done = chunk.done;
    if done {
        tracing::debug!(
            model = %chunk.model,
            eval_count = ?chunk.eval_count,
            total_duration_ns = ?chunk.total_duration,
            "generation stream complete"
        );
    }
    if tx.send(Ok(chunk.into())).await.is_err() {
        // Receiver dropped
        return Ok(true);
    }
    Ok(done)
}
