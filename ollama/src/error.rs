use std::time::Duration;

use thiserror::Error;

/// Failures raised while talking to the Ollama server.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The deadline elapsed before the response body completed.
    #[error("Request timed out after {} seconds", .0.as_secs())]
    Timeout(Duration),

    /// The server could not be reached at all.
    #[error("Failed to connect to Ollama at {endpoint}: {reason}")]
    ConnectionFailed { endpoint: String, reason: String },

    /// The connection dropped while the body was being read.
    #[error("Connection lost while reading response: {0}")]
    ConnectionLost(String),

    /// Non-success HTTP status.
    #[error("Ollama API returned status {status}: {reason}")]
    RequestFailed { status: u16, reason: String },

    /// Success status without a readable body.
    #[error("No response body received from Ollama")]
    NoResponseBody,

    /// A non-blank line was not a valid stream record.
    #[error("Failed to parse streaming response line {line:?}: {source}")]
    Parse {
        line: String,
        #[source]
        source: serde_json::Error,
    },

    /// The server reported an error inside the stream.
    #[error("Ollama reported an error: {0}")]
    ServiceError(String),

    /// Anything reqwest reports that is not a connect or timeout failure.
    #[error("HTTP error: {0}")]
    Http(String),
}

impl TransportError {
    /// Map a failure from sending the request (before any headers arrived).
    pub(crate) fn from_send(err: reqwest::Error, endpoint: &str, timeout: Duration) -> Self {
        if err.is_timeout() {
            TransportError::Timeout(timeout)
        } else if err.is_connect() || err.is_request() {
            TransportError::ConnectionFailed {
                endpoint: endpoint.to_string(),
                reason: err.to_string(),
            }
        } else {
            TransportError::Http(err.to_string())
        }
    }

    /// Map a failure from reading the response body.
    pub(crate) fn from_body(err: reqwest::Error, timeout: Duration) -> Self {
        if err.is_timeout() {
            TransportError::Timeout(timeout)
        } else {
            TransportError::ConnectionLost(err.to_string())
        }
    }
}
