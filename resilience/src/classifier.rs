//! Error classification for retry decisions

/// Top-level error classification
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorClass {
    /// Transient errors that should be retried with backoff
    Retryable(RetryableError),

    /// Permanent errors that should NOT be retried
    Permanent(PermanentError),
}

/// Transient errors (retry recommended)
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RetryableError {
    #[error("Network timeout after {0}s")]
    NetworkTimeout(u64),

    #[error("Connection refused")]
    ConnectionRefused,

    #[error("Connection lost mid-response")]
    ConnectionLost,

    #[error("Empty response")]
    EmptyResponse,

    #[error("Response cut off after {chars} characters")]
    Truncated { chars: usize },
}

/// Permanent errors (do NOT retry)
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PermanentError {
    #[error("Service rejected the request (HTTP {0})")]
    RequestRejected(u16),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Service error: {0}")]
    ServiceError(String),

    #[error("Unclassified error: {0}")]
    Unclassified(String),
}

/// Trait for error classification
pub trait RetryClassifiable {
    fn classify(&self) -> ErrorClass;

    fn is_retryable(&self) -> bool {
        matches!(self.classify(), ErrorClass::Retryable(_))
    }
}
