//! Generation failures and their user-facing wording.

use moodlift_ollama::TransportError;
use moodlift_resilience::ErrorClass;
use moodlift_resilience::PermanentError;
use moodlift_resilience::RetryClassifiable;
use moodlift_resilience::RetryableError;
use thiserror::Error;

/// Shown when the circuit breaker rejects a call.
pub const CIRCUIT_OPEN_MESSAGE: &str =
    "Service temporarily unavailable. Please try again in a moment";

const EMPTY_RESPONSE_MESSAGE: &str = "Unable to generate content. Please try again";
const INTERRUPTED_MESSAGE: &str = "Generation failed. Please try again";
const CONNECTION_MESSAGE: &str = "Unable to connect to local AI service";
const TIMEOUT_MESSAGE: &str = "Request timed out. Please try again";
const SERVICE_MESSAGE: &str = "AI service encountered an error";
const GENERIC_MESSAGE: &str = "Something went wrong. Please try again";

/// A single failed generation attempt.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("Empty response from AI service")]
    EmptyResponse,

    #[error("Generation interrupted after {chars} characters")]
    InterruptedGeneration { chars: usize },
}

impl GenerationError {
    /// Fixed message for the end user. Never exposes internal detail.
    pub fn user_message(&self) -> &'static str {
        match self {
            GenerationError::EmptyResponse => EMPTY_RESPONSE_MESSAGE,
            GenerationError::InterruptedGeneration { .. } => INTERRUPTED_MESSAGE,
            GenerationError::Transport(err) => match err {
                TransportError::ConnectionFailed { .. } | TransportError::ConnectionLost(_) => {
                    CONNECTION_MESSAGE
                }
                TransportError::Timeout(_) => TIMEOUT_MESSAGE,
                TransportError::RequestFailed { .. } | TransportError::ServiceError(_) => {
                    SERVICE_MESSAGE
                }
                TransportError::NoResponseBody
                | TransportError::Parse { .. }
                | TransportError::Http(_) => GENERIC_MESSAGE,
            },
        }
    }
}

impl RetryClassifiable for GenerationError {
    fn classify(&self) -> ErrorClass {
        match self {
            GenerationError::EmptyResponse => ErrorClass::Retryable(RetryableError::EmptyResponse),
            GenerationError::InterruptedGeneration { chars } => {
                ErrorClass::Retryable(RetryableError::Truncated { chars: *chars })
            }
            GenerationError::Transport(err) => classify_transport(err),
        }
    }
}

fn classify_transport(err: &TransportError) -> ErrorClass {
    match err {
        TransportError::Timeout(limit) => {
            ErrorClass::Retryable(RetryableError::NetworkTimeout(limit.as_secs()))
        }
        TransportError::ConnectionFailed { .. } => {
            ErrorClass::Retryable(RetryableError::ConnectionRefused)
        }
        TransportError::ConnectionLost(_) => ErrorClass::Retryable(RetryableError::ConnectionLost),
        TransportError::RequestFailed { status, .. } => {
            ErrorClass::Permanent(PermanentError::RequestRejected(*status))
        }
        TransportError::Parse { line, .. } => {
            ErrorClass::Permanent(PermanentError::MalformedResponse(line.clone()))
        }
        TransportError::ServiceError(message) => {
            ErrorClass::Permanent(PermanentError::ServiceError(message.clone()))
        }
        TransportError::NoResponseBody | TransportError::Http(_) => {
            ErrorClass::Permanent(PermanentError::Unclassified(err.to_string()))
        }
    }
}
