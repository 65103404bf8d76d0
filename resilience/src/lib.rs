//! Retry and circuit-breaking primitives for calls to an unreliable service.
//!
//! This crate provides:
//! - Error classification (retryable vs permanent)
//! - Exponential backoff with a bounded number of retries
//! - Status callbacks for progress reporting
//! - A consecutive-failure circuit breaker with a single half-open probe

pub mod circuit_breaker;
pub mod classifier;
pub mod strategy;

pub use circuit_breaker::Admission;
pub use circuit_breaker::CircuitBreaker;
pub use circuit_breaker::CircuitBreakerConfig;
pub use circuit_breaker::CircuitState;
pub use classifier::ErrorClass;
pub use classifier::PermanentError;
pub use classifier::RetryClassifiable;
pub use classifier::RetryableError;
pub use strategy::RetryConfig;
pub use strategy::RetryError;
pub use strategy::RetryStatus;
pub use strategy::execute_with_backoff;
