//! Backoff strategy implementation
//!
//! Exponential backoff through the backon crate: the delay before retry `n`
//! (0-based) is `initial_backoff * multiplier^n`, capped at `max_backoff`.
//! With the defaults that is 1s then 2s, for three attempts in total.

use std::fmt::Display;
use std::future::Future;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::time::Duration;

use backon::ExponentialBuilder;
use backon::Retryable;
use serde::Deserialize;

use crate::classifier::RetryClassifiable;

/// Retry configuration
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Retries after the first attempt (2 means 3 attempts in total).
    pub max_retries: usize,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
    pub backoff_multiplier: f32,
    /// Randomize each delay. Off by default so waits are predictable.
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            initial_backoff_ms: 1000,
            max_backoff_ms: 10_000,
            backoff_multiplier: 2.0,
            jitter: false,
        }
    }
}

impl RetryConfig {
    /// Total attempts including the first one.
    pub fn max_attempts(&self) -> usize {
        self.max_retries.saturating_add(1)
    }

    /// Delay before retry `retry_index` (0-based), ignoring jitter.
    pub fn delay_for(&self, retry_index: usize) -> Duration {
        let exponent = i32::try_from(retry_index).unwrap_or(i32::MAX);
        let ms = self.initial_backoff_ms as f64 * f64::from(self.backoff_multiplier).powi(exponent);
        Duration::from_millis(ms.min(self.max_backoff_ms as f64) as u64)
    }

    fn backoff(&self) -> ExponentialBuilder {
        let builder = ExponentialBuilder::default()
            .with_min_delay(Duration::from_millis(self.initial_backoff_ms))
            .with_max_delay(Duration::from_millis(self.max_backoff_ms))
            .with_factor(self.backoff_multiplier)
            .with_max_times(self.max_retries);
        if self.jitter {
            builder.with_jitter()
        } else {
            builder
        }
    }
}

/// Progress report emitted before each backoff sleep.
#[derive(Debug, Clone)]
pub struct RetryStatus {
    /// Attempts made so far (1-indexed)
    pub attempt: usize,
    /// Duration of the upcoming backoff sleep
    pub sleep: Duration,
    /// Human-readable description of the error that triggered the retry
    pub reason: String,
}

/// Why retrying stopped. Carries the last error.
#[derive(Debug, thiserror::Error)]
pub enum RetryError<E> {
    #[error("permanent error after {attempts} attempt(s): {source}")]
    Permanent { attempts: usize, source: E },

    #[error("retries exhausted after {attempts} attempt(s): {source}")]
    Exhausted { attempts: usize, source: E },
}

impl<E> RetryError<E> {
    pub fn attempts(&self) -> usize {
        match self {
            RetryError::Permanent { attempts, .. } | RetryError::Exhausted { attempts, .. } => {
                *attempts
            }
        }
    }

    pub fn inner(&self) -> &E {
        match self {
            RetryError::Permanent { source, .. } | RetryError::Exhausted { source, .. } => source,
        }
    }

    pub fn into_inner(self) -> E {
        match self {
            RetryError::Permanent { source, .. } | RetryError::Exhausted { source, .. } => source,
        }
    }
}

/// Execute operation with exponential backoff retry (using backon crate)
///
/// - Only errors classified as retryable via [`RetryClassifiable`] are retried
/// - `status_cb` runs before every backoff sleep
/// - Returns `Permanent` for non-retryable errors and `Exhausted` once the
///   retry budget is spent; both carry the last error
pub async fn execute_with_backoff<F, Fut, T, E, StatusCb>(
    mut operation: F,
    config: &RetryConfig,
    mut status_cb: StatusCb,
) -> Result<T, RetryError<E>>
where
    F: FnMut() -> Fut + Send,
    Fut: Future<Output = Result<T, E>> + Send,
    E: RetryClassifiable + Display + Send,
    StatusCb: FnMut(RetryStatus) + Send,
{
    let attempts = AtomicUsize::new(0);

    let result = (|| {
        attempts.fetch_add(1, Ordering::SeqCst);
        operation()
    })
    .retry(config.backoff())
    .when(|err: &E| err.is_retryable())
    .notify(|err: &E, sleep: Duration| {
        status_cb(RetryStatus {
            attempt: attempts.load(Ordering::SeqCst),
            sleep,
            reason: err.to_string(),
        });
    })
    .await;

    let attempts = attempts.load(Ordering::SeqCst);
    result.map_err(|source| {
        if source.is_retryable() {
            RetryError::Exhausted { attempts, source }
        } else {
            RetryError::Permanent { attempts, source }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::ErrorClass;
    use crate::classifier::PermanentError;
    use crate::classifier::RetryableError;
    use pretty_assertions::assert_eq;
    use std::sync::Arc;
    use std::sync::Mutex;
    use tokio::time::Instant;

    // Test error type that implements RetryClassifiable
    #[derive(Debug, thiserror::Error)]
    enum TestError {
        #[error("Transient error: {0}")]
        Transient(String),
        #[error("Permanent error: {0}")]
        Permanent(String),
    }

    impl RetryClassifiable for TestError {
        fn classify(&self) -> ErrorClass {
            match self {
                TestError::Transient(_) => ErrorClass::Retryable(RetryableError::NetworkTimeout(20)),
                TestError::Permanent(msg) => {
                    ErrorClass::Permanent(PermanentError::Unclassified(msg.clone()))
                }
            }
        }
    }

    #[test]
    fn test_backoff_config_defaults() {
        let config = RetryConfig::default();

        assert_eq!(config.max_retries, 2);
        assert_eq!(config.max_attempts(), 3);
        assert_eq!(config.initial_backoff_ms, 1000);
        assert_eq!(config.backoff_multiplier, 2.0);
        assert!(!config.jitter);
    }

    #[test]
    fn test_delay_schedule() {
        let config = RetryConfig::default();
        assert_eq!(config.delay_for(0), Duration::from_secs(1));
        assert_eq!(config.delay_for(1), Duration::from_secs(2));
        assert_eq!(config.delay_for(2), Duration::from_secs(4));
        // Capped by max_backoff_ms
        assert_eq!(config.delay_for(10), Duration::from_secs(10));
    }

    #[tokio::test(start_paused = true)]
    async fn test_immediate_success() {
        let call_count = Arc::new(AtomicUsize::new(0));
        let call_count_clone = call_count.clone();

        let result = execute_with_backoff(
            move || {
                let count = call_count_clone.clone();
                async move {
                    count.fetch_add(1, Ordering::SeqCst);
                    Ok::<i32, TestError>(42)
                }
            },
            &RetryConfig::default(),
            |_| {},
        )
        .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(call_count.load(Ordering::SeqCst), 1, "Should only call once on success");
    }

    #[tokio::test(start_paused = true)]
    async fn test_permanent_error_is_not_retried() {
        let call_count = Arc::new(AtomicUsize::new(0));
        let call_count_clone = call_count.clone();

        let result = execute_with_backoff(
            move || {
                let count = call_count_clone.clone();
                async move {
                    count.fetch_add(1, Ordering::SeqCst);
                    Err::<i32, TestError>(TestError::Permanent("HTTP 500".to_string()))
                }
            },
            &RetryConfig::default(),
            |_| {},
        )
        .await;

        let err = result.unwrap_err();
        assert!(matches!(err, RetryError::Permanent { attempts: 1, .. }));
        assert!(matches!(err.into_inner(), TestError::Permanent(_)));
        assert_eq!(call_count.load(Ordering::SeqCst), 1, "Should not retry permanent errors");
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_error_exhausts_budget() {
        let call_count = Arc::new(AtomicUsize::new(0));
        let call_count_clone = call_count.clone();

        let result = execute_with_backoff(
            move || {
                let count = call_count_clone.clone();
                async move {
                    count.fetch_add(1, Ordering::SeqCst);
                    Err::<i32, TestError>(TestError::Transient("timeout".to_string()))
                }
            },
            &RetryConfig::default(),
            |_| {},
        )
        .await;

        let err = result.unwrap_err();
        assert!(matches!(err, RetryError::Exhausted { attempts: 3, .. }));
        assert_eq!(err.attempts(), 3);
        assert_eq!(call_count.load(Ordering::SeqCst), 3, "Should be 1 initial + 2 retries");
    }

    #[tokio::test(start_paused = true)]
    async fn test_backoff_timing_and_status() {
        let call_times = Arc::new(Mutex::new(Vec::new()));
        let call_times_clone = call_times.clone();
        let statuses = Arc::new(Mutex::new(Vec::new()));
        let statuses_clone = statuses.clone();
        let start = Instant::now();

        let result = execute_with_backoff(
            move || {
                let times = call_times_clone.clone();
                async move {
                    let mut times = times.lock().unwrap();
                    times.push(start.elapsed());
                    if times.len() < 3 {
                        Err::<i32, TestError>(TestError::Transient("empty".to_string()))
                    } else {
                        Ok(7)
                    }
                }
            },
            &RetryConfig::default(),
            move |status| statuses_clone.lock().unwrap().push((status.attempt, status.sleep)),
        )
        .await;

        assert_eq!(result.unwrap(), 7);

        let times = call_times.lock().unwrap();
        assert_eq!(times.len(), 3);
        assert_eq!(times[0], Duration::ZERO);
        assert_eq!(times[1] - times[0], Duration::from_secs(1));
        assert_eq!(times[2] - times[1], Duration::from_secs(2));

        assert_eq!(
            *statuses.lock().unwrap(),
            vec![(1, Duration::from_secs(1)), (2, Duration::from_secs(2))]
        );
    }
}
