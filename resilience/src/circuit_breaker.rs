//! Circuit breaker for cascading failure prevention
//!
//! ```text
//! Closed   → Open:     consecutive failures reach the threshold
//! Open     → HalfOpen: first call at or after the cooldown deadline (the probe)
//! HalfOpen → Closed:   probe succeeds
//! HalfOpen → Open:     probe fails, with a fresh cooldown
//! ```
//!
//! The breaker is a plain state machine; callers pass the current instant so
//! it can be driven deterministically.

use std::time::Duration;

use serde::Deserialize;
use tokio::time::Instant;

/// Circuit breaker state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    Closed,   // Normal operation
    Open,     // Failure threshold reached, fast-fail
    HalfOpen, // Testing if service recovered
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CircuitBreakerConfig {
    pub failure_threshold: u32,
    pub cooldown_ms: u64,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 3,
            cooldown_ms: 15_000,
        }
    }
}

impl CircuitBreakerConfig {
    pub fn cooldown(&self) -> Duration {
        Duration::from_millis(self.cooldown_ms)
    }
}

/// Outcome of asking the breaker whether a call may proceed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// Circuit closed.
    Allowed,
    /// Circuit half-open; this caller is the single probe.
    Probe,
    /// Fail fast. `open_until` is unset when another probe is in flight.
    Rejected { open_until: Option<Instant> },
}

#[derive(Debug)]
pub struct CircuitBreaker {
    config: CircuitBreakerConfig,
    state: CircuitState,
    consecutive_failures: u32,
    open_until: Option<Instant>,
    probe_in_flight: bool,
}

impl Default for CircuitBreaker {
    fn default() -> Self {
        Self::new(CircuitBreakerConfig::default())
    }
}

impl CircuitBreaker {
    pub fn new(config: CircuitBreakerConfig) -> Self {
        Self {
            config,
            state: CircuitState::Closed,
            consecutive_failures: 0,
            open_until: None,
            probe_in_flight: false,
        }
    }

    pub fn state(&self) -> CircuitState {
        self.state
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    /// Gate a call. Moves `Open` to `HalfOpen` once the cooldown has passed.
    pub fn try_acquire(&mut self, now: Instant) -> Admission {
        match self.state {
            CircuitState::Closed => Admission::Allowed,
            CircuitState::Open => match self.open_until {
                Some(until) if now < until => Admission::Rejected {
                    open_until: Some(until),
                },
                _ => {
                    tracing::info!(
                        failures = self.consecutive_failures,
                        "circuit half-open, allowing probe"
                    );
                    self.state = CircuitState::HalfOpen;
                    self.probe_in_flight = true;
                    Admission::Probe
                }
            },
            CircuitState::HalfOpen if self.probe_in_flight => {
                Admission::Rejected { open_until: None }
            }
            CircuitState::HalfOpen => {
                self.probe_in_flight = true;
                Admission::Probe
            }
        }
    }

    pub fn record_success(&mut self) {
        if self.state != CircuitState::Closed {
            tracing::info!("circuit closed after successful probe");
        }
        self.state = CircuitState::Closed;
        self.consecutive_failures = 0;
        self.open_until = None;
        self.probe_in_flight = false;
    }

    /// Count one terminal failure; opens the circuit at the threshold.
    pub fn record_failure(&mut self, now: Instant) {
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);
        self.probe_in_flight = false;

        if self.consecutive_failures >= self.config.failure_threshold {
            let until = now + self.config.cooldown();
            tracing::warn!(
                failures = self.consecutive_failures,
                cooldown_ms = self.config.cooldown_ms,
                "circuit open"
            );
            self.state = CircuitState::Open;
            self.open_until = Some(until);
        }
    }

    /// Give back a probe slot whose call never reported an outcome.
    pub fn release_probe(&mut self) {
        if self.state == CircuitState::HalfOpen {
            self.probe_in_flight = false;
        }
    }

    /// Instant the cooldown ends, or `None` when closed or already elapsed.
    pub fn open_until(&self, now: Instant) -> Option<Instant> {
        match self.state {
            CircuitState::Open => self.open_until.filter(|until| now < *until),
            CircuitState::Closed | CircuitState::HalfOpen => None,
        }
    }

    pub fn cooldown_remaining(&self, now: Instant) -> Duration {
        self.open_until(now)
            .map(|until| until - now)
            .unwrap_or(Duration::ZERO)
    }

    /// Remaining cooldown in whole seconds, rounded up, for countdowns.
    pub fn remaining_secs(&self, now: Instant) -> u64 {
        let remaining = self.cooldown_remaining(now);
        remaining.as_secs() + u64::from(remaining.subsec_nanos() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const COOLDOWN: Duration = Duration::from_secs(15);

    fn open_breaker(now: Instant) -> CircuitBreaker {
        let mut breaker = CircuitBreaker::default();
        for _ in 0..3 {
            assert_eq!(breaker.try_acquire(now), Admission::Allowed);
            breaker.record_failure(now);
        }
        breaker
    }

    #[test]
    fn starts_closed() {
        let breaker = CircuitBreaker::default();
        assert_eq!(breaker.state(), CircuitState::Closed);
        assert_eq!(breaker.consecutive_failures(), 0);
        assert_eq!(breaker.open_until(Instant::now()), None);
    }

    #[test]
    fn stays_closed_below_threshold() {
        let now = Instant::now();
        let mut breaker = CircuitBreaker::default();
        breaker.record_failure(now);
        breaker.record_failure(now);

        assert_eq!(breaker.state(), CircuitState::Closed);
        assert_eq!(breaker.consecutive_failures(), 2);
        assert_eq!(breaker.try_acquire(now), Admission::Allowed);
    }

    #[test]
    fn success_resets_failure_count() {
        let now = Instant::now();
        let mut breaker = CircuitBreaker::default();
        breaker.record_failure(now);
        breaker.record_failure(now);
        breaker.record_success();
        breaker.record_failure(now);

        assert_eq!(breaker.state(), CircuitState::Closed);
        assert_eq!(breaker.consecutive_failures(), 1);
    }

    #[test]
    fn opens_at_threshold_and_rejects_during_cooldown() {
        let now = Instant::now();
        let mut breaker = open_breaker(now);

        assert_eq!(breaker.state(), CircuitState::Open);
        assert_eq!(breaker.open_until(now), Some(now + COOLDOWN));
        assert_eq!(
            breaker.try_acquire(now + Duration::from_secs(14)),
            Admission::Rejected {
                open_until: Some(now + COOLDOWN)
            }
        );
        // Rejections do not count as failures.
        assert_eq!(breaker.consecutive_failures(), 3);
    }

    #[test]
    fn single_probe_after_cooldown() {
        let now = Instant::now();
        let mut breaker = open_breaker(now);
        let later = now + COOLDOWN;

        assert_eq!(breaker.open_until(later), None);
        assert_eq!(breaker.try_acquire(later), Admission::Probe);
        assert_eq!(breaker.state(), CircuitState::HalfOpen);
        assert_eq!(
            breaker.try_acquire(later),
            Admission::Rejected { open_until: None }
        );
    }

    #[test]
    fn probe_success_closes() {
        let now = Instant::now();
        let mut breaker = open_breaker(now);
        assert_eq!(breaker.try_acquire(now + COOLDOWN), Admission::Probe);

        breaker.record_success();

        assert_eq!(breaker.state(), CircuitState::Closed);
        assert_eq!(breaker.consecutive_failures(), 0);
        assert_eq!(breaker.try_acquire(now + COOLDOWN), Admission::Allowed);
    }

    #[test]
    fn probe_failure_reopens_with_fresh_cooldown() {
        let now = Instant::now();
        let mut breaker = open_breaker(now);
        let probe_at = now + COOLDOWN + Duration::from_secs(1);
        assert_eq!(breaker.try_acquire(probe_at), Admission::Probe);

        breaker.record_failure(probe_at);

        assert_eq!(breaker.state(), CircuitState::Open);
        assert_eq!(breaker.consecutive_failures(), 4);
        assert_eq!(breaker.open_until(probe_at), Some(probe_at + COOLDOWN));
    }

    #[test]
    fn released_probe_lets_next_caller_probe() {
        let now = Instant::now();
        let mut breaker = open_breaker(now);
        assert_eq!(breaker.try_acquire(now + COOLDOWN), Admission::Probe);

        breaker.release_probe();

        assert_eq!(breaker.state(), CircuitState::HalfOpen);
        assert_eq!(breaker.try_acquire(now + COOLDOWN), Admission::Probe);
    }

    #[test]
    fn remaining_secs_rounds_up() {
        let now = Instant::now();
        let breaker = open_breaker(now);

        assert_eq!(breaker.remaining_secs(now), 15);
        assert_eq!(breaker.remaining_secs(now + Duration::from_millis(14_001)), 1);
        assert_eq!(breaker.remaining_secs(now + COOLDOWN), 0);
        assert_eq!(breaker.cooldown_remaining(now + COOLDOWN), Duration::ZERO);
    }
}
