//! Circuit breaker guarding each upstream API.
//!
//! - CLOSED: requests flow through
//! - OPEN: the upstream keeps failing, requests are rejected immediately
//! - HALF_OPEN: recovery timeout elapsed, a limited number of probes allowed

use crate::config::NetworkConfig;
use serde::Serialize;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

#[derive(Debug, Clone)]
pub struct CircuitBreakerConfig {
    /// Consecutive upstream failures before the circuit opens.
    pub failure_threshold: u32,
    /// How long an open circuit rejects calls before probing again.
    pub recovery_timeout: Duration,
    /// Probe calls let through while half-open.
    pub half_open_max_calls: u32,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: NetworkConfig::CIRCUIT_BREAKER_FAILURE_THRESHOLD,
            recovery_timeout: NetworkConfig::CIRCUIT_BREAKER_RECOVERY_TIMEOUT,
            half_open_max_calls: 1,
        }
    }
}

#[derive(Debug, Default)]
struct Counters {
    consecutive_failures: u32,
    total_failures: u64,
    total_successes: u64,
    probes: u32,
}

#[derive(Debug)]
struct Breaker {
    state: CircuitState,
    since: Instant,
    counters: Counters,
}

impl Breaker {
    fn enter(&mut self, state: CircuitState) {
        self.state = state;
        self.since = Instant::now();
        self.counters.probes = 0;
    }

    fn release_probe(&mut self) {
        if self.state == CircuitState::HalfOpen {
            self.counters.probes = self.counters.probes.saturating_sub(1);
        }
    }

    /// OPEN turns HALF_OPEN once the recovery timeout has passed.
    fn tick(&mut self, recovery_timeout: Duration) -> bool {
        if self.state == CircuitState::Open && self.since.elapsed() >= recovery_timeout {
            self.enter(CircuitState::HalfOpen);
            return true;
        }
        false
    }
}

/// Circuit breaker for one upstream service.
#[derive(Debug)]
pub struct CircuitBreaker {
    config: CircuitBreakerConfig,
    domain: String,
    inner: Mutex<Breaker>,
}

impl CircuitBreaker {
    pub fn new(domain: impl Into<String>) -> Self {
        Self::with_config(domain, CircuitBreakerConfig::default())
    }

    pub fn with_config(domain: impl Into<String>, config: CircuitBreakerConfig) -> Self {
        Self {
            config,
            domain: domain.into(),
            inner: Mutex::new(Breaker {
                state: CircuitState::Closed,
                since: Instant::now(),
                counters: Counters::default(),
            }),
        }
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn state(&self) -> CircuitState {
        self.lock().state
    }

    /// Whether the next call may go out. Half-open circuits count probes.
    pub fn allow_request(&self) -> bool {
        let mut breaker = self.lock();
        match breaker.state {
            CircuitState::Closed => true,
            CircuitState::Open => false,
            CircuitState::HalfOpen => {
                breaker.counters.probes += 1;
                breaker.counters.probes <= self.config.half_open_max_calls
            }
        }
    }

    /// Take a slot for one call. The permit must be settled with
    /// [`Permit::succeeded`] or [`Permit::failed`]; dropping it unsettled
    /// hands a half-open probe slot back.
    pub fn try_acquire(&self) -> Option<Permit<'_>> {
        self.allow_request().then_some(Permit {
            breaker: self,
            settled: false,
        })
    }

    pub fn record_success(&self) {
        let mut breaker = self.lock();
        breaker.counters.total_successes += 1;
        breaker.counters.consecutive_failures = 0;
        if breaker.state != CircuitState::Closed {
            breaker.enter(CircuitState::Closed);
            info!("{} is answering again, circuit closed", self.domain);
        }
    }

    pub fn record_failure(&self) {
        let mut breaker = self.lock();
        breaker.counters.total_failures += 1;
        breaker.counters.consecutive_failures += 1;

        let trip = match breaker.state {
            CircuitState::Closed => {
                breaker.counters.consecutive_failures >= self.config.failure_threshold
            }
            CircuitState::HalfOpen => true,
            CircuitState::Open => false,
        };
        if trip {
            breaker.enter(CircuitState::Open);
            warn!(
                "{} failed {} times in a row, circuit open for {:?}",
                self.domain, breaker.counters.consecutive_failures, self.config.recovery_timeout
            );
        }
    }

    pub fn stats(&self) -> CircuitBreakerStats {
        let breaker = self.lock();
        CircuitBreakerStats {
            domain: self.domain.clone(),
            state: breaker.state,
            failure_count: breaker.counters.consecutive_failures,
            total_failures: breaker.counters.total_failures,
            total_successes: breaker.counters.total_successes,
            seconds_in_state: breaker.since.elapsed().as_secs(),
        }
    }

    /// Lock the state, applying any due OPEN → HALF_OPEN transition.
    /// Poisoning is ignored; the counters stay usable.
    fn lock(&self) -> MutexGuard<'_, Breaker> {
        let mut breaker = self
            .inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if breaker.tick(self.config.recovery_timeout) {
            debug!("Probing {} again, circuit half-open", self.domain);
        }
        breaker
    }
}

/// One admitted call. Outcomes that say nothing about upstream health
/// (a 4xx, an empty answer, a cancelled future) just drop it.
#[must_use]
#[derive(Debug)]
pub struct Permit<'a> {
    breaker: &'a CircuitBreaker,
    settled: bool,
}

impl Permit<'_> {
    pub fn succeeded(mut self) {
        self.settled = true;
        self.breaker.record_success();
    }

    pub fn failed(mut self) {
        self.settled = true;
        self.breaker.record_failure();
    }
}

impl Drop for Permit<'_> {
    fn drop(&mut self) {
        if !self.settled {
            self.breaker.lock().release_probe();
        }
    }
}

/// Point-in-time view of a circuit breaker, exposed on the status endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct CircuitBreakerStats {
    pub domain: String,
    pub state: CircuitState,
    pub failure_count: u32,
    pub total_failures: u64,
    pub total_successes: u64,
    pub seconds_in_state: u64,
}
