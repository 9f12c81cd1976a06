//! Circuit breaker: a three-state gate wrapping L2 network calls.
//!
//! Grounded on the breaker shape used elsewhere in this corpus
//! (`state` + `consecutive_failures` behind one lock), but corrected so that
//! `HALF_OPEN` admits **exactly one** probe under concurrent callers: the
//! prior art lets every caller through once the timeout elapses, which the
//! state machine here does not allow.

use parking_lot::Mutex;
use std::time::{Duration, Instant};

/// The three breaker states, plus whatever bookkeeping each needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakerState {
    Closed,
    Open,
    HalfOpen,
}

struct Inner {
    state: BreakerState,
    consecutive_failures: u32,
    opened_at: Option<Instant>,
    /// Set while a HALF_OPEN probe is in flight; cleared when it resolves.
    /// Guards against more than one caller being admitted per cooldown.
    probe_in_flight: bool,
}

/// A point-in-time view of breaker state, safe to hand out in stats
/// snapshots (it owns no lock).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BreakerSnapshot {
    pub state: BreakerState,
    pub consecutive_failures: u32,
}

/// What a caller should do after asking the breaker for permission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// Proceed and call `report_success`/`report_failure` with the outcome.
    Allowed,
    /// Proceed as the single HALF_OPEN probe; report the outcome same as
    /// `Allowed`, it only affects transition targets.
    Probe,
    /// Short-circuit: do not call the wrapped operation.
    Denied,
}

pub struct CircuitBreaker {
    inner: Mutex<Inner>,
    threshold: u32,
    reset_timeout: Duration,
    enabled: bool,
}

impl CircuitBreaker {
    pub fn new(threshold: u32, reset_timeout: Duration, enabled: bool) -> Self {
        Self {
            inner: Mutex::new(Inner {
                state: BreakerState::Closed,
                consecutive_failures: 0,
                opened_at: None,
                probe_in_flight: false,
            }),
            threshold: threshold.max(1),
            reset_timeout,
            enabled,
        }
    }

    /// Asks permission to perform the wrapped operation now.
    pub fn admit(&self) -> Admission {
        if !self.enabled {
            return Admission::Allowed;
        }
        let mut inner = self.inner.lock();
        match inner.state {
            BreakerState::Closed => Admission::Allowed,
            BreakerState::Open => {
                let opened_at = inner.opened_at.unwrap_or_else(Instant::now);
                if opened_at.elapsed() < self.reset_timeout {
                    Admission::Denied
                } else if inner.probe_in_flight {
                    // Another caller already claimed this cooldown's probe.
                    Admission::Denied
                } else {
                    inner.state = BreakerState::HalfOpen;
                    inner.probe_in_flight = true;
                    Admission::Probe
                }
            }
            BreakerState::HalfOpen => {
                // Reaching HALF_OPEN with no in-flight probe would mean a
                // prior probe resolved without clearing the flag, which the
                // report_* methods below never allow to happen.
                Admission::Denied
            }
        }
    }

    /// Records a successful call (ordinary call or the admitted probe).
    pub fn report_success(&self) {
        if !self.enabled {
            return;
        }
        let mut inner = self.inner.lock();
        inner.state = BreakerState::Closed;
        inner.consecutive_failures = 0;
        inner.opened_at = None;
        inner.probe_in_flight = false;
    }

    /// Records a failed call (ordinary call or the admitted probe).
    pub fn report_failure(&self) {
        if !self.enabled {
            return;
        }
        let mut inner = self.inner.lock();
        match inner.state {
            BreakerState::Closed => {
                inner.consecutive_failures += 1;
                if inner.consecutive_failures >= self.threshold {
                    inner.state = BreakerState::Open;
                    inner.opened_at = Some(Instant::now());
                }
            }
            BreakerState::HalfOpen | BreakerState::Open => {
                inner.state = BreakerState::Open;
                inner.opened_at = Some(Instant::now());
                inner.probe_in_flight = false;
            }
        }
    }

    pub fn snapshot(&self) -> BreakerSnapshot {
        let inner = self.inner.lock();
        let state = if !self.enabled {
            BreakerState::Closed
        } else {
            inner.state
        };
        BreakerSnapshot {
            state,
            consecutive_failures: inner.consecutive_failures,
        }
    }
}
