//! Bounded waiting for a peer process
//!
//! The peer may be descheduled, slow, or dead; nothing in the shared region
//! tells these apart. A wait therefore escalates from spinning to yielding to
//! short sleeps and gives up once its timeout elapses.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

/// How long and how aggressively to wait for the peer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaitPolicy {
    /// Busy-spin iterations before yielding
    pub spin_limit: u32,
    /// `yield_now` iterations before sleeping
    pub yield_limit: u32,
    /// Sleep interval once spinning and yielding are exhausted
    pub sleep_interval: Duration,
    /// Give up after this long; `None` waits forever
    pub timeout: Option<Duration>,
}

impl Default for WaitPolicy {
    fn default() -> Self {
        Self {
            spin_limit: 256,
            yield_limit: 64,
            sleep_interval: Duration::from_micros(200),
            timeout: Some(Duration::from_secs(2)),
        }
    }
}

impl WaitPolicy {
    /// Spin/yield/sleep forever, never reporting a timeout
    pub fn unbounded() -> Self {
        Self {
            timeout: None,
            ..Default::default()
        }
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_spin_limit(mut self, spin_limit: u32) -> Self {
        self.spin_limit = spin_limit;
        self
    }

    pub fn with_yield_limit(mut self, yield_limit: u32) -> Self {
        self.yield_limit = yield_limit;
        self
    }

    pub fn with_sleep_interval(mut self, sleep_interval: Duration) -> Self {
        self.sleep_interval = sleep_interval;
        self
    }

    /// Validate the policy
    pub fn validate(&self) -> crate::Result<()> {
        if self.sleep_interval.is_zero() && self.timeout.is_none() {
            return Err(crate::BridgeError::invalid_parameter(
                "sleep_interval",
                "An unbounded wait needs a non-zero sleep interval",
            ));
        }
        Ok(())
    }
}

/// The wait ran past its policy timeout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Elapsed(pub Duration);

/// Escalating wait state for one blocking operation
#[derive(Debug)]
pub struct Backoff {
    policy: WaitPolicy,
    step: u64,
    started: Instant,
}

impl Backoff {
    pub fn new(policy: &WaitPolicy) -> Self {
        Self {
            policy: *policy,
            step: 0,
            started: Instant::now(),
        }
    }

    /// Wait a little, or report that the timeout has passed
    pub fn snooze(&mut self) -> Result<(), Elapsed> {
        let spin = self.policy.spin_limit as u64;
        let yielded = spin + self.policy.yield_limit as u64;

        if self.step < spin {
            std::hint::spin_loop();
        } else {
            let elapsed = self.started.elapsed();
            if let Some(timeout) = self.policy.timeout {
                if elapsed >= timeout {
                    return Err(Elapsed(elapsed));
                }
            }
            if self.step < yielded {
                std::thread::yield_now();
            } else {
                std::thread::sleep(self.policy.sleep_interval);
            }
        }

        self.step = self.step.saturating_add(1);
        Ok(())
    }

    /// Time spent waiting so far
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Whether the wait has escalated past spinning
    pub fn is_parked(&self) -> bool {
        self.step > self.policy.spin_limit as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_reported() {
        let policy = WaitPolicy::default()
            .with_spin_limit(4)
            .with_yield_limit(4)
            .with_sleep_interval(Duration::from_millis(1))
            .with_timeout(Some(Duration::from_millis(10)));
        let mut backoff = Backoff::new(&policy);

        let mut iterations = 0;
        while backoff.snooze().is_ok() {
            iterations += 1;
            assert!(iterations < 10_000, "backoff never timed out");
        }
        assert!(backoff.elapsed() >= Duration::from_millis(10));
        assert!(backoff.is_parked());
    }

    #[test]
    fn test_unbounded_policy_validation() {
        assert!(WaitPolicy::unbounded().validate().is_ok());
        let busy = WaitPolicy::unbounded().with_sleep_interval(Duration::ZERO);
        assert!(busy.validate().is_err());
    }
}
