use std::time::Duration;

use crate::domain::StreamStatus;

use super::constants::{
    MAX_RECONNECT_ATTEMPTS, RECONNECT_DELAY_BASE, RECONNECT_DELAY_MAX, RECONNECT_GROWTH_FACTOR,
};

/// Bounds for reconnect backoff.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BackoffPolicy {
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub growth_factor: f64,
    pub max_attempts: u32,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            base_delay: RECONNECT_DELAY_BASE,
            max_delay: RECONNECT_DELAY_MAX,
            growth_factor: RECONNECT_GROWTH_FACTOR,
            max_attempts: MAX_RECONNECT_ATTEMPTS,
        }
    }
}

impl BackoffPolicy {
    /// Grows `current` by the growth factor, kept within `[base_delay, max_delay]`.
    #[must_use]
    pub fn next_delay(&self, current: Duration) -> Duration {
        Duration::try_from_secs_f64(current.as_secs_f64() * self.growth_factor)
            .unwrap_or(self.max_delay)
            .max(self.base_delay)
            .min(self.max_delay)
    }
}

/// What to do after a failed connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Wait `delay`, then make attempt number `attempt + 1`.
    Retry { attempt: u32, delay: Duration },
    /// Attempt budget spent; no timer is scheduled.
    GiveUp { attempts: u32 },
}

/// Reconnect bookkeeping for one stream.
///
/// Each explicit `begin` opens a new epoch; a connection task only mutates
/// state while its epoch is current, so a task cancelled mid-step cannot
/// overwrite the state of its successor.
#[derive(Debug, Clone)]
pub struct ReconnectState {
    policy: BackoffPolicy,
    status: StreamStatus,
    attempts: u32,
    current_delay: Duration,
    manual_close: bool,
    epoch: u64,
}

impl ReconnectState {
    #[must_use]
    pub const fn new(policy: BackoffPolicy) -> Self {
        Self {
            status: StreamStatus::Idle,
            attempts: 0,
            current_delay: policy.base_delay,
            manual_close: false,
            epoch: 0,
            policy,
        }
    }

    #[must_use]
    pub const fn status(&self) -> StreamStatus {
        self.status
    }

    #[must_use]
    pub const fn attempts(&self) -> u32 {
        self.attempts
    }

    #[must_use]
    pub const fn current_delay(&self) -> Duration {
        self.current_delay
    }

    #[must_use]
    pub const fn is_manually_closed(&self) -> bool {
        self.manual_close
    }

    #[must_use]
    pub const fn is_current(&self, epoch: u64) -> bool {
        self.epoch == epoch && !self.manual_close
    }

    /// Explicit connect: clears the manual-close flag, resets counters, and
    /// returns the new epoch.
    pub const fn begin(&mut self) -> u64 {
        self.epoch += 1;
        self.manual_close = false;
        self.attempts = 0;
        self.current_delay = self.policy.base_delay;
        self.status = StreamStatus::Connecting;
        self.epoch
    }

    pub const fn transition_to_connecting(&mut self) {
        self.status = StreamStatus::Connecting;
    }

    /// Handshake succeeded.
    pub const fn transition_to_open(&mut self) {
        self.status = StreamStatus::Open;
        self.attempts = 0;
        self.current_delay = self.policy.base_delay;
    }

    /// Records a failed or dropped connection and decides what follows.
    pub fn record_failure(&mut self) -> Decision {
        self.attempts = self.attempts.saturating_add(1);

        if self.attempts >= self.policy.max_attempts {
            self.status = StreamStatus::Stopped;
            return Decision::GiveUp {
                attempts: self.attempts,
            };
        }

        self.status = StreamStatus::Backoff;
        let delay = self.current_delay;
        self.current_delay = self.policy.next_delay(delay);
        Decision::Retry {
            attempt: self.attempts,
            delay,
        }
    }

    /// Explicit disconnect.
    pub const fn close(&mut self) {
        self.manual_close = true;
        self.status = StreamStatus::Idle;
        self.attempts = 0;
        self.current_delay = self.policy.base_delay;
    }
}

impl Default for ReconnectState {
    fn default() -> Self {
        Self::new(BackoffPolicy::default())
    }
}
