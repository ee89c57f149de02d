//! Dreaming scheduler
//!
//! On every poll, each node that is not already dreaming draws once from the
//! random source; a draw above the threshold starts a pulse that ends after
//! the configured dwell. Trials are independent per node and per poll.

use std::time::Duration;

use crate::config::AttentionConfig;
use crate::node_state::NodeState;
use crate::random::RandomSource;

/// A state change produced by the scheduler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttentionChange {
    Started { index: usize, until: Duration },
    Ended { index: usize },
}

/// Polls node states on a fixed interval of scene time
#[derive(Debug, Clone)]
pub struct AttentionScheduler {
    interval: Duration,
    dwell: Duration,
    threshold: f64,
    next_poll: Duration,
    cancelled: bool,
}

impl AttentionScheduler {
    /// Create a scheduler whose first poll is one interval after `start`
    pub fn new(config: &AttentionConfig, start: Duration) -> Self {
        let interval = config.interval().max(Duration::from_millis(1));
        Self {
            interval,
            dwell: config.dwell(),
            threshold: config.threshold,
            next_poll: start + interval,
            cancelled: false,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Scene time of the next scheduled poll
    pub fn next_poll(&self) -> Duration {
        self.next_poll
    }

    pub fn is_due(&self, now: Duration) -> bool {
        !self.cancelled && now >= self.next_poll
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    /// Stop all future polls and expiries
    pub fn cancel(&mut self) {
        self.cancelled = true;
    }

    /// Clear pulses that have ended by `now`
    pub fn expire(&self, now: Duration, states: &mut [NodeState]) -> Vec<AttentionChange> {
        if self.cancelled {
            return Vec::new();
        }
        states
            .iter_mut()
            .enumerate()
            .filter_map(|(index, state)| {
                state
                    .expire_attention(now)
                    .then_some(AttentionChange::Ended { index })
            })
            .collect()
    }

    /// Run every poll scheduled at or before `now`
    ///
    /// Missed polls are replayed at their scheduled times, so pulse start and
    /// end times do not depend on how coarsely the host ticks.
    pub fn poll(
        &mut self,
        now: Duration,
        states: &mut [NodeState],
        rng: &mut dyn RandomSource,
    ) -> Vec<AttentionChange> {
        let mut changes = Vec::new();
        if self.cancelled {
            return changes;
        }

        while self.next_poll <= now {
            let at = self.next_poll;
            changes.extend(self.expire(at, states));
            for (index, state) in states.iter_mut().enumerate() {
                if state.attention() {
                    continue;
                }
                if rng.next_unit() > self.threshold {
                    let until = at + self.dwell;
                    state.attention_until = Some(until);
                    changes.push(AttentionChange::Started { index, until });
                }
            }
            self.next_poll += self.interval;
        }

        changes.extend(self.expire(now, states));
        changes
    }
}
