//! Cooldown tracking between scaling actions

use std::time::Duration;

use tokio::time::Instant;

/// Remembers when the last scaling action completed
#[derive(Debug, Clone)]
pub struct CooldownTimer {
    period: Duration,
    last_scale: Option<Instant>,
}

impl CooldownTimer {
    /// A timer that has never recorded a scaling action
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            last_scale: None,
        }
    }

    /// `now - last_scale < period`; never true before the first action
    pub fn in_cooldown(&self, now: Instant) -> bool {
        self.remaining(now).is_some()
    }

    /// Time left until scaling is allowed again
    pub fn remaining(&self, now: Instant) -> Option<Duration> {
        let last = self.last_scale?;
        let elapsed = now.saturating_duration_since(last);
        if elapsed < self.period {
            Some(self.period - elapsed)
        } else {
            None
        }
    }

    pub fn record(&mut self, at: Instant) {
        self.last_scale = Some(at);
    }

    pub fn last_scale(&self) -> Option<Instant> {
        self.last_scale
    }
}
