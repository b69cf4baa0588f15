// src/exec/countdown.rs

use std::time::Duration;

use tokio::time::Instant;

/// Deadline used when `now + timeout` does not fit in an `Instant`.
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

/// Remaining-time calculator for a fixed deadline.
///
/// Uses Tokio's clock, so it follows `tokio::time::pause` in tests.
#[derive(Debug, Clone, Copy)]
pub struct CountdownWatch {
    deadline: Instant,
}

impl CountdownWatch {
    /// Start counting down `timeout` from now. Timeouts too large to
    /// represent, such as `Duration::MAX`, are capped at roughly 30 years.
    pub fn new(timeout: Duration) -> Self {
        let now = Instant::now();
        let deadline = now
            .checked_add(timeout)
            .unwrap_or_else(|| now + FAR_FUTURE);
        Self { deadline }
    }

    /// `max(0, deadline - now)`; never increases between calls.
    pub fn time_left(&self) -> Duration {
        self.deadline.saturating_duration_since(Instant::now())
    }

    pub fn is_expired(&self) -> bool {
        self.time_left().is_zero()
    }
}
