use std::time::{Duration, Instant};

use leakwatch_config::DEFAULT_HYSTERESIS;

/// Minimum-interval gate between two outbound alerts.
///
/// State lives in memory only and starts empty on every process start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlertThrottle {
    window: Duration,
    last_dispatch: Option<Instant>,
}

impl AlertThrottle {
    /// Builds a throttle with the given hysteresis window.
    #[must_use]
    pub const fn new(window: Duration) -> Self {
        Self {
            window,
            last_dispatch: None,
        }
    }

    /// Hysteresis window.
    #[must_use]
    pub const fn window(&self) -> Duration {
        self.window
    }

    /// Time of the last admitted dispatch, if any.
    #[must_use]
    pub const fn last_dispatch(&self) -> Option<Instant> {
        self.last_dispatch
    }

    /// Returns whether an activation at `now` may dispatch.
    #[must_use]
    pub fn should_dispatch(&self, now: Instant) -> bool {
        self.last_dispatch
            .is_none_or(|last| now.saturating_duration_since(last) > self.window)
    }

    /// Time left before the next dispatch is admitted.
    #[must_use]
    pub fn remaining(&self, now: Instant) -> Duration {
        self.last_dispatch.map_or(Duration::ZERO, |last| {
            self.window.saturating_sub(now.saturating_duration_since(last))
        })
    }

    /// Admits the activation at `now` and records it, or rejects it without
    /// changing state.
    pub fn admit(&mut self, now: Instant) -> bool {
        let admitted = self.should_dispatch(now);
        if admitted {
            self.last_dispatch = Some(now);
        }
        admitted
    }
}

impl Default for AlertThrottle {
    fn default() -> Self {
        Self::new(DEFAULT_HYSTERESIS)
    }
}
