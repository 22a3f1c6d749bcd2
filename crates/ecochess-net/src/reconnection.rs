//! Push-channel reconnection backoff.
//!
//! After every push-channel closure [`Backoff::on_closed`] decides whether to
//! retry after a delay or to give up on push and fall back to polling. The
//! delay grows multiplicatively from a floor to a cap; once it reaches the
//! fallback threshold the next closure switches to polling instead of
//! retrying, which bounds reconnection storms against an unreachable or
//! rate-limited endpoint. A successful open resets the delay to the floor.

use std::time::Duration;

/// Tuning for [`Backoff`].
#[derive(Debug, Clone, PartialEq)]
pub struct BackoffConfig {
    /// First reconnect delay, and the value restored on a successful open.
    /// Default: 500 ms.
    pub floor: Duration,
    /// Upper bound for the delay. Default: 8 s.
    pub cap: Duration,
    /// Growth factor applied after each retry. Default: 1.6.
    pub factor: f64,
    /// Once the delay reaches this value the next closure falls back to
    /// polling. Default: 4 s.
    pub fallback_threshold: Duration,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            floor: Duration::from_millis(500),
            cap: Duration::from_secs(8),
            factor: 1.6,
            fallback_threshold: Duration::from_secs(4),
        }
    }
}

/// What to do after a push-channel closure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackoffStep {
    /// Reconnect after the given delay.
    Retry(Duration),
    /// Stop retrying push and start polling.
    Fallback,
}

/// Reconnect delay tracker. The delay is plain data, advanced explicitly.
#[derive(Debug, Clone)]
pub struct Backoff {
    config: BackoffConfig,
    current: Duration,
    closures: u32,
}

impl Backoff {
    pub fn new(config: BackoffConfig) -> Self {
        let current = config.floor;
        Self {
            config,
            current,
            closures: 0,
        }
    }

    /// Decide the reaction to a closure and advance the delay.
    pub fn on_closed(&mut self) -> BackoffStep {
        self.closures += 1;

        if self.current >= self.config.fallback_threshold {
            return BackoffStep::Fallback;
        }

        let delay = self.current;
        // Whole milliseconds, floored, so the sequence is reproducible.
        let next_ms = (self.current.as_millis() as f64 * self.config.factor).floor() as u64;
        self.current = Duration::from_millis(next_ms).min(self.config.cap);
        BackoffStep::Retry(delay)
    }

    /// Restore the floor after a successful open.
    pub fn reset(&mut self) {
        self.current = self.config.floor;
        self.closures = 0;
    }

    /// Delay the next retry would use.
    pub fn current(&self) -> Duration {
        self.current
    }

    /// Closures observed since the last reset.
    pub fn closures(&self) -> u32 {
        self.closures
    }
}

impl Default for Backoff {
    fn default() -> Self {
        Self::new(BackoffConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_first_retry_uses_floor() {
        let mut backoff = Backoff::default();
        assert_eq!(backoff.on_closed(), BackoffStep::Retry(ms(500)));
        assert_eq!(backoff.current(), ms(800));
    }

    #[test]
    fn test_retry_sequence_then_fallback() {
        let mut backoff = Backoff::default();
        let steps: Vec<BackoffStep> = (0..6).map(|_| backoff.on_closed()).collect();
        assert_eq!(
            steps,
            vec![
                BackoffStep::Retry(ms(500)),
                BackoffStep::Retry(ms(800)),
                BackoffStep::Retry(ms(1280)),
                BackoffStep::Retry(ms(2048)),
                BackoffStep::Retry(ms(3276)),
                BackoffStep::Fallback,
            ]
        );
        assert_eq!(backoff.closures(), 6);
    }

    #[test]
    fn test_delay_is_capped() {
        let mut backoff = Backoff::new(BackoffConfig {
            fallback_threshold: Duration::from_secs(3600),
            ..Default::default()
        });
        let mut last = Duration::ZERO;
        for _ in 0..20 {
            if let BackoffStep::Retry(d) = backoff.on_closed() {
                last = d;
            }
        }
        assert_eq!(last, Duration::from_secs(8));
    }

    #[test]
    fn test_reset_restores_floor() {
        let mut backoff = Backoff::default();
        backoff.on_closed();
        backoff.on_closed();
        backoff.reset();
        assert_eq!(backoff.closures(), 0);
        assert_eq!(backoff.on_closed(), BackoffStep::Retry(ms(500)));
    }

    #[test]
    fn test_fallback_is_sticky_until_reset() {
        let mut backoff = Backoff::default();
        while backoff.on_closed() != BackoffStep::Fallback {}
        assert_eq!(backoff.on_closed(), BackoffStep::Fallback);
    }
}
