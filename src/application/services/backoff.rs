use std::time::Duration;

/// Exponential backoff between transient delivery retries:
/// `base * 2^(attempt - 1)`, capped at `max`.
#[derive(Debug, Clone, Copy)]
pub struct BackoffPolicy {
    pub base: Duration,
    pub max: Duration,
}

impl BackoffPolicy {
    pub fn new(base: Duration, max: Duration) -> Self {
        Self { base, max }
    }

    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        let delay = self.base.saturating_mul(1u32 << exponent);
        delay.min(self.max)
    }
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            base: Duration::from_secs(60),
            max: Duration::from_secs(900),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn doubles_per_attempt() {
        let policy = BackoffPolicy::default();
        assert_eq!(policy.delay_for(1), Duration::from_secs(60));
        assert_eq!(policy.delay_for(2), Duration::from_secs(120));
        assert_eq!(policy.delay_for(3), Duration::from_secs(240));
    }

    #[test]
    fn caps_at_max() {
        let policy = BackoffPolicy::new(Duration::from_secs(60), Duration::from_secs(300));
        assert_eq!(policy.delay_for(10), Duration::from_secs(300));
    }

    #[test]
    fn zero_attempt_uses_base() {
        let policy = BackoffPolicy::default();
        assert_eq!(policy.delay_for(0), Duration::from_secs(60));
    }
}
