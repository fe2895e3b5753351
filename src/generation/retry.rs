//! Pure retry policy for the generation pipeline, separated from timers so
//! backoff behavior is testable without sleeping.

use std::time::Duration;

/// Outcome of one generation attempt.
#[derive(Debug)]
pub enum Attempt<T> {
    Success(T),
    /// The attempt failed and another is permitted after the backoff delay.
    Retry(Duration),
    /// The attempt failed and the budget is spent; fall back.
    Exhausted,
}

/// Linear backoff: the n-th failure waits `n × base`.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay: Duration::from_millis(1000),
        }
    }

    pub fn base_delay(mut self, delay: Duration) -> Self {
        self.base_delay = delay;
        self
    }

    /// Delay before the next attempt after `failed_attempts` failures, or
    /// `None` when the budget is exhausted.
    pub fn backoff(&self, failed_attempts: u32) -> Option<Duration> {
        if failed_attempts >= self.max_attempts {
            None
        } else {
            Some(self.base_delay * failed_attempts)
        }
    }

    /// Classify a failed attempt.
    pub fn after_failure<T>(&self, failed_attempts: u32) -> Attempt<T> {
        match self.backoff(failed_attempts) {
            Some(delay) => Attempt::Retry(delay),
            None => Attempt::Exhausted,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_is_linear_and_bounded() {
        let policy = RetryPolicy::new(3);
        assert_eq!(policy.backoff(1), Some(Duration::from_millis(1000)));
        assert_eq!(policy.backoff(2), Some(Duration::from_millis(2000)));
        assert_eq!(policy.backoff(3), None);
    }

    #[test]
    fn zero_budget_is_clamped_to_one_attempt() {
        let policy = RetryPolicy::new(0);
        assert_eq!(policy.max_attempts, 1);
        assert_eq!(policy.backoff(1), None);
    }

    #[test]
    fn after_failure_classifies() {
        let policy = RetryPolicy::new(2).base_delay(Duration::from_millis(10));
        assert!(matches!(
            policy.after_failure::<()>(1),
            Attempt::Retry(d) if d == Duration::from_millis(10)
        ));
        assert!(matches!(policy.after_failure::<()>(2), Attempt::Exhausted));
    }
}
