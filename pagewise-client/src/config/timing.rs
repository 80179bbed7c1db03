//! Call timing strategies and deadline resolution.
//!
//! A call carries one of two mutually exclusive timing strategies: a fixed
//! expiration, or a retriable call governed by [`RetrySettings`]. Either
//! way the strategy resolves to an absolute deadline against an injected
//! [`Clock`], which is what the transport layer enforces.
//!
//! The retry *loop* itself (backing off, sleeping, re-issuing the call)
//! belongs to a higher layer; this crate only represents the policy and
//! reads its total timeout when computing the initial deadline.

use std::time::{Duration, Instant};

use pagewise_core::{Clock, Code};

/// Default retry timing values.
pub mod defaults {
    use std::time::Duration;

    use pagewise_core::Code;

    /// Default timeout for the first call attempt.
    pub const FIRST_CALL_TIMEOUT: Duration = Duration::from_secs(10);

    /// Default multiplier applied to the attempt timeout after each failure.
    pub const BACKOFF_MULTIPLIER: f64 = 1.6;

    /// Default upper bound on any single attempt's timeout.
    pub const MAX_TIMEOUT: Duration = Duration::from_secs(30);

    /// Default bound on the total time spent across all attempts.
    pub const TOTAL_TIMEOUT: Duration = Duration::from_secs(600);

    /// Status codes retried by default.
    pub const RETRYABLE_CODES: [Code; 3] =
        [Code::Unavailable, Code::ResourceExhausted, Code::Aborted];
}

/// Timing policy for a retriable call.
///
/// The policy fields are consumed by a higher retry layer; this crate only
/// reads [`total_timeout`](RetrySettings::total_timeout) when computing the
/// initial absolute deadline.
///
/// # Example
///
/// ```
/// use pagewise_client::RetrySettings;
/// use std::time::Duration;
///
/// // Use defaults
/// let settings = RetrySettings::default();
///
/// // Custom configuration
/// let settings = RetrySettings::new()
///     .first_call_timeout(Duration::from_secs(5))
///     .max_timeout(Duration::from_secs(20))
///     .total_timeout(Duration::from_secs(120));
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct RetrySettings {
    /// Timeout for the first call attempt.
    pub first_call_timeout: Duration,

    /// Multiplier applied to the attempt timeout after each failure.
    /// Should be >= 1.0.
    pub backoff_multiplier: f64,

    /// Upper bound on any single attempt's timeout.
    pub max_timeout: Duration,

    /// Bound on the total time spent across all attempts. This is what
    /// the initial absolute deadline is computed from.
    pub total_timeout: Duration,

    /// Status codes considered safe to retry.
    pub retryable_codes: Vec<Code>,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            first_call_timeout: defaults::FIRST_CALL_TIMEOUT,
            backoff_multiplier: defaults::BACKOFF_MULTIPLIER,
            max_timeout: defaults::MAX_TIMEOUT,
            total_timeout: defaults::TOTAL_TIMEOUT,
            retryable_codes: defaults::RETRYABLE_CODES.to_vec(),
        }
    }
}

impl RetrySettings {
    /// Create retry settings with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the timeout for the first call attempt.
    pub fn first_call_timeout(mut self, timeout: Duration) -> Self {
        self.first_call_timeout = timeout;
        self
    }

    /// Set the backoff multiplier.
    ///
    /// # Panics
    ///
    /// Panics if `multiplier` is less than 1.0.
    pub fn backoff_multiplier(mut self, multiplier: f64) -> Self {
        assert!(multiplier >= 1.0, "backoff_multiplier must be >= 1.0");
        self.backoff_multiplier = multiplier;
        self
    }

    /// Set the upper bound on any single attempt's timeout.
    pub fn max_timeout(mut self, timeout: Duration) -> Self {
        self.max_timeout = timeout;
        self
    }

    /// Set the bound on the total time spent across all attempts.
    pub fn total_timeout(mut self, timeout: Duration) -> Self {
        self.total_timeout = timeout;
        self
    }

    /// Replace the set of status codes considered safe to retry.
    pub fn retryable_codes<I: IntoIterator<Item = Code>>(mut self, codes: I) -> Self {
        self.retryable_codes = codes.into_iter().collect();
        self
    }

    /// Add a status code to the retryable set.
    pub fn retry_on(mut self, code: Code) -> Self {
        if !self.retryable_codes.contains(&code) {
            self.retryable_codes.push(code);
        }
        self
    }

    /// Whether this policy treats `code` as retryable.
    pub fn is_retryable(&self, code: Code) -> bool {
        self.retryable_codes.contains(&code)
    }

    /// Validate the policy configuration.
    ///
    /// Returns an error if the configuration is invalid.
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.backoff_multiplier < 1.0 {
            return Err("backoff_multiplier must be >= 1.0");
        }
        if self.first_call_timeout > self.max_timeout {
            return Err("first_call_timeout must not exceed max_timeout");
        }
        if self.first_call_timeout > self.total_timeout {
            return Err("first_call_timeout must not exceed total_timeout");
        }
        Ok(())
    }
}

/// One of two mutually exclusive timing strategies for a call.
#[derive(Clone, Debug, PartialEq)]
pub enum CallTiming {
    /// The call is abandoned at a fixed absolute point in time.
    Expiration {
        /// Absolute deadline, passed through unchanged at resolution.
        deadline: Instant,
    },
    /// The call may be retried under the given policy.
    Retry(RetrySettings),
}

impl CallTiming {
    /// Timing that expires at an absolute instant.
    pub fn expiring_at(deadline: Instant) -> Self {
        CallTiming::Expiration { deadline }
    }

    /// Timing that expires `timeout` from now on the given clock.
    pub fn expiring_after(timeout: Duration, clock: &impl Clock) -> Self {
        CallTiming::Expiration {
            deadline: clock.now() + timeout,
        }
    }

    /// Retriable timing under the given policy.
    pub fn retrying(settings: RetrySettings) -> Self {
        CallTiming::Retry(settings)
    }

    /// Resolve the absolute deadline for this strategy.
    ///
    /// `Expiration` deadlines pass through unchanged; `Retry` deadlines
    /// are `clock.now()` plus the policy's total timeout.
    pub fn deadline(&self, clock: &impl Clock) -> Instant {
        match self {
            CallTiming::Expiration { deadline } => *deadline,
            CallTiming::Retry(settings) => clock.now() + settings.total_timeout,
        }
    }

    /// The retry policy, when this strategy is retriable.
    pub fn retry_settings(&self) -> Option<&RetrySettings> {
        match self {
            CallTiming::Expiration { .. } => None,
            CallTiming::Retry(settings) => Some(settings),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pagewise_core::FixedClock;

    #[test]
    fn test_retry_settings_default() {
        let settings = RetrySettings::default();
        assert_eq!(settings.first_call_timeout, Duration::from_secs(10));
        assert!((settings.backoff_multiplier - 1.6).abs() < f64::EPSILON);
        assert_eq!(settings.max_timeout, Duration::from_secs(30));
        assert_eq!(settings.total_timeout, Duration::from_secs(600));
        assert_eq!(settings.retryable_codes.len(), 3);
    }

    #[test]
    fn test_retry_settings_builder() {
        let settings = RetrySettings::new()
            .first_call_timeout(Duration::from_millis(500))
            .backoff_multiplier(2.0)
            .max_timeout(Duration::from_secs(5))
            .total_timeout(Duration::from_secs(60))
            .retryable_codes([Code::Unavailable]);

        assert_eq!(settings.first_call_timeout, Duration::from_millis(500));
        assert!((settings.backoff_multiplier - 2.0).abs() < f64::EPSILON);
        assert_eq!(settings.max_timeout, Duration::from_secs(5));
        assert_eq!(settings.total_timeout, Duration::from_secs(60));
        assert_eq!(settings.retryable_codes, vec![Code::Unavailable]);
    }

    #[test]
    fn test_retry_settings_retry_on_deduplicates() {
        let settings = RetrySettings::new()
            .retryable_codes([Code::Unavailable])
            .retry_on(Code::Aborted)
            .retry_on(Code::Aborted);
        assert_eq!(
            settings.retryable_codes,
            vec![Code::Unavailable, Code::Aborted]
        );
    }

    #[test]
    fn test_retry_settings_is_retryable() {
        let settings = RetrySettings::default();
        assert!(settings.is_retryable(Code::Unavailable));
        assert!(!settings.is_retryable(Code::NotFound));
    }

    #[test]
    #[should_panic(expected = "backoff_multiplier must be >= 1.0")]
    fn test_retry_settings_invalid_multiplier() {
        RetrySettings::new().backoff_multiplier(0.5);
    }

    #[test]
    fn test_retry_settings_validate() {
        assert!(RetrySettings::default().validate().is_ok());

        let invalid = RetrySettings {
            first_call_timeout: Duration::from_secs(60),
            max_timeout: Duration::from_secs(5),
            ..Default::default()
        };
        assert!(invalid.validate().is_err());

        let invalid = RetrySettings {
            first_call_timeout: Duration::from_secs(60),
            max_timeout: Duration::from_secs(60),
            total_timeout: Duration::from_secs(30),
            ..Default::default()
        };
        assert!(invalid.validate().is_err());
    }

    #[test]
    fn test_expiration_deadline_passes_through() {
        let clock = FixedClock::new(Instant::now());
        let deadline = clock.now() + Duration::from_secs(5);

        let timing = CallTiming::expiring_at(deadline);
        assert_eq!(timing.deadline(&clock), deadline);

        // the clock moving does not shift a fixed expiration
        clock.advance(Duration::from_secs(60));
        assert_eq!(timing.deadline(&clock), deadline);
    }

    #[test]
    fn test_expiring_after_uses_clock() {
        let clock = FixedClock::new(Instant::now());
        let timing = CallTiming::expiring_after(Duration::from_secs(7), &clock);
        assert_eq!(timing.deadline(&clock), clock.now() + Duration::from_secs(7));
    }

    #[test]
    fn test_retry_deadline_is_now_plus_total_timeout() {
        let clock = FixedClock::new(Instant::now());
        let settings = RetrySettings::new().total_timeout(Duration::from_secs(90));
        let timing = CallTiming::retrying(settings);

        assert_eq!(timing.deadline(&clock), clock.now() + Duration::from_secs(90));

        // a retry deadline is relative to the clock at resolution time
        clock.advance(Duration::from_secs(10));
        assert_eq!(timing.deadline(&clock), clock.now() + Duration::from_secs(90));
    }

    #[test]
    fn test_retry_settings_accessor() {
        let timing = CallTiming::retrying(RetrySettings::default());
        assert!(timing.retry_settings().is_some());

        let timing = CallTiming::expiring_at(Instant::now());
        assert!(timing.retry_settings().is_none());
    }
}
