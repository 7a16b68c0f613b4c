//! Per-classification retry budgets and backoff windows.

use crate::classification::Classification;
use http::StatusCode;
use rand::Rng;
use std::collections::HashMap;
use std::time::Duration;
use twitter_middleware::Error;

/// Attempts allowed for a classification without an explicit entry.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 10;

/// Transport error messages that are worth another try.
///
/// Matched case-insensitively against the whole error chain of a transport failure.
pub const DEFAULT_UNEXPECTED_TRANSPORT_PATTERNS: &[&str] = &[
    // The server started answering and the connection was cut halfway through.
    "connection closed before message completed",
    "connection reset",
    "operation timed out",
    // TLS stream closed mid-read.
    "close_notify",
];

/// A closed interval `[min, max]` the backoff delay is sampled from, uniformly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DelayWindow {
    min: Duration,
    max: Duration,
}

impl DelayWindow {
    /// Build a window, swapping the bounds if they are given in the wrong order.
    pub fn new(min: Duration, max: Duration) -> Self {
        if min <= max {
            Self { min, max }
        } else {
            Self { min: max, max: min }
        }
    }

    pub fn min(&self) -> Duration {
        self.min
    }

    pub fn max(&self) -> Duration {
        self.max
    }

    /// Draw a delay, at microsecond resolution.
    pub fn sample(&self) -> Duration {
        let min = self.min.as_micros() as u64;
        let max = self.max.as_micros() as u64;
        Duration::from_micros(rand::rng().random_range(min..=max))
    }
}

/// Immutable retry configuration shared by every request going through a
/// [`RetryTransientMiddleware`](crate::RetryTransientMiddleware).
///
/// The defaults are:
/// * up to [`DEFAULT_MAX_ATTEMPTS`] attempts for any classification, except `404` which
///   gets a single attempt;
/// * a backoff of 15 to 30 seconds, 1 to 3 minutes when rate limited (`429`);
/// * [`DEFAULT_UNEXPECTED_TRANSPORT_PATTERNS`] to spot transport failures worth retrying;
/// * no rate limit avoidance pacing.
///
/// ```
/// use std::time::Duration;
/// use http::StatusCode;
/// use twitter_retry::{Classification, RetryPolicy};
///
/// let policy = RetryPolicy::builder()
///     .max_attempts(Classification::Status(StatusCode::FORBIDDEN), 1)
///     .default_delay(Duration::from_secs(1), Duration::from_secs(2))
///     .build();
///
/// assert_eq!(policy.allowed_attempts(Classification::Status(StatusCode::FORBIDDEN)), 1);
/// ```
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    default_max_attempts: u32,
    max_attempts: HashMap<Classification, u32>,
    unexpected_transport_patterns: Vec<String>,
    default_delay: DelayWindow,
    rate_limit_delay: DelayWindow,
    unexpected_transport_delay: DelayWindow,
    avoid_rate_limit: bool,
}

impl RetryPolicy {
    pub fn builder() -> RetryPolicyBuilder {
        RetryPolicyBuilder::default()
    }

    /// How many failed attempts of this classification are tolerated in a single request.
    pub fn allowed_attempts(&self, classification: Classification) -> u32 {
        self.max_attempts
            .get(&classification)
            .copied()
            .unwrap_or(self.default_max_attempts)
    }

    /// Whether another attempt should follow, given how many attempts already failed with
    /// this classification (the latest one included).
    pub fn should_retry(&self, classification: Classification, attempts_so_far: u32) -> bool {
        attempts_so_far < self.allowed_attempts(classification)
    }

    /// Sample the backoff to apply before retrying a failure of this classification.
    pub fn delay_for(&self, classification: Classification) -> Duration {
        self.delay_window(classification).sample()
    }

    pub fn delay_window(&self, classification: Classification) -> DelayWindow {
        match classification {
            c if c.is_rate_limited() => self.rate_limit_delay,
            Classification::UnexpectedTransport => self.unexpected_transport_delay,
            Classification::Status(_) => self.default_delay,
        }
    }

    /// Whether a transport error message matches one of the unexpected transport error patterns.
    pub fn matches_unexpected_transport(&self, message: &str) -> bool {
        let message = message.to_lowercase();
        self.unexpected_transport_patterns
            .iter()
            .any(|pattern| message.contains(pattern.as_str()))
    }

    /// Classify a failed attempt.
    ///
    /// Only transport failures are candidates: errors raised by middleware, malformed
    /// responses and cancellations are returned as `None` and propagate immediately.
    pub fn classify_error(&self, error: &Error) -> Option<Classification> {
        match error {
            Error::Reqwest(_) if self.matches_unexpected_transport(&error.chain_message()) => {
                Some(Classification::UnexpectedTransport)
            }
            _ => None,
        }
    }

    pub fn unexpected_transport_patterns(&self) -> &[String] {
        &self.unexpected_transport_patterns
    }

    /// Whether requests should be paced before their first send to stay clear of rate limits.
    pub fn avoid_rate_limit(&self) -> bool {
        self.avoid_rate_limit
    }

    /// Sample the pre-send pacing delay.
    ///
    /// A uniform draw in `[1s, 4s]` divided by a uniform draw in `[2, 60]`, rounded up to the
    /// microsecond. The result is skewed towards short waits, ranging from roughly 17ms to 2s.
    pub fn pacing_delay(&self) -> Duration {
        let mut rng = rand::rng();
        let numerator: u64 = rng.random_range(1_000_000..=4_000_000);
        let denominator: u64 = rng.random_range(2..=60);
        Duration::from_micros((numerator + denominator - 1) / denominator)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicyBuilder::default().build()
    }
}

/// Builder for [`RetryPolicy`], starting from the default configuration.
#[derive(Debug, Clone)]
pub struct RetryPolicyBuilder {
    default_max_attempts: u32,
    max_attempts: HashMap<Classification, u32>,
    unexpected_transport_patterns: Vec<String>,
    default_delay: DelayWindow,
    rate_limit_delay: DelayWindow,
    unexpected_transport_delay: DelayWindow,
    avoid_rate_limit: bool,
}

impl Default for RetryPolicyBuilder {
    fn default() -> Self {
        let mut max_attempts = HashMap::new();
        max_attempts.insert(Classification::Status(StatusCode::NOT_FOUND), 1);
        Self {
            default_max_attempts: DEFAULT_MAX_ATTEMPTS,
            max_attempts,
            unexpected_transport_patterns: DEFAULT_UNEXPECTED_TRANSPORT_PATTERNS
                .iter()
                .map(|pattern| pattern.to_string())
                .collect(),
            default_delay: DelayWindow::new(Duration::from_secs(15), Duration::from_secs(30)),
            rate_limit_delay: DelayWindow::new(Duration::from_secs(60), Duration::from_secs(180)),
            unexpected_transport_delay: DelayWindow::new(
                Duration::from_secs(15),
                Duration::from_secs(30),
            ),
            avoid_rate_limit: false,
        }
    }
}

impl RetryPolicyBuilder {
    /// Attempts allowed for classifications without an explicit entry.
    pub fn default_max_attempts(mut self, attempts: u32) -> Self {
        self.default_max_attempts = attempts;
        self
    }

    /// Override the attempts allowed for one classification.
    pub fn max_attempts(mut self, classification: Classification, attempts: u32) -> Self {
        self.max_attempts.insert(classification, attempts);
        self
    }

    /// Replace the unexpected transport error patterns.
    pub fn unexpected_transport_patterns<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.unexpected_transport_patterns = patterns
            .into_iter()
            .map(|pattern| pattern.into().to_lowercase())
            .collect();
        self
    }

    /// Add one unexpected transport error pattern to the current list.
    pub fn unexpected_transport_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.unexpected_transport_patterns
            .push(pattern.into().to_lowercase());
        self
    }

    /// Backoff window for error statuses other than `429`.
    pub fn default_delay(mut self, min: Duration, max: Duration) -> Self {
        self.default_delay = DelayWindow::new(min, max);
        self
    }

    /// Backoff window for `429 Too Many Requests`.
    pub fn rate_limit_delay(mut self, min: Duration, max: Duration) -> Self {
        self.rate_limit_delay = DelayWindow::new(min, max);
        self
    }

    /// Backoff window for unexpected transport errors.
    pub fn unexpected_transport_delay(mut self, min: Duration, max: Duration) -> Self {
        self.unexpected_transport_delay = DelayWindow::new(min, max);
        self
    }

    /// Pace every request before its first send, see [`RetryPolicy::pacing_delay`].
    pub fn avoid_rate_limit(mut self, avoid: bool) -> Self {
        self.avoid_rate_limit = avoid;
        self
    }

    pub fn build(self) -> RetryPolicy {
        RetryPolicy {
            default_max_attempts: self.default_max_attempts,
            max_attempts: self.max_attempts,
            unexpected_transport_patterns: self.unexpected_transport_patterns,
            default_delay: self.default_delay,
            rate_limit_delay: self.rate_limit_delay,
            unexpected_transport_delay: self.unexpected_transport_delay,
            avoid_rate_limit: self.avoid_rate_limit,
        }
    }
}
