use std::{fmt, time::Duration};

/// What went wrong on one attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    Timeout,
    Connect,
    Transport,
    Status(u16),
    /// 2xx with nothing in it
    EmptyBody,
    /// 2xx whose text the extractor could not read
    Unparseable,
}

impl FailureClass {
    pub fn is_content_failure(self) -> bool {
        matches!(self, FailureClass::EmptyBody | FailureClass::Unparseable)
    }
}

impl fmt::Display for FailureClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureClass::Timeout => f.write_str("timeout"),
            FailureClass::Connect => f.write_str("connection error"),
            FailureClass::Transport => f.write_str("transport error"),
            FailureClass::Status(code) => write!(f, "HTTP {code}"),
            FailureClass::EmptyBody => f.write_str("empty completion"),
            FailureClass::Unparseable => f.write_str("unparseable completion"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Retry { delay: Duration, simplify: bool },
    GiveUp,
}

/// Fixed-delay retry bound. `max_attempts` counts every attempt, the first
/// one included.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
    pub max_elapsed: Option<Duration>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::from_secs(5),
            max_elapsed: None,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self { max_attempts: max_attempts.max(1), delay, max_elapsed: None }
    }

    pub fn with_max_elapsed(mut self, budget: Duration) -> Self {
        self.max_elapsed = Some(budget);
        self
    }

    /// `attempt` is the 1-based number of the attempt that just failed,
    /// `elapsed` the time spent on this item so far.
    pub fn decide(
        &self,
        attempt: u32,
        elapsed: Duration,
        class: FailureClass,
        simplify_on_content_failure: bool,
    ) -> Decision {
        if attempt >= self.max_attempts {
            return Decision::GiveUp;
        }
        if let Some(budget) = self.max_elapsed {
            if elapsed + self.delay > budget {
                return Decision::GiveUp;
            }
        }
        Decision::Retry {
            delay: self.delay,
            simplify: simplify_on_content_failure && class.is_content_failure(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> RetryPolicy {
        RetryPolicy::new(3, Duration::from_secs(5))
    }

    #[test]
    fn retries_until_the_last_attempt() {
        let p = policy();
        let retry = Decision::Retry { delay: Duration::from_secs(5), simplify: false };
        assert_eq!(p.decide(1, Duration::ZERO, FailureClass::Timeout, false), retry);
        assert_eq!(p.decide(2, Duration::ZERO, FailureClass::Status(503), false), retry);
        assert_eq!(p.decide(3, Duration::ZERO, FailureClass::Connect, false), Decision::GiveUp);
    }

    #[test]
    fn single_attempt_never_retries() {
        let p = RetryPolicy::new(1, Duration::from_secs(1));
        assert_eq!(p.decide(1, Duration::ZERO, FailureClass::EmptyBody, true), Decision::GiveUp);
    }

    #[test]
    fn zero_attempts_is_clamped_to_one() {
        assert_eq!(RetryPolicy::new(0, Duration::ZERO).max_attempts, 1);
    }

    #[test]
    fn simplify_only_for_content_failures_when_enabled() {
        let p = policy();
        let d = p.decide(1, Duration::ZERO, FailureClass::EmptyBody, true);
        assert_eq!(d, Decision::Retry { delay: Duration::from_secs(5), simplify: true });

        let d = p.decide(1, Duration::ZERO, FailureClass::Unparseable, true);
        assert!(matches!(d, Decision::Retry { simplify: true, .. }));

        let d = p.decide(1, Duration::ZERO, FailureClass::Status(500), true);
        assert!(matches!(d, Decision::Retry { simplify: false, .. }));

        let d = p.decide(1, Duration::ZERO, FailureClass::EmptyBody, false);
        assert!(matches!(d, Decision::Retry { simplify: false, .. }));
    }

    #[test]
    fn elapsed_budget_stops_early() {
        let p = policy().with_max_elapsed(Duration::from_secs(12));
        assert!(matches!(
            p.decide(1, Duration::from_secs(6), FailureClass::Timeout, false),
            Decision::Retry { .. }
        ));
        assert_eq!(
            p.decide(2, Duration::from_secs(8), FailureClass::Timeout, false),
            Decision::GiveUp
        );
    }

    #[test]
    fn display_names_the_failure() {
        assert_eq!(FailureClass::Status(429).to_string(), "HTTP 429");
        assert_eq!(FailureClass::EmptyBody.to_string(), "empty completion");
    }
}
