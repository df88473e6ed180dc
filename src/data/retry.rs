//! Bounded retry with exponential backoff.
//!
//! Every network call made by the adapters goes through [`Retry::run`].
//! The operation classifies its own failures as [`Attempt::Retryable`] or
//! [`Attempt::Fatal`]; a fatal failure stops immediately, a retryable one is
//! retried until the attempt budget is spent.
//!
//! Delay before retry `n` (1-based) is `initial_delay * 2^(n-1)`, capped at
//! `max_delay`. With the defaults that is 1s, 2s, 4s, ... up to 10s.

use std::fmt::Display;
use std::time::Duration;

use tracing::{error, warn};

/// Classification of a single failed attempt.
#[derive(Debug)]
pub enum Attempt<E> {
    Retryable(E),
    Fatal(E),
}

impl<E> Attempt<E> {
    pub fn into_inner(self) -> E {
        match self {
            Attempt::Retryable(e) | Attempt::Fatal(e) => e,
        }
    }
}

/// Why [`Retry::run`] gave up.
#[derive(Debug)]
pub enum RetryError<E> {
    /// Every attempt failed with a retryable error; `source` is the last one.
    Exhausted { attempts: u32, source: E },
    /// A fatal error ended the loop early.
    Aborted { attempt: u32, source: E },
}

impl<E> RetryError<E> {
    /// The underlying error, unmodified.
    pub fn into_inner(self) -> E {
        match self {
            RetryError::Exhausted { source, .. } | RetryError::Aborted { source, .. } => source,
        }
    }

    pub fn is_exhausted(&self) -> bool {
        matches!(self, RetryError::Exhausted { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(1000),
            max_delay: Duration::from_millis(10_000),
        }
    }
}

impl RetryPolicy {
    /// Delay to wait after failed attempt `attempt` (1-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exp = attempt.saturating_sub(1).min(31);
        self.initial_delay
            .checked_mul(1u32 << exp)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }
}

/// Where backoff delays are spent.
pub trait Sleeper {
    fn sleep(&self, delay: Duration);
}

/// Blocks the current thread.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, delay: Duration) {
        std::thread::sleep(delay);
    }
}

pub struct Retry {
    policy: RetryPolicy,
    sleeper: Box<dyn Sleeper>,
}

impl Default for Retry {
    fn default() -> Self {
        Self::new(RetryPolicy::default(), Box::new(ThreadSleeper))
    }
}

impl Retry {
    pub fn new(policy: RetryPolicy, sleeper: Box<dyn Sleeper>) -> Self {
        Self { policy, sleeper }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Run `operation` until it succeeds, fails fatally, or the budget runs out.
    ///
    /// `operation` receives the 1-based attempt number.
    pub fn run<T, E, F>(&self, label: &str, mut operation: F) -> Result<T, RetryError<E>>
    where
        E: Display,
        F: FnMut(u32) -> Result<T, Attempt<E>>,
    {
        let max_attempts = self.policy.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            match operation(attempt) {
                Ok(value) => return Ok(value),
                Err(Attempt::Fatal(source)) => {
                    error!(operation = label, attempt, error = %source, "non-retryable failure");
                    return Err(RetryError::Aborted { attempt, source });
                }
                Err(Attempt::Retryable(source)) => {
                    if attempt >= max_attempts {
                        error!(
                            operation = label,
                            attempts = attempt,
                            error = %source,
                            "{label} failed after {attempt} attempts"
                        );
                        return Err(RetryError::Exhausted {
                            attempts: attempt,
                            source,
                        });
                    }

                    let delay = self.policy.delay_for(attempt);
                    warn!(
                        operation = label,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %source,
                        "{label} attempt {attempt} failed, retrying"
                    );
                    self.sleeper.sleep(delay);
                    attempt += 1;
                }
            }
        }
    }
}


#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::testing::RecordingSleeper;
    use super::*;

    fn retry_with(sleeper: &RecordingSleeper) -> Retry {
        Retry::new(RetryPolicy::default(), Box::new(sleeper.clone()))
    }

    #[test]
    fn server_errors_use_every_attempt_with_doubling_delays() {
        let sleeper = RecordingSleeper::default();
        let retry = retry_with(&sleeper);
        let calls = Cell::new(0);

        let result: Result<(), _> = retry.run("fetch", |_| {
            calls.set(calls.get() + 1);
            Err(Attempt::Retryable("500 Internal Server Error"))
        });

        let err = result.unwrap_err();
        assert!(err.is_exhausted());
        assert_eq!(err.into_inner(), "500 Internal Server Error");
        assert_eq!(calls.get(), 3);
        assert_eq!(
            *sleeper.delays.borrow(),
            vec![Duration::from_millis(1000), Duration::from_millis(2000)]
        );
    }

    #[test]
    fn client_errors_are_attempted_once() {
        let sleeper = RecordingSleeper::default();
        let retry = retry_with(&sleeper);
        let calls = Cell::new(0);

        let result: Result<(), _> = retry.run("fetch", |_| {
            calls.set(calls.get() + 1);
            Err(Attempt::Fatal("404 Not Found"))
        });

        let err = result.unwrap_err();
        assert!(!err.is_exhausted());
        assert!(matches!(err, RetryError::Aborted { attempt: 1, .. }));
        assert_eq!(calls.get(), 1);
        assert!(sleeper.delays.borrow().is_empty());
    }

    #[test]
    fn recovers_after_transient_failure() {
        let sleeper = RecordingSleeper::default();
        let retry = retry_with(&sleeper);

        let result = retry.run("fetch", |attempt| {
            if attempt < 2 {
                Err(Attempt::Retryable("429 Too Many Requests"))
            } else {
                Ok(attempt)
            }
        });

        assert_eq!(result.unwrap(), 2);
        assert_eq!(*sleeper.delays.borrow(), vec![Duration::from_millis(1000)]);
    }

    #[test]
    fn delays_double_and_cap() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_for(1), Duration::from_millis(1000));
        assert_eq!(policy.delay_for(2), Duration::from_millis(2000));
        assert_eq!(policy.delay_for(3), Duration::from_millis(4000));
        assert_eq!(policy.delay_for(4), Duration::from_millis(8000));
        assert_eq!(policy.delay_for(5), Duration::from_millis(10_000));
        assert_eq!(policy.delay_for(40), Duration::from_millis(10_000));
    }

    #[test]
    fn longer_budget_sleeps_before_every_retry() {
        let sleeper = RecordingSleeper::default();
        let policy = RetryPolicy {
            max_attempts: 6,
            ..RetryPolicy::default()
        };
        let retry = Retry::new(policy, Box::new(sleeper.clone()));

        let _: Result<(), _> = retry.run("fetch", |_| Err(Attempt::Retryable("boom")));

        let delays: Vec<u64> = sleeper.delays.borrow().iter().map(|d| d.as_millis() as u64).collect();
        assert_eq!(delays, vec![1000, 2000, 4000, 8000, 10_000]);
    }
}
