//! Bounded retry with fixed backoff
//!
//! Every external call made during startup goes through a [`RetryExecutor`].
//! Failures are classified by [`Error::class`]: retryable failures consume the
//! attempt budget and sleep a fixed delay, fatal failures surface immediately,
//! and cancellation aborts without consuming budget or sleeping.

use crate::common::{Error, FailureClass, Result};
use std::time::Duration;

/// Default attempt budget
pub const DEFAULT_MAX_ATTEMPTS: u32 = 15;

/// Default delay between attempts (fixed, not exponential)
pub const DEFAULT_BACKOFF: Duration = Duration::from_millis(100);

/// Attempt budget and backoff for one call site
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff: Duration,
}

impl RetryPolicy {
    /// `max_attempts` is clamped to at least one attempt.
    pub fn new(max_attempts: u32, backoff: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ATTEMPTS, DEFAULT_BACKOFF)
    }
}

/// Result of a single attempt, tagged the way the executor branches on it
#[derive(Debug)]
pub enum Outcome<T> {
    Success(T),
    Retryable(Error),
    Fatal(Error),
    Cancelled(Error),
}

impl<T> Outcome<T> {
    pub fn status(&self) -> AttemptStatus {
        match self {
            Outcome::Success(_) => AttemptStatus::Succeeded,
            Outcome::Retryable(_) => AttemptStatus::Failed,
            Outcome::Fatal(_) => AttemptStatus::Fatal,
            Outcome::Cancelled(_) => AttemptStatus::Cancelled,
        }
    }
}

impl<T> From<Result<T>> for Outcome<T> {
    fn from(result: Result<T>) -> Self {
        match result {
            Ok(value) => Outcome::Success(value),
            Err(e) => match e.class() {
                FailureClass::Retryable => Outcome::Retryable(e),
                FailureClass::Fatal => Outcome::Fatal(e),
                FailureClass::Cancelled => Outcome::Cancelled(e),
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptStatus {
    Succeeded,
    Failed,
    Fatal,
    Cancelled,
}

/// Passed to the per-attempt hook after every attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Attempt {
    /// 1-based attempt number within the call
    pub number: u32,
    pub status: AttemptStatus,
}

/// Blocks the calling thread between attempts
pub trait Sleeper {
    fn sleep(&self, delay: Duration);
}

/// Sleeps on the current thread
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, delay: Duration) {
        std::thread::sleep(delay);
    }
}

/// Retry wrapper around a fallible operation.
///
/// Each call site owns its executor; it is not meant to be shared between
/// concurrent callers.
pub struct RetryExecutor<S: Sleeper = ThreadSleeper> {
    operation: String,
    policy: RetryPolicy,
    sleeper: S,
}

impl RetryExecutor<ThreadSleeper> {
    pub fn new(operation: impl Into<String>, policy: RetryPolicy) -> Self {
        Self::with_sleeper(operation, policy, ThreadSleeper)
    }
}

impl<S: Sleeper> RetryExecutor<S> {
    pub fn with_sleeper(operation: impl Into<String>, policy: RetryPolicy, sleeper: S) -> Self {
        Self {
            operation: operation.into(),
            policy: RetryPolicy::new(policy.max_attempts, policy.backoff),
            sleeper,
        }
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Run `op` until it succeeds, fails fatally, is cancelled, or the
    /// attempt budget runs out. The last failure is returned on exhaustion.
    pub fn call<T, F>(&self, op: F) -> Result<T>
    where
        F: FnMut() -> Result<T>,
    {
        self.call_with_hook(op, |_| {})
    }

    /// Like [`call`](Self::call), invoking `on_attempt` after every attempt,
    /// including the one that ends the call.
    pub fn call_with_hook<T, F, H>(&self, mut op: F, mut on_attempt: H) -> Result<T>
    where
        F: FnMut() -> Result<T>,
        H: FnMut(&Attempt),
    {
        let mut number = 0u32;
        let mut failures = 0u32;

        loop {
            number += 1;
            let outcome = Outcome::from(op());
            on_attempt(&Attempt {
                number,
                status: outcome.status(),
            });

            match outcome {
                Outcome::Success(value) => return Ok(value),
                Outcome::Cancelled(e) => {
                    tracing::info!("{} cancelled on attempt {}", self.operation, number);
                    return Err(e);
                }
                Outcome::Fatal(e) => {
                    tracing::error!("{} failed, not retrying: {}", self.operation, e);
                    return Err(e);
                }
                Outcome::Retryable(e) => {
                    failures += 1;
                    if failures >= self.policy.max_attempts {
                        tracing::error!(
                            "{} gave up after {} attempts: {}",
                            self.operation,
                            failures,
                            e
                        );
                        return Err(e);
                    }

                    if failures == 1 {
                        tracing::error!(
                            operation = %self.operation,
                            error = ?e,
                            "Retry #{} for: {}",
                            failures,
                            e
                        );
                    } else {
                        tracing::warn!("Retry #{} for {}: {}", failures, self.operation, e);
                    }

                    self.sleeper.sleep(self.policy.backoff);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};

    #[derive(Default)]
    struct CountingSleeper {
        sleeps: Cell<u32>,
        total: Cell<Duration>,
    }

    impl Sleeper for &CountingSleeper {
        fn sleep(&self, delay: Duration) {
            self.sleeps.set(self.sleeps.get() + 1);
            self.total.set(self.total.get() + delay);
        }
    }

    fn executor(max_attempts: u32, sleeper: &CountingSleeper) -> RetryExecutor<&CountingSleeper> {
        RetryExecutor::with_sleeper(
            "test op",
            RetryPolicy::new(max_attempts, Duration::from_millis(100)),
            sleeper,
        )
    }

    #[test]
    fn test_succeeds_after_transient_failures() {
        let sleeper = CountingSleeper::default();
        let retry = executor(5, &sleeper);
        let attempts = Cell::new(0);

        let value = retry
            .call(|| {
                attempts.set(attempts.get() + 1);
                if attempts.get() <= 3 {
                    Err(Error::Directory("unavailable".into()))
                } else {
                    Ok("registered")
                }
            })
            .unwrap();

        assert_eq!(value, "registered");
        assert_eq!(attempts.get(), 4);
        assert_eq!(sleeper.sleeps.get(), 3);
        assert_eq!(sleeper.total.get(), Duration::from_millis(300));
    }

    #[test]
    fn test_success_on_first_attempt_never_sleeps() {
        let sleeper = CountingSleeper::default();
        let retry = executor(15, &sleeper);

        assert_eq!(retry.call(|| Ok(7)).unwrap(), 7);
        assert_eq!(sleeper.sleeps.get(), 0);
    }

    #[test]
    fn test_exhaustion_returns_last_failure() {
        let sleeper = CountingSleeper::default();
        let retry = executor(4, &sleeper);
        let attempts = Cell::new(0);

        let err = retry
            .call(|| -> Result<()> {
                attempts.set(attempts.get() + 1);
                Err(Error::Membership(format!("attempt {}", attempts.get())))
            })
            .unwrap_err();

        assert_eq!(attempts.get(), 4);
        assert_eq!(sleeper.sleeps.get(), 3);
        assert!(matches!(err, Error::Membership(ref msg) if msg == "attempt 4"));
    }

    #[test]
    fn test_cancellation_short_circuits() {
        let sleeper = CountingSleeper::default();
        let retry = executor(10, &sleeper);
        let attempts = Cell::new(0);

        let err = retry
            .call(|| -> Result<()> {
                attempts.set(attempts.get() + 1);
                Err(Error::Cancelled)
            })
            .unwrap_err();

        assert!(matches!(err, Error::Cancelled));
        assert_eq!(attempts.get(), 1);
        assert_eq!(sleeper.sleeps.get(), 0);
    }

    #[test]
    fn test_cancellation_does_not_consume_budget() {
        let sleeper = CountingSleeper::default();
        let retry = executor(2, &sleeper);
        let attempts = Cell::new(0);

        let err = retry
            .call(|| -> Result<()> {
                attempts.set(attempts.get() + 1);
                if attempts.get() == 1 {
                    Err(Error::Timeout("list".into()))
                } else {
                    Err(Error::Cancelled)
                }
            })
            .unwrap_err();

        assert!(matches!(err, Error::Cancelled));
        assert_eq!(attempts.get(), 2);
        assert_eq!(sleeper.sleeps.get(), 1);
    }

    #[test]
    fn test_fatal_error_is_not_retried() {
        let sleeper = CountingSleeper::default();
        let retry = executor(15, &sleeper);
        let attempts = Cell::new(0);

        let err = retry
            .call(|| -> Result<()> {
                attempts.set(attempts.get() + 1);
                Err(Error::InvalidConfig("no clusters".into()))
            })
            .unwrap_err();

        assert!(matches!(err, Error::InvalidConfig(_)));
        assert_eq!(attempts.get(), 1);
        assert_eq!(sleeper.sleeps.get(), 0);
    }

    #[test]
    fn test_hook_runs_after_every_attempt() {
        let sleeper = CountingSleeper::default();
        let retry = executor(3, &sleeper);
        let seen = RefCell::new(Vec::new());

        let result = retry.call_with_hook(
            || -> Result<()> { Err(Error::Directory("down".into())) },
            |attempt| seen.borrow_mut().push(*attempt),
        );

        assert!(result.is_err());
        let seen = seen.into_inner();
        assert_eq!(seen.len(), 3);
        assert_eq!(seen.iter().map(|a| a.number).collect::<Vec<_>>(), [1, 2, 3]);
        assert!(seen.iter().all(|a| a.status == AttemptStatus::Failed));
    }

    #[test]
    fn test_hook_sees_cancellation_and_success() {
        let sleeper = CountingSleeper::default();
        let retry = executor(3, &sleeper);
        let statuses = RefCell::new(Vec::new());

        let _ = retry.call_with_hook(
            || -> Result<()> { Err(Error::Cancelled) },
            |attempt| statuses.borrow_mut().push(attempt.status),
        );
        let _ = retry.call_with_hook(|| Ok(()), |attempt| statuses.borrow_mut().push(attempt.status));

        assert_eq!(
            statuses.into_inner(),
            [AttemptStatus::Cancelled, AttemptStatus::Succeeded]
        );
    }

    #[test]
    fn test_single_attempt_budget() {
        let sleeper = CountingSleeper::default();
        let retry = executor(0, &sleeper);
        assert_eq!(retry.policy().max_attempts, 1);

        let attempts = Cell::new(0);
        let _ = retry.call(|| -> Result<()> {
            attempts.set(attempts.get() + 1);
            Err(Error::Directory("down".into()))
        });
        assert_eq!(attempts.get(), 1);
        assert_eq!(sleeper.sleeps.get(), 0);
    }

    #[test]
    fn test_default_policy() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts, 15);
        assert_eq!(policy.backoff, Duration::from_millis(100));
    }
}
