//! Retry with exponential backoff for page fetches

use std::time::Duration;

use crate::fetch::FetchError;
use crate::shutdown::sleep_unless_shutdown;

/// Default attempts per fetch (first try included)
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Bounded attempts with exponential backoff between them
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first
    pub max_attempts: u32,
    /// Multiplied by `2^attempt` to get the wait after a failed attempt
    pub backoff_base: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            backoff_base: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// Wait after failed attempt `attempt` (1-indexed): base * 2^attempt (2s, 4s, 8s, ...)
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.backoff_base
            .saturating_mul(2u32.saturating_pow(attempt))
    }
}

/// Why a retried operation produced no value
#[derive(Debug)]
pub enum RetryError {
    /// Every attempt failed, or the last failure was not retryable
    GaveUp { attempts: u32, last: FetchError },
    /// Shutdown was requested while waiting to retry
    Cancelled { attempts: u32 },
}

impl std::fmt::Display for RetryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::GaveUp { attempts, last } => {
                write!(f, "gave up after {attempts} attempt(s): {last}")
            }
            Self::Cancelled { attempts } => {
                write!(f, "cancelled by shutdown after {attempts} attempt(s)")
            }
        }
    }
}

impl std::error::Error for RetryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::GaveUp { last, .. } => Some(last),
            Self::Cancelled { .. } => None,
        }
    }
}

impl RetryError {
    pub fn attempts(&self) -> u32 {
        match self {
            Self::GaveUp { attempts, .. } | Self::Cancelled { attempts } => *attempts,
        }
    }
}

/// Retry a fallible fetch with exponential backoff.
///
/// `attempt_fn` receives the 1-indexed attempt number. Each failure is logged;
/// the wait before the next attempt wakes early if shutdown is requested.
/// Returns the first success, or [`RetryError`] on exhaustion / cancellation.
pub fn retry_with_backoff<T>(
    label: &str,
    policy: &RetryPolicy,
    mut attempt_fn: impl FnMut(u32) -> Result<T, FetchError>,
) -> Result<T, RetryError> {
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 0u32;
    loop {
        attempt += 1;
        match attempt_fn(attempt) {
            Ok(v) => return Ok(v),
            Err(e) if attempt < max_attempts && e.is_retryable() => {
                let wait = policy.backoff(attempt);
                log::warn!(
                    "Attempt {attempt}/{max_attempts} failed for {label}: {e}, retrying in {:.0}s",
                    wait.as_secs_f64()
                );
                if !sleep_unless_shutdown(wait) {
                    log::warn!("{label}: shutdown requested, not retrying");
                    return Err(RetryError::Cancelled { attempts: attempt });
                }
            }
            Err(e) => {
                log::error!("Giving up on {label} after {attempt} attempt(s): {e}");
                return Err(RetryError::GaveUp {
                    attempts: attempt,
                    last: e,
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn instant() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 3,
            backoff_base: Duration::ZERO,
        }
    }

    fn net_err() -> FetchError {
        FetchError::Http {
            status: Some(503),
            message: "unavailable".into(),
        }
    }

    #[test]
    fn backoff_exponential() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.backoff(1), Duration::from_secs(2));
        assert_eq!(policy.backoff(2), Duration::from_secs(4));
        assert_eq!(policy.backoff(3), Duration::from_secs(8));
    }

    #[test]
    fn backoff_scales_with_base() {
        let policy = RetryPolicy {
            max_attempts: 3,
            backoff_base: Duration::from_millis(10),
        };
        assert_eq!(policy.backoff(2), Duration::from_millis(40));
    }

    #[test]
    fn succeeds_first_try() {
        let calls = Cell::new(0);
        let out = retry_with_backoff("x", &instant(), |_| {
            calls.set(calls.get() + 1);
            Ok::<_, FetchError>(7)
        });
        assert_eq!(out.unwrap(), 7);
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn fails_twice_then_succeeds() {
        let seen = std::cell::RefCell::new(Vec::new());
        let out = retry_with_backoff("x", &instant(), |attempt| {
            seen.borrow_mut().push(attempt);
            if attempt < 3 { Err(net_err()) } else { Ok("page") }
        });
        assert_eq!(out.unwrap(), "page");
        assert_eq!(*seen.borrow(), vec![1, 2, 3]);
    }

    #[test]
    fn gives_up_after_max_attempts() {
        let calls = Cell::new(0);
        let out: Result<(), _> = retry_with_backoff("x", &instant(), |_| {
            calls.set(calls.get() + 1);
            Err(net_err())
        });
        let err = out.unwrap_err();
        assert_eq!(calls.get(), 3);
        assert_eq!(err.attempts(), 3);
        assert!(matches!(err, RetryError::GaveUp { .. }));
        assert!(err.to_string().contains("gave up after 3 attempt(s)"));
    }

    #[test]
    fn non_retryable_stops_immediately() {
        let calls = Cell::new(0);
        let out: Result<(), _> = retry_with_backoff("x", &instant(), |_| {
            calls.set(calls.get() + 1);
            Err(FetchError::Io(std::io::Error::new(
                std::io::ErrorKind::StorageFull,
                "disk full",
            )))
        });
        assert_eq!(calls.get(), 1);
        assert!(matches!(out, Err(RetryError::GaveUp { attempts: 1, .. })));
    }

    #[test]
    fn zero_max_attempts_still_tries_once() {
        let policy = RetryPolicy {
            max_attempts: 0,
            backoff_base: Duration::ZERO,
        };
        let calls = Cell::new(0);
        let _ = retry_with_backoff("x", &policy, |_| {
            calls.set(calls.get() + 1);
            Err::<(), _>(net_err())
        });
        assert_eq!(calls.get(), 1);
    }
}
