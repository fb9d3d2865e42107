//! Retry loop: run a closure until success or policy says stop.

use super::classify;
use super::error::FetchError;
use super::policy::{RetryDecision, RetryPolicy};

/// Runs `f` until it succeeds or the retry policy says to stop, returning the
/// last error in that case.
///
/// `on_failure(attempt, &err)` is called for every failed attempt whose error
/// is retryable, including the final one, before any backoff sleep.
pub fn run_with_retry<T, F, R>(policy: &RetryPolicy, mut on_failure: R, mut f: F) -> Result<T, FetchError>
where
    F: FnMut(u32) -> Result<T, FetchError>,
    R: FnMut(u32, &FetchError),
{
    let mut attempt = 1u32;
    loop {
        match f(attempt) {
            Ok(v) => return Ok(v),
            Err(e) => {
                let kind = classify::classify(&e);
                if kind.is_retryable() {
                    on_failure(attempt, &e);
                }
                match policy.decide(attempt, kind) {
                    RetryDecision::NoRetry => return Err(e),
                    RetryDecision::RetryAfter(d) => {
                        if !d.is_zero() {
                            std::thread::sleep(d);
                        }
                        attempt += 1;
                    }
                }
            }
        }
    }
}
