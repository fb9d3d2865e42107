//! Retry policy for image downloads.
//!
//! Classifies transport failures (timeouts, connection errors, HTTP status
//! errors) against storage failures, and decides whether and when to try the
//! same image again.

mod classify;
mod error;
mod policy;
mod run;

pub use classify::{classify, classify_curl_error};
pub use error::FetchError;
pub use policy::{ErrorKind, RetryDecision, RetryPolicy};
pub use run::run_with_retry;
