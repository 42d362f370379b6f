//! Resilience layer for the generation client.
//!
//! Bounded retry with a fixed (not exponential) delay between attempts.

mod retry;

pub use retry::{RetryConfig, RetryPolicy, DEFAULT_BACKOFF, DEFAULT_MAX_ATTEMPTS};
