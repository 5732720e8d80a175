//! Optional backoff for page and archive fetches.
//!
//! Off unless `[retry]` is configured. Only transient fetch failures are
//! retried; the downloader itself never retries.

mod classify;
mod run;

pub use classify::is_transient;
pub use run::{run_with_retry, RetryPolicy};
