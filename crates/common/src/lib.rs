//! Common utilities shared across calfeed crates.
//!
//! - [`time`]: a [`Clock`](time::Clock) abstraction so cache buckets and
//!   polling intervals can be tested deterministically
//! - [`resilience`]: the generic retry executor used by every feed fetch

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::complexity, clippy::suspicious)]

pub mod resilience;
pub mod time;

pub use resilience::{
    BackoffStrategy, RetryConfig, RetryConfigBuilder, RetryDecision, RetryError, RetryExecutor,
    RetryOutcome, RetryPolicy, RetryResult,
};
pub use time::{Clock, MockClock, SystemClock};
