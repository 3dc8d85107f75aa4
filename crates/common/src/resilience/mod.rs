//! Resilience patterns for fault tolerance
//!
//! Currently a single generic retry executor. Callers supply the error
//! classification through [`RetryPolicy`]; the executor handles attempt
//! counting, fixed or growing delays and an optional overall time budget.

pub mod retry;

pub use retry::{
    policies, BackoffStrategy, RetryConfig, RetryConfigBuilder, RetryDecision, RetryError,
    RetryExecutor, RetryOutcome, RetryPolicy, RetryResult,
};
