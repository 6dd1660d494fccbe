//! Utility functions and helpers.

pub mod http;
pub mod retry;

pub use retry::{RetryError, RetryPolicy, retry};
