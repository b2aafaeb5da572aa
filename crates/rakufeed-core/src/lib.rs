//! Rakufeed Core - Common infrastructure for the upload feed pipeline
//!
//! This crate provides reusable components for fetching metadata with
//! classified retries and handing results to a downstream consumer.

pub mod error;
pub mod http;
pub mod logging;
pub mod retry;
pub mod semaphore;
pub mod shutdown;
pub mod sink;

// Re-exports for convenience
pub use error::FetchError;
pub use http::http_client;
pub use logging::init_logging;
pub use retry::{RetryError, RetryPolicy, Retryable, retry_with_backoff};
pub use semaphore::ConcurrencyLimit;
pub use shutdown::spawn_signal_handler;
pub use sink::{OutputSink, SinkStream};
