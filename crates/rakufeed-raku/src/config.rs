//! Correction and output settings

use rakufeed_core::RetryPolicy;

pub const DEFAULT_MIRROR: &str = "https://www.cpan.org";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Base URL of the CPAN mirror serving META files
    pub mirror: String,
    pub policy: RetryPolicy,
    /// Corrections allowed to fetch at once (0 = unbounded)
    pub max_concurrent: usize,
    /// Corrected distributions buffered before producers wait on the consumer
    pub sink_buffer: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            mirror: DEFAULT_MIRROR.to_string(),
            policy: RetryPolicy::default(),
            max_concurrent: 0,
            sink_buffer: 1,
        }
    }
}
