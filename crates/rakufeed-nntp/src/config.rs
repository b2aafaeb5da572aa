//! NNTP feed configuration

use std::time::Duration;

/// Runtime configuration for the feed poller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Server address, `host:port`
    pub addr: String,
    /// Newsgroup to follow
    pub group: String,
    /// Interval between polls
    pub tick: Duration,
    /// Upper bound for one poll (connect + GROUP + HEADs)
    pub timeout: Duration,
    /// Emit `Event::Log` diagnostics alongside articles
    pub subscribe_log: bool,
    /// Articles before the current high-water mark to replay on the first poll
    pub backlog: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            addr: "nntp.perl.org:119".to_string(),
            group: "perl.cpan.uploads".to_string(),
            tick: Duration::from_secs(60),
            timeout: Duration::from_secs(25),
            subscribe_log: true,
            backlog: 0,
        }
    }
}
