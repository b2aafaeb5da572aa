//! Configuration loading from TOML files

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use rakufeed_core::RetryPolicy;
use serde::Deserialize;

/// Global configuration for rakufeed
#[derive(Debug, Clone, Deserialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    pub feed: FeedConfig,
    pub correction: CorrectionConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct FeedConfig {
    /// News server, `host:port`
    pub server: String,
    pub group: String,
    pub tick_secs: u64,
    pub timeout_secs: u64,
    /// Articles to replay from before the current high-water mark
    pub backlog: u64,
    pub subscribe_log: bool,
}

impl Default for FeedConfig {
    fn default() -> Self {
        let nntp = rakufeed_nntp::Config::default();
        Self {
            server: nntp.addr,
            group: nntp.group,
            tick_secs: nntp.tick.as_secs(),
            timeout_secs: nntp.timeout.as_secs(),
            backlog: nntp.backlog,
            subscribe_log: nntp.subscribe_log,
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CorrectionConfig {
    /// CPAN mirror serving META files
    pub mirror: String,
    pub max_attempts: u32,
    pub attempt_timeout_secs: u64,
    pub retry_delay_secs: u64,
    /// 0 = unbounded
    pub max_concurrent: usize,
}

impl Default for CorrectionConfig {
    fn default() -> Self {
        let policy = RetryPolicy::default();
        Self {
            mirror: rakufeed_raku::config::DEFAULT_MIRROR.to_string(),
            max_attempts: policy.max_attempts,
            attempt_timeout_secs: policy.attempt_timeout.as_secs(),
            retry_delay_secs: policy.retry_delay.as_secs(),
            max_concurrent: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// One JSON object per line
    #[default]
    Json,
    /// `id main_module version path`
    Text,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct OutputConfig {
    pub format: OutputFormat,
    /// Corrected records buffered ahead of the printer
    pub buffer: usize,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::default(),
            buffer: 1,
        }
    }
}

impl Config {
    /// Load configuration from default locations
    ///
    /// Search order:
    /// 1. ./rakufeed.toml (current directory)
    /// 2. ~/.config/rakufeed/config.toml
    ///
    /// If no config file found, returns default config.
    pub fn load() -> Result<Self> {
        let local_config = PathBuf::from("rakufeed.toml");
        if local_config.exists() {
            return Self::from_file(&local_config);
        }

        if let Some(config_dir) = directories::ProjectDirs::from("", "", "rakufeed") {
            let user_config = config_dir.config_dir().join("config.toml");
            if user_config.exists() {
                return Self::from_file(&user_config);
            }
        }

        log::debug!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Load configuration from a specific file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        config
            .validate()
            .with_context(|| format!("Invalid config file: {}", path.display()))?;

        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Reject values the pipeline cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.feed.tick_secs == 0 {
            bail!("feed.tick_secs must be at least 1");
        }
        if self.feed.timeout_secs == 0 {
            bail!("feed.timeout_secs must be at least 1");
        }
        if self.correction.max_attempts == 0 {
            bail!("correction.max_attempts must be at least 1");
        }
        if self.correction.attempt_timeout_secs == 0 {
            bail!("correction.attempt_timeout_secs must be at least 1");
        }
        Ok(())
    }

    pub fn nntp(&self) -> rakufeed_nntp::Config {
        rakufeed_nntp::Config {
            addr: self.feed.server.clone(),
            group: self.feed.group.clone(),
            tick: Duration::from_secs(self.feed.tick_secs),
            timeout: Duration::from_secs(self.feed.timeout_secs),
            subscribe_log: self.feed.subscribe_log,
            backlog: self.feed.backlog,
        }
    }

    pub fn raku(&self) -> rakufeed_raku::Config {
        rakufeed_raku::Config {
            mirror: self.correction.mirror.clone(),
            policy: RetryPolicy {
                max_attempts: self.correction.max_attempts,
                attempt_timeout: Duration::from_secs(self.correction.attempt_timeout_secs),
                retry_delay: Duration::from_secs(self.correction.retry_delay_secs),
            },
            max_concurrent: self.correction.max_concurrent,
            sink_buffer: self.output.buffer,
        }
    }
}
