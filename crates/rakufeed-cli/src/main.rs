//! rakufeed - Raku upload feed with META-corrected module names
//!
//! Follows the CPAN upload newsgroup, keeps Raku distributions, and prints
//! each one once its main module has been checked against its META file.

use anyhow::Result;
use clap::{Parser, Subcommand};

mod cmd;
mod config;

use config::Config;

#[derive(Parser)]
#[command(name = "rakufeed")]
#[command(about = "Raku upload feed with META-corrected module names")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    /// Only log warnings and errors
    #[arg(short, long, global = true, conflicts_with = "debug")]
    quiet: bool,

    /// Config file path (default: ./rakufeed.toml or ~/.config/rakufeed/config.toml)
    #[arg(short, long, global = true)]
    config: Option<std::path::PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Follow the upload feed and print corrected Raku distributions
    Watch(cmd::watch::WatchArgs),
    /// Parse one upload subject and print the record
    Parse(cmd::parse::ParseArgs),
    /// Show current configuration
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    rakufeed_core::init_logging(cli.quiet, cli.debug);

    let config = if let Some(path) = cli.config {
        Config::from_file(&path)?
    } else {
        Config::load()?
    };

    match cli.command {
        Command::Watch(args) => cmd::watch::run(args, config).await,
        Command::Parse(args) => cmd::parse::run(args, &config),
        Command::Config => {
            cmd::print_table(
                "Setting",
                &[
                    ("News server", config.feed.server.clone()),
                    ("Group", config.feed.group.clone()),
                    ("Poll interval", format!("{}s", config.feed.tick_secs)),
                    ("Poll timeout", format!("{}s", config.feed.timeout_secs)),
                    ("Backlog", config.feed.backlog.to_string()),
                    ("Feed diagnostics", config.feed.subscribe_log.to_string()),
                    ("Mirror", config.correction.mirror.clone()),
                    ("Max attempts", config.correction.max_attempts.to_string()),
                    (
                        "Attempt timeout",
                        format!("{}s", config.correction.attempt_timeout_secs),
                    ),
                    (
                        "Retry delay",
                        format!("{}s", config.correction.retry_delay_secs),
                    ),
                    (
                        "Max concurrent",
                        match config.correction.max_concurrent {
                            0 => "unbounded".to_string(),
                            n => n.to_string(),
                        },
                    ),
                    ("Output format", format!("{:?}", config.output.format)),
                    ("Output buffer", config.output.buffer.to_string()),
                ],
            );
            Ok(())
        }
    }
}
