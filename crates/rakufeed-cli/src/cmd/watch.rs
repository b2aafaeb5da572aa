//! Watch subcommand - run the feed until it ends or is interrupted

use std::io::Write;

use anyhow::{Context, Result};
use clap::Args;
use futures_util::StreamExt;
use rakufeed_raku::{Distribution, IngestStats, MetaFetcher};
use tokio_util::sync::CancellationToken;

use crate::config::{Config, OutputFormat};

#[derive(Args, Debug)]
pub struct WatchArgs {
    /// Replay this many articles from before the current high-water mark
    #[arg(short, long)]
    pub backlog: Option<u64>,

    /// News server, host:port
    #[arg(long)]
    pub server: Option<String>,

    /// CPAN mirror serving META files
    #[arg(long)]
    pub mirror: Option<String>,

    /// Corrections fetching at once (0 = unbounded)
    #[arg(short = 'j', long)]
    pub max_concurrent: Option<usize>,

    /// Output format
    #[arg(short, long, value_enum)]
    pub format: Option<OutputFormat>,
}

impl WatchArgs {
    /// Apply CLI overrides on top of file configuration
    fn apply(self, mut config: Config) -> Config {
        if let Some(backlog) = self.backlog {
            config.feed.backlog = backlog;
        }
        if let Some(server) = self.server {
            config.feed.server = server;
        }
        if let Some(mirror) = self.mirror {
            config.correction.mirror = mirror;
        }
        if let Some(n) = self.max_concurrent {
            config.correction.max_concurrent = n;
        }
        if let Some(format) = self.format {
            config.output.format = format;
        }
        config
    }
}

pub async fn run(args: WatchArgs, config: Config) -> Result<()> {
    let config = args.apply(config);
    config.validate()?;
    let cancel = CancellationToken::new();
    rakufeed_core::spawn_signal_handler(cancel.clone());

    let nntp = config.nntp();
    let raku = config.raku();
    log::info!(
        "Watching {} on {} (mirror {})",
        nntp.group,
        nntp.addr,
        raku.mirror
    );

    let events = rakufeed_nntp::stream(nntp, cancel.clone());
    let (mut out, handle) =
        rakufeed_raku::ingest::spawn(events, MetaFetcher::new(), &raku, cancel);

    let mut stdout = std::io::stdout().lock();
    while let Some(dist) = out.next().await {
        writeln!(stdout, "{}", render(&dist, config.output.format)?)
            .context("Failed to write to stdout")?;
        stdout.flush()?;
    }

    let stats = handle.await.context("Ingestion task failed")?;
    print_summary(&stats);
    Ok(())
}

fn render(dist: &Distribution, format: OutputFormat) -> Result<String> {
    Ok(match format {
        OutputFormat::Json => serde_json::to_string(dist)?,
        OutputFormat::Text => format!(
            "{} {} {} {}",
            dist.id, dist.main_module, dist.version, dist.path
        ),
    })
}

fn print_summary(stats: &IngestStats) {
    super::print_table(
        "Watch",
        &[
            ("Articles", stats.articles.to_string()),
            ("Unparsable", stats.parse_errors.to_string()),
            ("Not Raku", stats.non_raku.to_string()),
            ("Duplicates", stats.duplicates.to_string()),
            ("Dispatched", stats.dispatched.to_string()),
            ("Emitted", stats.emitted.to_string()),
            ("Failed", stats.failed.to_string()),
            ("Cancelled", stats.cancelled.to_string()),
        ],
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn foo_bar() -> Distribution {
        Distribution::parse(1001, "CPAN Upload: S/SK/SKAJI/Perl6/Foo-Bar-0.0.1.tar.gz").unwrap()
    }

    #[test]
    fn render_text_and_json() {
        let dist = foo_bar();
        assert_eq!(
            render(&dist, OutputFormat::Text).unwrap(),
            "1001 Foo::Bar 0.0.1 S/SK/SKAJI/Perl6/Foo-Bar-0.0.1.tar.gz"
        );
        let json: serde_json::Value =
            serde_json::from_str(&render(&dist, OutputFormat::Json).unwrap()).unwrap();
        assert_eq!(json["name"], "Foo-Bar");
    }

    #[test]
    fn cli_overrides_file_values() {
        let args = WatchArgs {
            backlog: Some(5),
            server: None,
            mirror: Some("http://localhost:8080".to_string()),
            max_concurrent: None,
            format: Some(OutputFormat::Text),
        };
        let config = args.apply(Config::default());
        assert_eq!(config.feed.backlog, 5);
        assert_eq!(config.feed.server, "nntp.perl.org:119");
        assert_eq!(config.correction.mirror, "http://localhost:8080");
        assert_eq!(config.output.format, OutputFormat::Text);
    }
}
