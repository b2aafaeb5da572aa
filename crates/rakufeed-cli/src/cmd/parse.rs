//! Parse subcommand - show how one subject is interpreted

use anyhow::{Context, Result};
use clap::Args;
use rakufeed_raku::Distribution;

use crate::config::Config;

#[derive(Args, Debug)]
pub struct ParseArgs {
    /// Article number to attach to the record
    pub id: u64,

    /// Subject line, e.g. "CPAN Upload: S/SK/SKAJI/Perl6/Foo-Bar-0.0.1.tar.gz"
    pub subject: String,
}

pub fn run(args: ParseArgs, config: &Config) -> Result<()> {
    let dist = Distribution::parse(args.id, &args.subject)
        .with_context(|| format!("Cannot parse subject {:?}", args.subject))?;

    println!("{}", serde_json::to_string_pretty(&dist)?);
    let mirror = &config.correction.mirror;
    eprintln!("archive: {}", dist.download_url(mirror));
    if dist.is_raku {
        eprintln!("META: {}", dist.meta_url(mirror));
    } else {
        eprintln!("not a Raku distribution, would be skipped");
    }
    Ok(())
}
