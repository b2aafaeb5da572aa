//! Logging setup (env_logger backend for the `log` facade)

use std::io::IsTerminal;

/// ANSI color code and padded label for a log level.
fn level_style(level: log::Level, color: bool) -> (&'static str, &'static str, &'static str) {
    let label = match level {
        log::Level::Error => "ERROR",
        log::Level::Warn => "WARN ",
        log::Level::Info => "INFO ",
        log::Level::Debug => "DEBUG",
        log::Level::Trace => "TRACE",
    };
    if !color {
        return ("", label, "");
    }
    let ansi = match level {
        log::Level::Error => "\x1b[31m",
        log::Level::Warn => "\x1b[33m",
        log::Level::Info => "\x1b[32m",
        log::Level::Debug => "\x1b[36m",
        log::Level::Trace => "\x1b[35m",
    };
    (ansi, label, "\x1b[0m")
}

/// Default filter when `RUST_LOG` is unset
fn default_level(quiet: bool, debug: bool) -> &'static str {
    if debug {
        "debug"
    } else if quiet {
        "warn"
    } else {
        "info"
    }
}

/// Initialize logging on stderr.
///
/// Records go to stderr so stdout stays clean for emitted distributions.
/// TTY: colored labels. Non-TTY: plain labels with millisecond timestamps
/// for log aggregation.
pub fn init_logging(quiet: bool, debug: bool) {
    use std::io::Write;

    let env = env_logger::Env::default().default_filter_or(default_level(quiet, debug));
    let color = std::io::stderr().is_terminal();

    let mut builder = env_logger::Builder::from_env(env);
    if color {
        builder.format(|buf, record| {
            let (pre, label, post) = level_style(record.level(), true);
            writeln!(buf, "[{pre}{label}{post}] {}", record.args())
        });
    } else {
        builder.format(|buf, record| {
            let (_, label, _) = level_style(record.level(), false);
            writeln!(buf, "{} [{label}] {}", buf.timestamp_millis(), record.args())
        });
    }
    if let Err(e) = builder.try_init() {
        eprintln!("logger already initialized: {e}");
    }
}
