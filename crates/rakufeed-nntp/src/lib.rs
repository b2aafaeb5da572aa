//! Rakufeed NNTP - upload announcement feed
//!
//! Polls a newsgroup (by default `perl.cpan.uploads` on `nntp.perl.org`)
//! and yields each new article's header block, interleaved with diagnostic
//! log events.
//!
//! # Example
//!
//! ```ignore
//! use futures_util::StreamExt;
//! use rakufeed_nntp::{Config, Event};
//!
//! let cancel = tokio_util::sync::CancellationToken::new();
//! let mut events = rakufeed_nntp::stream(Config::default(), cancel);
//! while let Some(event) = events.next().await {
//!     if let Event::Article(article) = event {
//!         println!("{} {}", article.id, article.header.get("Subject"));
//!     }
//! }
//! ```

pub mod client;
pub mod config;
pub mod event;
pub mod poller;

// Re-exports
pub use client::NntpError;
pub use config::Config;
pub use event::{Article, Event, Header, LogEvent, LogLevel};
pub use poller::{EventStream, stream};
