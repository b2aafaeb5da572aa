//! Rakufeed Raku - Raku upload detection and main-module correction
//!
//! Consumes the upload feed, keeps Raku distributions, and corrects each
//! guessed main module against the distribution's META file before handing
//! it to the output stream.

pub mod config;
pub mod correction;
pub mod distribution;
pub mod fetcher;
pub mod ingest;

// Re-exports
pub use config::Config;
pub use correction::{CorrectionError, Corrector};
pub use distribution::{Distribution, ParseError};
pub use fetcher::{MetaFetcher, MetaSource};
pub use ingest::IngestStats;
