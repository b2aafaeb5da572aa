//! Stream ingestion loop: feed events in, corrected Raku distributions out
//!
//! ```text
//! feed events ─→ parse ─→ is_raku? ─→ seen? ─→ spawn correction ─→ sink
//!     │                                            (one task per id)
//!     └─ Log events re-logged at their level
//! ```
//!
//! The loop is the only owner of the seen-id set. Correction tasks run
//! independently; their results reach the sink in completion order.

use std::sync::Arc;

use futures_util::{Stream, StreamExt};
use rakufeed_core::sink::{self, OutputSink, SinkStream};
use rakufeed_core::{ConcurrencyLimit, RetryError};
use rakufeed_nntp::{Article, Event};
use rustc_hash::FxHashSet;
use tokio::task::{JoinError, JoinHandle, JoinSet};
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::correction::Corrector;
use crate::distribution::Distribution;
use crate::fetcher::MetaSource;

/// Counters for one ingestion run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestStats {
    pub articles: usize,
    pub parse_errors: usize,
    pub non_raku: usize,
    pub duplicates: usize,
    pub dispatched: usize,
    pub emitted: usize,
    pub failed: usize,
    pub cancelled: usize,
}

impl IngestStats {
    pub fn log(&self) {
        log::info!(
            "ingest: {} articles ({} unparsable, {} not Raku, {} duplicates), {} dispatched: {} emitted, {} failed, {} cancelled",
            self.articles,
            self.parse_errors,
            self.non_raku,
            self.duplicates,
            self.dispatched,
            self.emitted,
            self.failed,
            self.cancelled
        );
    }

    fn record(&mut self, outcome: Result<Outcome, JoinError>) {
        match outcome {
            Ok(Outcome::Emitted) => self.emitted += 1,
            Ok(Outcome::Failed) => self.failed += 1,
            Ok(Outcome::Cancelled) => self.cancelled += 1,
            Err(e) => {
                log::error!("correction task panicked: {e}");
                self.failed += 1;
            }
        }
    }
}

/// How one correction task ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Emitted,
    Failed,
    Cancelled,
}

/// Start the ingestion loop on its own task, correcting against `source`
/// with the mirror, retry policy and limits from `config`.
///
/// Returns the output stream of corrected distributions and a handle that
/// resolves to the run's counters once the output stream has been closed.
pub fn spawn<E, S>(
    events: E,
    source: S,
    config: &Config,
    cancel: CancellationToken,
) -> (SinkStream<Distribution>, JoinHandle<IngestStats>)
where
    E: Stream<Item = Event> + Unpin + Send + 'static,
    S: MetaSource,
{
    let corrector = Arc::new(Corrector::new(source, config.policy, config.mirror.clone()));
    let (tx, rx) = sink::channel(config.sink_buffer);
    let limit = ConcurrencyLimit::new(config.max_concurrent);
    let handle = tokio::spawn(run(events, corrector, limit, tx, cancel));
    (rx, handle)
}

/// Consume `events` until the source ends or `cancel` fires.
///
/// On exit, waits for in-flight corrections (cancelled ones abort promptly)
/// and then drops `sink`, which ends the consumer's stream.
pub async fn run<E, S>(
    mut events: E,
    corrector: Arc<Corrector<S>>,
    limit: ConcurrencyLimit,
    sink: OutputSink<Distribution>,
    cancel: CancellationToken,
) -> IngestStats
where
    E: Stream<Item = Event> + Unpin,
    S: MetaSource,
{
    let mut stats = IngestStats::default();
    // never shared: only this loop reads or writes it
    let mut seen: FxHashSet<u64> = FxHashSet::default();
    let mut tasks: JoinSet<Outcome> = JoinSet::new();

    loop {
        let event = tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            Some(done) = tasks.join_next(), if !tasks.is_empty() => {
                stats.record(done);
                continue;
            }
            event = events.next() => match event {
                Some(event) => event,
                None => break,
            },
        };

        let article = match event {
            Event::Log(l) => {
                log::log!(log::Level::from(l.level), "{}", l.message);
                continue;
            }
            Event::Article(article) => article,
        };
        stats.articles += 1;

        let Some(dist) = accept(article, &mut seen, &mut stats) else {
            continue;
        };
        stats.dispatched += 1;
        tasks.spawn(correct_and_emit(
            dist,
            corrector.clone(),
            limit.clone(),
            sink.clone(),
            cancel.clone(),
        ));
    }

    if !tasks.is_empty() {
        log::info!("waiting for {} in-flight corrections", tasks.len());
    }
    while let Some(done) = tasks.join_next().await {
        stats.record(done);
    }
    drop(sink);
    stats.log();
    stats
}

/// Parse, filter and dedup one article; `Some` means dispatch a correction.
fn accept(
    article: Article,
    seen: &mut FxHashSet<u64>,
    stats: &mut IngestStats,
) -> Option<Distribution> {
    let id = article.id;
    let dist = match Distribution::parse(id, article.header.get("Subject")) {
        Ok(dist) => dist,
        Err(e) => {
            log::info!("{id} {e}");
            stats.parse_errors += 1;
            return None;
        }
    };

    log::info!("{id} {}", dist.as_json());
    if !dist.is_raku {
        stats.non_raku += 1;
        return None;
    }
    if !seen.insert(id) {
        log::info!("{id} Already seen {id}, skip");
        stats.duplicates += 1;
        return None;
    }
    Some(dist)
}

/// Body of one correction task: wait for a slot, correct, hand to the sink.
async fn correct_and_emit<S: MetaSource>(
    mut dist: Distribution,
    corrector: Arc<Corrector<S>>,
    limit: ConcurrencyLimit,
    sink: OutputSink<Distribution>,
    cancel: CancellationToken,
) -> Outcome {
    let id = dist.id;
    let permit = tokio::select! {
        biased;
        () = cancel.cancelled() => return Outcome::Cancelled,
        permit = limit.acquire() => permit,
    };

    let result = corrector.correct(&mut dist, &cancel).await;
    drop(permit);
    match result {
        Ok(()) => {}
        Err(RetryError::Cancelled) => {
            log::info!("{id} correction cancelled");
            return Outcome::Cancelled;
        }
        Err(e) => {
            log::warn!("{id} {e}");
            return Outcome::Failed;
        }
    }

    tokio::select! {
        biased;
        () = cancel.cancelled() => Outcome::Cancelled,
        sent = sink.send(dist) => match sent {
            Ok(()) => Outcome::Emitted,
            Err(_) => {
                log::warn!("{id} output closed, dropping corrected distribution");
                Outcome::Failed
            }
        },
    }
}
