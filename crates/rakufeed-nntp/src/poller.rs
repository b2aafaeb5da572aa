//! Feed poller: turns a newsgroup into a live stream of events

use rakufeed_core::sink::{self, OutputSink, SinkStream};
use tokio::net::TcpStream;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::client::{Client, NntpError};
use crate::config::Config;
use crate::event::{Article, Event, LogEvent, LogLevel};

/// Live stream of feed events; ends when the poller stops
pub type EventStream = SinkStream<Event>;

/// Start polling `config.group` on `config.addr`.
///
/// Every tick opens a fresh connection, emits one `Event::Article` per new
/// article and disconnects. The stream ends when `cancel` fires or the
/// consumer drops the stream. Must be called inside a tokio runtime.
pub fn stream(config: Config, cancel: CancellationToken) -> EventStream {
    let (tx, rx) = sink::channel(64);
    tokio::spawn(async move {
        Poller::new(config, tx).run(cancel).await;
    });
    rx
}

struct Poller {
    config: Config,
    tx: OutputSink<Event>,
    /// Last article number already emitted
    cursor: Option<u64>,
}

impl Poller {
    fn new(config: Config, tx: OutputSink<Event>) -> Self {
        Self {
            config,
            tx,
            cursor: None,
        }
    }

    async fn run(mut self, cancel: CancellationToken) {
        if self.config.tick.is_zero() || self.config.timeout.is_zero() {
            let message = format!(
                "refusing to poll {}: tick ({:?}) and timeout ({:?}) must be non-zero",
                self.config.addr, self.config.tick, self.config.timeout
            );
            log::error!("{message}");
            self.emit_log(LogLevel::Error, message).await;
            return;
        }

        let mut ticker = tokio::time::interval(self.config.tick);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        self.emit_log(
            LogLevel::Info,
            format!("following {} on {}", self.config.group, self.config.addr),
        )
        .await;

        loop {
            tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                _ = ticker.tick() => {}
            }

            let timeout = self.config.timeout;
            let outcome = tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                r = tokio::time::timeout(timeout, self.poll_once()) => r,
            };
            match outcome {
                Ok(Ok(0)) => {}
                Ok(Ok(n)) => self.emit_log(LogLevel::Debug, format!("{n} new articles")).await,
                Ok(Err(e)) => self.emit_log(LogLevel::Warn, format!("poll failed: {e}")).await,
                Err(_) => {
                    self.emit_log(
                        LogLevel::Warn,
                        format!("poll timed out after {}s", timeout.as_secs()),
                    )
                    .await;
                }
            }

            if self.tx.is_closed() {
                break;
            }
        }
        log::debug!("feed poller for {} stopped", self.config.group);
    }

    /// One connection: GROUP, then HEAD for each article after the cursor.
    ///
    /// The cursor advances only after an article reached the stream, so an
    /// interrupted poll resumes where it stopped.
    async fn poll_once(&mut self) -> Result<usize, NntpError> {
        let socket = TcpStream::connect(self.config.addr.as_str()).await?;
        let mut client = Client::handshake(socket).await?;
        let info = client.group(&self.config.group).await?;
        if info.count == 0 {
            client.quit().await;
            return Ok(0);
        }

        let cursor = match self.cursor {
            Some(c) if c <= info.last => c,
            Some(c) => {
                self.emit_log(
                    LogLevel::Warn,
                    format!("group high-water mark went back from {c} to {}", info.last),
                )
                .await;
                info.last
            }
            None => info.last.saturating_sub(self.config.backlog),
        };
        // numbers below `first` have expired from the server
        let cursor = cursor.max(info.first.saturating_sub(1));
        self.cursor = Some(cursor);

        let mut emitted = 0;
        for id in cursor + 1..=info.last {
            match client.head(id).await? {
                Some(header) => {
                    if self.tx.send(Event::Article(Article { id, header })).await.is_err() {
                        break;
                    }
                    emitted += 1;
                }
                None => {
                    self.emit_log(LogLevel::Debug, format!("article {id} not available"))
                        .await;
                }
            }
            self.cursor = Some(id);
        }
        client.quit().await;
        Ok(emitted)
    }

    async fn emit_log(&self, level: LogLevel, message: String) {
        if !self.config.subscribe_log {
            return;
        }
        // a closed stream is noticed by the poll loop
        let _ = self.tx.send(Event::Log(LogEvent { level, message })).await;
    }
}
