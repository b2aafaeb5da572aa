//! Output sink: many producer tasks, one consumer stream

use std::pin::Pin;
use std::task::{Context, Poll};

use futures_util::Stream;
use tokio::sync::mpsc;

/// Create a sink with room for `buffer` undelivered items (minimum 1).
///
/// The stream ends once every [`OutputSink`] clone has been dropped.
pub fn channel<T>(buffer: usize) -> (OutputSink<T>, SinkStream<T>) {
    let (tx, rx) = mpsc::channel(buffer.max(1));
    (OutputSink { tx }, SinkStream { rx })
}

/// Producer handle, cloned into each task that may emit an item
#[derive(Debug)]
pub struct OutputSink<T> {
    tx: mpsc::Sender<T>,
}

impl<T> Clone for OutputSink<T> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
        }
    }
}

impl<T> OutputSink<T> {
    /// Hand one item to the consumer, waiting while the buffer is full.
    ///
    /// Returns the item back if the consumer has gone away.
    pub async fn send(&self, item: T) -> Result<(), T> {
        self.tx.send(item).await.map_err(|e| e.0)
    }

    /// True once the consumer dropped its stream
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Consumer side: a live stream of emitted items
#[derive(Debug)]
pub struct SinkStream<T> {
    rx: mpsc::Receiver<T>,
}

impl<T> Stream for SinkStream<T> {
    type Item = T;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<T>> {
        self.rx.poll_recv(cx)
    }
}

#[cfg(test)]
mod tests {
    use futures_util::StreamExt;

    use super::*;

    #[tokio::test]
    async fn many_producers_one_consumer() {
        let (sink, stream) = channel(1);
        for i in 0..10 {
            let sink = sink.clone();
            tokio::spawn(async move {
                sink.send(i).await.unwrap();
            });
        }
        drop(sink);

        let mut items: Vec<i32> = stream.collect().await;
        items.sort_unstable();
        assert_eq!(items, (0..10).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn end_of_stream_after_last_sender() {
        let (sink, mut stream) = channel::<u8>(4);
        let other = sink.clone();
        drop(sink);
        other.send(7).await.unwrap();
        drop(other);
        assert_eq!(stream.next().await, Some(7));
        assert_eq!(stream.next().await, None);
    }

    #[tokio::test]
    async fn send_after_consumer_dropped() {
        let (sink, stream) = channel(1);
        drop(stream);
        assert!(sink.is_closed());
        assert_eq!(sink.send("lost").await, Err("lost"));
    }
}
