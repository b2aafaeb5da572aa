//! Counting limit on concurrent correction fetches.
//!
//! Wraps `tokio::sync::Semaphore`; a limit of 0 means unbounded.

use std::sync::Arc;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Cloneable handle limiting how many holders run at once.
#[derive(Debug, Clone)]
pub struct ConcurrencyLimit {
    inner: Option<Arc<Semaphore>>,
}

impl ConcurrencyLimit {
    /// Create a limit with `permits` slots (0 = unbounded).
    pub fn new(permits: usize) -> Self {
        Self {
            inner: (permits > 0).then(|| Arc::new(Semaphore::new(permits))),
        }
    }

    /// Wait for a slot. The slot is released when the returned guard drops.
    pub async fn acquire(&self) -> Option<OwnedSemaphorePermit> {
        match &self.inner {
            // never closed, so acquire only fails if that invariant breaks
            Some(sem) => sem.clone().acquire_owned().await.ok(),
            None => None,
        }
    }

    /// Free slots, `None` when unbounded
    #[cfg(test)]
    fn available(&self) -> Option<usize> {
        self.inner.as_ref().map(|sem| sem.available_permits())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn acquire_and_release() {
        let limit = ConcurrencyLimit::new(2);
        let g1 = limit.acquire().await;
        let _g2 = limit.acquire().await;
        assert_eq!(limit.available(), Some(0));
        drop(g1);
        assert_eq!(limit.available(), Some(1));
    }

    #[tokio::test]
    async fn unbounded_never_waits() {
        let limit = ConcurrencyLimit::new(0);
        assert!(limit.available().is_none());
        for _ in 0..1000 {
            assert!(limit.acquire().await.is_none());
        }
    }

    #[tokio::test(start_paused = true)]
    async fn blocking_acquire() {
        let limit = ConcurrencyLimit::new(1);
        let guard = limit.acquire().await;

        let limit2 = limit.clone();
        let handle = tokio::spawn(async move {
            let _g = limit2.acquire().await;
            42
        });

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!handle.is_finished());
        drop(guard);

        assert_eq!(handle.await.unwrap(), 42);
    }
}
