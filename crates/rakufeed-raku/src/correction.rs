//! Main-module correction against the distribution's META file

use rakufeed_core::{FetchError, RetryError, RetryPolicy, retry_with_backoff};
use tokio_util::sync::CancellationToken;

use crate::distribution::Distribution;
use crate::fetcher::MetaSource;

/// Why a distribution could not be corrected
pub type CorrectionError = RetryError<FetchError>;

/// Resolves guessed main-module names against authoritative META files.
#[derive(Debug)]
pub struct Corrector<S> {
    source: S,
    policy: RetryPolicy,
    mirror: String,
}

impl<S: MetaSource> Corrector<S> {
    pub fn new(source: S, policy: RetryPolicy, mirror: impl Into<String>) -> Self {
        Self {
            source,
            policy,
            mirror: mirror.into(),
        }
    }

    /// Replace `dist.main_module` with the META `name`, retrying while the
    /// META file is not yet available.
    ///
    /// `dist` is left untouched on error.
    pub async fn correct(
        &self,
        dist: &mut Distribution,
        cancel: &CancellationToken,
    ) -> Result<(), CorrectionError> {
        let url = dist.meta_url(&self.mirror);
        let label = dist.id.to_string();
        let name = retry_with_backoff(&label, &self.policy, cancel, |_| {
            self.source.fetch_name(&url)
        })
        .await?;

        if dist.main_module == name {
            log::info!(
                "{} guessed main module {} matches name in META file",
                dist.id,
                dist.main_module
            );
        } else {
            log::info!(
                "{} guessed main module {} does NOT match name ({name}) in META file, use the name in META file",
                dist.id,
                dist.main_module
            );
            dist.main_module = name;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::future::Future;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    use tokio::time::Instant;

    use super::*;

    /// Replays scripted results; repeats the last one when the script runs out.
    struct Scripted {
        script: Mutex<VecDeque<Result<String, FetchError>>>,
        calls: AtomicU32,
        urls: Mutex<Vec<String>>,
    }

    impl Scripted {
        fn new(script: Vec<Result<String, FetchError>>) -> Self {
            Self {
                script: Mutex::new(script.into()),
                calls: AtomicU32::new(0),
                urls: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::Relaxed)
        }
    }

    fn replay(result: &Result<String, FetchError>) -> Result<String, FetchError> {
        match result {
            Ok(name) => Ok(name.clone()),
            Err(FetchError::NotFound { url }) => Err(FetchError::NotFound { url: url.clone() }),
            Err(FetchError::Timeout) => Err(FetchError::Timeout),
            Err(FetchError::Status { status, url }) => Err(FetchError::Status {
                status: *status,
                url: url.clone(),
            }),
            Err(FetchError::Request(m)) => Err(FetchError::Request(m.clone())),
            Err(FetchError::Body(m)) => Err(FetchError::Body(m.clone())),
            Err(FetchError::MissingName) => Err(FetchError::MissingName),
        }
    }

    impl MetaSource for Scripted {
        fn fetch_name(
            &self,
            meta_url: &str,
        ) -> impl Future<Output = Result<String, FetchError>> + Send {
            self.calls.fetch_add(1, Ordering::Relaxed);
            self.urls.lock().unwrap().push(meta_url.to_string());
            let mut script = self.script.lock().unwrap();
            let result = if script.len() > 1 {
                script.pop_front().unwrap()
            } else {
                replay(script.front().unwrap())
            };
            std::future::ready(result)
        }
    }

    fn not_found() -> Result<String, FetchError> {
        Err(FetchError::NotFound {
            url: "u".to_string(),
        })
    }

    fn foo_bar() -> Distribution {
        Distribution::parse(1001, "CPAN Upload: S/SK/SKAJI/Perl6/Foo-Bar-0.0.1.tar.gz").unwrap()
    }

    fn corrector(script: Vec<Result<String, FetchError>>) -> Corrector<Scripted> {
        Corrector::new(
            Scripted::new(script),
            RetryPolicy::default(),
            "https://www.cpan.org",
        )
    }

    #[tokio::test(start_paused = true)]
    async fn matching_name_keeps_guess() {
        let c = corrector(vec![Ok("Foo::Bar".to_string())]);
        let mut dist = foo_bar();
        c.correct(&mut dist, &CancellationToken::new()).await.unwrap();
        assert_eq!(dist.main_module, "Foo::Bar");
        assert_eq!(dist, foo_bar());
        assert_eq!(c.source.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn differing_name_overwrites_guess() {
        let c = corrector(vec![Ok("Foo-Bar".to_string())]);
        let mut dist = foo_bar();
        c.correct(&mut dist, &CancellationToken::new()).await.unwrap();
        assert_eq!(dist.main_module, "Foo-Bar");
        assert_eq!(
            c.source.urls.lock().unwrap().as_slice(),
            ["https://www.cpan.org/authors/id/S/SK/SKAJI/Perl6/Foo-Bar-0.0.1.meta"]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn not_found_then_found() {
        let c = corrector(vec![not_found(), not_found(), Ok("Foo::Bar::Baz".to_string())]);
        let mut dist = foo_bar();
        let start = Instant::now();
        c.correct(&mut dist, &CancellationToken::new()).await.unwrap();
        assert_eq!(dist.main_module, "Foo::Bar::Baz");
        assert_eq!(c.source.calls(), 3);
        assert!(start.elapsed() >= Duration::from_secs(60));
    }

    #[tokio::test(start_paused = true)]
    async fn always_retryable_gives_up_after_20() {
        let c = corrector(vec![not_found()]);
        let mut dist = foo_bar();
        let err = c
            .correct(&mut dist, &CancellationToken::new())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "too many retries, give up");
        assert_eq!(c.source.calls(), 20);
        assert_eq!(dist, foo_bar());
    }

    #[tokio::test(start_paused = true)]
    async fn fatal_first_attempt_no_retry() {
        let c = corrector(vec![Err(FetchError::Status {
            status: 500,
            url: "u".to_string(),
        })]);
        let mut dist = foo_bar();
        let start = Instant::now();
        let err = c
            .correct(&mut dist, &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            RetryError::Fatal(FetchError::Status { status: 500, .. })
        ));
        assert_eq!(c.source.calls(), 1);
        assert!(start.elapsed() < Duration::from_secs(1));
    }
}
