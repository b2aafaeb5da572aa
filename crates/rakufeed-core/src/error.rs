//! Classified error for a single metadata fetch

use tokio::time::error::Elapsed;

use crate::retry::Retryable;

/// Error from one HTTP GET against a META endpoint.
///
/// `Timeout` and `NotFound` are retryable (META files show up on the mirror
/// some time after the upload announcement). Everything else is fatal.
#[derive(Debug)]
pub enum FetchError {
    /// Request did not complete in time
    Timeout,
    /// HTTP 404
    NotFound { url: String },
    /// Any status other than 200 / 404
    Status { status: u16, url: String },
    /// Request could not be built or sent
    Request(String),
    /// Body is not the expected JSON object
    Body(String),
    /// `name` field absent or empty
    MissingName,
}

impl std::fmt::Display for FetchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Timeout => f.write_str("request timed out"),
            Self::NotFound { url } => write!(f, "404 Not Found, {url}"),
            Self::Status { status, url } => write!(f, "HTTP {status}, {url}"),
            Self::Request(message) => write!(f, "request failed: {message}"),
            Self::Body(message) => write!(f, "invalid meta: {message}"),
            Self::MissingName => {
                f.write_str("cannot find suitable module name from 'name' in meta")
            }
        }
    }
}

impl std::error::Error for FetchError {}

impl FetchError {
    /// Create from reqwest error (transport level, no response)
    pub fn from_reqwest(e: &reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout
        } else {
            Self::Request(e.to_string())
        }
    }
}

impl Retryable for FetchError {
    fn is_retryable(&self) -> bool {
        matches!(self, Self::Timeout | Self::NotFound { .. })
    }
}

impl From<Elapsed> for FetchError {
    fn from(_: Elapsed) -> Self {
        Self::Timeout
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_err(status: u16) -> FetchError {
        FetchError::Status {
            status,
            url: "https://example.com/x.meta".to_string(),
        }
    }

    #[test]
    fn timeout_retryable() {
        assert!(FetchError::Timeout.is_retryable());
    }

    #[test]
    fn not_found_retryable() {
        let err = FetchError::NotFound {
            url: "https://example.com/x.meta".to_string(),
        };
        assert!(err.is_retryable());
    }

    #[test]
    fn other_status_not_retryable() {
        assert!(!status_err(500).is_retryable());
        assert!(!status_err(403).is_retryable());
        assert!(!status_err(429).is_retryable());
    }

    #[test]
    fn body_and_missing_name_not_retryable() {
        assert!(!FetchError::Body("expected value".to_string()).is_retryable());
        assert!(!FetchError::MissingName.is_retryable());
        assert!(!FetchError::Request("bad url".to_string()).is_retryable());
    }

    #[test]
    fn display_status_includes_url() {
        let msg = format!("{}", status_err(503));
        assert_eq!(msg, "HTTP 503, https://example.com/x.meta");
    }

    #[test]
    fn display_missing_name() {
        assert_eq!(
            FetchError::MissingName.to_string(),
            "cannot find suitable module name from 'name' in meta"
        );
    }

    #[tokio::test]
    async fn elapsed_converts_to_timeout() {
        let elapsed = tokio::time::timeout(
            std::time::Duration::from_millis(1),
            std::future::pending::<()>(),
        )
        .await
        .unwrap_err();
        let err = FetchError::from(elapsed);
        assert!(matches!(err, FetchError::Timeout));
        assert!(err.is_retryable());
    }
}
