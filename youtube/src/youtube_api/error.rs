//! Failures of individual Data API calls.

use http::StatusCode;
use thiserror::Error;

/// A single remote call failed.
///
/// These are transient from the pipeline's point of view: the caller decides whether to retry
/// the page, fall back to another strategy, or give up.
#[derive(Debug, Error)]
pub enum RemoteError {
    /// The request never produced a response (DNS, TLS, connection reset, timeout, ...).
    #[error("send request to {url}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    /// The API answered with a non-success status.
    #[error("YouTube API request failed with status {status}: {body}")]
    Status { status: StatusCode, body: String },
    /// The API answered, but not with the JSON shape we expected.
    #[error("parse YouTube API response as JSON")]
    Decode(#[from] serde_json::Error),
}

impl RemoteError {
    /// Whether the API rejected the call because the key's daily quota is used up.
    pub fn is_quota_exceeded(&self) -> bool {
        matches!(
            self,
            RemoteError::Status { status, body }
                if *status == StatusCode::FORBIDDEN && body.contains("quotaExceeded")
        )
    }

    /// Whether the API reported the requested resource as missing.
    pub fn is_not_found(&self) -> bool {
        matches!(self, RemoteError::Status { status, .. } if *status == StatusCode::NOT_FOUND)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quota_exhaustion_is_recognised() {
        let quota = RemoteError::Status {
            status: StatusCode::FORBIDDEN,
            body: r#"{"error":{"code":403,"errors":[{"reason":"quotaExceeded"}]}}"#.to_string(),
        };
        assert!(quota.is_quota_exceeded());
        assert!(!quota.is_not_found());

        let forbidden = RemoteError::Status {
            status: StatusCode::FORBIDDEN,
            body: r#"{"error":{"code":403,"errors":[{"reason":"forbidden"}]}}"#.to_string(),
        };
        assert!(!forbidden.is_quota_exceeded());

        let missing = RemoteError::Status {
            status: StatusCode::NOT_FOUND,
            body: "playlistNotFound".to_string(),
        };
        assert!(missing.is_not_found());
    }
}
