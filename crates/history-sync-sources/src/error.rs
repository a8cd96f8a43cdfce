use std::time::Duration;
use thiserror::Error;

/// Failure to obtain a history batch from the source.
///
/// Messages never contain the request URL, since it carries the API key.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("request failed: {0}")]
    Request(#[source] reqwest::Error),

    #[error("unexpected HTTP status {status}")]
    Status { status: u16 },

    #[error("malformed response: {0}")]
    Decode(String),

    #[error("API reported failure: {0}")]
    Api(String),

    #[error("invalid client configuration: {0}")]
    Config(String),
}

impl SourceError {
    /// Classify a transport error, stripping the URL before it is stored
    pub(crate) fn from_transport(err: reqwest::Error, timeout: Duration) -> Self {
        if err.is_timeout() {
            SourceError::Timeout(timeout)
        } else {
            SourceError::Request(err.without_url())
        }
    }
}
