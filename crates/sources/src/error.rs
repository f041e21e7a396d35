use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("http error: {0}")]
    HttpError(#[from] reqwest::Error),
    #[error("json error: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("unauthorized (status {status})")]
    Unauthorized { status: u16 },
    #[error("rate limited")]
    RateLimited { retry_after: Option<Duration> },
    #[error("unexpected status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("missing token for {0}")]
    MissingToken(&'static str),
    #[error("graphql error: {0}")]
    GraphqlError(String),
    #[error("invalid response: {0}")]
    InvalidResponse(String),
    #[error("invalid url: {0}")]
    InvalidUrl(String),
}

impl SourceError {
    /// Whether repeating the same request later may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::HttpError(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            Self::RateLimited { .. } => true,
            Self::Status { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Whether the failure comes from missing or rejected credentials.
    pub fn is_auth(&self) -> bool {
        matches!(self, Self::Unauthorized { .. } | Self::MissingToken(_))
    }
}
