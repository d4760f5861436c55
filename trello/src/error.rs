use connector_core::CoreError;
use thiserror::Error;

pub type TrelloResult<T> = Result<T, TrelloError>;

#[derive(Debug, Error)]
pub enum TrelloError {
    #[error("Invalid request URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Trello API error: {status} - {message}")]
    ApiError { status: u16, message: String },

    #[error("Rate limited: retry after {retry_after_seconds}s")]
    RateLimited { retry_after_seconds: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationError(String),

    #[error("Failed to decode response: {0}")]
    DecodeError(#[from] serde_json::Error),

    #[error("Invalid {header} header: {value}")]
    InvalidHeader { header: String, value: String },

    #[error("Invalid rate limit header {header}: {value}")]
    RateLimitParseError { header: String, value: String },

    #[error("{kind} not found: {id}")]
    NotFound { kind: String, id: String },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Request cancelled")]
    Cancelled,

    #[error("Invalid resource: {0}")]
    ResourceError(#[from] CoreError)
}

impl TrelloError {
    pub fn not_found(kind: &str, id: &str) -> Self {
        Self::NotFound {
            kind: kind.to_string(),
            id: id.to_string()
        }
    }

    pub fn is_retryable(&self) -> bool {
        match self {
            Self::HttpError(_) | Self::RateLimited { .. } => true,
            Self::ApiError { status, .. } => *status >= 500,
            _ => false
        }
    }

    pub fn retry_after(&self) -> Option<u64> {
        if let Self::RateLimited {
            retry_after_seconds
        } = self
        {
            Some(*retry_after_seconds)
        } else {
            None
        }
    }
}
