use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::Json;
use serde_json::json;
use serde_json::Value;
use thiserror::Error;

/// Failure of a single outbound call, after retries where they apply.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("request timed out")]
    Timeout,

    #[error("upstream returned HTTP {0}")]
    Status(StatusCode),

    #[error("unexpected upstream shape: {0}")]
    Shape(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            FetchError::Timeout
        } else if error.is_decode() {
            FetchError::Shape(error.to_string())
        } else {
            FetchError::Transport(error.to_string())
        }
    }
}

impl From<serde_json::Error> for FetchError {
    fn from(error: serde_json::Error) -> Self {
        FetchError::Shape(error.to_string())
    }
}

/// A source adapter's failure, tagged with the provider it came from.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("{provider}: {source}")]
    Fetch {
        provider: &'static str,
        #[source]
        source: FetchError,
    },

    #[error("{provider}: not configured (missing API key)")]
    Unconfigured { provider: &'static str },
}

impl SourceError {
    pub fn fetch(provider: &'static str, source: FetchError) -> Self {
        SourceError::Fetch { provider, source }
    }

    pub fn shape(provider: &'static str, message: impl Into<String>) -> Self {
        SourceError::Fetch {
            provider,
            source: FetchError::Shape(message.into()),
        }
    }

    pub fn provider(&self) -> &'static str {
        match self {
            SourceError::Fetch { provider, .. } | SourceError::Unconfigured { provider } => {
                provider
            }
        }
    }
}

/// Raised only when every contributing source failed and nothing is cached.
#[derive(Debug, Error)]
#[error("aggregation failed for {key}: {reason}")]
pub struct AggregationError {
    pub key: String,
    pub reason: String,
}

#[derive(Debug)]
pub struct Error {
    pub code: StatusCode,
    pub body: Json<Value>,
}

impl Error {
    pub fn new(code: StatusCode, message: &str) -> Self {
        Self {
            code,
            body: Json(json!({"error": message})),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        (self.code, self.body).into_response()
    }
}

impl From<AggregationError> for Error {
    fn from(error: AggregationError) -> Self {
        tracing::error!(key = %error.key, "{}", error.reason);
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Failed to fetch upstream data")
    }
}
