//! Errors surfaced by the proxy and their HTTP mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// Failures that end a single proxied request.
///
/// None of these affect the process or the cache; every variant maps to a
/// terminal response for the one request that hit it.
#[derive(Debug, Error)]
pub enum ProxyError {
    /// The inbound request cannot be turned into an upstream request.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Connect, DNS, TLS or timeout failure toward the upstream.
    #[error("Upstream unavailable: {0}")]
    UpstreamUnavailable(#[source] reqwest::Error),

    /// The inbound request body could not be read, or exceeded the limit.
    #[error("Failed to read request body: {0}")]
    RequestBody(#[source] axum::Error),

    /// The upstream body could not be read in full.
    #[error("Failed to read upstream body: {0}")]
    BodyRead(#[source] reqwest::Error),

    /// The upstream body exceeded the configured buffering limit.
    #[error("Upstream body exceeds {limit} bytes")]
    BodyTooLarge { limit: usize },

    /// The HTML body could not be rewritten.
    #[error("Failed to rewrite markup: {0}")]
    Parse(#[from] lol_html::errors::RewritingError),

    /// The upstream HTTP client could not be constructed.
    #[error("Failed to build upstream client: {0}")]
    Client(#[source] reqwest::Error),
}

/// Result type for proxy operations.
pub type ProxyResult<T> = Result<T, ProxyError>;

impl ProxyError {
    /// HTTP status returned to the client.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ProxyError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ProxyError::UpstreamUnavailable(_) => StatusCode::BAD_GATEWAY,
            ProxyError::RequestBody(_)
            | ProxyError::BodyRead(_)
            | ProxyError::BodyTooLarge { .. }
            | ProxyError::Parse(_)
            | ProxyError::Client(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Short label used for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            ProxyError::BadRequest(_) => "bad_request",
            ProxyError::UpstreamUnavailable(e) if e.is_timeout() => "upstream_timeout",
            ProxyError::UpstreamUnavailable(_) => "upstream_unavailable",
            ProxyError::RequestBody(_) | ProxyError::BodyRead(_) | ProxyError::BodyTooLarge { .. } => "body_read",
            ProxyError::Parse(_) => "parse",
            ProxyError::Client(_) => "client",
        }
    }

    /// Body sent to the client. Internal details stay in the logs.
    fn client_message(&self) -> &'static str {
        match self {
            ProxyError::BadRequest(_) => "Bad request",
            ProxyError::UpstreamUnavailable(_) => "Error fetching the requested page",
            ProxyError::RequestBody(_) => "Error reading request body",
            ProxyError::BodyRead(_) | ProxyError::BodyTooLarge { .. } => "Error reading response body",
            ProxyError::Parse(_) => "Error rewriting HTML",
            ProxyError::Client(_) => "Internal server error",
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        (self.status_code(), self.client_message()).into_response()
    }
}
