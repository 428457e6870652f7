//! Routing oracle error types.

/// Errors from the routing oracle.
#[derive(Debug, thiserror::Error)]
pub enum OracleError {
    /// HTTP request failed (network error, timeout, etc.)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Response body could not be decoded
    #[error("JSON parse error: {message}{}", body.as_ref().map(|b| format!(" (body: {b})")).unwrap_or_default())]
    Json {
        message: String,
        body: Option<String>,
    },

    /// Oracle returned an error status code
    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    /// Rate limited by the oracle
    #[error("rate limited by routing oracle")]
    RateLimited,

    /// Oracle answered but found no route between the points
    #[error("no route: {0}")]
    NoRoute(String),

    /// A route needs at least two points
    #[error("need at least two waypoints, got {0}")]
    TooFewWaypoints(usize),

    /// The concurrency limiter was shut down
    #[error("request limiter closed")]
    LimiterClosed,
}

impl OracleError {
    /// Whether retrying the same request might succeed.
    ///
    /// A missing route or a malformed request is a definitive answer.
    pub fn is_retryable(&self) -> bool {
        !matches!(
            self,
            OracleError::NoRoute(_) | OracleError::TooFewWaypoints(_) | OracleError::LimiterClosed
        )
    }
}
