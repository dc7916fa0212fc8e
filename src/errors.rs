use thiserror::Error;

/// Crate-wide error type.
/// All variants carry a human-readable message; the state containers only ever
/// see the rendered `Display` string.
#[derive(Debug, Error)]
pub enum AppError {
    // ── Gateway errors ───────────────────────────────────────────────────────
    #[error("Network error calling {endpoint}: {source}")]
    Network {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("HTTP error! status: {status} ({endpoint})")]
    HttpStatus { endpoint: String, status: u16 },

    #[error("Parse error in response from {endpoint}: {source}")]
    MalformedBody {
        endpoint: String,
        #[source]
        source: serde_json::Error,
    },

    // ── Validation errors ────────────────────────────────────────────────────
    #[error("Invalid history date '{date}', expected YYYY-MM-DD")]
    InvalidDate { date: String },

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidConfig { key: String, message: String },

    // ── Conversation errors ──────────────────────────────────────────────────
    #[error("Placeholder '{id}' not found in conversation log")]
    PlaceholderNotFound { id: String },

    #[error("A request is already in flight")]
    RequestInFlight,
}

impl AppError {
    pub fn network(endpoint: impl Into<String>, source: reqwest::Error) -> Self {
        AppError::Network { endpoint: endpoint.into(), source }
    }

    pub fn malformed(endpoint: impl Into<String>, source: serde_json::Error) -> Self {
        AppError::MalformedBody { endpoint: endpoint.into(), source }
    }

    pub fn invalid_config(key: impl Into<String>, message: impl Into<String>) -> Self {
        AppError::InvalidConfig { key: key.into(), message: message.into() }
    }

    /// Failures that came back from (or never reached) the remote service.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            AppError::Network { .. } | AppError::HttpStatus { .. } | AppError::MalformedBody { .. }
        )
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, AppError::InvalidDate { .. } | AppError::InvalidConfig { .. })
    }

    pub fn is_in_flight(&self) -> bool {
        matches!(self, AppError::RequestInFlight)
    }
}
