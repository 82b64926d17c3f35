//! Forseti error types

/// Forseti error types
#[derive(Debug, thiserror::Error)]
pub enum ForsetiError {
    // Backend/network errors
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Backend signalled rate or size limiting.
    ///
    /// Engines absorb this into a partial fallback result; it only escapes
    /// when a backend is called outside an engine.
    #[error("quota exceeded: {message}")]
    QuotaExceeded { message: String },

    #[error("authentication failed")]
    AuthenticationFailed,

    // Data errors
    /// Raw backend output could not be repaired into valid structure.
    ///
    /// Carries bounded excerpts of both the raw reply and the cleaned text
    /// that reached the final parse attempt.
    #[error("could not decode backend reply: {detail} (raw: {raw_excerpt:?}, cleaned: {cleaned_excerpt:?})")]
    DecodeFailure {
        detail: String,
        raw_excerpt: String,
        cleaned_excerpt: String,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    // Configuration errors
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl ForsetiError {
    /// Stable machine-readable code for this error.
    ///
    /// Codes are part of the public contract and never change once shipped;
    /// callers may match on them instead of the display message.
    pub fn code(&self) -> &'static str {
        match self {
            ForsetiError::Http(_) => "HTTP_ERROR",
            ForsetiError::Api { .. } => "API_ERROR",
            ForsetiError::QuotaExceeded { .. } => "QUOTA_EXCEEDED",
            ForsetiError::AuthenticationFailed => "AUTH_FAILED",
            ForsetiError::DecodeFailure { .. } => "DECODE_FAILURE",
            ForsetiError::Json(_) => "JSON_ERROR",
            ForsetiError::InvalidInput(_) => "INVALID_INPUT",
            ForsetiError::Configuration(_) => "CONFIGURATION_ERROR",
        }
    }

    /// Whether this error is a rate/quota condition the engine should
    /// degrade on rather than propagate.
    pub fn is_quota(&self) -> bool {
        matches!(self, ForsetiError::QuotaExceeded { .. })
    }
}

impl From<reqwest::Error> for ForsetiError {
    fn from(err: reqwest::Error) -> Self {
        if err.status().map(|s| s.as_u16()) == Some(429) {
            ForsetiError::QuotaExceeded {
                message: err.to_string(),
            }
        } else {
            ForsetiError::Http(err.to_string())
        }
    }
}

/// Result type alias for Forseti operations
pub type Result<T> = std::result::Result<T, ForsetiError>;
