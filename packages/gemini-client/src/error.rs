//! Error types for the Gemini client.

use thiserror::Error;

/// Result type for Gemini client operations.
pub type Result<T> = std::result::Result<T, GeminiError>;

/// Gemini client errors.
#[derive(Debug, Error)]
pub enum GeminiError {
    /// Configuration error (missing API key, invalid settings)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Network error (connection failed, timeout)
    #[error("Network error: {0}")]
    Network(String),

    /// API error (non-2xx response)
    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    /// Quota or billing limit reached on the upstream account
    #[error("Quota exceeded: {0}")]
    QuotaExceeded(String),

    /// Parse error (invalid JSON, unexpected response format)
    #[error("Parse error: {0}")]
    Parse(String),
}

impl GeminiError {
    /// Whether a retry could plausibly succeed.
    ///
    /// Server-side failures and transport errors are retriable; client
    /// errors, quota exhaustion, and parse failures are not.
    pub fn is_retriable(&self) -> bool {
        match self {
            GeminiError::Network(_) => true,
            GeminiError::Api { status, .. } => *status >= 500,
            _ => false,
        }
    }
}
