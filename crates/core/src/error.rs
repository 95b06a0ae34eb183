//! Error types for the Leadbot domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error enum.

use thiserror::Error;

/// The top-level error type for Leadbot operations.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("Tool error: {0}")]
    Tool(#[from] ToolError),

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

/// Substrings that mark a backend failure as a capacity problem.
const CAPACITY_MARKERS: &[&str] = &[
    "rate limit",
    "quota",
    "capacity",
    "too many requests",
    "429",
];

#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Model not found: {0}")]
    ModelNotFound(String),

    #[error("Response contained no choices (model: {0})")]
    EmptyResponse(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),
}

impl ProviderError {
    /// Whether this failure is a capacity problem that switching models may fix.
    ///
    /// Rate limits always qualify. Other variants qualify when their rendered
    /// message mentions a rate limit, quota, capacity or HTTP 429.
    pub fn is_capacity(&self) -> bool {
        if matches!(self, ProviderError::RateLimited { .. }) {
            return true;
        }
        let text = self.to_string().to_lowercase();
        CAPACITY_MARKERS.iter().any(|m| text.contains(m))
    }
}

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Tool not found: {0}")]
    NotFound(String),

    #[error("Tool already registered: {0}")]
    Duplicate(String),

    #[error("Tool execution failed: {tool_name}: {reason}")]
    ExecutionFailed { tool_name: String, reason: String },

    #[error("Invalid tool arguments: {0}")]
    InvalidArguments(String),
}
