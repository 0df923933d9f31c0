//! Error types for the FormAgent domain.
//!
//! Uses `thiserror` for ergonomic error definitions. Every variant of
//! [`Error`] maps to one user-visible error kind, see [`Error::kind`].

use thiserror::Error;

/// Maximum number of characters of a raw model response shown in messages.
pub const RAW_EXCERPT_CHARS: usize = 240;

/// The top-level error type for all FormAgent operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Input validation ---
    #[error("Document text is empty")]
    EmptyDocument,

    #[error("Question is empty")]
    EmptyQuestion,

    #[error("Invalid summary style '{0}' (expected 'concise' or 'detailed')")]
    InvalidStyle(String),

    #[error("Analysis requires at least one document")]
    InsufficientDocuments,

    // --- Prompt construction ---
    #[error("Prompt of {size} chars exceeds the configured budget of {budget} chars")]
    PromptTooLarge { size: usize, budget: usize },

    // --- Reasoning service ---
    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Model unavailable after {attempts} attempt(s): {last_error}")]
    ModelUnavailable { attempts: u32, last_error: String },

    #[error("Request rejected by provider: {0}")]
    InvalidRequest(String),

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Deadline of {}s exceeded after {attempts} attempt(s)", .budget.as_secs_f64())]
    DeadlineExceeded {
        budget: std::time::Duration,
        attempts: u32,
    },

    #[error("Malformed model response: {reason}; raw response: {}", excerpt(.raw, RAW_EXCERPT_CHARS))]
    MalformedResponse { reason: String, raw: String },

    // --- Document loading ---
    #[error("Unsupported document format '{format}' for {source_name}")]
    UnsupportedFormat { source_name: String, format: String },

    #[error("Document source not found: {0}")]
    SourceNotFound(String),

    // --- Configuration ---
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// The stable kind name printed by the command surface.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::EmptyDocument => "EmptyDocumentError",
            Error::EmptyQuestion => "EmptyQuestionError",
            Error::InvalidStyle(_) => "InvalidStyleError",
            Error::InsufficientDocuments => "InsufficientDocumentsError",
            Error::PromptTooLarge { .. } => "PromptTooLargeError",
            Error::Authentication(_) => "AuthenticationError",
            Error::ModelUnavailable { .. } => "ModelUnavailableError",
            Error::InvalidRequest(_) => "InvalidRequestError",
            Error::Cancelled => "CancelledError",
            Error::DeadlineExceeded { .. } => "DeadlineExceededError",
            Error::MalformedResponse { .. } => "MalformedResponseError",
            Error::UnsupportedFormat { .. } => "UnsupportedFormatError",
            Error::SourceNotFound(_) => "SourceNotFoundError",
            Error::Config(_) => "ConfigurationError",
            Error::Io(_) => "IoError",
            Error::Serialization(_) => "SerializationError",
        }
    }

    /// Build a [`Error::MalformedResponse`] keeping the full raw text.
    pub fn malformed(reason: impl Into<String>, raw: &str) -> Self {
        Error::MalformedResponse {
            reason: reason.into(),
            raw: raw.to_string(),
        }
    }
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

/// Transport-level failures reported by a [`crate::Provider`].
///
/// The model client decides which of these are worth another attempt.
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),
}

impl ProviderError {
    /// Whether another attempt may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            ProviderError::RateLimited { .. }
            | ProviderError::Timeout(_)
            | ProviderError::Network(_) => true,
            ProviderError::ApiError { status_code, .. } => *status_code >= 500,
            ProviderError::AuthenticationFailed(_) | ProviderError::NotConfigured(_) => false,
        }
    }
}

/// Shorten `text` to at most `max_chars` characters, marking the cut.
pub fn excerpt(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}…", &text[..idx]),
        None => text.to_string(),
    }
}
