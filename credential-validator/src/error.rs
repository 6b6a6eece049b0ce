//! Error types for credential validation

use serde::Serialize;
use thiserror::Error;

/// Errors raised while building a validator. Stage failures are never
/// reported through this type; see [`ProbeError`].
#[derive(Error, Debug)]
pub enum ValidatorError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("HTTP client error: {0}")]
    HttpClient(String),
}

impl From<reqwest::Error> for ValidatorError {
    fn from(err: reqwest::Error) -> Self {
        ValidatorError::HttpClient(err.to_string())
    }
}

/// Why a stage failed
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProbeError {
    #[error("No API key found. Please set OPENAI_API_KEY in your environment or .env file.")]
    MissingCredential,

    #[error("Invalid API key format. Keys should start with '{prefix}'.")]
    InvalidPrefix { prefix: String },

    #[error("API key seems too short ({length} characters, expected at least {minimum}).")]
    TooShort { length: usize, minimum: usize },

    #[error("Authentication failed. Please check your API key.")]
    AuthenticationFailed,

    #[error("Access forbidden. Your API key may not have the required permissions.")]
    Forbidden,

    #[error("Unexpected response: {code} - {body}")]
    UnexpectedStatus { code: u16, body: String },

    #[error("Connection timeout. Please check your internet connection.")]
    Timeout,

    #[error("Connection failed: {message}")]
    ConnectionError { message: String },

    #[error("Unexpected error during connectivity test: {message}")]
    UnknownTransportError { message: String },

    #[error("Neither model '{requested}' nor fallback model '{fallback}' is available.")]
    ModelUnavailable { requested: String, fallback: String },

    #[error("Error checking model availability: {message}")]
    LookupError { message: String },

    #[error("Completion test failed - no response received.")]
    EmptyResponse,

    #[error("Rate limit exceeded. Please wait a moment and try again.")]
    RateLimited,

    #[error("API error during completion test: {message}")]
    ProviderError { message: String },

    #[error("Unexpected error during completion test: {message}")]
    UnknownError { message: String },
}

impl ProbeError {
    /// Stable machine-readable code
    pub fn kind(&self) -> &'static str {
        match self {
            ProbeError::MissingCredential => "missing_credential",
            ProbeError::InvalidPrefix { .. } => "invalid_prefix",
            ProbeError::TooShort { .. } => "too_short",
            ProbeError::AuthenticationFailed => "authentication_failed",
            ProbeError::Forbidden => "forbidden",
            ProbeError::UnexpectedStatus { .. } => "unexpected_status",
            ProbeError::Timeout => "timeout",
            ProbeError::ConnectionError { .. } => "connection_error",
            ProbeError::UnknownTransportError { .. } => "unknown_transport_error",
            ProbeError::ModelUnavailable { .. } => "model_unavailable",
            ProbeError::LookupError { .. } => "lookup_error",
            ProbeError::EmptyResponse => "empty_response",
            ProbeError::RateLimited => "rate_limited",
            ProbeError::ProviderError { .. } => "provider_error",
            ProbeError::UnknownError { .. } => "unknown_error",
        }
    }
}
