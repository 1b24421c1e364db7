//! Error types for the pipeline runner
//!
//! Messages are meant to be read straight off the console, so each one
//! names the offending value and, where useful, how to fix it.

use thiserror::Error;
use tokio_tungstenite::tungstenite;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the pipeline runner
#[derive(Error, Debug)]
pub enum Error {
    // === Protocol Errors ===
    #[error("Unknown protocol '{0}'. Supported protocols: 'HTTP', 'WS'")]
    UnknownProtocol(String),

    // === Transport Errors ===
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tungstenite::Error),

    #[error("WebSocket closed unexpectedly with code {code}: {reason}")]
    UnexpectedClose { code: u16, reason: String },

    #[error("Response body is not valid JSON: {0}")]
    InvalidResponseBody(#[source] serde_json::Error),

    #[error("Invalid header '{name}': {reason}")]
    InvalidHeader { name: String, reason: String },

    #[error("Invalid HTTP method '{0}'")]
    InvalidMethod(String),

    #[error("Invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("WebSocket requests need a 'baseUrl' to dial")]
    MissingWebSocketUrl,

    #[error("Invalid request body: {0}")]
    InvalidBody(String),

    // === Pipeline Errors ===
    #[error("No custom pipeline named '{0}' exists")]
    PipelineNotFound(String),

    #[error("{0} pipeline(s) halted before completing")]
    PipelinesHalted(usize),

    // === Configuration Errors ===
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid configuration file: {0}")]
    ConfigParse(String),

    #[error("Unsupported configuration format '{0}'. Use a .json, .yaml or .yml file")]
    UnsupportedConfigFormat(String),

    #[error("No such environment '{0}'. Use development, staging or production")]
    UnknownEnvironment(String),

    #[error("Failed to read file '{path}': {error}")]
    FileRead { path: String, error: String },

    // === Token Store Errors ===
    #[error("Token store error: {0}")]
    TokenStore(String),

    // === Serialization Errors ===
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Failure categories as they surface to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Unrecognised protocol tag on a request
    Protocol,
    /// Dial/send/receive failure or unparseable response
    Transport,
    /// Requested custom pipeline does not exist
    PipelineNotFound,
    /// Bad or unreadable configuration
    Configuration,
    /// Token persistence failure
    Persistence,
}

impl Error {
    /// Classify this error for reporting
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::UnknownProtocol(_) => ErrorKind::Protocol,
            Error::Http(_)
            | Error::WebSocket(_)
            | Error::UnexpectedClose { .. }
            | Error::InvalidResponseBody(_)
            | Error::InvalidHeader { .. }
            | Error::InvalidMethod(_)
            | Error::InvalidUrl { .. }
            | Error::MissingWebSocketUrl
            | Error::InvalidBody(_) => ErrorKind::Transport,
            Error::PipelineNotFound(_) => ErrorKind::PipelineNotFound,
            Error::PipelinesHalted(_) => ErrorKind::Transport,
            Error::Config(_)
            | Error::ConfigParse(_)
            | Error::UnsupportedConfigFormat(_)
            | Error::UnknownEnvironment(_)
            | Error::FileRead { .. } => ErrorKind::Configuration,
            Error::TokenStore(_) => ErrorKind::Persistence,
            Error::Json(_) => ErrorKind::Transport,
        }
    }

    /// Create an invalid header error
    pub fn invalid_header(name: &str, reason: impl ToString) -> Self {
        Self::InvalidHeader {
            name: name.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Create an invalid URL error
    pub fn invalid_url(url: &str, reason: impl ToString) -> Self {
        Self::InvalidUrl {
            url: url.to_string(),
            reason: reason.to_string(),
        }
    }
}
