//! Error types for the fetch and transform stages.
//!
//! Each stage has its own enum so the binary can report which stage failed.
//! Value-level parse problems are not errors at all: see
//! [`crate::normalize::values::Outcome`].

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while reading configuration from the environment.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A required setting is absent or blank.
    #[error("Missing required configuration: {name}")]
    Missing { name: &'static str },

    /// A setting is present but cannot be parsed.
    #[error("Invalid value for {name}: {value:?}")]
    Invalid { name: &'static str, value: String },
}

/// Errors raised by the submission fetcher.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Non-retryable HTTP status, exhausted retries, network failure or an
    /// unusable response body.
    #[error("Transport error for {url}: {message}")]
    Transport {
        url: String,
        status: Option<u16>,
        message: String,
    },

    /// The continuation pointer was followed more times than allowed.
    #[error("Pagination limit of {max_pages} pages exceeded (next page: {next_url})")]
    PaginationLimit { max_pages: u32, next_url: String },

    /// The HTTP client could not be constructed.
    #[error("Failed to build HTTP client: {0}")]
    Client(String),
}

impl FetchError {
    /// Builds a transport error without an HTTP status.
    pub(crate) fn transport(url: &str, message: impl Into<String>) -> Self {
        FetchError::Transport {
            url: url.to_string(),
            status: None,
            message: message.into(),
        }
    }

    /// HTTP status attached to a transport error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            FetchError::Transport { status, .. } => *status,
            _ => None,
        }
    }
}

/// Errors raised by the JSON file boundary.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The expected input file does not exist.
    #[error("Input file not found: {}", .0.display())]
    InputNotFound(PathBuf),

    /// The file exists but is not valid JSON (or could not be serialized).
    #[error("Invalid JSON in {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors raised by the normalizer as a whole.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NormalizeError {
    /// The input is neither a list of records nor an object with a `results` list.
    #[error("Input must be a JSON array or an object with a \"results\" array, got {found}")]
    InvalidInput { found: &'static str },
}
