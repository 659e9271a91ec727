//! Habitual - daily habit records and weekly completion rollups.
//!
//! This library provides the core functionality for the `habitual` CLI tool:
//! creating one linked tracking record per habit per day, and computing the
//! weekly actual-vs-target rollup that gets rendered and published.

pub mod cli;
pub mod commands;
pub mod config;
pub mod daily;
pub mod logging;
pub mod models;
pub mod notion;
pub mod publish;
pub mod rollup;
pub mod store;
pub mod week;

/// Library-level error type for Habitual operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Master record not found for \"{0}\" (check \"Is Master\")")]
    MasterNotFound(String),

    #[error("No master records found in the store")]
    NoMasters,

    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("Transport error: {0}")]
    Transport(String),

    /// The remote side reported a timeout after the write was accepted.
    #[error("Late timeout: {0}")]
    LateTimeout(String),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Whether this error belongs to the late-timeout class.
    pub fn is_late_timeout(&self) -> bool {
        matches!(self, Error::LateTimeout(_))
    }

    /// Reclassify a timeout from a write that may already have been accepted.
    ///
    /// HTTP 408/499, a status body mentioning "Request Timeout", and transport
    /// failures that "timed out" become [`Error::LateTimeout`]; anything else
    /// is returned unchanged.
    pub fn into_late_timeout(self) -> Self {
        match self {
            Error::Http {
                status: status @ (408 | 499),
                body,
            } => Error::LateTimeout(format!("HTTP {}: {}", status, body)),
            Error::Http { status, body } if is_timeout_message(&body) => {
                Error::LateTimeout(format!("HTTP {}: {}", status, body))
            }
            Error::Transport(message) if is_timeout_message(&message) => {
                Error::LateTimeout(message)
            }
            other => other,
        }
    }
}

fn is_timeout_message(message: &str) -> bool {
    let lower = message.to_lowercase();
    lower.contains("request timeout") || lower.contains("timed out")
}

/// Result type alias for Habitual operations.
pub type Result<T> = std::result::Result<T, Error>;
