//! Error types for commons-archivist
//!
//! This module provides the error handling used across the pipeline:
//! - A single crate-wide [`Error`] enum with contextual variants
//! - [`ErrorGroup`], the aggregate raised when a concurrent batch fails
//! - Classification of failures into ordinary and non-recoverable ones

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for commons-archivist operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for commons-archivist
///
/// Each variant carries enough context to be logged on its own, since
/// individual failures are often reported long after they happened, as
/// members of an [`ErrorGroup`].
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration or argument error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key or argument that caused the error (e.g., "dest")
        key: Option<String>,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// I/O error tied to a specific path
    #[error("I/O error at {path}: {source}")]
    IoAt {
        /// The path being accessed
        path: PathBuf,
        /// The underlying error
        #[source]
        source: std::io::Error,
    },

    /// Network error
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid URL built from configuration or returned by the API
    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The API answered with a payload that does not match the expected schema
    #[error("malformed API response: {0}")]
    MalformedResponse(String),

    /// A resolved page has no image variant to download
    #[error("failed to fetch '{filename}': page has no image information")]
    MissingImageInfo {
        /// Derived filename of the page
        filename: String,
    },

    /// The run was interrupted (Ctrl-C, SIGTERM, or an explicit cancel)
    #[error("operation cancelled")]
    Cancelled,

    /// A spawned unit of work panicked or was aborted
    #[error("task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    /// A concurrent batch failed
    #[error(transparent)]
    Group(#[from] ErrorGroup),
}

impl Error {
    /// Create a configuration error for the given key
    pub fn config(key: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Config {
            message: message.into(),
            key: Some(key.into()),
        }
    }

    /// Whether this failure belongs to the non-recoverable class.
    ///
    /// Interrupt-class failures (cancellation, aborted or panicked tasks) are
    /// never swallowed, whatever the tolerance setting. A group is fatal when
    /// it was raised on the fatal path.
    pub fn is_fatal(&self) -> bool {
        match self {
            Error::Cancelled | Error::Task(_) => true,
            Error::Group(group) => group.fatal,
            _ => false,
        }
    }
}

/// A collection of failures raised together by a concurrent batch.
///
/// `fatal` is set when at least one member is non-recoverable; in that case
/// the group carries every failure of the batch, ordinary ones included.
#[derive(Debug)]
pub struct ErrorGroup {
    /// Summary message (e.g., "Error querying")
    pub message: String,
    /// Member failures in batch order
    pub errors: Vec<Error>,
    /// Whether the group was raised on the non-recoverable path
    pub fatal: bool,
}

impl ErrorGroup {
    /// Create a new group
    pub fn new(message: impl Into<String>, errors: Vec<Error>, fatal: bool) -> Self {
        Self {
            message: message.into(),
            errors,
            fatal,
        }
    }

    /// Number of member failures
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Whether the group has no members
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }
}

impl fmt::Display for ErrorGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let noun = if self.errors.len() == 1 {
            "sub-exception"
        } else {
            "sub-exceptions"
        };
        write!(f, "{} ({} {})", self.message, self.errors.len(), noun)?;
        for (i, error) in self.errors.iter().enumerate() {
            write!(f, "\n  [{}] {}", i + 1, error)?;
        }
        Ok(())
    }
}

impl std::error::Error for ErrorGroup {}
