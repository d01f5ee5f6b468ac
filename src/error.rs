//! Error types for bit-installer
//!
//! This module provides the error handling for the library, including:
//! - A single crate-wide [`Error`] enum with contextual variants
//! - Classification of network failures (HTTP status, timeout, transport)
//! - A serializable [`FailureKind`] used by the orchestrator's terminal state
//! - Stable user-facing summaries that never leak raw diagnostic text

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for bit-installer operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for bit-installer
///
/// Each variant carries the context needed for diagnostics. The `Display`
/// output is the raw diagnostic message; use [`Error::user_message`] for the
/// text shown to an end user.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "apps[0].target_path")
        key: Option<String>,
    },

    /// Not enough free space in the temp directory to start an attempt
    #[error("insufficient storage: need {required} bytes, have {available} bytes")]
    InsufficientStorage {
        /// Number of bytes required before a download may start
        required: u64,
        /// Number of bytes currently available on disk
        available: u64,
    },

    /// Failed to query free space
    #[error("failed to check disk space: {0}")]
    DiskSpaceCheckFailed(String),

    /// Network failure while talking to a remote source
    #[error("network error: {0}")]
    Network(#[from] NetworkError),

    /// Downloaded bytes do not hash to the expected digest
    #[error("integrity mismatch: expected {expected}, got {actual}")]
    IntegrityMismatch {
        /// Digest supplied by configuration
        expected: String,
        /// Digest computed over the persisted bytes
        actual: String,
    },

    /// Malformed identifier or path, including canonicalization escapes
    #[error("invalid {field}: {reason}")]
    Validation {
        /// Name of the rejected field (e.g., "package_id", "relative_path")
        field: String,
        /// Why the value was rejected
        reason: String,
    },

    /// The privileged execution capability is not reachable
    #[error("privileged capability unavailable: {0}")]
    CapabilityUnavailable(String),

    /// The user denied the privileged authorization request
    #[error("privileged authorization denied")]
    AuthorizationDenied,

    /// The privileged command ran and exited unsuccessfully
    #[error("privileged command failed (exit code {exit_code:?}): {stderr}")]
    PrivilegedExecution {
        /// Process exit code, `None` when terminated by a signal
        exit_code: Option<i32>,
        /// Captured standard error output
        stderr: String,
    },

    /// The privileged command could not be started at all
    #[error("failed to invoke privileged command: {0}")]
    PrivilegedInvocation(String),

    /// The attempt was cancelled by the caller
    #[error("acquisition cancelled")]
    Cancelled,

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A remote source returned JSON that does not decode
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Anything that does not fit the categories above
    #[error("unexpected error: {0}")]
    Unexpected(String),
}

/// Network-level failures
#[derive(Debug, Error)]
pub enum NetworkError {
    /// The server answered with a non-success status
    #[error("HTTP status {status}")]
    Status {
        /// The HTTP status code returned by the server
        status: u16,
    },

    /// A connect or read phase exceeded its timeout
    #[error("timed out: {0}")]
    Timeout(String),

    /// Connection, TLS or body decoding failure
    #[error("transport failure: {0}")]
    Transport(String),

    /// The URL could not be parsed or has an unsupported scheme
    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}

/// Coarse failure category carried by [`crate::types::AcquisitionState::Failed`]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Not enough local storage to start
    InsufficientStorage,
    /// HTTP status, timeout or transport failure
    NetworkFailure,
    /// Computed digest differs from the expected digest
    IntegrityMismatch,
    /// Identifier, path or configuration rejected
    ValidationFailure,
    /// Privileged helper not available
    CapabilityUnavailable,
    /// Privileged authorization denied
    AuthorizationDenied,
    /// Privileged command exited unsuccessfully
    PrivilegedExecutionFailure,
    /// Privileged command could not be started
    PrivilegedInvocation,
    /// Caller abandoned the attempt
    Cancelled,
    /// Anything else
    Unexpected,
}

impl Error {
    /// Shorthand for a [`Error::Validation`] error
    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// HTTP status code if this is a status failure
    pub fn http_status(&self) -> Option<u16> {
        match self {
            Error::Network(NetworkError::Status { status }) => Some(*status),
            _ => None,
        }
    }

    /// Map the error to its coarse [`FailureKind`]
    pub fn kind(&self) -> FailureKind {
        match self {
            Error::InsufficientStorage { .. } => FailureKind::InsufficientStorage,
            Error::Network(_) => FailureKind::NetworkFailure,
            Error::IntegrityMismatch { .. } => FailureKind::IntegrityMismatch,
            Error::Validation { .. } | Error::Config { .. } => FailureKind::ValidationFailure,
            Error::CapabilityUnavailable(_) => FailureKind::CapabilityUnavailable,
            Error::AuthorizationDenied => FailureKind::AuthorizationDenied,
            Error::PrivilegedExecution { .. } => FailureKind::PrivilegedExecutionFailure,
            Error::PrivilegedInvocation(_) => FailureKind::PrivilegedInvocation,
            Error::Cancelled => FailureKind::Cancelled,
            Error::DiskSpaceCheckFailed(_)
            | Error::Io(_)
            | Error::Serialization(_)
            | Error::Unexpected(_) => FailureKind::Unexpected,
        }
    }

    /// Stable, user-displayable summary
    ///
    /// Unlike `Display`, this never includes raw messages from the OS, the
    /// HTTP stack or the privileged helper.
    pub fn user_message(&self) -> String {
        match self {
            Error::InsufficientStorage { required, .. } => format!(
                "Insufficient storage space. Need at least {}MB free.",
                required / (1024 * 1024)
            ),
            Error::Network(NetworkError::Status { status }) => match status {
                404 => "Release not found. Please check the source.".to_string(),
                403 => "Rate limited. Please try again later.".to_string(),
                429 => "Too many requests. Please wait a moment.".to_string(),
                500..=599 => "Server error. Please try again later.".to_string(),
                _ => "Network error occurred.".to_string(),
            },
            Error::Network(NetworkError::Timeout(_)) => {
                "Connection timed out. Please check your connection.".to_string()
            }
            Error::Network(NetworkError::Transport(_)) => {
                "Download failed. Please check your connection.".to_string()
            }
            Error::Network(NetworkError::InvalidUrl(_)) => "Invalid download URL.".to_string(),
            Error::IntegrityMismatch { .. } => {
                "Security verification failed. The download does not match its checksum."
                    .to_string()
            }
            Error::Validation { field, .. } => format!("Invalid {field}."),
            Error::Config { .. } => "Invalid configuration format.".to_string(),
            Error::CapabilityUnavailable(_) => {
                "Installation failed. The privileged helper is not running.".to_string()
            }
            Error::AuthorizationDenied => {
                "Installation failed. Permission was not granted.".to_string()
            }
            Error::PrivilegedExecution { .. } | Error::PrivilegedInvocation(_) => {
                "Installation failed. Check privileged helper permissions.".to_string()
            }
            Error::Cancelled => "Download cancelled.".to_string(),
            Error::DiskSpaceCheckFailed(_)
            | Error::Io(_)
            | Error::Serialization(_)
            | Error::Unexpected(_) => "An unexpected error occurred.".to_string(),
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(error: reqwest::Error) -> Self {
        let network = if error.is_timeout() {
            NetworkError::Timeout(error.to_string())
        } else if let Some(status) = error.status() {
            NetworkError::Status {
                status: status.as_u16(),
            }
        } else if error.is_builder() {
            NetworkError::InvalidUrl(error.to_string())
        } else {
            NetworkError::Transport(error.to_string())
        };
        Error::Network(network)
    }
}

impl From<toml::de::Error> for Error {
    fn from(error: toml::de::Error) -> Self {
        Error::Config {
            message: error.to_string(),
            key: None,
        }
    }
}
