//! Core types for bit-installer

use crate::error::{Error, FailureKind};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Why an attempt ended in [`AcquisitionState::Failed`]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureReason {
    /// Coarse failure category
    pub kind: FailureKind,
    /// Stable, user-displayable summary
    pub summary: String,
    /// Raw diagnostic message (not for end users)
    pub detail: String,
    /// HTTP status when the failure was a status response
    #[serde(skip_serializing_if = "Option::is_none")]
    pub http_status: Option<u16>,
}

impl From<&Error> for FailureReason {
    fn from(error: &Error) -> Self {
        Self {
            kind: error.kind(),
            summary: error.user_message(),
            detail: error.to_string(),
            http_status: error.http_status(),
        }
    }
}

/// Observable state of one acquisition attempt
///
/// A single attempt moves forward through these states and never revisits
/// one: `Idle → Connecting → Downloading → Verifying → Installing → Success`,
/// with `Failed` reachable from every non-terminal state.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum AcquisitionState {
    /// No attempt has started
    Idle,
    /// Opening the connection to the remote source
    Connecting,
    /// Streaming the body (percent complete)
    Downloading {
        /// 0–100
        progress: u8,
    },
    /// Full body hashed; comparing against the expected digest
    Verifying {
        /// Digest of the persisted bytes
        digest: String,
    },
    /// Handing the verified file to the privileged installer
    Installing,
    /// The file was placed at its destination
    Success,
    /// The attempt failed
    Failed {
        /// What went wrong
        reason: FailureReason,
    },
}

impl AcquisitionState {
    /// Whether this state ends an attempt
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Success | Self::Failed { .. })
    }

    /// Position in the forward-only ordering of states
    pub(crate) fn rank(&self) -> u8 {
        match self {
            Self::Idle => 0,
            Self::Connecting => 1,
            Self::Downloading { .. } => 2,
            Self::Verifying { .. } => 3,
            Self::Installing => 4,
            Self::Success | Self::Failed { .. } => 5,
        }
    }

    /// Failure category if this is a failed state
    pub fn failure_kind(&self) -> Option<FailureKind> {
        match self {
            Self::Failed { reason } => Some(reason.kind),
            _ => None,
        }
    }
}

/// One HTTP fetch into a local file
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DownloadRequest {
    /// Remote URL (HTTPS in production)
    pub url: String,
    /// Local file the body is written to
    pub destination: PathBuf,
    /// Expected SHA-256 (hex, case-insensitive)
    pub expected_digest: Option<String>,
}

/// Everything the orchestrator needs for one attempt
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcquisitionRequest {
    /// Download URL of the artifact
    pub url: String,
    /// Dotted identifier of the destination app
    pub package_id: String,
    /// Destination path relative to the app's data directory
    pub relative_path: String,
    /// Expected SHA-256 of the artifact
    pub expected_digest: Option<String>,
}
