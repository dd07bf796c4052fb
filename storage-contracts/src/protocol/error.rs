// SPDX-License-Identifier: GPL-3.0-only

use std::fmt;

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageErrorKind {
    /// The target (volume, device, binary) does not exist
    NotFound,
    PermissionDenied,
    /// The device or mount point is in use
    Busy,
    /// The tool could not be started or the transport is unreachable
    Unavailable,
    /// The tool ran and exited non-zero
    CommandFailed,
    /// The tool succeeded but printed something we could not interpret
    InvalidOutput,
    Internal,
}

impl fmt::Display for StorageErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::NotFound => "not found",
            Self::PermissionDenied => "permission denied",
            Self::Busy => "busy",
            Self::Unavailable => "unavailable",
            Self::CommandFailed => "command failed",
            Self::InvalidOutput => "invalid output",
            Self::Internal => "internal error",
        };
        f.write_str(label)
    }
}

/// Outcome of a failed call to an external collaborator
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {message}")]
pub struct StorageError {
    pub kind: StorageErrorKind,
    pub message: String,
}

impl StorageError {
    pub fn new(kind: StorageErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn command_failed(command: &str, stderr: &str) -> Self {
        Self::new(
            StorageErrorKind::CommandFailed,
            format!("{command}: {}", stderr.trim()),
        )
    }
}

impl From<std::io::Error> for StorageError {
    fn from(error: std::io::Error) -> Self {
        let kind = match error.kind() {
            std::io::ErrorKind::NotFound => StorageErrorKind::NotFound,
            std::io::ErrorKind::PermissionDenied => StorageErrorKind::PermissionDenied,
            _ => StorageErrorKind::Internal,
        };
        Self::new(kind, error.to_string())
    }
}
