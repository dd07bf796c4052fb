// SPDX-License-Identifier: GPL-3.0-only

use std::path::PathBuf;

use storage_contracts::StorageError;
use storage_types::SnapshotState;
use thiserror::Error;

/// Every failure is fatal for the unit that raised it and aborts the run.
#[derive(Error, Debug)]
pub enum MirrorError {
    #[error("invalid argument: {0}")]
    Argument(String),

    #[error("configuration {}: {reason}", path.display())]
    Configuration { path: PathBuf, reason: String },

    #[error("{0}")]
    MissingExcludeEntry(#[from] storage_types::MissingExcludeEntry),

    #[error("destination {host}:{path} does not exist")]
    DestinationMissing { host: String, path: String },

    #[error("remote shell to {host} failed")]
    Remote {
        host: String,
        #[source]
        source: StorageError,
    },

    #[error("snapshot of {volume} could not be created")]
    SnapshotCreate {
        volume: String,
        #[source]
        source: StorageError,
    },

    #[error("snapshot {} could not be activated", device.display())]
    SnapshotActivate {
        device: PathBuf,
        #[source]
        source: StorageError,
    },

    #[error("mounting {} at {} failed", device.display(), mount_point.display())]
    Mount {
        device: PathBuf,
        mount_point: PathBuf,
        #[source]
        source: StorageError,
    },

    #[error("unmounting {} failed; snapshot left in place", mount_point.display())]
    Unmount {
        mount_point: PathBuf,
        #[source]
        source: StorageError,
    },

    #[error("snapshot {} could not be destroyed", device.display())]
    SnapshotDestroy {
        device: PathBuf,
        #[source]
        source: StorageError,
    },

    #[error("transfer of {volume} failed")]
    Transfer {
        volume: String,
        #[source]
        source: StorageError,
    },

    #[error("snapshot lifecycle violated: {from} cannot become {to}")]
    Lifecycle {
        from: SnapshotState,
        to: SnapshotState,
    },

    #[error("required tool unavailable")]
    ToolMissing(#[source] StorageError),

    #[error("privilege required: run as root to manage snapshots and mounts")]
    PrivilegeRequired,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, MirrorError>;
