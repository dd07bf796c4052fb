// SPDX-License-Identifier: GPL-3.0-only

//! Low-level system operations for the volume mirror
//!
//! This crate drives the external tools the mirror depends on:
//! - LVM snapshot creation, activation and removal
//! - Read-only mount and unmount of the snapshot
//! - Remote shell queries against the mirror host
//! - The rsync transfer itself
//!
//! Snapshot and mount operations require root and should only be called
//! after the caller has checked its privileges.

pub mod cmd;
pub mod logical;
pub mod mount;
pub mod remote;
pub mod rsync;

pub use logical::lvm_tools::LvmCli;
pub use mount::MountCli;
pub use remote::SshRemote;
pub use rsync::RsyncCli;

use std::path::PathBuf;

use storage_contracts::{StorageError, StorageErrorKind};
use tracing::debug;

/// Locate a binary in PATH.
pub fn find_binary(name: &str) -> Result<PathBuf, StorageError> {
    let path = which::which(name).map_err(|_| {
        StorageError::new(
            StorageErrorKind::NotFound,
            format!("{name} not found in PATH"),
        )
    })?;
    debug!("Found {} at {:?}", name, path);
    Ok(path)
}

/// Every system tool the mirror needs, located up front
#[derive(Debug, Clone)]
pub struct SystemTools {
    pub lvm: LvmCli,
    pub mounts: MountCli,
    pub remote: SshRemote,
    pub transfer: RsyncCli,
}

impl SystemTools {
    /// Fails on the first tool missing from PATH.
    pub fn discover() -> Result<Self, StorageError> {
        Ok(Self {
            lvm: LvmCli::new()?,
            mounts: MountCli::new()?,
            remote: SshRemote,
            transfer: RsyncCli::new()?,
        })
    }
}
