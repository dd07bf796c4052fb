// SPDX-License-Identifier: GPL-3.0-only

//! Mount and unmount of the snapshot device

use std::path::{Path, PathBuf};

use storage_contracts::{MountOpsAdapter, StorageError, StorageErrorKind};
use tracing::info;

use crate::{cmd, find_binary};

fn mount_args(device: &Path, mount_point: &Path) -> Vec<String> {
    vec![
        "-o".to_string(),
        "ro".to_string(),
        device.display().to_string(),
        mount_point.display().to_string(),
    ]
}

/// mount(8)/umount(8) wrapper
#[derive(Debug, Clone)]
pub struct MountCli {
    mount: PathBuf,
    umount: PathBuf,
}

impl MountCli {
    pub fn new() -> Result<Self, StorageError> {
        Ok(Self {
            mount: find_binary("mount")?,
            umount: find_binary("umount")?,
        })
    }
}

impl MountOpsAdapter for MountCli {
    fn mount_read_only(&self, device: &Path, mount_point: &Path) -> Result<(), StorageError> {
        if !mount_point.is_dir() {
            return Err(StorageError::new(
                StorageErrorKind::NotFound,
                format!("mount point {} is not a directory", mount_point.display()),
            ));
        }

        info!("Mounting {:?} read-only at {:?}", device, mount_point);
        cmd::run(&self.mount, &mount_args(device, mount_point))?;
        Ok(())
    }

    fn unmount(&self, mount_point: &Path) -> Result<(), StorageError> {
        info!("Unmounting {:?}", mount_point);
        let outcome = cmd::probe(&self.umount, &[mount_point.display().to_string()])?;
        if outcome.success() {
            return Ok(());
        }

        let kind = if outcome.stderr.contains("busy") {
            StorageErrorKind::Busy
        } else {
            StorageErrorKind::CommandFailed
        };
        Err(StorageError::new(
            kind,
            format!("{}: {}", outcome.command, outcome.stderr.trim()),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mounts_read_only() {
        let args = mount_args(
            Path::new("/dev/vg0/mirror-snapshot"),
            Path::new("/mnt/mirror-snapshot"),
        );
        assert_eq!(
            args,
            vec!["-o", "ro", "/dev/vg0/mirror-snapshot", "/mnt/mirror-snapshot"]
        );
    }
}
