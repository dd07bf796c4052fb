// SPDX-License-Identifier: GPL-3.0-only

use std::path::Path;

use crate::StorageError;

pub trait MountOpsAdapter {
    fn mount_read_only(&self, device: &Path, mount_point: &Path) -> Result<(), StorageError>;

    fn unmount(&self, mount_point: &Path) -> Result<(), StorageError>;
}
