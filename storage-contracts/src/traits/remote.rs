// SPDX-License-Identifier: GPL-3.0-only

use storage_types::RemoteTarget;

use crate::StorageError;

/// Queries run on the mirror host over the remote shell
pub trait RemoteOpsAdapter {
    /// `Ok(false)` means the shell answered and the directory is absent;
    /// transport failures are errors.
    fn directory_exists(&self, remote: &RemoteTarget, path: &str) -> Result<bool, StorageError>;
}
