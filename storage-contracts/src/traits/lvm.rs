// SPDX-License-Identifier: GPL-3.0-only

use storage_types::{SnapshotHandle, SnapshotRequest, VolumeProvisioning};

use crate::StorageError;

/// Snapshot operations of the volume manager
pub trait LvmOpsAdapter {
    /// Report whether `volume_group/volume` is thin-provisioned.
    fn query_provisioning(
        &self,
        volume_group: &str,
        volume: &str,
    ) -> Result<VolumeProvisioning, StorageError>;

    fn create_snapshot(&self, request: &SnapshotRequest) -> Result<(), StorageError>;

    /// Bring a thin snapshot online despite its activation-skip flag.
    fn activate_snapshot(&self, snapshot: &SnapshotHandle) -> Result<(), StorageError>;

    /// Forcefully remove the snapshot.
    fn remove_snapshot(&self, snapshot: &SnapshotHandle) -> Result<(), StorageError>;
}
