use std::cell::RefCell;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use storage_contracts::{
    LvmOpsAdapter, MountOpsAdapter, RemoteOpsAdapter, StorageError, StorageErrorKind,
    TransferOpsAdapter,
};
use storage_types::{
    RemoteTarget, SnapshotHandle, SnapshotRequest, TransferRequest, VolumeProvisioning,
};

use crate::ledger::{Call, CallLedger};

/// A single fake host implementing every adapter, sharing one ledger.
///
/// Remote directories and failures are keyed by path so tests can target a
/// single volume.
#[derive(Debug, Default)]
pub struct FakeHost {
    ledger: CallLedger,
    thin_volumes: BTreeSet<String>,
    remote_dirs: BTreeSet<String>,
    failing_creates: BTreeSet<String>,
    failing_transfers: BTreeSet<String>,
    fail_activation: bool,
    fail_mount: bool,
    fail_unmount: bool,
    fail_remove: bool,
    unreachable: bool,
    live_snapshots: RefCell<BTreeSet<PathBuf>>,
    mounted: RefCell<Option<PathBuf>>,
    mirrored: RefCell<Vec<String>>,
}

impl FakeHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_thin_volume(mut self, volume: &str) -> Self {
        self.thin_volumes.insert(volume.to_string());
        self
    }

    pub fn with_remote_dir(mut self, path: &str) -> Self {
        self.remote_dirs.insert(path.to_string());
        self
    }

    pub fn with_remote_dirs<'a>(mut self, paths: impl IntoIterator<Item = &'a str>) -> Self {
        self.remote_dirs
            .extend(paths.into_iter().map(str::to_string));
        self
    }

    pub fn failing_create_for(mut self, volume: &str) -> Self {
        self.failing_creates.insert(volume.to_string());
        self
    }

    pub fn failing_transfer_to(mut self, destination: &str) -> Self {
        self.failing_transfers.insert(destination.to_string());
        self
    }

    pub fn failing_activation(mut self) -> Self {
        self.fail_activation = true;
        self
    }

    pub fn failing_mount(mut self) -> Self {
        self.fail_mount = true;
        self
    }

    pub fn failing_unmount(mut self) -> Self {
        self.fail_unmount = true;
        self
    }

    pub fn failing_remove(mut self) -> Self {
        self.fail_remove = true;
        self
    }

    pub fn unreachable(mut self) -> Self {
        self.unreachable = true;
        self
    }

    pub fn ledger(&self) -> &CallLedger {
        &self.ledger
    }

    /// Snapshots created and not yet removed
    pub fn live_snapshots(&self) -> Vec<PathBuf> {
        self.live_snapshots.borrow().iter().cloned().collect()
    }

    pub fn mounted(&self) -> Option<PathBuf> {
        self.mounted.borrow().clone()
    }

    /// Destinations that received a real (non dry-run) transfer
    pub fn mirrored(&self) -> Vec<String> {
        self.mirrored.borrow().clone()
    }

    fn failure(message: impl Into<String>) -> StorageError {
        StorageError::new(StorageErrorKind::CommandFailed, message)
    }
}

impl LvmOpsAdapter for FakeHost {
    fn query_provisioning(
        &self,
        volume_group: &str,
        volume: &str,
    ) -> Result<VolumeProvisioning, StorageError> {
        self.ledger.record(Call::QueryProvisioning {
            volume_group: volume_group.to_string(),
            volume: volume.to_string(),
        });
        if self.thin_volumes.contains(volume) {
            Ok(VolumeProvisioning::Thin)
        } else {
            Ok(VolumeProvisioning::Thick)
        }
    }

    fn create_snapshot(&self, request: &SnapshotRequest) -> Result<(), StorageError> {
        self.ledger.record(Call::CreateSnapshot {
            origin: request.origin_path(),
            name: request.name.clone(),
            size: request.size.clone(),
        });
        if self.failing_creates.contains(&request.origin) {
            return Err(Self::failure(format!(
                "lvcreate {}: insufficient free space",
                request.origin_path()
            )));
        }

        let device = PathBuf::from("/dev")
            .join(&request.volume_group)
            .join(&request.name);
        if !self.live_snapshots.borrow_mut().insert(device.clone()) {
            return Err(Self::failure(format!(
                "lvcreate: {} already exists",
                device.display()
            )));
        }
        Ok(())
    }

    fn activate_snapshot(&self, snapshot: &SnapshotHandle) -> Result<(), StorageError> {
        self.ledger.record(Call::ActivateSnapshot {
            device: snapshot.device_path.clone(),
        });
        if self.fail_activation {
            return Err(Self::failure("lvchange: activation failed"));
        }
        Ok(())
    }

    fn remove_snapshot(&self, snapshot: &SnapshotHandle) -> Result<(), StorageError> {
        self.ledger.record(Call::RemoveSnapshot {
            device: snapshot.device_path.clone(),
        });
        if self.fail_remove {
            return Err(Self::failure("lvremove: device-mapper: remove ioctl failed"));
        }
        if let Some(mount_point) = self.mounted.borrow().as_ref() {
            panic!(
                "removing {} while {} is still mounted",
                snapshot.device_path.display(),
                mount_point.display()
            );
        }
        self.live_snapshots.borrow_mut().remove(&snapshot.device_path);
        Ok(())
    }
}

impl MountOpsAdapter for FakeHost {
    fn mount_read_only(&self, device: &Path, mount_point: &Path) -> Result<(), StorageError> {
        self.ledger.record(Call::Mount {
            device: device.to_path_buf(),
            mount_point: mount_point.to_path_buf(),
        });
        if let Some(current) = self.mounted.borrow().as_ref() {
            panic!(
                "re-entrant mount of {} while {} is mounted",
                device.display(),
                current.display()
            );
        }
        if self.fail_mount {
            return Err(StorageError::new(
                StorageErrorKind::NotFound,
                format!("mount point {} does not exist", mount_point.display()),
            ));
        }
        *self.mounted.borrow_mut() = Some(mount_point.to_path_buf());
        Ok(())
    }

    fn unmount(&self, mount_point: &Path) -> Result<(), StorageError> {
        self.ledger.record(Call::Unmount {
            mount_point: mount_point.to_path_buf(),
        });
        if self.fail_unmount {
            return Err(StorageError::new(
                StorageErrorKind::Busy,
                format!("umount {}: target is busy", mount_point.display()),
            ));
        }
        *self.mounted.borrow_mut() = None;
        Ok(())
    }
}

impl RemoteOpsAdapter for FakeHost {
    fn directory_exists(&self, remote: &RemoteTarget, path: &str) -> Result<bool, StorageError> {
        self.ledger.record(Call::DirectoryExists {
            host: remote.host.clone(),
            path: path.to_string(),
        });
        if self.unreachable {
            return Err(StorageError::new(
                StorageErrorKind::Unavailable,
                format!("ssh: connect to host {}: Connection refused", remote.host),
            ));
        }
        Ok(self.remote_dirs.contains(path))
    }
}

impl TransferOpsAdapter for FakeHost {
    fn transfer(&self, request: &TransferRequest) -> Result<(), StorageError> {
        self.ledger.record(Call::Transfer {
            destination: request.destination.clone(),
            args: request.args.clone(),
            dry_run: request.dry_run,
        });
        if self.failing_transfers.contains(&request.destination) {
            return Err(Self::failure("rsync exited with status 23"));
        }
        if !request.dry_run {
            self.mirrored.borrow_mut().push(request.destination.clone());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[should_panic(expected = "re-entrant mount")]
    fn rejects_reentrant_mount() {
        let host = FakeHost::new();
        host.mount_read_only(Path::new("/dev/vg0/a"), Path::new("/mnt/snap"))
            .unwrap();
        let _ = host.mount_read_only(Path::new("/dev/vg0/b"), Path::new("/mnt/snap"));
    }

    #[test]
    fn tracks_live_snapshots() {
        let host = FakeHost::new();
        let request = SnapshotRequest::for_origin(
            "vg0",
            "root",
            "snap",
            "5G",
            VolumeProvisioning::Thick,
        );
        host.create_snapshot(&request).unwrap();
        assert_eq!(host.live_snapshots(), vec![PathBuf::from("/dev/vg0/snap")]);
        assert!(host.create_snapshot(&request).is_err());

        let handle = SnapshotHandle::from_request(&request, VolumeProvisioning::Thick);
        host.remove_snapshot(&handle).unwrap();
        assert!(host.live_snapshots().is_empty());
    }
}
