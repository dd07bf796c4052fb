// SPDX-License-Identifier: GPL-3.0-only

//! Snapshot lifecycle manager
//!
//! Walks one snapshot through `Created -> (Activated) -> Mounted ->
//! Unmounted -> Destroyed`. The activation step only happens for thin
//! volumes. Every transition is checked against
//! [`SnapshotState::can_advance_to`].

use std::path::{Path, PathBuf};

use storage_contracts::{LvmOpsAdapter, MountOpsAdapter};
use storage_types::{SnapshotHandle, SnapshotRequest, SnapshotState};
use tracing::{info, warn};

use crate::error::{MirrorError, Result};

/// Where to snapshot from, and how big the copy-on-write area may grow
#[derive(Debug, Clone, Copy)]
pub struct SnapshotPlan<'a> {
    pub volume_group: &'a str,
    pub origin: &'a str,
    pub name: &'a str,
    pub size: &'a str,
}

/// Exclusively owns one snapshot for the duration of a pipeline run
pub struct SnapshotLifecycle<'a> {
    lvm: &'a dyn LvmOpsAdapter,
    mounts: &'a dyn MountOpsAdapter,
    handle: SnapshotHandle,
    state: SnapshotState,
    mount_point: Option<PathBuf>,
}

impl<'a> SnapshotLifecycle<'a> {
    /// Create the snapshot, passing a size only for non-thin origins.
    pub fn create(
        lvm: &'a dyn LvmOpsAdapter,
        mounts: &'a dyn MountOpsAdapter,
        plan: SnapshotPlan<'_>,
    ) -> Result<Self> {
        let create_error = |source| MirrorError::SnapshotCreate {
            volume: plan.origin.to_string(),
            source,
        };

        let provisioning = lvm
            .query_provisioning(plan.volume_group, plan.origin)
            .map_err(create_error)?;
        let request = SnapshotRequest::for_origin(
            plan.volume_group,
            plan.origin,
            plan.name,
            plan.size,
            provisioning,
        );
        lvm.create_snapshot(&request).map_err(create_error)?;

        let handle = SnapshotHandle::from_request(&request, provisioning);
        info!(
            "Created {:?} snapshot {:?} of {}",
            provisioning,
            handle.device_path,
            request.origin_path()
        );

        let mut lifecycle = Self {
            lvm,
            mounts,
            handle,
            state: SnapshotState::Absent,
            mount_point: None,
        };
        lifecycle.advance(SnapshotState::Created)?;
        Ok(lifecycle)
    }

    pub fn handle(&self) -> &SnapshotHandle {
        &self.handle
    }

    pub fn state(&self) -> SnapshotState {
        self.state
    }

    fn check(&self, next: SnapshotState) -> Result<()> {
        if self.state.can_advance_to(next) {
            Ok(())
        } else {
            Err(MirrorError::Lifecycle {
                from: self.state,
                to: next,
            })
        }
    }

    fn advance(&mut self, next: SnapshotState) -> Result<()> {
        self.check(next)?;
        self.state = next;
        Ok(())
    }

    /// Activate a thin snapshot; a no-op for thick ones.
    pub fn activate(&mut self) -> Result<()> {
        if !self.handle.needs_activation() {
            return Ok(());
        }
        self.check(SnapshotState::Activated)?;
        self.lvm
            .activate_snapshot(&self.handle)
            .map_err(|source| MirrorError::SnapshotActivate {
                device: self.handle.device_path.clone(),
                source,
            })?;
        self.advance(SnapshotState::Activated)
    }

    pub fn mount(&mut self, mount_point: &Path) -> Result<()> {
        self.check(SnapshotState::Mounted)?;
        self.mounts
            .mount_read_only(&self.handle.device_path, mount_point)
            .map_err(|source| MirrorError::Mount {
                device: self.handle.device_path.clone(),
                mount_point: mount_point.to_path_buf(),
                source,
            })?;
        self.mount_point = Some(mount_point.to_path_buf());
        self.advance(SnapshotState::Mounted)
    }

    pub fn unmount(&mut self) -> Result<()> {
        let Some(mount_point) = self.mount_point.clone() else {
            return Err(MirrorError::Lifecycle {
                from: self.state,
                to: SnapshotState::Unmounted,
            });
        };
        self.check(SnapshotState::Unmounted)?;
        self.mounts
            .unmount(&mount_point)
            .map_err(|source| MirrorError::Unmount {
                mount_point: mount_point.clone(),
                source,
            })?;
        self.mount_point = None;
        self.advance(SnapshotState::Unmounted)
    }

    /// Forcefully remove the snapshot. Consumes the lifecycle either way.
    pub fn destroy(mut self) -> Result<()> {
        self.check(SnapshotState::Destroyed)?;
        self.lvm
            .remove_snapshot(&self.handle)
            .map_err(|source| MirrorError::SnapshotDestroy {
                device: self.handle.device_path.clone(),
                source,
            })?;
        self.advance(SnapshotState::Destroyed)?;
        info!("Destroyed snapshot {:?}", self.handle.device_path);
        Ok(())
    }

    /// Unmount if mounted, then destroy.
    ///
    /// A failed unmount leaves the snapshot in place: removing a mounted
    /// device is unsafe.
    pub fn teardown(mut self) -> Result<()> {
        if self.state == SnapshotState::Mounted {
            if let Err(error) = self.unmount() {
                warn!(
                    "Leaving snapshot {:?} in place: {}",
                    self.handle.device_path, error
                );
                return Err(error);
            }
        }
        self.destroy()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use storage_testing::FakeHost;

    const PLAN: SnapshotPlan<'static> = SnapshotPlan {
        volume_group: "vg0",
        origin: "home",
        name: "mirror-snapshot",
        size: "5G",
    };

    #[test]
    fn thick_volume_skips_activation() {
        let host = FakeHost::new();
        let mut snapshot = SnapshotLifecycle::create(&host, &host, PLAN).unwrap();
        snapshot.activate().unwrap();
        snapshot.mount(Path::new("/mnt/snap")).unwrap();
        assert_eq!(snapshot.state(), SnapshotState::Mounted);
        snapshot.teardown().unwrap();

        assert_eq!(
            host.ledger().labels(),
            vec!["query", "create", "mount", "unmount", "destroy"]
        );
        assert!(host.live_snapshots().is_empty());
        assert_eq!(host.mounted(), None);
    }

    #[test]
    fn thin_volume_is_activated_without_size() {
        let host = FakeHost::new().with_thin_volume("home");
        let mut snapshot = SnapshotLifecycle::create(&host, &host, PLAN).unwrap();
        snapshot.activate().unwrap();
        assert_eq!(snapshot.state(), SnapshotState::Activated);
        snapshot.mount(Path::new("/mnt/snap")).unwrap();
        snapshot.teardown().unwrap();

        assert_eq!(
            host.ledger().labels(),
            vec!["query", "create", "activate", "mount", "unmount", "destroy"]
        );
        let calls = host.ledger().calls();
        assert!(calls.iter().any(|call| matches!(
            call,
            storage_testing::Call::CreateSnapshot { size: None, .. }
        )));
    }

    #[test]
    fn failed_create_leaves_nothing_behind() {
        let host = FakeHost::new().failing_create_for("home");
        let result = SnapshotLifecycle::create(&host, &host, PLAN);
        assert!(matches!(result, Err(MirrorError::SnapshotCreate { .. })));
        assert!(host.live_snapshots().is_empty());
    }

    #[test]
    fn unmounted_snapshot_is_destroyed_directly() {
        let host = FakeHost::new().failing_mount();
        let mut snapshot = SnapshotLifecycle::create(&host, &host, PLAN).unwrap();
        assert!(matches!(
            snapshot.mount(Path::new("/mnt/snap")),
            Err(MirrorError::Mount { .. })
        ));
        assert_eq!(snapshot.state(), SnapshotState::Created);
        snapshot.teardown().unwrap();

        assert_eq!(host.ledger().labels(), vec!["query", "create", "mount", "destroy"]);
        assert!(host.live_snapshots().is_empty());
    }

    #[test]
    fn failed_unmount_blocks_destroy() {
        let host = FakeHost::new().failing_unmount();
        let mut snapshot = SnapshotLifecycle::create(&host, &host, PLAN).unwrap();
        snapshot.mount(Path::new("/mnt/snap")).unwrap();
        let result = snapshot.teardown();

        assert!(matches!(result, Err(MirrorError::Unmount { .. })));
        assert_eq!(
            host.ledger().labels(),
            vec!["query", "create", "mount", "unmount"]
        );
        assert_eq!(host.live_snapshots().len(), 1);
    }

    #[test]
    fn mounting_twice_violates_lifecycle() {
        let host = FakeHost::new();
        let mut snapshot = SnapshotLifecycle::create(&host, &host, PLAN).unwrap();
        snapshot.mount(Path::new("/mnt/snap")).unwrap();
        assert!(matches!(
            snapshot.mount(Path::new("/mnt/snap")),
            Err(MirrorError::Lifecycle {
                from: SnapshotState::Mounted,
                to: SnapshotState::Mounted
            })
        ));
        snapshot.teardown().unwrap();
    }
}
