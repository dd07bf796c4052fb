// SPDX-License-Identifier: GPL-3.0-only

//! Volume sync pipeline
//!
//! For one volume: check the remote destination, snapshot, mount, transfer,
//! then unmount and destroy. Volumes are processed one at a time; the shared
//! mount point is never used by two runs at once.

use storage_contracts::{LvmOpsAdapter, MountOpsAdapter, RemoteOpsAdapter, TransferOpsAdapter};
use storage_types::{TransferRequest, normalize_volume_name};
use tracing::{info, warn};

use crate::config::EffectiveConfig;
use crate::error::{MirrorError, Result};
use crate::snapshot::{SnapshotLifecycle, SnapshotPlan};

/// The external collaborators a pipeline run talks to
#[derive(Clone, Copy)]
pub struct Toolbox<'a> {
    pub lvm: &'a dyn LvmOpsAdapter,
    pub mounts: &'a dyn MountOpsAdapter,
    pub remote: &'a dyn RemoteOpsAdapter,
    pub transfer: &'a dyn TransferOpsAdapter,
}

impl<'a> Toolbox<'a> {
    /// Use one value for every collaborator.
    pub fn from_host<H>(host: &'a H) -> Self
    where
        H: LvmOpsAdapter + MountOpsAdapter + RemoteOpsAdapter + TransferOpsAdapter,
    {
        Self {
            lvm: host,
            mounts: host,
            remote: host,
            transfer: host,
        }
    }
}

/// Result of a volume whose transfer succeeded
#[derive(Debug)]
pub struct SyncOutcome {
    pub volume: String,
    pub destination: String,

    /// Unmount or destroy failure after the transfer completed. The transfer
    /// still counts as successful, but the snapshot or mount is left behind.
    pub cleanup_error: Option<MirrorError>,
}

pub struct VolumeSync<'a> {
    config: &'a EffectiveConfig,
    tools: Toolbox<'a>,
}

impl<'a> VolumeSync<'a> {
    pub fn new(config: &'a EffectiveConfig, tools: Toolbox<'a>) -> Self {
        Self { config, tools }
    }

    pub fn run(&self, volume: &str) -> Result<SyncOutcome> {
        let volume = normalize_volume_name(volume);
        if volume.is_empty() {
            return Err(MirrorError::Argument("empty volume name".to_string()));
        }
        self.config.excludes.check_initialized(&[volume])?;

        let destination = self.config.destination_for(volume);
        self.check_destination(&destination)?;

        let request = TransferRequest {
            source: self.config.mount_point.clone(),
            remote: self.config.remote.clone(),
            destination: destination.clone(),
            args: self.config.transfer_args_for(volume),
            dry_run: self.config.dry_run,
        };

        let mut snapshot = SnapshotLifecycle::create(
            self.tools.lvm,
            self.tools.mounts,
            SnapshotPlan {
                volume_group: &self.config.volume_group,
                origin: volume,
                name: &self.config.snapshot_name,
                size: &self.config.snapshot_size,
            },
        )?;

        let transferred = snapshot
            .activate()
            .and_then(|()| snapshot.mount(&self.config.mount_point))
            .and_then(|()| {
                self.tools
                    .transfer
                    .transfer(&request)
                    .map_err(|source| MirrorError::Transfer {
                        volume: volume.to_string(),
                        source,
                    })
            });

        let cleanup = snapshot.teardown();

        match (transferred, cleanup) {
            (Err(error), Err(cleanup_error)) => {
                warn!(
                    "Cleanup after failed run of {} also failed: {}",
                    volume, cleanup_error
                );
                Err(error)
            }
            (Err(error), Ok(())) => Err(error),
            (Ok(()), cleanup) => {
                let cleanup_error = cleanup.err();
                match &cleanup_error {
                    Some(error) => warn!("{} mirrored but cleanup failed: {}", volume, error),
                    None => info!("{} mirrored to {}", volume, destination),
                }
                Ok(SyncOutcome {
                    volume: volume.to_string(),
                    destination,
                    cleanup_error,
                })
            }
        }
    }

    fn check_destination(&self, destination: &str) -> Result<()> {
        let remote = &self.config.remote;
        let exists = self
            .tools
            .remote
            .directory_exists(remote, destination)
            .map_err(|source| MirrorError::Remote {
                host: remote.host.clone(),
                source,
            })?;
        if !exists {
            return Err(MirrorError::DestinationMissing {
                host: remote.host.clone(),
                path: destination.to_string(),
            });
        }
        Ok(())
    }
}
