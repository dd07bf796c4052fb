//! LVM snapshot types
//!
//! Types for the transient snapshot taken of a logical volume before it is
//! mirrored.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// How a logical volume allocates its storage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VolumeProvisioning {
    /// Fully allocated volume; snapshots need an explicit copy-on-write size
    Thick,
    /// Thin pool volume; snapshots draw from the pool and are skipped on activation
    Thin,
}

impl VolumeProvisioning {
    pub fn is_thin(self) -> bool {
        self == Self::Thin
    }
}

/// Parameters for creating a snapshot of one logical volume
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotRequest {
    /// Volume group holding both the origin and the snapshot
    pub volume_group: String,

    /// Origin logical volume name
    pub origin: String,

    /// Name of the snapshot volume
    pub name: String,

    /// Copy-on-write size (e.g., "5G"); `None` for thin snapshots
    pub size: Option<String>,
}

impl SnapshotRequest {
    /// Build the request for an origin, dropping the size for thin volumes.
    pub fn for_origin(
        volume_group: &str,
        origin: &str,
        name: &str,
        size: &str,
        provisioning: VolumeProvisioning,
    ) -> Self {
        Self {
            volume_group: volume_group.to_string(),
            origin: origin.to_string(),
            name: name.to_string(),
            size: match provisioning {
                VolumeProvisioning::Thin => None,
                VolumeProvisioning::Thick => Some(size.to_string()),
            },
        }
    }

    /// `vg/lv` path of the origin as understood by the LVM tools
    pub fn origin_path(&self) -> String {
        format!("{}/{}", self.volume_group, self.origin)
    }
}

/// An active snapshot, owned by exactly one pipeline run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotHandle {
    pub volume_group: String,
    pub origin: String,
    pub name: String,

    /// Block device of the snapshot (e.g., "/dev/vg0/mirror-snapshot")
    pub device_path: PathBuf,

    pub provisioning: VolumeProvisioning,
}

impl SnapshotHandle {
    pub fn from_request(request: &SnapshotRequest, provisioning: VolumeProvisioning) -> Self {
        Self {
            volume_group: request.volume_group.clone(),
            origin: request.origin.clone(),
            name: request.name.clone(),
            device_path: PathBuf::from("/dev")
                .join(&request.volume_group)
                .join(&request.name),
            provisioning,
        }
    }

    /// `vg/snapshot` path as understood by the LVM tools
    pub fn lv_path(&self) -> String {
        format!("{}/{}", self.volume_group, self.name)
    }

    /// Thin snapshots carry the activation-skip flag and must be activated
    pub fn needs_activation(&self) -> bool {
        self.provisioning.is_thin()
    }
}

/// Lifecycle of a snapshot within a single pipeline run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SnapshotState {
    Absent,
    Created,
    Activated,
    Mounted,
    Unmounted,
    Destroyed,
}

impl SnapshotState {
    /// Whether `next` is a legal successor of this state.
    ///
    /// A snapshot that never reached `Mounted` may go straight to
    /// `Destroyed`; a mounted one must be unmounted first.
    pub fn can_advance_to(self, next: SnapshotState) -> bool {
        use SnapshotState::*;
        matches!(
            (self, next),
            (Absent, Created)
                | (Created, Activated)
                | (Created, Mounted)
                | (Created, Destroyed)
                | (Activated, Mounted)
                | (Activated, Destroyed)
                | (Mounted, Unmounted)
                | (Unmounted, Destroyed)
        )
    }
}

impl fmt::Display for SnapshotState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Absent => "absent",
            Self::Created => "created",
            Self::Activated => "activated",
            Self::Mounted => "mounted",
            Self::Unmounted => "unmounted",
            Self::Destroyed => "destroyed",
        };
        f.write_str(label)
    }
}
