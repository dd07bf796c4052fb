// SPDX-License-Identifier: GPL-3.0-only

//! Canonical domain models for snapshot-bracketed volume mirroring
//!
//! These models are shared by every layer of the stack:
//!
//! - **storage-contracts**: adapter traits take and return these types
//! - **storage-sys**: renders them into command lines for the system tools
//! - **storage-mirror**: drives the per-volume pipeline over them
//!
//! ## Lifecycle
//!
//! A [`SnapshotRequest`] describes the snapshot to create. Once the volume
//! manager has created it, the pipeline holds a [`SnapshotHandle`] and walks
//! it through the [`SnapshotState`] transitions until it is destroyed.

pub mod excludes;
pub mod lvm;
pub mod transfer;
pub mod volume;

pub use excludes::{ExcludeEntry, ExcludeRegistry, MissingExcludeEntry};
pub use lvm::{SnapshotHandle, SnapshotRequest, SnapshotState, VolumeProvisioning};
pub use transfer::{RemoteTarget, TransferRequest};
pub use volume::{VolumeArg, VolumeArgError, normalize_volume_name};
