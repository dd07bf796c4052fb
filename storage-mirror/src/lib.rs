// SPDX-License-Identifier: GPL-3.0-only

//! Point-in-time mirroring of LVM logical volumes
//!
//! Each volume is copied from a transient snapshot: the snapshot is created,
//! mounted read-only, transferred to the mirror host with rsync, then
//! unmounted and destroyed. Configuration sources are processed one after
//! another and the first failure stops the run.

pub mod batch;
pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod pipeline;
pub mod progress;
pub mod snapshot;
pub mod sources;

pub use batch::{BatchDriver, BatchSummary};
pub use cli::{Invocation, ParsedArgs};
pub use config::{ConfigLayer, ConfigResolver, EffectiveConfig};
pub use error::{MirrorError, Result};
pub use pipeline::{SyncOutcome, Toolbox, VolumeSync};
pub use progress::Progress;
pub use snapshot::{SnapshotLifecycle, SnapshotPlan};
pub use sources::ConfigurationSource;
