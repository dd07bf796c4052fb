// SPDX-License-Identifier: GPL-3.0-only

//! One adapter per external collaborator.
//!
//! Every call is synchronous and blocking; the pipeline waits for each to
//! finish before moving on.

pub mod lvm;
pub mod mount;
pub mod remote;
pub mod transfer;

pub use lvm::LvmOpsAdapter;
pub use mount::MountOpsAdapter;
pub use remote::RemoteOpsAdapter;
pub use transfer::TransferOpsAdapter;
