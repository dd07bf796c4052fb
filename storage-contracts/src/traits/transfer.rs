// SPDX-License-Identifier: GPL-3.0-only

use storage_types::TransferRequest;

use crate::StorageError;

/// The file synchronization tool
pub trait TransferOpsAdapter {
    fn transfer(&self, request: &TransferRequest) -> Result<(), StorageError>;
}
