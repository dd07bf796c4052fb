// SPDX-License-Identifier: GPL-3.0-only

//! rsync transfer from the mounted snapshot to the mirror host

use std::path::PathBuf;

use storage_contracts::{StorageError, TransferOpsAdapter};
use storage_types::TransferRequest;
use tracing::info;

use crate::{cmd, find_binary};

fn transfer_args(request: &TransferRequest) -> Vec<String> {
    let mut args = request.args.clone();
    if request.dry_run {
        args.push("--dry-run".to_string());
    }
    args.push("-e".to_string());
    args.push(shell_words::join(&request.remote.shell));
    args.push(request.source_operand());
    args.push(request.destination_operand());
    args
}

/// rsync CLI wrapper
#[derive(Debug, Clone)]
pub struct RsyncCli {
    binary_path: PathBuf,
}

impl RsyncCli {
    /// Returns an error if rsync is not installed
    pub fn new() -> Result<Self, StorageError> {
        Ok(Self {
            binary_path: find_binary("rsync")?,
        })
    }
}

impl TransferOpsAdapter for RsyncCli {
    fn transfer(&self, request: &TransferRequest) -> Result<(), StorageError> {
        info!(
            "Transferring {} to {}{}",
            request.source_operand(),
            request.destination_operand(),
            if request.dry_run { " (dry run)" } else { "" }
        );
        cmd::run_inherited(&self.binary_path, &transfer_args(request))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use storage_types::RemoteTarget;

    fn request(dry_run: bool) -> TransferRequest {
        TransferRequest {
            source: PathBuf::from("/mnt/mirror-snapshot"),
            remote: RemoteTarget {
                host: "backup".to_string(),
                shell: vec![
                    "ssh".to_string(),
                    "-o".to_string(),
                    "BatchMode=yes".to_string(),
                ],
            },
            destination: "/srv/mirror/vg0/home".to_string(),
            args: vec!["--archive".to_string(), "--exclude=*.tmp".to_string()],
            dry_run,
        }
    }

    #[test]
    fn renders_full_transfer() {
        assert_eq!(
            transfer_args(&request(false)),
            vec![
                "--archive",
                "--exclude=*.tmp",
                "-e",
                "ssh -o BatchMode=yes",
                "/mnt/mirror-snapshot/",
                "backup:/srv/mirror/vg0/home/"
            ]
        );
    }

    #[test]
    fn dry_run_is_passed_through() {
        let args = transfer_args(&request(true));
        let dry_run = args.iter().position(|arg| arg == "--dry-run").unwrap();
        let shell = args.iter().position(|arg| arg == "-e").unwrap();
        assert!(dry_run < shell);
    }
}
