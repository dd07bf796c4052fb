use std::path::PathBuf;

use storage_contracts::{LvmOpsAdapter, StorageError, StorageErrorKind};
use storage_types::{SnapshotHandle, SnapshotRequest, VolumeProvisioning};
use tracing::info;

use crate::{cmd, find_binary};

#[derive(Debug, Clone, PartialEq, Eq)]
struct LvRow {
    attr: String,
    segtype: String,
}

impl LvRow {
    fn provisioning(&self) -> VolumeProvisioning {
        if self.segtype == "thin" || self.attr.starts_with('V') {
            VolumeProvisioning::Thin
        } else {
            VolumeProvisioning::Thick
        }
    }
}

fn parse_tabbed_line(line: &str) -> Vec<String> {
    line.split('\t')
        .map(|part| part.trim().to_string())
        .collect()
}

fn parse_lv_row(output: &str) -> Option<LvRow> {
    output.lines().find_map(|line| {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }
        let cols = parse_tabbed_line(line);
        if cols.len() < 2 || cols[0].is_empty() {
            return None;
        }
        Some(LvRow {
            attr: cols[0].clone(),
            segtype: cols[1].clone(),
        })
    })
}

fn provisioning_query_args(volume_group: &str, volume: &str) -> Vec<String> {
    vec![
        "--noheadings".to_string(),
        "--separator".to_string(),
        "\t".to_string(),
        "-o".to_string(),
        "lv_attr,segtype".to_string(),
        format!("{volume_group}/{volume}"),
    ]
}

fn snapshot_create_args(request: &SnapshotRequest) -> Vec<String> {
    let mut args = vec![
        "--snapshot".to_string(),
        "--name".to_string(),
        request.name.clone(),
    ];
    if let Some(size) = &request.size {
        args.push("--size".to_string());
        args.push(size.clone());
    }
    args.push(request.origin_path());
    args
}

fn activation_args(snapshot: &SnapshotHandle) -> Vec<String> {
    vec![
        "--ignoreactivationskip".to_string(),
        "--activate".to_string(),
        "y".to_string(),
        snapshot.lv_path(),
    ]
}

fn removal_args(snapshot: &SnapshotHandle) -> Vec<String> {
    vec!["--force".to_string(), snapshot.lv_path()]
}

/// LVM CLI wrapper for snapshot operations
#[derive(Debug, Clone)]
pub struct LvmCli {
    lvs: PathBuf,
    lvcreate: PathBuf,
    lvchange: PathBuf,
    lvremove: PathBuf,
}

impl LvmCli {
    /// Returns an error if any of the LVM tools is not installed
    pub fn new() -> Result<Self, StorageError> {
        if !cfg!(feature = "lvm-tools") {
            return Err(StorageError::new(
                StorageErrorKind::Unavailable,
                "built without lvm-tools support",
            ));
        }

        Ok(Self {
            lvs: find_binary("lvs")?,
            lvcreate: find_binary("lvcreate")?,
            lvchange: find_binary("lvchange")?,
            lvremove: find_binary("lvremove")?,
        })
    }
}

impl LvmOpsAdapter for LvmCli {
    fn query_provisioning(
        &self,
        volume_group: &str,
        volume: &str,
    ) -> Result<VolumeProvisioning, StorageError> {
        let outcome = cmd::run(&self.lvs, &provisioning_query_args(volume_group, volume))?;
        let row = parse_lv_row(&outcome.stdout).ok_or_else(|| {
            StorageError::new(
                StorageErrorKind::InvalidOutput,
                format!(
                    "{}: no attributes reported for {volume_group}/{volume}",
                    outcome.command
                ),
            )
        })?;
        Ok(row.provisioning())
    }

    fn create_snapshot(&self, request: &SnapshotRequest) -> Result<(), StorageError> {
        info!(
            "Creating snapshot {}/{} of {}",
            request.volume_group,
            request.name,
            request.origin_path()
        );
        cmd::run(&self.lvcreate, &snapshot_create_args(request))?;
        Ok(())
    }

    fn activate_snapshot(&self, snapshot: &SnapshotHandle) -> Result<(), StorageError> {
        info!("Activating thin snapshot {}", snapshot.lv_path());
        cmd::run(&self.lvchange, &activation_args(snapshot))?;
        Ok(())
    }

    fn remove_snapshot(&self, snapshot: &SnapshotHandle) -> Result<(), StorageError> {
        info!("Removing snapshot {}", snapshot.lv_path());
        cmd::run(&self.lvremove, &removal_args(snapshot))?;
        Ok(())
    }
}
