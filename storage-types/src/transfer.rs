// SPDX-License-Identifier: GPL-3.0-only

//! Transfer and remote shell types

use std::path::PathBuf;

/// The mirror host and how to reach it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteTarget {
    /// Hostname (or `user@host`) of the mirror
    pub host: String,

    /// Remote shell command split into words (e.g., `["ssh", "-p", "2222"]`)
    pub shell: Vec<String>,
}

/// One mirror transfer from a mounted snapshot to the remote destination
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferRequest {
    /// Local directory whose contents are mirrored (the snapshot mount point)
    pub source: PathBuf,

    pub remote: RemoteTarget,

    /// Destination directory on the remote host
    pub destination: String,

    /// Transfer tool flags, exclusion flags included
    pub args: Vec<String>,

    pub dry_run: bool,
}

impl TransferRequest {
    /// Source operand with a trailing separator so directory contents are copied
    pub fn source_operand(&self) -> String {
        format!("{}/", self.source.display().to_string().trim_end_matches('/'))
    }

    /// `host:path/` destination operand
    pub fn destination_operand(&self) -> String {
        format!(
            "{}:{}/",
            self.remote.host,
            self.destination.trim_end_matches('/')
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operands_mirror_directory_contents() {
        let request = TransferRequest {
            source: PathBuf::from("/mnt/mirror-snapshot"),
            remote: RemoteTarget {
                host: "backup".to_string(),
                shell: vec!["ssh".to_string()],
            },
            destination: "/srv/mirror/vg0/home/".to_string(),
            args: Vec::new(),
            dry_run: false,
        };

        assert_eq!(request.source_operand(), "/mnt/mirror-snapshot/");
        assert_eq!(request.destination_operand(), "backup:/srv/mirror/vg0/home/");
    }
}
