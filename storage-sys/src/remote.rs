// SPDX-License-Identifier: GPL-3.0-only

//! Queries against the mirror host over the remote shell

use std::path::Path;

use storage_contracts::{RemoteOpsAdapter, StorageError, StorageErrorKind};
use storage_types::RemoteTarget;
use tracing::debug;

use crate::cmd;

/// Remote shell arguments that test for a directory.
///
/// The path is quoted because the remote shell re-parses the command line.
fn directory_test_args(remote: &RemoteTarget, path: &str) -> Vec<String> {
    let mut args: Vec<String> = remote.shell.iter().skip(1).cloned().collect();
    args.push(remote.host.clone());
    args.push("test".to_string());
    args.push("-d".to_string());
    args.push(shell_words::quote(path).into_owned());
    args
}

/// ssh-style remote shell; the program comes from the configured shell command
#[derive(Debug, Clone, Copy, Default)]
pub struct SshRemote;

impl RemoteOpsAdapter for SshRemote {
    fn directory_exists(&self, remote: &RemoteTarget, path: &str) -> Result<bool, StorageError> {
        let program = remote.shell.first().ok_or_else(|| {
            StorageError::new(StorageErrorKind::Internal, "remote shell command is empty")
        })?;

        let outcome = cmd::probe(Path::new(program), &directory_test_args(remote, path))?;
        match outcome.code {
            Some(0) => Ok(true),
            Some(1) => {
                debug!("{} reported no directory {}", remote.host, path);
                Ok(false)
            }
            _ => Err(StorageError::new(
                StorageErrorKind::Unavailable,
                format!(
                    "{} could not reach {}: {}",
                    outcome.command,
                    remote.host,
                    outcome.stderr.trim()
                ),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_remote_test_command() {
        let remote = RemoteTarget {
            host: "root@backup".to_string(),
            shell: vec!["ssh".to_string(), "-p".to_string(), "2222".to_string()],
        };
        let args = directory_test_args(&remote, "/srv/mirror/vg0/my home");
        assert_eq!(
            args,
            vec![
                "-p",
                "2222",
                "root@backup",
                "test",
                "-d",
                "'/srv/mirror/vg0/my home'"
            ]
        );
    }

    fn exiting_with(code: i32) -> RemoteTarget {
        RemoteTarget {
            host: "backup".to_string(),
            shell: vec![
                "sh".to_string(),
                "-c".to_string(),
                format!("echo unreachable >&2; exit {code}"),
                "_".to_string(),
            ],
        }
    }

    #[test]
    fn exit_status_decides_directory_presence() {
        let remote = SshRemote;
        assert!(remote.directory_exists(&exiting_with(0), "/srv").unwrap());
        assert!(!remote.directory_exists(&exiting_with(1), "/srv").unwrap());

        let error = remote.directory_exists(&exiting_with(255), "/srv").unwrap_err();
        assert_eq!(error.kind, StorageErrorKind::Unavailable);
        assert!(error.message.contains("unreachable"), "{}", error.message);
    }

    #[test]
    fn empty_shell_is_rejected() {
        let remote = RemoteTarget {
            host: "backup".to_string(),
            shell: Vec::new(),
        };
        let error = SshRemote.directory_exists(&remote, "/srv").unwrap_err();
        assert_eq!(error.kind, StorageErrorKind::Internal);
    }
}
