// SPDX-License-Identifier: GPL-3.0-only

//! Subprocess execution shared by every tool wrapper

use std::path::Path;
use std::process::{Command, Stdio};

use storage_contracts::StorageError;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct CommandOutcome {
    pub command: String,
    /// Exit code; `None` when the process was killed by a signal
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutcome {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

pub fn render(program: &Path, args: &[String]) -> String {
    let program = program
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| program.display().to_string());
    if args.is_empty() {
        program
    } else {
        format!("{} {}", program, shell_words::join(args))
    }
}

/// Run to completion and capture output without judging the exit status.
pub fn probe(program: &Path, args: &[String]) -> Result<CommandOutcome, StorageError> {
    let rendered = render(program, args);
    debug!("Running {}", rendered);

    let output = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .output()
        .map_err(|error| {
            let mut error = StorageError::from(error);
            error.message = format!("failed to execute {rendered}: {}", error.message);
            error
        })?;

    Ok(CommandOutcome {
        command: rendered,
        code: output.status.code(),
        stdout: String::from_utf8_lossy(&output.stdout).to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
    })
}

/// Run to completion, failing on a non-zero exit.
pub fn run(program: &Path, args: &[String]) -> Result<CommandOutcome, StorageError> {
    let outcome = probe(program, args)?;
    if !outcome.success() {
        return Err(StorageError::command_failed(
            &outcome.command,
            &outcome.stderr,
        ));
    }
    Ok(outcome)
}

/// Run with the terminal attached so the tool's own progress reaches the operator.
pub fn run_inherited(program: &Path, args: &[String]) -> Result<(), StorageError> {
    let rendered = render(program, args);
    debug!("Running {}", rendered);

    let status = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .status()
        .map_err(|error| {
            let mut error = StorageError::from(error);
            error.message = format!("failed to execute {rendered}: {}", error.message);
            error
        })?;

    if !status.success() {
        let reason = match status.code() {
            Some(code) => format!("exited with status {code}"),
            None => "terminated by signal".to_string(),
        };
        return Err(StorageError::command_failed(&rendered, &reason));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{probe, render, run, run_inherited};
    use std::path::Path;
    use storage_contracts::StorageErrorKind;

    fn shell(script: &str) -> Vec<String> {
        vec!["-c".to_string(), script.to_string()]
    }

    #[test]
    fn formats_command_context() {
        let args = vec![
            "--snapshot".to_string(),
            "--name".to_string(),
            "mirror snapshot".to_string(),
        ];
        let rendered = render(Path::new("/usr/sbin/lvcreate"), &args);
        assert_eq!(rendered, "lvcreate --snapshot --name 'mirror snapshot'");
    }

    #[test]
    fn formats_bare_command() {
        assert_eq!(render(Path::new("umount"), &[]), "umount");
    }

    #[test]
    fn inherited_run_reports_exit_status() {
        assert!(run_inherited(Path::new("sh"), &shell("exit 0")).is_ok());

        let error = run_inherited(Path::new("sh"), &shell("exit 23")).unwrap_err();
        assert_eq!(error.kind, StorageErrorKind::CommandFailed);
        assert!(error.message.contains("exited with status 23"), "{}", error.message);
    }

    #[test]
    fn captured_run_fails_on_nonzero_exit() {
        let outcome = probe(Path::new("sh"), &shell("echo out; exit 3")).unwrap();
        assert_eq!(outcome.code, Some(3));
        assert_eq!(outcome.stdout, "out\n");

        let error = run(Path::new("sh"), &shell("echo nope >&2; exit 3")).unwrap_err();
        assert_eq!(error.kind, StorageErrorKind::CommandFailed);
        assert!(error.message.ends_with("nope"), "{}", error.message);
    }

    #[test]
    fn missing_program_is_not_found() {
        let error = probe(Path::new("/nonexistent/lvm-mirror-tool"), &[]).unwrap_err();
        assert_eq!(error.kind, StorageErrorKind::NotFound);
    }
}
