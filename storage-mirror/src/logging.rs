// SPDX-License-Identifier: GPL-3.0-only

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::Layer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

static LOG_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

pub const LOG_FILE_ENV: &str = "LVM_MIRROR_LOG_FILE";
const DEFAULT_DIRECTIVES: &str = "storage_mirror=info,storage_sys=info,warn";

/// Log to stderr, and additionally to `$LVM_MIRROR_LOG_FILE` when set.
///
/// Stdout is left to the progress lines and the transfer tool.
pub fn init() {
    let env_filter = || {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVES))
    };

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_filter(env_filter());

    let Some(path) = std::env::var_os(LOG_FILE_ENV).map(PathBuf::from) else {
        tracing_subscriber::registry().with(stderr_layer).init();
        return;
    };

    match file_writer(&path) {
        Ok((writer, guard)) => {
            let file_layer = tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_target(true)
                .with_ansi(false)
                .with_filter(env_filter());

            tracing_subscriber::registry()
                .with(stderr_layer)
                .with(file_layer)
                .init();

            // Keep the background logging worker alive for the duration of the process.
            let _ = LOG_GUARD.set(guard);
        }
        Err(e) => {
            tracing_subscriber::registry().with(stderr_layer).init();
            tracing::warn!(
                "File logging to {} disabled, logging to stderr only: {}",
                path.display(),
                e
            );
        }
    }
}

fn file_writer(
    path: &Path,
) -> std::io::Result<(tracing_appender::non_blocking::NonBlocking, WorkerGuard)> {
    let (dir, file_name) = split_log_path(path).ok_or_else(|| {
        std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("{} does not name a file", path.display()),
        )
    })?;
    std::fs::create_dir_all(&dir)?;

    let appender = RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(file_name.to_string_lossy())
        .build(&dir)
        .map_err(std::io::Error::other)?;
    Ok(tracing_appender::non_blocking(appender))
}

fn split_log_path(path: &Path) -> Option<(PathBuf, PathBuf)> {
    let file_name = path.file_name()?;
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    Some((dir, PathBuf::from(file_name)))
}
