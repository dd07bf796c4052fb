// SPDX-License-Identifier: GPL-3.0-only

//! Configuration resolution
//!
//! An [`EffectiveConfig`] is built once per configuration source by applying,
//! in order: the built-in defaults, the source's pool, the source file, and
//! the command line. It is never modified after [`ConfigResolver::resolve`]
//! returns it.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use storage_types::{ExcludeEntry, ExcludeRegistry, RemoteTarget, normalize_volume_name};
use tracing::debug;

use crate::error::{MirrorError, Result};

pub const DEFAULT_REMOTE_HOST: &str = "backup";
pub const DEFAULT_REMOTE_SHELL: &str = "ssh";
pub const DEFAULT_VOLUME_GROUP: &str = "vg0";
pub const DEFAULT_SNAPSHOT_NAME: &str = "mirror-snapshot";
pub const DEFAULT_SNAPSHOT_SIZE: &str = "5G";
pub const DEFAULT_BACKUP_ROOT: &str = "/srv/mirror";
pub const DEFAULT_MOUNT_POINT: &str = "/mnt/mirror-snapshot";
pub const DEFAULT_VOLUMES: &[&str] = &["root", "home"];
pub const DEFAULT_TRANSFER_ARGS: &[&str] = &[
    "--archive",
    "--hard-links",
    "--acls",
    "--xattrs",
    "--numeric-ids",
    "--one-file-system",
    "--delete",
    "--stats",
    "--human-readable",
];

/// One layer of overrides, as written in a configuration source.
///
/// Unknown keys are kept in `extra` and otherwise ignored, so operators can
/// keep their own variables alongside the recognized ones.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ConfigLayer {
    pub remote_host: Option<String>,
    pub remote_shell: Option<String>,
    pub volume_group: Option<String>,
    pub snapshot_name: Option<String>,
    pub snapshot_size: Option<String>,
    pub backup_root: Option<String>,
    pub destination_subdir: Option<String>,
    pub mount_point: Option<PathBuf>,

    /// Replaces the volume list of earlier layers
    pub volumes: Option<Vec<String>>,

    /// Appended to the transfer arguments of earlier layers
    #[serde(default)]
    pub transfer_args: Vec<String>,

    /// Accumulated into the exclude registry in order
    #[serde(default, rename = "exclude")]
    pub excludes: Vec<ExcludeEntry>,

    #[serde(flatten)]
    pub extra: BTreeMap<String, toml::Value>,
}

impl ConfigLayer {
    pub fn parse(raw: &str, path: &Path) -> Result<Self> {
        let layer: Self = toml::from_str(raw).map_err(|error| MirrorError::Configuration {
            path: path.to_path_buf(),
            reason: error.to_string(),
        })?;
        if !layer.extra.is_empty() {
            debug!(
                "{}: ignoring unrecognized keys {:?}",
                path.display(),
                layer.extra.keys().collect::<Vec<_>>()
            );
        }
        Ok(layer)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path).map_err(|error| MirrorError::Configuration {
            path: path.to_path_buf(),
            reason: error.to_string(),
        })?;
        Self::parse(&raw, path)
    }

    /// Layer that only selects the volume group, used for pool-tagged sources
    pub fn for_pool(pool: &str) -> Self {
        Self {
            volume_group: Some(pool.to_string()),
            ..Self::default()
        }
    }
}

/// Fully resolved settings for one configuration source
#[derive(Debug, Clone, PartialEq)]
pub struct EffectiveConfig {
    pub remote: RemoteTarget,
    pub volume_group: String,
    pub snapshot_name: String,
    pub snapshot_size: String,
    pub backup_root: String,
    pub destination_subdir: String,
    pub mount_point: PathBuf,

    /// Ordered, duplicate-free, never empty
    pub volumes: Vec<String>,

    pub transfer_args: Vec<String>,

    /// Has an entry for every volume in `volumes`
    pub excludes: ExcludeRegistry,

    pub dry_run: bool,
}

impl EffectiveConfig {
    /// `backup_root/destination_subdir/volume` on the remote host
    ///
    /// Always absolute; a root of `/` does not collapse into a relative path.
    pub fn destination_for(&self, volume: &str) -> String {
        let mut destination = self.backup_root.trim_end_matches('/').to_string();
        for part in [self.destination_subdir.trim_matches('/'), volume] {
            if !part.is_empty() {
                destination.push('/');
                destination.push_str(part);
            }
        }
        if destination.is_empty() {
            destination.push('/');
        }
        destination
    }

    /// Base transfer arguments followed by one exclusion flag per pattern
    pub fn transfer_args_for(&self, volume: &str) -> Vec<String> {
        let mut args = self.transfer_args.clone();
        args.extend(self.excludes.render_flags(volume));
        args
    }
}

/// Applies override layers on top of the built-in defaults.
#[derive(Debug, Clone)]
pub struct ConfigResolver {
    origin: PathBuf,
    remote_host: String,
    remote_shell: String,
    volume_group: String,
    snapshot_name: String,
    snapshot_size: String,
    backup_root: String,
    destination_subdir: Option<String>,
    mount_point: PathBuf,
    volumes: Vec<String>,
    transfer_args: Vec<String>,
    excludes: ExcludeRegistry,
    dry_run: bool,
}

impl ConfigResolver {
    /// Start from the built-in defaults. `origin` names the configuration
    /// source in diagnostics.
    pub fn new(origin: impl Into<PathBuf>) -> Self {
        Self {
            origin: origin.into(),
            remote_host: DEFAULT_REMOTE_HOST.to_string(),
            remote_shell: DEFAULT_REMOTE_SHELL.to_string(),
            volume_group: DEFAULT_VOLUME_GROUP.to_string(),
            snapshot_name: DEFAULT_SNAPSHOT_NAME.to_string(),
            snapshot_size: DEFAULT_SNAPSHOT_SIZE.to_string(),
            backup_root: DEFAULT_BACKUP_ROOT.to_string(),
            destination_subdir: None,
            mount_point: PathBuf::from(DEFAULT_MOUNT_POINT),
            volumes: DEFAULT_VOLUMES.iter().map(|v| v.to_string()).collect(),
            transfer_args: DEFAULT_TRANSFER_ARGS.iter().map(|a| a.to_string()).collect(),
            excludes: ExcludeRegistry::new(),
            dry_run: false,
        }
    }

    pub fn layer(mut self, layer: &ConfigLayer) -> Self {
        fn set<T: Clone>(target: &mut T, value: &Option<T>) {
            if let Some(value) = value {
                *target = value.clone();
            }
        }

        set(&mut self.remote_host, &layer.remote_host);
        set(&mut self.remote_shell, &layer.remote_shell);
        set(&mut self.volume_group, &layer.volume_group);
        set(&mut self.snapshot_name, &layer.snapshot_name);
        set(&mut self.snapshot_size, &layer.snapshot_size);
        set(&mut self.backup_root, &layer.backup_root);
        set(&mut self.mount_point, &layer.mount_point);
        set(&mut self.volumes, &layer.volumes);
        if layer.destination_subdir.is_some() {
            self.destination_subdir = layer.destination_subdir.clone();
        }

        self.transfer_args.extend(layer.transfer_args.iter().cloned());
        for entry in &layer.excludes {
            self.excludes
                .add_excludes(normalize_volume_name(&entry.volume), &entry.patterns);
        }
        self
    }

    /// Apply the command line: the dry-run flag, and positional volumes
    /// which replace the list entirely when present.
    pub fn command_line(mut self, dry_run: bool, volumes: &[String]) -> Self {
        self.dry_run = dry_run;
        if !volumes.is_empty() {
            self.volumes = volumes.to_vec();
        }
        self
    }

    pub fn resolve(self) -> Result<EffectiveConfig> {
        let invalid = |reason: String| MirrorError::Configuration {
            path: self.origin.clone(),
            reason,
        };

        let mut volumes: Vec<String> = Vec::with_capacity(self.volumes.len());
        for raw in &self.volumes {
            let volume = normalize_volume_name(raw);
            if volume.is_empty() || volume.contains('/') {
                return Err(invalid(format!("invalid volume name '{raw}'")));
            }
            if !volumes.iter().any(|known| known == volume) {
                volumes.push(volume.to_string());
            }
        }
        if volumes.is_empty() {
            return Err(invalid("no volumes to mirror".to_string()));
        }

        for (key, value) in [
            ("remote_host", &self.remote_host),
            ("volume_group", &self.volume_group),
            ("snapshot_name", &self.snapshot_name),
            ("snapshot_size", &self.snapshot_size),
            ("backup_root", &self.backup_root),
        ] {
            if value.trim().is_empty() {
                return Err(invalid(format!("{key} must not be empty")));
            }
        }
        if !self.backup_root.starts_with('/') {
            return Err(invalid(format!(
                "backup_root {} must be absolute",
                self.backup_root
            )));
        }
        if !self.mount_point.is_absolute() {
            return Err(invalid(format!(
                "mount_point {} must be absolute",
                self.mount_point.display()
            )));
        }

        let shell = shell_words::split(&self.remote_shell)
            .map_err(|error| invalid(format!("remote_shell: {error}")))?;
        if shell.is_empty() {
            return Err(invalid("remote_shell must name a command".to_string()));
        }

        let mut excludes = self.excludes.clone();
        excludes.ensure_initialized(&volumes);

        Ok(EffectiveConfig {
            remote: RemoteTarget {
                host: self.remote_host.clone(),
                shell,
            },
            destination_subdir: self
                .destination_subdir
                .clone()
                .unwrap_or_else(|| self.volume_group.clone()),
            volume_group: self.volume_group.clone(),
            snapshot_name: self.snapshot_name.clone(),
            snapshot_size: self.snapshot_size.clone(),
            backup_root: self.backup_root.clone(),
            mount_point: self.mount_point.clone(),
            volumes,
            transfer_args: self.transfer_args.clone(),
            excludes,
            dry_run: self.dry_run,
        })
    }
}
