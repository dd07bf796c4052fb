// SPDX-License-Identifier: GPL-3.0-only

//! Configuration source discovery

use std::fmt;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::config::ConfigLayer;
use crate::error::{MirrorError, Result};

pub const DEFAULT_CONFIG_DIR: &str = "/etc/lvm-mirror";
pub const CONFIG_DIR_ENV: &str = "LVM_MIRROR_CONFIG_DIR";
pub const SINGLE_SOURCE_NAME: &str = "mirror.toml";
const POOL_SOURCE_PREFIX: &str = "mirror-";
const SOURCE_SUFFIX: &str = ".toml";

/// One batch item: an optional override file and the pool it is tied to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigurationSource {
    /// `None` when running on built-in defaults only
    pub path: Option<PathBuf>,

    /// Pool (volume group) derived from a `mirror-<pool>.toml` file name
    pub pool: Option<String>,
}

impl ConfigurationSource {
    pub fn defaults_only() -> Self {
        Self {
            path: None,
            pool: None,
        }
    }

    pub fn single(path: PathBuf) -> Self {
        Self { path: Some(path), pool: None }
    }

    pub fn for_pool(path: PathBuf, pool: impl Into<String>) -> Self {
        Self {
            path: Some(path),
            pool: Some(pool.into()),
        }
    }

    /// Name used for this source in diagnostics
    pub fn origin(&self) -> PathBuf {
        self.path
            .clone()
            .unwrap_or_else(|| PathBuf::from("built-in defaults"))
    }

    /// Override layers contributed by this source, in application order.
    pub fn layers(&self) -> Result<Vec<ConfigLayer>> {
        let mut layers = Vec::new();
        if let Some(pool) = &self.pool {
            layers.push(ConfigLayer::for_pool(pool));
        }
        if let Some(path) = &self.path {
            debug!("Loading configuration source {}", path.display());
            layers.push(ConfigLayer::load(path)?);
        }
        Ok(layers)
    }
}

impl fmt::Display for ConfigurationSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.path, &self.pool) {
            (Some(path), Some(pool)) => write!(f, "{} (pool {pool})", path.display()),
            (Some(path), None) => write!(f, "{}", path.display()),
            (None, _) => f.write_str("built-in defaults"),
        }
    }
}

/// Directory holding the configuration sources
pub fn config_dir() -> PathBuf {
    std::env::var_os(CONFIG_DIR_ENV)
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_DIR))
}

/// Find the sources to process.
///
/// `mirror.toml` alone if it exists, otherwise every `mirror-<pool>.toml` in
/// lexical order, otherwise the built-in defaults.
pub fn discover(dir: &Path) -> Result<Vec<ConfigurationSource>> {
    let single = dir.join(SINGLE_SOURCE_NAME);
    if single.is_file() {
        info!("Using configuration source {}", single.display());
        return Ok(vec![ConfigurationSource::single(single)]);
    }

    let pattern = format!(
        "{}/{POOL_SOURCE_PREFIX}*{SOURCE_SUFFIX}",
        glob::Pattern::escape(&dir.display().to_string())
    );
    let entries = glob::glob(&pattern).map_err(|error| MirrorError::Configuration {
        path: dir.to_path_buf(),
        reason: error.to_string(),
    })?;

    let mut sources = Vec::new();
    for entry in entries {
        let path = entry.map_err(|error| MirrorError::Configuration {
            path: error.path().to_path_buf(),
            reason: error.error().to_string(),
        })?;
        match pool_from_path(&path) {
            Some(pool) => sources.push(ConfigurationSource::for_pool(path, pool)),
            None => debug!("Skipping {}: no pool in file name", path.display()),
        }
    }

    if sources.is_empty() {
        info!(
            "No configuration sources in {}; using built-in defaults",
            dir.display()
        );
        return Ok(vec![ConfigurationSource::defaults_only()]);
    }

    info!("Found {} configuration sources in {}", sources.len(), dir.display());
    Ok(sources)
}

fn pool_from_path(path: &Path) -> Option<String> {
    let name = path.file_name()?.to_str()?;
    let pool = name
        .strip_prefix(POOL_SOURCE_PREFIX)?
        .strip_suffix(SOURCE_SUFFIX)?;
    if pool.is_empty() {
        None
    } else {
        Some(pool.to_string())
    }
}
