// SPDX-License-Identifier: GPL-3.0-only

//! Logical volume names as supplied by operators

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Strip leading and trailing path separators.
///
/// Operators may pass mount-style paths (`/home/`) where a volume name
/// (`home`) is meant.
pub fn normalize_volume_name(raw: &str) -> &str {
    raw.trim_matches('/')
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VolumeArgError {
    #[error("volume argument must not be empty")]
    Empty,
    #[error("'{0}' looks like a flag, not a volume")]
    FlagLike(String),
    #[error("'{0}' has an empty pool tag")]
    EmptyPool(String),
}

/// A volume argument from the command line, optionally tagged `pool:volume`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VolumeArg {
    /// Pool (volume group) the argument is restricted to, if tagged
    pub pool: Option<String>,

    /// Normalized volume name
    pub volume: String,
}

impl VolumeArg {
    /// Whether this argument targets a source associated with `pool`.
    ///
    /// Untagged arguments apply everywhere, and a source without a pool
    /// accepts every argument.
    pub fn applies_to(&self, pool: Option<&str>) -> bool {
        match (self.pool.as_deref(), pool) {
            (None, _) | (_, None) => true,
            (Some(tag), Some(pool)) => tag == pool,
        }
    }
}

impl FromStr for VolumeArg {
    type Err = VolumeArgError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        if raw.starts_with('-') {
            return Err(VolumeArgError::FlagLike(raw.to_string()));
        }

        let (pool, volume) = match raw.split_once(':') {
            Some((pool, _)) if pool.is_empty() => {
                return Err(VolumeArgError::EmptyPool(raw.to_string()));
            }
            Some((pool, volume)) => (Some(pool.to_string()), volume),
            None => (None, raw),
        };

        let volume = normalize_volume_name(volume);
        if volume.is_empty() {
            return Err(VolumeArgError::Empty);
        }

        Ok(Self {
            pool,
            volume: volume.to_string(),
        })
    }
}

impl fmt::Display for VolumeArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.pool {
            Some(pool) => write!(f, "{pool}:{}", self.volume),
            None => f.write_str(&self.volume),
        }
    }
}
