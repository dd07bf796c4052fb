// SPDX-License-Identifier: GPL-3.0-only

//! Per-volume transfer exclusion patterns

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One `[[exclude]]` entry from a configuration source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExcludeEntry {
    pub volume: String,
    #[serde(default)]
    pub patterns: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("no exclude entry registered for volume '{volume}'")]
pub struct MissingExcludeEntry {
    pub volume: String,
}

/// Ordered exclusion patterns keyed by volume name.
///
/// Append-only: patterns accumulate in insertion order across every
/// configuration layer, duplicates included.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExcludeRegistry {
    entries: BTreeMap<String, Vec<String>>,
}

impl ExcludeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append patterns to a volume's list, creating the list if absent.
    pub fn add_excludes<I, S>(&mut self, volume: &str, patterns: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.entries
            .entry(volume.to_string())
            .or_default()
            .extend(patterns.into_iter().map(Into::into));
    }

    /// Give every targeted volume at least an empty list.
    pub fn ensure_initialized<S: AsRef<str>>(&mut self, volumes: &[S]) {
        for volume in volumes {
            self.entries.entry(volume.as_ref().to_string()).or_default();
        }
    }

    /// Fail unless every targeted volume has an entry.
    pub fn check_initialized<S: AsRef<str>>(
        &self,
        volumes: &[S],
    ) -> Result<(), MissingExcludeEntry> {
        match volumes
            .iter()
            .find(|volume| !self.entries.contains_key(volume.as_ref()))
        {
            Some(volume) => Err(MissingExcludeEntry {
                volume: volume.as_ref().to_string(),
            }),
            None => Ok(()),
        }
    }

    /// Patterns for a volume, in insertion order; empty when unregistered.
    pub fn patterns_for(&self, volume: &str) -> &[String] {
        self.entries.get(volume).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Render one `--exclude=` flag per pattern, preserving order.
    pub fn render_flags(&self, volume: &str) -> Vec<String> {
        self.patterns_for(volume)
            .iter()
            .map(|pattern| format!("--exclude={pattern}"))
            .collect()
    }
}
