// SPDX-License-Identifier: GPL-3.0-only

//! Batch driver
//!
//! Runs the volume pipeline for every configuration source in turn. The
//! first failure of any kind aborts the whole batch; work already done for
//! earlier sources and volumes is kept.

use std::io::Write;

use tracing::{error, info};

use crate::cli::Invocation;
use crate::config::{ConfigResolver, EffectiveConfig};
use crate::error::Result;
use crate::pipeline::{Toolbox, VolumeSync};
use crate::progress::Progress;
use crate::sources::ConfigurationSource;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BatchSummary {
    pub sources_processed: usize,

    /// Sources none of the requested volumes applied to
    pub sources_skipped: usize,

    /// Destinations that were mirrored (or dry-run), in order
    pub mirrored: Vec<String>,
}

pub struct BatchDriver<'a, W: Write> {
    tools: Toolbox<'a>,
    progress: Progress<W>,
    summary: BatchSummary,
}

impl<'a, W: Write> BatchDriver<'a, W> {
    pub fn new(tools: Toolbox<'a>, progress: Progress<W>) -> Self {
        Self {
            tools,
            progress,
            summary: BatchSummary::default(),
        }
    }

    /// Work done by the last run, including a run that aborted
    pub fn summary(&self) -> &BatchSummary {
        &self.summary
    }

    pub fn into_progress(self) -> Progress<W> {
        self.progress
    }

    pub fn run(
        &mut self,
        sources: &[ConfigurationSource],
        invocation: &Invocation,
    ) -> Result<BatchSummary> {
        let mut summary = BatchSummary::default();
        for source in sources {
            let result = self.run_source(source, invocation, &mut summary);
            self.summary = summary.clone();
            if let Err(err) = result {
                error!(
                    "Configuration source {} failed after {} volume(s) mirrored: {}",
                    source,
                    summary.mirrored.len(),
                    err
                );
                return Err(err);
            }
        }

        info!(
            "Batch complete: {} source(s) processed, {} skipped, {} volume(s) mirrored",
            summary.sources_processed,
            summary.sources_skipped,
            summary.mirrored.len()
        );
        Ok(summary)
    }

    fn run_source(
        &mut self,
        source: &ConfigurationSource,
        invocation: &Invocation,
        summary: &mut BatchSummary,
    ) -> Result<()> {
        let requested = invocation.volumes_for(source.pool.as_deref());
        if invocation.has_volumes() && requested.is_empty() {
            info!("Skipping {}: no requested volume applies", source);
            summary.sources_skipped += 1;
            return Ok(());
        }

        let config = resolve(source, invocation.dry_run, &requested)?;
        config.excludes.check_initialized(&config.volumes)?;

        info!(
            "Mirroring {:?} from {} to {}:{}{}",
            config.volumes,
            config.volume_group,
            config.remote.host,
            config.destination_for(""),
            if config.dry_run { " (dry run)" } else { "" }
        );

        let pipeline = VolumeSync::new(&config, self.tools);
        for volume in &config.volumes {
            self.progress.begin_volume(volume)?;
            let outcome = pipeline.run(volume)?;
            summary.mirrored.push(outcome.destination);
            if let Some(cleanup_error) = outcome.cleanup_error {
                return Err(cleanup_error);
            }
        }

        summary.sources_processed += 1;
        Ok(())
    }
}

/// Defaults, then the source's layers, then the command line.
pub fn resolve(
    source: &ConfigurationSource,
    dry_run: bool,
    volumes: &[String],
) -> Result<EffectiveConfig> {
    let mut resolver = ConfigResolver::new(source.origin());
    for layer in source.layers()? {
        resolver = resolver.layer(&layer);
    }
    resolver.command_line(dry_run, volumes).resolve()
}
