// SPDX-License-Identifier: GPL-3.0-only

use std::ffi::OsString;

use clap::Parser;
use storage_types::VolumeArg;

use crate::error::{MirrorError, Result};

#[derive(Debug, Parser)]
#[command(name = "lvm-mirror", version)]
#[command(about = "Mirror LVM logical volumes to a remote host from point-in-time snapshots")]
struct MirrorCli {
    /// Dry run: passed through to the transfer tool, snapshots are still taken
    #[arg(short = 'n')]
    dry_run: bool,

    /// Volumes to mirror instead of the configured list; `POOL:VOLUME`
    /// restricts a volume to the configuration source of that pool
    #[arg(value_name = "VOLUME")]
    volumes: Vec<String>,
}

/// What the operator asked for on the command line
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Invocation {
    pub dry_run: bool,
    pub volumes: Vec<VolumeArg>,
}

/// Outcome of parsing the command line
#[derive(Debug)]
pub enum ParsedArgs {
    Run(Invocation),
    /// `--help` or `--version`; print and exit successfully
    Informational(clap::Error),
}

impl Invocation {
    pub fn parse_from<I, T>(args: I) -> Result<ParsedArgs>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let cli = match MirrorCli::try_parse_from(args) {
            Ok(cli) => cli,
            Err(error) if !error.use_stderr() => return Ok(ParsedArgs::Informational(error)),
            Err(error) => return Err(argument_error(&error)),
        };

        let volumes = cli
            .volumes
            .iter()
            .map(|raw| {
                raw.parse::<VolumeArg>()
                    .map_err(|error| MirrorError::Argument(error.to_string()))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(ParsedArgs::Run(Self {
            dry_run: cli.dry_run,
            volumes,
        }))
    }

    /// Whether any positional volume arguments were given
    pub fn has_volumes(&self) -> bool {
        !self.volumes.is_empty()
    }

    /// Volume names that apply to a source associated with `pool`.
    pub fn volumes_for(&self, pool: Option<&str>) -> Vec<String> {
        self.volumes
            .iter()
            .filter(|arg| arg.applies_to(pool))
            .map(|arg| arg.volume.clone())
            .collect()
    }
}

fn argument_error(error: &clap::Error) -> MirrorError {
    let rendered = error.render().to_string();
    let first_line = rendered
        .lines()
        .find(|line| !line.trim().is_empty())
        .unwrap_or("unrecognized arguments");
    MirrorError::Argument(first_line.trim_start_matches("error: ").to_string())
}
