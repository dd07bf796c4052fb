// SPDX-License-Identifier: GPL-3.0-only

//! lvm-mirror - mirror LVM logical volumes to a remote host from snapshots

use std::process::ExitCode;

use anyhow::Result;
use storage_mirror::{
    BatchDriver, BatchSummary, Invocation, MirrorError, ParsedArgs, Progress, Toolbox, logging,
    sources,
};
use storage_sys::SystemTools;

fn main() -> ExitCode {
    let invocation = match Invocation::parse_from(std::env::args_os()) {
        Ok(ParsedArgs::Run(invocation)) => invocation,
        Ok(ParsedArgs::Informational(info)) => info.exit(),
        Err(error) => {
            eprintln!("lvm-mirror: {error}");
            return ExitCode::FAILURE;
        }
    };

    logging::init();

    match run(&invocation) {
        Ok(_) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("lvm-mirror: {error:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(invocation: &Invocation) -> Result<BatchSummary> {
    tracing::info!("Starting lvm-mirror v{}", env!("CARGO_PKG_VERSION"));

    if unsafe { libc::geteuid() } != 0 {
        return Err(MirrorError::PrivilegeRequired.into());
    }

    let tools = SystemTools::discover().map_err(MirrorError::ToolMissing)?;
    let toolbox = Toolbox {
        lvm: &tools.lvm,
        mounts: &tools.mounts,
        remote: &tools.remote,
        transfer: &tools.transfer,
    };

    let config_dir = sources::config_dir();
    let sources = sources::discover(&config_dir)?;

    let mut driver = BatchDriver::new(toolbox, Progress::stdout());
    Ok(driver.run(&sources, invocation)?)
}
