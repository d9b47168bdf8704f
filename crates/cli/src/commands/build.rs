use std::sync::Arc;

use anyhow::Result;
use tracing::debug;

use qwerboom_core::RunOptions;

use super::{base_args, run};
use crate::backend::ProcessBackend;
use crate::drivers::BuildDriver;

pub fn build_command(config: Option<&str>, mode: Option<&str>, eject: bool) -> Result<()> {
    let args = base_args(config, mode);
    debug!("build args: {:?}", args);

    let driver = BuildDriver::new(ProcessBackend::from_cwd()?);
    run("build", args, RunOptions { eject }, Arc::new(driver))
}
