use std::sync::Arc;

use anyhow::Result;
use serde_json::Value;
use tracing::debug;

use qwerboom_core::RunOptions;

use super::{base_args, run};
use crate::backend::ProcessBackend;
use crate::drivers::StartDriver;

pub fn start_command(
    port: Option<u16>,
    host: Option<&str>,
    https: bool,
    config: Option<&str>,
    mode: Option<&str>,
    eject: bool,
) -> Result<()> {
    let mut args = base_args(config, mode);
    if let Some(port) = port {
        args.insert("port".into(), Value::from(port));
    }
    if let Some(host) = host {
        args.insert("host".into(), Value::String(host.to_string()));
    }
    if https {
        args.insert("https".into(), Value::Bool(true));
    }
    debug!("start args: {:?}", args);

    let driver = StartDriver::new(ProcessBackend::from_cwd()?);
    run("start", args, RunOptions { eject }, Arc::new(driver))
}
