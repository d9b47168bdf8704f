//! Command entry points invoked from the parsed CLI

mod build;
mod start;

pub use build::build_command;
pub use start::start_command;
pub use test::test_command;

use std::sync::Arc;

use anyhow::{Context as _, Result};
use serde_json::{Map, Value};
use tracing::debug;

use qwerboom_core::{
    CommandModule, CommandOutcome, Context, ContextOptions, PluginSpec, RunOptions,
};

use crate::plugins::web_app_plugin;

/// Build the orchestrator for one invocation, wire up the command driver,
/// and report the outcome
pub(crate) fn run(
    command: &str,
    args: Map<String, Value>,
    options: RunOptions,
    driver: Arc<dyn CommandModule>,
) -> Result<()> {
    let root_dir = std::env::current_dir().context("failed to resolve current directory")?;

    let mut context_options = ContextOptions::new(command, root_dir);
    context_options.args = args;
    let mut ctx = Context::new(context_options.plugin(PluginSpec::inline(web_app_plugin)))
        .context("failed to construct build context")?;
    ctx.register_command_module(command, driver);

    match ctx.run(&options)? {
        CommandOutcome::Ejected(configs) => {
            println!("{}", serde_json::to_string_pretty(&Value::Array(configs))?);
        }
        CommandOutcome::Finished(result) => {
            debug!("{} finished: {}", command, result);
        }
    }
    Ok(())
}

/// Common flags shared by every command, inserted only when given so the
/// option check stays meaningful
pub(crate) fn base_args(config: Option<&str>, mode: Option<&str>) -> Map<String, Value> {
    let mut args = Map::new();
    if let Some(config) = config {
        args.insert("config".into(), Value::String(config.to_string()));
    }
    if let Some(mode) = mode {
        args.insert("mode".into(), Value::String(mode.to_string()));
    }
    args
}
