//! Command drivers: the dev-server, production-build, and test-runner
//! modules dispatched by the orchestrator
//!
//! Drivers own the backend handle and fire the lifecycle hook checkpoints
//! around each backend invocation.

mod build;
mod start;
mod test;

pub use build::BuildDriver;
pub use start::StartDriver;
pub use test::TestDriver;

use qwerboom_core::{Context, Error, Result};
use serde_json::{json, Value};
use tracing::warn;

/// Serialize the finished task configs, failing the run when the pipeline
/// produced none. An empty list almost always means a missing plugin, so
/// the message points there.
pub(crate) fn finished_configs(ctx: &Context) -> Result<Vec<Value>> {
    let configs = ctx.task_config_values();
    if configs.is_empty() {
        let message = "empty build configuration, no task was registered";
        warn!("no build configuration was produced, check the plugins in your config file");
        ctx.apply_hook("error", &json!({ "error": message }))?;
        return Err(Error::Other(message.into()));
    }
    Ok(configs)
}
