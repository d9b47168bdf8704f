use serde_json::{json, Map, Value};
use tracing::debug;

use qwerboom_core::{BuildBackend, CommandModule, CommandOutcome, Context, Result, RunOptions};

use super::finished_configs;

/// When set, a `--port` flag takes precedence over the `devServer.port`
/// from the config file
pub const USE_CLI_PORT_ENV: &str = "USE_CLI_PORT";

const DEFAULT_PORT: u16 = 3333;
const DEFAULT_HOST: &str = "0.0.0.0";

pub struct StartDriver<B> {
    backend: B,
}

impl<B> StartDriver<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }
}

impl<B: BuildBackend> CommandModule for StartDriver<B> {
    fn run(&self, ctx: &mut Context, options: &RunOptions) -> Result<CommandOutcome> {
        ctx.apply_hook(
            "before.start.load",
            &json!({"args": ctx.command_args, "userConfig": ctx.user_config}),
        )?;

        if options.eject {
            return Ok(CommandOutcome::Ejected(ctx.task_config_values()));
        }
        let configs = finished_configs(ctx)?;
        let dev_server = dev_server_config(ctx, &configs);
        debug!("dev server config: {}", dev_server);

        ctx.apply_hook("before.start.run", &json!({"config": configs}))?;
        ctx.apply_hook("before.start.devServer", &dev_server)?;
        let result = self.backend.serve(&configs, &dev_server)?;
        ctx.apply_hook("after.start.devServer", &dev_server)?;
        ctx.apply_hook("after.start.compile", &result)?;
        Ok(CommandOutcome::Finished(result))
    }
}

/// Resolve the effective dev server settings. Precedence, lowest first:
/// built-in defaults, CLI flags, `devServer` from the config file, the
/// first task's `devServer` block. With `USE_CLI_PORT` set a `--port`
/// flag beats both config sources.
fn dev_server_config(ctx: &Context, configs: &[Value]) -> Value {
    let mut settings = Map::new();
    settings.insert("port".into(), json!(DEFAULT_PORT));
    settings.insert("host".into(), json!(DEFAULT_HOST));
    settings.insert("https".into(), json!(false));

    for key in ["port", "host", "https"] {
        if let Some(value) = ctx.command_args.get(key) {
            settings.insert(key.into(), value.clone());
        }
    }
    let config_blocks = [
        ctx.user_config.get("devServer"),
        configs.first().and_then(|config| config.get("devServer")),
    ];
    for block in config_blocks.into_iter().flatten() {
        if let Some(block) = block.as_object() {
            for (key, value) in block {
                settings.insert(key.clone(), value.clone());
            }
        }
    }
    if std::env::var(USE_CLI_PORT_ENV).is_ok() {
        if let Some(port) = ctx.command_args.get("port") {
            settings.insert("port".into(), port.clone());
        }
    }
    Value::Object(settings)
}
