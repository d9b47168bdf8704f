use serde_json::json;

use qwerboom_core::{BuildBackend, CommandModule, CommandOutcome, Context, Result, RunOptions};

use super::finished_configs;

pub struct BuildDriver<B> {
    backend: B,
}

impl<B> BuildDriver<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }
}

impl<B: BuildBackend> CommandModule for BuildDriver<B> {
    fn run(&self, ctx: &mut Context, options: &RunOptions) -> Result<CommandOutcome> {
        ctx.apply_hook(
            "before.build.load",
            &json!({"args": ctx.command_args, "userConfig": ctx.user_config}),
        )?;

        if options.eject {
            return Ok(CommandOutcome::Ejected(ctx.task_config_values()));
        }
        let configs = finished_configs(ctx)?;

        ctx.apply_hook("before.build.run", &json!({"config": configs}))?;
        let result = self.backend.build(&configs)?;
        ctx.apply_hook("after.build.compile", &result)?;
        Ok(CommandOutcome::Finished(result))
    }
}
