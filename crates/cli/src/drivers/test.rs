use serde_json::{json, Value};
use tracing::debug;

use qwerboom_core::{BuildBackend, CommandModule, CommandOutcome, Context, Result, RunOptions};

pub struct TestDriver<B> {
    backend: B,
}

impl<B> TestDriver<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }
}

impl<B: BuildBackend> CommandModule for TestDriver<B> {
    fn run(&self, ctx: &mut Context, options: &RunOptions) -> Result<CommandOutcome> {
        ctx.apply_hook(
            "before.test.load",
            &json!({"args": ctx.command_args, "userConfig": ctx.user_config}),
        )?;

        let base = json!({"rootDir": ctx.root_dir.display().to_string()});
        let config = ctx.jest_config(base)?;
        debug!("test runner config: {}", config);

        if options.eject {
            return Ok(CommandOutcome::Ejected(vec![config]));
        }

        let extra_args: Vec<String> = ctx
            .command_args
            .get("jestArgv")
            .and_then(Value::as_array)
            .map(|args| {
                args.iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        ctx.apply_hook(
            "before.test.run",
            &json!({"config": config, "args": extra_args}),
        )?;
        let result = self.backend.run_tests(&config, &extra_args)?;
        ctx.apply_hook("after.test.compile", &result)?;
        Ok(CommandOutcome::Finished(result))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drivers::test_support::{context_with_web_task, RecordingBackend};

    #[test]
    fn test_runner_receives_folded_config_and_args() {
        let (_dir, mut ctx) = context_with_web_task(
            "test",
            json!({}),
            &[("jestArgv", json!(["--watch", "--coverage"]))],
        );
        ctx.on_get_jest_config(std::sync::Arc::new(|config: &Value| {
            let mut config = config.clone();
            config["testEnvironment"] = json!("jsdom");
            Ok(config)
        }));

        let backend = RecordingBackend::new();
        let driver = TestDriver::new(backend.clone());
        let outcome = driver.run(&mut ctx, &RunOptions::default()).unwrap();
        assert_eq!(outcome, CommandOutcome::Finished(json!({"tested": true})));

        let calls = backend.calls.lock().unwrap();
        let (name, payload) = &calls[0];
        assert_eq!(name, "test");
        assert_eq!(payload["config"]["testEnvironment"], json!("jsdom"));
        assert_eq!(payload["args"], json!(["--watch", "--coverage"]));
    }

    #[test]
    fn test_eject_returns_runner_config() {
        let (_dir, mut ctx) = context_with_web_task("test", json!({}), &[]);
        let backend = RecordingBackend::new();
        let driver = TestDriver::new(backend.clone());

        let outcome = driver.run(&mut ctx, &RunOptions { eject: true }).unwrap();
        match outcome {
            CommandOutcome::Ejected(configs) => {
                assert_eq!(configs.len(), 1);
                assert!(configs[0]["rootDir"].is_string());
            }
            other => panic!("expected ejected config, got {other:?}"),
        }
        assert!(backend.calls.lock().unwrap().is_empty());
    }
}
