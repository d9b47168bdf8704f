//! End-to-end tests for the orchestration pipeline

use std::sync::{Arc, Mutex};

use serde_json::{json, Value};
use tempfile::TempDir;

use qwerboom_core::{
    ChainedConfig, CliOptionRegistration, CommandOutcome, Context, ContextOptions, Error,
    PluginApi, PluginSpec, RunOptions, UserConfigRegistration, Validation,
};

fn project_with_config(config: Value) -> TempDir {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("build.json"),
        serde_json::to_string_pretty(&config).unwrap(),
    )
    .unwrap();
    dir
}

fn chained(chain: &mut dyn std::any::Any) -> &mut ChainedConfig {
    chain.downcast_mut::<ChainedConfig>().unwrap()
}

#[test]
fn test_entry_option_flows_into_task_config() {
    let dir = project_with_config(json!({"entry": "./src/index.js"}));

    let plugin = |api: &mut PluginApi<'_>, _options: &Value| {
        api.register_task("web", Box::new(ChainedConfig::new()))?;
        api.register_user_config([UserConfigRegistration::new("entry")
            .validation(Validation::Types("string".into()))
            .config_webpack(|chain, value, _ctx| {
                chained(chain).append("entry.index", value.clone());
                Ok(())
            })])?;
        Ok(())
    };

    let mut ctx = Context::new(
        ContextOptions::new("build", dir.path()).plugin(PluginSpec::inline(plugin)),
    )
    .unwrap();
    ctx.set_up().unwrap();

    assert_eq!(ctx.get_all_task(), vec!["web"]);
    let configs = ctx.task_config_values();
    assert_eq!(configs[0]["entry"]["index"], json!(["./src/index.js"]));
}

#[test]
fn test_unsupported_config_key_fails_before_task_mutation() {
    let dir = project_with_config(json!({"bogus": 1, "entry": "./a.js"}));
    let touched = Arc::new(Mutex::new(false));

    let touched_in_plugin = touched.clone();
    let plugin = move |api: &mut PluginApi<'_>, _options: &Value| {
        let touched = touched_in_plugin.clone();
        api.register_task("web", Box::new(ChainedConfig::new()))?;
        api.register_user_config([UserConfigRegistration::new("entry").config_webpack(
            move |_chain, _value, _ctx| {
                *touched.lock().unwrap() = true;
                Ok(())
            },
        )])?;
        Ok(())
    };

    let mut ctx = Context::new(
        ContextOptions::new("build", dir.path()).plugin(PluginSpec::inline(plugin)),
    )
    .unwrap();
    let err = ctx.set_up().unwrap_err();

    assert!(matches!(err, Error::UnsupportedConfigKey(key) if key == "bogus"));
    assert!(!*touched.lock().unwrap());
}

#[test]
fn test_validation_rejects_wrong_type() {
    let dir = project_with_config(json!({"entry": 42}));

    let plugin = |api: &mut PluginApi<'_>, _options: &Value| {
        api.register_task("web", Box::new(ChainedConfig::new()))?;
        api.register_user_config([
            UserConfigRegistration::new("entry").validation(Validation::Types("string".into()))
        ])?;
        Ok(())
    };

    let mut ctx = Context::new(
        ContextOptions::new("build", dir.path()).plugin(PluginSpec::inline(plugin)),
    )
    .unwrap();
    assert!(matches!(ctx.set_up(), Err(Error::Validation(_))));
}

#[test]
fn test_cli_option_restricted_to_registered_commands() {
    let register_port = |api: &mut PluginApi<'_>, _options: &Value| {
        api.register_task("web", Box::new(ChainedConfig::new()))?;
        api.register_cli_option([CliOptionRegistration::new("open", &["start"]).config_webpack(
            |chain, value, _ctx| {
                chained(chain).set("devServer.open", value.clone());
                Ok(())
            },
        )])?;
        Ok(())
    };

    // allowed on start
    let dir = project_with_config(json!({}));
    let mut ctx = Context::new(
        ContextOptions::new("start", dir.path())
            .arg("open", json!(true))
            .plugin(PluginSpec::inline(register_port)),
    )
    .unwrap();
    ctx.set_up().unwrap();
    assert_eq!(
        ctx.task_config_values()[0]["devServer"]["open"],
        json!(true)
    );

    // rejected on test
    let dir = project_with_config(json!({}));
    let mut ctx = Context::new(
        ContextOptions::new("test", dir.path())
            .arg("open", json!(true))
            .plugin(PluginSpec::inline(register_port)),
    )
    .unwrap();
    let err = ctx.set_up().unwrap_err();
    assert!(matches!(
        err,
        Error::UnsupportedCliOption { option, command }
            if option == "open" && command == "test"
    ));
}

#[test]
fn test_test_command_passes_jest_argv_unchecked() {
    let dir = project_with_config(json!({}));
    let plugin = |api: &mut PluginApi<'_>, _options: &Value| {
        api.register_task("web", Box::new(ChainedConfig::new()))?;
        Ok(())
    };

    let mut ctx = Context::new(
        ContextOptions::new("test", dir.path())
            .arg("jestArgv", json!({"watch": true, "coverage": true}))
            .plugin(PluginSpec::inline(plugin)),
    )
    .unwrap();
    ctx.set_up().unwrap();
}

#[test]
fn test_duplicate_task_registration_across_plugins() {
    let dir = project_with_config(json!({}));
    let second_failed = Arc::new(Mutex::new(false));

    let first = |api: &mut PluginApi<'_>, _options: &Value| {
        let mut chain = ChainedConfig::new();
        chain.set("owner", "first");
        api.register_task("app", Box::new(chain))?;
        Ok(())
    };
    let second_failed_in_plugin = second_failed.clone();
    let second = move |api: &mut PluginApi<'_>, _options: &Value| {
        let mut chain = ChainedConfig::new();
        chain.set("owner", "second");
        let result = api.register_task("app", Box::new(chain));
        assert!(matches!(
            result,
            Err(Error::DuplicateRegistration { kind: "task", .. })
        ));
        *second_failed_in_plugin.lock().unwrap() = true;
        Ok(())
    };

    let mut ctx = Context::new(
        ContextOptions::new("build", dir.path())
            .plugin(PluginSpec::inline(first))
            .plugin(PluginSpec::inline(second)),
    )
    .unwrap();
    ctx.set_up().unwrap();

    assert!(*second_failed.lock().unwrap());
    assert_eq!(ctx.get_all_task(), vec!["app"]);
    assert_eq!(ctx.task_config_values()[0]["owner"], json!("first"));
}

#[test]
fn test_cancel_task_excludes_from_final_list() {
    let dir = project_with_config(json!({}));
    let plugin = |api: &mut PluginApi<'_>, _options: &Value| {
        for name in ["web", "ssr", "miniapp"] {
            api.register_task(name, Box::new(ChainedConfig::new()))?;
        }
        api.cancel_task("ssr");
        api.cancel_task("ssr");
        api.cancel_task("never-existed");
        Ok(())
    };

    let mut ctx = Context::new(
        ContextOptions::new("build", dir.path()).plugin(PluginSpec::inline(plugin)),
    )
    .unwrap();
    ctx.set_up().unwrap();
    assert_eq!(ctx.get_all_task(), vec!["web", "miniapp"]);
}

#[test]
fn test_mutators_apply_in_registration_order() {
    let dir = project_with_config(json!({}));
    let plugin = |api: &mut PluginApi<'_>, _options: &Value| {
        api.register_task("web", Box::new(ChainedConfig::new()))?;
        api.register_task("ssr", Box::new(ChainedConfig::new()))?;
        api.on_get_webpack_config(|chain| {
            chained(chain).append("steps", "all-1");
            Ok(())
        });
        api.on_get_task_webpack_config("web", |chain| {
            chained(chain).append("steps", "web-only");
            Ok(())
        });
        api.on_get_webpack_config(|chain| {
            chained(chain).append("steps", "all-2");
            Ok(())
        });
        Ok(())
    };

    let mut ctx = Context::new(
        ContextOptions::new("build", dir.path()).plugin(PluginSpec::inline(plugin)),
    )
    .unwrap();
    ctx.set_up().unwrap();

    let configs = ctx.task_config_values();
    assert_eq!(configs[0]["steps"], json!(["all-1", "web-only", "all-2"]));
    assert_eq!(configs[1]["steps"], json!(["all-1", "all-2"]));
}

#[test]
fn test_ignore_tasks_patterns_skip_matching_tasks() {
    let dir = project_with_config(json!({"publicPath": "/assets/"}));
    let plugin = |api: &mut PluginApi<'_>, _options: &Value| {
        api.register_task("web", Box::new(ChainedConfig::new()))?;
        api.register_task("ssr-node", Box::new(ChainedConfig::new()))?;
        api.register_user_config([UserConfigRegistration::new("publicPath")
            .ignore_tasks(vec!["^ssr".into()])
            .config_webpack(|chain, value, ctx| {
                assert_eq!(ctx.task_name.as_deref(), Some("web"));
                chained(chain).set("output.publicPath", value.clone());
                Ok(())
            })])?;
        Ok(())
    };

    let mut ctx = Context::new(
        ContextOptions::new("build", dir.path()).plugin(PluginSpec::inline(plugin)),
    )
    .unwrap();
    ctx.set_up().unwrap();

    let configs = ctx.task_config_values();
    assert_eq!(configs[0]["output"]["publicPath"], json!("/assets/"));
    assert_eq!(configs[1].get("output"), None);
}

#[test]
fn test_error_hook_fires_then_error_propagates() {
    let dir = project_with_config(json!({"bogus": true}));
    let seen = Arc::new(Mutex::new(Vec::new()));

    let seen_in_plugin = seen.clone();
    let plugin = move |api: &mut PluginApi<'_>, _options: &Value| {
        let seen = seen_in_plugin.clone();
        api.on_hook("error", move |payload| {
            seen.lock().unwrap().push(payload.clone());
            Ok(())
        });
        Ok(())
    };

    let mut ctx = Context::new(
        ContextOptions::new("build", dir.path()).plugin(PluginSpec::inline(plugin)),
    )
    .unwrap();
    ctx.register_command_module(
        "build",
        Arc::new(|_ctx: &mut Context, _options: &RunOptions| {
            Ok(CommandOutcome::Finished(Value::Null))
        }),
    );

    let err = ctx.run(&RunOptions::default()).unwrap_err();
    assert!(matches!(err, Error::UnsupportedConfigKey(_)));
    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert!(seen[0]["error"].as_str().unwrap().contains("bogus"));
}

#[test]
fn test_run_dispatches_to_command_module() {
    let dir = project_with_config(json!({}));
    let plugin = |api: &mut PluginApi<'_>, _options: &Value| {
        api.register_task("web", Box::new(ChainedConfig::new()))?;
        Ok(())
    };

    let mut ctx = Context::new(
        ContextOptions::new("build", dir.path()).plugin(PluginSpec::inline(plugin)),
    )
    .unwrap();
    ctx.register_command_module(
        "build",
        Arc::new(|ctx: &mut Context, options: &RunOptions| {
            if options.eject {
                return Ok(CommandOutcome::Ejected(ctx.task_config_values()));
            }
            Ok(CommandOutcome::Finished(json!({"tasks": ctx.get_all_task()})))
        }),
    );

    let outcome = ctx.run(&RunOptions { eject: true }).unwrap();
    assert_eq!(outcome, CommandOutcome::Ejected(vec![json!({})]));

    // dispatching an unregistered command fails
    let dir = project_with_config(json!({}));
    let mut ctx = Context::new(ContextOptions::new("start", dir.path())).unwrap();
    assert!(matches!(
        ctx.run(&RunOptions::default()),
        Err(Error::UnknownCommand(_))
    ));
}
