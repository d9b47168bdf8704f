//! Built-in web-app plugin
//!
//! Seeds a `web` task and registers the baseline config surface every web
//! project gets without declaring any plugin of its own.

use std::any::Any;

use serde_json::{json, Value};

use qwerboom_core::{
    ChainedConfig, PluginApi, Result, UserConfigRegistration, Validation,
};

/// Tasks seeded by other plugins may carry a foreign builder type; those
/// are left untouched
fn chained(chain: &mut dyn Any) -> Option<&mut ChainedConfig> {
    chain.downcast_mut::<ChainedConfig>()
}

pub fn web_app_plugin(api: &mut PluginApi<'_>, _options: &Value) -> Result<()> {
    let context = api.context();
    let mode = if context.command == "start" {
        "development"
    } else {
        "production"
    };

    let mut chain = ChainedConfig::new();
    chain.set("mode", mode);
    api.register_task("web", Box::new(chain))?;

    api.register_user_config([
        UserConfigRegistration::new("entry")
            .validation(Validation::Types("string".into()))
            .config_webpack(|chain, value, _ctx| {
                if let Some(chain) = chained(chain) {
                    chain.append("entry.index", value.clone());
                }
                Ok(())
            }),
        UserConfigRegistration::new("outputDir")
            .validation(Validation::Types("string".into()))
            .default_value(json!("build"))
            .config_webpack(|chain, value, ctx| {
                let dir = value.as_str().unwrap_or("build");
                let path = ctx.root_dir.join(dir);
                if let Some(chain) = chained(chain) {
                    chain.set("output.path", path.display().to_string());
                }
                Ok(())
            }),
        UserConfigRegistration::new("publicPath")
            .validation(Validation::Types("string".into()))
            .default_value(json!("/"))
            .config_webpack(|chain, value, _ctx| {
                if let Some(chain) = chained(chain) {
                    chain.set("output.publicPath", value.clone());
                }
                Ok(())
            }),
        UserConfigRegistration::new("devServer")
            .validation(Validation::Types("object".into()))
            .config_webpack(|chain, value, _ctx| {
                if let Some(chain) = chained(chain) {
                    chain.merge("devServer", value);
                }
                Ok(())
            }),
    ])?;
    Ok(())
}
