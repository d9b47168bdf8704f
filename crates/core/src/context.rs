//! The orchestrator: owns all registries and drives the staged pipeline
//!
//! One `Context` lives for exactly one command invocation. The pipeline is
//! strictly sequential; every plugin entry function, mutator, config-apply
//! function, and hook handler runs to completion before the next begins, so
//! plugins may freely mutate shared orchestrator state between stages.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use regex::Regex;
use serde_json::{json, Map, Value};
use tracing::{debug, error, info, warn};

use crate::backend::{self, BackendDescriptor};
use crate::command::{CommandModule, CommandOutcome, RunOptions};
use crate::config::{self, ConfigLoader, JsonConfigLoader, RESERVED_CONFIG_KEYS};
use crate::error::{Error, Result};
use crate::hooks::{HookFn, LifecycleHooks};
use crate::merge;
use crate::plugin::{self, ModuleLoader, PluginApi, PluginDescriptor, PluginSpec, StaticModuleLoader};
use crate::registration::{
    apply_modifications, CliOptionRegistration, MethodOptions, MethodRegistration,
    RegistrationKind, RegistrationModification, UserConfigRegistration,
};
use crate::registry::Registry;
use crate::task::{
    ChainConfig, ChainMutator, ConfigApplyFn, JestConfigFn, MutatorTarget, PluginContext,
    TaskConfig,
};
use crate::utils;

const PKG_FILE: &str = "package.json";

/// Construction parameters for one run
pub struct ContextOptions {
    pub command: String,
    pub root_dir: PathBuf,
    /// Parsed CLI arguments, keyed by canonical camel-case option name
    pub args: Map<String, Value>,
    /// Built-in plugins, executed before any user-declared plugin
    pub plugins: Vec<PluginSpec>,
}

impl ContextOptions {
    pub fn new(command: impl Into<String>, root_dir: impl Into<PathBuf>) -> Self {
        Self {
            command: command.into(),
            root_dir: root_dir.into(),
            args: Map::new(),
            plugins: Vec::new(),
        }
    }

    pub fn arg(mut self, name: impl Into<String>, value: Value) -> Self {
        self.args.insert(name.into(), value);
        self
    }

    pub fn plugin(mut self, spec: PluginSpec) -> Self {
        self.plugins.push(spec);
        self
    }
}

pub struct Context {
    pub command: String,
    pub command_args: Map<String, Value>,
    pub root_dir: PathBuf,
    pub user_config: Value,
    pub original_user_config: Value,
    pub pkg: Value,
    /// Resolved backend handle, set during config resolution
    pub webpack: Option<BackendDescriptor>,

    builtin_plugins: Vec<PluginSpec>,
    plugins: Vec<PluginDescriptor>,
    command_modules: HashMap<String, Arc<dyn CommandModule>>,
    event_hooks: LifecycleHooks,
    tasks: Vec<TaskConfig>,
    cancel_task_names: Vec<String>,
    modify_config_fns: Vec<(MutatorTarget, ChainMutator)>,
    modify_jest_config: Vec<JestConfigFn>,
    config_modification_queue: Vec<RegistrationModification<UserConfigRegistration>>,
    cli_modification_queue: Vec<RegistrationModification<CliOptionRegistration>>,
    internal_value: HashMap<String, Value>,
    user_config_registration: Registry<UserConfigRegistration>,
    cli_option_registration: Registry<CliOptionRegistration>,
    method_registration: Registry<MethodRegistration>,
    module_loader: Box<dyn ModuleLoader>,
    config_loader: Box<dyn ConfigLoader>,
}

impl Context {
    pub fn new(options: ContextOptions) -> Result<Self> {
        let ContextOptions {
            command,
            root_dir,
            args,
            plugins,
        } = options;

        let pkg = read_project_file(&root_dir);
        let mut ctx = Self {
            command,
            command_args: args,
            root_dir,
            user_config: Value::Object(Map::new()),
            original_user_config: Value::Object(Map::new()),
            pkg,
            webpack: None,
            builtin_plugins: plugins,
            plugins: Vec::new(),
            command_modules: HashMap::new(),
            event_hooks: LifecycleHooks::new(),
            tasks: Vec::new(),
            cancel_task_names: Vec::new(),
            modify_config_fns: Vec::new(),
            modify_jest_config: Vec::new(),
            config_modification_queue: Vec::new(),
            cli_modification_queue: Vec::new(),
            internal_value: HashMap::new(),
            user_config_registration: Registry::new("userConfig"),
            cli_option_registration: Registry::new("cliOption"),
            method_registration: Registry::new("method"),
            module_loader: Box::new(StaticModuleLoader::new()),
            config_loader: Box::new(JsonConfigLoader),
        };
        ctx.register_builtin_cli_options()?;
        Ok(ctx)
    }

    /// Replace the plugin module loader (static registration by default)
    pub fn with_module_loader(mut self, loader: impl ModuleLoader + 'static) -> Self {
        self.module_loader = Box::new(loader);
        self
    }

    /// Replace the config-file loader (strict JSON by default)
    pub fn with_config_loader(mut self, loader: impl ConfigLoader + 'static) -> Self {
        self.config_loader = Box::new(loader);
        self
    }

    fn register_builtin_cli_options(&mut self) -> Result<()> {
        let builtins = [
            CliOptionRegistration::new("port", &["start"]),
            CliOptionRegistration::new("host", &["start"]),
            CliOptionRegistration::new("https", &["start"]),
            CliOptionRegistration::new("config", &["start", "build", "test"]),
            CliOptionRegistration::new("mode", &["start", "build", "test"]),
            CliOptionRegistration::new("eject", &["start", "build"]),
        ];
        self.register_cli_option(builtins)
    }

    // ------------------------------------------------------------------
    // Registration surface (exposed to plugins through PluginApi)
    // ------------------------------------------------------------------

    pub fn register_task(&mut self, name: &str, chain_config: ChainConfig) -> Result<()> {
        if self.tasks.iter().any(|task| task.name == name) {
            return Err(Error::DuplicateRegistration {
                kind: "task",
                name: name.to_string(),
            });
        }
        debug!("registered task '{}'", name);
        self.tasks.push(TaskConfig::new(name, chain_config));
        Ok(())
    }

    pub fn cancel_task(&mut self, name: &str) {
        if self.cancel_task_names.iter().any(|n| n == name) {
            info!("task '{}' has already been canceled", name);
        } else {
            self.cancel_task_names.push(name.to_string());
        }
    }

    pub fn get_all_task(&self) -> Vec<String> {
        self.tasks.iter().map(|task| task.name.clone()).collect()
    }

    /// Plugin descriptors filtered to their data fields
    pub fn get_all_plugin(&self) -> Vec<Value> {
        self.plugins
            .iter()
            .map(|descriptor| {
                json!({
                    "name": descriptor.name,
                    "pluginPath": descriptor.path,
                    "options": descriptor.options,
                })
            })
            .collect()
    }

    pub fn on_hook(&mut self, key: &str, handler: HookFn) {
        self.event_hooks.on(key, handler);
    }

    pub fn apply_hook(&self, key: &str, payload: &Value) -> Result<()> {
        self.event_hooks.apply(key, payload)
    }

    pub fn on_get_webpack_config(&mut self, target: MutatorTarget, mutator: ChainMutator) {
        self.modify_config_fns.push((target, mutator));
    }

    pub fn on_get_jest_config(&mut self, modifier: JestConfigFn) {
        self.modify_jest_config.push(modifier);
    }

    /// Fold the queued jest-config modifiers over a base runner config
    pub fn jest_config(&self, base: Value) -> Result<Value> {
        let mut config = base;
        for modifier in &self.modify_jest_config {
            config = modifier(&config)?;
        }
        Ok(config)
    }

    pub fn set_value(&mut self, key: &str, value: Value) {
        self.internal_value.insert(key.to_string(), value);
    }

    pub fn get_value(&self, key: &str) -> Option<&Value> {
        self.internal_value.get(key)
    }

    pub fn register_user_config(
        &mut self,
        registrations: impl IntoIterator<Item = UserConfigRegistration>,
    ) -> Result<()> {
        for registration in registrations {
            let name = registration.name.clone();
            let default_value = registration.default_value.clone();
            self.user_config_registration.register(name.clone(), registration)?;

            if let Some(default_value) = default_value {
                if self.user_config.get(&name).is_none() {
                    if let Some(config) = self.user_config.as_object_mut() {
                        config.insert(name, default_value);
                    }
                }
            }
        }
        Ok(())
    }

    pub fn register_cli_option(
        &mut self,
        registrations: impl IntoIterator<Item = CliOptionRegistration>,
    ) -> Result<()> {
        for mut registration in registrations {
            let name = utils::camel_case(&registration.name);
            registration.name = name.clone();
            self.cli_option_registration.register(name, registration)?;
        }
        Ok(())
    }

    pub fn has_registration(&self, name: &str, kind: RegistrationKind) -> bool {
        match kind {
            RegistrationKind::UserConfig => self.user_config_registration.has(name),
            RegistrationKind::CliOption => self.cli_option_registration.has(name),
        }
    }

    pub fn register_method(
        &mut self,
        name: &str,
        func: crate::registration::MethodFn,
        options: MethodOptions,
    ) -> Result<()> {
        self.method_registration
            .register(name, MethodRegistration { func, options })
    }

    pub fn has_method(&self, name: &str) -> bool {
        self.method_registration.has(name)
    }

    /// Invoke a registered method. `plugin_name` is the caller's plugin
    /// name; methods registered with `plugin_name: true` receive it as
    /// their first argument.
    pub fn apply_method(
        &self,
        name: &str,
        plugin_name: Option<&str>,
        args: &[Value],
    ) -> Result<Value> {
        let registration = self
            .method_registration
            .get(name)
            .ok_or_else(|| Error::UnknownMethod(name.to_string()))?;
        if registration.options.plugin_name {
            let mut curried = Vec::with_capacity(args.len() + 1);
            curried.push(match plugin_name {
                Some(plugin_name) => Value::String(plugin_name.to_string()),
                None => Value::Null,
            });
            curried.extend_from_slice(args);
            (registration.func)(&curried)
        } else {
            (registration.func)(args)
        }
    }

    pub fn modify_config_registration(
        &mut self,
        modification: RegistrationModification<UserConfigRegistration>,
    ) {
        self.config_modification_queue.push(modification);
    }

    pub fn modify_cli_registration(
        &mut self,
        modification: RegistrationModification<CliOptionRegistration>,
    ) {
        self.cli_modification_queue.push(modification);
    }

    // ------------------------------------------------------------------
    // User-config mutation (immediate, not queued)
    // ------------------------------------------------------------------

    pub fn modify_user_config(&mut self, key: &str, value: Value, deepmerge: bool) -> Result<()> {
        self.modify_user_config_at(key, |_| value.clone(), deepmerge)
    }

    /// Update one dot-path key from its current value
    pub fn modify_user_config_at(
        &mut self,
        key: &str,
        update: impl Fn(Option<&Value>) -> Value,
        deepmerge: bool,
    ) -> Result<()> {
        if key == "plugins" || key.starts_with("plugins.") {
            return Err(Error::Other(
                "config plugins is not supported to be modified".into(),
            ));
        }
        let current = utils::get_path(&self.user_config, key).cloned();
        let mut new_value = update(current.as_ref());
        if deepmerge {
            if let Some(current) = &current {
                new_value = merge::merge_values(current, &new_value);
            }
        }
        utils::set_path(&mut self.user_config, key, new_value);
        Ok(())
    }

    /// Transform the whole user config; the returned object is merged in
    /// key-wise. A returned `plugins` key is dropped since the plugin list
    /// is not modifiable after resolution.
    pub fn transform_user_config(
        &mut self,
        transform: impl Fn(&Value) -> Value,
        deepmerge: bool,
    ) -> Result<()> {
        let modified = transform(&self.user_config);
        let mut modified = match modified {
            Value::Object(modified) => modified,
            _ => {
                return Err(Error::Other(
                    "modify_user_config must return a plain object".into(),
                ));
            }
        };
        if modified.remove("plugins").is_some() {
            debug!("dropping 'plugins' from modified user config, it is not modifiable");
        }
        for (key, value) in modified {
            let current = self.user_config.get(&key).cloned();
            let new_value = match (deepmerge, current) {
                (true, Some(current)) => merge::merge_values(&current, &value),
                _ => value,
            };
            if let Some(config) = self.user_config.as_object_mut() {
                config.insert(key, new_value);
            }
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Command modules
    // ------------------------------------------------------------------

    pub fn register_command_module(&mut self, name: &str, module: Arc<dyn CommandModule>) {
        if self.command_modules.contains_key(name) {
            warn!("command module '{}' already registered, replacing", name);
        }
        self.command_modules.insert(name.to_string(), module);
    }

    pub fn command_module(&self, name: &str) -> Result<Arc<dyn CommandModule>> {
        self.command_modules
            .get(name)
            .cloned()
            .ok_or_else(|| Error::UnknownCommand(name.to_string()))
    }

    // ------------------------------------------------------------------
    // Pipeline
    // ------------------------------------------------------------------

    /// Stage 1: load and overlay the user config, resolve the backend, and
    /// resolve the merged plugin list
    fn resolve_config(&mut self) -> Result<()> {
        let explicit = self
            .command_args
            .get("config")
            .and_then(Value::as_str)
            .map(str::to_string);
        let config_path = config::find_config_file(&self.root_dir, explicit.as_deref())?;
        let loaded = self.config_loader.load(&config_path)?;

        let mode = self
            .command_args
            .get("mode")
            .and_then(Value::as_str)
            .map(str::to_string);
        self.user_config = config::apply_mode_overlay(loaded, mode.as_deref());
        self.original_user_config = self.user_config.clone();

        let custom_backend = self
            .user_config
            .get("customWebpack")
            .and_then(Value::as_bool)
            .unwrap_or(false);
        self.webpack = Some(backend::resolve_backend(&self.root_dir, custom_backend));

        let mut specs = self.builtin_plugins.clone();
        if let Some(user_plugins) = self.user_config.get("plugins") {
            specs.extend(PluginSpec::parse_list(user_plugins)?);
        }
        self.plugins = plugin::resolve_plugins(&specs, &self.root_dir, self.module_loader.as_ref())?;
        debug!("resolved {} plugin(s)", self.plugins.len());
        Ok(())
    }

    /// Stage 2: invoke every plugin entry function once, in resolved order
    fn run_plugins(&mut self) -> Result<()> {
        let descriptors = self.plugins.clone();
        for descriptor in descriptors {
            debug!("running plugin {:?}", descriptor.name);
            let mut api = PluginApi::new(self, descriptor.name.clone());
            descriptor.entry.apply(&mut api, &descriptor.options)?;
        }
        Ok(())
    }

    /// Stage 3: apply queued registration modifications, config first
    fn run_registration_modification(&mut self) -> Result<()> {
        let config_modifications = std::mem::take(&mut self.config_modification_queue);
        apply_modifications(&mut self.user_config_registration, config_modifications)?;

        let cli_modifications = std::mem::take(&mut self.cli_modification_queue);
        apply_modifications(&mut self.cli_option_registration, cli_modifications)?;
        Ok(())
    }

    /// Stage 4: validate and apply every user-config key
    fn run_user_config(&mut self) -> Result<()> {
        let keys: Vec<String> = match self.user_config.as_object() {
            Some(config) => config
                .keys()
                .filter(|key| !RESERVED_CONFIG_KEYS.contains(&key.as_str()))
                .cloned()
                .collect(),
            None => Vec::new(),
        };

        for key in keys {
            let registration = self
                .user_config_registration
                .get(&key)
                .cloned()
                .ok_or_else(|| Error::UnsupportedConfigKey(key.clone()))?;
            let value = self.user_config.get(&key).cloned().unwrap_or(Value::Null);

            if let Some(validation) = &registration.validation {
                validation.check(&registration.name, &value)?;
            }
            if let Some(apply) = &registration.config_webpack {
                self.run_config_webpack(apply, &value, registration.ignore_tasks.as_deref())?;
            }
        }
        Ok(())
    }

    /// Stage 5: distribute queued mutators onto tasks and run them in
    /// registration order
    fn run_webpack_functions(&mut self) -> Result<()> {
        let queued = std::mem::take(&mut self.modify_config_fns);
        for (target, mutator) in queued {
            for task in &mut self.tasks {
                match &target {
                    MutatorTarget::All => task.mutators.push(mutator.clone()),
                    MutatorTarget::Task(name) if *name == task.name => {
                        task.mutators.push(mutator.clone())
                    }
                    MutatorTarget::Task(_) => {}
                }
            }
        }

        for task in &mut self.tasks {
            let TaskConfig {
                chain_config,
                mutators,
                ..
            } = task;
            for mutator in mutators.iter() {
                mutator(chain_config.as_mut())?;
            }
        }
        Ok(())
    }

    /// Stage 6: apply registered CLI options; unregistered or
    /// command-mismatched options are fatal
    fn run_cli_option(&mut self) -> Result<()> {
        let args: Vec<(String, Value)> = self
            .command_args
            .iter()
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();

        for (option, value) in args {
            // the test runner accepts an arbitrary option bag unchecked
            if self.command == "test" && option == "jestArgv" {
                continue;
            }
            let registration = self
                .cli_option_registration
                .get(&option)
                .cloned()
                .filter(|registration| registration.commands.iter().any(|c| *c == self.command))
                .ok_or_else(|| Error::UnsupportedCliOption {
                    option: option.clone(),
                    command: self.command.clone(),
                })?;
            if let Some(apply) = &registration.config_webpack {
                self.run_config_webpack(apply, &value, registration.ignore_tasks.as_deref())?;
            }
        }
        Ok(())
    }

    fn run_config_webpack(
        &mut self,
        apply: &ConfigApplyFn,
        value: &Value,
        ignore_tasks: Option<&[String]>,
    ) -> Result<()> {
        let ignore: Vec<Regex> = match ignore_tasks {
            Some(patterns) => patterns
                .iter()
                .map(|pattern| {
                    Regex::new(pattern).map_err(|err| {
                        Error::Other(format!("invalid ignoreTasks pattern '{pattern}': {err}"))
                    })
                })
                .collect::<Result<_>>()?,
            None => Vec::new(),
        };

        let snapshot = self.snapshot(None);
        for task in &mut self.tasks {
            if ignore.iter().any(|pattern| pattern.is_match(&task.name)) {
                continue;
            }
            let mut task_context = snapshot.clone();
            task_context.task_name = Some(task.name.clone());
            apply(task.chain_config.as_mut(), value, &task_context)?;
        }
        Ok(())
    }

    /// Stage 7: drop cancelled tasks, preserving the order of survivors
    fn filter_cancelled_tasks(&mut self) {
        let cancelled = std::mem::take(&mut self.cancel_task_names);
        self.tasks.retain(|task| !cancelled.contains(&task.name));
    }

    /// Run the whole pipeline, leaving the finished task list on the context
    pub fn set_up(&mut self) -> Result<()> {
        self.resolve_config()?;
        self.run_plugins()?;
        self.run_registration_modification()?;
        self.run_user_config()?;
        self.run_webpack_functions()?;
        self.run_cli_option()?;
        self.filter_cancelled_tasks();
        Ok(())
    }

    /// Run the pipeline and dispatch to the registered command module. On
    /// any fatal pipeline error the `error` hook fires before the error
    /// surfaces to the caller.
    pub fn run(&mut self, options: &RunOptions) -> Result<CommandOutcome> {
        debug!("{} cli options: {:?}", self.command, self.command_args);
        if let Err(err) = self.set_up() {
            error!("failed to resolve build configuration");
            self.apply_hook("error", &json!({ "error": err.to_string() }))?;
            return Err(err);
        }
        let module = self.command_module(&self.command)?;
        module.run(self, options)
    }

    // ------------------------------------------------------------------
    // Accessors for command modules
    // ------------------------------------------------------------------

    pub fn tasks(&self) -> &[TaskConfig] {
        &self.tasks
    }

    pub fn tasks_mut(&mut self) -> &mut [TaskConfig] {
        &mut self.tasks
    }

    /// Serialized task configs in final order; opaque builder types
    /// serialize as null
    pub fn task_config_values(&self) -> Vec<Value> {
        self.tasks
            .iter()
            .map(|task| task.config_value().unwrap_or(Value::Null))
            .collect()
    }

    /// Context snapshot handed to plugins and config-apply functions
    pub fn snapshot(&self, task_name: Option<String>) -> PluginContext {
        PluginContext {
            command: self.command.clone(),
            command_args: self.command_args.clone(),
            root_dir: self.root_dir.clone(),
            user_config: self.user_config.clone(),
            original_user_config: self.original_user_config.clone(),
            pkg: self.pkg.clone(),
            webpack: self.webpack.clone(),
            task_name,
        }
    }
}

/// Best-effort read of a JSON file in the project root; unreadable or
/// malformed files yield an empty object
fn read_project_file(root_dir: &std::path::Path) -> Value {
    let path = root_dir.join(PKG_FILE);
    if !path.exists() {
        return Value::Object(Map::new());
    }
    match std::fs::read_to_string(&path)
        .map_err(Error::from)
        .and_then(|contents| serde_json::from_str(&contents).map_err(Error::from))
    {
        Ok(pkg) => pkg,
        Err(err) => {
            info!(
                "failed to load {}, using empty object: {}",
                path.display(),
                err
            );
            Value::Object(Map::new())
        }
    }
}
