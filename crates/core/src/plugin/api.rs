//! Capability-scoped API handed to plugin entry functions
//!
//! One `PluginApi` is constructed per plugin invocation. It borrows the
//! orchestrator, so everything a plugin registers lands directly in shared
//! state; there is no isolation between plugins by design.

use std::any::Any;
use std::sync::Arc;

use serde_json::Value;

use crate::context::Context;
use crate::error::Result;
use crate::registration::{
    CliOptionRegistration, MethodOptions, RegistrationKind, RegistrationModification,
    UserConfigRegistration,
};
use crate::task::{ChainConfig, MutatorTarget, PluginContext};

pub struct PluginApi<'a> {
    ctx: &'a mut Context,
    plugin_name: Option<String>,
}

impl<'a> PluginApi<'a> {
    pub(crate) fn new(ctx: &'a mut Context, plugin_name: Option<String>) -> Self {
        Self { ctx, plugin_name }
    }

    /// Name of the plugin this API was scoped to, when it was resolved
    /// from a named specifier
    pub fn plugin_name(&self) -> Option<&str> {
        self.plugin_name.as_deref()
    }

    /// Snapshot of the orchestrator state visible to plugins
    pub fn context(&self) -> PluginContext {
        self.ctx.snapshot(None)
    }

    pub fn register_task(&mut self, name: &str, chain_config: ChainConfig) -> Result<()> {
        self.ctx.register_task(name, chain_config)
    }

    pub fn get_all_task(&self) -> Vec<String> {
        self.ctx.get_all_task()
    }

    pub fn get_all_plugin(&self) -> Vec<Value> {
        self.ctx.get_all_plugin()
    }

    pub fn cancel_task(&mut self, name: &str) {
        self.ctx.cancel_task(name)
    }

    /// Queue a mutator for every task's config builder
    pub fn on_get_webpack_config(
        &mut self,
        mutator: impl Fn(&mut dyn Any) -> Result<()> + 'static,
    ) {
        self.ctx
            .on_get_webpack_config(MutatorTarget::All, Arc::new(mutator));
    }

    /// Queue a mutator for one named task's config builder
    pub fn on_get_task_webpack_config(
        &mut self,
        task_name: &str,
        mutator: impl Fn(&mut dyn Any) -> Result<()> + 'static,
    ) {
        self.ctx.on_get_webpack_config(
            MutatorTarget::Task(task_name.to_string()),
            Arc::new(mutator),
        );
    }

    pub fn on_get_jest_config(&mut self, modifier: impl Fn(&Value) -> Result<Value> + 'static) {
        self.ctx.on_get_jest_config(Arc::new(modifier));
    }

    pub fn on_hook(&mut self, key: &str, handler: impl Fn(&Value) -> Result<()> + 'static) {
        self.ctx.on_hook(key, Arc::new(handler));
    }

    pub fn apply_hook(&self, key: &str, payload: &Value) -> Result<()> {
        self.ctx.apply_hook(key, payload)
    }

    pub fn set_value(&mut self, key: &str, value: Value) {
        self.ctx.set_value(key, value)
    }

    pub fn get_value(&self, key: &str) -> Option<&Value> {
        self.ctx.get_value(key)
    }

    pub fn register_user_config(
        &mut self,
        registrations: impl IntoIterator<Item = UserConfigRegistration>,
    ) -> Result<()> {
        self.ctx.register_user_config(registrations)
    }

    pub fn register_cli_option(
        &mut self,
        registrations: impl IntoIterator<Item = CliOptionRegistration>,
    ) -> Result<()> {
        self.ctx.register_cli_option(registrations)
    }

    pub fn has_registration(&self, name: &str, kind: RegistrationKind) -> bool {
        self.ctx.has_registration(name, kind)
    }

    pub fn register_method(
        &mut self,
        name: &str,
        func: impl Fn(&[Value]) -> Result<Value> + 'static,
        options: MethodOptions,
    ) -> Result<()> {
        self.ctx.register_method(name, Arc::new(func), options)
    }

    pub fn has_method(&self, name: &str) -> bool {
        self.ctx.has_method(name)
    }

    /// Invoke a registered method on behalf of this plugin
    pub fn apply_method(&self, name: &str, args: &[Value]) -> Result<Value> {
        self.ctx.apply_method(name, self.plugin_name.as_deref(), args)
    }

    pub fn modify_user_config(&mut self, key: &str, value: Value, deepmerge: bool) -> Result<()> {
        self.ctx.modify_user_config(key, value, deepmerge)
    }

    pub fn modify_user_config_at(
        &mut self,
        key: &str,
        update: impl Fn(Option<&Value>) -> Value,
        deepmerge: bool,
    ) -> Result<()> {
        self.ctx.modify_user_config_at(key, update, deepmerge)
    }

    pub fn transform_user_config(
        &mut self,
        transform: impl Fn(&Value) -> Value,
        deepmerge: bool,
    ) -> Result<()> {
        self.ctx.transform_user_config(transform, deepmerge)
    }

    pub fn modify_config_registration(
        &mut self,
        modification: RegistrationModification<UserConfigRegistration>,
    ) {
        self.ctx.modify_config_registration(modification)
    }

    pub fn modify_cli_registration(
        &mut self,
        modification: RegistrationModification<CliOptionRegistration>,
    ) {
        self.ctx.modify_cli_registration(modification)
    }
}
