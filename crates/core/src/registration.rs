//! Option, method, and registration-modification descriptors

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use serde_json::Value;

use crate::error::{Error, Result};
use crate::registry::Registry;
use crate::task::ConfigApplyFn;
use crate::validation::Validation;

/// Which option namespace a lookup targets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrationKind {
    UserConfig,
    CliOption,
}

/// Descriptor for one user-config key
#[derive(Clone, Default)]
pub struct UserConfigRegistration {
    pub name: String,
    pub validation: Option<Validation>,
    pub config_webpack: Option<ConfigApplyFn>,
    /// Regex patterns matched against task names; matching tasks are
    /// skipped by the config-apply pass
    pub ignore_tasks: Option<Vec<String>>,
    /// Written into the user config when the key is absent
    pub default_value: Option<Value>,
}

impl UserConfigRegistration {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn validation(mut self, validation: Validation) -> Self {
        self.validation = Some(validation);
        self
    }

    pub fn config_webpack(
        mut self,
        apply: impl Fn(&mut dyn std::any::Any, &Value, &crate::task::PluginContext) -> Result<()>
            + 'static,
    ) -> Self {
        self.config_webpack = Some(Arc::new(apply));
        self
    }

    pub fn ignore_tasks(mut self, patterns: Vec<String>) -> Self {
        self.ignore_tasks = Some(patterns);
        self
    }

    pub fn default_value(mut self, value: Value) -> Self {
        self.default_value = Some(value);
        self
    }
}

impl fmt::Debug for UserConfigRegistration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserConfigRegistration")
            .field("name", &self.name)
            .field("validation", &self.validation)
            .field("has_config_webpack", &self.config_webpack.is_some())
            .field("ignore_tasks", &self.ignore_tasks)
            .field("default_value", &self.default_value)
            .finish()
    }
}

/// Descriptor for one CLI option. Option names are normalized to camel case
/// at registration time.
#[derive(Clone, Default)]
pub struct CliOptionRegistration {
    pub name: String,
    /// Commands allowed to use this option
    pub commands: Vec<String>,
    pub config_webpack: Option<ConfigApplyFn>,
    pub ignore_tasks: Option<Vec<String>>,
}

impl CliOptionRegistration {
    pub fn new(name: impl Into<String>, commands: &[&str]) -> Self {
        Self {
            name: name.into(),
            commands: commands.iter().map(|c| c.to_string()).collect(),
            ..Default::default()
        }
    }

    pub fn config_webpack(
        mut self,
        apply: impl Fn(&mut dyn std::any::Any, &Value, &crate::task::PluginContext) -> Result<()>
            + 'static,
    ) -> Self {
        self.config_webpack = Some(Arc::new(apply));
        self
    }

    pub fn ignore_tasks(mut self, patterns: Vec<String>) -> Self {
        self.ignore_tasks = Some(patterns);
        self
    }
}

impl fmt::Debug for CliOptionRegistration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CliOptionRegistration")
            .field("name", &self.name)
            .field("commands", &self.commands)
            .field("has_config_webpack", &self.config_webpack.is_some())
            .field("ignore_tasks", &self.ignore_tasks)
            .finish()
    }
}

/// Registered method implementation
pub type MethodFn = Arc<dyn Fn(&[Value]) -> Result<Value>>;

#[derive(Debug, Clone, Copy, Default)]
pub struct MethodOptions {
    /// When set, the implementation expects the calling plugin's name as
    /// its first argument and `apply_method` supplies it.
    pub plugin_name: bool,
}

#[derive(Clone)]
pub struct MethodRegistration {
    pub func: MethodFn,
    pub options: MethodOptions,
}

impl fmt::Debug for MethodRegistration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodRegistration")
            .field("options", &self.options)
            .finish()
    }
}

/// Queued modification of an option registry, applied after all plugins ran
#[derive(Clone)]
pub enum RegistrationModification<T> {
    /// Patch one named registration; fatal if the name is unregistered.
    /// The callback receives the current descriptor and returns its
    /// replacement.
    Named(String, Arc<dyn Fn(&T) -> T>),
    /// Transform over the whole registration map; returned entries replace
    /// or extend the existing ones.
    All(Arc<dyn Fn(&IndexMap<String, T>) -> Vec<(String, T)>>),
}

impl<T> RegistrationModification<T> {
    pub fn named(name: impl Into<String>, patch: impl Fn(&T) -> T + 'static) -> Self {
        RegistrationModification::Named(name.into(), Arc::new(patch))
    }

    pub fn all(transform: impl Fn(&IndexMap<String, T>) -> Vec<(String, T)> + 'static) -> Self {
        RegistrationModification::All(Arc::new(transform))
    }
}

impl<T> fmt::Debug for RegistrationModification<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistrationModification::Named(name, _) => {
                f.debug_tuple("Named").field(name).finish()
            }
            RegistrationModification::All(_) => f.write_str("All(..)"),
        }
    }
}

/// Apply queued modifications to a registry in queue order
pub(crate) fn apply_modifications<T: Clone>(
    registry: &mut Registry<T>,
    modifications: Vec<RegistrationModification<T>>,
) -> Result<()> {
    for modification in modifications {
        match modification {
            RegistrationModification::Named(name, patch) => {
                let current = registry.get(&name).ok_or_else(|| {
                    Error::Other(format!(
                        "config key '{name}' is not registered in {}",
                        registry.kind()
                    ))
                })?;
                let updated = patch(current);
                registry.set(name, updated);
            }
            RegistrationModification::All(transform) => {
                for (name, updated) in transform(registry.entries()) {
                    registry.set(name, updated);
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_named_modification_patches_existing() {
        let mut registry = Registry::new("userConfig");
        registry
            .register("entry", UserConfigRegistration::new("entry"))
            .unwrap();

        let modification = RegistrationModification::named("entry", |current: &UserConfigRegistration| {
            current.clone().ignore_tasks(vec!["ssr".into()])
        });
        apply_modifications(&mut registry, vec![modification]).unwrap();

        assert_eq!(
            registry.get("entry").unwrap().ignore_tasks,
            Some(vec!["ssr".to_string()])
        );
    }

    #[test]
    fn test_named_modification_unregistered_is_fatal() {
        let mut registry: Registry<UserConfigRegistration> = Registry::new("userConfig");
        let modification =
            RegistrationModification::named("missing", |c: &UserConfigRegistration| c.clone());
        assert!(apply_modifications(&mut registry, vec![modification]).is_err());
    }

    #[test]
    fn test_global_modification_replaces_and_extends() {
        let mut registry = Registry::new("cliOption");
        registry
            .register("port", CliOptionRegistration::new("port", &["start"]))
            .unwrap();

        let modification = RegistrationModification::all(|_entries| {
            vec![
                ("port".to_string(), CliOptionRegistration::new("port", &["start", "build"])),
                ("open".to_string(), CliOptionRegistration::new("open", &["start"])),
            ]
        });
        apply_modifications(&mut registry, vec![modification]).unwrap();

        assert_eq!(registry.get("port").unwrap().commands, vec!["start", "build"]);
        assert!(registry.has("open"));
    }
}
