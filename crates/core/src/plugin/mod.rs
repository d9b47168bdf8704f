//! Plugin specifiers, resolution, and loading
//!
//! A plugin list mixes bare names, `[name, options]` pairs, and inline entry
//! functions supplied by the embedding program. Named specifiers resolve to
//! a module path and are loaded through the pluggable [`ModuleLoader`]
//! capability; the default loader is a static name-to-entry map, which keeps
//! orchestration logic independent of how plugin code actually gets into the
//! process.

mod api;

pub use api::PluginApi;

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use crate::error::{Error, Result};

/// Environment variable naming a directory searched before the project root
/// when resolving bare plugin names
pub const EXTRA_PLUGIN_DIR_ENV: &str = "QWERBOOM_EXTRA_PLUGIN_DIR";

/// A unit of orchestrator-extension code. The entry function is invoked
/// exactly once per run, sequentially with all other plugins.
pub trait Plugin {
    fn apply(&self, api: &mut PluginApi<'_>, options: &Value) -> Result<()>;
}

impl<F> Plugin for F
where
    F: Fn(&mut PluginApi<'_>, &Value) -> Result<()>,
{
    fn apply(&self, api: &mut PluginApi<'_>, options: &Value) -> Result<()> {
        self(api, options)
    }
}

/// One entry of a plugin list
#[derive(Clone)]
pub enum PluginSpec {
    /// Bare module name
    Name(String),
    /// `[name, options]` pair
    WithOptions(String, Value),
    /// Inline entry function (built-in plugin lists only; config files
    /// cannot express this form)
    Inline(Arc<dyn Plugin>),
}

impl PluginSpec {
    pub fn inline(plugin: impl Plugin + 'static) -> Self {
        PluginSpec::Inline(Arc::new(plugin))
    }

    /// Parse and shape-check a `plugins` value from a config file. Every
    /// element must be a string or a pair whose head is a string; anything
    /// else fails the whole list.
    pub fn parse_list(value: &Value) -> Result<Vec<PluginSpec>> {
        let entries = value
            .as_array()
            .ok_or_else(|| Error::InvalidPluginList("'plugins' must be an array".into()))?;
        entries.iter().map(PluginSpec::from_value).collect()
    }

    fn from_value(value: &Value) -> Result<PluginSpec> {
        match value {
            Value::String(name) => Ok(PluginSpec::Name(name.clone())),
            Value::Array(pair) => {
                let name = pair
                    .first()
                    .and_then(Value::as_str)
                    .ok_or_else(|| {
                        Error::InvalidPluginList(format!(
                            "plugin entry {value} must start with a plugin name"
                        ))
                    })?
                    .to_string();
                let options = pair.get(1).cloned().unwrap_or(Value::Null);
                Ok(PluginSpec::WithOptions(name, options))
            }
            other => Err(Error::InvalidPluginList(format!(
                "plugin entry {other} must be a string or a [name, options] pair"
            ))),
        }
    }
}

impl fmt::Debug for PluginSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PluginSpec::Name(name) => f.debug_tuple("Name").field(name).finish(),
            PluginSpec::WithOptions(name, options) => {
                f.debug_tuple("WithOptions").field(name).field(options).finish()
            }
            PluginSpec::Inline(_) => f.write_str("Inline(..)"),
        }
    }
}

/// Resolved, loadable plugin
#[derive(Clone)]
pub struct PluginDescriptor {
    /// None for inline plugins
    pub name: Option<String>,
    pub path: Option<PathBuf>,
    pub entry: Arc<dyn Plugin>,
    pub options: Value,
}

impl fmt::Debug for PluginDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginDescriptor")
            .field("name", &self.name)
            .field("path", &self.path)
            .field("options", &self.options)
            .finish()
    }
}

/// Turns a resolved module path into a plugin entry function
pub trait ModuleLoader {
    fn load(&self, name: &str, path: &Path) -> Result<Arc<dyn Plugin>>;
}

/// Default loader backed by a static name-to-entry map registered by the
/// embedding program
#[derive(Default, Clone)]
pub struct StaticModuleLoader {
    entries: HashMap<String, Arc<dyn Plugin>>,
}

impl StaticModuleLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: impl Into<String>, entry: impl Plugin + 'static) {
        self.entries.insert(name.into(), Arc::new(entry));
    }

    pub fn with(mut self, name: impl Into<String>, entry: impl Plugin + 'static) -> Self {
        self.register(name, entry);
        self
    }
}

impl ModuleLoader for StaticModuleLoader {
    fn load(&self, name: &str, _path: &Path) -> Result<Arc<dyn Plugin>> {
        self.entries.get(name).cloned().ok_or_else(|| Error::PluginLoad {
            name: name.to_string(),
            reason: "plugin is not registered with the module loader".to_string(),
        })
    }
}

/// Resolve an ordered spec list into descriptors, preserving order. Load
/// failures abort resolution before any plugin executes.
pub fn resolve_plugins(
    specs: &[PluginSpec],
    root_dir: &Path,
    loader: &dyn ModuleLoader,
) -> Result<Vec<PluginDescriptor>> {
    let mut descriptors = Vec::with_capacity(specs.len());
    for spec in specs {
        let descriptor = match spec {
            PluginSpec::Inline(entry) => PluginDescriptor {
                name: None,
                path: None,
                entry: entry.clone(),
                options: Value::Null,
            },
            PluginSpec::Name(name) => resolve_named(name, Value::Null, root_dir, loader)?,
            PluginSpec::WithOptions(name, options) => {
                resolve_named(name, options.clone(), root_dir, loader)?
            }
        };
        descriptors.push(descriptor);
    }
    Ok(descriptors)
}

fn resolve_named(
    name: &str,
    options: Value,
    root_dir: &Path,
    loader: &dyn ModuleLoader,
) -> Result<PluginDescriptor> {
    let path = resolve_plugin_path(name, root_dir);
    debug!("resolving plugin '{}' at {}", name, path.display());
    let entry = loader.load(name, &path)?;
    Ok(PluginDescriptor {
        name: Some(name.to_string()),
        path: Some(path),
        entry,
        options,
    })
}

/// Compute the module path for a named plugin: absolute names pass through,
/// bare names resolve against the extra plugin dir (when set and matching)
/// and then the project root.
pub fn resolve_plugin_path(name: &str, root_dir: &Path) -> PathBuf {
    let as_path = Path::new(name);
    if as_path.is_absolute() {
        return as_path.to_path_buf();
    }
    if let Ok(extra_dir) = std::env::var(EXTRA_PLUGIN_DIR_ENV) {
        let candidate = Path::new(&extra_dir).join(name);
        if candidate.exists() {
            return candidate;
        }
    }
    root_dir.join(name)
}
