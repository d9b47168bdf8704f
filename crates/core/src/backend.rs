//! Build backend collaborator interface
//!
//! The engine never bundles anything itself; it resolves a backend handle
//! during config resolution and passes finished configuration trees to a
//! `BuildBackend` implementation supplied by the embedding program.

use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::Result;
use crate::utils;

/// Default backend program, resolved from PATH unless a project-local
/// override is requested.
pub const DEFAULT_BACKEND: &str = "webpack";

/// Resolved backend handle, exposed to plugins through the context snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BackendDescriptor {
    pub name: String,
    pub program: PathBuf,
    /// True when the project-local override took effect
    pub custom: bool,
}

/// Resolve the backend program. When `custom` is set the project-local
/// installation under `node_modules/.bin` is preferred, so every later
/// consumer of the handle picks up the override transitively.
pub fn resolve_backend(root_dir: &Path, custom: bool) -> BackendDescriptor {
    if custom {
        let local = root_dir.join("node_modules").join(".bin").join(DEFAULT_BACKEND);
        if local.exists() {
            debug!("using project-local backend at {}", local.display());
            return BackendDescriptor {
                name: DEFAULT_BACKEND.to_string(),
                program: local,
                custom: true,
            };
        }
        warn!(
            "customWebpack is set but no local backend found under {}, falling back to PATH",
            root_dir.display()
        );
    }
    BackendDescriptor {
        name: DEFAULT_BACKEND.to_string(),
        program: PathBuf::from(DEFAULT_BACKEND),
        custom: false,
    }
}

/// Driver-facing backend contract. `configs` are the serialized task
/// configuration trees in final task order.
pub trait BuildBackend {
    fn descriptor(&self) -> &BackendDescriptor;

    /// Start a dev server for the given configs
    fn serve(&self, configs: &[Value], dev_server: &Value) -> Result<Value>;

    /// Run a production build
    fn build(&self, configs: &[Value]) -> Result<Value>;

    /// Run the test runner with a finished runner config
    fn run_tests(&self, config: &Value, extra_args: &[String]) -> Result<Value>;
}

/// Stock configuration builder handed to `register_task` by plugins that
/// have no richer builder of their own: a JSON tree addressed by
/// dot-separated paths.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChainedConfig {
    root: Value,
}

impl ChainedConfig {
    pub fn new() -> Self {
        Self {
            root: Value::Object(serde_json::Map::new()),
        }
    }

    /// Set a value at a dot-separated path, creating intermediate objects
    pub fn set(&mut self, path: &str, value: impl Into<Value>) -> &mut Self {
        utils::set_path(&mut self.root, path, value.into());
        self
    }

    pub fn get(&self, path: &str) -> Option<&Value> {
        utils::get_path(&self.root, path)
    }

    /// Append a value to the array at a path, creating the array if absent.
    /// A non-array value at the path is replaced by a one-element array
    /// before the append.
    pub fn append(&mut self, path: &str, value: impl Into<Value>) -> &mut Self {
        let current = utils::get_path(&self.root, path).cloned();
        let mut items = match current {
            Some(Value::Array(items)) => items,
            Some(other) => vec![other],
            None => Vec::new(),
        };
        items.push(value.into());
        utils::set_path(&mut self.root, path, Value::Array(items));
        self
    }

    /// Deep-merge a value into the subtree at a path
    pub fn merge(&mut self, path: &str, value: &Value) -> &mut Self {
        let merged = match utils::get_path(&self.root, path) {
            Some(current) => crate::merge::merge_values(current, value),
            None => value.clone(),
        };
        utils::set_path(&mut self.root, path, merged);
        self
    }

    pub fn to_value(&self) -> Value {
        self.root.clone()
    }
}
