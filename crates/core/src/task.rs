//! Named build tasks and the function contracts applied to them

use std::any::Any;
use std::path::PathBuf;
use std::sync::Arc;

use serde_json::{Map, Value};

use crate::backend::{BackendDescriptor, ChainedConfig};
use crate::error::Result;

/// One backend configuration builder, owned by a task. The orchestrator
/// never inspects its internals, it only hands it to registered functions.
pub type ChainConfig = Box<dyn Any>;

/// Task mutator queued via `on_get_webpack_config`, applied in
/// registration order.
pub type ChainMutator = Arc<dyn Fn(&mut dyn Any) -> Result<()>>;

/// Config-apply function attached to a user-config or CLI-option
/// registration; receives the task's builder, the configured value, and a
/// per-task context snapshot.
pub type ConfigApplyFn = Arc<dyn Fn(&mut dyn Any, &Value, &PluginContext) -> Result<()>>;

/// Jest-config modifier queued via `on_get_jest_config`
pub type JestConfigFn = Arc<dyn Fn(&Value) -> Result<Value>>;

/// Which tasks a queued mutator applies to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutatorTarget {
    /// Attach to every task
    All,
    /// Attach only to the task with this name
    Task(String),
}

/// One named, mutable build target
pub struct TaskConfig {
    pub name: String,
    pub chain_config: ChainConfig,
    pub(crate) mutators: Vec<ChainMutator>,
}

impl TaskConfig {
    pub fn new(name: impl Into<String>, chain_config: ChainConfig) -> Self {
        Self {
            name: name.into(),
            chain_config,
            mutators: Vec::new(),
        }
    }

    /// Serialize the builder when it is the stock `ChainedConfig` type.
    /// Foreign builder types are opaque and yield `None`.
    pub fn config_value(&self) -> Option<Value> {
        self.chain_config
            .downcast_ref::<ChainedConfig>()
            .map(ChainedConfig::to_value)
    }
}

impl std::fmt::Debug for TaskConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskConfig")
            .field("name", &self.name)
            .field("mutators", &self.mutators.len())
            .finish()
    }
}

/// Context snapshot exposed to plugin entry functions and config-apply
/// functions. `task_name` is set only for config-apply invocations.
#[derive(Debug, Clone, Default)]
pub struct PluginContext {
    pub command: String,
    pub command_args: Map<String, Value>,
    pub root_dir: PathBuf,
    pub user_config: Value,
    pub original_user_config: Value,
    pub pkg: Value,
    pub webpack: Option<BackendDescriptor>,
    pub task_name: Option<String>,
}
