//! qwerboom-core - plugin-driven build configuration orchestration
//!
//! This crate provides the engine behind the `qwerboom` CLI:
//! - Resolve user configuration from disk, with mode overlays
//! - Resolve and sequentially execute plugins that register tasks, config
//!   options, CLI options, methods, and lifecycle hooks
//! - Drive a staged validation/mutation pipeline over the registered tasks
//! - Dispatch the finished task list to a registered command module
pub mod backend;
pub mod command;
pub mod config;
pub mod context;
pub mod error;
pub mod hooks;
pub mod merge;
pub mod plugin;
pub mod registration;
pub mod registry;
pub mod task;
pub mod utils;
pub mod validation;

// Re-export commonly used types and traits
pub use error::{Error, Result};

pub use backend::{resolve_backend, BackendDescriptor, BuildBackend, ChainedConfig, DEFAULT_BACKEND};
pub use command::{CommandModule, CommandOutcome, RunOptions};
pub use config::{ConfigLoader, JsonConfigLoader};
pub use context::{Context, ContextOptions};
pub use plugin::{ModuleLoader, Plugin, PluginApi, PluginSpec, StaticModuleLoader};
pub use registration::{
    CliOptionRegistration, MethodOptions, RegistrationKind, RegistrationModification,
    UserConfigRegistration,
};
pub use task::{MutatorTarget, PluginContext, TaskConfig};
pub use validation::Validation;
