//! qwerboom - plugin-driven build orchestration CLI
//!
//! Thin shell over `qwerboom-core`: parses the command line, wires the
//! built-in web-app plugin and the process-spawning backend into an
//! orchestrator, and dispatches to the per-command drivers.

pub mod backend;
pub mod cli;
pub mod commands;
pub mod drivers;
pub mod plugins;

pub use backend::ProcessBackend;
pub use cli::{Cli, Commands};
pub use plugins::web_app_plugin;
