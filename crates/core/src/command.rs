//! Command-module contract
//!
//! Command modules are the dev-server / production-build / test-runner
//! drivers. The engine's only obligation to them is registration, lookup by
//! exact name, and a single invocation with the finished task list.

use serde_json::Value;

use crate::context::Context;
use crate::error::Result;

/// Options forwarded from the CLI to the command module
#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    /// Return the resolved task-config list instead of invoking the backend
    pub eject: bool,
}

/// What a command module produced
#[derive(Debug, Clone, PartialEq)]
pub enum CommandOutcome {
    /// The serialized task-config list, in final task order
    Ejected(Vec<Value>),
    /// Backend result payload
    Finished(Value),
}

pub trait CommandModule {
    fn run(&self, ctx: &mut Context, options: &RunOptions) -> Result<CommandOutcome>;
}

impl<F> CommandModule for F
where
    F: Fn(&mut Context, &RunOptions) -> Result<CommandOutcome>,
{
    fn run(&self, ctx: &mut Context, options: &RunOptions) -> Result<CommandOutcome> {
        self(ctx, options)
    }
}
