use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::commands::{build_command, start_command, test_command};

#[derive(Parser, Debug)]
#[command(name = "qwerboom")]
#[command(version, about = "Plugin-driven build orchestration", long_about = None)]
#[command(after_help = "ENVIRONMENT:\n    RUST_LOG=debug    Enable debug logging")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the dev server
    Start {
        /// Dev server port
        #[arg(short, long)]
        port: Option<u16>,

        /// Dev server host
        #[arg(long)]
        host: Option<String>,

        /// Serve over https
        #[arg(long)]
        https: bool,

        /// Path to the build config file, relative to the project root
        #[arg(short, long)]
        config: Option<String>,

        /// Mode overlay to apply from modeConfig
        #[arg(short, long)]
        mode: Option<String>,

        /// Print the resolved task configs instead of starting
        #[arg(long)]
        eject: bool,
    },
    /// Run a production build
    Build {
        /// Path to the build config file, relative to the project root
        #[arg(short, long)]
        config: Option<String>,

        /// Mode overlay to apply from modeConfig
        #[arg(short, long)]
        mode: Option<String>,

        /// Print the resolved task configs instead of building
        #[arg(long)]
        eject: bool,
    },
    /// Run the test suite
    Test {
        /// Path to the build config file, relative to the project root
        #[arg(short, long)]
        config: Option<String>,

        /// Mode overlay to apply from modeConfig
        #[arg(short, long)]
        mode: Option<String>,

        /// Arguments forwarded to the test runner
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        runner_args: Vec<String>,
    },
}

impl Commands {
    pub fn execute(self) -> Result<()> {
        match self {
            Commands::Start {
                port,
                host,
                https,
                config,
                mode,
                eject,
            } => start_command(port, host.as_deref(), https, config.as_deref(), mode.as_deref(), eject),
            Commands::Build {
                config,
                mode,
                eject,
            } => build_command(config.as_deref(), mode.as_deref(), eject),
            Commands::Test {
                config,
                mode,
                runner_args,
            } => test_command(config.as_deref(), mode.as_deref(), &runner_args),
        }
    }
}
