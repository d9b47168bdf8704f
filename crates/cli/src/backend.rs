//! Process-spawning backend
//!
//! Serialized task configs are handed to the backend programs through a
//! config file under `.qwerboom/` in the project root.

use std::path::{Path, PathBuf};
use std::process::Command;

use serde_json::{json, Value};
use tracing::{debug, info};

use qwerboom_core::{resolve_backend, BackendDescriptor, BuildBackend, Error, Result};

const WORK_DIR: &str = ".qwerboom";
const TEST_RUNNER: &str = "jest";

pub struct ProcessBackend {
    descriptor: BackendDescriptor,
    root_dir: PathBuf,
}

impl ProcessBackend {
    pub fn from_cwd() -> anyhow::Result<Self> {
        let root_dir = std::env::current_dir()?;
        Ok(Self::new(root_dir))
    }

    pub fn new(root_dir: PathBuf) -> Self {
        // prefer a project-local installation when one exists
        let local = local_binary(&root_dir, qwerboom_core::DEFAULT_BACKEND);
        let descriptor = resolve_backend(&root_dir, local.is_some());
        Self {
            descriptor,
            root_dir,
        }
    }

    fn write_config_file(&self, name: &str, config: &Value) -> Result<PathBuf> {
        let dir = self.root_dir.join(WORK_DIR);
        std::fs::create_dir_all(&dir)?;
        let path = dir.join(name);
        std::fs::write(&path, serde_json::to_string_pretty(config)?)?;
        debug!("wrote backend config to {}", path.display());
        Ok(path)
    }

    fn spawn(&self, program: &Path, args: &[String]) -> Result<Value> {
        info!("running {} {}", program.display(), args.join(" "));
        let status = Command::new(program)
            .args(args)
            .current_dir(&self.root_dir)
            .status()
            .map_err(|err| {
                Error::Other(format!("failed to launch {}: {err}", program.display()))
            })?;
        if !status.success() {
            return Err(Error::Other(format!(
                "{} exited with {}",
                program.display(),
                status
            )));
        }
        Ok(json!({"exitCode": status.code().unwrap_or(0)}))
    }
}

impl BuildBackend for ProcessBackend {
    fn descriptor(&self) -> &BackendDescriptor {
        &self.descriptor
    }

    fn serve(&self, configs: &[Value], dev_server: &Value) -> Result<Value> {
        let path = self.write_config_file(
            "webpack.config.json",
            &json!({"configs": configs, "devServer": dev_server}),
        )?;
        let mut args = vec!["serve".to_string(), "--config".to_string(), path.display().to_string()];
        if let Some(port) = dev_server.get("port") {
            args.push("--port".into());
            args.push(port.to_string());
        }
        if let Some(host) = dev_server.get("host").and_then(Value::as_str) {
            args.push("--host".into());
            args.push(host.to_string());
        }
        if dev_server.get("https").and_then(Value::as_bool).unwrap_or(false) {
            args.push("--https".into());
        }
        self.spawn(&self.descriptor.program, &args)
    }

    fn build(&self, configs: &[Value]) -> Result<Value> {
        let path =
            self.write_config_file("webpack.config.json", &json!({"configs": configs}))?;
        let args = vec!["--config".to_string(), path.display().to_string()];
        self.spawn(&self.descriptor.program, &args)
    }

    fn run_tests(&self, config: &Value, extra_args: &[String]) -> Result<Value> {
        let path = self.write_config_file("jest.config.json", config)?;
        let runner = local_binary(&self.root_dir, TEST_RUNNER)
            .unwrap_or_else(|| PathBuf::from(TEST_RUNNER));
        let mut args = vec!["--config".to_string(), path.display().to_string()];
        args.extend_from_slice(extra_args);
        self.spawn(&runner, &args)
    }
}

fn local_binary(root_dir: &Path, name: &str) -> Option<PathBuf> {
    let path = root_dir.join("node_modules").join(".bin").join(name);
    path.exists().then_some(path)
}
