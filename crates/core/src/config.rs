//! User config file discovery, loading, and mode overlay

use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::debug;

use crate::error::{Error, Result};
use crate::merge;

/// Candidate config filenames probed in the project root, in order
pub const USER_CONFIG_FILES: &[&str] = &["build.json", "build.config.json"];

/// Config keys owned by the engine itself; never routed through the
/// user-config registry
pub const RESERVED_CONFIG_KEYS: &[&str] = &["plugins", "customWebpack", "modeConfig"];

/// Loads a config file from disk into a plain key-value tree. Pluggable so
/// embedders can support formats beyond JSON.
pub trait ConfigLoader {
    fn load(&self, path: &Path) -> Result<Value>;
}

/// Default loader: strict JSON, top level must be an object
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonConfigLoader;

impl ConfigLoader for JsonConfigLoader {
    fn load(&self, path: &Path) -> Result<Value> {
        let contents = std::fs::read_to_string(path).map_err(|err| {
            Error::ConfigLoad(format!("failed to read config file {}: {err}", path.display()))
        })?;
        let config: Value = serde_json::from_str(&contents).map_err(|err| {
            Error::ConfigLoad(format!("failed to parse config file {}: {err}", path.display()))
        })?;
        if !config.is_object() {
            return Err(Error::ConfigLoad(format!(
                "config file {} must contain an object at the top level",
                path.display()
            )));
        }
        Ok(config)
    }
}

/// Locate the user config file: an explicit path from the CLI wins,
/// otherwise the first existing candidate filename in the root dir.
/// A missing config file is fatal.
pub fn find_config_file(root_dir: &Path, explicit: Option<&str>) -> Result<PathBuf> {
    if let Some(explicit) = explicit {
        let path = if Path::new(explicit).is_absolute() {
            PathBuf::from(explicit)
        } else {
            root_dir.join(explicit)
        };
        if !path.exists() {
            return Err(Error::ConfigLoad(format!(
                "config file ({}) does not exist",
                path.display()
            )));
        }
        return Ok(path);
    }

    for candidate in USER_CONFIG_FILES {
        let path = root_dir.join(candidate);
        if path.exists() {
            debug!("found config file at {}", path.display());
            return Ok(path);
        }
    }

    Err(Error::ConfigLoad(format!(
        "no config file ({}) found in {}",
        USER_CONFIG_FILES.join(", "),
        root_dir.display()
    )))
}

/// Apply the `modeConfig.<mode>` overlay: top-level keys of the mode block
/// replace their base counterparts, except `plugins`, which merges against
/// the base plugin list by plugin name.
pub fn apply_mode_overlay(mut user_config: Value, mode: Option<&str>) -> Value {
    let mode = match mode {
        Some(mode) => mode,
        None => return user_config,
    };
    let mode_block = match user_config.get("modeConfig").and_then(|m| m.get(mode)) {
        Some(Value::Object(block)) => block.clone(),
        _ => return user_config,
    };

    debug!("applying mode config '{}'", mode);
    let base_plugins: Vec<Value> = match user_config.get("plugins") {
        Some(Value::Array(plugins)) => plugins.clone(),
        _ => Vec::new(),
    };
    let mut merged_plugins = base_plugins;

    for (key, value) in mode_block {
        if key == "plugins" {
            if let Value::Array(overlay) = value {
                merged_plugins = merge::merge_plugin_lists(&merged_plugins, &overlay);
            }
        } else if let Some(config) = user_config.as_object_mut() {
            config.insert(key, value);
        }
    }

    if let Some(config) = user_config.as_object_mut() {
        config.insert("plugins".to_string(), Value::Array(merged_plugins));
    }
    user_config
}
