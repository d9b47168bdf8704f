use std::io;

/// Errors that can occur while resolving and orchestrating build configuration
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("'{name}' already registered in {kind}")]
    DuplicateRegistration { kind: &'static str, name: String },

    #[error("[Config File] config key '{0}' is not supported")]
    UnsupportedConfigKey(String),

    #[error("cli option '{option}' is not supported when running command '{command}'")]
    UnsupportedCliOption { option: String, command: String },

    #[error("validation error: {0}")]
    Validation(String),

    #[error("failed to load plugin '{name}': {reason}")]
    PluginLoad { name: String, reason: String },

    #[error("config error: {0}")]
    ConfigLoad(String),

    #[error("command '{0}' is not supported")]
    UnknownCommand(String),

    #[error("plugins did not pass validation: {0}")]
    InvalidPluginList(String),

    #[error("apply unknown method '{0}'")]
    UnknownMethod(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

/// Result type alias for orchestrator operations
pub type Result<T> = std::result::Result<T, Error>;
