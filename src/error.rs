// script_runner/src/error.rs

use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced to the user. Detection heuristics never produce these;
/// they degrade to the next fallback tier instead.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("no script registered as \"{0}\"")]
    AliasNotFound(String),

    #[error("alias \"{0}\" is already registered")]
    DuplicateAlias(String),

    #[error("script not found: {}", .0.display())]
    ScriptNotFound(PathBuf),

    #[error("interpreter not found: {}", .0.display())]
    InterpreterNotFound(PathBuf),

    #[error("failed to launch {}: {source}", interpreter.display())]
    Launch {
        interpreter: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("registry file {} is not valid JSON: {source}", path.display())]
    CorruptRegistry {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Valid JSON, but not a list of script records.
    #[error("registry file {} is not in a recognized format: {source}", path.display())]
    UnknownFormat {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T, E = RegistryError> = std::result::Result<T, E>;
