// script_runner/src/script_entry.rs
//! Persisted registry record: which script, under which alias, run by what.
//!
//! On-disk shape is a flat object with string values:
//! `{"path": ..., "alias": ..., "interpreter": ..., "type": "python" | "shell"}`.
//!
//! Registries written by the earlier python tool hold
//! `{"path", "alias", "directory_id", "venv"}` records with no `interpreter`
//! or `type`. Those are read through [`StoredEntry`] and completed by the
//! registry on load; `directory_id` is dropped.

use serde::{Deserialize, Serialize};
use std::{
    fmt,
    path::{Path, PathBuf},
};

/// Governs interpreter resolution and launch policy.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ScriptType {
    Python,
    Shell,
}

impl ScriptType {
    /// Case-insensitive parse; `None` for anything else.
    pub fn from_str_ic<S: AsRef<str>>(s: S) -> Option<Self> {
        match s.as_ref().trim().to_ascii_lowercase().as_str() {
            "python" | "py" => Some(ScriptType::Python),
            "shell" | "sh"  => Some(ScriptType::Shell),
            _               => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ScriptType::Python => "python",
            ScriptType::Shell  => "shell",
        }
    }
}

impl fmt::Display for ScriptType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct ScriptEntry {
    /// Absolute path of the script file.
    pub path: PathBuf,
    /// Unique lookup key.
    pub alias: String,
    /// Absolute path of the executable that launches `path`.
    pub interpreter: PathBuf,
    #[serde(rename = "type")]
    pub script_type: ScriptType,
}

/// A record as found on disk, before missing fields are filled in.
#[derive(Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct StoredEntry {
    pub path: PathBuf,
    pub alias: String,
    #[serde(default)]
    pub interpreter: Option<PathBuf>,
    #[serde(default, rename = "type")]
    pub script_type: Option<ScriptType>,
    /// Legacy per-script virtualenv root; empty string means none.
    #[serde(default)]
    pub venv: Option<PathBuf>,
}

impl StoredEntry {
    /// The record already has everything a `ScriptEntry` needs.
    pub fn into_complete(self) -> Result<ScriptEntry, Self> {
        match (&self.interpreter, self.script_type) {
            (Some(i), Some(t)) if !i.as_os_str().is_empty() => {
                Ok(ScriptEntry::new(self.path, self.alias, i.clone(), t))
            }
            _ => Err(self),
        }
    }

    pub fn legacy_venv(&self) -> Option<&Path> {
        self.venv.as_deref().filter(|v| !v.as_os_str().is_empty())
    }
}

impl ScriptEntry {
    pub fn new(
        path: impl Into<PathBuf>,
        alias: impl Into<String>,
        interpreter: impl Into<PathBuf>,
        script_type: ScriptType,
    ) -> Self {
        Self {
            path: path.into(),
            alias: alias.into(),
            interpreter: interpreter.into(),
            script_type,
        }
    }

    pub fn is_for(&self, path: &Path) -> bool {
        self.path == path
    }

    /// True when the script file is gone from disk (prune candidate).
    pub fn is_stale(&self) -> bool {
        !self.path.exists()
    }
}
