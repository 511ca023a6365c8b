// script_runner/src/config.rs
//! Where the registry lives and the defaults used when adding scripts.
//!
//! Layers, lowest first: built-in defaults, `<config dir>/config.json`,
//! `SCRIPT_RUNNER_HOME`, command-line flags (applied by the caller).

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    env, fs,
    path::{Path, PathBuf},
};

use crate::{interpreter::FALLBACK_SHELL, venv::DEFAULT_VENV_DEPTH};

pub const HOME_ENV: &str = "SCRIPT_RUNNER_HOME";
pub const REGISTRY_FILE: &str = "scripts.json";
pub const CONFIG_FILE: &str = "config.json";

/// Optional user file. Missing keys keep their defaults.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(default)]
pub struct FileConfig {
    /// Ascents searched for a venv; 0 = unbounded.
    pub venv_depth: usize,
    pub default_shell: Option<PathBuf>,
}

impl Default for FileConfig {
    fn default() -> Self {
        Self { venv_depth: DEFAULT_VENV_DEPTH, default_shell: None }
    }
}

#[derive(Clone, Debug)]
pub struct Settings {
    pub registry_file: PathBuf,
    pub venv_depth: usize,
    pub default_shell: Option<PathBuf>,
}

impl Settings {
    /// Resolve settings; `config_dir` (from `--config-dir`) wins over everything.
    pub fn load(config_dir: Option<&Path>) -> Result<Self> {
        let dir = match config_dir {
            Some(d) => d.to_path_buf(),
            None => default_config_dir()?,
        };
        Self::load_from(dir)
    }

    pub fn load_from(config_dir: PathBuf) -> Result<Self> {
        let file = config_dir.join(CONFIG_FILE);
        let fc = if file.exists() {
            let raw = fs::read_to_string(&file)
                .with_context(|| format!("reading {}", file.display()))?;
            serde_json::from_str::<FileConfig>(&raw)
                .with_context(|| format!("parsing {}", file.display()))?
        } else {
            FileConfig::default()
        };

        let default_shell = fc
            .default_shell
            .or_else(|| env::var_os("SHELL").filter(|s| !s.is_empty()).map(PathBuf::from))
            .or_else(|| Some(PathBuf::from(FALLBACK_SHELL)));

        Ok(Self {
            registry_file: config_dir.join(REGISTRY_FILE),
            venv_depth: fc.venv_depth,
            default_shell,
        })
    }
}

/// `$SCRIPT_RUNNER_HOME`, else `~/.config/script_runner`.
pub fn default_config_dir() -> Result<PathBuf> {
    if let Some(dir) = env::var_os(HOME_ENV).filter(|s| !s.is_empty()) {
        return Ok(PathBuf::from(dir));
    }
    let home = dirs::home_dir().context("cannot determine home directory")?;
    Ok(home.join(".config").join("script_runner"))
}
