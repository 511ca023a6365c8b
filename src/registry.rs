// script_runner/src/registry.rs
//! The registry file: a pretty-printed JSON array of `ScriptEntry`.
//!
//! One `Registry` value lives for one command invocation. Mutations touch the
//! in-memory list only; `persist()` is the single write boundary and replaces
//! the file atomically (temp file in the same dir, then rename). A registry
//! path that is a symlink keeps pointing at the same file: the write lands
//! next to the link target, and the target's permissions are carried over.
//!
//! Records from the earlier python tool are completed on load (see
//! [`migrate`]) and written back in the current shape on the next persist.

use std::{
    fs,
    io::Write,
    path::{Path, PathBuf},
};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use crate::{
    detect,
    error::{RegistryError, Result},
    interpreter::{self, InterpreterResolver, VenvPolicy, FALLBACK_SHELL},
    script_entry::{ScriptEntry, ScriptType, StoredEntry},
};

#[derive(Debug)]
pub struct Registry {
    path: PathBuf,
    entries: Vec<ScriptEntry>,
}

impl Registry {
    /// Load `path`; a missing file is an empty registry.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let entries = if path.exists() {
            let raw = fs::read_to_string(&path)?;
            if raw.trim().is_empty() {
                Vec::new()
            } else {
                let stored: Vec<StoredEntry> = serde_json::from_str(&raw).map_err(|source| {
                    if source.is_data() {
                        RegistryError::UnknownFormat { path: path.clone(), source }
                    } else {
                        RegistryError::CorruptRegistry { path: path.clone(), source }
                    }
                })?;
                stored.into_iter().map(migrate).collect()
            }
        } else {
            Vec::new()
        };
        debug!(path = %path.display(), count = entries.len(), "registry loaded");
        Ok(Self { path, entries })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn entries(&self) -> &[ScriptEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get_alias(&self, alias: &str) -> Option<&ScriptEntry> {
        self.entries.iter().find(|e| e.alias == alias)
    }

    /// Look up by alias, or by exact script path. Ambiguous path matches are
    /// reported the same as no match.
    pub fn find(&self, identifier: &str) -> Result<&ScriptEntry> {
        if let Some(e) = self.get_alias(identifier) {
            return Ok(e);
        }
        let wanted = Path::new(identifier)
            .canonicalize()
            .unwrap_or_else(|_| PathBuf::from(identifier));
        let by_path: Vec<&ScriptEntry> = self.entries.iter().filter(|e| e.is_for(&wanted)).collect();
        match by_path.as_slice() {
            [one] => Ok(*one),
            _ => Err(RegistryError::AliasNotFound(identifier.to_string())),
        }
    }

    /// Append a new entry. The alias must not already be taken.
    pub fn append(&mut self, entry: ScriptEntry) -> Result<()> {
        if self.get_alias(&entry.alias).is_some() {
            return Err(RegistryError::DuplicateAlias(entry.alias));
        }
        self.entries.push(entry);
        Ok(())
    }

    pub fn remove_alias(&mut self, alias: &str) -> Result<ScriptEntry> {
        let idx = self
            .entries
            .iter()
            .position(|e| e.alias == alias)
            .ok_or_else(|| RegistryError::AliasNotFound(alias.to_string()))?;
        Ok(self.entries.remove(idx))
    }

    /// Remove every alias of `path`; if `path` is a directory, every entry
    /// whose script lives beneath it.
    pub fn remove_path(&mut self, path: &Path) -> Result<Vec<ScriptEntry>> {
        let target = path
            .canonicalize()
            .map_err(|_| RegistryError::ScriptNotFound(path.to_path_buf()))?;
        let is_dir = target.is_dir();

        let (removed, kept): (Vec<ScriptEntry>, Vec<ScriptEntry>) =
            std::mem::take(&mut self.entries).into_iter().partition(|e| {
                let p = e.path.canonicalize().unwrap_or_else(|_| e.path.clone());
                if is_dir { p.starts_with(&target) } else { p == target }
            });
        self.entries = kept;

        if removed.is_empty() {
            return Err(RegistryError::ScriptNotFound(target));
        }
        Ok(removed)
    }

    /// Drop entries whose script file is gone. Returns what was dropped.
    pub fn prune(&mut self) -> Vec<ScriptEntry> {
        let (stale, live): (Vec<ScriptEntry>, Vec<ScriptEntry>) =
            std::mem::take(&mut self.entries).into_iter().partition(ScriptEntry::is_stale);
        self.entries = live;
        stale
    }

    /// Write the registry to disk (2-space indented JSON, trailing newline).
    pub fn persist(&self) -> Result<()> {
        let dir = match self.path.parent() {
            Some(d) if !d.as_os_str().is_empty() => d.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir)?;

        let mut body = serde_json::to_string_pretty(&self.entries)
            .map_err(std::io::Error::from)?;
        body.push('\n');

        // replace the file a symlink points at, never the link itself
        let target = fs::canonicalize(&self.path).unwrap_or_else(|_| self.path.clone());
        let dir = match target.parent() {
            Some(d) if !d.as_os_str().is_empty() => d.to_path_buf(),
            _ => dir,
        };
        let permissions = fs::metadata(&target).ok().map(|m| m.permissions());

        let mut tmp = NamedTempFile::new_in(&dir)?;
        tmp.write_all(body.as_bytes())?;
        if let Some(perm) = permissions {
            tmp.as_file().set_permissions(perm)?;
        }
        tmp.as_file().sync_all()?;
        tmp.persist(&target).map_err(|e| e.error)?;

        info!(path = %self.path.display(), count = self.entries.len(), "registry saved");
        Ok(())
    }
}

/// Complete a record read from disk. Legacy records carry a `venv` root (or
/// `""`) and were always run with python: a venv means its python, no venv
/// means type detection plus the venv-free resolution chain. An interpreter
/// that cannot be found is kept as the missing candidate so `run` reports it.
pub fn migrate(stored: StoredEntry) -> ScriptEntry {
    let stored = match stored.into_complete() {
        Ok(entry) => return entry,
        Err(stored) => stored,
    };

    let script_type = match (stored.script_type, stored.legacy_venv()) {
        (Some(t), _) => t,
        (None, Some(_)) => ScriptType::Python,
        (None, None) => detect::detect(&stored.path),
    };
    let interpreter = match stored.interpreter.clone().filter(|p| !p.as_os_str().is_empty()) {
        Some(p) => p,
        None => match stored.legacy_venv() {
            Some(root) if script_type == ScriptType::Python => interpreter::venv_python(root),
            _ => {
                let resolver = InterpreterResolver::new(VenvPolicy::Disabled, None);
                match resolver.resolve(&stored.path, script_type, None) {
                    Ok(p) => p,
                    Err(RegistryError::InterpreterNotFound(p)) => p,
                    Err(e) => {
                        warn!(alias = %stored.alias, error = %e, "could not resolve interpreter for old record");
                        PathBuf::from(FALLBACK_SHELL)
                    }
                }
            }
        },
    };

    info!(alias = %stored.alias, interpreter = %interpreter.display(), "upgraded old registry record");
    ScriptEntry::new(stored.path, stored.alias, interpreter, script_type)
}
