// script_runner/src/add.rs
//! `add`: conflict policy → type detection → interpreter resolution → append
//! and persist. Nothing is removed from the registry until the new entry is
//! known to be valid, so a failed resolution leaves the file untouched.

use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::{
    conflict::{self, ConflictPrompt, Resolution},
    detect, discover,
    error::{RegistryError, Result},
    interpreter::InterpreterResolver,
    registry::Registry,
    script_entry::{ScriptEntry, ScriptType},
    util,
};

/// One script to register.
#[derive(Clone, Debug, Default)]
pub struct AddRequest {
    pub path: PathBuf,
    pub alias: Option<String>,
    pub interpreter: Option<PathBuf>,
    pub script_type: Option<ScriptType>,
    pub force: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AddOutcome {
    Added(ScriptEntry),
    Skipped,
    Cancelled,
}

/// Per-directory tally.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub added: usize,
    pub skipped: usize,
    pub failed: usize,
    pub cancelled: bool,
}

pub struct Adder<'a> {
    registry: &'a mut Registry,
    resolver: &'a InterpreterResolver,
    prompt: &'a mut dyn ConflictPrompt,
}

impl<'a> Adder<'a> {
    pub fn new(
        registry: &'a mut Registry,
        resolver: &'a InterpreterResolver,
        prompt: &'a mut dyn ConflictPrompt,
    ) -> Self {
        Self { registry, resolver, prompt }
    }

    /// Register a single script and persist on success.
    pub fn add(&mut self, req: &AddRequest) -> Result<AddOutcome> {
        self.add_one(req, false)
    }

    /// Register every runnable script under `dir`. `report` sees each item's
    /// result as it happens. Only `Cancel` stops the batch early.
    pub fn add_directory<F>(&mut self, dir: &Path, template: &AddRequest, mut report: F) -> Result<BatchSummary>
    where
        F: FnMut(&Path, &Result<AddOutcome>),
    {
        let dir = dir
            .canonicalize()
            .map_err(|_| RegistryError::ScriptNotFound(dir.to_path_buf()))?;
        if template.alias.is_some() {
            warn!("--alias is ignored when adding a directory");
        }

        let mut summary = BatchSummary::default();
        for script in discover::runnable_scripts(&dir) {
            let req = AddRequest { path: script.clone(), alias: None, ..template.clone() };
            let res = self.add_one(&req, true);
            report(&script, &res);
            match res {
                Ok(AddOutcome::Added(_)) => summary.added += 1,
                Ok(AddOutcome::Skipped) => summary.skipped += 1,
                Ok(AddOutcome::Cancelled) => {
                    summary.cancelled = true;
                    break;
                }
                Err(_) => summary.failed += 1,
            }
        }
        info!(dir = %dir.display(), ?summary, "directory add finished");
        Ok(summary)
    }

    fn add_one(&mut self, req: &AddRequest, batch: bool) -> Result<AddOutcome> {
        let path = req
            .path
            .canonicalize()
            .map_err(|_| RegistryError::ScriptNotFound(req.path.clone()))?;
        if !path.is_file() {
            return Err(RegistryError::ScriptNotFound(path));
        }
        let alias = req.alias.clone().unwrap_or_else(|| util::default_alias(&path));

        let removing = match conflict::resolve(
            &alias,
            &path,
            self.registry.entries(),
            req.force,
            batch,
            &mut *self.prompt,
        )? {
            Resolution::Add => Vec::new(),
            Resolution::Overwrite(aliases) => aliases,
            Resolution::Skip => return Ok(AddOutcome::Skipped),
            Resolution::Cancel => return Ok(AddOutcome::Cancelled),
        };

        let script_type = req.script_type.unwrap_or_else(|| detect::detect(&path));
        let interpreter = self
            .resolver
            .resolve(&path, script_type, req.interpreter.as_deref())?;

        for a in &removing {
            self.registry.remove_alias(a)?;
        }
        let entry = ScriptEntry::new(path, alias, interpreter, script_type);
        self.registry.append(entry.clone())?;
        self.registry.persist()?;

        info!(alias = %entry.alias, replaced = ?removing, "script added");
        Ok(AddOutcome::Added(entry))
    }
}
