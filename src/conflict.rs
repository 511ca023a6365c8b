// script_runner/src/conflict.rs
//! What to do when an added script clashes with the registry.
//!
//! The decision table (`collision`, `options_for`, `outcome`) is pure. Getting
//! the user's pick is delegated to a `ConflictPrompt`, so tests can script it.
//!
//! Evaluation order:
//! 1. alias already taken → {Cancel, Overwrite, Skip*}
//! 2. path has one alias  → {Cancel, Overwrite, Create another, Skip*}
//! 3. path has many       → {Cancel, Remove existing, Create another, Skip*}
//!
//! `*` only inside a directory batch. With `force` an alias clash silently
//! overwrites and a path clash silently adds another alias.

use std::{
    fmt,
    io::{self, BufRead, Write},
    path::Path,
};
use tracing::{debug, info};

use crate::{script_entry::ScriptEntry, util};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Collision {
    Alias(String),
    SinglePath { path: String, alias: String },
    MultiPath { path: String, aliases: Vec<String> },
}

impl fmt::Display for Collision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Collision::Alias(a) => write!(f, "The alias \"{a}\" already exists."),
            Collision::SinglePath { path, alias } => {
                write!(f, "The script \"{path}\" already has an alias: {alias}.")
            }
            Collision::MultiPath { path, aliases } => {
                write!(f, "The script \"{path}\" already has aliases: {}.", aliases.join(", "))
            }
        }
    }
}

/// A choice presented to the user.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConflictOption {
    Cancel,
    Overwrite,
    RemoveExisting,
    CreateAnother,
    Skip,
}

impl ConflictOption {
    pub fn label(self) -> &'static str {
        match self {
            ConflictOption::Cancel         => "Cancel",
            ConflictOption::Overwrite      => "Overwrite Existing Alias",
            ConflictOption::RemoveExisting => "Remove Existing Aliases Before Adding",
            ConflictOption::CreateAnother  => "Create Another Alias",
            ConflictOption::Skip           => "Skip Script",
        }
    }
}

/// Final verdict for one candidate script.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Resolution {
    Add,
    /// Delete these aliases, then add.
    Overwrite(Vec<String>),
    /// Leave this script alone; a batch continues.
    Skip,
    /// Abort the whole add, including the rest of a batch.
    Cancel,
}

/// Source of the user's choice.
pub trait ConflictPrompt {
    /// Pick one of `options` (never empty) for `collision`.
    fn choose(&mut self, collision: &Collision, options: &[ConflictOption]) -> io::Result<ConflictOption>;
}

/// Alias clash, if any. Only the alias key is consulted.
pub fn alias_collision(alias: &str, existing: &[ScriptEntry]) -> Option<Collision> {
    existing
        .iter()
        .any(|e| e.alias == alias)
        .then(|| Collision::Alias(alias.to_string()))
}

/// Path clash against entries not already slated for removal.
pub fn path_collision(path: &Path, existing: &[ScriptEntry], removing: &[String]) -> Option<Collision> {
    let aliases: Vec<String> = existing
        .iter()
        .filter(|e| e.is_for(path) && !removing.contains(&e.alias))
        .map(|e| e.alias.clone())
        .collect();
    let aliases = util::dedup_preserve_order(aliases);
    let path = path.display().to_string();
    match aliases.len() {
        0 => None,
        1 => Some(Collision::SinglePath { path, alias: aliases.into_iter().next()? }),
        _ => Some(Collision::MultiPath { path, aliases }),
    }
}

/// Options offered, in display order.
pub fn options_for(collision: &Collision, batch: bool) -> Vec<ConflictOption> {
    use ConflictOption::*;
    let mut options = match collision {
        Collision::Alias(_)                => vec![Cancel, Overwrite],
        Collision::SinglePath { .. }       => vec![Cancel, Overwrite, CreateAnother],
        Collision::MultiPath { .. }        => vec![Cancel, RemoveExisting, CreateAnother],
    };
    if batch {
        options.push(Skip);
    }
    options
}

/// Effect of picking `choice` for `collision`, given aliases already marked
/// for removal by an earlier step.
pub fn outcome(collision: &Collision, choice: ConflictOption, mut removing: Vec<String>) -> Resolution {
    match choice {
        ConflictOption::Cancel => Resolution::Cancel,
        ConflictOption::Skip => Resolution::Skip,
        ConflictOption::CreateAnother => finish(removing),
        ConflictOption::Overwrite | ConflictOption::RemoveExisting => {
            match collision {
                Collision::Alias(a) | Collision::SinglePath { alias: a, .. } => removing.push(a.clone()),
                Collision::MultiPath { aliases, .. } => removing.extend(aliases.iter().cloned()),
            }
            finish(util::dedup_preserve_order(removing))
        }
    }
}

fn finish(removing: Vec<String>) -> Resolution {
    if removing.is_empty() {
        Resolution::Add
    } else {
        Resolution::Overwrite(removing)
    }
}

/// Run the full decision tree for one candidate.
pub fn resolve(
    alias: &str,
    path: &Path,
    existing: &[ScriptEntry],
    force: bool,
    batch: bool,
    prompt: &mut dyn ConflictPrompt,
) -> io::Result<Resolution> {
    let mut removing: Vec<String> = Vec::new();

    if let Some(c) = alias_collision(alias, existing) {
        if force {
            // forced: replace the clashing alias, never duplicate it
            debug!(alias, "forced overwrite of existing alias");
            removing.push(alias.to_string());
        } else {
            match ask(&c, batch, prompt, removing)? {
                Resolution::Overwrite(r) => removing = r,
                Resolution::Add => removing = Vec::new(),
                other => return Ok(other),
            }
        }
    }

    if force {
        return Ok(finish(removing));
    }

    match path_collision(path, existing, &removing) {
        Some(c) => ask(&c, batch, prompt, removing),
        None => Ok(finish(removing)),
    }
}

fn ask(
    collision: &Collision,
    batch: bool,
    prompt: &mut dyn ConflictPrompt,
    removing: Vec<String>,
) -> io::Result<Resolution> {
    let options = options_for(collision, batch);
    let choice = prompt.choose(collision, &options)?;
    info!(%collision, choice = choice.label(), "conflict resolved");
    Ok(outcome(collision, choice, removing))
}

/* ------------------------------ interaction ------------------------------ */

/// Numbered menu on stdout, selection read from a line source.
/// End of input counts as Cancel.
pub struct LinePrompt<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> LinePrompt<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }
}

impl LinePrompt<io::StdinLock<'static>, io::Stdout> {
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> ConflictPrompt for LinePrompt<R, W> {
    fn choose(&mut self, collision: &Collision, options: &[ConflictOption]) -> io::Result<ConflictOption> {
        writeln!(self.output, "{collision} What do you want to do?\n")?;
        for (i, o) in options.iter().enumerate() {
            writeln!(self.output, "[{}] {}", i + 1, o.label())?;
        }
        loop {
            write!(self.output, "\nSelection: ")?;
            self.output.flush()?;

            let mut line = String::new();
            if self.input.read_line(&mut line)? == 0 {
                writeln!(self.output)?;
                return Ok(ConflictOption::Cancel);
            }
            match line.trim().parse::<usize>() {
                Ok(n) if (1..=options.len()).contains(&n) => return Ok(options[n - 1]),
                _ => writeln!(self.output, "Please enter a number between 1 and {}.", options.len())?,
            }
        }
    }
}
