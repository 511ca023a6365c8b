// script_runner/src/launcher.rs

use std::{
    ffi::OsString,
    process::{Command, ExitStatus},
};
use tracing::debug;

use crate::{
    error::{RegistryError, Result},
    script_entry::ScriptEntry,
};

/// `[interpreter, script, args...]`
pub fn command_line(entry: &ScriptEntry, args: &[String]) -> Vec<OsString> {
    let mut argv = Vec::with_capacity(args.len() + 2);
    argv.push(entry.interpreter.clone().into_os_string());
    argv.push(entry.path.clone().into_os_string());
    argv.extend(args.iter().map(OsString::from));
    argv
}

/// Run the entry with inherited stdio and wait for it. Returns the child's
/// exit code; a child killed by a signal reports 1.
pub fn launch(entry: &ScriptEntry, args: &[String]) -> Result<i32> {
    if !entry.path.exists() {
        return Err(RegistryError::ScriptNotFound(entry.path.clone()));
    }
    if !entry.interpreter.exists() {
        return Err(RegistryError::InterpreterNotFound(entry.interpreter.clone()));
    }

    let argv = command_line(entry, args);
    debug!(alias = %entry.alias, ?argv, "launching");

    let status = Command::new(&argv[0])
        .args(&argv[1..])
        .status()
        .map_err(|source| RegistryError::Launch { interpreter: entry.interpreter.clone(), source })?;
    Ok(exit_code(status))
}

fn exit_code(status: ExitStatus) -> i32 {
    status.code().unwrap_or(1)
}
