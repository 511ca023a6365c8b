// script_runner/src/detect.rs
//! Script type classification: extension, then shebang, then the executable
//! bit, then python. Every tier answers `Some(type)` or `None` ("no signal");
//! IO failures count as no signal, so detection itself never fails.

use std::{
    fs,
    io::{BufRead, BufReader, Read},
    path::Path,
};
use tracing::debug;

use crate::script_entry::ScriptType;

/// Cap on how much of a file we read looking for the first line.
const SHEBANG_SNIFF_BYTES: u64 = 512;

pub fn detect(path: &Path) -> ScriptType {
    if let Some(t) = type_from_extension(path) {
        debug!(path = %path.display(), %t, "type from extension");
        return t;
    }
    if let Some(t) = read_shebang(path).as_deref().and_then(type_from_shebang) {
        debug!(path = %path.display(), %t, "type from shebang");
        return t;
    }
    if is_executable(path) {
        debug!(path = %path.display(), "opaque executable, assuming shell");
        return ScriptType::Shell;
    }
    ScriptType::Python
}

pub fn type_from_extension(path: &Path) -> Option<ScriptType> {
    let ext = path.extension()?.to_str()?;
    match ext.to_ascii_lowercase().as_str() {
        "py" => Some(ScriptType::Python),
        "sh" | "bash" | "zsh" | "fish" => Some(ScriptType::Shell),
        _ => None,
    }
}

/// Classify an interpreter directive line (with or without the leading `#!`).
pub fn type_from_shebang(line: &str) -> Option<ScriptType> {
    let l = line.trim_start().strip_prefix("#!").unwrap_or(line).trim();
    if l.contains("python") {
        return Some(ScriptType::Python);
    }
    // "sh" also covers bash/zsh/fish; listed for readability
    if ["sh", "bash", "zsh", "fish"].iter().any(|s| l.contains(s)) {
        return Some(ScriptType::Shell);
    }
    None
}

/// First line of the file if it is an interpreter directive (`#!...`), trimmed.
pub fn read_shebang(path: &Path) -> Option<String> {
    let f = fs::File::open(path).ok()?;
    let mut first = String::new();
    BufReader::new(f.take(SHEBANG_SNIFF_BYTES)).read_line(&mut first).ok()?;
    let l = first.trim_start_matches('\u{feff}').trim_end();
    l.starts_with("#!").then(|| l.to_string())
}

#[cfg(unix)]
pub fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    fs::metadata(path)
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
pub fn is_executable(_path: &Path) -> bool {
    false
}
