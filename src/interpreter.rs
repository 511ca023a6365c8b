// script_runner/src/interpreter.rs
//! Pick the executable that will launch a script.
//!
//! Every tier but the last absorbs its own failure and hands over to the next
//! one. The only hard error is `InterpreterNotFound`: the final candidate is
//! not on disk.

use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::{
    detect,
    error::{RegistryError, Result},
    script_entry::ScriptType,
    venv,
};

/// Last-resort shell when neither the shebang nor `$SHELL` yields one.
pub const FALLBACK_SHELL: &str = "/bin/sh";

/// Python executables tried on `PATH` when no venv applies.
const PYTHON_CANDIDATES: [&str; 2] = ["python3", "python"];

/// How python scripts pick up a virtualenv.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum VenvPolicy {
    /// Search upward from the script; 0 means unbounded.
    Search { max_depth: usize },
    /// Use this venv root; its python must exist.
    Explicit(PathBuf),
    Disabled,
}

impl Default for VenvPolicy {
    fn default() -> Self {
        VenvPolicy::Search { max_depth: venv::DEFAULT_VENV_DEPTH }
    }
}

#[derive(Clone, Debug, Default)]
pub struct InterpreterResolver {
    pub venv: VenvPolicy,
    /// User's configured shell (`$SHELL` or config file).
    pub default_shell: Option<PathBuf>,
}

impl InterpreterResolver {
    pub fn new(venv: VenvPolicy, default_shell: Option<PathBuf>) -> Self {
        Self { venv, default_shell }
    }

    pub fn resolve(
        &self,
        script: &Path,
        script_type: ScriptType,
        override_path: Option<&Path>,
    ) -> Result<PathBuf> {
        let candidate = match override_path {
            Some(p) => resolve_override(p)?,
            None => match script_type {
                ScriptType::Python => self.python_for(script)?,
                ScriptType::Shell => self.shell_for(script),
            },
        };

        if !candidate.exists() {
            return Err(RegistryError::InterpreterNotFound(candidate));
        }
        info!(script = %script.display(), interpreter = %candidate.display(), "resolved interpreter");
        Ok(candidate)
    }

    fn python_for(&self, script: &Path) -> Result<PathBuf> {
        match &self.venv {
            VenvPolicy::Explicit(root) => return Ok(venv_python(root)),
            VenvPolicy::Search { max_depth } => {
                if let Some(root) = venv::locate(script, *max_depth) {
                    let py = venv_python(&root);
                    if py.exists() {
                        return Ok(py);
                    }
                    debug!(venv = %root.display(), "venv has no python executable, falling back");
                }
            }
            VenvPolicy::Disabled => {}
        }
        system_python()
    }

    fn shell_for(&self, script: &Path) -> PathBuf {
        if let Some(p) = detect::read_shebang(script).as_deref().and_then(interpreter_from_shebang) {
            return p;
        }
        if let Some(sh) = self.default_shell.as_ref().filter(|p| p.exists()) {
            debug!(shell = %sh.display(), "using configured default shell");
            return sh.clone();
        }
        PathBuf::from(FALLBACK_SHELL)
    }
}

/// Python executable inside a venv root.
pub fn venv_python(root: &Path) -> PathBuf {
    if cfg!(windows) {
        root.join("Scripts").join("python.exe")
    } else {
        root.join("bin").join("python")
    }
}

/// The python this machine runs by default (first hit on `PATH`).
pub fn system_python() -> Result<PathBuf> {
    PYTHON_CANDIDATES
        .iter()
        .find_map(|name| which::which(name).ok())
        .ok_or_else(|| RegistryError::InterpreterNotFound(PathBuf::from(PYTHON_CANDIDATES[0])))
}

/// What an interpreter directive points at.
#[derive(Debug, PartialEq, Eq)]
pub enum Directive {
    /// `#!/usr/bin/env [-flags] NAME`: look NAME up on `PATH`.
    Env(String),
    /// `#!/bin/bash -e`: the literal interpreter path.
    Literal(PathBuf),
}

pub fn parse_directive(line: &str) -> Option<Directive> {
    let body = line.trim().strip_prefix("#!")?;
    let mut tokens = body.split_whitespace();
    let program = tokens.next()?;

    let is_env = Path::new(program).file_name().is_some_and(|n| n == "env");
    if !is_env {
        return Some(Directive::Literal(PathBuf::from(program)));
    }
    // skip env's own flags (-S, -i, ...) and VAR=value assignments
    tokens
        .find(|t| !t.starts_with('-') && !t.contains('='))
        .map(|name| Directive::Env(name.to_string()))
}

/// Resolve a shebang line to an existing interpreter, if it names one.
fn interpreter_from_shebang(line: &str) -> Option<PathBuf> {
    match parse_directive(line)? {
        Directive::Env(name) => {
            let found = which::which(&name).ok();
            debug!(%name, found = ?found, "env-style shebang");
            found
        }
        Directive::Literal(p) => p.exists().then_some(p),
    }
}

fn resolve_override(p: &Path) -> Result<PathBuf> {
    if let Ok(c) = p.canonicalize() {
        return Ok(c);
    }
    // a bare command name, e.g. `--interpreter python3.12`
    if p.components().count() == 1 {
        if let Ok(found) = which::which(p) {
            return Ok(found);
        }
    }
    Err(RegistryError::InterpreterNotFound(p.to_path_buf()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn touch(p: &Path) {
        fs::create_dir_all(p.parent().unwrap()).unwrap();
        fs::write(p, "").unwrap();
    }

    #[test]
    fn parses_env_and_literal_directives() {
        assert_eq!(parse_directive("#!/usr/bin/env bash"), Some(Directive::Env("bash".into())));
        assert_eq!(
            parse_directive("#!/usr/bin/env -S LC_ALL=C zsh -f"),
            Some(Directive::Env("zsh".into()))
        );
        assert_eq!(
            parse_directive("#! /bin/bash -e"),
            Some(Directive::Literal(PathBuf::from("/bin/bash")))
        );
        assert_eq!(parse_directive("echo hi"), None);
        assert_eq!(parse_directive("#!/usr/bin/env"), None);
    }

    #[test]
    fn python_uses_detected_venv() {
        let tmp = TempDir::new().unwrap();
        let venv_root = tmp.path().join("venv");
        touch(&venv_root.join(venv::VENV_MARKER));
        touch(&venv_python(&venv_root));
        let script = tmp.path().join("script.py");
        touch(&script);

        let r = InterpreterResolver::default();
        let got = r.resolve(&script, ScriptType::Python, None).unwrap();
        assert_eq!(got, venv_python(&venv_root.canonicalize().unwrap()));
    }

    #[test]
    fn explicit_venv_without_python_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let script = tmp.path().join("script.py");
        touch(&script);

        let r = InterpreterResolver::new(VenvPolicy::Explicit(tmp.path().join("nope")), None);
        let err = r.resolve(&script, ScriptType::Python, None).unwrap_err();
        assert!(matches!(err, RegistryError::InterpreterNotFound(_)));
    }

    #[test]
    fn override_must_exist() {
        let tmp = TempDir::new().unwrap();
        let script = tmp.path().join("script.py");
        touch(&script);
        let custom = tmp.path().join("custom_python");
        touch(&custom);

        let r = InterpreterResolver::default();
        let got = r.resolve(&script, ScriptType::Python, Some(&custom)).unwrap();
        assert_eq!(got, custom.canonicalize().unwrap());

        let missing = tmp.path().join("missing_python");
        let err = r.resolve(&script, ScriptType::Python, Some(&missing)).unwrap_err();
        assert!(matches!(err, RegistryError::InterpreterNotFound(p) if p == missing));
    }

    #[cfg(unix)]
    #[test]
    fn shell_uses_literal_shebang_when_present() {
        let tmp = TempDir::new().unwrap();
        let script = tmp.path().join("run.sh");
        fs::write(&script, "#!/bin/sh\necho hi\n").unwrap();

        let r = InterpreterResolver::default();
        assert_eq!(r.resolve(&script, ScriptType::Shell, None).unwrap(), PathBuf::from("/bin/sh"));
    }

    #[cfg(unix)]
    #[test]
    fn env_shebang_is_looked_up_on_path() {
        let tmp = TempDir::new().unwrap();
        let script = tmp.path().join("run.sh");
        fs::write(&script, "#!/usr/bin/env -S sh -e\necho hi\n").unwrap();
        let my_shell = tmp.path().join("myshell");
        touch(&my_shell);

        // the configured default must lose to the PATH hit
        let r = InterpreterResolver::new(VenvPolicy::Disabled, Some(my_shell));
        let got = r.resolve(&script, ScriptType::Shell, None).unwrap();
        assert_eq!(got, which::which("sh").unwrap());
    }

    #[cfg(unix)]
    #[test]
    fn env_shebang_naming_an_unknown_program_falls_through() {
        let tmp = TempDir::new().unwrap();
        let script = tmp.path().join("run.sh");
        fs::write(&script, "#!/usr/bin/env no-such-shell-on-this-host\n").unwrap();
        let my_shell = tmp.path().join("myshell");
        touch(&my_shell);

        let r = InterpreterResolver::new(VenvPolicy::Disabled, Some(my_shell.clone()));
        assert_eq!(r.resolve(&script, ScriptType::Shell, None).unwrap(), my_shell);
    }

    /// The answer for a python script once no venv applies.
    fn assert_system_python(got: Result<PathBuf>) {
        match system_python() {
            Ok(py) => assert_eq!(got.unwrap(), py),
            Err(_) => assert!(matches!(got, Err(RegistryError::InterpreterNotFound(_))), "{got:?}"),
        }
    }

    #[test]
    fn venv_without_python_falls_back_to_system_python() {
        let tmp = TempDir::new().unwrap();
        let venv_root = tmp.path().join("venv");
        touch(&venv_root.join(venv::VENV_MARKER));
        let script = tmp.path().join("script.py");
        touch(&script);
        assert_eq!(venv::locate(&script, 3), Some(venv_root.canonicalize().unwrap()));

        let r = InterpreterResolver::default();
        assert_system_python(r.resolve(&script, ScriptType::Python, None));
    }

    #[test]
    fn disabled_venv_ignores_a_usable_venv() {
        let tmp = TempDir::new().unwrap();
        let venv_root = tmp.path().join("venv");
        touch(&venv_root.join(venv::VENV_MARKER));
        touch(&venv_python(&venv_root));
        let script = tmp.path().join("script.py");
        touch(&script);

        let r = InterpreterResolver::new(VenvPolicy::Disabled, None);
        let got = r.resolve(&script, ScriptType::Python, None);
        if let Ok(p) = &got {
            assert!(!p.starts_with(tmp.path()), "{p:?}");
        }
        assert_system_python(got);
    }

    #[test]
    fn venv_beyond_depth_is_not_used() {
        let tmp = TempDir::new().unwrap();
        let venv_root = tmp.path().join("venv");
        touch(&venv_root.join(venv::VENV_MARKER));
        touch(&venv_python(&venv_root));
        let script = tmp.path().join("a/b/script.py");
        touch(&script);

        let r = InterpreterResolver::new(VenvPolicy::Search { max_depth: 1 }, None);
        assert_system_python(r.resolve(&script, ScriptType::Python, None));
    }

    #[cfg(unix)]
    #[test]
    fn shell_falls_back_to_default_shell_then_bin_sh() {
        let tmp = TempDir::new().unwrap();
        let script = tmp.path().join("run.sh");
        fs::write(&script, "#!/no/such/shell\necho hi\n").unwrap();
        let my_shell = tmp.path().join("myshell");
        touch(&my_shell);

        let with_default = InterpreterResolver::new(VenvPolicy::Disabled, Some(my_shell.clone()));
        assert_eq!(with_default.resolve(&script, ScriptType::Shell, None).unwrap(), my_shell);

        let gone = InterpreterResolver::new(VenvPolicy::Disabled, Some(tmp.path().join("gone")));
        assert_eq!(gone.resolve(&script, ScriptType::Shell, None).unwrap(), PathBuf::from(FALLBACK_SHELL));
    }
}
