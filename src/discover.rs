// script_runner/src/discover.rs
//! Find scripts worth registering inside a directory (batch add).

use ignore::WalkBuilder;
use std::{fs, path::{Path, PathBuf}};
use tracing::trace;

use crate::{detect, script_entry::ScriptType, venv::VENV_MARKER};

/// Python files that are modules/packaging, not entrypoints.
const EXCLUDED_FILES: [&str; 3] = ["__init__.py", "__main__.py", "setup.py"];

/// Runnable scripts under `root`, sorted by path. Honors .gitignore, skips
/// hidden directories and any virtualenv below `root` (a directory holding
/// `pyvenv.cfg`), whatever it is named.
pub fn runnable_scripts(root: &Path) -> Vec<PathBuf> {
    let walker = WalkBuilder::new(root)
        .standard_filters(true)
        .filter_entry(|e| e.depth() == 0 || !is_venv_dir(e.path()))
        .build();

    let mut out: Vec<PathBuf> = walker
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_some_and(|t| t.is_file()))
        .map(|e| e.into_path())
        .filter(|p| is_runnable(p))
        .collect();
    out.sort();
    out
}

fn is_venv_dir(path: &Path) -> bool {
    let venv = path.is_dir() && path.join(VENV_MARKER).is_file();
    if venv {
        trace!(path = %path.display(), "skipping virtualenv");
    }
    venv
}

fn is_runnable(path: &Path) -> bool {
    let name = path.file_name().and_then(|s| s.to_str()).unwrap_or("");
    match detect::type_from_extension(path) {
        Some(ScriptType::Shell) => true,
        Some(ScriptType::Python) if !EXCLUDED_FILES.contains(&name) => {
            let ok = fs::read_to_string(path).map(|s| looks_like_entrypoint(&s)).unwrap_or(false);
            trace!(path = %path.display(), runnable = ok, "python candidate");
            ok
        }
        _ => false,
    }
}

/// A `__main__` guard, argparse, or sys.argv: the file expects to be run.
pub fn looks_like_entrypoint(src: &str) -> bool {
    src.lines().map(str::trim).any(|l| {
        if l.starts_with('#') {
            return false;
        }
        let compact: String = l.chars().filter(|c| !c.is_whitespace()).collect();
        compact.starts_with("if__name__==\"__main__\"")
            || compact.starts_with("if__name__=='__main__'")
            || l.starts_with("import argparse")
            || l.starts_with("from argparse import")
            || l.contains("sys.argv")
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(root: &Path, rel: &str, body: &str) {
        let p = root.join(rel);
        fs::create_dir_all(p.parent().unwrap()).unwrap();
        fs::write(p, body).unwrap();
    }

    #[test]
    fn entrypoint_heuristic() {
        assert!(looks_like_entrypoint("def main():\n    pass\n\nif __name__ == '__main__':\n    main()\n"));
        assert!(looks_like_entrypoint("import argparse\n"));
        assert!(looks_like_entrypoint("from argparse import ArgumentParser\n"));
        assert!(looks_like_entrypoint("import sys\nprint(sys.argv[1])\n"));
        assert!(!looks_like_entrypoint("def helper():\n    return 1\n"));
        assert!(!looks_like_entrypoint("# if __name__ == '__main__':\n"));
    }

    #[test]
    fn finds_runnable_scripts_only() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        write(root, "tool.py", "if __name__ == \"__main__\":\n    pass\n");
        write(root, "lib.py", "def f():\n    pass\n");
        write(root, "__init__.py", "import sys\nsys.argv\n");
        write(root, "sub/deploy.sh", "#!/bin/sh\necho\n");
        write(root, "sub/notes.txt", "import argparse\n");
        write(root, ".venv/bin/activate_this.py", "import sys\nsys.argv\n");

        let found: Vec<String> = runnable_scripts(root)
            .iter()
            .map(|p| p.strip_prefix(root).unwrap().to_string_lossy().replace('\\', "/"))
            .collect();
        assert_eq!(found, vec!["sub/deploy.sh", "tool.py"]);
    }

    #[test]
    fn skips_virtualenvs_without_a_dot_name() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        write(root, "tool.py", "import sys\nprint(sys.argv)\n");
        write(root, "venv/pyvenv.cfg", "home = /usr/bin\n");
        write(root, "venv/bin/run.sh", "#!/bin/sh\n");
        write(root, "venv/lib/python3.12/site-packages/six.py", "import sys\nsys.argv\n");
        write(root, "env2/pyvenv.cfg", "home = /usr/bin\n");
        write(root, "env2/lib/python3.12/site-packages/pip/__main__.py", "import sys\n");
        write(root, "env2/lib/python3.12/site-packages/pip/cli.py", "import argparse\n");

        let found: Vec<String> = runnable_scripts(root)
            .iter()
            .map(|p| p.strip_prefix(root).unwrap().to_string_lossy().replace('\\', "/"))
            .collect();
        assert_eq!(found, vec!["tool.py"]);
    }

    #[test]
    fn venv_given_as_root_is_still_walked() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        write(root, "pyvenv.cfg", "home = /usr/bin\n");
        write(root, "bin/deploy.sh", "#!/bin/sh\n");

        assert_eq!(runnable_scripts(root), vec![root.join("bin/deploy.sh")]);
    }
}
