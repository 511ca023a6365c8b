// script_runner/src/venv.rs
//! Nearest-virtualenv search.
//!
//! Starting at the script's directory, each level's whole subtree is searched
//! for a `pyvenv.cfg` marker. Nothing found → move up one directory. Levels are
//! counted in ascents from the script's directory (that directory is level 0);
//! the search stops after level `max_depth`, or never when `max_depth == 0`.

use std::path::{Path, PathBuf};
use tracing::{debug, trace};
use walkdir::WalkDir;

use crate::path_metrics;

/// File whose presence marks a virtualenv root.
pub const VENV_MARKER: &str = "pyvenv.cfg";
pub const DEFAULT_VENV_DEPTH: usize = 3;

/// Return the root directory of the virtualenv closest to `script`.
pub fn locate(script: &Path, max_depth: usize) -> Option<PathBuf> {
    let script = script.canonicalize().unwrap_or_else(|_| script.to_path_buf());
    let mut dir = script.parent()?.to_path_buf();
    // subtree already searched on the previous level; no need to walk it again
    let mut searched: Option<PathBuf> = None;
    let mut level = 0usize;

    while max_depth == 0 || level <= max_depth {
        let markers = markers_under(&dir, searched.as_deref());
        debug!(level, dir = %dir.display(), found = markers.len(), "venv search level");

        if let Some(marker) = closest(&markers, &script) {
            return marker.parent().map(Path::to_path_buf);
        }

        let parent = dir.parent()?.to_path_buf();
        searched = Some(std::mem::replace(&mut dir, parent));
        level += 1;
    }

    debug!(max_depth, script = %script.display(), "no venv within depth bound");
    None
}

/// Every marker file under `dir`, in a stable (name-sorted, depth-first) order.
fn markers_under(dir: &Path, skip: Option<&Path>) -> Vec<PathBuf> {
    WalkDir::new(dir)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| skip.map_or(true, |s| e.path() != s))
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file() && e.file_name() == VENV_MARKER)
        .map(|e| e.into_path())
        .collect()
}

/// Smallest distance wins; on a tie the first candidate is kept.
fn closest<'a>(markers: &'a [PathBuf], script: &Path) -> Option<&'a PathBuf> {
    let mut best: Option<(&PathBuf, usize)> = None;
    for m in markers {
        let d = path_metrics::distance(m, script);
        trace!(marker = %m.display(), distance = d, "venv candidate");
        match best {
            Some((_, bd)) if d >= bd => {}
            _ => best = Some((m, d)),
        }
    }
    best.map(|(m, _)| m)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn make_venv(dir: &Path) -> PathBuf {
        fs::create_dir_all(dir).unwrap();
        fs::write(dir.join(VENV_MARKER), "home = /usr/bin\n").unwrap();
        dir.canonicalize().unwrap()
    }

    fn make_script(path: &Path) -> PathBuf {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "print('hi')\n").unwrap();
        path.to_path_buf()
    }

    #[test]
    fn finds_sibling_venv() {
        let tmp = TempDir::new().unwrap();
        let proj = tmp.path().join("proj");
        let venv = make_venv(&proj.join("venv"));
        let script = make_script(&proj.join("script.py"));

        assert_eq!(locate(&script, 3), Some(venv));
    }

    #[test]
    fn finds_venv_from_nested_dir() {
        let tmp = TempDir::new().unwrap();
        let venv = make_venv(&tmp.path().join("venv"));
        let script = make_script(&tmp.path().join("scripts/scripts_of_type/script.py"));

        assert_eq!(locate(&script, DEFAULT_VENV_DEPTH), Some(venv));
    }

    #[test]
    fn depth_bound_is_respected() {
        let tmp = TempDir::new().unwrap();
        let proj = tmp.path().join("proj");
        let venv = make_venv(&proj.join("venv"));
        // proj is four ascents above d/
        let script = make_script(&proj.join("a/b/c/d/script.py"));

        assert_eq!(locate(&script, 3), None);
        assert_eq!(locate(&script, 4), Some(venv.clone()));
        assert_eq!(locate(&script, 0), Some(venv));
    }

    #[test]
    fn monotone_in_depth() {
        let tmp = TempDir::new().unwrap();
        let venv = make_venv(&tmp.path().join("env"));
        let script = make_script(&tmp.path().join("x/y/s.py"));
        // tmp is two ascents above y/
        for depth in 1..2 {
            assert_eq!(locate(&script, depth), None, "depth {depth}");
        }
        for depth in 2..6 {
            assert_eq!(locate(&script, depth), Some(venv.clone()), "depth {depth}");
        }
    }

    #[test]
    fn closest_marker_wins_regardless_of_order() {
        let tmp = TempDir::new().unwrap();
        let proj = tmp.path().join("proj");
        // sorts first, but far away from the script
        let _far = make_venv(&proj.join("aaa/deep/er/venv"));
        let near = make_venv(&proj.join("zzz"));
        let script = make_script(&proj.join("script.py"));

        assert_eq!(locate(&script, 3), Some(near));
    }

    #[test]
    fn tie_keeps_first_encountered() {
        let tmp = TempDir::new().unwrap();
        let proj = tmp.path().join("proj");
        let first = make_venv(&proj.join("a_env"));
        let _second = make_venv(&proj.join("b_env"));
        let script = make_script(&proj.join("script.py"));

        assert_eq!(locate(&script, 1), Some(first));
    }

    #[test]
    fn venv_containing_the_script_is_found() {
        let tmp = TempDir::new().unwrap();
        let venv = make_venv(&tmp.path().join(".venv"));
        let script = make_script(&tmp.path().join(".venv/bin/tool.py"));

        assert_eq!(locate(&script, 3), Some(venv));
    }

    #[test]
    fn nothing_found_is_none() {
        let tmp = TempDir::new().unwrap();
        let script = make_script(&tmp.path().join("lonely/script.py"));
        assert_eq!(locate(&script, 1), None);
    }
}
