// script_runner/src/path_metrics.rs

use std::path::{Component, Path, PathBuf};

/// Tree distance between two filesystem nodes: steps up from `a` to the
/// deepest shared ancestor plus steps down to `b`.
///
/// Both paths are canonicalized when possible; a path that cannot be
/// canonicalized (e.g. it no longer exists) is compared as given.
pub fn distance(a: &Path, b: &Path) -> usize {
    let a = resolve(a);
    let b = resolve(b);
    let pa: Vec<Component<'_>> = a.components().collect();
    let pb: Vec<Component<'_>> = b.components().collect();

    let common = pa
        .iter()
        .zip(pb.iter())
        .take_while(|(x, y)| x == y)
        .count();

    (pa.len() - common) + (pb.len() - common)
}

fn resolve(p: &Path) -> PathBuf {
    p.canonicalize()
        .or_else(|_| std::path::absolute(p))
        .unwrap_or_else(|_| p.to_path_buf())
}
