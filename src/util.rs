// script_runner/src/util.rs

use std::path::Path;

/// Alias used when none is given: the file name without its extension.
/// Falls back to the full file name for dotfiles, then to "script".
pub fn default_alias(path: &Path) -> String {
    path.file_stem()
        .or_else(|| path.file_name())
        .and_then(|s| s.to_str())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or("script")
        .to_string()
}

/// Deduplicate while preserving first occurrence order.
pub fn dedup_preserve_order(mut v: Vec<String>) -> Vec<String> {
    use std::collections::HashSet;
    let mut seen = HashSet::with_capacity(v.len());
    v.retain(|s| seen.insert(s.clone()));
    v
}

/// Left-justify every column of `rows` to its widest cell.
pub fn render_table(rows: &[Vec<String>]) -> String {
    let cols = rows.iter().map(Vec::len).max().unwrap_or(0);
    let widths: Vec<usize> = (0..cols)
        .map(|c| rows.iter().filter_map(|r| r.get(c)).map(|s| s.chars().count()).max().unwrap_or(0))
        .collect();

    let mut out = String::new();
    for row in rows {
        let mut line = String::new();
        for (i, cell) in row.iter().enumerate() {
            if i + 1 == row.len() {
                line.push_str(cell);
            } else {
                line.push_str(&format!("{cell:<w$}  ", w = widths[i]));
            }
        }
        out.push_str(line.trim_end());
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alias_from_stem() {
        assert_eq!(default_alias(Path::new("/x/y/deploy.sh")), "deploy");
        assert_eq!(default_alias(Path::new("/x/tool")), "tool");
        assert_eq!(default_alias(Path::new("/x/archive.tar.gz")), "archive.tar");
        assert_eq!(default_alias(Path::new("/")), "script");
    }

    #[test]
    fn dedup_preserves_first() {
        let out = dedup_preserve_order(vec!["a".into(), "b".into(), "a".into()]);
        assert_eq!(out, vec!["a", "b"]);
    }

    #[test]
    fn table_aligns_columns() {
        let rows = vec![
            vec!["ALIAS".to_string(), "TYPE".to_string()],
            vec!["a".to_string(), "python".to_string()],
        ];
        assert_eq!(render_table(&rows), "ALIAS  TYPE\na      python\n");
    }
}
