//! Spec unit discovery under the project's specs directory.

use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::error::{Error, Result};

/// A discovered spec unit: identity plus contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceUnit {
    /// Project-relative path with `/` separators
    pub id: String,
    /// Absolute path
    pub path: PathBuf,
    /// File contents
    pub source: String,
}

fn is_spec_file(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    name.ends_with(".ts") && !name.ends_with(".d.ts")
}

/// Project-relative identity of a path, `/`-separated on every platform.
pub fn unit_id(project_root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(project_root).unwrap_or(path);
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Collect every `*.ts` file (excluding `*.d.ts`) under `specs_dir`, sorted by identity.
///
/// A missing specs directory yields no units.
pub fn discover_units(project_root: &Path, specs_dir: &Path) -> Result<Vec<SourceUnit>> {
    let root = project_root.join(specs_dir);
    if !root.is_dir() {
        tracing::warn!(dir = %root.display(), "Specs directory not found");
        return Ok(Vec::new());
    }

    let mut units = Vec::new();
    for entry in WalkDir::new(&root).follow_links(true) {
        let entry = entry.map_err(|e| {
            let path = e.path().map(Path::to_path_buf).unwrap_or_else(|| root.clone());
            Error::io(path, std::io::Error::other(e.to_string()))
        })?;
        if !entry.file_type().is_file() || !is_spec_file(entry.path()) {
            continue;
        }
        let path = entry.path().to_path_buf();
        let source = fs::read_to_string(&path).map_err(|e| Error::io(&path, e))?;
        units.push(SourceUnit {
            id: unit_id(project_root, &path),
            path,
            source,
        });
    }
    units.sort_by(|a, b| a.id.cmp(&b.id));
    tracing::debug!(count = units.len(), "Discovered spec units");
    Ok(units)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_discovers_sorted_ts_files() {
        let dir = TempDir::new().unwrap();
        let specs = dir.path().join("specs");
        fs::create_dir_all(specs.join("nested")).unwrap();
        fs::write(specs.join("NativeB.ts"), "b").unwrap();
        fs::write(specs.join("nested/NativeA.ts"), "a").unwrap();
        fs::write(specs.join("types.d.ts"), "ignored").unwrap();
        fs::write(specs.join("README.md"), "ignored").unwrap();

        let units = discover_units(dir.path(), Path::new("specs")).unwrap();
        let ids: Vec<_> = units.iter().map(|u| u.id.as_str()).collect();
        assert_eq!(ids, vec!["specs/NativeB.ts", "specs/nested/NativeA.ts"]);
        assert_eq!(units[1].source, "a");
    }

    #[test]
    fn test_missing_specs_dir_is_empty() {
        let dir = TempDir::new().unwrap();
        assert!(discover_units(dir.path(), Path::new("specs")).unwrap().is_empty());
    }
}
