//! `init`: scaffolds a new modgen project from embedded templates.

use modgen_common::naming::to_pascal_case;
use std::fs;
use std::path::{Path, PathBuf};
use tera::Context;

use crate::error::{Error, Result};

/// Embedded templates: (name, target path relative to the project, source)
const TEMPLATES: &[(&str, &str, &str)] = &[
    (
        "modgen.toml",
        "modgen.toml",
        include_str!("../templates/modgen.toml.jinja2"),
    ),
    (
        "spec.ts",
        "specs/Native{pascal}.ts",
        include_str!("../templates/spec.ts.jinja2"),
    ),
    (
        ".gitignore",
        ".gitignore",
        include_str!("../templates/gitignore.jinja2"),
    ),
];

fn normalize_package_name(package_name: &str) -> Result<String> {
    let normalized = package_name.to_lowercase().replace([' ', '_'], "-");
    let valid = !normalized.is_empty()
        && normalized
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-')
        && normalized.starts_with(|c: char| c.is_ascii_alphabetic());
    if !valid {
        return Err(Error::InvalidPackageName(package_name.to_string()));
    }
    Ok(normalized)
}

fn is_empty_dir(path: &Path) -> Result<bool> {
    let mut entries = fs::read_dir(path).map_err(|e| Error::io(path, e))?;
    Ok(entries.next().is_none())
}

/// Create `<cwd>/<package_name>/` with a config, a sample spec and a `.gitignore`.
///
/// Returns the created project root. Fails if the directory exists and is not empty.
pub fn init(cwd: &Path, package_name: &str) -> Result<PathBuf> {
    let package_name = normalize_package_name(package_name)?;
    let pascal_name = to_pascal_case(&package_name);
    let target = cwd.join(&package_name);

    if target.exists() && !is_empty_dir(&target)? {
        return Err(Error::TargetNotEmpty(target));
    }

    let mut context = Context::new();
    context.insert("package_name", &package_name);
    context.insert("pascal_name", &pascal_name);

    for (name, relative, template) in TEMPLATES {
        let rendered =
            tera::Tera::one_off(template, &context, false).map_err(|source| Error::Template {
                name: (*name).to_string(),
                source,
            })?;
        let path = target.join(relative.replace("{pascal}", &pascal_name));
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
        }
        fs::write(&path, rendered).map_err(|e| Error::io(&path, e))?;
        tracing::debug!(path = %path.display(), "Scaffolded");
    }

    tracing::info!(project = %target.display(), "Project initialized");
    Ok(target)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_init_creates_project() {
        let dir = TempDir::new().unwrap();
        let root = init(dir.path(), "Craby_Test").unwrap();
        assert_eq!(root, dir.path().join("craby-test"));

        let config = modgen_common::load_config(&root).unwrap();
        assert_eq!(config.name, "craby-test");
        assert_eq!(config.platforms.len(), 3);

        let spec = fs::read_to_string(root.join("specs/NativeCrabyTest.ts")).unwrap();
        assert!(spec.contains("NativeModuleRegistry.getEnforcing<Spec>('CrabyTest')"));
        assert!(root.join(".gitignore").is_file());
    }

    #[test]
    fn test_init_refuses_non_empty_target() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("taken")).unwrap();
        fs::write(dir.path().join("taken/file"), "x").unwrap();
        let err = init(dir.path(), "taken").unwrap_err();
        assert!(matches!(err, Error::TargetNotEmpty(_)));
    }

    #[test]
    fn test_init_accepts_empty_target() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("empty")).unwrap();
        assert!(init(dir.path(), "empty").is_ok());
    }

    #[test]
    fn test_invalid_package_name() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            init(dir.path(), "bad/name").unwrap_err(),
            Error::InvalidPackageName(_)
        ));
        assert!(matches!(
            init(dir.path(), "9lives").unwrap_err(),
            Error::InvalidPackageName(_)
        ));
    }
}
