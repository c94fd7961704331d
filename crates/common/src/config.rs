//! Project configuration stored in `modgen.toml` at the project root.
//!
//! ```toml
//! [project]
//! name = "my-module"
//!
//! [specs]
//! dir = "specs"
//!
//! [platforms.rust]
//! out_dir = "native/src/generated"
//! ```

use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::platform::Platform;

/// Config filename looked up at the project root
pub const CONFIG_FILENAME: &str = "modgen.toml";

const DEFAULT_SPECS_DIR: &str = "specs";
const DEFAULT_MANIFEST_PATH: &str = ".modgen/manifest.json";
const DEFAULT_BUILD_COMMAND: [&str; 3] = ["cargo", "build", "--release"];

/// Errors raised while locating or reading `modgen.toml`.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// No `modgen.toml` in the start directory or its ancestors
    #[error("Could not find {CONFIG_FILENAME} in {} or any parent directory", .0.display())]
    NotFound(PathBuf),
    /// The config file exists but could not be read
    #[error("Failed to read {}: {source}", path.display())]
    Read {
        /// Config file path
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },
    /// The config file is not valid TOML or has unknown keys
    #[error("Failed to parse {}: {source}", path.display())]
    Parse {
        /// Config file path
        path: PathBuf,
        /// Underlying TOML error
        #[source]
        source: toml::de::Error,
    },
    /// A `[platforms.<name>]` table names no known platform
    #[error("Unknown platform `{0}` in [platforms]")]
    UnknownPlatform(String),
    /// `[platforms]` is empty
    #[error("No platforms configured; add at least one [platforms.<name>] table")]
    NoPlatforms,
    /// `[build] command` is an empty list
    #[error("Build command must not be empty")]
    EmptyBuildCommand,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    project: RawProject,
    #[serde(default)]
    specs: RawSpecs,
    #[serde(default)]
    manifest: RawManifest,
    #[serde(default)]
    platforms: BTreeMap<String, PlatformConfig>,
    #[serde(default)]
    build: RawBuild,
}

#[derive(Debug, Deserialize)]
struct RawProject {
    name: String,
}

#[derive(Debug, Default, Deserialize)]
struct RawSpecs {
    dir: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
struct RawManifest {
    path: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
struct RawBuild {
    command: Option<Vec<String>>,
}

/// Per-platform output settings
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PlatformConfig {
    /// Output directory, relative to the project root
    pub out_dir: PathBuf,
}

/// Validated project configuration. All paths are relative to the project root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectConfig {
    /// Project name from `[project]`
    pub name: String,
    /// Directory scanned for spec units
    pub specs_dir: PathBuf,
    /// Where the generation manifest is stored
    pub manifest_path: PathBuf,
    /// Enabled platforms and their output settings
    pub platforms: BTreeMap<Platform, PlatformConfig>,
    /// Program and arguments run by `modgen build`
    pub build_command: Vec<String>,
}

impl ProjectConfig {
    /// Parse and validate the contents of a `modgen.toml` file.
    pub fn from_toml(contents: &str, path: &Path) -> Result<Self, ConfigError> {
        let raw: RawConfig = toml::from_str(contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        let mut platforms = BTreeMap::new();
        for (name, platform_config) in raw.platforms {
            let platform = name
                .parse::<Platform>()
                .map_err(|_| ConfigError::UnknownPlatform(name.clone()))?;
            platforms.insert(platform, platform_config);
        }
        if platforms.is_empty() {
            return Err(ConfigError::NoPlatforms);
        }

        let build_command = raw.build.command.unwrap_or_else(|| {
            DEFAULT_BUILD_COMMAND
                .iter()
                .map(|part| (*part).to_string())
                .collect()
        });
        if build_command.is_empty() {
            return Err(ConfigError::EmptyBuildCommand);
        }

        Ok(Self {
            name: raw.project.name,
            specs_dir: raw
                .specs
                .dir
                .unwrap_or_else(|| PathBuf::from(DEFAULT_SPECS_DIR)),
            manifest_path: raw
                .manifest
                .path
                .unwrap_or_else(|| PathBuf::from(DEFAULT_MANIFEST_PATH)),
            platforms,
            build_command,
        })
    }

    /// Output directory of a configured platform, relative to the project root.
    pub fn out_dir(&self, platform: Platform) -> Option<&Path> {
        self.platforms.get(&platform).map(|p| p.out_dir.as_path())
    }
}

/// Load `modgen.toml` from the given project root.
pub fn load_config(project_root: &Path) -> Result<ProjectConfig, ConfigError> {
    let path = project_root.join(CONFIG_FILENAME);
    let contents = fs::read_to_string(&path).map_err(|source| ConfigError::Read {
        path: path.clone(),
        source,
    })?;
    ProjectConfig::from_toml(&contents, &path)
}

/// Walk up from `start` to the nearest directory containing `modgen.toml`.
pub fn find_project_root(start: &Path) -> Result<PathBuf, ConfigError> {
    start
        .ancestors()
        .find(|dir| dir.join(CONFIG_FILENAME).is_file())
        .map(Path::to_path_buf)
        .ok_or_else(|| ConfigError::NotFound(start.to_path_buf()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const FULL_CONFIG: &str = r#"
[project]
name = "craby-test"

[specs]
dir = "src/specs"

[platforms.rust]
out_dir = "native/src/generated"

[platforms.typescript]
out_dir = "src/generated"

[build]
command = ["make", "native"]
"#;

    #[test]
    fn test_parse_full_config() {
        let config = ProjectConfig::from_toml(FULL_CONFIG, Path::new(CONFIG_FILENAME)).unwrap();
        assert_eq!(config.name, "craby-test");
        assert_eq!(config.specs_dir, PathBuf::from("src/specs"));
        assert_eq!(config.manifest_path, PathBuf::from(DEFAULT_MANIFEST_PATH));
        assert_eq!(
            config.platforms.keys().copied().collect::<Vec<_>>(),
            vec![Platform::Rust, Platform::Typescript]
        );
        assert_eq!(
            config.out_dir(Platform::Rust),
            Some(Path::new("native/src/generated"))
        );
        assert_eq!(config.out_dir(Platform::Cxx), None);
        assert_eq!(config.build_command, vec!["make", "native"]);
    }

    #[test]
    fn test_defaults_applied() {
        let contents = "[project]\nname = \"x\"\n\n[platforms.cxx]\nout_dir = \"cpp\"\n";
        let config = ProjectConfig::from_toml(contents, Path::new(CONFIG_FILENAME)).unwrap();
        assert_eq!(config.specs_dir, PathBuf::from("specs"));
        assert_eq!(config.build_command, vec!["cargo", "build", "--release"]);
    }

    #[test]
    fn test_no_platforms_is_an_error() {
        let err = ProjectConfig::from_toml("[project]\nname = \"x\"\n", Path::new("m.toml"))
            .unwrap_err();
        assert!(matches!(err, ConfigError::NoPlatforms));
    }

    #[test]
    fn test_unknown_platform_is_an_error() {
        let contents = "[project]\nname = \"x\"\n\n[platforms.kotlin]\nout_dir = \"k\"\n";
        let err = ProjectConfig::from_toml(contents, Path::new("m.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownPlatform(name) if name == "kotlin"));
    }

    #[test]
    fn test_find_project_root_walks_up() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join(CONFIG_FILENAME), FULL_CONFIG).unwrap();
        let nested = temp_dir.path().join("a").join("b");
        fs::create_dir_all(&nested).unwrap();

        let root = find_project_root(&nested).unwrap();
        assert_eq!(root, temp_dir.path());
        assert_eq!(load_config(&root).unwrap().name, "craby-test");
    }
}
