//! Generation manifest: what was last generated, from which structure, by
//! which emitter versions.
//!
//! The manifest is the drift detector's only memory. It is saved once per
//! successful run, after every emission task has finished, and only touches
//! disk when its contents differ.

use modgen_common::Platform;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use thiserror::Error;

use crate::output::{WriteOutcome, write_if_changed};

/// Manifest format this build reads and writes.
pub const MANIFEST_FORMAT: u32 = 1;

/// Errors reading or writing the manifest.
#[derive(Debug, Error)]
pub enum ManifestError {
    /// Filesystem failure
    #[error("Failed to access manifest {}: {source}", path.display())]
    Io {
        /// Manifest path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Contents are not a manifest
    #[error("Manifest {} is not valid: {source}", path.display())]
    Parse {
        /// Manifest path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: serde_json::Error,
    },

    /// Written by a different format version
    #[error("Manifest format {found} is not supported (expected {expected})")]
    UnsupportedFormat {
        /// Format number read from the file
        found: u32,
        /// Format this build writes
        expected: u32,
    },
}

impl ManifestError {
    /// Taxonomy name shown to the operator.
    pub fn kind(&self) -> &'static str {
        "ManifestIOError"
    }
}

/// What the last successful run recorded for one module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleRecord {
    /// Structural hash of the module IR
    pub hash: String,
    /// Spec unit the module was declared in
    pub source: String,
    /// Generated files, relative to the project root
    #[serde(default)]
    pub outputs: Vec<String>,
}

/// Generation manifest stored at `.modgen/manifest.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    /// Format version
    pub format: u32,
    /// Emitter version per platform at the time of generation
    #[serde(default)]
    pub emitters: BTreeMap<Platform, String>,
    /// Records by module name
    #[serde(default)]
    pub modules: BTreeMap<String, ModuleRecord>,
}

impl Default for Manifest {
    fn default() -> Self {
        Self {
            format: MANIFEST_FORMAT,
            emitters: BTreeMap::new(),
            modules: BTreeMap::new(),
        }
    }
}

impl Manifest {
    /// True when no module is recorded.
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// Every recorded output, sorted and deduplicated. Index files appear
    /// under several modules.
    pub fn all_outputs(&self) -> Vec<&str> {
        let mut outputs: Vec<&str> = self
            .modules
            .values()
            .flat_map(|record| record.outputs.iter().map(String::as_str))
            .collect();
        outputs.sort_unstable();
        outputs.dedup();
        outputs
    }

    /// Pretty JSON with a trailing newline.
    pub fn to_json(&self) -> String {
        let mut json = serde_json::to_string_pretty(self).unwrap_or_default();
        json.push('\n');
        json
    }

    /// Parse and check the format version. `path` is only used in errors.
    pub fn from_json(contents: &str, path: &Path) -> Result<Self, ManifestError> {
        let manifest: Manifest =
            serde_json::from_str(contents).map_err(|source| ManifestError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        if manifest.format != MANIFEST_FORMAT {
            return Err(ManifestError::UnsupportedFormat {
                found: manifest.format,
                expected: MANIFEST_FORMAT,
            });
        }
        Ok(manifest)
    }
}

/// Where the manifest lives between runs.
pub trait ManifestStore: Send + Sync {
    /// Load the manifest. A store that has never been saved yields an empty one.
    fn load(&self) -> Result<Manifest, ManifestError>;

    /// Replace the stored manifest in one step. Saving an identical manifest
    /// leaves the store untouched.
    fn save(&self, manifest: &Manifest) -> Result<(), ManifestError>;

    /// Forget the stored manifest.
    fn remove(&self) -> Result<(), ManifestError>;
}

/// Manifest stored as pretty JSON on disk.
#[derive(Debug, Clone)]
pub struct FileManifestStore {
    path: PathBuf,
}

impl FileManifestStore {
    /// Store backed by the file at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Manifest file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> ManifestError {
        ManifestError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl ManifestStore for FileManifestStore {
    fn load(&self) -> Result<Manifest, ManifestError> {
        match fs::read_to_string(&self.path) {
            Ok(contents) => Manifest::from_json(&contents, &self.path),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "No manifest yet");
                Ok(Manifest::default())
            }
            Err(e) => Err(self.io_error(e)),
        }
    }

    fn save(&self, manifest: &Manifest) -> Result<(), ManifestError> {
        let outcome =
            write_if_changed(&self.path, &manifest.to_json()).map_err(|e| self.io_error(e))?;
        if outcome == WriteOutcome::Unchanged {
            tracing::debug!(path = %self.path.display(), "Manifest unchanged");
        } else {
            tracing::debug!(path = %self.path.display(), "Manifest saved");
        }
        Ok(())
    }

    fn remove(&self) -> Result<(), ManifestError> {
        crate::output::remove_if_exists(&self.path)
            .map(|_| ())
            .map_err(|e| self.io_error(e))
    }
}

/// In-memory manifest for tests and dry runs.
#[derive(Debug, Default)]
pub struct MemoryManifestStore {
    manifest: Mutex<Option<Manifest>>,
}

impl MemoryManifestStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store holding `manifest`.
    pub fn with_manifest(manifest: Manifest) -> Self {
        Self {
            manifest: Mutex::new(Some(manifest)),
        }
    }
}

impl ManifestStore for MemoryManifestStore {
    fn load(&self) -> Result<Manifest, ManifestError> {
        let guard = self.manifest.lock().unwrap_or_else(|e| e.into_inner());
        Ok(guard.clone().unwrap_or_default())
    }

    fn save(&self, manifest: &Manifest) -> Result<(), ManifestError> {
        let mut guard = self.manifest.lock().unwrap_or_else(|e| e.into_inner());
        *guard = Some(manifest.clone());
        Ok(())
    }

    fn remove(&self) -> Result<(), ManifestError> {
        let mut guard = self.manifest.lock().unwrap_or_else(|e| e.into_inner());
        *guard = None;
        Ok(())
    }
}
