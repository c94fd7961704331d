//! Drift detection: compares freshly computed module hashes with the manifest.
//!
//! Purely informational. Nothing here touches the file system or the manifest.

use modgen_common::Platform;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::manifest::Manifest;

/// Drift of one module against the manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DriftStatus {
    /// Hash matches the recorded one
    Unchanged,
    /// Hash differs from the recorded one
    Changed {
        /// Hash recorded in the manifest
        previous: String,
        /// Hash of the current spec
        current: String,
    },
    /// Recorded in the manifest, absent from current specs
    Removed,
    /// Present in current specs, absent from the manifest
    New,
}

impl DriftStatus {
    /// Short label for listings.
    pub fn label(&self) -> &'static str {
        match self {
            DriftStatus::Unchanged => "unchanged",
            DriftStatus::Changed { .. } => "changed",
            DriftStatus::Removed => "removed",
            DriftStatus::New => "new",
        }
    }

    /// True for [`DriftStatus::Unchanged`].
    pub fn is_unchanged(&self) -> bool {
        matches!(self, DriftStatus::Unchanged)
    }
}

impl fmt::Display for DriftStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Status of one module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriftEntry {
    /// Module registry name
    pub module: String,
    /// Drift status
    pub status: DriftStatus,
}

/// Drift of every module, current and recorded.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DriftReport {
    /// One entry per module, sorted by name
    pub entries: Vec<DriftEntry>,
    /// Configured platforms whose recorded emitter version differs from the running one
    pub stale_emitters: Vec<Platform>,
}

impl DriftReport {
    /// Status of `module`, if it is current or recorded.
    pub fn status(&self, module: &str) -> Option<&DriftStatus> {
        self.entries
            .iter()
            .find(|e| e.module == module)
            .map(|e| &e.status)
    }

    /// Modules that need regeneration or pruning.
    pub fn out_of_date(&self) -> Vec<String> {
        self.entries
            .iter()
            .filter(|e| !e.status.is_unchanged())
            .map(|e| e.module.clone())
            .collect()
    }

    /// Modules recorded in the manifest but gone from the specs.
    pub fn removed(&self) -> impl Iterator<Item = &str> {
        self.entries
            .iter()
            .filter(|e| e.status == DriftStatus::Removed)
            .map(|e| e.module.as_str())
    }

    /// True when every module is unchanged.
    pub fn is_clean(&self) -> bool {
        self.entries.iter().all(|e| e.status.is_unchanged()) && self.stale_emitters.is_empty()
    }
}

/// Diff current structural hashes (module name to hash) against the manifest.
///
/// `emitters` lists the configured platforms with the running emitter versions.
pub fn detect(
    current: &BTreeMap<String, String>,
    manifest: &Manifest,
    emitters: &[(Platform, &str)],
) -> DriftReport {
    let names: BTreeSet<&String> = current.keys().chain(manifest.modules.keys()).collect();

    let entries = names
        .into_iter()
        .map(|name| {
            let status = match (manifest.modules.get(name), current.get(name)) {
                (Some(record), Some(hash)) if record.hash == *hash => DriftStatus::Unchanged,
                (Some(record), Some(hash)) => DriftStatus::Changed {
                    previous: record.hash.clone(),
                    current: hash.clone(),
                },
                (Some(_), None) => DriftStatus::Removed,
                (None, _) => DriftStatus::New,
            };
            DriftEntry {
                module: name.clone(),
                status,
            }
        })
        .collect();

    // An empty manifest has no emitter history to be stale against
    let stale_emitters = if manifest.is_empty() {
        Vec::new()
    } else {
        emitters
            .iter()
            .filter(|(platform, version)| {
                manifest.emitters.get(platform).map(String::as_str) != Some(*version)
            })
            .map(|(platform, _)| *platform)
            .collect()
    };

    DriftReport {
        entries,
        stale_emitters,
    }
}
