//! Codegen orchestration and the entry points behind every CLI command.
//!
//! ```text
//! discover ─► parse (parallel) ─► resolve ─► build IR (parallel)
//!                                              │
//!                  drift ◄── hashes ───────────┤
//!                                              ▼
//!                          emit per (module, platform) (parallel)
//!                                              │
//!                               write changed files ─► prune ─► manifest
//! ```
//!
//! Per-unit failures are collected as [`Diagnostic`]s and never stop unrelated
//! units. The manifest is only replaced after a run without diagnostics.

use modgen_common::{Platform, ProjectConfig, load_config};
use rayon::prelude::*;
use similar::TextDiff;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, info, warn};

use crate::cancel::CancellationToken;
use crate::discovery::{SourceUnit, discover_units};
use crate::drift::{self, DriftReport, DriftStatus};
use crate::emit::{GeneratedFile, emitter_for};
use crate::error::{CodegenError, Diagnostic, Error, Result};
use crate::ir::{ModuleIR, build_module};
use crate::manifest::{FileManifestStore, Manifest, ManifestStore, ModuleRecord};
use crate::output::{WriteOutcome, remove_if_exists, write_if_changed};
use crate::parser::parse_unit;
use crate::resolver::resolve;

/// Specs lowered to IR, plus everything that went wrong on the way.
#[derive(Debug, Clone, Default)]
pub struct Analysis {
    /// Successfully built modules, ordered by source unit
    pub modules: Vec<ModuleIR>,
    /// Problems found, sorted by unit
    pub diagnostics: Vec<Diagnostic>,
    /// Module name to structural hash
    pub hashes: BTreeMap<String, String>,
}

/// A file an emitter produced, placed in its platform's output directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputFile {
    /// Project-relative path with `/` separators
    pub path: String,
    /// File contents
    pub contents: String,
    /// Emitting platform
    pub platform: Platform,
    /// Owning module; `None` for index files
    pub module: Option<String>,
}

/// Files emitted for a set of modules.
#[derive(Debug, Clone, Default)]
pub struct Emission {
    /// Module files followed by index files
    pub files: Vec<OutputFile>,
    /// Emitter failures and output collisions
    pub diagnostics: Vec<Diagnostic>,
    /// Modules that emitted successfully on every configured platform
    pub complete: BTreeSet<String>,
}

/// Outcome of `codegen`.
#[derive(Debug, Clone, Default)]
pub struct CodegenReport {
    /// Modules built from the specs
    pub modules: Vec<String>,
    /// Files created or updated by this run
    pub written: Vec<String>,
    /// Files whose contents were already current
    pub unchanged: usize,
    /// Previously generated files removed by this run
    pub pruned: Vec<String>,
    /// Drift against the manifest before this run
    pub drift: DriftReport,
    /// Problems found, sorted by unit
    pub diagnostics: Vec<Diagnostic>,
    /// Replacement manifest; `Some` only for fully successful runs
    pub manifest: Option<Manifest>,
}

impl CodegenReport {
    /// True when the run reported no diagnostics.
    pub fn is_success(&self) -> bool {
        self.diagnostics.is_empty()
    }
}

/// One module as listed by `show`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleSummary {
    /// Registry name
    pub name: String,
    /// Declaring unit
    pub source: String,
    /// Drift status
    pub status: DriftStatus,
    /// Rendered method signatures in declaration order
    pub methods: Vec<String>,
    /// Object shape names
    pub objects: Vec<String>,
    /// Enum names
    pub enums: Vec<String>,
}

/// Outcome of `show`.
#[derive(Debug, Clone, Default)]
pub struct ShowReport {
    /// Current modules
    pub modules: Vec<ModuleSummary>,
    /// Modules recorded in the manifest that no spec declares anymore
    pub removed: Vec<String>,
    /// Platforms whose emitter version differs from the manifest
    pub stale_emitters: Vec<Platform>,
    /// Problems found, sorted by unit
    pub diagnostics: Vec<Diagnostic>,
}

/// Generated file whose on-disk content differs from a fresh emission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mismatch {
    /// Project-relative path
    pub path: String,
    /// Freshly emitted contents
    pub expected: String,
    /// Contents on disk
    pub actual: String,
}

impl Mismatch {
    /// Unified diff from the on-disk content to the expected content.
    pub fn unified_diff(&self) -> String {
        TextDiff::from_lines(&self.actual, &self.expected)
            .unified_diff()
            .context_radius(3)
            .header(&format!("a/{}", self.path), &format!("b/{}", self.path))
            .to_string()
    }
}

/// Outcome of `doctor`.
#[derive(Debug, Clone, Default)]
pub struct DoctorReport {
    /// Drift against the manifest
    pub drift: DriftReport,
    /// Expected or recorded outputs that do not exist
    pub missing: Vec<String>,
    /// Outputs whose contents differ
    pub mismatched: Vec<Mismatch>,
}

impl DoctorReport {
    /// True when nothing is missing, modified or drifted.
    pub fn is_healthy(&self) -> bool {
        self.drift.is_clean() && self.missing.is_empty() && self.mismatched.is_empty()
    }

    /// One line per problem, for `OutOfDate` errors and terminal output.
    pub fn problems(&self) -> Vec<String> {
        let mut problems: Vec<String> = self
            .drift
            .entries
            .iter()
            .filter(|e| !e.status.is_unchanged())
            .map(|e| format!("module {} is {}", e.module, e.status))
            .collect();
        problems.extend(
            self.drift
                .stale_emitters
                .iter()
                .map(|p| format!("{p} emitter version changed")),
        );
        problems.extend(self.missing.iter().map(|p| format!("{p} is missing")));
        problems.extend(
            self.mismatched
                .iter()
                .map(|m| format!("{} was modified", m.path)),
        );
        problems
    }
}

/// Outcome of `build`.
#[derive(Debug, Clone)]
pub struct BuildReport {
    /// Command that ran, program first
    pub command: Vec<String>,
}

/// Outcome of `clean`.
#[derive(Debug, Clone, Default)]
pub struct CleanReport {
    /// Project-relative paths removed
    pub removed: Vec<String>,
}

fn slash_path(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Runs the pipeline for one project.
#[derive(Debug, Clone)]
pub struct Orchestrator {
    root: PathBuf,
    config: ProjectConfig,
    token: CancellationToken,
}

impl Orchestrator {
    /// Orchestrator for the project at `root`.
    pub fn new(root: impl Into<PathBuf>, config: ProjectConfig) -> Self {
        Self {
            root: root.into(),
            config,
            token: CancellationToken::new(),
        }
    }

    /// Load `modgen.toml` from the project root.
    pub fn load(root: &Path) -> Result<Self> {
        let config = load_config(root)?;
        Ok(Self::new(root, config))
    }

    /// Share a cancellation token with the caller.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.token = token;
        self
    }

    /// Project root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Loaded configuration.
    pub fn config(&self) -> &ProjectConfig {
        &self.config
    }

    /// Store for the configured manifest path.
    pub fn manifest_store(&self) -> FileManifestStore {
        FileManifestStore::new(self.root.join(&self.config.manifest_path))
    }

    fn check_cancelled(&self) -> Result<()> {
        if self.token.is_cancelled() {
            return Err(Error::Cancelled);
        }
        Ok(())
    }

    fn emitter_versions(&self) -> Vec<(Platform, &'static str)> {
        self.config
            .platforms
            .keys()
            .map(|platform| (*platform, emitter_for(*platform).version()))
            .collect()
    }

    /// Discover, parse, resolve and build every spec unit of the project.
    pub fn analyze(&self) -> Result<Analysis> {
        let units = discover_units(&self.root, &self.config.specs_dir)?;
        self.analyze_units(&units)
    }

    /// Parse, resolve and build the given units.
    pub fn analyze_units(&self, units: &[SourceUnit]) -> Result<Analysis> {
        let parsed: Vec<_> = units
            .par_iter()
            .map(|unit| {
                if self.token.is_cancelled() {
                    return None;
                }
                debug!(unit = %unit.id, "Parsing");
                Some(parse_unit(&unit.id, &unit.source).inspect_err(|err| {
                    debug!("{}", err.display_with_source(&unit.source));
                }))
            })
            .collect();
        self.check_cancelled()?;

        let mut diagnostics = Vec::new();
        let mut specs = Vec::new();
        for (unit, result) in units.iter().zip(parsed.into_iter().flatten()) {
            match result {
                Ok(spec) => specs.push(spec),
                Err(err) => diagnostics.push(Diagnostic::new(&unit.id, &CodegenError::Parse(err))),
            }
        }

        let resolution = resolve(&specs);
        for (unit, err) in &resolution.errors {
            diagnostics.push(Diagnostic::new(unit, err));
        }

        let built: Vec<_> = resolution
            .modules
            .par_iter()
            .map(|module| {
                if self.token.is_cancelled() {
                    return None;
                }
                debug!(module = %module.name, "Building IR");
                Some((module.source.as_str(), build_module(module)))
            })
            .collect();
        self.check_cancelled()?;

        let mut modules = Vec::new();
        for (source, result) in built.into_iter().flatten() {
            match result {
                Ok(ir) => modules.push(ir),
                Err(errors) => {
                    diagnostics.extend(errors.iter().map(|err| Diagnostic::new(source, err)));
                }
            }
        }

        // Stable: keeps per-unit order of discovery
        diagnostics.sort_by(|a, b| a.unit.cmp(&b.unit));
        let hashes = modules
            .iter()
            .map(|m| (m.name.clone(), m.structural_hash()))
            .collect();

        Ok(Analysis {
            modules,
            diagnostics,
            hashes,
        })
    }

    /// Compare an analysis against a manifest.
    pub fn drift(&self, analysis: &Analysis, manifest: &Manifest) -> DriftReport {
        drift::detect(&analysis.hashes, manifest, &self.emitter_versions())
    }

    fn place(&self, platform: Platform, module: Option<&str>, file: GeneratedFile) -> Option<OutputFile> {
        let out_dir = self.config.out_dir(platform)?;
        Some(OutputFile {
            path: slash_path(&out_dir.join(&file.path)),
            contents: file.contents,
            platform,
            module: module.map(str::to_string),
        })
    }

    /// Run every configured emitter over the modules, one task per (module, platform).
    pub fn emit(&self, modules: &[ModuleIR]) -> Result<Emission> {
        let platforms: Vec<Platform> = self.config.platforms.keys().copied().collect();
        let tasks: Vec<(&ModuleIR, Platform)> = modules
            .iter()
            .flat_map(|module| platforms.iter().map(move |platform| (module, *platform)))
            .collect();

        let results: Vec<_> = tasks
            .par_iter()
            .map(|(module, platform)| {
                if self.token.is_cancelled() {
                    return None;
                }
                debug!(module = %module.name, %platform, "Emitting");
                Some((*module, *platform, emitter_for(*platform).emit_module(module)))
            })
            .collect();
        self.check_cancelled()?;

        let mut emission = Emission::default();
        let mut claimed: HashMap<String, &ModuleIR> = HashMap::new();
        let mut succeeded: BTreeMap<Platform, Vec<&ModuleIR>> = BTreeMap::new();
        let mut failed: BTreeSet<&str> = BTreeSet::new();

        for (module, platform, result) in results.into_iter().flatten() {
            let files = match result {
                Ok(files) => files,
                Err(err) => {
                    emission.diagnostics.push(Diagnostic::new(&module.source, &err));
                    failed.insert(module.name.as_str());
                    continue;
                }
            };
            let placed: Vec<OutputFile> = files
                .into_iter()
                .filter_map(|file| self.place(platform, Some(&module.name), file))
                .collect();

            if let Some((path, owner)) = placed
                .iter()
                .find_map(|f| claimed.get(&f.path).map(|owner| (&f.path, owner)))
            {
                let err = CodegenError::UnsupportedOnPlatform {
                    ty: format!(
                        "module `{}` (output {path} already belongs to `{}`)",
                        module.name, owner.name
                    ),
                    platform,
                };
                emission.diagnostics.push(Diagnostic::new(&module.source, &err));
                failed.insert(module.name.as_str());
                continue;
            }
            for file in &placed {
                claimed.insert(file.path.clone(), module);
            }
            emission.files.extend(placed);
            succeeded.entry(platform).or_default().push(module);
        }

        for platform in &platforms {
            let members = succeeded.get(platform).map(Vec::as_slice).unwrap_or_default();
            match emitter_for(*platform).emit_index(members) {
                Ok(files) => {
                    for file in files.into_iter().filter_map(|f| self.place(*platform, None, f)) {
                        if let Some(owner) = claimed.get(&file.path) {
                            let err = CodegenError::UnsupportedOnPlatform {
                                ty: format!(
                                    "index file {} (already belongs to `{}`)",
                                    file.path, owner.name
                                ),
                                platform: *platform,
                            };
                            emission.diagnostics.push(Diagnostic::new(&owner.source, &err));
                            continue;
                        }
                        emission.files.push(file);
                    }
                }
                Err(err) => emission.diagnostics.push(Diagnostic::new("index", &err)),
            }
        }

        emission.complete = modules
            .iter()
            .map(|m| m.name.as_str())
            .filter(|name| !failed.contains(name))
            .map(str::to_string)
            .collect();
        Ok(emission)
    }

    /// Write files that changed. Files are grouped by owning module so a
    /// cancelled module leaves none of its files behind.
    fn write(&self, files: &[OutputFile]) -> Result<(Vec<String>, usize)> {
        let mut groups: BTreeMap<Option<&str>, Vec<&OutputFile>> = BTreeMap::new();
        for file in files {
            groups.entry(file.module.as_deref()).or_default().push(file);
        }
        let groups: Vec<_> = groups.into_values().collect();

        let outcomes: Vec<Vec<(&str, WriteOutcome)>> = groups
            .par_iter()
            .map(|group| {
                if self.token.is_cancelled() {
                    return Ok(Vec::new());
                }
                group
                    .iter()
                    .map(|file| {
                        let path = self.root.join(&file.path);
                        let outcome =
                            write_if_changed(&path, &file.contents).map_err(|e| Error::io(&path, e))?;
                        debug!(path = %file.path, ?outcome, "Output");
                        Ok((file.path.as_str(), outcome))
                    })
                    .collect::<Result<Vec<_>>>()
            })
            .collect::<Result<_>>()?;

        let mut written = Vec::new();
        let mut unchanged = 0;
        for (path, outcome) in outcomes.into_iter().flatten() {
            match outcome {
                WriteOutcome::Unchanged => unchanged += 1,
                WriteOutcome::Created | WriteOutcome::Updated => written.push(path.to_string()),
            }
        }
        written.sort();
        Ok((written, unchanged))
    }

    fn next_manifest(&self, analysis: &Analysis, emission: &Emission) -> Manifest {
        let mut manifest = Manifest::default();
        for (platform, version) in self.emitter_versions() {
            manifest.emitters.insert(platform, version.to_string());
        }

        let index_files: Vec<&str> = emission
            .files
            .iter()
            .filter(|f| f.module.is_none())
            .map(|f| f.path.as_str())
            .collect();
        for module in &analysis.modules {
            if !emission.complete.contains(&module.name) {
                continue;
            }
            let mut outputs: Vec<String> = emission
                .files
                .iter()
                .filter(|f| f.module.as_deref() == Some(module.name.as_str()))
                .map(|f| f.path.clone())
                .chain(index_files.iter().map(|p| (*p).to_string()))
                .collect();
            outputs.sort();
            manifest.modules.insert(
                module.name.clone(),
                ModuleRecord {
                    hash: analysis.hashes.get(&module.name).cloned().unwrap_or_default(),
                    source: module.source.clone(),
                    outputs,
                },
            );
        }
        manifest
    }

    /// Remove files the previous manifest recorded and this run no longer produces.
    fn prune(&self, previous: &Manifest, next: &Manifest) -> Result<Vec<String>> {
        let keep: BTreeSet<&str> = next.all_outputs().into_iter().collect();
        let mut pruned = Vec::new();
        for output in previous.all_outputs() {
            if keep.contains(output) {
                continue;
            }
            let path = self.root.join(output);
            if remove_if_exists(&path).map_err(|e| Error::io(&path, e))? {
                warn!(path = %output, "Pruned stale output");
                pruned.push(output.to_string());
            }
        }
        Ok(pruned)
    }

    /// Full pipeline against an explicit previous manifest.
    ///
    /// Writes outputs that succeeded even when other units failed. The
    /// returned report carries the replacement manifest only when nothing failed;
    /// persisting it is up to the caller.
    pub fn run_codegen(&self, previous: &Manifest) -> Result<CodegenReport> {
        let analysis = self.analyze()?;
        let drift = self.drift(&analysis, previous);
        let emission = self.emit(&analysis.modules)?;
        let (written, unchanged) = self.write(&emission.files)?;
        self.check_cancelled()?;

        let mut diagnostics = analysis.diagnostics.clone();
        diagnostics.extend(emission.diagnostics.iter().cloned());

        let (manifest, pruned) = if diagnostics.is_empty() {
            let manifest = self.next_manifest(&analysis, &emission);
            let pruned = self.prune(previous, &manifest)?;
            (Some(manifest), pruned)
        } else {
            (None, Vec::new())
        };

        info!(
            modules = analysis.modules.len(),
            written = written.len(),
            unchanged,
            pruned = pruned.len(),
            errors = diagnostics.len(),
            "Codegen finished"
        );

        Ok(CodegenReport {
            modules: analysis.modules.iter().map(|m| m.name.clone()).collect(),
            written,
            unchanged,
            pruned,
            drift,
            diagnostics,
            manifest,
        })
    }

    /// Per-module summaries with drift status.
    pub fn show(&self, manifest: &Manifest) -> Result<ShowReport> {
        let analysis = self.analyze()?;
        let drift = self.drift(&analysis, manifest);

        let modules = analysis
            .modules
            .iter()
            .map(|module| ModuleSummary {
                name: module.name.clone(),
                source: module.source.clone(),
                status: drift
                    .status(&module.name)
                    .cloned()
                    .unwrap_or(DriftStatus::New),
                methods: module.methods.iter().map(|m| m.signature()).collect(),
                objects: module.objects.iter().map(|o| o.name.clone()).collect(),
                enums: module.enums.iter().map(|e| e.name.clone()).collect(),
            })
            .collect();

        Ok(ShowReport {
            modules,
            removed: drift.removed().map(str::to_string).collect(),
            stale_emitters: drift.stale_emitters.clone(),
            diagnostics: analysis.diagnostics,
        })
    }

    /// Recompute everything and compare it with the manifest and the files on disk.
    ///
    /// Fails with the collected diagnostics when any spec is invalid.
    pub fn doctor(&self, manifest: &Manifest) -> Result<DoctorReport> {
        let analysis = self.analyze()?;
        if !analysis.diagnostics.is_empty() {
            return Err(Error::Failed(analysis.diagnostics));
        }
        let drift = self.drift(&analysis, manifest);
        let emission = self.emit(&analysis.modules)?;
        if !emission.diagnostics.is_empty() {
            return Err(Error::Failed(emission.diagnostics));
        }

        let mut missing = BTreeSet::new();
        let mut mismatched = Vec::new();
        for file in &emission.files {
            let path = self.root.join(&file.path);
            match fs::read_to_string(&path) {
                Ok(actual) if actual == file.contents => {}
                Ok(actual) => mismatched.push(Mismatch {
                    path: file.path.clone(),
                    expected: file.contents.clone(),
                    actual,
                }),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    missing.insert(file.path.clone());
                }
                Err(e) => return Err(Error::io(&path, e)),
            }
        }
        for output in manifest.all_outputs() {
            if !self.root.join(output).exists() {
                missing.insert(output.to_string());
            }
        }

        let report = DoctorReport {
            drift,
            missing: missing.into_iter().collect(),
            mismatched,
        };
        info!(healthy = report.is_healthy(), "Doctor finished");
        Ok(report)
    }
}

/// `modgen codegen`: run the pipeline and persist the manifest on success.
pub fn codegen(project_root: &Path, token: &CancellationToken) -> Result<CodegenReport> {
    let orchestrator = Orchestrator::load(project_root)?.with_cancellation(token.clone());
    let store = orchestrator.manifest_store();
    let previous = store.load()?;
    let report = orchestrator.run_codegen(&previous)?;
    if let Some(manifest) = &report.manifest {
        store.save(manifest)?;
    }
    Ok(report)
}

/// `modgen show`
pub fn show(project_root: &Path) -> Result<ShowReport> {
    let orchestrator = Orchestrator::load(project_root)?;
    let manifest = orchestrator.manifest_store().load()?;
    orchestrator.show(&manifest)
}

/// `modgen doctor`
pub fn doctor(project_root: &Path) -> Result<DoctorReport> {
    let orchestrator = Orchestrator::load(project_root)?;
    let manifest = orchestrator.manifest_store().load()?;
    orchestrator.doctor(&manifest)
}

/// `modgen build`: refuse to build out-of-date bindings, then run the build command.
pub fn build(project_root: &Path, token: &CancellationToken) -> Result<BuildReport> {
    let orchestrator = Orchestrator::load(project_root)?.with_cancellation(token.clone());
    let manifest = orchestrator.manifest_store().load()?;
    let report = orchestrator.doctor(&manifest)?;
    if !report.is_healthy() {
        return Err(Error::OutOfDate(report.problems()));
    }
    orchestrator.check_cancelled()?;

    let command = orchestrator.config.build_command.clone();
    let rendered = command.join(" ");
    let Some((program, args)) = command.split_first() else {
        return Err(Error::Build {
            command: rendered,
            reason: "empty command".to_string(),
        });
    };
    info!(command = %rendered, "Running build command");
    let status = Command::new(program)
        .args(args)
        .current_dir(project_root)
        .status()
        .map_err(|e| Error::Build {
            command: rendered.clone(),
            reason: e.to_string(),
        })?;
    if !status.success() {
        return Err(Error::Build {
            command: rendered,
            reason: format!("exited with {status}"),
        });
    }
    Ok(BuildReport { command })
}

/// `modgen clean`: remove every recorded output and the manifest.
pub fn clean(project_root: &Path) -> Result<CleanReport> {
    let orchestrator = Orchestrator::load(project_root)?;
    let store = orchestrator.manifest_store();
    let manifest = store.load()?;

    let mut removed = Vec::new();
    for output in manifest.all_outputs() {
        let path = project_root.join(output);
        if remove_if_exists(&path).map_err(|e| Error::io(&path, e))? {
            debug!(path = %output, "Removed");
            removed.push(output.to_string());
        }
    }
    store.remove()?;
    info!(removed = removed.len(), "Clean finished");
    Ok(CleanReport { removed })
}

pub use crate::scaffold::init;

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::manifest::MemoryManifestStore;
    use tempfile::TempDir;

    const CONFIG: &str = "[project]\nname = \"t\"\n\n[platforms.rust]\nout_dir = \"gen/rust\"\n\n[platforms.typescript]\nout_dir = \"gen/ts\"\n";

    fn module_source(name: &str, methods: &str) -> String {
        format!(
            "interface Spec extends NativeModule {{ {methods} }}\n\
             export default NativeModuleRegistry.getEnforcing<Spec>('{name}');\n"
        )
    }

    fn orchestrator(dir: &TempDir) -> Orchestrator {
        let config = ProjectConfig::from_toml(CONFIG, Path::new("modgen.toml")).unwrap();
        Orchestrator::new(dir.path(), config)
    }

    fn unit(id: &str, source: String) -> SourceUnit {
        SourceUnit {
            id: id.to_string(),
            path: PathBuf::from(id),
            source,
        }
    }

    #[test]
    fn test_run_codegen_with_memory_manifest() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("specs")).unwrap();
        fs::write(
            dir.path().join("specs/NativeClock.ts"),
            module_source("Clock", "now(): number;"),
        )
        .unwrap();
        let orchestrator = orchestrator(&dir);
        let store = MemoryManifestStore::new();

        let report = orchestrator.run_codegen(&store.load().unwrap()).unwrap();
        assert_eq!(report.drift.status("Clock"), Some(&DriftStatus::New));
        let manifest = report.manifest.unwrap();
        assert_eq!(
            manifest.modules["Clock"].outputs,
            vec![
                "gen/rust/clock.rs",
                "gen/rust/mod.rs",
                "gen/ts/NativeClock.ts",
                "gen/ts/index.ts"
            ]
        );
        store.save(&manifest).unwrap();

        let report = orchestrator.run_codegen(&store.load().unwrap()).unwrap();
        assert!(report.drift.is_clean());
        assert!(report.written.is_empty());
        assert_eq!(report.manifest.as_ref(), Some(&manifest));
        assert!(!dir.path().join(".modgen/manifest.json").exists());
    }

    #[test]
    fn test_colliding_outputs_fail_the_later_module() {
        let dir = TempDir::new().unwrap();
        let orchestrator = orchestrator(&dir);
        let analysis = orchestrator
            .analyze_units(&[
                unit("specs/a.ts", module_source("FooBar", "a(): void;")),
                unit("specs/b.ts", module_source("foo-bar", "b(): void;")),
            ])
            .unwrap();
        assert!(analysis.diagnostics.is_empty());

        let emission = orchestrator.emit(&analysis.modules).unwrap();
        assert_eq!(emission.complete, BTreeSet::from(["FooBar".to_string()]));
        assert_eq!(emission.diagnostics.len(), 2);
        assert!(
            emission
                .diagnostics
                .iter()
                .all(|d| d.kind == "UnsupportedOnPlatform" && d.unit == "specs/b.ts")
        );

        let rust_index = emission
            .files
            .iter()
            .find(|f| f.path == "gen/rust/mod.rs")
            .unwrap();
        assert!(rust_index.contents.contains("pub mod foo_bar;"));
        assert!(!rust_index.contents.contains("\"foo-bar\""));
    }

    #[test]
    fn test_index_collision_names_the_owner_source() {
        let dir = TempDir::new().unwrap();
        let orchestrator = orchestrator(&dir);
        let analysis = orchestrator
            .analyze_units(&[unit("specs/mod.ts", module_source("Mod", "ping(): void;"))])
            .unwrap();

        let emission = orchestrator.emit(&analysis.modules).unwrap();
        assert_eq!(emission.diagnostics.len(), 1);
        let diagnostic = &emission.diagnostics[0];
        assert_eq!(diagnostic.kind, "UnsupportedOnPlatform");
        assert_eq!(diagnostic.unit, "specs/mod.ts");
        assert!(diagnostic.message.contains("index file gen/rust/mod.rs"));
        assert!(diagnostic.message.contains("`Mod`"));
    }

    #[test]
    fn test_parse_errors_do_not_stop_other_units() {
        let dir = TempDir::new().unwrap();
        let analysis = orchestrator(&dir)
            .analyze_units(&[
                unit("specs/a.ts", "interface Broken {".to_string()),
                unit("specs/b.ts", module_source("Ok", "ping(): void;")),
            ])
            .unwrap();
        assert_eq!(analysis.modules.len(), 1);
        assert_eq!(analysis.diagnostics.len(), 1);
        assert_eq!(analysis.diagnostics[0].kind, "ParseError");
        assert_eq!(analysis.diagnostics[0].unit, "specs/a.ts");
        assert!(analysis.hashes.contains_key("Ok"));
    }

    #[test]
    fn test_mismatch_diff_headers() {
        let mismatch = Mismatch {
            path: "gen/ts/index.ts".into(),
            expected: "a\nb\n".into(),
            actual: "a\nc\n".into(),
        };
        let diff = mismatch.unified_diff();
        assert!(diff.contains("--- a/gen/ts/index.ts"));
        assert!(diff.contains("+++ b/gen/ts/index.ts"));
        assert!(diff.contains("-c\n"));
        assert!(diff.contains("+b\n"));
    }
}
