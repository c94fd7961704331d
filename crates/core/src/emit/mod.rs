//! Per-platform code emitters.
//!
//! Every emitter is a pure function of the [`ModuleIR`] plus its own fixed
//! version: no clock, no file-system state, no prior output. Running it twice
//! on the same IR yields byte-identical files.

pub mod cxx;
pub mod rust;
pub mod typescript;

use modgen_common::Platform;
use std::path::PathBuf;

use crate::error::CodegenError;
use crate::ir::{ModuleIR, combined_hash};

/// One emitted file, relative to the platform's output directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedFile {
    /// Path relative to the output directory
    pub path: PathBuf,
    /// File contents
    pub contents: String,
}

impl GeneratedFile {
    /// File at `path` holding `contents`.
    pub fn new(path: impl Into<PathBuf>, contents: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            contents: contents.into(),
        }
    }
}

/// Contract shared by all platform emitters.
pub trait Emitter: Send + Sync {
    /// Target platform.
    fn platform(&self) -> Platform;

    /// Template version; recorded in the manifest and in every file header.
    fn version(&self) -> &'static str;

    /// Emit the files of one module, in a fixed order.
    fn emit_module(&self, module: &ModuleIR) -> Result<Vec<GeneratedFile>, CodegenError>;

    /// Emit the index file(s) covering every successfully emitted module.
    fn emit_index(&self, modules: &[&ModuleIR]) -> Result<Vec<GeneratedFile>, CodegenError>;

    /// `UnsupportedOnPlatform` for `ty` on this emitter's platform.
    fn unsupported(&self, ty: impl Into<String>) -> CodegenError
    where
        Self: Sized,
    {
        CodegenError::UnsupportedOnPlatform {
            ty: ty.into(),
            platform: self.platform(),
        }
    }
}

/// The emitter for a platform.
pub fn emitter_for(platform: Platform) -> Box<dyn Emitter> {
    match platform {
        Platform::Rust => Box::new(rust::RustEmitter),
        Platform::Cxx => Box::new(cxx::CxxEmitter),
        Platform::Typescript => Box::new(typescript::TypescriptEmitter),
    }
}

/// The comment block every generated file starts with.
#[derive(Debug, Clone, Copy)]
pub struct FileHeader<'a> {
    /// Emitting platform
    pub platform: Platform,
    /// Emitter version
    pub version: &'a str,
    /// Spec unit the module came from
    pub source: &'a str,
    /// Structural hash of the module
    pub hash: &'a str,
}

impl<'a> FileHeader<'a> {
    /// Header for one module's files.
    pub fn for_module(emitter: &dyn Emitter, module: &'a ModuleIR, hash: &'a str) -> Self {
        Self {
            platform: emitter.platform(),
            version: emitter.version(),
            source: &module.source,
            hash,
        }
    }

    /// Render with the given line comment prefix, e.g. `//`.
    pub fn render(&self, comment: &str) -> String {
        format!(
            "{comment} @generated by modgen ({} emitter {}). Do not edit by hand.\n\
             {comment} Source: {}\n\
             {comment} Structural hash: {}\n",
            self.platform, self.version, self.source, self.hash
        )
    }
}

/// Source label and hash used in index file headers.
pub fn index_identity(modules: &[&ModuleIR]) -> (String, String) {
    let names = modules
        .iter()
        .map(|m| m.name.as_str())
        .collect::<Vec<_>>()
        .join(", ");
    let hashes: Vec<String> = modules.iter().map(|m| m.structural_hash()).collect();
    (
        format!("index of [{names}]"),
        combined_hash(hashes.iter().map(String::as_str)),
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_header_render() {
        let header = FileHeader {
            platform: Platform::Rust,
            version: "1",
            source: "specs/a.ts",
            hash: "abc",
        };
        assert_eq!(
            header.render("//"),
            "// @generated by modgen (rust emitter 1). Do not edit by hand.\n\
             // Source: specs/a.ts\n\
             // Structural hash: abc\n"
        );
    }

    #[test]
    fn test_emitter_for_each_platform() {
        for platform in Platform::ALL {
            assert_eq!(emitter_for(platform).platform(), platform);
        }
    }
}
