//! modgen codegen engine
//!
//! Turns TypeScript-subset module specs into Rust, C++ and TypeScript bindings
//! that agree on one wire contract. Every CLI command is a thin wrapper over the
//! entry points in [`orchestrator`].

pub mod cancel;
pub mod discovery;
pub mod drift;
pub mod emit;
pub mod error;
pub mod ir;
pub mod manifest;
pub mod orchestrator;
pub mod output;
pub mod parser;
pub mod resolver;
pub mod scaffold;
pub mod types;

// Re-export commonly used types
pub use cancel::CancellationToken;
pub use drift::{DriftReport, DriftStatus};
pub use error::{CodegenError, Diagnostic, Error, ParseError, ParseErrorKind, Result, Span};
pub use ir::{IrType, ModuleIR};
pub use manifest::{FileManifestStore, Manifest, ManifestStore, MemoryManifestStore};
pub use orchestrator::{
    BuildReport, CleanReport, CodegenReport, DoctorReport, Mismatch, ModuleSummary, Orchestrator,
    ShowReport, build, clean, codegen, doctor, init, show,
};
