//! Shared types and utilities for modgen
//!
//! This crate contains functionality used by both the codegen engine
//! (`modgen-core`) and the command line surface (`modgen-cli`).

pub mod config;
pub mod naming;
pub mod platform;

// Re-export commonly used types
pub use config::{CONFIG_FILENAME, ConfigError, ProjectConfig, find_project_root, load_config};
pub use platform::Platform;
