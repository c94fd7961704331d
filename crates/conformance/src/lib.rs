//! Rust bindings generated at build time from the specs in `specs/`.
//!
//! The crate exists so the emitter's output is compiled against
//! `modgen-runtime` and driven through a registry in tests.

include!(concat!(env!("OUT_DIR"), "/bindings.rs"));
