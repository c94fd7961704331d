//! Runtime support for bindings generated by modgen.
//!
//! Generated Rust modules marshal their arguments through [`FromValue`] and
//! [`IntoValue`], settle asynchronous calls through a [`Promise`], and are
//! looked up by name through a [`ModuleLookup`] such as [`ModuleRegistry`].

pub mod marshal;
pub mod promise;
pub mod registry;
pub mod value;

pub use marshal::{Args, FromValue, IntoValue, InvokeError, ObjectFields};
pub use promise::Promise;
pub use registry::{ModuleLookup, ModuleRegistry, NativeModule, RegistryError};
pub use value::Value;
