//! Name-keyed lookup of native module instances.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

use crate::marshal::InvokeError;
use crate::promise::Promise;
use crate::value::Value;

/// A native module instance callable by name.
///
/// Generated `<Module>Module<T>` adapters implement this for any `T`
/// implementing the generated spec trait.
pub trait NativeModule: Send + Sync {
    /// Registry name, matching the name the module was declared with.
    fn name(&self) -> &'static str;

    /// Declared method names in declaration order.
    fn methods(&self) -> &'static [&'static str];

    /// Invoke a synchronous method.
    fn call(&self, method: &str, args: Vec<Value>) -> Result<Value, InvokeError>;

    /// Invoke an asynchronous method. Marshaling failures reject `promise`.
    fn call_async(&self, method: &str, args: Vec<Value>, promise: Promise<Value>);
}

/// Registry lookup and registration failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// `get_enforcing` found no module of that name
    #[error("Native module `{0}` is not registered")]
    NotFound(String),
    /// A module of that name was registered before
    #[error("Native module `{0}` is already registered")]
    AlreadyRegistered(String),
}

/// Lookup capability over registered modules.
///
/// `get` is the optional lookup; `get_enforcing` is the lookup for modules the
/// caller cannot run without.
pub trait ModuleLookup {
    /// The module registered under `name`, if any.
    fn get(&self, name: &str) -> Option<Arc<dyn NativeModule>>;

    /// The module registered under `name`, or [`RegistryError::NotFound`].
    fn get_enforcing(&self, name: &str) -> Result<Arc<dyn NativeModule>, RegistryError>;
}

/// In-process module registry.
#[derive(Default)]
pub struct ModuleRegistry {
    modules: BTreeMap<String, Arc<dyn NativeModule>>,
}

impl ModuleRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a module under its own name. Names are case-sensitive.
    pub fn register(&mut self, module: impl NativeModule + 'static) -> Result<(), RegistryError> {
        let name = module.name();
        if self.modules.contains_key(name) {
            return Err(RegistryError::AlreadyRegistered(name.to_string()));
        }
        debug!("Registering native module {name}");
        self.modules.insert(name.to_string(), Arc::new(module));
        Ok(())
    }

    /// Registered names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.modules.keys().map(String::as_str)
    }
}

impl ModuleLookup for ModuleRegistry {
    fn get(&self, name: &str) -> Option<Arc<dyn NativeModule>> {
        self.modules.get(name).cloned()
    }

    fn get_enforcing(&self, name: &str) -> Result<Arc<dyn NativeModule>, RegistryError> {
        self.get(name)
            .ok_or_else(|| RegistryError::NotFound(name.to_string()))
    }
}

impl fmt::Debug for ModuleRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleRegistry")
            .field("modules", &self.modules.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::marshal::{Args, IntoValue};

    struct Echo;

    impl NativeModule for Echo {
        fn name(&self) -> &'static str {
            "Echo"
        }

        fn methods(&self) -> &'static [&'static str] {
            &["echo"]
        }

        fn call(&self, method: &str, args: Vec<Value>) -> Result<Value, InvokeError> {
            match method {
                "echo" => {
                    let mut args = Args::new(method, args, 1)?;
                    Ok(args.arg::<Option<String>>()?.into_value())
                }
                _ => Err(InvokeError::UnknownMethod {
                    module: self.name().to_string(),
                    method: method.to_string(),
                }),
            }
        }

        fn call_async(&self, method: &str, args: Vec<Value>, promise: Promise<Value>) {
            promise.settle(self.call(method, args).map_err(|e| e.to_string()));
        }
    }

    #[test]
    fn test_get_and_get_enforcing() {
        let mut registry = ModuleRegistry::new();
        registry.register(Echo).unwrap();

        assert!(registry.get("Echo").is_some());
        assert!(registry.get("echo").is_none());
        assert_eq!(
            registry.get_enforcing("Missing").err(),
            Some(RegistryError::NotFound("Missing".to_string()))
        );

        let module = registry.get_enforcing("Echo").unwrap();
        assert_eq!(
            module.call("echo", vec![Value::Null]).unwrap(),
            Value::Null
        );
        assert!(matches!(
            module.call("nope", vec![]),
            Err(InvokeError::UnknownMethod { .. })
        ));
    }

    #[test]
    fn test_register_twice_fails() {
        let mut registry = ModuleRegistry::new();
        registry.register(Echo).unwrap();
        assert_eq!(
            registry.register(Echo),
            Err(RegistryError::AlreadyRegistered("Echo".to_string()))
        );
        assert_eq!(registry.names().collect::<Vec<_>>(), vec!["Echo"]);
    }
}
