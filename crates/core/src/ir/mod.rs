//! Module IR: the canonical, fully named form of a module that emitters consume.
//!
//! Object shapes are referenced by name and listed once per module in
//! dependency order, so every emitter can declare types before their users.
//! The IR is immutable once built and its JSON serialization is the input of
//! the structural hash recorded in the generation manifest.

pub mod builder;

use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fmt;

use crate::parser::ast::LookupKind;

pub use builder::build_module;

/// A fully named type in the module IR.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", content = "of", rename_all = "snake_case")]
pub enum IrType {
    /// No value; only valid as a return type or `Promise<void>`
    Void,
    /// Boolean
    Bool,
    /// 32-bit signed integer
    Int,
    /// Double precision number
    Double,
    /// UTF-8 string
    String,
    /// Homogeneous array
    Array(Box<IrType>),
    /// Name of an entry in [`ModuleIR::objects`]
    Object(String),
    /// Name of an entry in [`ModuleIR::enums`]
    Enum(String),
    /// Registry name of another module
    Module(String),
    /// Value or null
    Nullable(Box<IrType>),
    /// Asynchronous result; only as the outermost return type
    Promise(Box<IrType>),
}

impl IrType {
    /// True if a `Promise` appears below the top.
    pub fn contains_promise(&self) -> bool {
        match self {
            IrType::Promise(_) => true,
            IrType::Array(inner) | IrType::Nullable(inner) => inner.contains_promise(),
            _ => false,
        }
    }

    /// True if `Void` appears anywhere in the type, including at the top.
    pub fn contains_void(&self) -> bool {
        match self {
            IrType::Void => true,
            IrType::Array(inner) | IrType::Nullable(inner) | IrType::Promise(inner) => {
                inner.contains_void()
            }
            _ => false,
        }
    }

    /// True if another module is referenced anywhere in the type.
    pub fn contains_module_ref(&self) -> bool {
        match self {
            IrType::Module(_) => true,
            IrType::Array(inner) | IrType::Nullable(inner) | IrType::Promise(inner) => {
                inner.contains_module_ref()
            }
            _ => false,
        }
    }
}

/// Renders the type in interface-description syntax.
impl fmt::Display for IrType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IrType::Void => f.write_str("void"),
            IrType::Bool => f.write_str("boolean"),
            IrType::Int => f.write_str("Int32"),
            IrType::Double => f.write_str("number"),
            IrType::String => f.write_str("string"),
            IrType::Array(inner) => match **inner {
                IrType::Nullable(_) => write!(f, "({inner})[]"),
                _ => write!(f, "{inner}[]"),
            },
            IrType::Object(name) | IrType::Enum(name) => f.write_str(name),
            IrType::Module(name) => write!(f, "module '{name}'"),
            IrType::Nullable(inner) => write!(f, "{inner} | null"),
            IrType::Promise(inner) => write!(f, "Promise<{inner}>"),
        }
    }
}

/// Canonical description of one module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModuleIR {
    /// Registry name, emitted verbatim for registration
    pub name: String,
    /// Declared interface name, e.g. `Spec`
    pub interface: String,
    /// Registry lookup the module is exported through
    pub lookup: LookupKind,
    /// Identity of the spec unit the module was declared in
    pub source: String,
    /// Methods in declaration order
    pub methods: Vec<MethodIR>,
    /// Reachable object shapes, dependencies first
    pub objects: Vec<ObjectIR>,
    /// Reachable enums in first-use order
    pub enums: Vec<EnumIR>,
}

/// One method of a module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MethodIR {
    /// Method name as declared
    pub name: String,
    /// Parameters in order
    pub params: Vec<ParamIR>,
    /// Return type, `Promise` included for async methods
    pub ret: IrType,
    /// True iff `ret` is `Promise(_)`
    pub is_async: bool,
}

/// One method parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParamIR {
    /// Parameter name as declared
    pub name: String,
    /// Parameter type
    pub ty: IrType,
}

/// A named object shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ObjectIR {
    /// Declared or synthesized name
    pub name: String,
    /// Fields in declaration order
    pub fields: Vec<FieldIR>,
}

/// One field of an object shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldIR {
    /// Wire name
    pub name: String,
    /// Field type
    pub ty: IrType,
}

/// A string enum.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnumIR {
    /// Enum name
    pub name: String,
    /// Variants in declaration order
    pub variants: Vec<VariantIR>,
}

/// One enum variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VariantIR {
    /// Variant name
    pub name: String,
    /// String carried on the wire
    pub value: String,
}

impl MethodIR {
    /// `name(a: T, b: U): R`
    pub fn signature(&self) -> String {
        let params = self
            .params
            .iter()
            .map(|p| format!("{}: {}", p.name, p.ty))
            .collect::<Vec<_>>()
            .join(", ");
        format!("{}({}): {}", self.name, params, self.ret)
    }

    /// Success type of an asynchronous method, or the return type otherwise.
    pub fn resolved_type(&self) -> &IrType {
        match &self.ret {
            IrType::Promise(inner) => inner,
            other => other,
        }
    }
}

impl ModuleIR {
    /// SHA-256 (hex) of the canonical JSON serialization.
    pub fn structural_hash(&self) -> String {
        let canonical = serde_json::to_vec(self).unwrap_or_default();
        hex::encode(Sha256::digest(&canonical))
    }

    /// Object shape by name.
    pub fn object(&self, name: &str) -> Option<&ObjectIR> {
        self.objects.iter().find(|o| o.name == name)
    }

    /// Enum by name.
    pub fn enumeration(&self, name: &str) -> Option<&EnumIR> {
        self.enums.iter().find(|e| e.name == name)
    }
}

/// Hash over several modules' hashes, used for index files.
pub fn combined_hash<'a>(hashes: impl IntoIterator<Item = &'a str>) -> String {
    let mut hasher = Sha256::new();
    for hash in hashes {
        hasher.update(hash.as_bytes());
        hasher.update(b"\n");
    }
    hex::encode(hasher.finalize())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn sample() -> ModuleIR {
        ModuleIR {
            name: "Calculator".into(),
            interface: "Spec".into(),
            lookup: LookupKind::GetEnforcing,
            source: "specs/NativeCalculator.ts".into(),
            methods: vec![MethodIR {
                name: "add".into(),
                params: vec![
                    ParamIR {
                        name: "a".into(),
                        ty: IrType::Double,
                    },
                    ParamIR {
                        name: "b".into(),
                        ty: IrType::Nullable(Box::new(IrType::Int)),
                    },
                ],
                ret: IrType::Double,
                is_async: false,
            }],
            objects: vec![],
            enums: vec![],
        }
    }

    #[test]
    fn test_hash_is_stable_and_structural() {
        let module = sample();
        assert_eq!(module.structural_hash(), sample().structural_hash());
        assert_eq!(module.structural_hash().len(), 64);

        let mut changed = sample();
        changed.methods[0].ret = IrType::Int;
        assert_ne!(module.structural_hash(), changed.structural_hash());

        let mut nullable_lookup = sample();
        nullable_lookup.lookup = LookupKind::Get;
        assert_ne!(module.structural_hash(), nullable_lookup.structural_hash());
    }

    #[test]
    fn test_signature_rendering() {
        assert_eq!(
            sample().methods[0].signature(),
            "add(a: number, b: Int32 | null): number"
        );
        let ty = IrType::Promise(Box::new(IrType::Array(Box::new(IrType::Nullable(
            Box::new(IrType::String),
        )))));
        assert_eq!(ty.to_string(), "Promise<(string | null)[]>");
    }
}
