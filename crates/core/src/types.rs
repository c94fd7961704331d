//! Resolved type graph produced by the resolver.
//!
//! Every reference is closed: named objects and enums are replaced by shared
//! handles to their declarations.

use std::fmt;
use std::sync::Arc;

/// A resolved type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeRef {
    /// `void`
    Void,
    /// `boolean`
    Bool,
    /// `Int32`
    Int,
    /// `number`
    Double,
    /// `string`
    String,
    /// `T[]`
    Array(Box<TypeRef>),
    /// Object shape, named or inline
    Object(Arc<ObjectShape>),
    /// String enum
    EnumRef(Arc<EnumDef>),
    /// Registry name of another module
    ModuleRef(String),
    /// `T | null`
    Nullable(Box<TypeRef>),
    /// `Promise<T>`
    Promise(Box<TypeRef>),
}

/// Ordered fields of an object type. Named shapes carry their declared name;
/// inline shapes get a name during IR building.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectShape {
    /// Declared name, `None` for inline shapes
    pub name: Option<String>,
    /// Fields in declaration order
    pub fields: Vec<Field>,
}

/// A named field or parameter.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Field {
    /// Name as declared
    pub name: String,
    /// Resolved type
    pub ty: TypeRef,
}

/// A declared string enum.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EnumDef {
    /// Enum name
    pub name: String,
    /// Variants in declaration order
    pub variants: Vec<Variant>,
}

/// One enum member.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Variant {
    /// Member name
    pub name: String,
    /// Wire value
    pub value: String,
}

impl TypeRef {
    /// True for a top-level `Promise`.
    pub fn is_promise(&self) -> bool {
        matches!(self, TypeRef::Promise(_))
    }

    /// True if a `Promise` appears anywhere in the type.
    pub fn contains_promise(&self) -> bool {
        match self {
            TypeRef::Promise(_) => true,
            TypeRef::Array(inner) | TypeRef::Nullable(inner) => inner.contains_promise(),
            TypeRef::Object(shape) => shape.fields.iter().any(|f| f.ty.contains_promise()),
            _ => false,
        }
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeRef::Void => f.write_str("Void"),
            TypeRef::Bool => f.write_str("Bool"),
            TypeRef::Int => f.write_str("Int"),
            TypeRef::Double => f.write_str("Double"),
            TypeRef::String => f.write_str("String"),
            TypeRef::Array(inner) => write!(f, "Array({inner})"),
            TypeRef::Object(shape) => match &shape.name {
                Some(name) => write!(f, "Object({name})"),
                None => f.write_str("Object({..})"),
            },
            TypeRef::EnumRef(def) => write!(f, "EnumRef({})", def.name),
            TypeRef::ModuleRef(name) => write!(f, "ModuleRef({name})"),
            TypeRef::Nullable(inner) => write!(f, "Nullable({inner})"),
            TypeRef::Promise(inner) => write!(f, "Promise({inner})"),
        }
    }
}
