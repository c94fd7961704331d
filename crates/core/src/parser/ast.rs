//! Syntax tree of one spec unit.
//!
//! Types are kept as written: names are not resolved here, and nullable or
//! promise wrappers are recorded exactly as nested in the source.

use serde::Serialize;

use crate::error::Span;

/// A parsed spec unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecUnit {
    /// Unit identity string (project-relative path)
    pub id: String,
    /// Declarations in source order
    pub declarations: Vec<Declaration>,
    /// Registration, if the unit declares a module
    pub registration: Option<Registration>,
}

impl SpecUnit {
    /// The module interface bound by this unit's registration.
    pub fn module(&self) -> Option<&InterfaceDecl> {
        self.declarations.iter().find_map(|decl| match decl {
            Declaration::Module(module) => Some(module),
            _ => None,
        })
    }
}

/// A top-level declaration of a unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Declaration {
    /// `interface Spec extends TurboModule { ... }`
    Module(InterfaceDecl),
    /// `interface Foo { ... }` or `type Foo = { ... }`
    Object(ObjectDecl),
    /// `enum Foo { ... }`
    Enum(EnumDecl),
}

impl Declaration {
    /// Declared name.
    pub fn name(&self) -> &str {
        match self {
            Declaration::Module(decl) => &decl.name,
            Declaration::Object(decl) => &decl.name,
            Declaration::Enum(decl) => &decl.name,
        }
    }

    /// Position of the declaring keyword.
    pub fn span(&self) -> Span {
        match self {
            Declaration::Module(decl) => decl.span,
            Declaration::Object(decl) => decl.span,
            Declaration::Enum(decl) => decl.span,
        }
    }
}

/// An interface extending a module base; the module's method list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceDecl {
    /// Interface name, usually `Spec`
    pub name: String,
    /// Base interface name
    pub extends: String,
    /// Methods in source order
    pub methods: Vec<MethodDecl>,
    /// Position of `interface`
    pub span: Span,
}

/// A method signature of a module interface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodDecl {
    /// Method name
    pub name: String,
    /// Parameters in order
    pub params: Vec<ParamDecl>,
    /// Return type as written
    pub ret: TypeExpr,
    /// Position of the method name
    pub span: Span,
}

/// A method parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamDecl {
    /// Parameter name
    pub name: String,
    /// `name?: T`
    pub optional: bool,
    /// Parameter type as written
    pub ty: TypeExpr,
}

/// A named object shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectDecl {
    /// Shape name
    pub name: String,
    /// Fields in source order
    pub fields: Vec<FieldDecl>,
    /// Position of the declaring keyword
    pub span: Span,
}

/// A field of an object shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDecl {
    /// Field name as it appears on the wire
    pub name: String,
    /// `name?: T`
    pub optional: bool,
    /// Field type as written
    pub ty: TypeExpr,
    /// Position of the field name
    pub span: Span,
}

/// A string enum.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumDecl {
    /// Enum name
    pub name: String,
    /// Variants in source order; never empty
    pub variants: Vec<VariantDecl>,
    /// Position of `enum`
    pub span: Span,
}

/// One enum member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantDecl {
    /// Member name
    pub name: String,
    /// String value; defaults to the variant name
    pub value: String,
    /// Position of the registry identifier
    pub span: Span,
}

/// How the registration looks the module up at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LookupKind {
    /// `get`: yields null when the module is not registered
    Get,
    /// `getEnforcing`: fails when the module is not registered
    GetEnforcing,
}

impl LookupKind {
    /// Registry method name as written in a spec.
    pub fn method_name(self) -> &'static str {
        match self {
            LookupKind::Get => "get",
            LookupKind::GetEnforcing => "getEnforcing",
        }
    }
}

/// `export default TurboModuleRegistry.getEnforcing<Spec>('Name')`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    /// Registry object, e.g. `TurboModuleRegistry`
    pub registry: String,
    /// `get` or `getEnforcing`
    pub lookup: LookupKind,
    /// Interface named in the type argument
    pub interface: String,
    /// Registry name; the module name used everywhere downstream
    pub name: String,
    /// Position of the registry identifier
    pub span: Span,
}

/// A type as written in the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeExpr {
    /// `void`
    Void,
    /// `boolean`
    Bool,
    /// `Int32`
    Int,
    /// `number`, `Double` or `Float`
    Double,
    /// `string`
    String,
    /// `T[]`, `Array<T>` or `ReadonlyArray<T>`
    Array(Box<TypeExpr>),
    /// A union of one member with `null` / `undefined`, or an optional marker
    Nullable(Box<TypeExpr>),
    /// `Promise<T>`
    Promise(Box<TypeExpr>),
    /// Inline object literal type
    Object(Vec<FieldDecl>),
    /// Reference to a declared object, enum or module interface
    Named {
        /// Referenced name
        name: String,
        /// Position of the reference
        span: Span,
    },
}

impl TypeExpr {
    /// True if a `Promise` appears anywhere inside, object literals included.
    pub fn contains_promise(&self) -> bool {
        match self {
            TypeExpr::Promise(_) => true,
            TypeExpr::Array(inner) | TypeExpr::Nullable(inner) => inner.contains_promise(),
            TypeExpr::Object(fields) => fields.iter().any(|f| f.ty.contains_promise()),
            _ => false,
        }
    }
}
