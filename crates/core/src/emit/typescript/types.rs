//! TypeScript syntax tree for the declaration files the emitter produces.
//!
//! - TsType: types (primitives, arrays, unions, generics, literals)
//! - TsTypeDef: exported interfaces, aliases and const enums
//! - TsExpr / TsStmt: the registration and re-export statements

/// TypeScript type representation
#[derive(Debug, Clone, PartialEq)]
pub enum TsType {
    /// Primitive types: string, number, boolean, null, void
    Primitive(TsPrimitive),
    /// Array type: T[]
    Array(Box<TsType>),
    /// Union type: A | B | C
    Union(Vec<TsType>),
    /// Generic application: Promise<T>
    Generic {
        /// Generic type name, e.g. `Promise`
        name: String,
        /// Type arguments
        args: Vec<TsType>,
    },
    /// Literal type: "foo"
    Literal(TsLiteral),
    /// Named type reference
    Ref(String),
}

/// TypeScript primitive types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TsPrimitive {
    /// `string`
    String,
    /// `number`
    Number,
    /// `boolean`
    Boolean,
    /// `null`
    Null,
    /// `void`
    Void,
}

/// Object property definition
#[derive(Debug, Clone, PartialEq)]
pub struct TsProp {
    /// Property name, quoted when not an identifier
    pub name: String,
    /// Property type
    pub ty: TsType,
    /// Rendered with `?`
    pub optional: bool,
}

/// Method signature inside an interface
#[derive(Debug, Clone, PartialEq)]
pub struct TsMethod {
    /// Method name
    pub name: String,
    /// Parameters in order
    pub params: Vec<TsParam>,
    /// Return type
    pub return_type: TsType,
}

/// Function parameter
#[derive(Debug, Clone, PartialEq)]
pub struct TsParam {
    /// Parameter name
    pub name: String,
    /// Parameter type
    pub ty: TsType,
}

/// TypeScript literal values
#[derive(Debug, Clone, PartialEq)]
pub enum TsLiteral {
    /// String literal, escaped on emit
    String(String),
}

/// TypeScript expression
#[derive(Debug, Clone, PartialEq)]
pub enum TsExpr {
    /// Identifier: foo
    Ident(String),
    /// Literal value: "bar"
    Literal(TsLiteral),
    /// Member access: foo.bar
    Member {
        /// Receiver expression
        object: Box<TsExpr>,
        /// Property name
        prop: String,
    },
    /// Function call with optional type arguments: foo<T>(a, b)
    Call {
        /// Called expression
        callee: Box<TsExpr>,
        /// Explicit type arguments, omitted when empty
        type_args: Vec<TsType>,
        /// Call arguments
        args: Vec<TsExpr>,
    },
}

/// Import statement
#[derive(Debug, Clone, PartialEq)]
pub struct TsImport {
    /// Items to import
    pub items: Vec<ImportItem>,
    /// Module path
    pub from: String,
}

/// Import or re-export item
#[derive(Debug, Clone, PartialEq)]
pub struct ImportItem {
    /// Exported name
    pub name: String,
    /// Local alias
    pub alias: Option<String>,
    /// Emitted with an inline `type` modifier
    pub type_only: bool,
}

/// Type definition kind
#[derive(Debug, Clone, PartialEq)]
pub enum TypeDefKind {
    /// interface Foo extends Base { ... }
    Interface {
        /// Base interface
        extends: Option<String>,
        /// Properties in order
        properties: Vec<TsProp>,
        /// Method signatures in order
        methods: Vec<TsMethod>,
    },
    /// type Foo = ...
    TypeAlias {
        /// Aliased type
        ty: TsType,
    },
    /// const Foo = { ... } as const; type Foo = ...
    ConstEnum {
        /// Member names and their literal values
        values: Vec<(String, TsLiteral)>,
    },
}

/// Exported type definition
#[derive(Debug, Clone, PartialEq)]
pub struct TsTypeDef {
    /// Type name
    pub name: String,
    /// Rendered as a `/** ... */` block above the definition
    pub doc: Option<String>,
    /// Definition body
    pub kind: TypeDefKind,
}

/// Top-level statement
#[derive(Debug, Clone, PartialEq)]
pub enum TsStmt {
    /// export default expr;
    ExportDefault(TsExpr),
    /// export { a, b as c } from "path";
    ExportFrom {
        /// Re-exported items
        items: Vec<ImportItem>,
        /// Module path
        from: String,
    },
    /// export * as ns from "path";
    ExportNamespace {
        /// Namespace name
        alias: String,
        /// Module path
        from: String,
    },
}

/// Complete TypeScript file
#[derive(Debug, Clone, PartialEq)]
pub struct TsModule {
    /// Leading comment block, already rendered
    pub header: String,
    /// Import statements
    pub imports: Vec<TsImport>,
    /// Type definitions in order
    pub types: Vec<TsTypeDef>,
    /// Trailing statements
    pub statements: Vec<TsStmt>,
}
