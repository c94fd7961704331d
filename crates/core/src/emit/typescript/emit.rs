//! TypeScript code emission via the Emit trait.
//!
//! Each syntax node implements `Emit`; a file is the concatenation of its
//! nodes' output.

use super::types::{
    ImportItem, TsExpr, TsImport, TsLiteral, TsMethod, TsModule, TsParam, TsPrimitive, TsProp,
    TsStmt, TsType, TsTypeDef, TypeDefKind,
};
use super::utils::{escape_js_string, quote_if_needed};

/// Trait for emitting TypeScript code from syntax nodes.
pub trait Emit {
    /// Convert the node to its TypeScript string representation.
    fn emit(&self) -> String;
}

fn join<T: Emit>(items: &[T], sep: &str) -> String {
    items.iter().map(Emit::emit).collect::<Vec<_>>().join(sep)
}

// =============================================================================
// Types
// =============================================================================

impl Emit for TsPrimitive {
    fn emit(&self) -> String {
        match self {
            TsPrimitive::String => "string".to_string(),
            TsPrimitive::Number => "number".to_string(),
            TsPrimitive::Boolean => "boolean".to_string(),
            TsPrimitive::Null => "null".to_string(),
            TsPrimitive::Void => "void".to_string(),
        }
    }
}

impl Emit for TsLiteral {
    fn emit(&self) -> String {
        match self {
            TsLiteral::String(s) => format!("\"{}\"", escape_js_string(s)),
        }
    }
}

impl Emit for TsType {
    fn emit(&self) -> String {
        match self {
            TsType::Primitive(p) => p.emit(),
            TsType::Array(inner) => {
                let inner_str = inner.emit();
                // Wrap unions in parentheses
                if matches!(**inner, TsType::Union(_)) {
                    format!("({inner_str})[]")
                } else {
                    format!("{inner_str}[]")
                }
            }
            TsType::Union(types) => join(types, " | "),
            TsType::Generic { name, args } => format!("{name}<{}>", join(args, ", ")),
            TsType::Literal(lit) => lit.emit(),
            TsType::Ref(name) => name.clone(),
        }
    }
}

impl Emit for TsProp {
    fn emit(&self) -> String {
        let key = quote_if_needed(&self.name);
        let opt = if self.optional { "?" } else { "" };
        format!("{key}{opt}: {}", self.ty.emit())
    }
}

impl Emit for TsParam {
    fn emit(&self) -> String {
        format!("{}: {}", self.name, self.ty.emit())
    }
}

impl Emit for TsMethod {
    fn emit(&self) -> String {
        format!(
            "{}({}): {}",
            self.name,
            join(&self.params, ", "),
            self.return_type.emit()
        )
    }
}

// =============================================================================
// Type Definitions
// =============================================================================

impl Emit for TsTypeDef {
    fn emit(&self) -> String {
        let mut output = String::new();
        if let Some(doc) = &self.doc {
            output.push_str("/**\n");
            for line in doc.lines() {
                if line.is_empty() {
                    output.push_str(" *\n");
                } else {
                    output.push_str(&format!(" * {line}\n"));
                }
            }
            output.push_str(" */\n");
        }

        match &self.kind {
            TypeDefKind::Interface {
                extends,
                properties,
                methods,
            } => {
                match extends {
                    Some(base) => {
                        output.push_str(&format!("export interface {} extends {base} {{\n", self.name));
                    }
                    None => output.push_str(&format!("export interface {} {{\n", self.name)),
                }
                for prop in properties {
                    output.push_str(&format!("  {};\n", prop.emit()));
                }
                for method in methods {
                    output.push_str(&format!("  {};\n", method.emit()));
                }
                output.push_str("}\n");
            }
            TypeDefKind::TypeAlias { ty } => {
                output.push_str(&format!("export type {} = {};\n", self.name, ty.emit()));
            }
            TypeDefKind::ConstEnum { values } => {
                output.push_str(&format!("export const {} = {{\n", self.name));
                for (key, value) in values {
                    output.push_str(&format!("  {}: {},\n", quote_if_needed(key), value.emit()));
                }
                output.push_str("} as const;\n\n");
                output.push_str(&format!(
                    "export type {} = (typeof {})[keyof typeof {}];\n",
                    self.name, self.name, self.name
                ));
            }
        }
        output
    }
}

// =============================================================================
// Expressions and statements
// =============================================================================

impl Emit for TsExpr {
    fn emit(&self) -> String {
        match self {
            TsExpr::Ident(name) => name.clone(),
            TsExpr::Literal(lit) => lit.emit(),
            TsExpr::Member { object, prop } => format!("{}.{prop}", object.emit()),
            TsExpr::Call {
                callee,
                type_args,
                args,
            } => {
                let type_args_str = if type_args.is_empty() {
                    String::new()
                } else {
                    format!("<{}>", join(type_args, ", "))
                };
                format!("{}{type_args_str}({})", callee.emit(), join(args, ", "))
            }
        }
    }
}

impl Emit for ImportItem {
    fn emit(&self) -> String {
        let prefix = if self.type_only { "type " } else { "" };
        match &self.alias {
            Some(alias) => format!("{prefix}{} as {alias}", self.name),
            None => format!("{prefix}{}", self.name),
        }
    }
}

impl Emit for TsImport {
    fn emit(&self) -> String {
        format!(
            "import {{ {} }} from \"{}\";\n",
            join(&self.items, ", "),
            escape_js_string(&self.from)
        )
    }
}

impl Emit for TsStmt {
    fn emit(&self) -> String {
        match self {
            TsStmt::ExportDefault(expr) => format!("export default {};\n", expr.emit()),
            TsStmt::ExportFrom { items, from } => format!(
                "export {{ {} }} from \"{}\";\n",
                join(items, ", "),
                escape_js_string(from)
            ),
            TsStmt::ExportNamespace { alias, from } => {
                format!("export * as {alias} from \"{}\";\n", escape_js_string(from))
            }
        }
    }
}

// =============================================================================
// Module
// =============================================================================

impl Emit for TsModule {
    fn emit(&self) -> String {
        let mut sections = vec![self.header.clone()];

        if !self.imports.is_empty() {
            sections.push(self.imports.iter().map(Emit::emit).collect());
        }
        for type_def in &self.types {
            sections.push(type_def.emit());
        }
        if !self.statements.is_empty() {
            sections.push(self.statements.iter().map(Emit::emit).collect());
        }

        sections.join("\n")
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn string() -> TsType {
        TsType::Primitive(TsPrimitive::String)
    }

    #[test]
    fn test_emit_primitive() {
        assert_eq!(TsPrimitive::String.emit(), "string");
        assert_eq!(TsPrimitive::Number.emit(), "number");
        assert_eq!(TsPrimitive::Boolean.emit(), "boolean");
        assert_eq!(TsPrimitive::Null.emit(), "null");
        assert_eq!(TsPrimitive::Void.emit(), "void");
    }

    #[test]
    fn test_emit_literal() {
        assert_eq!(TsLiteral::String("hello".into()).emit(), "\"hello\"");
        assert_eq!(
            TsLiteral::String("say \"hi\"".into()).emit(),
            "\"say \\\"hi\\\"\""
        );
    }

    #[test]
    fn test_emit_union_array() {
        // (string | null)[] - union inside array needs parens
        let inner = TsType::Union(vec![string(), TsType::Primitive(TsPrimitive::Null)]);
        assert_eq!(TsType::Array(Box::new(inner)).emit(), "(string | null)[]");
    }

    #[test]
    fn test_emit_generic() {
        let ty = TsType::Generic {
            name: "Promise".into(),
            args: vec![TsType::Array(Box::new(TsType::Ref("Item".into())))],
        };
        assert_eq!(ty.emit(), "Promise<Item[]>");
    }

    #[test]
    fn test_emit_interface_with_methods() {
        let def = TsTypeDef {
            name: "Spec".into(),
            doc: None,
            kind: TypeDefKind::Interface {
                extends: Some("NativeModule".into()),
                properties: vec![],
                methods: vec![TsMethod {
                    name: "greet".into(),
                    params: vec![TsParam {
                        name: "name".into(),
                        ty: string(),
                    }],
                    return_type: string(),
                }],
            },
        };
        assert_eq!(
            def.emit(),
            "export interface Spec extends NativeModule {\n  greet(name: string): string;\n}\n"
        );
    }

    #[test]
    fn test_emit_interface_quotes_keys() {
        let def = TsTypeDef {
            name: "Item".into(),
            doc: Some("An item.".into()),
            kind: TypeDefKind::Interface {
                extends: None,
                properties: vec![TsProp {
                    name: "content-type".into(),
                    ty: string(),
                    optional: false,
                }],
                methods: vec![],
            },
        };
        assert_eq!(
            def.emit(),
            "/**\n * An item.\n */\nexport interface Item {\n  \"content-type\": string;\n}\n"
        );
    }

    #[test]
    fn test_emit_const_enum() {
        let def = TsTypeDef {
            name: "Mode".into(),
            doc: None,
            kind: TypeDefKind::ConstEnum {
                values: vec![
                    ("Fast".into(), TsLiteral::String("fast".into())),
                    ("Slow".into(), TsLiteral::String("slow".into())),
                ],
            },
        };
        assert_eq!(
            def.emit(),
            "export const Mode = {\n  Fast: \"fast\",\n  Slow: \"slow\",\n} as const;\n\n\
             export type Mode = (typeof Mode)[keyof typeof Mode];\n"
        );
    }

    #[test]
    fn test_emit_import_with_type_modifier() {
        let import = TsImport {
            items: vec![
                ImportItem {
                    name: "NativeModuleRegistry".into(),
                    alias: None,
                    type_only: false,
                },
                ImportItem {
                    name: "NativeModule".into(),
                    alias: None,
                    type_only: true,
                },
            ],
            from: "modgen-modules".into(),
        };
        assert_eq!(
            import.emit(),
            "import { NativeModuleRegistry, type NativeModule } from \"modgen-modules\";\n"
        );
    }

    #[test]
    fn test_emit_registration_call() {
        let stmt = TsStmt::ExportDefault(TsExpr::Call {
            callee: Box::new(TsExpr::Member {
                object: Box::new(TsExpr::Ident("NativeModuleRegistry".into())),
                prop: "getEnforcing".into(),
            }),
            type_args: vec![TsType::Ref("Spec".into())],
            args: vec![TsExpr::Literal(TsLiteral::String("Calculator".into()))],
        });
        assert_eq!(
            stmt.emit(),
            "export default NativeModuleRegistry.getEnforcing<Spec>(\"Calculator\");\n"
        );
    }
}
