//! Rust binding emitter.
//!
//! Per module, `<snake_name>.rs` holds the value types, a `<Module>Spec` trait
//! that native code implements, and a `<Module>Module<T>` adapter that plugs
//! any implementation into `modgen_runtime::ModuleRegistry`. Arguments and
//! results cross the boundary as `modgen_runtime::Value`, converted through
//! `FromValue` / `IntoValue`.

use modgen_common::Platform;
use modgen_common::naming::{to_pascal_case, to_snake_case};
use std::collections::HashSet;

use super::{Emitter, FileHeader, GeneratedFile, index_identity};
use crate::error::CodegenError;
use crate::ir::{EnumIR, IrType, MethodIR, ModuleIR, ObjectIR};

const RUST_KEYWORDS: &[&str] = &[
    "as", "async", "await", "break", "const", "continue", "dyn", "else", "enum", "extern", "false",
    "fn", "for", "if", "impl", "in", "let", "loop", "match", "mod", "move", "mut", "pub", "ref",
    "return", "static", "struct", "trait", "true", "type", "unsafe", "use", "where", "while",
    "abstract", "become", "box", "do", "final", "gen", "macro", "override", "priv", "try",
    "typeof", "unsized", "virtual", "yield",
];

/// Keywords that cannot be written as raw identifiers.
const NON_RAW_KEYWORDS: &[&str] = &["self", "Self", "super", "crate", "_"];

/// Names a generated file already uses at module scope.
const RESERVED_TYPE_NAMES: &[&str] = &[
    "Args",
    "FromValue",
    "IntoValue",
    "InvokeError",
    "NativeModule",
    "ObjectFields",
    "Promise",
    "Value",
    "FromStr",
    "MODULE_NAME",
    "Option",
    "Result",
    "String",
    "Vec",
];

/// Rust binding emitter.
#[derive(Debug, Clone, Copy, Default)]
pub struct RustEmitter;

/// Identifier safe to use in Rust source.
pub fn rust_ident(name: &str) -> String {
    if NON_RAW_KEYWORDS.contains(&name) {
        format!("{name}_")
    } else if RUST_KEYWORDS.contains(&name) {
        format!("r#{name}")
    } else {
        name.to_string()
    }
}

/// File stem of a module's binding, e.g. `craby_test`.
pub fn module_file_stem(module_name: &str) -> String {
    to_snake_case(module_name)
}

fn rust_type(ty: &IrType) -> String {
    match ty {
        IrType::Void => "()".to_string(),
        IrType::Bool => "bool".to_string(),
        IrType::Int => "i32".to_string(),
        IrType::Double => "f64".to_string(),
        IrType::String | IrType::Module(_) => "String".to_string(),
        IrType::Array(inner) => format!("Vec<{}>", rust_type(inner)),
        IrType::Object(name) | IrType::Enum(name) => rust_ident(name),
        IrType::Nullable(inner) => format!("Option<{}>", rust_type(inner)),
        IrType::Promise(inner) => format!("Promise<{}>", rust_type(inner)),
    }
}

fn quoted(s: &str) -> String {
    format!("{s:?}")
}

impl RustEmitter {
    /// Maps each name through `convert`, failing when two names collide.
    fn unique_names<'a>(
        &self,
        names: impl IntoIterator<Item = &'a str>,
        convert: impl Fn(&str) -> String,
        what: &str,
    ) -> Result<Vec<String>, CodegenError> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for name in names {
            let converted = convert(name);
            if !seen.insert(converted.clone()) {
                return Err(self.unsupported(format!(
                    "{what} `{name}` (collides as `{converted}`)"
                )));
            }
            out.push(converted);
        }
        Ok(out)
    }

    fn check_type_name(&self, name: &str, module: &ModuleIR) -> Result<(), CodegenError> {
        let pascal = to_pascal_case(&module.name);
        if RESERVED_TYPE_NAMES.contains(&name)
            || name == format!("{pascal}Spec")
            || name == format!("{pascal}Module")
        {
            return Err(self.unsupported(format!("type name `{name}`")));
        }
        Ok(())
    }

    fn emit_enum(&self, enumeration: &EnumIR) -> Result<String, CodegenError> {
        if enumeration.variants.is_empty() {
            return Err(self.unsupported(format!("empty enum {}", enumeration.name)));
        }
        let ty = rust_ident(&enumeration.name);
        let variants = self.unique_names(
            enumeration.variants.iter().map(|v| v.name.as_str()),
            |name| rust_ident(&to_pascal_case(name)),
            &format!("variant of {}", enumeration.name),
        )?;

        let mut out = String::new();
        out.push_str("#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]\n");
        out.push_str(&format!("pub enum {ty} {{\n"));
        for variant in &variants {
            out.push_str(&format!("    {variant},\n"));
        }
        out.push_str("}\n\n");

        out.push_str(&format!("impl {ty} {{\n"));
        let all = variants
            .iter()
            .map(|v| format!("{ty}::{v}"))
            .collect::<Vec<_>>()
            .join(", ");
        out.push_str(&format!("    pub const ALL: &'static [{ty}] = &[{all}];\n\n"));
        out.push_str("    pub fn as_str(&self) -> &'static str {\n");
        out.push_str("        match self {\n");
        for (variant, decl) in variants.iter().zip(&enumeration.variants) {
            out.push_str(&format!(
                "            {ty}::{variant} => {},\n",
                quoted(&decl.value)
            ));
        }
        out.push_str("        }\n    }\n}\n\n");

        out.push_str(&format!("impl FromStr for {ty} {{\n"));
        out.push_str("    type Err = InvokeError;\n\n");
        out.push_str("    fn from_str(value: &str) -> Result<Self, Self::Err> {\n");
        out.push_str("        match value {\n");
        for (variant, decl) in variants.iter().zip(&enumeration.variants) {
            out.push_str(&format!(
                "            {} => Ok({ty}::{variant}),\n",
                quoted(&decl.value)
            ));
        }
        out.push_str("            other => Err(InvokeError::UnknownVariant {\n");
        out.push_str(&format!(
            "                enum_name: {},\n",
            quoted(&enumeration.name)
        ));
        out.push_str("                value: other.to_string(),\n");
        out.push_str("            }),\n        }\n    }\n}\n\n");

        out.push_str(&format!("impl FromValue for {ty} {{\n"));
        out.push_str("    fn from_value(value: Value) -> Result<Self, InvokeError> {\n");
        out.push_str("        String::from_value(value)?.parse()\n");
        out.push_str("    }\n}\n\n");

        out.push_str(&format!("impl IntoValue for {ty} {{\n"));
        out.push_str("    fn into_value(self) -> Value {\n");
        out.push_str("        Value::String(self.as_str().to_string())\n");
        out.push_str("    }\n}\n");
        Ok(out)
    }

    fn emit_struct(&self, object: &ObjectIR) -> Result<String, CodegenError> {
        let ty = rust_ident(&object.name);
        let fields = self.unique_names(
            object.fields.iter().map(|f| f.name.as_str()),
            |name| rust_ident(&to_snake_case(name)),
            &format!("field of {}", object.name),
        )?;

        let mut out = String::new();
        out.push_str("#[derive(Debug, Clone, PartialEq)]\n");
        out.push_str(&format!("pub struct {ty} {{\n"));
        for (field, decl) in fields.iter().zip(&object.fields) {
            out.push_str(&format!("    pub {field}: {},\n", rust_type(&decl.ty)));
        }
        out.push_str("}\n\n");

        out.push_str(&format!("impl FromValue for {ty} {{\n"));
        out.push_str("    fn from_value(value: Value) -> Result<Self, InvokeError> {\n");
        if fields.is_empty() {
            out.push_str("        ObjectFields::new(value)?;\n");
            out.push_str("        Ok(Self {})\n");
        } else {
            out.push_str("        let mut fields = ObjectFields::new(value)?;\n");
            out.push_str("        Ok(Self {\n");
            for (field, decl) in fields.iter().zip(&object.fields) {
                out.push_str(&format!(
                    "            {field}: fields.take({})?,\n",
                    quoted(&decl.name)
                ));
            }
            out.push_str("        })\n");
        }
        out.push_str("    }\n}\n\n");

        out.push_str(&format!("impl IntoValue for {ty} {{\n"));
        out.push_str("    fn into_value(self) -> Value {\n");
        out.push_str("        Value::Object(vec![\n");
        for (field, decl) in fields.iter().zip(&object.fields) {
            out.push_str(&format!(
                "            ({}.to_string(), self.{field}.into_value()),\n",
                quoted(&decl.name)
            ));
        }
        out.push_str("        ])\n    }\n}\n");
        Ok(out)
    }

    fn method_params(&self, method: &MethodIR) -> Result<Vec<String>, CodegenError> {
        self.unique_names(
            method.params.iter().map(|p| p.name.as_str()),
            |name| rust_ident(&to_snake_case(name)),
            &format!("parameter of {}", method.name),
        )
    }

    fn emit_trait(
        &self,
        module: &ModuleIR,
        trait_name: &str,
        method_names: &[String],
    ) -> Result<String, CodegenError> {
        let mut out = String::new();
        out.push_str(&format!(
            "/// Native implementation of the `{}` module.\n///\n\
             /// `i32` arguments have already been range-checked; asynchronous methods\n\
             /// settle the `Promise` handle exactly once.\n",
            module.name
        ));
        out.push_str(&format!("pub trait {trait_name}: Send + Sync {{\n"));
        for (method, fn_name) in module.methods.iter().zip(method_names) {
            let params = self.method_params(method)?;
            let mut args = vec!["&self".to_string()];
            for (param, decl) in params.iter().zip(&method.params) {
                args.push(format!("{param}: {}", rust_type(&decl.ty)));
            }
            if method.is_async {
                let handle = if params.iter().any(|p| p == "promise") {
                    "promise_handle"
                } else {
                    "promise"
                };
                args.push(format!("{handle}: {}", rust_type(&method.ret)));
                out.push_str(&format!("    fn {fn_name}({});\n", args.join(", ")));
            } else if method.ret == IrType::Void {
                out.push_str(&format!("    fn {fn_name}({});\n", args.join(", ")));
            } else {
                out.push_str(&format!(
                    "    fn {fn_name}({}) -> {};\n",
                    args.join(", "),
                    rust_type(&method.ret)
                ));
            }
        }
        out.push_str("}\n");
        Ok(out)
    }

    fn emit_adapter(&self, module: &ModuleIR, trait_name: &str, method_names: &[String]) -> String {
        let adapter = format!("{}Module", to_pascal_case(&module.name));
        let unknown = "Err(InvokeError::UnknownMethod {\n                \
                       module: MODULE_NAME.to_string(),\n                \
                       method: method.to_string(),\n            })";

        let mut out = String::new();
        out.push_str(&format!(
            "/// Registers a [`{trait_name}`] implementation as the `{}` module.\n",
            module.name
        ));
        out.push_str("#[derive(Debug)]\n");
        out.push_str(&format!("pub struct {adapter}<T>(pub T);\n\n"));
        out.push_str(&format!(
            "impl<T: {trait_name}> NativeModule for {adapter}<T> {{\n"
        ));
        out.push_str("    fn name(&self) -> &'static str {\n        MODULE_NAME\n    }\n\n");

        let listed = module
            .methods
            .iter()
            .map(|m| quoted(&m.name))
            .collect::<Vec<_>>()
            .join(", ");
        out.push_str(&format!(
            "    fn methods(&self) -> &'static [&'static str] {{\n        &[{listed}]\n    }}\n\n"
        ));

        out.push_str(
            "    fn call(&self, method: &str, args: Vec<Value>) -> Result<Value, InvokeError> {\n",
        );
        out.push_str("        match method {\n");
        for (method, fn_name) in module.methods.iter().zip(method_names) {
            if method.is_async {
                continue;
            }
            let arity = method.params.len();
            out.push_str(&format!("            {} => {{\n", quoted(&method.name)));
            if arity == 0 {
                out.push_str("                Args::new(method, args, 0)?;\n");
            } else {
                out.push_str(&format!(
                    "                let mut args = Args::new(method, args, {arity})?;\n"
                ));
                for index in 0..arity {
                    out.push_str(&format!("                let arg{index} = args.arg()?;\n"));
                }
            }
            let call_args = (0..arity)
                .map(|i| format!("arg{i}"))
                .collect::<Vec<_>>()
                .join(", ");
            if method.ret == IrType::Void {
                out.push_str(&format!("                self.0.{fn_name}({call_args});\n"));
                out.push_str("                Ok(Value::Null)\n");
            } else {
                out.push_str(&format!(
                    "                Ok(self.0.{fn_name}({call_args}).into_value())\n"
                ));
            }
            out.push_str("            }\n");
        }
        out.push_str(&format!("            _ => {unknown},\n"));
        out.push_str("        }\n    }\n\n");

        out.push_str(
            "    fn call_async(&self, method: &str, args: Vec<Value>, promise: Promise<Value>) {\n",
        );
        out.push_str("        match method {\n");
        for (method, fn_name) in module.methods.iter().zip(method_names) {
            if !method.is_async {
                continue;
            }
            let arity = method.params.len();
            out.push_str(&format!("            {} => {{\n", quoted(&method.name)));
            let bindings = (0..arity)
                .map(|i| format!("arg{i},"))
                .collect::<Vec<_>>()
                .join(" ");
            if arity == 0 {
                out.push_str(
                    "                let parsed = Args::new(method, args, 0).map(|_| ());\n",
                );
            } else {
                out.push_str(&format!(
                    "                let parsed = Args::new(method, args, {arity}).and_then(|mut args| {{\n"
                ));
                for (index, param) in method.params.iter().enumerate() {
                    out.push_str(&format!(
                        "                    let arg{index}: {} = args.arg()?;\n",
                        rust_type(&param.ty)
                    ));
                }
                out.push_str(&format!("                    Ok(({bindings}))\n"));
                out.push_str("                });\n");
            }
            let converter = match method.resolved_type() {
                IrType::Void => "|()| Value::Null".to_string(),
                other => format!("|value: {}| value.into_value()", rust_type(other)),
            };
            let mut call_args: Vec<String> = (0..arity).map(|i| format!("arg{i}")).collect();
            call_args.push(format!("promise.map({converter})"));
            out.push_str("                match parsed {\n");
            out.push_str(&format!(
                "                    Ok(({bindings})) => self.0.{fn_name}({}),\n",
                call_args.join(", ")
            ));
            out.push_str("                    Err(err) => promise.reject(err.to_string()),\n");
            out.push_str("                }\n");
            out.push_str("            }\n");
        }
        out.push_str("            _ => {\n");
        out.push_str("                let err = InvokeError::UnknownMethod {\n");
        out.push_str("                    module: MODULE_NAME.to_string(),\n");
        out.push_str("                    method: method.to_string(),\n");
        out.push_str("                };\n");
        out.push_str("                promise.reject(err.to_string());\n");
        out.push_str("            }\n");
        out.push_str("        }\n    }\n}\n");
        out
    }
}

impl Emitter for RustEmitter {
    fn platform(&self) -> Platform {
        Platform::Rust
    }

    fn version(&self) -> &'static str {
        "1.0.0"
    }

    fn emit_module(&self, module: &ModuleIR) -> Result<Vec<GeneratedFile>, CodegenError> {
        let hash = module.structural_hash();
        let pascal = to_pascal_case(&module.name);
        let trait_name = format!("{pascal}Spec");

        let type_names = module
            .enums
            .iter()
            .map(|e| e.name.as_str())
            .chain(module.objects.iter().map(|o| o.name.as_str()));
        self.unique_names(type_names, rust_ident, "type")?;
        for name in module
            .enums
            .iter()
            .map(|e| &e.name)
            .chain(module.objects.iter().map(|o| &o.name))
        {
            self.check_type_name(name, module)?;
        }
        let method_names = self.unique_names(
            module.methods.iter().map(|m| m.name.as_str()),
            |name| rust_ident(&to_snake_case(name)),
            "method",
        )?;

        let mut sections = vec![FileHeader::for_module(self, module, &hash).render("//")];
        sections.push(
            "#![allow(\n    dead_code,\n    unused_imports,\n    non_camel_case_types,\n    missing_docs,\n    missing_copy_implementations,\n    clippy::all,\n    clippy::pedantic,\n    clippy::nursery\n)]\n\n\
             use std::str::FromStr;\n\n\
             use modgen_runtime::{\n    \
             Args, FromValue, IntoValue, InvokeError, NativeModule, ObjectFields, Promise, Value,\n\
             };\n"
                .to_string(),
        );
        sections.push(format!(
            "/// Registry name of this module.\npub const MODULE_NAME: &str = {};\n",
            quoted(&module.name)
        ));
        for enumeration in &module.enums {
            sections.push(self.emit_enum(enumeration)?);
        }
        for object in &module.objects {
            sections.push(self.emit_struct(object)?);
        }
        sections.push(self.emit_trait(module, &trait_name, &method_names)?);
        sections.push(self.emit_adapter(module, &trait_name, &method_names));

        Ok(vec![GeneratedFile::new(
            format!("{}.rs", module_file_stem(&module.name)),
            sections.join("\n"),
        )])
    }

    fn emit_index(&self, modules: &[&ModuleIR]) -> Result<Vec<GeneratedFile>, CodegenError> {
        let (source, hash) = index_identity(modules);
        let mut out = FileHeader {
            platform: self.platform(),
            version: self.version(),
            source: &source,
            hash: &hash,
        }
        .render("//");
        out.push('\n');
        for module in modules {
            out.push_str(&format!(
                "pub mod {};\n",
                rust_ident(&module_file_stem(&module.name))
            ));
        }
        let names = modules
            .iter()
            .map(|m| quoted(&m.name))
            .collect::<Vec<_>>()
            .join(", ");
        out.push_str(&format!(
            "\n/// Registry names of every generated module.\npub const MODULE_NAMES: &[&str] = &[{names}];\n"
        ));
        Ok(vec![GeneratedFile::new("mod.rs", out)])
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::ir::{EnumIR, FieldIR, ObjectIR, ParamIR, VariantIR};
    use crate::parser::ast::LookupKind;

    fn sample() -> ModuleIR {
        ModuleIR {
            name: "CrabyTest".into(),
            interface: "Spec".into(),
            lookup: LookupKind::GetEnforcing,
            source: "specs/NativeCrabyTest.ts".into(),
            methods: vec![
                MethodIR {
                    name: "numericMethod".into(),
                    params: vec![ParamIR {
                        name: "arg".into(),
                        ty: IrType::Double,
                    }],
                    ret: IrType::Double,
                    is_async: false,
                },
                MethodIR {
                    name: "enumMethod".into(),
                    params: vec![
                        ParamIR {
                            name: "arg0".into(),
                            ty: IrType::Enum("MyEnum".into()),
                        },
                        ParamIR {
                            name: "type".into(),
                            ty: IrType::Nullable(Box::new(IrType::Object("SubObject".into()))),
                        },
                    ],
                    ret: IrType::String,
                    is_async: false,
                },
                MethodIR {
                    name: "reset".into(),
                    params: vec![],
                    ret: IrType::Void,
                    is_async: false,
                },
                MethodIR {
                    name: "promiseMethod".into(),
                    params: vec![ParamIR {
                        name: "count".into(),
                        ty: IrType::Int,
                    }],
                    ret: IrType::Promise(Box::new(IrType::Array(Box::new(IrType::Double)))),
                    is_async: true,
                },
            ],
            objects: vec![ObjectIR {
                name: "SubObject".into(),
                fields: vec![
                    FieldIR {
                        name: "maybeName".into(),
                        ty: IrType::Nullable(Box::new(IrType::String)),
                    },
                    FieldIR {
                        name: "count".into(),
                        ty: IrType::Int,
                    },
                ],
            }],
            enums: vec![EnumIR {
                name: "MyEnum".into(),
                variants: vec![
                    VariantIR {
                        name: "FOO".into(),
                        value: "FOO".into(),
                    },
                    VariantIR {
                        name: "BAR_BAZ".into(),
                        value: "bar-baz".into(),
                    },
                ],
            }],
        }
    }

    fn body() -> String {
        RustEmitter.emit_module(&sample()).unwrap().remove(0).contents
    }

    #[test]
    fn test_file_name_and_header() {
        let files = RustEmitter.emit_module(&sample()).unwrap();
        assert_eq!(files[0].path.to_str(), Some("craby_test.rs"));
        assert!(
            files[0]
                .contents
                .starts_with("// @generated by modgen (rust emitter 1.0.0)")
        );
        assert!(files[0].contents.contains("pub const MODULE_NAME: &str = \"CrabyTest\";"));
    }

    #[test]
    fn test_enum_conversions() {
        let body = body();
        assert!(body.contains("pub enum MyEnum {\n    Foo,\n    BarBaz,\n}"));
        assert!(body.contains("MyEnum::BarBaz => \"bar-baz\","));
        assert!(body.contains("\"bar-baz\" => Ok(MyEnum::BarBaz),"));
        assert!(body.contains("enum_name: \"MyEnum\","));
        assert!(body.contains("pub const ALL: &'static [MyEnum] = &[MyEnum::Foo, MyEnum::BarBaz];"));
    }

    #[test]
    fn test_struct_fields_are_snake_case_with_wire_names() {
        let body = body();
        assert!(body.contains("pub struct SubObject {\n    pub maybe_name: Option<String>,\n    pub count: i32,\n}"));
        assert!(body.contains("maybe_name: fields.take(\"maybeName\")?,"));
        assert!(body.contains("(\"maybeName\".to_string(), self.maybe_name.into_value()),"));
    }

    #[test]
    fn test_trait_signatures() {
        let body = body();
        assert!(body.contains("pub trait CrabyTestSpec: Send + Sync {"));
        assert!(body.contains("    fn numeric_method(&self, arg: f64) -> f64;"));
        assert!(body.contains(
            "    fn enum_method(&self, arg0: MyEnum, r#type: Option<SubObject>) -> String;"
        ));
        assert!(body.contains("    fn reset(&self);"));
        assert!(body.contains("    fn promise_method(&self, count: i32, promise: Promise<Vec<f64>>);"));
    }

    #[test]
    fn test_adapter_dispatch() {
        let body = body();
        assert!(body.contains("impl<T: CrabyTestSpec> NativeModule for CrabyTestModule<T> {"));
        assert!(body.contains("&[\"numericMethod\", \"enumMethod\", \"reset\", \"promiseMethod\"]"));
        assert!(body.contains("let mut args = Args::new(method, args, 2)?;"));
        assert!(body.contains("Args::new(method, args, 0)?;\n                self.0.reset();\n                Ok(Value::Null)"));
        assert!(body.contains("let arg0: i32 = args.arg()?;"));
        assert!(body.contains(
            "Ok((arg0,)) => self.0.promise_method(arg0, promise.map(|value: Vec<f64>| value.into_value())),"
        ));
    }

    #[test]
    fn test_snake_collision_is_unsupported() {
        let mut module = sample();
        module.methods[2].name = "numeric_method".into();
        let err = RustEmitter.emit_module(&module).unwrap_err();
        assert!(matches!(
            err,
            CodegenError::UnsupportedOnPlatform {
                platform: Platform::Rust,
                ..
            }
        ));
    }

    #[test]
    fn test_empty_enum_is_unsupported() {
        let mut module = sample();
        module.enums[0].variants.clear();
        let err = RustEmitter.emit_module(&module).unwrap_err();
        assert_eq!(
            err,
            CodegenError::UnsupportedOnPlatform {
                ty: "empty enum MyEnum".into(),
                platform: Platform::Rust,
            }
        );
    }

    #[test]
    fn test_module_ref_is_registry_key() {
        let mut module = sample();
        module.methods[0].ret = IrType::Module("Logger".into());
        assert!(
            RustEmitter.emit_module(&module).unwrap()[0]
                .contents
                .contains("fn numeric_method(&self, arg: f64) -> String;")
        );
    }

    #[test]
    fn test_index_lists_modules() {
        let module = sample();
        let files = RustEmitter.emit_index(&[&module]).unwrap();
        assert_eq!(files[0].path.to_str(), Some("mod.rs"));
        assert!(files[0].contents.contains("pub mod craby_test;\n"));
        assert!(files[0].contents.contains("pub const MODULE_NAMES: &[&str] = &[\"CrabyTest\"];"));
    }

    #[test]
    fn test_rust_ident() {
        assert_eq!(rust_ident("type"), "r#type");
        assert_eq!(rust_ident("self"), "self_");
        assert_eq!(rust_ident("value"), "value");
    }
}
