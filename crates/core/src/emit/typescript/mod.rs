//! TypeScript declaration emitter.
//!
//! One `Native<Module>.ts` per module: enums as `as const` objects with a
//! matching literal union, object shapes as interfaces, the module interface
//! extending `NativeModule`, and a default export that looks the module up
//! through `NativeModuleRegistry` with the lookup the spec registered: `get`
//! (typed `Spec | null`) or `getEnforcing`.

pub mod emit;
pub mod types;
pub mod utils;

use modgen_common::Platform;
use modgen_common::naming::to_pascal_case;

use self::emit::Emit;
use self::types::{
    ImportItem, TsExpr, TsImport, TsLiteral, TsMethod, TsModule, TsParam, TsPrimitive, TsProp,
    TsStmt, TsType, TsTypeDef, TypeDefKind,
};
use self::utils::{TS_RESERVED_WORDS, sanitize_ts_identifier};
use super::{Emitter, FileHeader, GeneratedFile, index_identity};
use crate::error::CodegenError;
use crate::ir::{IrType, ModuleIR};

/// npm package providing `NativeModuleRegistry` and `NativeModule`.
pub const RUNTIME_PACKAGE: &str = "modgen-modules";

const REGISTRY_IDENT: &str = "NativeModuleRegistry";
const MODULE_BASE_IDENT: &str = "NativeModule";
const INT_ALIAS: &str = "Int32";

/// Names the emitted file declares on its own and no user type may take.
const RESERVED_TYPE_NAMES: &[&str] = &[REGISTRY_IDENT, MODULE_BASE_IDENT, INT_ALIAS, "Promise"];

/// TypeScript module emitter.
#[derive(Debug, Clone, Copy, Default)]
pub struct TypescriptEmitter;

/// File stem of a module's declaration file, e.g. `NativeCalculator`.
pub fn module_file_stem(module_name: &str) -> String {
    format!("Native{}", to_pascal_case(module_name))
}

fn ts_type(ty: &IrType) -> TsType {
    match ty {
        IrType::Void => TsType::Primitive(TsPrimitive::Void),
        IrType::Bool => TsType::Primitive(TsPrimitive::Boolean),
        IrType::Int => TsType::Ref(INT_ALIAS.to_string()),
        IrType::Double => TsType::Primitive(TsPrimitive::Number),
        IrType::String => TsType::Primitive(TsPrimitive::String),
        IrType::Array(inner) => TsType::Array(Box::new(ts_type(inner))),
        IrType::Object(name) | IrType::Enum(name) => TsType::Ref(name.clone()),
        // Modules are passed across the boundary by registry name
        IrType::Module(name) => TsType::Literal(TsLiteral::String(name.clone())),
        IrType::Nullable(inner) => {
            TsType::Union(vec![ts_type(inner), TsType::Primitive(TsPrimitive::Null)])
        }
        IrType::Promise(inner) => TsType::Generic {
            name: "Promise".to_string(),
            args: vec![ts_type(inner)],
        },
    }
}

fn uses_int(ty: &IrType) -> bool {
    match ty {
        IrType::Int => true,
        IrType::Array(inner) | IrType::Nullable(inner) | IrType::Promise(inner) => uses_int(inner),
        _ => false,
    }
}

impl TypescriptEmitter {
    fn check_type_name(&self, name: &str) -> Result<(), CodegenError> {
        if RESERVED_TYPE_NAMES.contains(&name) || TS_RESERVED_WORDS.contains(name) {
            return Err(self.unsupported(format!("type name `{name}`")));
        }
        Ok(())
    }

    fn build_module(&self, module: &ModuleIR) -> Result<TsModule, CodegenError> {
        let hash = module.structural_hash();
        let header = FileHeader::for_module(self, module, &hash).render("//");

        let mut types = Vec::new();

        let needs_int = module
            .methods
            .iter()
            .flat_map(|m| m.params.iter().map(|p| &p.ty).chain(std::iter::once(&m.ret)))
            .chain(module.objects.iter().flat_map(|o| o.fields.iter().map(|f| &f.ty)))
            .any(uses_int);
        if needs_int {
            types.push(TsTypeDef {
                name: INT_ALIAS.to_string(),
                doc: Some(
                    "A 32-bit signed integer. Native code rejects values that are\n\
                     not integral or fall outside the 32-bit range."
                        .to_string(),
                ),
                kind: TypeDefKind::TypeAlias {
                    ty: TsType::Primitive(TsPrimitive::Number),
                },
            });
        }

        for enumeration in &module.enums {
            self.check_type_name(&enumeration.name)?;
            types.push(TsTypeDef {
                name: enumeration.name.clone(),
                doc: None,
                kind: TypeDefKind::ConstEnum {
                    values: enumeration
                        .variants
                        .iter()
                        .map(|v| (v.name.clone(), TsLiteral::String(v.value.clone())))
                        .collect(),
                },
            });
        }

        for object in &module.objects {
            self.check_type_name(&object.name)?;
            types.push(TsTypeDef {
                name: object.name.clone(),
                doc: None,
                kind: TypeDefKind::Interface {
                    extends: None,
                    properties: object
                        .fields
                        .iter()
                        .map(|f| TsProp {
                            name: f.name.clone(),
                            ty: ts_type(&f.ty),
                            optional: false,
                        })
                        .collect(),
                    methods: vec![],
                },
            });
        }

        self.check_type_name(&module.interface)?;
        types.push(TsTypeDef {
            name: module.interface.clone(),
            doc: None,
            kind: TypeDefKind::Interface {
                extends: Some(MODULE_BASE_IDENT.to_string()),
                properties: vec![],
                methods: module
                    .methods
                    .iter()
                    .map(|m| TsMethod {
                        name: m.name.clone(),
                        params: m
                            .params
                            .iter()
                            .map(|p| TsParam {
                                name: sanitize_ts_identifier(&p.name),
                                ty: ts_type(&p.ty),
                            })
                            .collect(),
                        return_type: ts_type(&m.ret),
                    })
                    .collect(),
            },
        });

        let registration = TsExpr::Call {
            callee: Box::new(TsExpr::Member {
                object: Box::new(TsExpr::Ident(REGISTRY_IDENT.to_string())),
                prop: module.lookup.method_name().to_string(),
            }),
            type_args: vec![TsType::Ref(module.interface.clone())],
            args: vec![TsExpr::Literal(TsLiteral::String(module.name.clone()))],
        };

        Ok(TsModule {
            header,
            imports: vec![TsImport {
                items: vec![
                    ImportItem {
                        name: REGISTRY_IDENT.to_string(),
                        alias: None,
                        type_only: false,
                    },
                    ImportItem {
                        name: MODULE_BASE_IDENT.to_string(),
                        alias: None,
                        type_only: true,
                    },
                ],
                from: RUNTIME_PACKAGE.to_string(),
            }],
            types,
            statements: vec![TsStmt::ExportDefault(registration)],
        })
    }
}

impl Emitter for TypescriptEmitter {
    fn platform(&self) -> Platform {
        Platform::Typescript
    }

    fn version(&self) -> &'static str {
        "1.0.0"
    }

    fn emit_module(&self, module: &ModuleIR) -> Result<Vec<GeneratedFile>, CodegenError> {
        let ts_module = self.build_module(module)?;
        Ok(vec![GeneratedFile::new(
            format!("{}.ts", module_file_stem(&module.name)),
            ts_module.emit(),
        )])
    }

    fn emit_index(&self, modules: &[&ModuleIR]) -> Result<Vec<GeneratedFile>, CodegenError> {
        let (source, hash) = index_identity(modules);
        let header = FileHeader {
            platform: self.platform(),
            version: self.version(),
            source: &source,
            hash: &hash,
        }
        .render("//");

        let mut statements = Vec::new();
        for module in modules {
            let pascal = to_pascal_case(&module.name);
            let from = format!("./{}", module_file_stem(&module.name));
            statements.push(TsStmt::ExportFrom {
                items: vec![ImportItem {
                    name: "default".to_string(),
                    alias: Some(pascal.clone()),
                    type_only: false,
                }],
                from: from.clone(),
            });
            statements.push(TsStmt::ExportNamespace {
                alias: format!("{pascal}Types"),
                from,
            });
        }

        let index = TsModule {
            header,
            imports: vec![],
            types: vec![],
            statements,
        };
        Ok(vec![GeneratedFile::new("index.ts", index.emit())])
    }
}
