//! Lowers resolved modules into [`ModuleIR`].

use modgen_common::naming::capitalize_first;
use std::collections::HashSet;

use super::{EnumIR, FieldIR, IrType, MethodIR, ModuleIR, ObjectIR, ParamIR, VariantIR};
use crate::error::CodegenError;
use crate::resolver::{ResolvedMethod, ResolvedModule};
use crate::types::TypeRef;

/// Suffix marking a method as asynchronous by naming convention.
pub const ASYNC_SUFFIX: &str = "Async";

struct Builder<'a> {
    module: &'a ResolvedModule,
    objects: Vec<ObjectIR>,
    enums: Vec<EnumIR>,
    enum_names: HashSet<String>,
    errors: Vec<CodegenError>,
}

/// Build the IR for one resolved module. Pure: identical input yields identical IR.
///
/// All signature problems in the module are reported together.
pub fn build_module(module: &ResolvedModule) -> Result<ModuleIR, Vec<CodegenError>> {
    let mut builder = Builder {
        module,
        objects: Vec::new(),
        enums: Vec::new(),
        enum_names: HashSet::new(),
        errors: Vec::new(),
    };

    let methods: Vec<MethodIR> = module
        .methods
        .iter()
        .map(|method| builder.method(method))
        .collect();

    if !builder.errors.is_empty() {
        return Err(builder.errors);
    }
    Ok(ModuleIR {
        name: module.name.clone(),
        interface: module.interface.clone(),
        lookup: module.lookup,
        source: module.source.clone(),
        methods,
        objects: builder.objects,
        enums: builder.enums,
    })
}

impl Builder<'_> {
    fn invalid(&mut self, method: &str, reason: String) {
        self.errors.push(CodegenError::InvalidSignature {
            module: self.module.name.clone(),
            method: method.to_string(),
            reason,
        });
    }

    fn method(&mut self, method: &ResolvedMethod) -> MethodIR {
        let method_pascal = capitalize_first(&method.name);

        let mut params = Vec::new();
        for param in &method.params {
            let hint = format!("{method_pascal}{}", capitalize_first(&param.name));
            let ty = self.lower(&param.ty, &hint, &method.name);
            if ty == IrType::Void {
                self.invalid(&method.name, format!("parameter `{}` is void", param.name));
            } else if ty.contains_void() {
                self.invalid(
                    &method.name,
                    format!("parameter `{}` has void in {ty}", param.name),
                );
            } else if ty.contains_promise() {
                self.invalid(
                    &method.name,
                    format!("parameter `{}` contains a Promise", param.name),
                );
            }
            params.push(ParamIR {
                name: param.name.clone(),
                ty,
            });
        }

        let ret = self.lower(&method.ret, &format!("{method_pascal}Result"), &method.name);
        let promise_misplaced = match &ret {
            IrType::Promise(inner) => inner.contains_promise(),
            other => other.contains_promise(),
        };
        if promise_misplaced {
            self.invalid(
                &method.name,
                format!("Promise must be the outermost return type, found {ret}"),
            );
        }
        let void_misplaced = match &ret {
            IrType::Void => false,
            IrType::Promise(inner) => **inner != IrType::Void && inner.contains_void(),
            other => other.contains_void(),
        };
        if void_misplaced {
            self.invalid(
                &method.name,
                format!("void is only valid as `void` or `Promise<void>`, found {ret}"),
            );
        }

        let is_async = matches!(ret, IrType::Promise(_));
        if method.name.ends_with(ASYNC_SUFFIX) && !is_async {
            self.invalid(
                &method.name,
                format!("name marks the method asynchronous but it returns {ret}"),
            );
        }

        MethodIR {
            name: method.name.clone(),
            params,
            ret,
            is_async,
        }
    }

    /// Lower a resolved type, naming inline shapes after `hint`.
    fn lower(&mut self, ty: &TypeRef, hint: &str, method: &str) -> IrType {
        match ty {
            TypeRef::Void => IrType::Void,
            TypeRef::Bool => IrType::Bool,
            TypeRef::Int => IrType::Int,
            TypeRef::Double => IrType::Double,
            TypeRef::String => IrType::String,
            TypeRef::Array(inner) => IrType::Array(Box::new(self.lower(inner, hint, method))),
            TypeRef::Nullable(inner) => match self.lower(inner, hint, method) {
                IrType::Void => IrType::Void,
                lowered => IrType::Nullable(Box::new(lowered)),
            },
            TypeRef::Promise(inner) => IrType::Promise(Box::new(self.lower(inner, hint, method))),
            TypeRef::ModuleRef(name) => IrType::Module(name.clone()),
            TypeRef::EnumRef(def) => {
                if self.objects.iter().any(|o| o.name == def.name) {
                    self.invalid(
                        method,
                        format!("enum type `{}` has the same name as an object", def.name),
                    );
                } else if self.enum_names.insert(def.name.clone()) {
                    self.enums.push(EnumIR {
                        name: def.name.clone(),
                        variants: def
                            .variants
                            .iter()
                            .map(|v| VariantIR {
                                name: v.name.clone(),
                                value: v.value.clone(),
                            })
                            .collect(),
                    });
                }
                IrType::Enum(def.name.clone())
            }
            TypeRef::Object(shape) => {
                let name = shape.name.clone().unwrap_or_else(|| hint.to_string());
                let mut fields = Vec::with_capacity(shape.fields.len());
                for field in &shape.fields {
                    let field_hint = format!("{name}{}", capitalize_first(&field.name));
                    let ty = self.lower(&field.ty, &field_hint, method);
                    if ty.contains_void() {
                        self.invalid(
                            method,
                            format!("field `{name}.{}` has void in {ty}", field.name),
                        );
                    }
                    fields.push(FieldIR {
                        name: field.name.clone(),
                        ty,
                    });
                }
                self.register_object(ObjectIR { name: name.clone(), fields }, method);
                IrType::Object(name)
            }
        }
    }

    fn register_object(&mut self, object: ObjectIR, method: &str) {
        if self.enum_names.contains(&object.name) {
            self.invalid(
                method,
                format!("object type `{}` has the same name as an enum", object.name),
            );
            return;
        }
        match self.objects.iter().find(|o| o.name == object.name) {
            Some(existing) if *existing == object => {}
            Some(_) => {
                self.invalid(
                    method,
                    format!("two different object types are named `{}`", object.name),
                );
            }
            None => self.objects.push(object),
        }
    }
}
