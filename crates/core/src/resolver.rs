//! Resolves the type references of a project's spec units into a closed graph.
//!
//! Names live in one project-wide namespace. A reference resolves only when
//! exactly one declaration carries the name; candidates are always reported in
//! `(unit id, declaration order)` order so the same input yields the same
//! error regardless of discovery order.
//!
//! Errors are attributed to the unit where they occur: a bad field type to the
//! unit declaring the object, a bad parameter type to the unit declaring the
//! module. A module that depends on a declaration which already failed is
//! dropped without a second report.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use tracing::debug;

use crate::error::CodegenError;
use crate::parser::ast::{
    Declaration, EnumDecl, FieldDecl, LookupKind, ObjectDecl, SpecUnit, TypeExpr,
};
use crate::types::{EnumDef, Field, ObjectShape, TypeRef, Variant};

/// A module whose every signature type resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedModule {
    /// Registry name
    pub name: String,
    /// Interface the registration names, e.g. `Spec`
    pub interface: String,
    /// How the registration looks the module up
    pub lookup: LookupKind,
    /// Identity of the declaring unit
    pub source: String,
    /// Methods in declaration order
    pub methods: Vec<ResolvedMethod>,
}

/// A method with resolved parameter and return types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedMethod {
    /// Method name
    pub name: String,
    /// Parameters in order
    pub params: Vec<Field>,
    /// Return type
    pub ret: TypeRef,
}

/// Result of resolving a project.
#[derive(Debug, Default)]
pub struct Resolution {
    /// Successfully resolved modules, ordered by source unit
    pub modules: Vec<ResolvedModule>,
    /// Errors keyed by the unit they are attributed to
    pub errors: Vec<(String, CodegenError)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
struct DeclId {
    unit: usize,
    index: usize,
}

enum Memo<T> {
    InProgress,
    Done(T),
    Failed,
}

struct Resolver<'a> {
    units: Vec<&'a SpecUnit>,
    index: BTreeMap<&'a str, Vec<DeclId>>,
    objects: HashMap<DeclId, Memo<Arc<ObjectShape>>>,
    enums: HashMap<DeclId, Memo<Arc<EnumDef>>>,
    /// Named objects currently being resolved, outermost first
    stack: Vec<DeclId>,
    errors: Vec<(String, CodegenError)>,
}

/// Resolve a whole project. Units may be given in any order.
pub fn resolve(units: &[SpecUnit]) -> Resolution {
    let mut sorted: Vec<&SpecUnit> = units.iter().collect();
    sorted.sort_by(|a, b| a.id.cmp(&b.id));

    let mut index: BTreeMap<&str, Vec<DeclId>> = BTreeMap::new();
    for (unit, spec) in sorted.iter().enumerate() {
        for (decl_index, decl) in spec.declarations.iter().enumerate() {
            index.entry(decl.name()).or_default().push(DeclId {
                unit,
                index: decl_index,
            });
        }
    }

    let resolver = Resolver {
        units: sorted,
        index,
        objects: HashMap::new(),
        enums: HashMap::new(),
        stack: Vec::new(),
        errors: Vec::new(),
    };
    resolver.run()
}

impl<'a> Resolver<'a> {
    fn run(mut self) -> Resolution {
        // Validate every declaration, referenced or not.
        for unit in 0..self.units.len() {
            for index in 0..self.units[unit].declarations.len() {
                let id = DeclId { unit, index };
                match self.decl(id) {
                    Declaration::Object(_) => {
                        self.object(id);
                    }
                    Declaration::Enum(_) => {
                        self.enumeration(id);
                    }
                    Declaration::Module(_) => {}
                }
            }
        }

        let mut registered: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
        for (unit, spec) in self.units.iter().copied().enumerate() {
            if let Some(registration) = &spec.registration {
                registered
                    .entry(registration.name.as_str())
                    .or_default()
                    .push(unit);
            }
        }

        let mut modules = Vec::new();
        for unit in 0..self.units.len() {
            let spec: &'a SpecUnit = self.units[unit];
            let Some(registration) = &spec.registration else {
                continue;
            };
            let owners = registered
                .get(registration.name.as_str())
                .map_or(&[][..], Vec::as_slice);
            if owners.first().is_some_and(|first| *first != unit) {
                let units = owners.iter().map(|u| self.units[*u].id.clone()).collect();
                self.report(
                    unit,
                    CodegenError::DuplicateModule {
                        name: registration.name.clone(),
                        units,
                    },
                );
                continue;
            }
            if let Some(module) = self.module(unit) {
                modules.push(module);
            }
        }

        debug!(
            "Resolved {} module(s) with {} error(s)",
            modules.len(),
            self.errors.len()
        );
        Resolution {
            modules,
            errors: self.errors,
        }
    }

    fn decl(&self, id: DeclId) -> &'a Declaration {
        let unit: &'a SpecUnit = self.units[id.unit];
        &unit.declarations[id.index]
    }

    fn report(&mut self, unit: usize, error: CodegenError) {
        self.errors.push((self.units[unit].id.clone(), error));
    }

    fn module(&mut self, unit: usize) -> Option<ResolvedModule> {
        let spec = self.units[unit];
        let registration = spec.registration.as_ref()?;
        let interface = spec.module()?;

        let mut ok = true;
        let mut seen = HashSet::new();
        let mut methods = Vec::new();
        for method in &interface.methods {
            if !seen.insert(method.name.as_str()) {
                self.report(
                    unit,
                    CodegenError::DuplicateMethod {
                        module: registration.name.clone(),
                        method: method.name.clone(),
                    },
                );
                ok = false;
                continue;
            }

            let mut params = Vec::new();
            for param in &method.params {
                let context = format!("{}.{}({})", registration.name, method.name, param.name);
                match self.ty(&param.ty, &context, unit) {
                    Some(ty) => params.push(Field {
                        name: param.name.clone(),
                        ty,
                    }),
                    None => ok = false,
                }
            }
            let context = format!("{}.{} return type", registration.name, method.name);
            match self.ty(&method.ret, &context, unit) {
                Some(ret) if ok => methods.push(ResolvedMethod {
                    name: method.name.clone(),
                    params,
                    ret,
                }),
                Some(_) => {}
                None => ok = false,
            }
        }

        ok.then(|| ResolvedModule {
            name: registration.name.clone(),
            interface: interface.name.clone(),
            lookup: registration.lookup,
            source: spec.id.clone(),
            methods,
        })
    }

    /// Resolve a type expression written in `unit`.
    fn ty(&mut self, expr: &TypeExpr, context: &str, unit: usize) -> Option<TypeRef> {
        match expr {
            TypeExpr::Void => Some(TypeRef::Void),
            TypeExpr::Bool => Some(TypeRef::Bool),
            TypeExpr::Int => Some(TypeRef::Int),
            TypeExpr::Double => Some(TypeRef::Double),
            TypeExpr::String => Some(TypeRef::String),
            TypeExpr::Array(inner) => self
                .ty(inner, context, unit)
                .map(|inner| TypeRef::Array(Box::new(inner))),
            TypeExpr::Nullable(inner) => {
                if matches!(**inner, TypeExpr::Nullable(_)) {
                    self.report(
                        unit,
                        CodegenError::InvalidNesting {
                            wrapper: "Nullable",
                            context: context.to_string(),
                        },
                    );
                    return None;
                }
                self.ty(inner, context, unit)
                    .map(|inner| TypeRef::Nullable(Box::new(inner)))
            }
            TypeExpr::Promise(inner) => {
                if matches!(**inner, TypeExpr::Promise(_)) {
                    self.report(
                        unit,
                        CodegenError::InvalidNesting {
                            wrapper: "Promise",
                            context: context.to_string(),
                        },
                    );
                    return None;
                }
                self.ty(inner, context, unit)
                    .map(|inner| TypeRef::Promise(Box::new(inner)))
            }
            TypeExpr::Object(fields) => {
                let owner = format!("inline object in {context}");
                self.fields(fields, &owner, context, unit)
                    .map(|fields| TypeRef::Object(Arc::new(ObjectShape { name: None, fields })))
            }
            TypeExpr::Named { name, .. } => self.named(name, context, unit),
        }
    }

    /// Resolve all fields of a shape, reporting every failure before giving up.
    fn fields(
        &mut self,
        fields: &[FieldDecl],
        owner: &str,
        context: &str,
        unit: usize,
    ) -> Option<Vec<Field>> {
        let mut ok = true;
        let mut seen = HashSet::new();
        let mut resolved = Vec::new();
        for field in fields {
            if !seen.insert(field.name.as_str()) {
                self.report(
                    unit,
                    CodegenError::DuplicateField {
                        shape: owner.to_string(),
                        field: field.name.clone(),
                    },
                );
                ok = false;
                continue;
            }
            let field_context = format!("{context}.{}", field.name);
            match self.ty(&field.ty, &field_context, unit) {
                Some(ty) => resolved.push(Field {
                    name: field.name.clone(),
                    ty,
                }),
                None => ok = false,
            }
        }
        ok.then_some(resolved)
    }

    fn named(&mut self, name: &str, context: &str, unit: usize) -> Option<TypeRef> {
        let candidates = self.index.get(name).cloned().unwrap_or_default();
        let [id] = candidates.as_slice() else {
            let candidates = candidates
                .iter()
                .map(|c| self.units[c.unit].id.clone())
                .collect();
            self.report(
                unit,
                CodegenError::UnresolvedType {
                    name: name.to_string(),
                    referenced_from: context.to_string(),
                    candidates,
                },
            );
            return None;
        };

        match self.decl(*id) {
            Declaration::Object(_) => self.object(*id).map(TypeRef::Object),
            Declaration::Enum(_) => self.enumeration(*id).map(TypeRef::EnumRef),
            Declaration::Module(_) => self.units[id.unit]
                .registration
                .as_ref()
                .map(|registration| TypeRef::ModuleRef(registration.name.clone())),
        }
    }

    fn object(&mut self, id: DeclId) -> Option<Arc<ObjectShape>> {
        let in_progress = match self.objects.get(&id) {
            Some(Memo::Done(shape)) => return Some(Arc::clone(shape)),
            Some(Memo::Failed) => return None,
            Some(Memo::InProgress) => true,
            None => false,
        };
        if in_progress {
            let start = self.stack.iter().position(|s| *s == id).unwrap_or(0);
            let mut path: Vec<String> = self.stack[start..]
                .iter()
                .map(|s| self.decl(*s).name().to_string())
                .collect();
            path.push(self.decl(id).name().to_string());
            self.report(id.unit, CodegenError::UnsupportedCycle { path });
            self.objects.insert(id, Memo::Failed);
            return None;
        }

        let Declaration::Object(ObjectDecl { name, fields, .. }) = self.decl(id) else {
            return None;
        };
        self.objects.insert(id, Memo::InProgress);
        self.stack.push(id);
        let resolved = self.fields(fields, name, name, id.unit);
        self.stack.pop();

        // A cycle detected below this frame has already marked it failed.
        let shape = match (resolved, self.objects.get(&id)) {
            (Some(fields), Some(Memo::InProgress)) => Some(Arc::new(ObjectShape {
                name: Some(name.clone()),
                fields,
            })),
            _ => None,
        };
        let memo = match &shape {
            Some(shape) => Memo::Done(Arc::clone(shape)),
            None => Memo::Failed,
        };
        self.objects.insert(id, memo);
        shape
    }

    fn enumeration(&mut self, id: DeclId) -> Option<Arc<EnumDef>> {
        match self.enums.get(&id) {
            Some(Memo::Done(def)) => return Some(Arc::clone(def)),
            Some(Memo::Failed | Memo::InProgress) => return None,
            None => {}
        }
        let Declaration::Enum(EnumDecl { name, variants, .. }) = self.decl(id) else {
            return None;
        };

        let mut ok = true;
        let mut names = HashSet::new();
        let mut values = HashSet::new();
        for variant in variants {
            if !names.insert(variant.name.as_str()) || !values.insert(variant.value.as_str()) {
                self.report(
                    id.unit,
                    CodegenError::DuplicateVariant {
                        enum_name: name.clone(),
                        variant: variant.value.clone(),
                    },
                );
                ok = false;
            }
        }

        let def = ok.then(|| {
            Arc::new(EnumDef {
                name: name.clone(),
                variants: variants
                    .iter()
                    .map(|v| Variant {
                        name: v.name.clone(),
                        value: v.value.clone(),
                    })
                    .collect(),
            })
        });
        let memo = match &def {
            Some(def) => Memo::Done(Arc::clone(def)),
            None => Memo::Failed,
        };
        self.enums.insert(id, memo);
        def
    }
}
