//! React Native C++ TurboModule emitter.
//!
//! Per module, `<Module>Spec.h` declares the value types in
//! `modgen::<snake_module>`, `facebook::react::Bridging<>` specializations for
//! them, and an abstract `Native<Module>CxxSpec` whose method table dispatches
//! JS calls to pure virtual methods.

use modgen_common::Platform;
use modgen_common::naming::{to_pascal_case, to_snake_case};
use std::collections::HashSet;

use super::{Emitter, FileHeader, GeneratedFile, index_identity};
use crate::error::CodegenError;
use crate::ir::{EnumIR, IrType, MethodIR, ModuleIR, ObjectIR};

const CXX_KEYWORDS: &[&str] = &[
    "alignas", "alignof", "and", "and_eq", "asm", "auto", "bitand", "bitor", "bool", "break",
    "case", "catch", "char", "class", "compl", "concept", "const", "consteval", "constexpr",
    "constinit", "const_cast", "continue", "co_await", "co_return", "co_yield", "decltype",
    "default", "delete", "do", "double", "dynamic_cast", "else", "enum", "explicit", "export",
    "extern", "false", "float", "for", "friend", "goto", "if", "inline", "int", "long", "mutable",
    "namespace", "new", "noexcept", "not", "not_eq", "nullptr", "operator", "or", "or_eq",
    "private", "protected", "public", "register", "reinterpret_cast", "requires", "return",
    "short", "signed", "sizeof", "static", "static_assert", "static_cast", "struct", "switch",
    "template", "this", "thread_local", "throw", "true", "try", "typedef", "typeid", "typename",
    "union", "unsigned", "using", "virtual", "void", "volatile", "wchar_t", "while", "xor",
    "xor_eq",
];

/// Names used by the method table and host functions.
const RESERVED_PARAM_NAMES: &[&str] = &["rt", "turboModule", "args", "count", "self", "promise"];

const INDEX_HEADER: &str = "ModgenModules.h";

/// C++ TurboModule header emitter.
#[derive(Debug, Clone, Copy, Default)]
pub struct CxxEmitter;

/// Header file of a module, e.g. `CrabyTestSpec.h`.
pub fn module_header(module_name: &str) -> String {
    format!("{}Spec.h", to_pascal_case(module_name))
}

fn cxx_ident(name: &str) -> String {
    if CXX_KEYWORDS.contains(&name) {
        format!("{name}_")
    } else {
        name.to_string()
    }
}

fn quoted(s: &str) -> String {
    let mut out = String::from("\"");
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

struct ModuleScope {
    namespace: String,
    class_name: String,
}

impl ModuleScope {
    fn new(module: &ModuleIR) -> Self {
        Self {
            namespace: format!("modgen::{}", cxx_ident(&to_snake_case(&module.name))),
            class_name: format!("Native{}CxxSpec", to_pascal_case(&module.name)),
        }
    }

    fn qualified(&self, name: &str) -> String {
        format!("{}::{name}", self.namespace)
    }

    /// Static dispatcher registered in the method table for `method`.
    fn host_function(&self, method: &str) -> String {
        format!("hostFunction_{}_{method}", self.class_name)
    }
}

impl CxxEmitter {
    /// C++ spelling of a type. With a scope, user types are namespace-qualified.
    fn cxx_type(&self, ty: &IrType, scope: Option<&ModuleScope>) -> Result<String, CodegenError> {
        Ok(match ty {
            IrType::Void => "void".to_string(),
            IrType::Bool => "bool".to_string(),
            IrType::Int => "int".to_string(),
            IrType::Double => "double".to_string(),
            IrType::String => "std::string".to_string(),
            IrType::Array(inner) | IrType::Nullable(inner) if **inner == IrType::Void => {
                return Err(self.unsupported(ty.to_string()));
            }
            IrType::Array(inner) => format!("std::vector<{}>", self.cxx_type(inner, scope)?),
            IrType::Object(name) | IrType::Enum(name) => match scope {
                Some(scope) => scope.qualified(name),
                None => name.clone(),
            },
            IrType::Nullable(inner) => format!("std::optional<{}>", self.cxx_type(inner, scope)?),
            IrType::Promise(inner) => match **inner {
                IrType::Void => "facebook::react::AsyncPromise<>".to_string(),
                _ => format!(
                    "facebook::react::AsyncPromise<{}>",
                    self.cxx_type(inner, scope)?
                ),
            },
            IrType::Module(name) => return Err(self.unsupported(format!("module '{name}'"))),
        })
    }

    fn check_names(&self, module: &ModuleIR, scope: &ModuleScope) -> Result<(), CodegenError> {
        for name in module
            .enums
            .iter()
            .map(|e| &e.name)
            .chain(module.objects.iter().map(|o| &o.name))
        {
            if CXX_KEYWORDS.contains(&name.as_str()) || *name == scope.class_name {
                return Err(self.unsupported(format!("type name `{name}`")));
            }
        }
        for enumeration in &module.enums {
            let mut seen = HashSet::new();
            for variant in &enumeration.variants {
                if !seen.insert(to_pascal_case(&variant.name)) {
                    return Err(self.unsupported(format!(
                        "variant `{}` of {}",
                        variant.name, enumeration.name
                    )));
                }
            }
        }
        Ok(())
    }

    fn emit_enum(&self, enumeration: &EnumIR) -> String {
        let mut out = format!("enum class {} {{\n", enumeration.name);
        for variant in &enumeration.variants {
            out.push_str(&format!("  {},\n", to_pascal_case(&variant.name)));
        }
        out.push_str("};\n");
        out
    }

    fn emit_struct(&self, object: &ObjectIR) -> Result<String, CodegenError> {
        let mut out = format!("struct {} {{\n", object.name);
        for field in &object.fields {
            out.push_str(&format!(
                "  {} {};\n",
                self.cxx_type(&field.ty, None)?,
                cxx_ident(&field.name)
            ));
        }
        out.push_str("};\n");
        Ok(out)
    }

    fn emit_enum_bridging(&self, enumeration: &EnumIR, scope: &ModuleScope) -> String {
        let ty = scope.qualified(&enumeration.name);
        let mut out = String::new();
        out.push_str(&format!("template <>\nstruct Bridging<{ty}> {{\n"));
        out.push_str(&format!(
            "  static {ty} fromJs(jsi::Runtime& rt, const jsi::String& value) {{\n"
        ));
        out.push_str("    auto str = value.utf8(rt);\n");
        for variant in &enumeration.variants {
            out.push_str(&format!(
                "    if (str == {}) {{\n      return {ty}::{};\n    }}\n",
                quoted(&variant.value),
                to_pascal_case(&variant.name)
            ));
        }
        out.push_str(&format!(
            "    throw jsi::JSError(rt, \"Invalid {} variant: \" + str);\n  }}\n\n",
            enumeration.name
        ));
        out.push_str(&format!(
            "  static jsi::String toJs(jsi::Runtime& rt, {ty} value) {{\n"
        ));
        out.push_str("    switch (value) {\n");
        for variant in &enumeration.variants {
            out.push_str(&format!(
                "      case {ty}::{}:\n        return bridging::toJs(rt, {});\n",
                to_pascal_case(&variant.name),
                quoted(&variant.value)
            ));
        }
        out.push_str("    }\n");
        out.push_str(&format!(
            "    throw jsi::JSError(rt, \"Invalid {} value\");\n  }}\n}};\n",
            enumeration.name
        ));
        out
    }

    fn emit_struct_bridging(
        &self,
        object: &ObjectIR,
        scope: &ModuleScope,
    ) -> Result<String, CodegenError> {
        let ty = scope.qualified(&object.name);
        let mut out = String::new();
        out.push_str(&format!("template <>\nstruct Bridging<{ty}> {{\n"));
        out.push_str(&format!(
            "  static {ty} fromJs(\n      jsi::Runtime& rt,\n      const jsi::Object& value,\n      \
             const std::shared_ptr<CallInvoker>& jsInvoker) {{\n"
        ));
        out.push_str(&format!("    return {ty}{{\n"));
        for field in &object.fields {
            out.push_str(&format!(
                "        bridging::fromJs<{}>(rt, value.getProperty(rt, {}), jsInvoker),\n",
                self.cxx_type(&field.ty, Some(scope))?,
                quoted(&field.name)
            ));
        }
        out.push_str("    };\n  }\n\n");
        out.push_str(&format!(
            "  static jsi::Object toJs(\n      jsi::Runtime& rt,\n      const {ty}& value,\n      \
             const std::shared_ptr<CallInvoker>& jsInvoker) {{\n"
        ));
        out.push_str("    auto result = jsi::Object(rt);\n");
        for field in &object.fields {
            out.push_str(&format!(
                "    result.setProperty(rt, {}, bridging::toJs(rt, value.{}, jsInvoker));\n",
                quoted(&field.name),
                cxx_ident(&field.name)
            ));
        }
        out.push_str("    return result;\n  }\n};\n");
        Ok(out)
    }

    fn param_name(name: &str) -> String {
        if RESERVED_PARAM_NAMES.contains(&name) {
            format!("{name}_")
        } else {
            cxx_ident(name)
        }
    }

    fn emit_virtual(&self, method: &MethodIR) -> Result<String, CodegenError> {
        let mut params = vec!["facebook::jsi::Runtime& rt".to_string()];
        for param in &method.params {
            params.push(format!(
                "{} {}",
                self.cxx_type(&param.ty, None)?,
                Self::param_name(&param.name)
            ));
        }
        let ret = if method.is_async {
            params.push(format!("{} promise", self.cxx_type(&method.ret, None)?));
            "void".to_string()
        } else {
            self.cxx_type(&method.ret, None)?
        };
        Ok(format!(
            "  virtual {ret} {}({}) = 0;\n",
            cxx_ident(&method.name),
            params.join(", ")
        ))
    }

    fn emit_host_function(&self, method: &MethodIR, scope: &ModuleScope) -> Result<String, CodegenError> {
        let arity = method.params.len();
        let mut out = format!(
            "  static facebook::jsi::Value {}(\n      facebook::jsi::Runtime& rt,\n      \
             facebook::react::TurboModule& turboModule,\n      \
             const facebook::jsi::Value* args,\n      size_t count) {{\n",
            scope.host_function(&method.name)
        );
        out.push_str(&format!(
            "    auto& self = static_cast<{}&>(turboModule);\n",
            scope.class_name
        ));
        out.push_str(&format!(
            "    if (count != {arity}) {{\n      throw facebook::jsi::JSError(rt, \"{} expects {arity} argument(s), got \" + std::to_string(count));\n    }}\n",
            method.name
        ));

        let mut call_args = vec!["rt".to_string()];
        for (index, param) in method.params.iter().enumerate() {
            call_args.push(format!(
                "facebook::react::bridging::fromJs<{}>(rt, args[{index}], self.jsInvoker_)",
                self.cxx_type(&param.ty, Some(scope))?
            ));
        }
        let fn_name = cxx_ident(&method.name);

        if method.is_async {
            out.push_str(&format!(
                "    auto promise = {}(rt, self.jsInvoker_);\n",
                self.cxx_type(&method.ret, Some(scope))?
            ));
            call_args.push("promise".to_string());
            out.push_str(&format!("    self.{fn_name}({});\n", call_args.join(", ")));
            out.push_str("    return promise.get(rt);\n");
        } else if method.ret == IrType::Void {
            out.push_str(&format!("    self.{fn_name}({});\n", call_args.join(", ")));
            out.push_str("    return facebook::jsi::Value::undefined();\n");
        } else {
            out.push_str(&format!(
                "    auto result = self.{fn_name}({});\n",
                call_args.join(", ")
            ));
            out.push_str(
                "    return facebook::react::bridging::toJs(rt, std::move(result), self.jsInvoker_);\n",
            );
        }
        out.push_str("  }\n");
        Ok(out)
    }

    fn emit_class(&self, module: &ModuleIR, scope: &ModuleScope) -> Result<String, CodegenError> {
        let class = &scope.class_name;
        let mut out = format!(
            "class JSI_EXPORT {class} : public facebook::react::TurboModule {{\n public:\n"
        );
        out.push_str(&format!(
            "  static constexpr const char* kModuleName = {};\n\n",
            quoted(&module.name)
        ));
        for method in &module.methods {
            out.push_str(&self.emit_virtual(method)?);
        }

        out.push_str(&format!(
            "\n protected:\n  explicit {class}(std::shared_ptr<facebook::react::CallInvoker> jsInvoker)\n      \
             : facebook::react::TurboModule(kModuleName, jsInvoker) {{\n"
        ));
        for method in &module.methods {
            out.push_str(&format!(
                "    methodMap_[{}] = MethodMetadata{{{}, {}}};\n",
                quoted(&method.name),
                method.params.len(),
                scope.host_function(&method.name)
            ));
        }
        out.push_str("  }\n\n private:\n");
        let host_functions = module
            .methods
            .iter()
            .map(|m| self.emit_host_function(m, scope))
            .collect::<Result<Vec<_>, _>>()?;
        out.push_str(&host_functions.join("\n"));
        out.push_str("};\n");
        Ok(out)
    }
}

impl Emitter for CxxEmitter {
    fn platform(&self) -> Platform {
        Platform::Cxx
    }

    fn version(&self) -> &'static str {
        "1.0.0"
    }

    fn emit_module(&self, module: &ModuleIR) -> Result<Vec<GeneratedFile>, CodegenError> {
        let hash = module.structural_hash();
        let scope = ModuleScope::new(module);
        self.check_names(module, &scope)?;

        let mut out = FileHeader::for_module(self, module, &hash).render("//");
        out.push_str(
            "\n#pragma once\n\n\
             #include <ReactCommon/TurboModule.h>\n\
             #include <react/bridging/Bridging.h>\n\n\
             #include <memory>\n\
             #include <optional>\n\
             #include <string>\n\
             #include <vector>\n\n",
        );

        let mut types = Vec::new();
        for enumeration in &module.enums {
            types.push(self.emit_enum(enumeration));
        }
        for object in &module.objects {
            types.push(self.emit_struct(object)?);
        }
        if !types.is_empty() {
            out.push_str(&format!("namespace {} {{\n\n", scope.namespace));
            out.push_str(&types.join("\n"));
            out.push_str(&format!("\n}} // namespace {}\n\n", scope.namespace));

            let mut bridging = Vec::new();
            for enumeration in &module.enums {
                bridging.push(self.emit_enum_bridging(enumeration, &scope));
            }
            for object in &module.objects {
                bridging.push(self.emit_struct_bridging(object, &scope)?);
            }
            out.push_str("namespace facebook::react {\n\n");
            out.push_str(&bridging.join("\n"));
            out.push_str("\n} // namespace facebook::react\n\n");
        }

        out.push_str(&format!("namespace {} {{\n\n", scope.namespace));
        out.push_str(&self.emit_class(module, &scope)?);
        out.push_str(&format!("\n}} // namespace {}\n", scope.namespace));

        Ok(vec![GeneratedFile::new(module_header(&module.name), out)])
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
        out.push_str("\n#pragma once\n\n");
        for module in modules {
            out.push_str(&format!("#include \"{}\"\n", module_header(&module.name)));
        }
        Ok(vec![GeneratedFile::new(INDEX_HEADER, out)])
    }
}
