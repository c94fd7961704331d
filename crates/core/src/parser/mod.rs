//! Parser for the interface-description subset of TypeScript used by spec units.
//!
//! A unit declares object shapes, enums, at most one module interface, and
//! the registration that binds the module interface to its registry name:
//!
//! ```text
//! export interface Spec extends TurboModule {
//!   add(a: number, b: number): number;
//! }
//! export default TurboModuleRegistry.getEnforcing<Spec>('Calculator');
//! ```
//!
//! Anything outside the supported subset is rejected with
//! [`ParseErrorKind::UnsupportedConstruct`] rather than skipped.

pub mod ast;
pub mod lexer;

use crate::error::{ParseError, ParseErrorKind, Span};
use ast::{
    Declaration, EnumDecl, FieldDecl, InterfaceDecl, LookupKind, MethodDecl, ObjectDecl,
    ParamDecl, Registration, SpecUnit, TypeExpr, VariantDecl,
};
use lexer::{Token, TokenKind, tokenize};

/// Base interfaces that mark an interface as a native module.
pub const MODULE_BASES: &[&str] = &["NativeModule", "TurboModule", "Module"];

/// Registry objects accepted in a registration.
pub const REGISTRIES: &[&str] = &["NativeModuleRegistry", "TurboModuleRegistry", "Registry"];

/// Parse one spec unit. Has no side effects and does not look at other units.
pub fn parse_unit(id: &str, source: &str) -> Result<SpecUnit, ParseError> {
    let tokens = tokenize(source)?;
    Parser::new(tokens).unit(id)
}

enum Member {
    Method(MethodDecl),
    Property(FieldDecl),
}

/// A union member before nullability is folded in.
enum UnionMember {
    Null,
    Type(TypeExpr),
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    eof: Token,
}

impl Parser {
    fn new(tokens: Vec<Token>) -> Self {
        let eof = tokens.last().cloned().unwrap_or(Token {
            kind: TokenKind::Eof,
            span: Span::new(1, 1),
        });
        Self {
            tokens,
            pos: 0,
            eof,
        }
    }

    // =========================================================================
    // Token helpers
    // =========================================================================

    fn peek(&self) -> &Token {
        self.tokens.get(self.pos).unwrap_or(&self.eof)
    }

    fn peek_kind_at(&self, offset: usize) -> &TokenKind {
        &self.tokens.get(self.pos + offset).unwrap_or(&self.eof).kind
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        token
    }

    fn is_punct(&self, c: char) -> bool {
        self.peek().kind == TokenKind::Punct(c)
    }

    fn is_ident(&self, name: &str) -> bool {
        matches!(&self.peek().kind, TokenKind::Ident(ident) if ident == name)
    }

    fn eat_punct(&mut self, c: char) -> bool {
        if self.is_punct(c) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn error_here(&self, expected: &str) -> ParseError {
        let token = self.peek();
        match token.kind {
            TokenKind::Eof => ParseError::unexpected_eof(token.span, expected),
            _ => ParseError::unexpected_token(token.span, &token.kind.describe(), expected),
        }
    }

    fn expect_punct(&mut self, c: char) -> Result<Span, ParseError> {
        if self.is_punct(c) {
            Ok(self.advance().span)
        } else {
            Err(self.error_here(&format!("`{c}`")))
        }
    }

    fn expect_ident(&mut self, what: &str) -> Result<(String, Span), ParseError> {
        match &self.peek().kind {
            TokenKind::Ident(name) => {
                let name = name.clone();
                let span = self.advance().span;
                Ok((name, span))
            }
            _ => Err(self.error_here(what)),
        }
    }

    fn expect_string(&mut self, what: &str) -> Result<(String, Span), ParseError> {
        match &self.peek().kind {
            TokenKind::Str(value) => {
                let value = value.clone();
                let span = self.advance().span;
                Ok((value, span))
            }
            _ => Err(self.error_here(what)),
        }
    }

    /// Fail with `UnterminatedDeclaration` if the body opened at `start` runs into EOF.
    fn check_unterminated(&self, what: &str, name: &str, start: Span) -> Result<(), ParseError> {
        if self.peek().kind == TokenKind::Eof {
            return Err(ParseError::new(
                ParseErrorKind::UnterminatedDeclaration,
                start,
                format!("{what} `{name}` is never closed"),
            ));
        }
        Ok(())
    }

    // =========================================================================
    // Items
    // =========================================================================

    fn unit(mut self, id: &str) -> Result<SpecUnit, ParseError> {
        let mut declarations = Vec::new();
        let mut registration: Option<Registration> = None;

        loop {
            let token = self.peek().clone();
            match &token.kind {
                TokenKind::Eof => break,
                TokenKind::Punct(';') => {
                    self.advance();
                }
                TokenKind::Ident(word) if word == "import" => self.skip_import(),
                TokenKind::Ident(word) if word == "export" => {
                    self.advance();
                    if self.is_ident("default") {
                        self.advance();
                        let parsed = self.registration()?;
                        if registration.is_some() {
                            return Err(ParseError::new(
                                ParseErrorKind::InvalidRegistration,
                                parsed.span,
                                "a unit holds at most one registration",
                            ));
                        }
                        registration = Some(parsed);
                    } else {
                        declarations.push(self.declaration()?);
                    }
                }
                TokenKind::Ident(word) if matches!(word.as_str(), "interface" | "enum" | "type") => {
                    declarations.push(self.declaration()?);
                }
                TokenKind::Ident(word)
                    if matches!(
                        word.as_str(),
                        "const" | "let" | "var" | "function" | "class" | "declare" | "namespace"
                    ) =>
                {
                    return Err(ParseError::unsupported(
                        token.span,
                        format!("`{word}` declarations are not part of the interface language"),
                    ));
                }
                _ => return Err(self.error_here("a declaration")),
            }
        }

        validate_registration(&declarations, registration.as_ref())?;

        Ok(SpecUnit {
            id: id.to_string(),
            declarations,
            registration,
        })
    }

    /// Imports are accepted and ignored: skip to the module specifier and an optional `;`.
    fn skip_import(&mut self) {
        self.advance();
        loop {
            match self.advance().kind {
                TokenKind::Str(_) => {
                    self.eat_punct(';');
                    return;
                }
                TokenKind::Punct(';') | TokenKind::Eof => return,
                _ => {}
            }
        }
    }

    fn declaration(&mut self) -> Result<Declaration, ParseError> {
        let token = self.peek().clone();
        match &token.kind {
            TokenKind::Ident(word) if word == "interface" => self.interface(),
            TokenKind::Ident(word) if word == "enum" => self.enumeration().map(Declaration::Enum),
            TokenKind::Ident(word) if word == "type" => {
                if matches!(self.peek_kind_at(1), TokenKind::Punct('{')) {
                    return Err(ParseError::unsupported(token.span, "type-only export lists"));
                }
                self.type_alias().map(Declaration::Object)
            }
            TokenKind::Punct('{') => Err(ParseError::unsupported(token.span, "export lists")),
            TokenKind::Ident(word) if word == "const" && matches!(self.peek_kind_at(1), TokenKind::Ident(next) if next == "enum") => {
                Err(ParseError::unsupported(token.span, "`const enum`"))
            }
            TokenKind::Ident(word) => Err(ParseError::unsupported(
                token.span,
                format!("exported `{word}` is not part of the interface language"),
            )),
            _ => Err(self.error_here("`interface`, `enum` or `type`")),
        }
    }

    fn interface(&mut self) -> Result<Declaration, ParseError> {
        let start = self.advance().span;
        let (name, _) = self.expect_ident("interface name")?;
        if self.is_punct('<') {
            return Err(ParseError::unsupported(
                self.peek().span,
                format!("generic interface `{name}`"),
            ));
        }

        let mut extends = None;
        if self.is_ident("extends") {
            self.advance();
            let (base, base_span) = self.expect_ident("base interface name")?;
            if !MODULE_BASES.contains(&base.as_str()) {
                return Err(ParseError::unsupported(
                    base_span,
                    format!("interface `{name}` extends `{base}`; only {} are supported", MODULE_BASES.join(", ")),
                ));
            }
            if self.is_punct(',') || self.is_punct('<') {
                return Err(ParseError::unsupported(
                    self.peek().span,
                    format!("interface `{name}` must extend exactly one non-generic base"),
                ));
            }
            extends = Some(base);
        }

        self.expect_punct('{')?;
        let members = self.members("interface", &name, start)?;

        match extends {
            Some(extends) => {
                let mut methods = Vec::new();
                for member in members {
                    match member {
                        Member::Method(method) => methods.push(method),
                        Member::Property(field) => {
                            return Err(ParseError::unsupported(
                                field.span,
                                format!("property `{}` in module interface `{name}`; declare a method instead", field.name),
                            ));
                        }
                    }
                }
                Ok(Declaration::Module(InterfaceDecl {
                    name,
                    extends,
                    methods,
                    span: start,
                }))
            }
            None => Ok(Declaration::Object(ObjectDecl {
                fields: object_fields(members, &name)?,
                name,
                span: start,
            })),
        }
    }

    fn type_alias(&mut self) -> Result<ObjectDecl, ParseError> {
        let start = self.advance().span;
        let (name, _) = self.expect_ident("type name")?;
        if self.is_punct('<') {
            return Err(ParseError::unsupported(
                self.peek().span,
                format!("generic type alias `{name}`"),
            ));
        }
        self.expect_punct('=')?;
        if !self.is_punct('{') {
            return Err(ParseError::unsupported(
                self.peek().span,
                format!("type alias `{name}` must be an object literal type"),
            ));
        }
        self.advance();
        let members = self.members("type", &name, start)?;
        self.eat_punct(';');
        Ok(ObjectDecl {
            fields: object_fields(members, &name)?,
            name,
            span: start,
        })
    }

    fn enumeration(&mut self) -> Result<EnumDecl, ParseError> {
        let start = self.advance().span;
        let (name, _) = self.expect_ident("enum name")?;
        self.expect_punct('{')?;

        let mut variants = Vec::new();
        loop {
            self.check_unterminated("enum", &name, start)?;
            if self.eat_punct('}') {
                break;
            }
            let token = self.advance();
            let variant_name = match token.kind {
                TokenKind::Ident(ident) | TokenKind::Str(ident) => ident,
                other => {
                    return Err(ParseError::unexpected_token(
                        token.span,
                        &other.describe(),
                        "enum variant name",
                    ));
                }
            };
            let mut value = variant_name.clone();
            if self.eat_punct('=') {
                let init = self.peek().clone();
                match init.kind {
                    TokenKind::Str(literal) => {
                        self.advance();
                        value = literal;
                    }
                    TokenKind::Number(_) => {
                        return Err(ParseError::unsupported(
                            init.span,
                            format!("numeric initializer for `{name}.{variant_name}`; enum values must be strings"),
                        ));
                    }
                    _ => return Err(self.error_here("string initializer")),
                }
            }
            variants.push(VariantDecl {
                name: variant_name,
                value,
                span: token.span,
            });
            if !self.eat_punct(',') {
                self.check_unterminated("enum", &name, start)?;
                self.expect_punct('}')?;
                break;
            }
        }

        if variants.is_empty() {
            return Err(ParseError::unsupported(
                start,
                format!("enum `{name}` has no variants"),
            ));
        }
        Ok(EnumDecl {
            name,
            variants,
            span: start,
        })
    }

    fn registration(&mut self) -> Result<Registration, ParseError> {
        let (registry, span) = match &self.peek().kind {
            TokenKind::Ident(name) => {
                let name = name.clone();
                (name, self.advance().span)
            }
            _ => {
                return Err(ParseError::new(
                    ParseErrorKind::InvalidRegistration,
                    self.peek().span,
                    "default export must be a registry lookup",
                ));
            }
        };
        if !REGISTRIES.contains(&registry.as_str()) {
            return Err(ParseError::new(
                ParseErrorKind::InvalidRegistration,
                span,
                format!("unknown registry `{registry}`; expected one of {}", REGISTRIES.join(", ")),
            ));
        }
        self.expect_punct('.')?;
        let (method, method_span) = self.expect_ident("`get` or `getEnforcing`")?;
        let lookup = match method.as_str() {
            "get" => LookupKind::Get,
            "getEnforcing" => LookupKind::GetEnforcing,
            _ => {
                return Err(ParseError::new(
                    ParseErrorKind::InvalidRegistration,
                    method_span,
                    format!("unknown registry lookup `{method}`"),
                ));
            }
        };
        self.expect_punct('<')?;
        let (interface, _) = self.expect_ident("module interface name")?;
        self.expect_punct('>')?;
        self.expect_punct('(')?;
        let (name, name_span) = self.expect_string("module name string")?;
        if name.is_empty() {
            return Err(ParseError::new(
                ParseErrorKind::InvalidRegistration,
                name_span,
                "module name must not be empty",
            ));
        }
        self.expect_punct(')')?;
        self.eat_punct(';');

        Ok(Registration {
            registry,
            lookup,
            interface,
            name,
            span,
        })
    }

    // =========================================================================
    // Members
    // =========================================================================

    /// Parse members up to and including the closing `}`.
    fn members(&mut self, what: &str, name: &str, start: Span) -> Result<Vec<Member>, ParseError> {
        let mut members = Vec::new();
        loop {
            self.check_unterminated(what, name, start)?;
            if self.eat_punct('}') {
                return Ok(members);
            }
            members.push(self.member()?);
            if !self.eat_punct(';') {
                self.eat_punct(',');
            }
        }
    }

    fn member(&mut self) -> Result<Member, ParseError> {
        if self.is_ident("readonly")
            && matches!(self.peek_kind_at(1), TokenKind::Ident(_) | TokenKind::Str(_))
        {
            self.advance();
        }

        let token = self.advance();
        let name = match token.kind {
            TokenKind::Ident(name) | TokenKind::Str(name) => name,
            TokenKind::Punct('[') => {
                return Err(ParseError::unsupported(token.span, "index signatures"));
            }
            TokenKind::Punct('(') => {
                return Err(ParseError::unsupported(token.span, "call signatures"));
            }
            other => {
                return Err(ParseError::unexpected_token(
                    token.span,
                    &other.describe(),
                    "member name",
                ));
            }
        };

        let optional = self.eat_punct('?');
        if self.is_punct('<') {
            return Err(ParseError::unsupported(
                self.peek().span,
                format!("generic method `{name}`"),
            ));
        }
        if self.is_punct('(') {
            if optional {
                return Err(ParseError::unsupported(
                    token.span,
                    format!("optional method `{name}`"),
                ));
            }
            self.advance();
            let params = self.params()?;
            self.expect_punct(':')?;
            let ret = self.ty()?;
            return Ok(Member::Method(MethodDecl {
                name,
                params,
                ret,
                span: token.span,
            }));
        }

        self.expect_punct(':')?;
        let ty = self.ty()?;
        Ok(Member::Property(FieldDecl {
            name,
            optional,
            ty: if optional { make_optional(ty) } else { ty },
            span: token.span,
        }))
    }

    /// Parse parameters after the opening `(` up to and including `)`.
    fn params(&mut self) -> Result<Vec<ParamDecl>, ParseError> {
        let mut params = Vec::new();
        loop {
            if self.eat_punct(')') {
                return Ok(params);
            }
            let (name, _) = self.expect_ident("parameter name")?;
            let optional = self.eat_punct('?');
            self.expect_punct(':')?;
            let ty = self.ty()?;
            params.push(ParamDecl {
                name,
                optional,
                ty: if optional { make_optional(ty) } else { ty },
            });
            if !self.eat_punct(',') {
                self.expect_punct(')')?;
                return Ok(params);
            }
        }
    }

    // =========================================================================
    // Types
    // =========================================================================

    fn ty(&mut self) -> Result<TypeExpr, ParseError> {
        let start = self.peek().span;
        self.eat_punct('|');
        let mut members = vec![self.postfix()?];
        loop {
            if self.eat_punct('|') {
                members.push(self.postfix()?);
            } else if self.is_punct('&') {
                return Err(ParseError::unsupported(self.peek().span, "intersection types"));
            } else {
                break;
            }
        }

        let nullable = members.iter().any(|m| matches!(m, UnionMember::Null));
        let mut types: Vec<TypeExpr> = members
            .into_iter()
            .filter_map(|m| match m {
                UnionMember::Type(ty) => Some(ty),
                UnionMember::Null => None,
            })
            .collect();

        match (types.len(), nullable) {
            (1, false) => Ok(types.remove(0)),
            (1, true) => Ok(TypeExpr::Nullable(Box::new(types.remove(0)))),
            (0, _) => Err(ParseError::unsupported(start, "`null` or `undefined` on its own")),
            _ => Err(ParseError::unsupported(
                start,
                "union types other than `T | null`",
            )),
        }
    }

    fn postfix(&mut self) -> Result<UnionMember, ParseError> {
        let start = self.peek().span;
        let mut member = self.primary()?;
        while self.is_punct('[') {
            self.advance();
            if !self.is_punct(']') {
                return Err(ParseError::unsupported(self.peek().span, "indexed access types"));
            }
            self.advance();
            member = match member {
                UnionMember::Type(ty) => UnionMember::Type(TypeExpr::Array(Box::new(ty))),
                UnionMember::Null => {
                    return Err(ParseError::unsupported(start, "arrays of `null`"));
                }
            };
        }
        Ok(member)
    }

    fn primary(&mut self) -> Result<UnionMember, ParseError> {
        let token = self.peek().clone();
        let ty = match &token.kind {
            TokenKind::Ident(name) => {
                self.advance();
                match name.as_str() {
                    "boolean" => TypeExpr::Bool,
                    "number" | "Double" | "Float" => TypeExpr::Double,
                    "Int32" => TypeExpr::Int,
                    "string" => TypeExpr::String,
                    "void" => TypeExpr::Void,
                    "null" | "undefined" => return Ok(UnionMember::Null),
                    "Promise" => TypeExpr::Promise(Box::new(self.type_argument(name, token.span)?)),
                    "Array" | "ReadonlyArray" => {
                        TypeExpr::Array(Box::new(self.type_argument(name, token.span)?))
                    }
                    "any" | "unknown" | "object" | "never" | "bigint" | "symbol" | "Object" => {
                        return Err(ParseError::unsupported(
                            token.span,
                            format!("`{name}` type"),
                        ));
                    }
                    _ if self.is_punct('<') => {
                        return Err(ParseError::unsupported(
                            token.span,
                            format!("generic type `{name}`; only Promise, Array and ReadonlyArray take type arguments"),
                        ));
                    }
                    _ if self.is_punct('.') => {
                        return Err(ParseError::unsupported(
                            token.span,
                            format!("qualified type name `{name}.`"),
                        ));
                    }
                    _ => TypeExpr::Named {
                        name: name.clone(),
                        span: token.span,
                    },
                }
            }
            TokenKind::Punct('{') => {
                self.advance();
                let members = self.members("object type", "{", token.span)?;
                TypeExpr::Object(object_fields(members, "inline object type")?)
            }
            TokenKind::Punct('(') => {
                let is_function = matches!(self.peek_kind_at(1), TokenKind::Punct(')'))
                    || (matches!(self.peek_kind_at(1), TokenKind::Ident(_))
                        && matches!(self.peek_kind_at(2), TokenKind::Punct(':' | '?')));
                if is_function {
                    return Err(ParseError::unsupported(token.span, "function types"));
                }
                self.advance();
                let inner = self.ty()?;
                self.expect_punct(')')?;
                if self.is_punct('=') && matches!(self.peek_kind_at(1), TokenKind::Punct('>')) {
                    return Err(ParseError::unsupported(token.span, "function types"));
                }
                inner
            }
            TokenKind::Str(_) | TokenKind::Number(_) => {
                return Err(ParseError::unsupported(token.span, "literal types"));
            }
            _ => return Err(self.error_here("a type")),
        };
        Ok(UnionMember::Type(ty))
    }

    /// `<T>` after `Promise`, `Array` or `ReadonlyArray`.
    fn type_argument(&mut self, name: &str, span: Span) -> Result<TypeExpr, ParseError> {
        if !self.is_punct('<') {
            return Err(ParseError::unsupported(
                span,
                format!("`{name}` without a type argument"),
            ));
        }
        self.advance();
        let inner = self.ty()?;
        if self.is_punct(',') {
            return Err(ParseError::unsupported(
                self.peek().span,
                format!("`{name}` takes exactly one type argument"),
            ));
        }
        self.expect_punct('>')?;
        Ok(inner)
    }
}

/// `name?: T` reads as `T | null`; an explicit `T | null` stays single-wrapped.
fn make_optional(ty: TypeExpr) -> TypeExpr {
    match ty {
        TypeExpr::Nullable(_) => ty,
        other => TypeExpr::Nullable(Box::new(other)),
    }
}

/// Object shapes hold properties only, and never asynchronous values.
fn object_fields(members: Vec<Member>, owner: &str) -> Result<Vec<FieldDecl>, ParseError> {
    let mut fields = Vec::new();
    for member in members {
        match member {
            Member::Property(field) => {
                if field.ty.contains_promise() {
                    return Err(ParseError::unsupported(
                        field.span,
                        format!("`Promise` in field `{}` of {owner}", field.name),
                    ));
                }
                fields.push(field);
            }
            Member::Method(method) => {
                return Err(ParseError::unsupported(
                    method.span,
                    format!("method `{}` in object type {owner}", method.name),
                ));
            }
        }
    }
    Ok(fields)
}

fn validate_registration(
    declarations: &[Declaration],
    registration: Option<&Registration>,
) -> Result<(), ParseError> {
    if let Some(registration) = registration {
        match declarations
            .iter()
            .find(|decl| decl.name() == registration.interface)
        {
            Some(Declaration::Module(_)) => {}
            Some(_) => {
                return Err(ParseError::new(
                    ParseErrorKind::InvalidRegistration,
                    registration.span,
                    format!("`{}` is not a module interface", registration.interface),
                ));
            }
            None => {
                return Err(ParseError::new(
                    ParseErrorKind::InvalidRegistration,
                    registration.span,
                    format!("`{}` is not declared in this unit", registration.interface),
                ));
            }
        }
    }

    for decl in declarations {
        if let Declaration::Module(module) = decl {
            let registered = registration.is_some_and(|r| r.interface == module.name);
            if !registered {
                return Err(ParseError::new(
                    ParseErrorKind::MissingRegistration,
                    module.span,
                    format!("module interface `{}` has no registration", module.name),
                ));
            }
        }
    }
    Ok(())
}
