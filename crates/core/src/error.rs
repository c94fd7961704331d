//! Error types for every stage of the codegen pipeline.
//!
//! ```text
//! Error (fatal to a run)
//! ├── Config / Manifest / Io / Cancelled
//! └── Failed(Vec<Diagnostic>)       - collected per-unit failures
//!
//! CodegenError (local to one unit or one module/platform pair)
//! └── Parse(ParseError)             - with ParseErrorKind
//! ```

use modgen_common::{ConfigError, Platform};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

use crate::manifest::ManifestError;

/// 1-based source position within a spec unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Span {
    /// Line, starting at 1
    pub line: u32,
    /// Column in characters, starting at 1
    pub col: u32,
}

impl Span {
    /// Span at `line:col`.
    pub fn new(line: u32, col: u32) -> Self {
        Self { line, col }
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.col)
    }
}

/// Categories of parse errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParseErrorKind {
    /// A token the grammar does not allow here
    UnexpectedToken,
    /// Input ended in the middle of a construct
    UnexpectedEof,
    /// A declaration body was never closed
    UnterminatedDeclaration,
    /// A string literal was never closed
    UnterminatedString,
    /// A block comment was never closed
    UnterminatedComment,
    /// Valid TypeScript outside the supported subset
    UnsupportedConstruct,
    /// A module interface without an `export default` registration
    MissingRegistration,
    /// A registration that does not bind a module interface
    InvalidRegistration,
}

impl ParseErrorKind {
    /// Lowercase description used in messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            ParseErrorKind::UnexpectedToken => "unexpected token",
            ParseErrorKind::UnexpectedEof => "unexpected end of file",
            ParseErrorKind::UnterminatedDeclaration => "unterminated declaration",
            ParseErrorKind::UnterminatedString => "unterminated string",
            ParseErrorKind::UnterminatedComment => "unterminated comment",
            ParseErrorKind::UnsupportedConstruct => "unsupported construct",
            ParseErrorKind::MissingRegistration => "missing registration",
            ParseErrorKind::InvalidRegistration => "invalid registration",
        }
    }
}

impl fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A parse error with location and cause.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} at {span}: {message}")]
pub struct ParseError {
    /// Category
    pub kind: ParseErrorKind,
    /// Where the error was detected
    pub span: Span,
    /// Human readable detail
    pub message: String,
}

impl ParseError {
    /// Error of any kind.
    pub fn new(kind: ParseErrorKind, span: Span, message: impl Into<String>) -> Self {
        Self {
            kind,
            span,
            message: message.into(),
        }
    }

    /// `expected X, found Y` at `span`.
    pub fn unexpected_token(span: Span, found: &str, expected: &str) -> Self {
        Self::new(
            ParseErrorKind::UnexpectedToken,
            span,
            format!("expected {expected}, found {found}"),
        )
    }

    /// Input ended while `expected` was still required.
    pub fn unexpected_eof(span: Span, expected: &str) -> Self {
        Self::new(
            ParseErrorKind::UnexpectedEof,
            span,
            format!("expected {expected}"),
        )
    }

    /// A construct outside the supported subset.
    pub fn unsupported(span: Span, what: impl Into<String>) -> Self {
        Self::new(ParseErrorKind::UnsupportedConstruct, span, what)
    }

    /// Render the error with the offending source line and a caret.
    pub fn display_with_source(&self, source: &str) -> String {
        let mut output = format!("{} at {}\n  {}\n", self.kind, self.span, self.message);
        let line_index = self.span.line.saturating_sub(1) as usize;
        if let Some(line_text) = source.lines().nth(line_index) {
            output.push_str("  |\n");
            output.push_str(&format!("{:>3} | {}\n", self.span.line, line_text));
            let indent = " ".repeat(self.span.col.saturating_sub(1) as usize);
            output.push_str(&format!("    | {indent}^\n"));
        }
        output
    }
}

fn describe_candidates(candidates: &[String]) -> String {
    match candidates.len() {
        0 => "no declaration found".to_string(),
        _ => format!("ambiguous, declared in {}", candidates.join(", ")),
    }
}

/// Errors attributed to a single spec unit or a single (module, platform) emission.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodegenError {
    /// The unit could not be parsed
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// A type name matched no declaration, or more than one
    #[error("Unresolved type `{name}` referenced from {referenced_from} ({})", describe_candidates(.candidates))]
    UnresolvedType {
        /// Name as written
        name: String,
        /// Signature or declaration that uses the name
        referenced_from: String,
        /// Declaring units, sorted by (unit, declaration order)
        candidates: Vec<String>,
    },

    /// An object shape that contains itself
    #[error("Recursive object shape {}", .path.join(" -> "))]
    UnsupportedCycle {
        /// Shapes along the cycle, first repeated last
        path: Vec<String>,
    },

    /// Two variants of one enum share a name
    #[error("Duplicate variant `{variant}` in enum {enum_name}")]
    DuplicateVariant {
        /// Enum name
        enum_name: String,
        /// Repeated variant name
        variant: String,
    },

    /// Two methods of one module share a name
    #[error("Duplicate method `{method}` in module {module}")]
    DuplicateMethod {
        /// Registry name of the module
        module: String,
        /// Repeated method name
        method: String,
    },

    /// Two fields of one shape share a name
    #[error("Duplicate field `{field}` in {shape}")]
    DuplicateField {
        /// Shape name
        shape: String,
        /// Repeated field name
        field: String,
    },

    /// Two units register the same module name
    #[error("Module `{name}` is registered by more than one unit: {}", .units.join(", "))]
    DuplicateModule {
        /// Registry name
        name: String,
        /// Registering units, sorted
        units: Vec<String>,
    },

    /// `T | null | null` or `Promise<Promise<T>>` spelled out explicitly
    #[error("{wrapper} directly wrapped in {wrapper} at {context}")]
    InvalidNesting {
        /// `Nullable` or `Promise`
        wrapper: &'static str,
        /// Where the type was written
        context: String,
    },

    /// A method signature the IR cannot represent
    #[error("Invalid signature for {module}.{method}: {reason}")]
    InvalidSignature {
        /// Registry name of the module
        module: String,
        /// Method name
        method: String,
        /// What is wrong with it
        reason: String,
    },

    /// A type or name one emitter cannot express
    #[error("{ty} is not supported by the {platform} emitter")]
    UnsupportedOnPlatform {
        /// The offending type or name
        ty: String,
        /// Emitter that refused it
        platform: Platform,
    },
}

impl CodegenError {
    /// Taxonomy name shown to the operator.
    pub fn kind(&self) -> &'static str {
        match self {
            CodegenError::Parse(_) => "ParseError",
            CodegenError::UnresolvedType { .. } => "UnresolvedType",
            CodegenError::UnsupportedCycle { .. } => "UnsupportedCycle",
            CodegenError::DuplicateVariant { .. } => "DuplicateVariant",
            CodegenError::DuplicateMethod { .. } => "DuplicateMethod",
            CodegenError::DuplicateField { .. } => "DuplicateField",
            CodegenError::DuplicateModule { .. } => "DuplicateModule",
            CodegenError::InvalidNesting { .. } => "InvalidNesting",
            CodegenError::InvalidSignature { .. } => "InvalidSignature",
            CodegenError::UnsupportedOnPlatform { .. } => "UnsupportedOnPlatform",
        }
    }
}

/// One collected failure, attributed to the unit (or module) it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// Unit identity the failure is attributed to
    pub unit: String,
    /// Taxonomy name, see [`CodegenError::kind`]
    pub kind: &'static str,
    /// Rendered error
    pub message: String,
}

impl Diagnostic {
    /// Diagnostic for `error` attributed to `unit`.
    pub fn new(unit: impl Into<String>, error: &CodegenError) -> Self {
        Self {
            unit: unit.into(),
            kind: error.kind(),
            message: error.to_string(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: [{}] {}", self.unit, self.kind, self.message)
    }
}

/// Errors that abort a whole run.
#[derive(Debug, Error)]
pub enum Error {
    /// `modgen.toml` is missing or invalid
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The manifest could not be read or written
    #[error(transparent)]
    Manifest(#[from] ManifestError),

    /// Reading specs or writing outputs failed
    #[error("I/O error at {}: {source}", path.display())]
    Io {
        /// File or directory involved
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// A scaffold template failed to render
    #[error("Failed to render template {name}: {source}")]
    Template {
        /// Template name
        name: String,
        /// Underlying Tera error
        #[source]
        source: tera::Error,
    },

    /// The cancellation token fired
    #[error("Run cancelled")]
    Cancelled,

    /// Per-unit failures; nothing was changed on disk
    #[error("{} error(s) reported", .0.len())]
    Failed(Vec<Diagnostic>),

    /// `build` found drift or hand edits
    #[error("Generated code is out of date for: {}. Run `modgen codegen` first", .0.join(", "))]
    OutOfDate(Vec<String>),

    /// The build command could not start or exited unsuccessfully
    #[error("Build command `{command}` failed: {reason}")]
    Build {
        /// Command line as configured
        command: String,
        /// Spawn error or exit status
        reason: String,
    },

    /// `init` refuses to scaffold into a non-empty directory
    #[error("Directory {} already exists and is not empty", .0.display())]
    TargetNotEmpty(PathBuf),

    /// `init` was given a name that is not a valid package name
    #[error("Invalid package name `{0}`. Use only alphanumeric characters and dashes")]
    InvalidPackageName(String),
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }

    /// Collected diagnostics, if this is a `Failed` error.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        match self {
            Error::Failed(diagnostics) => diagnostics,
            _ => &[],
        }
    }
}

/// Result of an engine entry point.
pub type Result<T, E = Error> = std::result::Result<T, E>;

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_display_with_source_points_at_column() {
        let source = "interface Foo {\n  bar: Map<string>;\n}\n";
        let err = ParseError::unsupported(Span::new(2, 8), "generic type `Map`");
        let rendered = err.display_with_source(source);
        assert!(rendered.contains("  2 |   bar: Map<string>;"));
        assert!(rendered.contains("    |        ^"));
    }

    #[test]
    fn test_unresolved_type_message() {
        let missing = CodegenError::UnresolvedType {
            name: "TestObject".into(),
            referenced_from: "CrabyTest.objectMethod(arg)".into(),
            candidates: vec![],
        };
        assert_eq!(missing.kind(), "UnresolvedType");
        assert!(missing.to_string().contains("no declaration found"));

        let ambiguous = CodegenError::UnresolvedType {
            name: "TestObject".into(),
            referenced_from: "CrabyTest.objectMethod(arg)".into(),
            candidates: vec!["specs/a.ts".into(), "specs/b.ts".into()],
        };
        assert!(ambiguous.to_string().contains("specs/a.ts, specs/b.ts"));
    }

    #[test]
    fn test_diagnostic_display() {
        let err = CodegenError::DuplicateMethod {
            module: "Calculator".into(),
            method: "add".into(),
        };
        let diagnostic = Diagnostic::new("specs/NativeCalculator.ts", &err);
        assert_eq!(
            diagnostic.to_string(),
            "specs/NativeCalculator.ts: [DuplicateMethod] Duplicate method `add` in module Calculator"
        );
    }
}
