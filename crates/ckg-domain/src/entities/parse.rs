//! Parsed-source entities: the output contract of the code parser.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Source language resolved from a file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceLanguage {
    /// TypeScript (`.ts`, `.mts`, `.cts`)
    TypeScript,
    /// TypeScript with JSX (`.tsx`)
    Tsx,
    /// JavaScript (`.js`, `.mjs`, `.cjs`, `.jsx`)
    JavaScript,
    /// C# (`.cs`), parsed out-of-process
    CSharp,
}

impl SourceLanguage {
    /// Resolve the language for a file name, if supported.
    #[must_use]
    pub fn from_file_name(file_name: &str) -> Option<Self> {
        let ext = file_name.rsplit('.').next()?.to_ascii_lowercase();
        match ext.as_str() {
            "ts" | "mts" | "cts" => Some(Self::TypeScript),
            "tsx" => Some(Self::Tsx),
            "js" | "mjs" | "cjs" | "jsx" => Some(Self::JavaScript),
            "cs" => Some(Self::CSharp),
            _ => None,
        }
    }

    /// Lowercase display name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TypeScript => "typescript",
            Self::Tsx => "tsx",
            Self::JavaScript => "javascript",
            Self::CSharp => "csharp",
        }
    }
}

/// Kind of extracted code entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    /// Free function or arrow function bound to a name
    Function,
    /// Method inside a class
    Method,
    /// Class declaration
    Class,
    /// Interface declaration
    Interface,
    /// Type alias declaration
    TypeAlias,
    /// Enum declaration
    Enum,
}

impl EntityKind {
    /// Graph label used when this entity becomes a node.
    #[must_use]
    pub fn node_label(&self) -> &'static str {
        match self {
            Self::Function | Self::Method => "Function",
            Self::Class => "Class",
            Self::Interface => "Interface",
            Self::TypeAlias => "TypeAlias",
            Self::Enum => "Enum",
        }
    }
}

/// A function or method parameter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    /// Parameter name
    pub name: String,
    /// Declared type annotation, when present
    #[serde(rename = "type")]
    pub type_annotation: Option<String>,
    /// Whether the parameter carries a default value
    pub has_default: bool,
    /// Whether the parameter is a rest (`...args`) parameter
    pub is_rest: bool,
}

/// An extracted code entity (function, class, interface, type alias, enum).
///
/// Kind-irrelevant fields keep their defaults; e.g. `extends` is only
/// populated for classes and interfaces.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodeEntity {
    /// Entity name; `<anonymous>` when anonymous extraction is enabled
    pub name: String,
    /// Entity kind
    pub kind: EntityKind,
    /// First line of the declaration (1-indexed)
    pub line_start: u32,
    /// Last line of the declaration (1-indexed)
    pub line_end: u32,
    /// Whether the entity is exported from its module
    pub is_exported: bool,
    /// Whether the function/method is `async`
    #[serde(default)]
    pub is_async: bool,
    /// Whether the function/method is a generator
    #[serde(default)]
    pub is_generator: bool,
    /// Whether the method is `static`
    #[serde(default)]
    pub is_static: bool,
    /// Whether the class is `abstract`
    #[serde(default)]
    pub is_abstract: bool,
    /// Function/method parameters
    #[serde(default)]
    pub parameters: Vec<Parameter>,
    /// Declared return type, when present
    #[serde(default)]
    pub return_type: Option<String>,
    /// Extended base class or interface, when present
    #[serde(default)]
    pub extends: Option<String>,
    /// Implemented interfaces
    #[serde(default)]
    pub implements: Vec<String>,
    /// Generic type parameters
    #[serde(default)]
    pub type_parameters: Vec<String>,
    /// Leading doc-comment block, verbatim
    #[serde(default)]
    pub documentation: Option<String>,
}

impl CodeEntity {
    /// Create an entity with the given name/kind/span and all flags defaulted.
    #[must_use]
    pub fn new(name: impl Into<String>, kind: EntityKind, line_start: u32, line_end: u32) -> Self {
        Self {
            name: name.into(),
            kind,
            line_start,
            line_end,
            is_exported: false,
            is_async: false,
            is_generator: false,
            is_static: false,
            is_abstract: false,
            parameters: Vec::new(),
            return_type: None,
            extends: None,
            implements: Vec::new(),
            type_parameters: Vec::new(),
            documentation: None,
        }
    }
}

/// An extracted import statement.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImportStatement {
    /// Import source specifier (module name or relative path)
    pub source: String,
    /// Default import binding, when present
    pub default_import: Option<String>,
    /// Namespace import binding (`* as ns`), when present
    pub namespace_import: Option<String>,
    /// Named imports, by their original names
    pub imported_names: Vec<String>,
    /// Alias map (original → alias) for renamed named imports
    pub aliases: BTreeMap<String, String>,
    /// Whether the source starts with `.`
    pub is_relative: bool,
    /// Whether this is an `import type` statement
    pub is_type_only: bool,
    /// Whether this is a bare side-effect import
    pub is_side_effect: bool,
}

/// An extracted export statement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportStatement {
    /// Exported binding name
    pub name: String,
    /// Kind of the exported entity, when it is a declaration export
    pub kind: Option<EntityKind>,
    /// Whether this is the default export
    pub is_default: bool,
    /// Whether this re-exports from another module
    pub is_reexport: bool,
    /// Re-export source, when present
    pub source: Option<String>,
}

/// An extracted call site.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallSite {
    /// Enclosing function name, or `<module>` at top level
    pub caller_name: String,
    /// Final callee identifier (e.g. `push` for `items.push(...)`)
    pub called_name: String,
    /// Full callee expression text (e.g. `items.push`)
    pub called_expression: String,
    /// Line of the call site (1-indexed)
    pub line_start: u32,
    /// Whether the call is syntactically awaited
    pub is_async: bool,
}

/// A recoverable syntax diagnostic produced while parsing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParseDiagnostic {
    /// Line of the error (1-indexed)
    pub line: u32,
    /// Column of the error (0-indexed, as reported by the grammar)
    pub column: u32,
    /// Human-readable description
    pub message: String,
    /// Whether the parser recovered and continued extraction
    pub recoverable: bool,
}

/// Full parse result for a single file.
///
/// The parser is error-tolerant: a file with syntax errors still reports
/// `success = true` together with a non-empty `errors` list and whatever
/// partial entities could be recovered.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParseResult {
    /// Extracted entities
    pub entities: Vec<CodeEntity>,
    /// Extracted imports
    pub imports: Vec<ImportStatement>,
    /// Extracted exports
    pub exports: Vec<ExportStatement>,
    /// Extracted call sites
    pub calls: Vec<CallSite>,
    /// Recoverable syntax diagnostics
    pub errors: Vec<ParseDiagnostic>,
    /// Detected language
    pub language: SourceLanguage,
    /// Wall-clock parse time in milliseconds
    pub parse_time_ms: u64,
    /// Whether a syntax tree was produced at all
    pub success: bool,
}

impl ParseResult {
    /// An empty, successful result for the given language.
    #[must_use]
    pub fn empty(language: SourceLanguage) -> Self {
        Self {
            entities: Vec::new(),
            imports: Vec::new(),
            exports: Vec::new(),
            calls: Vec::new(),
            errors: Vec::new(),
            language,
            parse_time_ms: 0,
            success: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn language_from_extension() {
        assert_eq!(
            SourceLanguage::from_file_name("src/a.ts"),
            Some(SourceLanguage::TypeScript)
        );
        assert_eq!(
            SourceLanguage::from_file_name("Widget.tsx"),
            Some(SourceLanguage::Tsx)
        );
        assert_eq!(
            SourceLanguage::from_file_name("util.cjs"),
            Some(SourceLanguage::JavaScript)
        );
        assert_eq!(
            SourceLanguage::from_file_name("Program.cs"),
            Some(SourceLanguage::CSharp)
        );
        assert_eq!(SourceLanguage::from_file_name("notes.md"), None);
        assert_eq!(SourceLanguage::from_file_name("Makefile"), None);
    }

    #[test]
    fn entity_kind_node_labels() {
        assert_eq!(EntityKind::Function.node_label(), "Function");
        assert_eq!(EntityKind::Method.node_label(), "Function");
        assert_eq!(EntityKind::TypeAlias.node_label(), "TypeAlias");
    }
}
