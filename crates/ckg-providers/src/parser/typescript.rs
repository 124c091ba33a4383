//! Tree-sitter extraction for TypeScript and JavaScript sources.
//!
//! Produces entities, imports, exports, and call sites from the concrete
//! syntax tree. The extraction is error-tolerant: ERROR and missing nodes
//! become diagnostics while recovery continues around them.

use std::collections::HashSet;
use std::time::Instant;

use tree_sitter::{Node, Parser};

use ckg_domain::constants::{ANONYMOUS_FUNCTION_NAME, MODULE_CALLER_NAME};
use ckg_domain::entities::{
    CallSite, CodeEntity, EntityKind, ExportStatement, ImportStatement, Parameter,
    ParseDiagnostic, ParseResult, SourceLanguage,
};
use ckg_domain::error::{Error, Result};
use ckg_domain::ports::ParserOptions;

/// Parse TS/JS content and extract the full [`ParseResult`].
pub fn parse_source(
    content: &str,
    language: SourceLanguage,
    options: &ParserOptions,
) -> Result<ParseResult> {
    let started = Instant::now();
    if content.trim().is_empty() {
        return Ok(ParseResult::empty(language));
    }

    let mut parser = Parser::new();
    let grammar = match language {
        SourceLanguage::TypeScript => tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
        SourceLanguage::Tsx => tree_sitter_typescript::LANGUAGE_TSX.into(),
        SourceLanguage::JavaScript => tree_sitter_javascript::LANGUAGE.into(),
        SourceLanguage::CSharp => {
            return Err(Error::parser_initialization(
                "C# is parsed out-of-process, not by the tree-sitter extractor",
            ));
        }
    };
    parser
        .set_language(&grammar)
        .map_err(|e| Error::parser_initialization(format!("grammar rejected: {e}")))?;

    let tree = parser
        .parse(content, None)
        .ok_or_else(|| Error::parser_initialization("parser produced no syntax tree"))?;

    let mut extractor = Extractor {
        source: content,
        options,
        entities: Vec::new(),
        imports: Vec::new(),
        exports: Vec::new(),
        calls: Vec::new(),
        errors: Vec::new(),
        caller_stack: Vec::new(),
        consumed: HashSet::new(),
    };
    extractor.walk(tree.root_node(), false);
    if extractor.errors.is_empty() && tree.root_node().has_error() {
        extractor.errors.push(ParseDiagnostic {
            line: 1,
            column: 0,
            message: "syntax error".to_owned(),
            recoverable: true,
        });
    }

    Ok(ParseResult {
        entities: extractor.entities,
        imports: extractor.imports,
        exports: extractor.exports,
        calls: extractor.calls,
        errors: extractor.errors,
        language,
        parse_time_ms: started.elapsed().as_millis() as u64,
        success: true,
    })
}

struct Extractor<'a> {
    source: &'a str,
    options: &'a ParserOptions,
    entities: Vec<CodeEntity>,
    imports: Vec<ImportStatement>,
    exports: Vec<ExportStatement>,
    calls: Vec<CallSite>,
    errors: Vec<ParseDiagnostic>,
    caller_stack: Vec<String>,
    /// Node ids of function expressions already bound to a declarator name
    consumed: HashSet<usize>,
}

impl<'a> Extractor<'a> {
    fn text(&self, node: Node<'_>) -> &'a str {
        node.utf8_text(self.source.as_bytes()).unwrap_or_default()
    }

    fn line(node: Node<'_>) -> u32 {
        node.start_position().row as u32 + 1
    }

    fn end_line(node: Node<'_>) -> u32 {
        node.end_position().row as u32 + 1
    }

    fn has_keyword(&self, node: Node<'_>, keyword: &str) -> bool {
        let mut cursor = node.walk();
        let found = node
            .children(&mut cursor)
            .any(|child| !child.is_named() && self.text(child) == keyword);
        found
    }

    fn walk(&mut self, node: Node<'_>, exported: bool) {
        if node.is_missing() {
            self.errors.push(ParseDiagnostic {
                line: Self::line(node),
                column: node.start_position().column as u32,
                message: format!("missing {}", node.kind()),
                recoverable: true,
            });
            return;
        }
        match node.kind() {
            "ERROR" => {
                self.errors.push(ParseDiagnostic {
                    line: Self::line(node),
                    column: node.start_position().column as u32,
                    message: "syntax error".to_owned(),
                    recoverable: true,
                });
                self.walk_children(node, exported);
            }
            "function_declaration" | "generator_function_declaration" => {
                self.extract_function(node, exported);
            }
            "class_declaration" | "abstract_class_declaration" => {
                self.extract_class(node, exported);
            }
            "interface_declaration" => self.extract_interface(node, exported),
            "type_alias_declaration" => self.extract_type_alias(node, exported),
            "enum_declaration" => self.extract_enum(node, exported),
            "lexical_declaration" | "variable_declaration" => {
                self.extract_declarators(node, exported);
            }
            "import_statement" => self.extract_import(node),
            "export_statement" => self.extract_export(node),
            "call_expression" => {
                self.extract_call(node);
                self.walk_children(node, false);
            }
            "arrow_function" | "function_expression" => {
                if self.options.include_anonymous && !self.consumed.contains(&node.id()) {
                    self.extract_anonymous(node);
                }
                self.walk_children(node, false);
            }
            _ => self.walk_children(node, exported),
        }
    }

    fn walk_children(&mut self, node: Node<'_>, exported: bool) {
        let mut cursor = node.walk();
        let children: Vec<Node<'_>> = node.children(&mut cursor).collect();
        for child in children {
            if child.is_named() || child.is_missing() {
                self.walk(child, exported);
            }
        }
    }

    /// Leading doc comment (block `/** */` or contiguous `//` run) directly
    /// above `node`, verbatim.
    fn doc_comment(&self, node: Node<'_>) -> Option<String> {
        if !self.options.extract_documentation {
            return None;
        }
        let mut lines: Vec<&str> = Vec::new();
        let mut current = node.prev_sibling()?;
        let mut expected_row = node.start_position().row;
        loop {
            if current.kind() != "comment" || current.end_position().row + 1 < expected_row {
                break;
            }
            let text = self.text(current);
            if text.starts_with("/**") {
                return Some(text.to_owned());
            }
            if !text.starts_with("//") {
                break;
            }
            lines.push(text);
            expected_row = current.start_position().row;
            let Some(previous) = current.prev_sibling() else {
                break;
            };
            current = previous;
        }
        if lines.is_empty() {
            None
        } else {
            lines.reverse();
            Some(lines.join("\n"))
        }
    }

    fn extract_parameters(&self, node: Node<'_>) -> Vec<Parameter> {
        let Some(params_node) = node.child_by_field_name("parameters") else {
            return Vec::new();
        };
        let mut cursor = params_node.walk();
        let mut parameters = Vec::new();
        for child in params_node.named_children(&mut cursor) {
            match child.kind() {
                "required_parameter" | "optional_parameter" => {
                    let name = child
                        .child_by_field_name("pattern")
                        .map(|p| self.text(p).to_owned())
                        .unwrap_or_default();
                    let is_rest = child
                        .child_by_field_name("pattern")
                        .is_some_and(|p| p.kind() == "rest_pattern");
                    parameters.push(Parameter {
                        name: name.trim_start_matches("...").to_owned(),
                        type_annotation: child
                            .child_by_field_name("type")
                            .map(|t| self.type_text(t)),
                        has_default: child.child_by_field_name("value").is_some(),
                        is_rest,
                    });
                }
                "identifier" | "shorthand_property_identifier_pattern" => {
                    parameters.push(Parameter {
                        name: self.text(child).to_owned(),
                        type_annotation: None,
                        has_default: false,
                        is_rest: false,
                    });
                }
                "assignment_pattern" => {
                    let name = child
                        .child_by_field_name("left")
                        .map(|l| self.text(l).to_owned())
                        .unwrap_or_default();
                    parameters.push(Parameter {
                        name,
                        type_annotation: None,
                        has_default: true,
                        is_rest: false,
                    });
                }
                "rest_pattern" => {
                    let name = self.text(child).trim_start_matches("...").to_owned();
                    parameters.push(Parameter {
                        name,
                        type_annotation: None,
                        has_default: false,
                        is_rest: true,
                    });
                }
                "object_pattern" | "array_pattern" => {
                    parameters.push(Parameter {
                        name: self.text(child).to_owned(),
                        type_annotation: None,
                        has_default: false,
                        is_rest: false,
                    });
                }
                _ => {}
            }
        }
        parameters
    }

    /// Text of a type annotation with the leading `:` stripped.
    fn type_text(&self, node: Node<'_>) -> String {
        self.text(node)
            .trim_start_matches(':')
            .trim()
            .to_owned()
    }

    fn type_parameters(&self, node: Node<'_>) -> Vec<String> {
        let Some(tp) = node.child_by_field_name("type_parameters") else {
            return Vec::new();
        };
        let mut cursor = tp.walk();
        tp.named_children(&mut cursor)
            .map(|child| self.text(child).to_owned())
            .collect()
    }

    fn is_export_context(node: Node<'_>) -> bool {
        node.parent().is_some_and(|p| p.kind() == "export_statement")
    }

    fn extract_function(&mut self, node: Node<'_>, exported: bool) {
        let name = node
            .child_by_field_name("name")
            .map(|n| self.text(n).to_owned())
            .unwrap_or_default();
        if name.is_empty() {
            return;
        }
        let doc_anchor = node
            .parent()
            .filter(|p| p.kind() == "export_statement")
            .unwrap_or(node);
        let mut entity = CodeEntity::new(
            name.clone(),
            EntityKind::Function,
            Self::line(node),
            Self::end_line(node),
        );
        entity.is_exported = exported || Self::is_export_context(node);
        entity.is_async = self.has_keyword(node, "async");
        entity.is_generator = node.kind() == "generator_function_declaration"
            || self.has_keyword(node, "*");
        entity.parameters = self.extract_parameters(node);
        entity.return_type = node
            .child_by_field_name("return_type")
            .map(|t| self.type_text(t));
        entity.type_parameters = self.type_parameters(node);
        entity.documentation = self.doc_comment(doc_anchor);
        self.entities.push(entity);

        self.caller_stack.push(name);
        if let Some(body) = node.child_by_field_name("body") {
            self.walk_children(body, false);
        }
        self.caller_stack.pop();
    }

    fn extract_class(&mut self, node: Node<'_>, exported: bool) {
        let name = node
            .child_by_field_name("name")
            .map(|n| self.text(n).to_owned())
            .unwrap_or_default();
        if name.is_empty() {
            return;
        }
        let doc_anchor = node
            .parent()
            .filter(|p| p.kind() == "export_statement")
            .unwrap_or(node);
        let mut entity = CodeEntity::new(
            name.clone(),
            EntityKind::Class,
            Self::line(node),
            Self::end_line(node),
        );
        entity.is_exported = exported || Self::is_export_context(node);
        entity.is_abstract =
            node.kind() == "abstract_class_declaration" || self.has_keyword(node, "abstract");
        entity.type_parameters = self.type_parameters(node);
        entity.documentation = self.doc_comment(doc_anchor);

        // extends / implements live under class_heritage
        if let Some(heritage) = self.find_child(node, "class_heritage") {
            if let Some(extends) = self.find_child(heritage, "extends_clause") {
                entity.extends = extends
                    .named_child(0)
                    .map(|n| self.text(n).to_owned());
            } else {
                // JS grammar: class_heritage is `extends <expr>` directly
                entity.extends = heritage.named_child(0).map(|n| self.text(n).to_owned());
            }
            if let Some(implements) = self.find_child(heritage, "implements_clause") {
                let mut cursor = implements.walk();
                entity.implements = implements
                    .named_children(&mut cursor)
                    .map(|n| self.text(n).to_owned())
                    .collect();
            }
        }
        self.entities.push(entity);

        if let Some(body) = node.child_by_field_name("body") {
            self.extract_methods(body, &name);
        }
    }

    fn extract_methods(&mut self, class_body: Node<'_>, class_name: &str) {
        let mut cursor = class_body.walk();
        let methods: Vec<Node<'_>> = class_body.named_children(&mut cursor).collect();
        for member in methods {
            match member.kind() {
                "method_definition" | "abstract_method_signature" => {
                    let name = member
                        .child_by_field_name("name")
                        .map(|n| self.text(n).to_owned())
                        .unwrap_or_default();
                    if name.is_empty() {
                        continue;
                    }
                    let mut entity = CodeEntity::new(
                        name.clone(),
                        EntityKind::Method,
                        Self::line(member),
                        Self::end_line(member),
                    );
                    entity.is_async = self.has_keyword(member, "async");
                    entity.is_generator = self.has_keyword(member, "*");
                    entity.is_static = self.has_keyword(member, "static");
                    entity.is_abstract = member.kind() == "abstract_method_signature";
                    entity.parameters = self.extract_parameters(member);
                    entity.return_type = member
                        .child_by_field_name("return_type")
                        .map(|t| self.type_text(t));
                    entity.documentation = self.doc_comment(member);
                    self.entities.push(entity);

                    self.caller_stack.push(format!("{class_name}.{name}"));
                    if let Some(body) = member.child_by_field_name("body") {
                        self.walk_children(body, false);
                    }
                    self.caller_stack.pop();
                }
                _ => self.walk(member, false),
            }
        }
    }

    fn extract_interface(&mut self, node: Node<'_>, exported: bool) {
        let name = node
            .child_by_field_name("name")
            .map(|n| self.text(n).to_owned())
            .unwrap_or_default();
        if name.is_empty() {
            return;
        }
        let mut entity = CodeEntity::new(
            name,
            EntityKind::Interface,
            Self::line(node),
            Self::end_line(node),
        );
        entity.is_exported = exported || Self::is_export_context(node);
        entity.type_parameters = self.type_parameters(node);
        if let Some(extends) = self.find_child(node, "extends_type_clause") {
            entity.extends = extends.named_child(0).map(|n| self.text(n).to_owned());
        }
        entity.documentation = self.doc_comment(
            node.parent()
                .filter(|p| p.kind() == "export_statement")
                .unwrap_or(node),
        );
        self.entities.push(entity);
    }

    fn extract_type_alias(&mut self, node: Node<'_>, exported: bool) {
        let name = node
            .child_by_field_name("name")
            .map(|n| self.text(n).to_owned())
            .unwrap_or_default();
        if name.is_empty() {
            return;
        }
        let mut entity = CodeEntity::new(
            name,
            EntityKind::TypeAlias,
            Self::line(node),
            Self::end_line(node),
        );
        entity.is_exported = exported || Self::is_export_context(node);
        entity.type_parameters = self.type_parameters(node);
        self.entities.push(entity);
    }

    fn extract_enum(&mut self, node: Node<'_>, exported: bool) {
        let name = node
            .child_by_field_name("name")
            .map(|n| self.text(n).to_owned())
            .unwrap_or_default();
        if name.is_empty() {
            return;
        }
        let mut entity = CodeEntity::new(
            name,
            EntityKind::Enum,
            Self::line(node),
            Self::end_line(node),
        );
        entity.is_exported = exported || Self::is_export_context(node);
        self.entities.push(entity);
    }

    /// `const f = () => ...` and `const f = function () {}` become named
    /// function entities.
    fn extract_declarators(&mut self, node: Node<'_>, exported: bool) {
        let mut cursor = node.walk();
        let declarators: Vec<Node<'_>> = node
            .named_children(&mut cursor)
            .filter(|child| child.kind() == "variable_declarator")
            .collect();
        for declarator in declarators {
            let Some(value) = declarator.child_by_field_name("value") else {
                continue;
            };
            let named_function = matches!(value.kind(), "arrow_function" | "function_expression")
                && declarator
                    .child_by_field_name("name")
                    .is_some_and(|n| n.kind() == "identifier");
            if !named_function {
                // Plain initializers still carry call sites.
                self.walk(value, false);
                continue;
            }
            let Some(name_node) = declarator.child_by_field_name("name") else {
                continue;
            };
            self.consumed.insert(value.id());
            let name = self.text(name_node).to_owned();
            let doc_anchor = node
                .parent()
                .filter(|p| p.kind() == "export_statement")
                .unwrap_or(node);
            let mut entity = CodeEntity::new(
                name.clone(),
                EntityKind::Function,
                Self::line(declarator),
                Self::end_line(declarator),
            );
            entity.is_exported = exported || Self::is_export_context(node);
            entity.is_async = self.has_keyword(value, "async");
            entity.parameters = self.extract_parameters(value);
            entity.return_type = value
                .child_by_field_name("return_type")
                .map(|t| self.type_text(t));
            entity.documentation = self.doc_comment(doc_anchor);
            self.entities.push(entity);

            self.caller_stack.push(name);
            if let Some(body) = value.child_by_field_name("body") {
                self.walk(body, false);
            }
            self.caller_stack.pop();
        }
    }

    fn extract_anonymous(&mut self, node: Node<'_>) {
        let mut entity = CodeEntity::new(
            ANONYMOUS_FUNCTION_NAME,
            EntityKind::Function,
            Self::line(node),
            Self::end_line(node),
        );
        entity.is_async = self.has_keyword(node, "async");
        entity.parameters = self.extract_parameters(node);
        self.entities.push(entity);
    }

    fn extract_import(&mut self, node: Node<'_>) {
        let Some(source_node) = node.child_by_field_name("source") else {
            return;
        };
        let source = self.text(source_node).trim_matches(['"', '\'']).to_owned();
        let mut import = ImportStatement {
            is_relative: source.starts_with('.'),
            is_type_only: self.has_keyword(node, "type"),
            source,
            ..ImportStatement::default()
        };

        let mut has_clause = false;
        if let Some(clause) = self.find_child(node, "import_clause") {
            has_clause = true;
            let mut cursor = clause.walk();
            let clause_children: Vec<Node<'_>> = clause.named_children(&mut cursor).collect();
            for child in clause_children {
                match child.kind() {
                    "identifier" => import.default_import = Some(self.text(child).to_owned()),
                    "namespace_import" => {
                        import.namespace_import = child
                            .named_child(0)
                            .map(|n| self.text(n).to_owned());
                    }
                    "named_imports" => {
                        let mut inner = child.walk();
                        for specifier in child.named_children(&mut inner) {
                            if specifier.kind() != "import_specifier" {
                                continue;
                            }
                            let Some(name) = specifier
                                .child_by_field_name("name")
                                .map(|n| self.text(n).to_owned())
                            else {
                                continue;
                            };
                            if let Some(alias) = specifier
                                .child_by_field_name("alias")
                                .map(|a| self.text(a).to_owned())
                            {
                                import.aliases.insert(name.clone(), alias);
                            }
                            import.imported_names.push(name);
                        }
                    }
                    _ => {}
                }
            }
        }
        import.is_side_effect = !has_clause;
        self.imports.push(import);
    }

    fn extract_export(&mut self, node: Node<'_>) {
        let is_default = self.has_keyword(node, "default");
        let source = node
            .child_by_field_name("source")
            .map(|s| self.text(s).trim_matches(['"', '\'']).to_owned());

        if let Some(declaration) = node.child_by_field_name("declaration") {
            let kind = match declaration.kind() {
                "function_declaration" | "generator_function_declaration" => {
                    Some(EntityKind::Function)
                }
                "class_declaration" | "abstract_class_declaration" => Some(EntityKind::Class),
                "interface_declaration" => Some(EntityKind::Interface),
                "type_alias_declaration" => Some(EntityKind::TypeAlias),
                "enum_declaration" => Some(EntityKind::Enum),
                _ => None,
            };
            let name = declaration
                .child_by_field_name("name")
                .map(|n| self.text(n).to_owned())
                .unwrap_or_default();
            if !name.is_empty() {
                self.exports.push(ExportStatement {
                    name,
                    kind,
                    is_default,
                    is_reexport: false,
                    source: None,
                });
            } else if matches!(
                declaration.kind(),
                "lexical_declaration" | "variable_declaration"
            ) {
                let mut cursor = declaration.walk();
                let bindings: Vec<(String, bool)> = declaration
                    .named_children(&mut cursor)
                    .filter(|child| child.kind() == "variable_declarator")
                    .filter_map(|declarator| {
                        let name = declarator
                            .child_by_field_name("name")
                            .filter(|n| n.kind() == "identifier")
                            .map(|n| self.text(n).to_owned())?;
                        let is_function = declarator.child_by_field_name("value").is_some_and(
                            |v| matches!(v.kind(), "arrow_function" | "function_expression"),
                        );
                        Some((name, is_function))
                    })
                    .collect();
                for (name, is_function) in bindings {
                    self.exports.push(ExportStatement {
                        name,
                        kind: is_function.then_some(EntityKind::Function),
                        is_default,
                        is_reexport: false,
                        source: None,
                    });
                }
            }
            self.walk(declaration, true);
            return;
        }

        if let Some(clause) = self.find_child(node, "export_clause") {
            let mut cursor = clause.walk();
            for specifier in clause.named_children(&mut cursor) {
                if specifier.kind() != "export_specifier" {
                    continue;
                }
                let Some(name) = specifier
                    .child_by_field_name("name")
                    .map(|n| self.text(n).to_owned())
                else {
                    continue;
                };
                self.exports.push(ExportStatement {
                    name,
                    kind: None,
                    is_default,
                    is_reexport: source.is_some(),
                    source: source.clone(),
                });
            }
            return;
        }

        // `export default <expression>` and `export * from '...'`
        if is_default {
            if let Some(value) = node.child_by_field_name("value") {
                self.exports.push(ExportStatement {
                    name: self.text(value).to_owned(),
                    kind: None,
                    is_default: true,
                    is_reexport: false,
                    source: None,
                });
            }
        } else if let Some(reexport_source) = source {
            self.exports.push(ExportStatement {
                name: "*".to_owned(),
                kind: None,
                is_default: false,
                is_reexport: true,
                source: Some(reexport_source),
            });
        }
        self.walk_children(node, true);
    }

    fn extract_call(&mut self, node: Node<'_>) {
        let Some(function) = node.child_by_field_name("function") else {
            return;
        };
        let called_expression = self.text(function).to_owned();
        let called_name = match function.kind() {
            "member_expression" => function
                .child_by_field_name("property")
                .map(|p| self.text(p).to_owned())
                .unwrap_or_else(|| called_expression.clone()),
            _ => called_expression.clone(),
        };
        let is_async = node
            .parent()
            .is_some_and(|p| p.kind() == "await_expression");
        self.calls.push(CallSite {
            caller_name: self
                .caller_stack
                .last()
                .cloned()
                .unwrap_or_else(|| MODULE_CALLER_NAME.to_owned()),
            called_name,
            called_expression,
            line_start: Self::line(node),
            is_async,
        });
    }

    fn find_child<'tree>(&self, node: Node<'tree>, kind: &str) -> Option<Node<'tree>> {
        let mut cursor = node.walk();
        let found = node.children(&mut cursor).find(|child| child.kind() == kind);
        found
    }
}
