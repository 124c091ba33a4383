//! Tests for the tree-sitter TS/JS parser.

use ckg_domain::entities::{EntityKind, SourceLanguage};
use ckg_domain::ports::{CodeParser, ParserOptions};
use ckg_providers::parser::SourceCodeParser;

fn parser() -> SourceCodeParser {
    SourceCodeParser::new(ParserOptions::default())
}

#[tokio::test]
async fn parses_exported_function() {
    let result = parser()
        .parse("export function f(){}", "src/a.ts")
        .await
        .expect("parse succeeds");
    assert!(result.success);
    assert_eq!(result.language, SourceLanguage::TypeScript);
    let f = result
        .entities
        .iter()
        .find(|e| e.name == "f")
        .expect("function f extracted");
    assert_eq!(f.kind, EntityKind::Function);
    assert!(f.is_exported);
    assert_eq!(f.line_start, 1);
    assert_eq!(result.exports.len(), 1);
    assert_eq!(result.exports[0].name, "f");
}

#[tokio::test]
async fn extracts_function_signature_details() {
    let code = r#"
/** Adds things up. */
export async function sum(a: number, b: number = 1, ...rest: number[]): Promise<number> {
    return a + b;
}
"#;
    let result = parser().parse(code, "math.ts").await.expect("parse");
    let sum = result
        .entities
        .iter()
        .find(|e| e.name == "sum")
        .expect("sum extracted");
    assert!(sum.is_async);
    assert!(sum.is_exported);
    assert_eq!(sum.parameters.len(), 3);
    assert_eq!(sum.parameters[0].name, "a");
    assert_eq!(sum.parameters[0].type_annotation.as_deref(), Some("number"));
    assert!(sum.parameters[1].has_default);
    assert!(sum.parameters[2].is_rest);
    assert_eq!(sum.return_type.as_deref(), Some("Promise<number>"));
    assert_eq!(sum.documentation.as_deref(), Some("/** Adds things up. */"));
}

#[tokio::test]
async fn extracts_class_with_heritage_and_methods() {
    let code = r"
export abstract class Widget<T> extends Base implements Drawable, Sizable {
    static create(): Widget<string> { return null as any; }
    async render(): Promise<void> {}
}
";
    let result = parser().parse(code, "widget.ts").await.expect("parse");
    let class = result
        .entities
        .iter()
        .find(|e| e.name == "Widget")
        .expect("class extracted");
    assert_eq!(class.kind, EntityKind::Class);
    assert!(class.is_abstract);
    assert!(class.is_exported);
    assert_eq!(class.extends.as_deref(), Some("Base"));
    assert_eq!(class.implements, vec!["Drawable", "Sizable"]);
    assert!(!class.type_parameters.is_empty());

    let create = result
        .entities
        .iter()
        .find(|e| e.name == "create")
        .expect("static method extracted");
    assert_eq!(create.kind, EntityKind::Method);
    assert!(create.is_static);

    let render = result
        .entities
        .iter()
        .find(|e| e.name == "render")
        .expect("method extracted");
    assert!(render.is_async);
}

#[tokio::test]
async fn extracts_interfaces_enums_and_aliases() {
    let code = r"
export interface Shape { area(): number; }
type Alias = string | number;
enum Color { Red, Green }
";
    let result = parser().parse(code, "types.ts").await.expect("parse");
    let kinds: Vec<EntityKind> = result.entities.iter().map(|e| e.kind).collect();
    assert!(kinds.contains(&EntityKind::Interface));
    assert!(kinds.contains(&EntityKind::TypeAlias));
    assert!(kinds.contains(&EntityKind::Enum));
    let shape = result
        .entities
        .iter()
        .find(|e| e.name == "Shape")
        .expect("interface");
    assert!(shape.is_exported);
    let alias = result
        .entities
        .iter()
        .find(|e| e.name == "Alias")
        .expect("alias");
    assert!(!alias.is_exported);
}

#[tokio::test]
async fn extracts_imports_with_aliases_and_flags() {
    let code = r#"
import React from "react";
import * as path from "node:path";
import { readFile as read, writeFile } from "./fs-utils";
import type { Config } from "./config";
import "./side-effect";
"#;
    let result = parser().parse(code, "imports.ts").await.expect("parse");
    assert_eq!(result.imports.len(), 5);

    let react = &result.imports[0];
    assert_eq!(react.source, "react");
    assert_eq!(react.default_import.as_deref(), Some("React"));
    assert!(!react.is_relative);

    let path_import = &result.imports[1];
    assert_eq!(path_import.namespace_import.as_deref(), Some("path"));

    let named = &result.imports[2];
    assert!(named.is_relative);
    assert_eq!(named.imported_names, vec!["readFile", "writeFile"]);
    assert_eq!(named.aliases.get("readFile").map(String::as_str), Some("read"));

    let type_only = &result.imports[3];
    assert!(type_only.is_type_only);

    let side_effect = &result.imports[4];
    assert!(side_effect.is_side_effect);
    assert!(side_effect.is_relative);
}

#[tokio::test]
async fn extracts_calls_with_caller_and_await() {
    let code = r"
function outer() {
    items.push(1);
}
async function runner() {
    await fetchData();
}
top();
";
    let result = parser().parse(code, "calls.ts").await.expect("parse");
    let push = result
        .calls
        .iter()
        .find(|c| c.called_name == "push")
        .expect("member call");
    assert_eq!(push.caller_name, "outer");
    assert_eq!(push.called_expression, "items.push");
    assert!(!push.is_async);

    let fetched = result
        .calls
        .iter()
        .find(|c| c.called_name == "fetchData")
        .expect("awaited call");
    assert_eq!(fetched.caller_name, "runner");
    assert!(fetched.is_async);

    let top = result
        .calls
        .iter()
        .find(|c| c.called_name == "top")
        .expect("top-level call");
    assert_eq!(top.caller_name, "<module>");
}

#[tokio::test]
async fn syntax_errors_are_recoverable() {
    let code = "function broken( {\nexport function ok(){}\n";
    let result = parser().parse(code, "broken.ts").await.expect("parse");
    assert!(result.success);
    assert!(!result.errors.is_empty());
    assert!(result.errors.iter().all(|e| e.recoverable));
}

#[tokio::test]
async fn empty_content_yields_empty_result() {
    let result = parser().parse("", "empty.ts").await.expect("parse");
    assert!(result.success);
    assert!(result.entities.is_empty());
    assert!(result.imports.is_empty());
    assert!(result.exports.is_empty());
    assert!(result.errors.is_empty());
}

#[tokio::test]
async fn unsupported_extension_is_rejected() {
    let err = parser()
        .parse("body { color: red; }", "styles.css")
        .await
        .expect_err("css is unsupported");
    assert_eq!(err.code(), "LANGUAGE_NOT_SUPPORTED");
}

#[tokio::test]
async fn oversized_content_is_rejected() {
    let small = SourceCodeParser::new(ParserOptions {
        max_file_size_bytes: 16,
        ..ParserOptions::default()
    });
    let err = small
        .parse("export function tooLong(){}", "big.ts")
        .await
        .expect_err("over the limit");
    assert_eq!(err.code(), "FILE_TOO_LARGE_ERROR");
}

#[tokio::test]
async fn anonymous_functions_are_opt_in() {
    let code = "setTimeout(function () { tick(); }, 100);";
    let without = parser().parse(code, "anon.js").await.expect("parse");
    assert!(without.entities.iter().all(|e| e.name != "<anonymous>"));

    let with_anonymous = SourceCodeParser::new(ParserOptions {
        include_anonymous: true,
        ..ParserOptions::default()
    });
    let result = with_anonymous.parse(code, "anon.js").await.expect("parse");
    assert!(result.entities.iter().any(|e| e.name == "<anonymous>"));
}

#[tokio::test]
async fn arrow_bindings_become_named_functions() {
    let code = "export const handler = async (req: Request) => { return req; };";
    let result = parser().parse(code, "handler.ts").await.expect("parse");
    let handler = result
        .entities
        .iter()
        .find(|e| e.name == "handler")
        .expect("bound arrow extracted");
    assert_eq!(handler.kind, EntityKind::Function);
    assert!(handler.is_async);
    assert!(handler.is_exported);
}

#[tokio::test]
async fn javascript_variants_parse() {
    for file in ["a.js", "b.mjs", "c.cjs", "d.jsx"] {
        let result = parser()
            .parse("function f() { return 1; }", file)
            .await
            .expect("parse");
        assert_eq!(result.language, SourceLanguage::JavaScript, "{file}");
        assert!(result.entities.iter().any(|e| e.name == "f"));
    }
}
