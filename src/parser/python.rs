// Python source analyzer using tree-sitter
//
// Parses a file, walks the whole tree (not just the top level) and extracts
// classes, functions and imports. tree-sitter never rejects input, so a tree
// containing ERROR or MISSING nodes is reported as a syntax failure.

use crate::error::{Error, Result};
use crate::parser::ast::*;
use std::path::Path;
use tree_sitter::{Node, Parser};

/// Parser for Python source files
pub struct PythonParser {
    parser: Parser,
}

impl PythonParser {
    /// Create a new Python parser
    pub fn new() -> Result<Self> {
        let mut parser = Parser::new();
        let language = tree_sitter_python::language();
        parser
            .set_language(&language)
            .map_err(|e| Error::parser(format!("Failed to set Python language: {}", e)))?;
        Ok(Self { parser })
    }

    /// Analyze a Python file on disk
    ///
    /// Unreadable and non-UTF-8 files yield a failed analysis.
    pub fn analyze_file(&mut self, path: &Path) -> SourceAnalysis {
        let bytes = match std::fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) => return SourceAnalysis::failed(path, format!("cannot read file: {}", e)),
        };
        match String::from_utf8(bytes) {
            Ok(source) => self.analyze_source(&source, path),
            Err(_) => SourceAnalysis::failed(path, "file is not valid UTF-8"),
        }
    }

    /// Analyze Python source text
    pub fn analyze_source(&mut self, source: &str, path: &Path) -> SourceAnalysis {
        let Some(tree) = self.parser.parse(source, None) else {
            return SourceAnalysis::failed(path, "parser produced no tree");
        };

        let root = tree.root_node();
        if root.has_error() {
            let message = match first_error(root) {
                Some(node) => {
                    let pos = node.start_position();
                    format!("syntax error at line {}, column {}", pos.row + 1, pos.column + 1)
                }
                None => "syntax error".to_string(),
            };
            tracing::debug!("{}: {}", path.display(), message);
            return SourceAnalysis::failed(path, message);
        }

        let src = source.as_bytes();
        let mut info = SourceFileInfo::new(path);
        info.line_count = source.split('\n').count();
        info.module_docstring = body_docstring(root, src).unwrap_or_default();

        let mut cursor = root.walk();
        for child in root.named_children(&mut cursor) {
            walk(child, src, false, &mut info);
        }

        SourceAnalysis::Parsed(info)
    }
}

/// Analyze source text with a fresh parser
pub fn analyze_source(source: &str, path: &Path) -> SourceAnalysis {
    match PythonParser::new() {
        Ok(mut parser) => parser.analyze_source(source, path),
        Err(e) => SourceAnalysis::failed(path, e.to_string()),
    }
}

/// Analyze a file on disk with a fresh parser
pub fn analyze_file(path: &Path) -> SourceAnalysis {
    match PythonParser::new() {
        Ok(mut parser) => parser.analyze_file(path),
        Err(e) => SourceAnalysis::failed(path, e.to_string()),
    }
}

/// First ERROR or MISSING node in document order
fn first_error(node: Node) -> Option<Node> {
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if child.has_error() || child.is_missing() {
            if let Some(found) = first_error(child) {
                return Some(found);
            }
        }
    }
    None
}

/// Node text, or its S-expression when the text can't be taken
fn text(node: Node, src: &[u8]) -> String {
    node.utf8_text(src)
        .map(str::to_string)
        .unwrap_or_else(|_| node.to_sexp())
}

/// Collect definitions and imports below `node`
///
/// `in_class_body` is set only for direct statements of a class body, which
/// is what makes a function a method.
fn walk(node: Node, src: &[u8], in_class_body: bool, info: &mut SourceFileInfo) {
    match node.kind() {
        "decorated_definition" => {
            let decorators = decorator_names(node, src);
            if let Some(definition) = node.child_by_field_name("definition") {
                visit_definition(definition, decorators, src, in_class_body, info);
            }
        }
        "class_definition" | "function_definition" => {
            visit_definition(node, Vec::new(), src, in_class_body, info);
        }
        "import_statement" => info.imports.push(import_statement(node, src)),
        "import_from_statement" => info.imports.push(import_from_statement(node, src)),
        _ => {
            let mut cursor = node.walk();
            for child in node.named_children(&mut cursor) {
                walk(child, src, false, info);
            }
        }
    }
}

fn visit_definition(
    node: Node,
    decorators: Vec<String>,
    src: &[u8],
    in_class_body: bool,
    info: &mut SourceFileInfo,
) {
    let body = node.child_by_field_name("body");

    match node.kind() {
        "class_definition" => {
            info.classes.push(class_info(node, decorators, src));
            if let Some(body) = body {
                let mut cursor = body.walk();
                for stmt in body.named_children(&mut cursor) {
                    walk(stmt, src, true, info);
                }
            }
        }
        "function_definition" => {
            if !in_class_body {
                info.functions.push(function_info(node, decorators, src));
            }
            if let Some(body) = body {
                let mut cursor = body.walk();
                for stmt in body.named_children(&mut cursor) {
                    walk(stmt, src, false, info);
                }
            }
        }
        _ => {}
    }
}

fn class_info(node: Node, decorators: Vec<String>, src: &[u8]) -> ClassInfo {
    let mut class = ClassInfo {
        name: node
            .child_by_field_name("name")
            .map(|n| text(n, src))
            .unwrap_or_default(),
        line_start: node.start_position().row + 1,
        line_end: node.end_position().row + 1,
        decorators,
        ..ClassInfo::default()
    };

    if let Some(superclasses) = node.child_by_field_name("superclasses") {
        let mut cursor = superclasses.walk();
        for base in superclasses.named_children(&mut cursor) {
            match base.kind() {
                "keyword_argument" | "comment" => {}
                _ => class.bases.push(dotted_name(base, src)),
            }
        }
    }

    if let Some(body) = node.child_by_field_name("body") {
        class.docstring = body_docstring(body, src);

        let mut cursor = body.walk();
        for stmt in body.named_children(&mut cursor) {
            match stmt.kind() {
                "function_definition" => {
                    class.methods.push(function_info(stmt, Vec::new(), src));
                }
                "decorated_definition" => {
                    if let Some(def) = stmt.child_by_field_name("definition") {
                        if def.kind() == "function_definition" {
                            class.methods.push(function_info(def, decorator_names(stmt, src), src));
                        }
                    }
                }
                "expression_statement" => assigned_names(stmt, src, &mut class.attributes),
                _ => {}
            }
        }
    }

    class
}

/// Simple names assigned by `x = ...`, `x: T = ...`, `x: T` and chains
fn assigned_names(stmt: Node, src: &[u8], out: &mut Vec<String>) {
    let mut cursor = stmt.walk();
    for child in stmt.named_children(&mut cursor) {
        let mut current = Some(child);
        while let Some(assignment) = current.filter(|n| n.kind() == "assignment") {
            if let Some(left) = assignment.child_by_field_name("left") {
                if left.kind() == "identifier" {
                    out.push(text(left, src));
                }
            }
            current = assignment.child_by_field_name("right");
        }
    }
}

fn function_info(node: Node, decorators: Vec<String>, src: &[u8]) -> FunctionInfo {
    let mut cursor = node.walk();
    let is_async = node.children(&mut cursor).any(|c| c.kind() == "async");

    FunctionInfo {
        name: node
            .child_by_field_name("name")
            .map(|n| text(n, src))
            .unwrap_or_default(),
        docstring: node
            .child_by_field_name("body")
            .and_then(|body| body_docstring(body, src)),
        args: node
            .child_by_field_name("parameters")
            .map(|p| parameters(p, src))
            .unwrap_or_default(),
        returns: node.child_by_field_name("return_type").map(|t| text(t, src)),
        line_start: node.start_position().row + 1,
        line_end: node.end_position().row + 1,
        decorators,
        is_async,
    }
}

/// Decorator names without `@` and call arguments
fn decorator_names(node: Node, src: &[u8]) -> Vec<String> {
    let mut cursor = node.walk();
    node.children(&mut cursor)
        .filter(|c| c.kind() == "decorator")
        .filter_map(|dec| dec.named_child(0).map(|expr| dotted_name(expr, src)))
        .collect()
}

/// Dotted path of a name-like expression; calls resolve to the callee
fn dotted_name(node: Node, src: &[u8]) -> String {
    match node.kind() {
        "call" => node
            .child_by_field_name("function")
            .map(|f| dotted_name(f, src))
            .unwrap_or_else(|| text(node, src)),
        "identifier" | "attribute" => text(node, src)
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect(),
        _ => text(node, src),
    }
}

fn parameters(node: Node, src: &[u8]) -> Vec<ArgInfo> {
    let mut args: Vec<ArgInfo> = Vec::new();
    let mut keyword_only = false;

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        let regular = if keyword_only {
            ArgKind::KeywordOnly
        } else {
            ArgKind::Regular
        };

        match child.kind() {
            "identifier" => args.push(ArgInfo {
                kind: regular,
                ..ArgInfo::new(&text(child, src))
            }),
            "typed_parameter" => {
                let annotation = child.child_by_field_name("type").map(|t| text(t, src));
                let mut arg = match child.named_child(0) {
                    Some(inner) if inner.kind() == "list_splat_pattern" => {
                        keyword_only = true;
                        ArgInfo {
                            kind: ArgKind::VarArgs,
                            ..ArgInfo::new(&splat_name(inner, src))
                        }
                    }
                    Some(inner) if inner.kind() == "dictionary_splat_pattern" => ArgInfo {
                        kind: ArgKind::VarKwargs,
                        ..ArgInfo::new(&splat_name(inner, src))
                    },
                    Some(inner) => ArgInfo {
                        kind: regular,
                        ..ArgInfo::new(&text(inner, src))
                    },
                    None => continue,
                };
                arg.annotation = annotation;
                args.push(arg);
            }
            "default_parameter" | "typed_default_parameter" => {
                let Some(name) = child.child_by_field_name("name") else {
                    continue;
                };
                args.push(ArgInfo {
                    name: text(name, src),
                    annotation: child.child_by_field_name("type").map(|t| text(t, src)),
                    default: child.child_by_field_name("value").map(|v| text(v, src)),
                    kind: regular,
                });
            }
            "list_splat_pattern" => {
                keyword_only = true;
                args.push(ArgInfo {
                    kind: ArgKind::VarArgs,
                    ..ArgInfo::new(&splat_name(child, src))
                });
            }
            "dictionary_splat_pattern" => args.push(ArgInfo {
                kind: ArgKind::VarKwargs,
                ..ArgInfo::new(&splat_name(child, src))
            }),
            "keyword_separator" | "*" => keyword_only = true,
            "positional_separator" | "/" => {
                for arg in args.iter_mut() {
                    if arg.kind == ArgKind::Regular {
                        arg.kind = ArgKind::PositionalOnly;
                    }
                }
            }
            _ => {}
        }
    }

    args
}

fn splat_name(node: Node, src: &[u8]) -> String {
    let mut cursor = node.walk();
    let name = node
        .named_children(&mut cursor)
        .find(|c| c.kind() == "identifier")
        .map(|id| text(id, src));
    name.unwrap_or_else(|| text(node, src).trim_start_matches('*').to_string())
}

fn import_statement(node: Node, src: &[u8]) -> ImportInfo {
    let mut cursor = node.walk();
    let names = node
        .children_by_field_name("name", &mut cursor)
        .map(|n| imported_name(n, src))
        .collect();
    ImportInfo::Import {
        names,
        line: node.start_position().row + 1,
    }
}

fn import_from_statement(node: Node, src: &[u8]) -> ImportInfo {
    let mut module = None;
    let mut level = 0;

    if let Some(module_node) = node.child_by_field_name("module_name") {
        if module_node.kind() == "relative_import" {
            let mut cursor = module_node.walk();
            for part in module_node.named_children(&mut cursor) {
                match part.kind() {
                    "import_prefix" => level = text(part, src).matches('.').count(),
                    "dotted_name" => module = Some(text(part, src)),
                    _ => {}
                }
            }
        } else {
            module = Some(text(module_node, src));
        }
    }

    let mut names: Vec<ImportedName> = {
        let mut cursor = node.walk();
        node.children_by_field_name("name", &mut cursor)
            .map(|n| imported_name(n, src))
            .collect()
    };

    let mut cursor = node.walk();
    if node
        .named_children(&mut cursor)
        .any(|c| c.kind() == "wildcard_import")
    {
        names.push(ImportedName::new("*"));
    }

    ImportInfo::From {
        module,
        names,
        level,
        line: node.start_position().row + 1,
    }
}

fn imported_name(node: Node, src: &[u8]) -> ImportedName {
    if node.kind() == "aliased_import" {
        let name = node
            .child_by_field_name("name")
            .map(|n| text(n, src))
            .unwrap_or_default();
        return match node.child_by_field_name("alias") {
            Some(alias) => ImportedName::with_alias(&name, &text(alias, src)),
            None => ImportedName::new(&name),
        };
    }
    ImportedName::new(&text(node, src))
}

/// Docstring of a module or block: a leading plain string statement
fn body_docstring(body: Node, src: &[u8]) -> Option<String> {
    let mut cursor = body.walk();
    let first = body
        .named_children(&mut cursor)
        .find(|c| c.kind() != "comment")?;
    if first.kind() != "expression_statement" || first.named_child_count() != 1 {
        return None;
    }
    let expr = first.named_child(0)?;
    let raw = match expr.kind() {
        "string" => string_value(&text(expr, src))?,
        "concatenated_string" => {
            let mut cursor = expr.walk();
            let parts: Option<Vec<String>> = expr
                .named_children(&mut cursor)
                .map(|part| string_value(&text(part, src)))
                .collect();
            parts?.concat()
        }
        _ => return None,
    };
    Some(clean_docstring(&raw))
}

/// Value of a plain string literal; `None` for bytes and f-strings
pub(crate) fn string_value(literal: &str) -> Option<String> {
    let prefix_len = literal
        .chars()
        .take_while(|c| c.is_ascii_alphabetic())
        .count();
    let prefix = literal[..prefix_len].to_lowercase();
    if prefix.contains('b') || prefix.contains('f') {
        return None;
    }
    let raw = prefix.contains('r');
    let quoted = &literal[prefix_len..];

    let body = if quoted.len() >= 6 && (quoted.starts_with("\"\"\"") || quoted.starts_with("'''")) {
        &quoted[3..quoted.len() - 3]
    } else if quoted.len() >= 2 {
        &quoted[1..quoted.len() - 1]
    } else {
        return None;
    };

    Some(if raw {
        body.to_string()
    } else {
        unescape_python(body)
    })
}

/// The common escape sequences; unknown ones are kept as written
fn unescape_python(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('\\') => out.push('\\'),
            Some('\'') => out.push('\''),
            Some('"') => out.push('"'),
            // line continuation
            Some('\n') => {}
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

/// Normalize docstring indentation
///
/// Leading whitespace of the first line is dropped, the common indentation
/// of the remaining lines is removed and blank lines at either end are
/// trimmed.
pub fn clean_docstring(doc: &str) -> String {
    let expanded = doc.replace('\t', "        ");
    let lines: Vec<&str> = expanded.split('\n').collect();

    let margin = lines
        .iter()
        .skip(1)
        .filter(|l| !l.trim().is_empty())
        .map(|l| l.chars().take_while(|c| c.is_whitespace()).count())
        .min()
        .unwrap_or(0);

    // margin counts characters, not bytes
    let mut cleaned: Vec<String> = Vec::with_capacity(lines.len());
    for (i, line) in lines.iter().enumerate() {
        if i == 0 {
            cleaned.push(line.trim_start().to_string());
        } else {
            let offset = line.char_indices().nth(margin).map_or(line.len(), |(at, _)| at);
            cleaned.push(line[offset..].to_string());
        }
    }

    while cleaned.first().is_some_and(|l| l.trim().is_empty()) {
        cleaned.remove(0);
    }
    while cleaned.last().is_some_and(|l| l.trim().is_empty()) {
        cleaned.pop();
    }

    cleaned.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(source: &str) -> SourceFileInfo {
        match analyze_source(source, Path::new("test.py")) {
            SourceAnalysis::Parsed(info) => info,
            SourceAnalysis::Failed(f) => panic!("unexpected failure: {}", f.error),
        }
    }

    #[test]
    fn test_parser_new() {
        let parser = PythonParser::new();
        assert!(parser.is_ok());
    }

    #[test]
    fn test_empty_file() {
        let info = parse("");
        assert!(info.classes.is_empty());
        assert!(info.functions.is_empty());
        assert_eq!(info.line_count, 1);
        assert_eq!(info.module_docstring, "");
    }

    #[test]
    fn test_line_count_counts_segments() {
        assert_eq!(parse("x = 1\n").line_count, 2);
        assert_eq!(parse("x = 1\ny = 2").line_count, 2);
    }

    #[test]
    fn test_syntax_error_is_failure() {
        let result = analyze_source("def broken(:\n    pass\n", Path::new("bad.py"));
        assert!(!result.is_parsed());
        let error = result.error().unwrap();
        assert!(error.starts_with("syntax error at line 1"), "{}", error);
        assert_eq!(result.file(), Path::new("bad.py"));
    }

    #[test]
    fn test_missing_node_is_failure() {
        let result = analyze_source("x = (1, 2\n", Path::new("bad.py"));
        assert!(!result.is_parsed());
    }

    #[test]
    fn test_module_docstring() {
        let info = parse("# header\n\"\"\"\n    Module docstring.\n\n    More.\n\"\"\"\nimport os\n");
        assert_eq!(info.module_docstring, "Module docstring.\n\nMore.");
    }

    #[test]
    fn test_fstring_is_not_docstring() {
        let info = parse("def f():\n    f\"not {doc}\"\n");
        assert_eq!(info.functions[0].docstring, None);
    }

    #[test]
    fn test_simple_import() {
        let info = parse("import os, numpy as np");
        assert_eq!(info.imports.len(), 1);
        let names = info.imports[0].names();
        assert_eq!(names[0], ImportedName::new("os"));
        assert_eq!(names[1].used_name(), "np");
        assert!(matches!(info.imports[0], ImportInfo::Import { .. }));
    }

    #[test]
    fn test_from_import() {
        let info = parse("from os import path, getcwd as cwd");
        match &info.imports[0] {
            ImportInfo::From {
                module,
                names,
                level,
                ..
            } => {
                assert_eq!(module.as_deref(), Some("os"));
                assert_eq!(*level, 0);
                assert_eq!(names.len(), 2);
                assert_eq!(names[1].alias.as_deref(), Some("cwd"));
            }
            other => panic!("unexpected import {:?}", other),
        }
    }

    #[test]
    fn test_relative_import() {
        let info = parse("from ..utils import helper\nfrom . import sibling\n");
        match (&info.imports[0], &info.imports[1]) {
            (
                ImportInfo::From {
                    module: m1,
                    level: l1,
                    ..
                },
                ImportInfo::From {
                    module: m2,
                    level: l2,
                    ..
                },
            ) => {
                assert_eq!(m1.as_deref(), Some("utils"));
                assert_eq!(*l1, 2);
                assert_eq!(*m2, None);
                assert_eq!(*l2, 1);
            }
            other => panic!("unexpected imports {:?}", other),
        }
    }

    #[test]
    fn test_wildcard_import() {
        let info = parse("from os.path import *");
        assert_eq!(info.imports[0].names()[0].name, "*");
    }

    #[test]
    fn test_nested_imports_are_collected() {
        let info = parse("def f():\n    import json\n    return json\n");
        assert_eq!(info.imports.len(), 1);
        assert_eq!(info.imports[0].line(), 2);
    }

    #[test]
    fn test_function_with_params() {
        let info = parse("def greet(name: str, age: int = 0, *args, key=None, **kw) -> str: pass");
        assert_eq!(info.functions.len(), 1);
        let func = &info.functions[0];
        assert_eq!(func.name, "greet");
        assert_eq!(func.returns.as_deref(), Some("str"));

        let args = &func.args;
        assert_eq!(args.len(), 5);
        assert_eq!(args[0].annotation.as_deref(), Some("str"));
        assert_eq!(args[1].default.as_deref(), Some("0"));
        assert_eq!(args[2].kind, ArgKind::VarArgs);
        assert_eq!(args[3].kind, ArgKind::KeywordOnly);
        assert_eq!(args[3].default.as_deref(), Some("None"));
        assert_eq!(args[4].kind, ArgKind::VarKwargs);
        assert_eq!(args[4].name, "kw");
    }

    #[test]
    fn test_positional_only_and_bare_star() {
        let info = parse("def f(a, b, /, c, *, d): pass");
        let kinds: Vec<_> = info.functions[0].args.iter().map(|a| a.kind).collect();
        assert_eq!(
            kinds,
            vec![
                ArgKind::PositionalOnly,
                ArgKind::PositionalOnly,
                ArgKind::Regular,
                ArgKind::KeywordOnly
            ]
        );
    }

    #[test]
    fn test_async_function() {
        let info = parse("async def fetch(url): pass");
        assert_eq!(info.functions.len(), 1);
        assert!(info.functions[0].is_async);
    }

    #[test]
    fn test_decorated_function_lines() {
        let info = parse("@app.route('/x', methods=['GET'])\n@cached\ndef handler():\n    pass\n");
        let func = &info.functions[0];
        assert_eq!(func.decorators, vec!["app.route", "cached"]);
        assert_eq!(func.line_start, 3);
        assert_eq!(func.line_end, 4);
    }

    #[test]
    fn test_class_with_bases() {
        let info = parse("class MyClass(Base, models.Model, Generic(T), metaclass=Meta): pass");
        assert_eq!(info.classes[0].bases, vec!["Base", "models.Model", "Generic"]);
    }

    #[test]
    fn test_class_members() {
        let source = r#"
@dataclass
class User:
    """A user.

    Holds account data.
    """
    name: str
    age: int = 0
    a = b = 1
    _cache = {}

    def greet(self, other):
        """Say hi."""
        def inner():
            pass
        return inner

    @staticmethod
    def make():
        pass
"#;
        let info = parse(source);
        assert_eq!(info.classes.len(), 1);
        let class = &info.classes[0];
        assert_eq!(class.name, "User");
        assert_eq!(class.decorators, vec!["dataclass"]);
        assert_eq!(class.docstring.as_deref(), Some("A user.\n\nHolds account data."));
        assert_eq!(class.attributes, vec!["name", "age", "a", "b", "_cache"]);
        assert_eq!(class.line_start, 3);

        let methods: Vec<_> = class.methods.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(methods, vec!["greet", "make"]);
        assert_eq!(class.methods[0].docstring.as_deref(), Some("Say hi."));
        assert_eq!(class.methods[1].decorators, vec!["staticmethod"]);

        // nested function inside a method is a plain function
        let functions: Vec<_> = info.functions.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(functions, vec!["inner"]);
    }

    #[test]
    fn test_nested_classes_in_source_order() {
        let info = parse("class Outer:\n    class Inner:\n        pass\nclass Last:\n    pass\n");
        let names: Vec<_> = info.classes.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Outer", "Inner", "Last"]);
    }

    #[test]
    fn test_empty_class_has_no_members() {
        let info = parse("class Empty:\n    pass\n");
        assert!(info.classes[0].is_empty());
    }

    #[test]
    fn test_clean_docstring() {
        assert_eq!(clean_docstring("  Summary.\n\n    Detail\n      more\n  "), "Summary.\n\nDetail\n  more");
        assert_eq!(clean_docstring("\n\n"), "");
    }

    #[test]
    fn test_clean_docstring_unicode_indent() {
        assert_eq!(clean_docstring("Summary.\n  a\n \u{a0}b"), "Summary.\na\nb");
        assert_eq!(clean_docstring("Summary.\n\u{3000}\u{3000}x\n  y"), "Summary.\nx\ny");
    }

    #[test]
    fn test_docstring_with_non_breaking_space_indent() {
        let source = "def f():\n    \"\"\"Summary.\n      a\n     \u{a0}b\n    \"\"\"\n";
        let info = parse(source);
        assert_eq!(info.functions[0].docstring.as_deref(), Some("Summary.\na\nb"));
    }

    #[test]
    fn test_string_value() {
        assert_eq!(string_value("'a\\nb'").as_deref(), Some("a\nb"));
        assert_eq!(string_value("r'a\\nb'").as_deref(), Some("a\\nb"));
        assert_eq!(string_value("\"\"\"x\"\"\"").as_deref(), Some("x"));
        assert_eq!(string_value("b'x'"), None);
        assert_eq!(string_value("F'x'"), None);
    }

    #[test]
    fn test_analyze_non_utf8_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("latin1.py");
        std::fs::write(&path, [0x78, 0x20, 0x3d, 0x20, 0xe9]).unwrap();
        let result = analyze_file(&path);
        assert_eq!(result.error(), Some("file is not valid UTF-8"));
    }

    #[test]
    fn test_analyze_missing_file() {
        let result = analyze_file(Path::new("/nonexistent/x.py"));
        assert!(!result.is_parsed());
    }
}
