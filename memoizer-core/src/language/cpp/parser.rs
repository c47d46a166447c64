//! C++ front end using tree-sitter
//!
//! A function is tagged when an attribute declaration in front of it names
//! the marker, e.g. `[[memoize]] int fib(int n) { ... }`. Only free functions
//! with a plain identifier as name are described; every other tagged
//! construct is reported as a failure so the driver can surface it.

use crate::descriptor::{MatchedFunction, Parameter};
use crate::error::{FunctionFailure, RewriteError};
use crate::language::parser::{LanguageParser, ParsedUnit};
use crate::language::tree_sitter_utils::{
    children_of_kind, first_descendant_of_kind, node_text, start_line,
};
use crate::language::SourceSpan;
use crate::sequencer::Candidate;
use crate::symbols::SymbolTable;
use anyhow::{Context, Result};
use tree_sitter::{Node, Parser, Tree};

/// Declarators that can sit between a definition and its function declarator
const WRAPPING_DECLARATORS: &[&str] = &[
    "pointer_declarator",
    "reference_declarator",
    "attributed_declarator",
];

/// Leaf kinds whose text names something in the unit
const SYMBOL_KINDS: &[&str] = &[
    "identifier",
    "field_identifier",
    "type_identifier",
    "namespace_identifier",
    "statement_identifier",
];

/// C++ parser using tree-sitter
pub struct CppParser;

impl CppParser {
    /// Create a new C++ parser
    pub fn new() -> Result<Self> {
        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_cpp::LANGUAGE.into())
            .context("Failed to set C++ language for parser")?;
        Ok(CppParser)
    }
}

impl LanguageParser for CppParser {
    fn parse(&self, source: &str, filename: &str) -> Result<Box<dyn ParsedUnit>> {
        // tree-sitter parsers are stateful, so each parse gets its own
        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_cpp::LANGUAGE.into())
            .context("Failed to set C++ language")?;

        let tree = parser
            .parse(source, None)
            .ok_or_else(|| anyhow::anyhow!("Failed to parse C++ file: {}", filename))?;

        Ok(Box::new(CppUnit {
            tree,
            source: source.to_string(),
        }))
    }
}

/// Parsed C++ translation unit
struct CppUnit {
    tree: Tree,
    source: String,
}

impl ParsedUnit for CppUnit {
    fn discover_functions(&self, marker: &str) -> Vec<Candidate> {
        let mut found = Vec::new();
        discover_recursive(self.tree.root_node(), &self.source, marker, &mut found);
        found
    }

    fn symbols(&self) -> SymbolTable {
        let mut symbols = SymbolTable::new();
        collect_symbols(self.tree.root_node(), &self.source, &mut symbols);
        symbols
    }

    fn has_syntax_errors(&self) -> bool {
        self.tree.root_node().has_error()
    }
}

fn discover_recursive(node: Node, source: &str, marker: &str, found: &mut Vec<Candidate>) {
    if matches!(node.kind(), "function_definition" | "declaration") {
        let tags = marker_positions(node, source, marker);
        if !tags.is_empty() {
            if let Some(candidate) = match_tagged(node, source, &tags) {
                found.push(candidate);
            }
        }
    }

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        discover_recursive(child, source, marker, found);
    }
}

/// Start offsets of the attribute declarations of `node` that name `marker`
fn marker_positions(node: Node, source: &str, marker: &str) -> Vec<usize> {
    let mut holders = children_of_kind(node, "attribute_declaration");
    if let Some(parent) = node.parent().filter(|p| p.kind() == "attributed_statement") {
        holders.extend(children_of_kind(parent, "attribute_declaration"));
    }

    holders
        .into_iter()
        .filter(|holder| names_marker(*holder, source, marker))
        .map(|holder| holder.start_byte())
        .collect()
}

/// `[[memoize]]` and `[[nodiscard, memoize]]` match; `[[gnu::memoize]]` does not
fn names_marker(attribute_declaration: Node, source: &str, marker: &str) -> bool {
    children_of_kind(attribute_declaration, "attribute")
        .into_iter()
        .any(|attribute| match attribute.child_by_field_name("name") {
            Some(name) => {
                attribute.child_by_field_name("prefix").is_none() && node_text(name, source) == marker
            }
            None => node_text(attribute, source).trim() == marker,
        })
}

/// Describe one tagged node, or `None` if it does not declare a function
fn match_tagged(node: Node, source: &str, tags: &[usize]) -> Option<Candidate> {
    let function = function_declarator(node.child_by_field_name("declarator")?)?;
    let name_node = function.child_by_field_name("declarator")?;
    let start = declaration_start(node)?;

    let name = node_text(name_node, source).to_string();
    let line = start_line(start);
    let fail = |error: RewriteError| -> Option<Candidate> {
        Some(Err(FunctionFailure::new(line, error)))
    };

    if node.kind() == "declaration" {
        return fail(RewriteError::MissingBody { function: name });
    }
    if let Some(reason) = unsupported_shape(node, name_node) {
        return fail(RewriteError::unsupported(&name, reason));
    }
    if tags.iter().any(|&tag| tag > start.start_byte()) {
        return fail(RewriteError::unsupported(
            &name,
            "the marker must come before the declaration",
        ));
    }
    if node.has_error() {
        return fail(RewriteError::unsupported(
            &name,
            "the definition contains syntax errors",
        ));
    }

    let body = match node.child_by_field_name("body") {
        Some(body) if body.kind() == "compound_statement" => body,
        Some(_) => {
            return fail(RewriteError::unsupported(
                &name,
                "function-try-blocks are not supported",
            ))
        }
        // `= default` and `= delete`
        None => return fail(RewriteError::MissingBody { function: name }),
    };

    let parameters = match parameters(function, source) {
        Ok(parameters) => parameters,
        Err(reason) => return fail(RewriteError::unsupported(&name, reason)),
    };

    let return_type = source
        .get(start.start_byte()..name_node.start_byte())
        .unwrap_or("")
        .trim_end()
        .to_string();

    Some(Ok(MatchedFunction {
        name,
        return_type,
        parameters,
        declaration_start: start.start_byte(),
        name_end: name_node.end_byte(),
        body: Some(SourceSpan::new(body.start_byte(), body.end_byte())),
        line,
    }))
}

/// Reason a tagged definition cannot be rewritten, judged by where it sits and
/// how it is named
fn unsupported_shape(node: Node, name: Node) -> Option<&'static str> {
    match node.parent().map(|parent| parent.kind()) {
        Some("template_declaration") => return Some("templates are not supported"),
        Some("field_declaration_list") => return Some("member functions are not supported"),
        _ => {}
    }

    match name.kind() {
        "identifier" => None,
        "qualified_identifier" => Some("qualified names cannot be renamed"),
        "field_identifier" => Some("member functions are not supported"),
        "operator_name" => Some("operators cannot be renamed"),
        "destructor_name" => Some("destructors cannot be renamed"),
        "template_function" => Some("template specializations are not supported"),
        _ => Some("only plain identifiers can be renamed"),
    }
}

/// The function declarator under any pointer or reference declarators
///
/// `int *f(int)` nests the function declarator in a pointer declarator, and
/// `int &f(int)` in a reference declarator.
fn function_declarator(mut declarator: Node) -> Option<Node> {
    loop {
        match declarator.kind() {
            "function_declarator" => return Some(declarator),
            kind if WRAPPING_DECLARATORS.contains(&kind) => {
                declarator = match declarator.child_by_field_name("declarator") {
                    Some(inner) => inner,
                    None => last_named_child(declarator)?,
                };
            }
            _ => return None,
        }
    }
}

fn last_named_child(node: Node) -> Option<Node> {
    let mut cursor = node.walk();
    let result = node.named_children(&mut cursor).last();
    result
}

/// First child that belongs to the declaration proper
///
/// Leading attribute declarations (the marker among them) and comments stay
/// in front of the rewritten declaration.
fn declaration_start(node: Node) -> Option<Node> {
    let mut cursor = node.walk();
    let result = node
        .children(&mut cursor)
        .find(|child| !matches!(child.kind(), "attribute_declaration" | "comment"));
    result
}

fn parameters(function: Node, source: &str) -> Result<Vec<Parameter>, &'static str> {
    let list = function
        .child_by_field_name("parameters")
        .ok_or("the declarator has no parameter list")?;

    let mut declarations = Vec::new();
    let mut cursor = list.walk();
    for child in list.children(&mut cursor) {
        match child.kind() {
            "parameter_declaration" => declarations.push(child),
            "optional_parameter_declaration" => {
                return Err("default arguments would be repeated on the generated declarations")
            }
            "variadic_parameter" | "variadic_parameter_declaration" | "..." => {
                return Err("variadic parameters cannot be forwarded")
            }
            _ => {}
        }
    }

    // `f(void)` declares no parameters
    if let [only] = declarations.as_slice() {
        if only.child_by_field_name("declarator").is_none() && node_text(*only, source).trim() == "void" {
            return Ok(Vec::new());
        }
    }

    Ok(declarations
        .into_iter()
        .map(|declaration| parameter(declaration, source))
        .collect())
}

/// An unnamed parameter gets an empty name and is rejected downstream
fn parameter(declaration: Node, source: &str) -> Parameter {
    let Some(declarator) = declaration.child_by_field_name("declarator") else {
        return Parameter::new("", node_text(declaration, source).trim());
    };

    let name = if declarator.kind().starts_with("abstract_") {
        ""
    } else {
        first_descendant_of_kind(declarator, "identifier").map_or("", |n| node_text(n, source))
    };
    let type_text = source
        .get(declaration.start_byte()..declarator.start_byte())
        .unwrap_or("")
        .trim();

    Parameter::new(name, type_text)
}

fn collect_symbols(node: Node, source: &str, symbols: &mut SymbolTable) {
    let kind = node.kind();
    if SYMBOL_KINDS.contains(&kind) {
        symbols.insert(node_text(node, source));
    } else if kind == "preproc_arg" {
        // Macro bodies are not parsed; take every identifier-shaped token
        symbols.extend(SymbolTable::scan(node_text(node, source)));
    }

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        collect_symbols(child, source, symbols);
    }
}
