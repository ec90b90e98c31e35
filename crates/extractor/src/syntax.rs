//! Small readers over the tree-sitter Python tree.
//!
//! Everything here answers "is this node a literal we can evaluate statically?" and returns
//! `None` otherwise. Callers treat `None` as "not a dependency fact", never as an error.

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use tree_sitter::Node;

static IDENTITY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("valid identity regex"));

static DOTTED_PATH_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*(\.[A-Za-z0-9_]+)+$").expect("valid dotted path regex")
});

/// Named string lists visible to a formula (`SOURCES = ["a", "b"]`).
pub(crate) type ListAliases = IndexMap<String, Vec<String>>;

pub(crate) fn text<'a>(node: Node, source: &'a str) -> &'a str {
    &source[node.byte_range()]
}

pub(crate) fn is_identity(candidate: &str) -> bool {
    IDENTITY_RE.is_match(candidate)
}

pub(crate) fn is_dotted_path(candidate: &str) -> bool {
    DOTTED_PATH_RE.is_match(candidate)
}

/// Strip any number of redundant parentheses.
pub(crate) fn unwrap_parens(node: Node) -> Node {
    let mut current = node;
    while current.kind() == "parenthesized_expression" {
        let mut cursor = current.walk();
        let inner = current
            .named_children(&mut cursor)
            .find(|child| child.kind() != "comment");
        match inner {
            Some(inner) => current = inner,
            None => break,
        }
    }
    current
}

/// Evaluate a plain (non-interpolated) string literal, including implicit concatenation.
pub(crate) fn string_literal(node: Node, source: &str) -> Option<String> {
    let node = unwrap_parens(node);
    match node.kind() {
        "string" => {
            let mut out = String::new();
            let mut cursor = node.walk();
            for child in node.named_children(&mut cursor) {
                match child.kind() {
                    "string_content" => out.push_str(text(child, source)),
                    "interpolation" => return None,
                    _ => {}
                }
            }
            Some(out)
        }
        "concatenated_string" => {
            let mut out = String::new();
            let mut cursor = node.walk();
            for child in node.named_children(&mut cursor) {
                if child.kind() == "comment" {
                    continue;
                }
                out.push_str(&string_literal(child, source)?);
            }
            Some(out)
        }
        _ => None,
    }
}

/// String items of a list or tuple literal. Non-string items are skipped.
pub(crate) fn string_list(node: Node, source: &str) -> Option<Vec<String>> {
    let node = unwrap_parens(node);
    if !matches!(node.kind(), "list" | "tuple") {
        return None;
    }
    let mut cursor = node.walk();
    let items = node
        .named_children(&mut cursor)
        .filter_map(|child| string_literal(child, source))
        .collect();
    Some(items)
}

/// `Name` or `a.b.Name` as written.
pub(crate) fn dotted_name(node: Node, source: &str) -> Option<String> {
    let node = unwrap_parens(node);
    match node.kind() {
        "identifier" => Some(text(node, source).to_string()),
        "attribute" => {
            let object = dotted_name(node.child_by_field_name("object")?, source)?;
            let attribute = node.child_by_field_name("attribute")?;
            Some(format!("{object}.{}", text(attribute, source)))
        }
        _ => None,
    }
}

/// Resolve an expression that should denote a list of identities: a literal list, a single
/// string, a named list, or a simple comprehension.
pub(crate) fn resolve_list(node: Node, source: &str, aliases: &ListAliases) -> Option<Vec<String>> {
    let node = unwrap_parens(node);
    match node.kind() {
        "list" | "tuple" => string_list(node, source),
        "string" | "concatenated_string" => string_literal(node, source).map(|s| vec![s]),
        "identifier" => aliases.get(text(node, source)).cloned(),
        "list_comprehension" => evaluate_comprehension(node, source, aliases),
        "binary_operator" => {
            // LIST_A + LIST_B
            let operator = node.child_by_field_name("operator")?;
            if operator.kind() != "+" {
                return None;
            }
            let mut left = resolve_list(node.child_by_field_name("left")?, source, aliases)?;
            let right = resolve_list(node.child_by_field_name("right")?, source, aliases)?;
            left.extend(right);
            Some(left)
        }
        _ => None,
    }
}

/// Evaluate `[<template> for x in <iterable>]` when the template only concatenates string
/// literals with the loop variable (optionally case-folded) and the iterable is known.
pub(crate) fn evaluate_comprehension(
    node: Node,
    source: &str,
    aliases: &ListAliases,
) -> Option<Vec<String>> {
    let body = node.child_by_field_name("body")?;

    let mut clauses = Vec::new();
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        match child.kind() {
            "for_in_clause" => clauses.push(child),
            // Filters can't be evaluated statically.
            "if_clause" => return None,
            _ => {}
        }
    }
    let [clause] = clauses.as_slice() else {
        return None;
    };

    let variable = clause.child_by_field_name("left")?;
    if variable.kind() != "identifier" {
        return None;
    }
    let variable = text(variable, source);
    let iterable = resolve_list(clause.child_by_field_name("right")?, source, aliases)?;

    iterable
        .iter()
        .map(|item| render_template(body, source, variable, item))
        .collect()
}

fn render_template(node: Node, source: &str, variable: &str, item: &str) -> Option<String> {
    let node = unwrap_parens(node);
    match node.kind() {
        "identifier" if text(node, source) == variable => Some(item.to_string()),
        "string" | "concatenated_string" => string_literal(node, source),
        "binary_operator" => {
            let operator = node.child_by_field_name("operator")?;
            if operator.kind() != "+" {
                return None;
            }
            let left = render_template(node.child_by_field_name("left")?, source, variable, item)?;
            let right =
                render_template(node.child_by_field_name("right")?, source, variable, item)?;
            Some(left + &right)
        }
        "call" => {
            // x.lower() / x.upper()
            let function = node.child_by_field_name("function")?;
            if function.kind() != "attribute" {
                return None;
            }
            let arguments = node.child_by_field_name("arguments")?;
            if arguments.named_child_count() != 0 {
                return None;
            }
            let inner = render_template(
                function.child_by_field_name("object")?,
                source,
                variable,
                item,
            )?;
            match text(function.child_by_field_name("attribute")?, source) {
                "lower" => Some(inner.to_lowercase()),
                "upper" => Some(inner.to_uppercase()),
                _ => None,
            }
        }
        _ => None,
    }
}

/// Positional (non-keyword) arguments of a call, comments excluded.
pub(crate) fn positional_arguments<'tree>(call: Node<'tree>) -> Vec<Node<'tree>> {
    let Some(arguments) = call.child_by_field_name("arguments") else {
        return Vec::new();
    };
    let mut cursor = arguments.walk();
    arguments
        .named_children(&mut cursor)
        .filter(|child| !matches!(child.kind(), "keyword_argument" | "comment"))
        .collect()
}

pub(crate) fn keyword_argument<'tree>(
    call: Node<'tree>,
    name: &str,
    source: &str,
) -> Option<Node<'tree>> {
    let arguments = call.child_by_field_name("arguments")?;
    let mut cursor = arguments.walk();
    let found = arguments
        .named_children(&mut cursor)
        .filter(|child| child.kind() == "keyword_argument")
        .find(|child| {
            child
                .child_by_field_name("name")
                .is_some_and(|key| text(key, source) == name)
        });
    found.and_then(|child| child.child_by_field_name("value"))
}

/// `(NAME, value)` for a simple `NAME = value` statement.
pub(crate) fn simple_assignment<'tree>(
    statement: Node<'tree>,
    source: &str,
) -> Option<(String, Node<'tree>)> {
    let assignment = match statement.kind() {
        "expression_statement" => statement.named_child(0)?,
        "assignment" => statement,
        _ => return None,
    };
    if assignment.kind() != "assignment" {
        return None;
    }
    let left = assignment.child_by_field_name("left")?;
    if left.kind() != "identifier" {
        return None;
    }
    let right = assignment.child_by_field_name("right")?;
    Some((text(left, source).to_string(), right))
}

#[cfg(test)]
pub(crate) fn parse(source: &str) -> tree_sitter::Tree {
    let mut parser = tree_sitter::Parser::new();
    parser
        .set_language(&tree_sitter_python::LANGUAGE.into())
        .unwrap();
    parser.parse(source, None).unwrap()
}
