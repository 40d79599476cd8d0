//! Shared tree-sitter traversal helpers used by every per-language `LanguageExtractor`
//! (§4.3). The recursion shapes here follow
//! `original_source/indexer/extractors/__init__.py::BaseExtractor` line for line —
//! `_extract_direct_children_of_type` becomes [`direct_children_of_type`],
//! `_extract_nested_*` becomes [`nested_of_type`] — reimplemented over
//! `tree_sitter::Node` instead of the Python bindings' duck-typed node objects, per
//! the trait-based redesign in §9.

use tree_sitter::Node;

use crate::domain::{BlockIdAllocator, BlockType, CodeBlock, DomainError};

/// Functions longer than this many source lines get their nested functions split
/// out into independent child blocks (§4.3).
pub const LARGE_FUNCTION_LINES: u32 = 300;

pub fn node_position(node: Node) -> (u32, u32, u32, u32) {
    let start = node.start_position();
    let end = node.end_position();
    (start.row as u32 + 1, end.row as u32 + 1, start.column as u32, end.column as u32)
}

pub fn node_text<'a>(source: &'a str, node: Node) -> &'a str {
    &source[node.byte_range()]
}

/// First identifier recovered from the node's `name` field, falling back to the
/// first matching descendant, falling back to `"anonymous"` (§4.3 name derivation).
pub fn identifier_name(source: &str, node: Node, identifier_kinds: &[&str]) -> String {
    if let Some(name_field) = node.child_by_field_name("name") {
        return node_text(source, name_field).to_string();
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if identifier_kinds.contains(&child.kind()) {
            return node_text(source, child).to_string();
        }
    }
    "anonymous".to_string()
}

/// All identifier-kind descendants of `node`, depth-first in source order,
/// deduplicated — used for destructuring/multi-assign variable declarations, where
/// one block is emitted per declared identifier.
pub fn identifier_names(source: &str, node: Node, identifier_kinds: &[&str]) -> Vec<String> {
    let mut names = Vec::new();
    collect_identifiers(source, node, identifier_kinds, &mut names);
    names
}

fn collect_identifiers(source: &str, node: Node, kinds: &[&str], out: &mut Vec<String>) {
    if kinds.contains(&node.kind()) {
        let text = node_text(source, node).to_string();
        if !out.contains(&text) {
            out.push(text);
        }
        return;
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        collect_identifiers(source, child, kinds, out);
    }
}

/// Extracts direct top-level children matching `target_kinds`, recursing through
/// `transparent_kinds` (module/program/source_file-style wrapper nodes, and any
/// language-specific pass-through like Python's `decorated_definition`) without
/// descending into anything else.
pub fn direct_children_of_type<'a>(
    root: Node<'a>,
    target_kinds: &[&str],
    transparent_kinds: &[&str],
) -> Vec<Node<'a>> {
    let mut out = Vec::new();
    scan_direct(root, target_kinds, transparent_kinds, &mut out);
    out
}

fn scan_direct<'a>(node: Node<'a>, target_kinds: &[&str], transparent_kinds: &[&str], out: &mut Vec<Node<'a>>) {
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if target_kinds.contains(&child.kind()) {
            out.push(child);
        } else if transparent_kinds.contains(&child.kind()) {
            scan_direct(child, target_kinds, transparent_kinds, out);
        }
    }
}

/// One-level-down nested scan rooted at `parent`: recurse through descendants,
/// emit a node the instant `target_kinds` matches, and do not recurse into it
/// (§4.3's "Nesting goes one level down by default... stopping recursion the
/// instant a matching node is found").
pub fn nested_of_type<'a>(parent: Node<'a>, target_kinds: &[&str]) -> Vec<Node<'a>> {
    let mut out = Vec::new();
    let mut cursor = parent.walk();
    for child in parent.children(&mut cursor) {
        scan_nested(child, target_kinds, &mut out);
    }
    out
}

fn scan_nested<'a>(node: Node<'a>, target_kinds: &[&str], out: &mut Vec<Node<'a>>) {
    if target_kinds.contains(&node.kind()) {
        out.push(node);
        return;
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        scan_nested(child, target_kinds, out);
    }
}

/// Full-tree scan matching `target_kinds` anywhere, descending into matches too
/// (used for imports/exports/dynamic-import calls, which don't nest inside each
/// other in practice, so unlike [`nested_of_type`] there's no need to stop early).
pub fn all_of_type<'a>(root: Node<'a>, target_kinds: &[&str]) -> Vec<Node<'a>> {
    let mut out = Vec::new();
    scan_all(root, target_kinds, &mut out);
    out
}

fn scan_all<'a>(node: Node<'a>, target_kinds: &[&str], out: &mut Vec<Node<'a>>) {
    if target_kinds.contains(&node.kind()) {
        out.push(node);
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        scan_all(child, target_kinds, out);
    }
}

/// For functions longer than [`LARGE_FUNCTION_LINES`], pulls nested function
/// definitions out as independent child blocks and rewrites their span in the
/// parent's content with a `<comment-prefix> [BLOCK_REF:<id>]` marker. Rewrites
/// happen in reverse source order so earlier replacements don't shift later byte
/// offsets (§4.3). Functions at or below the threshold are returned verbatim.
pub fn split_large_function(
    source: &str,
    node: Node,
    nested_function_kinds: &[&str],
    identifier_kinds: &[&str],
    comment_prefix: &str,
    alloc: &mut BlockIdAllocator,
) -> Result<(String, Vec<CodeBlock>), DomainError> {
    let (start_line, end_line, _, _) = node_position(node);
    if end_line - start_line + 1 <= LARGE_FUNCTION_LINES {
        return Ok((node_text(source, node).to_string(), Vec::new()));
    }

    let mut nested_nodes = nested_of_type(node, nested_function_kinds);
    nested_nodes.sort_by_key(|n| std::cmp::Reverse(n.start_byte()));

    let node_start = node.start_byte();
    let mut content = node_text(source, node).to_string();
    let mut children = Vec::new();

    for nested in &nested_nodes {
        let name = identifier_name(source, *nested, identifier_kinds);
        let id = alloc
            .next()
            .ok_or_else(|| DomainError::parse("block id sequence overflow: file has more than 4096 blocks"))?;
        let (n_start, n_end, n_start_col, n_end_col) = node_position(*nested);
        let child_content = node_text(source, *nested).to_string();
        children.push(CodeBlock::new(
            id,
            BlockType::Function,
            name,
            child_content,
            n_start,
            n_end,
            n_start_col,
            n_end_col,
        ));

        let marker = format!("{comment_prefix} [BLOCK_REF:{id}]");
        let rel_start = nested.start_byte() - node_start;
        let rel_end = nested.end_byte() - node_start;
        content.replace_range(rel_start..rel_end, &marker);
    }

    children.reverse();
    Ok((content, children))
}

/// Builds a function block from `node`, applying the large-function split above.
#[allow(clippy::too_many_arguments)]
pub fn function_block_from_node(
    source: &str,
    node: Node,
    name: impl Into<String>,
    nested_function_kinds: &[&str],
    identifier_kinds: &[&str],
    comment_prefix: &str,
    alloc: &mut BlockIdAllocator,
) -> Result<CodeBlock, DomainError> {
    let id = alloc
        .next()
        .ok_or_else(|| DomainError::parse("block id sequence overflow: file has more than 4096 blocks"))?;
    let (start_line, end_line, start_col, end_col) = node_position(node);
    let (content, children) =
        split_large_function(source, node, nested_function_kinds, identifier_kinds, comment_prefix, alloc)?;
    let mut block = CodeBlock::new(id, BlockType::Function, name, content, start_line, end_line, start_col, end_col);
    if !children.is_empty() {
        block = block.with_children(children);
    }
    Ok(block)
}

/// Builds a plain, unsplit block (everything except functions: classes, enums,
/// variables, interfaces, imports, exports) from `node`.
pub fn block_from_node(
    source: &str,
    node: Node,
    block_type: BlockType,
    name: impl Into<String>,
    alloc: &mut BlockIdAllocator,
) -> Result<CodeBlock, DomainError> {
    let id = alloc
        .next()
        .ok_or_else(|| DomainError::parse("block id sequence overflow: file has more than 4096 blocks"))?;
    let (start_line, end_line, start_col, end_col) = node_position(node);
    Ok(CodeBlock::new(id, block_type, name, node_text(source, node), start_line, end_line, start_col, end_col))
}

/// Builds a class block: content is emptied and its method/field nodes become
/// children (§4.3 — "the class's methods and class-level fields become its
/// children with their own content... avoids quadratic content duplication").
#[allow(clippy::too_many_arguments)]
pub fn class_block_from_node(
    source: &str,
    node: Node,
    name: impl Into<String>,
    method_kinds: &[&str],
    field_kinds: &[&str],
    nested_function_kinds: &[&str],
    identifier_kinds: &[&str],
    comment_prefix: &str,
    alloc: &mut BlockIdAllocator,
) -> Result<CodeBlock, DomainError> {
    let id = alloc
        .next()
        .ok_or_else(|| DomainError::parse("block id sequence overflow: file has more than 4096 blocks"))?;
    let (start_line, end_line, start_col, end_col) = node_position(node);
    let mut block = CodeBlock::new(id, BlockType::Class, name, "", start_line, end_line, start_col, end_col);

    let mut children = Vec::new();
    for method in nested_of_type(node, method_kinds) {
        let method_name = identifier_name(source, method, identifier_kinds);
        children.push(function_block_from_node(
            source,
            method,
            method_name,
            nested_function_kinds,
            identifier_kinds,
            comment_prefix,
            alloc,
        )?);
    }
    for field in nested_of_type(node, field_kinds) {
        let field_name = identifier_name(source, field, identifier_kinds);
        children.push(block_from_node(source, field, BlockType::Variable, field_name, alloc)?);
    }
    block = block.with_children(children);
    Ok(block)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tree_sitter::Parser;

    fn parse(source: &str) -> tree_sitter::Tree {
        let mut parser = Parser::new();
        parser.set_language(&tree_sitter_python::LANGUAGE.into()).unwrap();
        parser.parse(source, None).unwrap()
    }

    #[test]
    fn test_direct_children_of_type_finds_top_level_only() {
        let source = "def a():\n    def b():\n        pass\n";
        let tree = parse(source);
        let found = direct_children_of_type(tree.root_node(), &["function_definition"], &["module"]);
        assert_eq!(found.len(), 1);
    }

    #[test]
    fn test_nested_of_type_skips_direct_children() {
        let source = "def a():\n    def b():\n        pass\n";
        let tree = parse(source);
        let top = direct_children_of_type(tree.root_node(), &["function_definition"], &["module"]);
        let nested = nested_of_type(top[0], &["function_definition"]);
        assert_eq!(nested.len(), 1);
        assert_eq!(identifier_name(source, nested[0], &["identifier"]), "b");
    }

    #[test]
    fn test_identifier_name_falls_back_to_anonymous() {
        let source = "lambda: 1\n";
        let tree = parse(source);
        let lambda = tree.root_node().child(0).unwrap().child(0).unwrap();
        assert_eq!(identifier_name(source, lambda, &["identifier"]), "anonymous");
    }

    #[test]
    fn test_split_large_function_noop_under_threshold() {
        let source = "def a():\n    pass\n";
        let tree = parse(source);
        let top = direct_children_of_type(tree.root_node(), &["function_definition"], &["module"]);
        let mut alloc = BlockIdAllocator::new("f.py");
        let (content, children) =
            split_large_function(source, top[0], &["function_definition"], &["identifier"], "#", &mut alloc).unwrap();
        assert_eq!(content, node_text(source, top[0]));
        assert!(children.is_empty());
    }
}
