use async_trait::async_trait;
use tree_sitter::Node;

use super::common::{block_from_node, direct_children_of_type, function_block_from_node, identifier_name, node_text};
use crate::application::interfaces::LanguageExtractor;
use crate::connector::adapter::ParserCache;
use crate::domain::{BlockIdAllocator, BlockType, CodeBlock, DomainError, Language};

const TRANSPARENT: &[&str] = &["source_file", "mod_item", "declaration_list", "impl_item"];
const IDENTIFIER_KINDS: &[&str] = &["identifier", "field_identifier"];
const NESTED_FUNCTION_KINDS: &[&str] = &["closure_expression"];
const COMMENT_PREFIX: &str = "//";

/// Rust block extractor (§4.3). `impl_item` blocks are treated as transparent
/// wrappers for function extraction, so `impl` methods surface as flat top-level
/// `Function` blocks the same way `extract_functions` on a free function does —
/// Rust has no structural class body to nest them under. `struct_item` preserves
/// its own content with no children for the same reason. `mod_item` and
/// `type_item` have no corresponding extraction capability on this trait and are
/// skipped (`mod` contents are reached via the transparent traversal instead).
pub struct RustExtractor {
    parser_cache: std::sync::Arc<ParserCache>,
}

impl RustExtractor {
    pub fn new(parser_cache: std::sync::Arc<ParserCache>) -> Self {
        Self { parser_cache }
    }

    fn parse(&self, source: &str) -> Result<tree_sitter::Tree, DomainError> {
        let mut parser = self
            .parser_cache
            .get_parser(Language::Rust)
            .ok_or_else(|| DomainError::parse("no parser available for rust"))?;
        parser
            .parse(source, None)
            .ok_or_else(|| DomainError::parse("tree-sitter failed to parse rust source"))
    }
}

#[async_trait]
impl LanguageExtractor for RustExtractor {
    fn language(&self) -> Language {
        Language::Rust
    }

    async fn extract_imports(&self, source: &str, alloc: &mut BlockIdAllocator) -> Result<Vec<CodeBlock>, DomainError> {
        let tree = self.parse(source)?;
        let mut blocks = Vec::new();
        for node in direct_children_of_type(tree.root_node(), &["use_declaration"], TRANSPARENT) {
            let mut symbols = Vec::new();
            collect_use_symbols(source, node, &mut symbols);
            let id = alloc
                .next()
                .ok_or_else(|| DomainError::parse("block id sequence overflow: file has more than 4096 blocks"))?;
            let (start_line, end_line, start_col, end_col) = super::common::node_position(node);
            blocks.push(
                CodeBlock::new(id, BlockType::Import, "import", node_text(source, node), start_line, end_line, start_col, end_col)
                    .with_symbols(symbols),
            );
        }
        Ok(blocks)
    }

    /// A top-level item is exported when its visibility modifier is `pub` (in any
    /// of its forms — `pub`, `pub(crate)`, `pub(super)`); this crate reports one
    /// export block per visible item rather than trying to recover a single
    /// module-level export list, since Rust has no `__all__`/`export {}` equivalent.
    async fn extract_exports(&self, source: &str, alloc: &mut BlockIdAllocator) -> Result<Vec<CodeBlock>, DomainError> {
        let tree = self.parse(source)?;
        let mut blocks = Vec::new();
        const EXPORTABLE_KINDS: &[&str] =
            &["function_item", "struct_item", "enum_item", "trait_item", "const_item", "static_item", "mod_item", "type_item"];
        for item in direct_children_of_type(tree.root_node(), EXPORTABLE_KINDS, TRANSPARENT) {
            if item.child_by_field_name("visibility_modifier").is_none() {
                continue;
            }
            let name = identifier_name(source, item, IDENTIFIER_KINDS);
            let block = block_from_node(source, item, BlockType::Export, name.clone(), alloc)?.with_symbols(vec![name]);
            blocks.push(block);
        }
        Ok(blocks)
    }

    async fn extract_enums(&self, source: &str, alloc: &mut BlockIdAllocator) -> Result<Vec<CodeBlock>, DomainError> {
        let tree = self.parse(source)?;
        let mut blocks = Vec::new();
        for node in direct_children_of_type(tree.root_node(), &["enum_item"], TRANSPARENT) {
            let name = identifier_name(source, node, IDENTIFIER_KINDS);
            blocks.push(block_from_node(source, node, BlockType::Enum, name, alloc)?);
        }
        Ok(blocks)
    }

    async fn extract_variables(&self, source: &str, alloc: &mut BlockIdAllocator) -> Result<Vec<CodeBlock>, DomainError> {
        let tree = self.parse(source)?;
        let mut blocks = Vec::new();
        for node in direct_children_of_type(tree.root_node(), &["const_item", "static_item"], TRANSPARENT) {
            let name = identifier_name(source, node, IDENTIFIER_KINDS);
            blocks.push(block_from_node(source, node, BlockType::Variable, name, alloc)?);
        }
        Ok(blocks)
    }

    async fn extract_functions(&self, source: &str, alloc: &mut BlockIdAllocator) -> Result<Vec<CodeBlock>, DomainError> {
        let tree = self.parse(source)?;
        let mut blocks = Vec::new();
        for node in direct_children_of_type(tree.root_node(), &["function_item"], TRANSPARENT) {
            let name = identifier_name(source, node, IDENTIFIER_KINDS);
            blocks.push(function_block_from_node(
                source,
                node,
                name,
                NESTED_FUNCTION_KINDS,
                IDENTIFIER_KINDS,
                COMMENT_PREFIX,
                alloc,
            )?);
        }
        Ok(blocks)
    }

    /// Content is preserved verbatim with no children: `impl` blocks aren't
    /// structurally nested inside the `struct_item` they implement, so there is
    /// no AST-local way to attach methods here. They surface separately via
    /// `extract_functions`, since `impl_item` is a transparent wrapper.
    async fn extract_classes(&self, source: &str, alloc: &mut BlockIdAllocator) -> Result<Vec<CodeBlock>, DomainError> {
        let tree = self.parse(source)?;
        let mut blocks = Vec::new();
        for node in direct_children_of_type(tree.root_node(), &["struct_item"], TRANSPARENT) {
            let name = identifier_name(source, node, IDENTIFIER_KINDS);
            blocks.push(block_from_node(source, node, BlockType::Class, name, alloc)?);
        }
        Ok(blocks)
    }

    /// `trait_item` is the closest structural analog to an interface.
    async fn extract_interfaces(&self, source: &str, alloc: &mut BlockIdAllocator) -> Result<Vec<CodeBlock>, DomainError> {
        let tree = self.parse(source)?;
        let mut blocks = Vec::new();
        for node in direct_children_of_type(tree.root_node(), &["trait_item"], TRANSPARENT) {
            let name = identifier_name(source, node, IDENTIFIER_KINDS);
            blocks.push(block_from_node(source, node, BlockType::Interface, name, alloc)?);
        }
        Ok(blocks)
    }
}

fn collect_use_symbols(source: &str, node: Node, out: &mut Vec<String>) {
    let Some(arg) = node.child_by_field_name("argument") else { return };
    collect_use_tree_symbols(source, arg, out);
}

fn collect_use_tree_symbols(source: &str, node: Node, out: &mut Vec<String>) {
    match node.kind() {
        "identifier" | "scoped_identifier" => out.push(node_text(source, node).to_string()),
        "use_as_clause" => {
            if let Some(path) = node.child_by_field_name("path") {
                collect_use_tree_symbols(source, path, out);
            }
        }
        "use_wildcard" => out.push("*".to_string()),
        "scoped_use_list" | "use_list" => {
            let mut cursor = node.walk();
            for child in node.children(&mut cursor) {
                collect_use_tree_symbols(source, child, out);
            }
        }
        _ => {
            let mut cursor = node.walk();
            for child in node.children(&mut cursor) {
                collect_use_tree_symbols(source, child, out);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extractor() -> RustExtractor {
        RustExtractor::new(std::sync::Arc::new(ParserCache::new()))
    }

    #[tokio::test]
    async fn test_extract_free_function() {
        let ex = extractor();
        let mut alloc = BlockIdAllocator::new("a.rs");
        let blocks = ex.extract_functions("fn foo() {}\n", &mut alloc).await.unwrap();
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].name(), "foo");
    }

    #[tokio::test]
    async fn test_impl_methods_are_flattened() {
        let ex = extractor();
        let mut alloc = BlockIdAllocator::new("a.rs");
        let source = "struct S;\n\nimpl S {\n    fn bar(&self) {}\n}\n";
        let blocks = ex.extract_functions(source, &mut alloc).await.unwrap();
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].name(), "bar");
        let classes = ex.extract_classes(source, &mut alloc).await.unwrap();
        assert_eq!(classes.len(), 1);
        assert_eq!(classes[0].children().len(), 0);
    }

    #[tokio::test]
    async fn test_extract_trait_as_interface() {
        let ex = extractor();
        let mut alloc = BlockIdAllocator::new("a.rs");
        let blocks = ex.extract_interfaces("trait Greet {\n    fn hello(&self);\n}\n", &mut alloc).await.unwrap();
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].block_type(), BlockType::Interface);
    }

    #[tokio::test]
    async fn test_extract_use_declaration() {
        let ex = extractor();
        let mut alloc = BlockIdAllocator::new("a.rs");
        let blocks = ex.extract_imports("use std::collections::HashMap;\n", &mut alloc).await.unwrap();
        assert_eq!(blocks.len(), 1);
        assert!(blocks[0].symbols().contains(&"HashMap".to_string()));
    }

    #[tokio::test]
    async fn test_extract_pub_function_as_export() {
        let ex = extractor();
        let mut alloc = BlockIdAllocator::new("a.rs");
        let blocks = ex.extract_exports("pub fn foo() {}\nfn bar() {}\n", &mut alloc).await.unwrap();
        assert_eq!(blocks.len(), 1);
    }
}
