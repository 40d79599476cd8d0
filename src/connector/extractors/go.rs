use async_trait::async_trait;
use tree_sitter::Node;

use super::common::{block_from_node, direct_children_of_type, function_block_from_node, node_text};
use crate::application::interfaces::LanguageExtractor;
use crate::connector::adapter::ParserCache;
use crate::domain::{BlockIdAllocator, BlockType, CodeBlock, DomainError, Language};

const TRANSPARENT: &[&str] = &["source_file"];
const IDENTIFIER_KINDS: &[&str] = &["identifier", "field_identifier"];
const NESTED_FUNCTION_KINDS: &[&str] = &["func_literal"];
const COMMENT_PREFIX: &str = "//";

/// Go block extractor (§4.3). Go has no class/method-body nesting — methods are
/// declared standalone with a receiver parameter, and there's no syntactic link
/// between a `type Foo struct` and its methods — so both `function_declaration`
/// and `method_declaration` surface as flat top-level `Function` blocks, and
/// struct/interface types never get children.
pub struct GoExtractor {
    parser_cache: std::sync::Arc<ParserCache>,
}

impl GoExtractor {
    pub fn new(parser_cache: std::sync::Arc<ParserCache>) -> Self {
        Self { parser_cache }
    }

    fn parse(&self, source: &str) -> Result<tree_sitter::Tree, DomainError> {
        let mut parser = self
            .parser_cache
            .get_parser(Language::Go)
            .ok_or_else(|| DomainError::parse("no parser available for go"))?;
        parser
            .parse(source, None)
            .ok_or_else(|| DomainError::parse("tree-sitter failed to parse go source"))
    }

    fn field_names(&self, source: &str, node: Node, field: &str) -> Vec<String> {
        let mut cursor = node.walk();
        node.children_by_field_name(field, &mut cursor)
            .map(|n| node_text(source, n).to_string())
            .collect()
    }

    fn function_name(&self, source: &str, node: Node) -> String {
        node.child_by_field_name("name")
            .map(|n| node_text(source, n).to_string())
            .unwrap_or_else(|| "anonymous".to_string())
    }
}

#[async_trait]
impl LanguageExtractor for GoExtractor {
    fn language(&self) -> Language {
        Language::Go
    }

    async fn extract_imports(&self, source: &str, alloc: &mut BlockIdAllocator) -> Result<Vec<CodeBlock>, DomainError> {
        let tree = self.parse(source)?;
        let mut blocks = Vec::new();
        for decl in direct_children_of_type(tree.root_node(), &["import_declaration"], TRANSPARENT) {
            for spec in collect_import_specs(decl) {
                let Some(path_node) = spec.child_by_field_name("path") else { continue };
                let path = node_text(source, path_node).trim_matches('"').to_string();
                let id = alloc
                    .next()
                    .ok_or_else(|| DomainError::parse("block id sequence overflow: file has more than 4096 blocks"))?;
                let (start_line, end_line, start_col, end_col) = super::common::node_position(spec);
                blocks.push(
                    CodeBlock::new(id, BlockType::Import, "import", node_text(source, spec), start_line, end_line, start_col, end_col)
                        .with_symbols(vec![path]),
                );
            }
        }
        Ok(blocks)
    }

    /// Go has no export keyword; exported identifiers are capitalized by convention,
    /// which isn't a recoverable AST node — this crate reports no explicit exports
    /// for Go, matching the absence of an `export_statement`-equivalent node.
    async fn extract_exports(&self, _source: &str, _alloc: &mut BlockIdAllocator) -> Result<Vec<CodeBlock>, DomainError> {
        Ok(Vec::new())
    }

    /// Go has no enum syntax; const blocks with `iota` are the idiomatic substitute
    /// but aren't structurally distinguishable from other const groups, so this
    /// crate doesn't attempt to recognize them as enums.
    async fn extract_enums(&self, _source: &str, _alloc: &mut BlockIdAllocator) -> Result<Vec<CodeBlock>, DomainError> {
        Ok(Vec::new())
    }

    async fn extract_variables(&self, source: &str, alloc: &mut BlockIdAllocator) -> Result<Vec<CodeBlock>, DomainError> {
        let tree = self.parse(source)?;
        let mut blocks = Vec::new();
        for decl in direct_children_of_type(tree.root_node(), &["var_declaration", "const_declaration"], TRANSPARENT) {
            let mut cursor = decl.walk();
            for spec in decl.children(&mut cursor) {
                if spec.kind() != "var_spec" && spec.kind() != "const_spec" {
                    continue;
                }
                for name in self.field_names(source, spec, "name") {
                    blocks.push(block_from_node(source, spec, BlockType::Variable, name, alloc)?);
                }
            }
        }
        Ok(blocks)
    }

    async fn extract_functions(&self, source: &str, alloc: &mut BlockIdAllocator) -> Result<Vec<CodeBlock>, DomainError> {
        let tree = self.parse(source)?;
        let mut blocks = Vec::new();
        for node in direct_children_of_type(tree.root_node(), &["function_declaration", "method_declaration"], TRANSPARENT) {
            let name = self.function_name(source, node);
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

    /// Struct-bearing `type_spec`s map to `Class` blocks with their field content
    /// preserved verbatim — Go methods have no body-nesting relationship to the
    /// struct they receive, so no children are attached here (methods surface
    /// separately via `extract_functions`).
    async fn extract_classes(&self, source: &str, alloc: &mut BlockIdAllocator) -> Result<Vec<CodeBlock>, DomainError> {
        let tree = self.parse(source)?;
        let mut blocks = Vec::new();
        for decl in direct_children_of_type(tree.root_node(), &["type_declaration"], TRANSPARENT) {
            let mut cursor = decl.walk();
            for spec in decl.children(&mut cursor) {
                if spec.kind() != "type_spec" {
                    continue;
                }
                let Some(type_node) = spec.child_by_field_name("type") else { continue };
                if type_node.kind() != "struct_type" {
                    continue;
                }
                let name = spec
                    .child_by_field_name("name")
                    .map(|n| node_text(source, n).to_string())
                    .unwrap_or_else(|| "anonymous".to_string());
                blocks.push(block_from_node(source, spec, BlockType::Class, name, alloc)?);
            }
        }
        Ok(blocks)
    }

    async fn extract_interfaces(&self, source: &str, alloc: &mut BlockIdAllocator) -> Result<Vec<CodeBlock>, DomainError> {
        let tree = self.parse(source)?;
        let mut blocks = Vec::new();
        for decl in direct_children_of_type(tree.root_node(), &["type_declaration"], TRANSPARENT) {
            let mut cursor = decl.walk();
            for spec in decl.children(&mut cursor) {
                if spec.kind() != "type_spec" {
                    continue;
                }
                let Some(type_node) = spec.child_by_field_name("type") else { continue };
                if type_node.kind() != "interface_type" {
                    continue;
                }
                let name = spec
                    .child_by_field_name("name")
                    .map(|n| node_text(source, n).to_string())
                    .unwrap_or_else(|| "anonymous".to_string());
                blocks.push(block_from_node(source, spec, BlockType::Interface, name, alloc)?);
            }
        }
        Ok(blocks)
    }
}

fn collect_import_specs(decl: Node) -> Vec<Node<'_>> {
    let mut out = Vec::new();
    let mut cursor = decl.walk();
    for child in decl.children(&mut cursor) {
        match child.kind() {
            "import_spec" => out.push(child),
            "import_spec_list" => {
                let mut inner = child.walk();
                for spec in child.children(&mut inner) {
                    if spec.kind() == "import_spec" {
                        out.push(spec);
                    }
                }
            }
            _ => {}
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extractor() -> GoExtractor {
        GoExtractor::new(std::sync::Arc::new(ParserCache::new()))
    }

    #[tokio::test]
    async fn test_extract_function() {
        let ex = extractor();
        let mut alloc = BlockIdAllocator::new("a.go");
        let blocks = ex.extract_functions("package p\n\nfunc Foo() {}\n", &mut alloc).await.unwrap();
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].name(), "Foo");
    }

    #[tokio::test]
    async fn test_extract_method_declaration_is_flat() {
        let ex = extractor();
        let mut alloc = BlockIdAllocator::new("a.go");
        let source = "package p\n\ntype T struct{}\n\nfunc (t T) Bar() {}\n";
        let blocks = ex.extract_functions(source, &mut alloc).await.unwrap();
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].name(), "Bar");
        let classes = ex.extract_classes(source, &mut alloc).await.unwrap();
        assert_eq!(classes[0].children().len(), 0);
    }

    #[tokio::test]
    async fn test_extract_struct_and_interface() {
        let ex = extractor();
        let mut alloc = BlockIdAllocator::new("a.go");
        let source = "package p\n\ntype T struct {\n  X int\n}\n\ntype I interface {\n  M()\n}\n";
        let classes = ex.extract_classes(source, &mut alloc).await.unwrap();
        assert_eq!(classes.len(), 1);
        let interfaces = ex.extract_interfaces(source, &mut alloc).await.unwrap();
        assert_eq!(interfaces.len(), 1);
    }

    #[tokio::test]
    async fn test_extract_import() {
        let ex = extractor();
        let mut alloc = BlockIdAllocator::new("a.go");
        let source = "package p\n\nimport \"fmt\"\n";
        let blocks = ex.extract_imports(source, &mut alloc).await.unwrap();
        assert_eq!(blocks.len(), 1);
        assert!(blocks[0].symbols().contains(&"fmt".to_string()));
    }
}
