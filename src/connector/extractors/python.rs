use async_trait::async_trait;
use tree_sitter::Node;

use super::common::{
    all_of_type, block_from_node, class_block_from_node, direct_children_of_type, function_block_from_node,
    identifier_name, identifier_names, node_text,
};
use crate::application::interfaces::LanguageExtractor;
use crate::connector::adapter::ParserCache;
use crate::domain::{BlockIdAllocator, BlockType, CodeBlock, DomainError, Language};

const TRANSPARENT: &[&str] = &["module", "decorated_definition"];
const IDENTIFIER_KINDS: &[&str] = &["identifier"];
const NESTED_FUNCTION_KINDS: &[&str] = &["function_definition"];
const METHOD_KINDS: &[&str] = &["function_definition"];
const COMMENT_PREFIX: &str = "#";

/// Python block extractor (§4.3), grounded on
/// `original_source/indexer/extractors/python_extractor.py`.
pub struct PythonExtractor {
    parser_cache: std::sync::Arc<ParserCache>,
}

impl PythonExtractor {
    pub fn new(parser_cache: std::sync::Arc<ParserCache>) -> Self {
        Self { parser_cache }
    }

    fn parse<'s>(&self, source: &'s str) -> Result<tree_sitter::Tree, DomainError> {
        let mut parser = self
            .parser_cache
            .get_parser(Language::Python)
            .ok_or_else(|| DomainError::parse("no parser available for python"))?;
        parser
            .parse(source, None)
            .ok_or_else(|| DomainError::parse("tree-sitter failed to parse python source"))
    }

    fn assignment_names(&self, source: &str, node: Node) -> Vec<String> {
        node.child_by_field_name("left")
            .map(|left| identifier_names(source, left, IDENTIFIER_KINDS))
            .unwrap_or_default()
    }

    fn dynamic_import_module(&self, source: &str, call: Node) -> Option<String> {
        let function = call.child_by_field_name("function")?;
        let function_text = node_text(source, function);
        let is_dynamic = ["importlib.import_module", "__import__", "importlib.__import__"]
            .iter()
            .any(|p| function_text.contains(p));
        if !is_dynamic {
            return None;
        }
        let arguments = call.child_by_field_name("arguments")?;
        let mut cursor = arguments.walk();
        let first_string = arguments
            .children(&mut cursor)
            .find(|c| c.kind() == "string")?;
        Some(node_text(source, first_string).trim_matches(|c| c == '"' || c == '\'').to_string())
    }
}

#[async_trait]
impl LanguageExtractor for PythonExtractor {
    fn language(&self) -> Language {
        Language::Python
    }

    async fn extract_imports(&self, source: &str, alloc: &mut BlockIdAllocator) -> Result<Vec<CodeBlock>, DomainError> {
        let tree = self.parse(source)?;
        let mut blocks = Vec::new();

        for node in all_of_type(tree.root_node(), &["import_statement", "import_from_statement"]) {
            let mut symbols = Vec::new();
            if node.kind() == "import_statement" {
                if let Some(name_node) = node.child_by_field_name("name") {
                    symbols.push(node_text(source, name_node).to_string());
                }
            } else {
                if let Some(module) = node.child_by_field_name("module_name") {
                    symbols.push(node_text(source, module).to_string());
                }
                let mut cursor = node.walk();
                for child in node.children(&mut cursor) {
                    if child.kind() == "import_list" || child.kind() == "aliased_import" || child.kind() == "dotted_name" {
                        let mut inner_cursor = child.walk();
                        for leaf in child.children(&mut inner_cursor) {
                            if leaf.kind() == "identifier" {
                                symbols.push(node_text(source, leaf).to_string());
                            }
                        }
                        if child.kind() == "identifier" {
                            symbols.push(node_text(source, child).to_string());
                        }
                    }
                }
            }
            let id = alloc
                .next()
                .ok_or_else(|| DomainError::parse("block id sequence overflow: file has more than 4096 blocks"))?;
            let (start_line, end_line, start_col, end_col) = super::common::node_position(node);
            let block = CodeBlock::new(id, BlockType::Import, "import", node_text(source, node), start_line, end_line, start_col, end_col)
                .with_symbols(symbols);
            blocks.push(block);
        }

        for call in all_of_type(tree.root_node(), &["call"]) {
            if self.dynamic_import_module(source, call).is_none() {
                continue;
            }
            let id = alloc
                .next()
                .ok_or_else(|| DomainError::parse("block id sequence overflow: file has more than 4096 blocks"))?;
            let (start_line, end_line, start_col, end_col) = super::common::node_position(call);
            let block = CodeBlock::new(id, BlockType::Import, "import", node_text(source, call), start_line, end_line, start_col, end_col)
                .with_symbols(vec!["*".to_string()]);
            blocks.push(block);
        }

        Ok(blocks)
    }

    /// Python has no export syntax; recognizes the `__all__` module-scope sentinel
    /// assignment per §4.3's "sentinel patterns... recognized" fallback.
    async fn extract_exports(&self, source: &str, alloc: &mut BlockIdAllocator) -> Result<Vec<CodeBlock>, DomainError> {
        let tree = self.parse(source)?;
        let mut blocks = Vec::new();
        let mut cursor = tree.root_node().walk();
        for child in tree.root_node().children(&mut cursor) {
            if child.kind() != "expression_statement" {
                continue;
            }
            let mut inner = child.walk();
            for assignment in child.children(&mut inner) {
                if assignment.kind() != "assignment" {
                    continue;
                }
                let Some(left) = assignment.child_by_field_name("left") else { continue };
                if node_text(source, left) != "__all__" {
                    continue;
                }
                let block = block_from_node(source, assignment, BlockType::Export, "__all__", alloc)?.with_symbols(vec!["__all__".to_string()]);
                blocks.push(block);
            }
        }
        Ok(blocks)
    }

    /// Python has no native enum syntax; recognizes classes that subclass `Enum`.
    async fn extract_enums(&self, source: &str, alloc: &mut BlockIdAllocator) -> Result<Vec<CodeBlock>, DomainError> {
        let tree = self.parse(source)?;
        let mut blocks = Vec::new();
        for class_node in direct_children_of_type(tree.root_node(), &["class_definition"], TRANSPARENT) {
            let Some(superclasses) = class_node.child_by_field_name("superclasses") else { continue };
            if !node_text(source, superclasses).contains("Enum") {
                continue;
            }
            let name = identifier_name(source, class_node, IDENTIFIER_KINDS);
            let block = block_from_node(source, class_node, BlockType::Enum, name, alloc)?;
            blocks.push(block);
        }
        Ok(blocks)
    }

    async fn extract_variables(&self, source: &str, alloc: &mut BlockIdAllocator) -> Result<Vec<CodeBlock>, DomainError> {
        let tree = self.parse(source)?;
        let mut blocks = Vec::new();
        for assign_node in direct_children_of_type(tree.root_node(), &["assignment"], &["module", "expression_statement"]) {
            let names = self.assignment_names(source, assign_node);
            for name in names {
                blocks.push(block_from_node(source, assign_node, BlockType::Variable, name, alloc)?);
            }
        }
        Ok(blocks)
    }

    async fn extract_functions(&self, source: &str, alloc: &mut BlockIdAllocator) -> Result<Vec<CodeBlock>, DomainError> {
        let tree = self.parse(source)?;
        let mut blocks = Vec::new();
        for node in direct_children_of_type(tree.root_node(), &["function_definition"], TRANSPARENT) {
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

    async fn extract_classes(&self, source: &str, alloc: &mut BlockIdAllocator) -> Result<Vec<CodeBlock>, DomainError> {
        let tree = self.parse(source)?;
        let mut blocks = Vec::new();
        for node in direct_children_of_type(tree.root_node(), &["class_definition"], TRANSPARENT) {
            let name = identifier_name(source, node, IDENTIFIER_KINDS);
            blocks.push(class_block_from_node(
                source,
                node,
                name,
                METHOD_KINDS,
                &["assignment"],
                NESTED_FUNCTION_KINDS,
                IDENTIFIER_KINDS,
                COMMENT_PREFIX,
                alloc,
            )?);
        }
        Ok(blocks)
    }

    /// Python has no interface syntax.
    async fn extract_interfaces(&self, _source: &str, _alloc: &mut BlockIdAllocator) -> Result<Vec<CodeBlock>, DomainError> {
        Ok(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extractor() -> PythonExtractor {
        PythonExtractor::new(std::sync::Arc::new(ParserCache::new()))
    }

    #[tokio::test]
    async fn test_extract_top_level_function() {
        let ex = extractor();
        let mut alloc = BlockIdAllocator::new("a.py");
        let blocks = ex.extract_functions("def foo():\n    pass\n", &mut alloc).await.unwrap();
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].name(), "foo");
    }

    #[tokio::test]
    async fn test_extract_class_empties_content_and_nests_methods() {
        let ex = extractor();
        let mut alloc = BlockIdAllocator::new("a.py");
        let source = "class A:\n    def f(self):\n        pass\n    def g(self):\n        pass\n";
        let blocks = ex.extract_classes(source, &mut alloc).await.unwrap();
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].content(), "");
        assert_eq!(blocks[0].children().len(), 2);
        assert_eq!(blocks[0].children()[0].name(), "f");
    }

    #[tokio::test]
    async fn test_extract_imports_with_symbols() {
        let ex = extractor();
        let mut alloc = BlockIdAllocator::new("a.py");
        let blocks = ex.extract_imports("import os\nfrom sys import path\n", &mut alloc).await.unwrap();
        assert_eq!(blocks.len(), 2);
        assert!(blocks[0].symbols().contains(&"os".to_string()));
    }

    #[tokio::test]
    async fn test_extract_dynamic_import_uses_wildcard_symbol() {
        let ex = extractor();
        let mut alloc = BlockIdAllocator::new("a.py");
        let blocks = ex
            .extract_imports("mod = importlib.import_module(\"pkg.sub\")\n", &mut alloc)
            .await
            .unwrap();
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].symbols(), &["*".to_string()]);
        assert!(blocks[0].content().contains("importlib.import_module"));
    }

    #[tokio::test]
    async fn test_extract_dunder_all_export() {
        let ex = extractor();
        let mut alloc = BlockIdAllocator::new("a.py");
        let blocks = ex.extract_exports("__all__ = [\"foo\"]\n", &mut alloc).await.unwrap();
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].block_type(), BlockType::Export);
    }

    #[tokio::test]
    async fn test_extract_enum_subclass() {
        let ex = extractor();
        let mut alloc = BlockIdAllocator::new("a.py");
        let source = "class Color(Enum):\n    RED = 1\n";
        let blocks = ex.extract_enums(source, &mut alloc).await.unwrap();
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].block_type(), BlockType::Enum);
    }
}
