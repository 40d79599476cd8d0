use async_trait::async_trait;
use tree_sitter::Node;

use super::common::{
    all_of_type, block_from_node, class_block_from_node, direct_children_of_type, function_block_from_node,
    identifier_name, identifier_names, node_position, node_text,
};
use crate::application::interfaces::LanguageExtractor;
use crate::connector::adapter::ParserCache;
use crate::domain::{BlockIdAllocator, BlockType, CodeBlock, DomainError, Language};

const TRANSPARENT: &[&str] = &["program", "export_statement"];
const IDENTIFIER_KINDS: &[&str] = &["identifier", "property_identifier"];
const VARIABLE_DECL_KINDS: &[&str] = &["variable_declaration", "lexical_declaration"];
const NESTED_FUNCTION_KINDS: &[&str] = &["function_declaration", "function_expression", "arrow_function", "method_definition"];
const METHOD_KINDS: &[&str] = &["method_definition"];
const COMMENT_PREFIX: &str = "//";

/// JavaScript block extractor (§4.3). No language-specific original_source file
/// covers JS directly; grounded on the shared traversal shape plus the teacher's
/// `get_query_patterns(Language::JavaScript)` node-kind table for what counts as a
/// function/class/import in this grammar.
pub struct JavaScriptExtractor {
    parser_cache: std::sync::Arc<ParserCache>,
    language: Language,
}

impl JavaScriptExtractor {
    pub fn new(parser_cache: std::sync::Arc<ParserCache>) -> Self {
        Self {
            parser_cache,
            language: Language::JavaScript,
        }
    }

    fn parse(&self, source: &str) -> Result<tree_sitter::Tree, DomainError> {
        let mut parser = self
            .parser_cache
            .get_parser(self.language)
            .ok_or_else(|| DomainError::parse(format!("no parser available for {}", self.language)))?;
        parser
            .parse(source, None)
            .ok_or_else(|| DomainError::parse(format!("tree-sitter failed to parse {} source", self.language)))
    }

    fn variable_names(&self, source: &str, decl: Node) -> Vec<(String, Node<'_>)> {
        let mut out = Vec::new();
        let mut cursor = decl.walk();
        for declarator in decl.children(&mut cursor) {
            if declarator.kind() != "variable_declarator" {
                continue;
            }
            let Some(name_node) = declarator.child_by_field_name("name") else { continue };
            for name in identifier_names(source, name_node, IDENTIFIER_KINDS) {
                out.push((name, declarator));
            }
        }
        out
    }

    fn import_source_symbols(&self, source: &str, node: Node) -> (String, Vec<String>) {
        let mut module = String::new();
        let mut symbols = Vec::new();
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            match child.kind() {
                "string" => module = node_text(source, child).trim_matches(|c| c == '"' || c == '\'').to_string(),
                "import_clause" => collect_import_clause(source, child, &mut symbols),
                _ => {}
            }
        }
        (module, symbols)
    }

    fn is_dynamic_import_or_require(&self, source: &str, call: Node) -> bool {
        let Some(function) = call.child_by_field_name("function") else { return false };
        let text = node_text(source, function);
        text == "require" || function.kind() == "import"
    }
}

fn collect_import_clause(source: &str, clause: Node, symbols: &mut Vec<String>) {
    let mut cursor = clause.walk();
    for child in clause.children(&mut cursor) {
        match child.kind() {
            "identifier" => symbols.push(node_text(source, child).to_string()),
            "namespace_import" => symbols.push("*".to_string()),
            "named_imports" => {
                let mut inner = child.walk();
                for spec in child.children(&mut inner) {
                    if spec.kind() != "import_specifier" {
                        continue;
                    }
                    if let Some(name) = spec.child_by_field_name("name") {
                        symbols.push(node_text(source, name).to_string());
                    }
                }
            }
            _ => {}
        }
    }
}

#[async_trait]
impl LanguageExtractor for JavaScriptExtractor {
    fn language(&self) -> Language {
        self.language
    }

    async fn extract_imports(&self, source: &str, alloc: &mut BlockIdAllocator) -> Result<Vec<CodeBlock>, DomainError> {
        let tree = self.parse(source)?;
        let mut blocks = Vec::new();

        for node in all_of_type(tree.root_node(), &["import_statement"]) {
            let (module, mut symbols) = self.import_source_symbols(source, node);
            if symbols.is_empty() && !module.is_empty() {
                symbols.push("*".to_string());
            }
            let id = alloc
                .next()
                .ok_or_else(|| DomainError::parse("block id sequence overflow: file has more than 4096 blocks"))?;
            let (start_line, end_line, start_col, end_col) = node_position(node);
            blocks.push(
                CodeBlock::new(id, BlockType::Import, "import", node_text(source, node), start_line, end_line, start_col, end_col)
                    .with_symbols(symbols),
            );
        }

        for call in all_of_type(tree.root_node(), &["call_expression"]) {
            if !self.is_dynamic_import_or_require(source, call) {
                continue;
            }
            let id = alloc
                .next()
                .ok_or_else(|| DomainError::parse("block id sequence overflow: file has more than 4096 blocks"))?;
            let (start_line, end_line, start_col, end_col) = node_position(call);
            blocks.push(
                CodeBlock::new(id, BlockType::Import, "import", node_text(source, call), start_line, end_line, start_col, end_col)
                    .with_symbols(vec!["*".to_string()]),
            );
        }

        Ok(blocks)
    }

    async fn extract_exports(&self, source: &str, alloc: &mut BlockIdAllocator) -> Result<Vec<CodeBlock>, DomainError> {
        let tree = self.parse(source)?;
        let mut blocks = Vec::new();
        for node in all_of_type(tree.root_node(), &["export_statement"]) {
            let names = identifier_names(source, node, IDENTIFIER_KINDS);
            let id = alloc
                .next()
                .ok_or_else(|| DomainError::parse("block id sequence overflow: file has more than 4096 blocks"))?;
            let (start_line, end_line, start_col, end_col) = node_position(node);
            blocks.push(
                CodeBlock::new(id, BlockType::Export, "export", node_text(source, node), start_line, end_line, start_col, end_col)
                    .with_symbols(names),
            );
        }
        Ok(blocks)
    }

    /// JavaScript has no enum syntax.
    async fn extract_enums(&self, _source: &str, _alloc: &mut BlockIdAllocator) -> Result<Vec<CodeBlock>, DomainError> {
        Ok(Vec::new())
    }

    async fn extract_variables(&self, source: &str, alloc: &mut BlockIdAllocator) -> Result<Vec<CodeBlock>, DomainError> {
        let tree = self.parse(source)?;
        let mut blocks = Vec::new();
        for decl in direct_children_of_type(tree.root_node(), VARIABLE_DECL_KINDS, TRANSPARENT) {
            for (name, declarator) in self.variable_names(source, decl) {
                blocks.push(block_from_node(source, declarator, BlockType::Variable, name, alloc)?);
            }
        }
        Ok(blocks)
    }

    async fn extract_functions(&self, source: &str, alloc: &mut BlockIdAllocator) -> Result<Vec<CodeBlock>, DomainError> {
        let tree = self.parse(source)?;
        let mut blocks = Vec::new();
        for node in direct_children_of_type(tree.root_node(), &["function_declaration"], TRANSPARENT) {
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
        for node in direct_children_of_type(tree.root_node(), &["class_declaration"], TRANSPARENT) {
            let name = identifier_name(source, node, IDENTIFIER_KINDS);
            blocks.push(class_block_from_node(
                source,
                node,
                name,
                METHOD_KINDS,
                &["field_definition"],
                NESTED_FUNCTION_KINDS,
                IDENTIFIER_KINDS,
                COMMENT_PREFIX,
                alloc,
            )?);
        }
        Ok(blocks)
    }

    /// JavaScript has no interface syntax (that's TypeScript).
    async fn extract_interfaces(&self, _source: &str, _alloc: &mut BlockIdAllocator) -> Result<Vec<CodeBlock>, DomainError> {
        Ok(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extractor() -> JavaScriptExtractor {
        JavaScriptExtractor::new(std::sync::Arc::new(ParserCache::new()))
    }

    #[tokio::test]
    async fn test_extract_top_level_function() {
        let ex = extractor();
        let mut alloc = BlockIdAllocator::new("a.js");
        let blocks = ex.extract_functions("function foo() {}\n", &mut alloc).await.unwrap();
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].name(), "foo");
    }

    #[tokio::test]
    async fn test_extract_class_with_methods() {
        let ex = extractor();
        let mut alloc = BlockIdAllocator::new("a.js");
        let source = "class A {\n  f() {}\n  g() {}\n}\n";
        let blocks = ex.extract_classes(source, &mut alloc).await.unwrap();
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].content(), "");
        assert_eq!(blocks[0].children().len(), 2);
    }

    #[tokio::test]
    async fn test_extract_named_import() {
        let ex = extractor();
        let mut alloc = BlockIdAllocator::new("a.js");
        let blocks = ex.extract_imports("import { readFile } from 'fs';\n", &mut alloc).await.unwrap();
        assert_eq!(blocks.len(), 1);
        assert!(blocks[0].symbols().contains(&"readFile".to_string()));
    }

    #[tokio::test]
    async fn test_extract_require_call() {
        let ex = extractor();
        let mut alloc = BlockIdAllocator::new("a.js");
        let blocks = ex.extract_imports("const fs = require('fs');\n", &mut alloc).await.unwrap();
        assert_eq!(blocks.len(), 1);
    }
}
