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
const IDENTIFIER_KINDS: &[&str] = &["identifier", "property_identifier", "type_identifier"];
const VARIABLE_DECL_KINDS: &[&str] = &["variable_declaration", "lexical_declaration"];
const NESTED_FUNCTION_KINDS: &[&str] = &[
    "function_declaration",
    "function_expression",
    "arrow_function",
    "method_definition",
    "method_signature",
];
const METHOD_KINDS: &[&str] = &["method_definition"];
const INTERFACE_METHOD_KINDS: &[&str] = &["method_signature"];
const COMMENT_PREFIX: &str = "//";

/// TypeScript block extractor (§4.3), grounded on
/// `original_source/indexer/extractors/typescript_extractor.py` for which
/// declarations count as enums/interfaces/type aliases, reimplemented over
/// `tree_sitter::Node` per the shared traversal shape in [`super::common`].
pub struct TypeScriptExtractor {
    parser_cache: std::sync::Arc<ParserCache>,
}

impl TypeScriptExtractor {
    pub fn new(parser_cache: std::sync::Arc<ParserCache>) -> Self {
        Self { parser_cache }
    }

    fn parse(&self, source: &str) -> Result<tree_sitter::Tree, DomainError> {
        let mut parser = self
            .parser_cache
            .get_parser(Language::TypeScript)
            .ok_or_else(|| DomainError::parse("no parser available for typescript"))?;
        parser
            .parse(source, None)
            .ok_or_else(|| DomainError::parse("tree-sitter failed to parse typescript source"))
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

    fn import_symbols(&self, source: &str, node: Node) -> Vec<String> {
        let mut symbols = Vec::new();
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            if child.kind() == "import_clause" {
                collect_import_clause(source, child, &mut symbols);
            }
        }
        symbols
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
impl LanguageExtractor for TypeScriptExtractor {
    fn language(&self) -> Language {
        Language::TypeScript
    }

    async fn extract_imports(&self, source: &str, alloc: &mut BlockIdAllocator) -> Result<Vec<CodeBlock>, DomainError> {
        let tree = self.parse(source)?;
        let mut blocks = Vec::new();

        for node in all_of_type(tree.root_node(), &["import_statement"]) {
            let mut symbols = self.import_symbols(source, node);
            if symbols.is_empty() {
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

    /// Unlike JavaScript, TypeScript has native `enum` syntax.
    async fn extract_enums(&self, source: &str, alloc: &mut BlockIdAllocator) -> Result<Vec<CodeBlock>, DomainError> {
        let tree = self.parse(source)?;
        let mut blocks = Vec::new();
        for node in direct_children_of_type(tree.root_node(), &["enum_declaration"], TRANSPARENT) {
            let name = identifier_name(source, node, IDENTIFIER_KINDS);
            blocks.push(block_from_node(source, node, BlockType::Enum, name, alloc)?);
        }
        Ok(blocks)
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
                &["public_field_definition"],
                NESTED_FUNCTION_KINDS,
                IDENTIFIER_KINDS,
                COMMENT_PREFIX,
                alloc,
            )?);
        }
        Ok(blocks)
    }

    /// `interface` declarations and `type` aliases both map to interface blocks —
    /// the closest structural analog the domain model offers for either.
    async fn extract_interfaces(&self, source: &str, alloc: &mut BlockIdAllocator) -> Result<Vec<CodeBlock>, DomainError> {
        let tree = self.parse(source)?;
        let mut blocks = Vec::new();
        for node in direct_children_of_type(tree.root_node(), &["interface_declaration"], TRANSPARENT) {
            let name = identifier_name(source, node, IDENTIFIER_KINDS);
            blocks.push(class_block_from_node(
                source,
                node,
                name,
                INTERFACE_METHOD_KINDS,
                &["property_signature"],
                NESTED_FUNCTION_KINDS,
                IDENTIFIER_KINDS,
                COMMENT_PREFIX,
                alloc,
            )?);
        }
        for node in direct_children_of_type(tree.root_node(), &["type_alias_declaration"], TRANSPARENT) {
            let name = identifier_name(source, node, IDENTIFIER_KINDS);
            blocks.push(block_from_node(source, node, BlockType::Interface, name, alloc)?);
        }
        Ok(blocks)
    }
}
