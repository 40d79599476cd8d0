use serde::{Deserialize, Serialize};

/// Discriminator for `CodeBlock` (SPEC_FULL.md §3, §9's tagged-union redesign flag).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockType {
    Enum,
    Variable,
    Function,
    Class,
    Interface,
    Type,
    Import,
    Export,
}

impl BlockType {
    pub fn as_str(&self) -> &'static str {
        match self {
            BlockType::Enum => "enum",
            BlockType::Variable => "variable",
            BlockType::Function => "function",
            BlockType::Class => "class",
            BlockType::Interface => "interface",
            BlockType::Type => "type",
            BlockType::Import => "import",
            BlockType::Export => "export",
        }
    }
}

impl std::fmt::Display for BlockType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A named, positioned span of source with a type tag and optional children
/// (SPEC_FULL.md §3). Children are owned outright — no back-pointer to the parent is
/// stored on the child; `parent_block_id` lives only on the persisted row (§9's
/// "parent/child cycles" redesign flag).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodeBlock {
    id: u64,
    #[serde(rename = "type")]
    block_type: BlockType,
    name: String,
    content: String,
    symbols: Vec<String>,
    start_line: u32,
    end_line: u32,
    start_col: u32,
    end_col: u32,
    children: Vec<CodeBlock>,
}

impl CodeBlock {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: u64,
        block_type: BlockType,
        name: impl Into<String>,
        content: impl Into<String>,
        start_line: u32,
        end_line: u32,
        start_col: u32,
        end_col: u32,
    ) -> Self {
        Self {
            id,
            block_type,
            name: name.into(),
            content: content.into(),
            symbols: Vec::new(),
            start_line,
            end_line,
            start_col,
            end_col,
            children: Vec::new(),
        }
    }

    pub fn with_symbols(mut self, symbols: Vec<String>) -> Self {
        self.symbols = symbols;
        self
    }

    pub fn with_children(mut self, children: Vec<CodeBlock>) -> Self {
        self.children = children;
        self
    }

    pub fn set_content(&mut self, content: impl Into<String>) {
        self.content = content.into();
    }

    pub fn push_child(&mut self, child: CodeBlock) {
        self.children.push(child);
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn block_type(&self) -> BlockType {
        self.block_type
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    pub fn start_line(&self) -> u32 {
        self.start_line
    }

    pub fn end_line(&self) -> u32 {
        self.end_line
    }

    pub fn start_col(&self) -> u32 {
        self.start_col
    }

    pub fn end_col(&self) -> u32 {
        self.end_col
    }

    pub fn children(&self) -> &[CodeBlock] {
        &self.children
    }

    pub fn line_count(&self) -> u32 {
        self.end_line.saturating_sub(self.start_line) + 1
    }

    /// Whether this block's span fully contains `other`'s span (P4 parent consistency).
    pub fn contains(&self, other: &CodeBlock) -> bool {
        self.start_line <= other.start_line && other.end_line <= self.end_line
    }

    /// Flattens this block and every descendant into a single list, depth-first,
    /// preserving source order. Used by the persistence layer's `bulk_insert_blocks`.
    pub fn flatten(&self) -> Vec<&CodeBlock> {
        let mut out = vec![self];
        for child in &self.children {
            out.extend(child.flatten());
        }
        out
    }
}
