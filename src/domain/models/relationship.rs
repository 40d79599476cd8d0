use serde::{Deserialize, Serialize};

/// An import edge between two files in the same snapshot (SPEC_FULL.md §3). Owned by
/// its source file: deleting the source file cascades the edge, deleting the target
/// does not (the reconciler is responsible for sweeping edges left dangling that way).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Relationship {
    source_file_id: u64,
    target_file_id: u64,
    import_content: String,
    kind: RelationshipKind,
}

impl Relationship {
    pub fn new(
        source_file_id: u64,
        target_file_id: u64,
        import_content: impl Into<String>,
    ) -> Self {
        Self {
            source_file_id,
            target_file_id,
            import_content: import_content.into(),
            kind: RelationshipKind::Import,
        }
    }

    pub fn source_file_id(&self) -> u64 {
        self.source_file_id
    }

    pub fn target_file_id(&self) -> u64 {
        self.target_file_id
    }

    pub fn import_content(&self) -> &str {
        &self.import_content
    }

    pub fn kind(&self) -> RelationshipKind {
        self.kind
    }

    /// Whether this edge's source and target are the same file — the resolver drops
    /// these before they ever become a `Relationship` (§4.4), so this is a sanity check.
    pub fn is_self_reference(&self) -> bool {
        self.source_file_id == self.target_file_id
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationshipKind {
    Import,
}

impl RelationshipKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RelationshipKind::Import => "import",
        }
    }
}

impl std::fmt::Display for RelationshipKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
