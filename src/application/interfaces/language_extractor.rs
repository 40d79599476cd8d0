use async_trait::async_trait;

use crate::domain::{BlockIdAllocator, CodeBlock, DomainError, Language};

/// Per-language block extraction (§4.3). Implementors own their tree-sitter grammar
/// and node-type tables; this boundary keeps `tree_sitter` entirely inside the
/// connector layer, the same separation the teacher's `ParserService` port keeps.
///
/// The capability set mirrors the original extractor's composable methods; `extract_all`
/// has a default that calls them in the fixed order the spec requires (imports, exports,
/// enums, variables, functions, classes, interfaces) so a language that has no notion of,
/// say, interfaces can simply return an empty vec from that one method.
#[async_trait]
pub trait LanguageExtractor: Send + Sync {
    fn language(&self) -> Language;

    async fn extract_imports(&self, source: &str, alloc: &mut BlockIdAllocator) -> Result<Vec<CodeBlock>, DomainError>;

    async fn extract_exports(&self, source: &str, alloc: &mut BlockIdAllocator) -> Result<Vec<CodeBlock>, DomainError>;

    async fn extract_enums(&self, source: &str, alloc: &mut BlockIdAllocator) -> Result<Vec<CodeBlock>, DomainError>;

    async fn extract_variables(&self, source: &str, alloc: &mut BlockIdAllocator) -> Result<Vec<CodeBlock>, DomainError>;

    async fn extract_functions(&self, source: &str, alloc: &mut BlockIdAllocator) -> Result<Vec<CodeBlock>, DomainError>;

    async fn extract_classes(&self, source: &str, alloc: &mut BlockIdAllocator) -> Result<Vec<CodeBlock>, DomainError>;

    async fn extract_interfaces(&self, source: &str, alloc: &mut BlockIdAllocator) -> Result<Vec<CodeBlock>, DomainError>;

    async fn extract_all(&self, source: &str, alloc: &mut BlockIdAllocator) -> Result<Vec<CodeBlock>, DomainError> {
        let mut blocks = Vec::new();
        blocks.extend(self.extract_imports(source, alloc).await?);
        blocks.extend(self.extract_exports(source, alloc).await?);
        blocks.extend(self.extract_enums(source, alloc).await?);
        blocks.extend(self.extract_variables(source, alloc).await?);
        blocks.extend(self.extract_functions(source, alloc).await?);
        blocks.extend(self.extract_classes(source, alloc).await?);
        blocks.extend(self.extract_interfaces(source, alloc).await?);
        Ok(blocks)
    }
}
