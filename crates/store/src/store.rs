use crate::{Document, DocumentPatch, DocumentQuery, NewDocument, Result};
use async_trait::async_trait;

/// External collaborator holding policy documents.
///
/// `find` returns matches in the store's natural order; no ranking is applied.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn find(&self, query: &DocumentQuery, limit: usize) -> Result<Vec<Document>>;

    async fn find_one(&self, query: &DocumentQuery) -> Result<Option<Document>> {
        Ok(self.find(query, 1).await?.into_iter().next())
    }

    /// Inserts a document and returns its assigned id.
    async fn insert(&self, doc: NewDocument) -> Result<String>;

    async fn update(&self, id: &str, patch: DocumentPatch) -> Result<Document>;

    /// Monotonic counter bumped on every successful mutation.
    fn generation(&self) -> u64;
}
