use crate::workflows::accounts::ChildId;
use crate::workflows::StoreError;

use super::domain::{Document, DocumentKind};

/// Storage abstraction for the one-per-child legal documents.
///
/// `insert` carries the one-per-child invariant: implementations MUST check
/// for an existing document of the same kind and insert under mutual
/// exclusion scoped at least to the child, returning `StoreError::Conflict`
/// to the loser of a race. A SQL adapter gets this from the one-to-one
/// uniqueness constraint; the in-memory adapter uses its interior mutex.
pub trait DocumentRepository: Send + Sync {
    fn insert(&self, document: Document) -> Result<Document, StoreError>;
    fn fetch(&self, child: ChildId, kind: DocumentKind) -> Result<Option<Document>, StoreError>;
    fn for_child(&self, child: ChildId) -> Result<Vec<Document>, StoreError>;
}
