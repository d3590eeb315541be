//! Storage layer for todo documents

mod document_store;

pub use document_store::{Collection, DocumentStore};

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{ObjectId, TodoDocument, TodoUpdate};

/// Operations the HTTP layer needs from one todo collection.
///
/// Store failures are returned as-is; callers decide how to report them.
#[async_trait]
pub trait TodoStore: Send + Sync {
    /// Persist a new document and return its identifier
    async fn insert(&self, doc: &TodoDocument) -> Result<ObjectId>;

    /// All documents in insertion order
    async fn find_all(&self) -> Result<Vec<TodoDocument>>;

    /// Overwrite title and completed; `Error::NotFound` if no document has `id`
    async fn update_by_id(&self, id: ObjectId, update: &TodoUpdate) -> Result<()>;

    /// Remove a document; `Error::NotFound` if no document has `id`
    async fn delete_by_id(&self, id: ObjectId) -> Result<()>;
}
