use async_trait::async_trait;

use super::model::BlobRef;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StorageError {
    #[error("Object not found: {0}")]
    NotFound(String),
    #[error("Invalid storage reference: {0}")]
    InvalidReference(String),
    #[error("{0}")]
    Service(String),
}

/// Blob collaborator: binary objects grouped under namespace keys.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Direct children of `namespace`, in the store's listing order.
    async fn list_children(&self, namespace: &str) -> Result<Vec<BlobRef>, StorageError>;

    /// Stable URL the object can be fetched from.
    async fn retrieval_url(&self, blob: &BlobRef) -> Result<String, StorageError>;

    async fn upload(
        &self,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<BlobRef, StorageError>;

    async fn delete(&self, blob: &BlobRef) -> Result<(), StorageError>;

    /// Re-derive an object reference from one of this store's retrieval URLs.
    fn reference_from_url(&self, url: &str) -> Result<BlobRef, StorageError>;
}
