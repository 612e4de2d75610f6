use futures::future::try_join_all;

use super::model::{
    detect_content_type, image_key, namespace_key, owner_from_key, BlobRef, StoredImage,
    OCTET_STREAM,
};
use super::store::{BlobStore, StorageError};

/// Load all images in a user's namespace with their retrieval URLs.
///
/// URLs are resolved concurrently; one failed resolution fails the listing.
pub async fn list_images(
    store: &dyn BlobStore,
    user_id: &str,
) -> Result<Vec<StoredImage>, StorageError> {
    let namespace = namespace_key(user_id);
    let refs = store.list_children(&namespace).await?;

    let urls = try_join_all(refs.iter().map(|blob| store.retrieval_url(blob))).await?;

    Ok(refs
        .into_iter()
        .zip(urls)
        .map(|(blob, url)| StoredImage { key: blob.key, url })
        .collect())
}

/// Upload an image under `images/{user_id}/{now_ms}`
pub async fn upload_image(
    store: &dyn BlobStore,
    user_id: &str,
    bytes: Vec<u8>,
) -> Result<StoredImage, StorageError> {
    let now_ms = chrono::Utc::now().timestamp_millis();
    upload_image_at(store, user_id, bytes, now_ms).await
}

/// Upload an image under an explicit timestamp key. Formats the sniffer
/// does not know (HEIC and the like) go up as `application/octet-stream`.
pub async fn upload_image_at(
    store: &dyn BlobStore,
    user_id: &str,
    bytes: Vec<u8>,
    timestamp_ms: i64,
) -> Result<StoredImage, StorageError> {
    let content_type = detect_content_type(&bytes).unwrap_or(OCTET_STREAM);
    let key = image_key(user_id, timestamp_ms);

    tracing::info!(
        "📤 upload_image: key={}, content_type={}, size={}",
        key,
        content_type,
        bytes.len()
    );

    let blob = store.upload(&key, bytes, content_type).await?;
    let url = store.retrieval_url(&blob).await?;

    Ok(StoredImage { key: blob.key, url })
}

/// Delete the object behind one of `user_id`'s retrieval URLs. Returns the
/// deleted key. URLs outside the user's namespace are refused before any
/// collaborator call.
pub async fn delete_by_url(
    store: &dyn BlobStore,
    user_id: &str,
    url: &str,
) -> Result<BlobRef, StorageError> {
    let blob = store.reference_from_url(url)?;
    if owner_from_key(&blob.key) != Some(user_id) {
        return Err(StorageError::InvalidReference(url.to_string()));
    }
    store.delete(&blob).await?;
    Ok(blob)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MemoryBlobStore, PNG_BYTES};

    #[tokio::test]
    async fn lists_only_the_users_namespace() {
        let store = MemoryBlobStore::new();
        store.insert("images/alice/1", PNG_BYTES.to_vec());
        store.insert("images/alice/2", PNG_BYTES.to_vec());
        store.insert("images/bob/3", PNG_BYTES.to_vec());

        let images = list_images(&store, "alice").await.unwrap();
        let keys: Vec<_> = images.iter().map(|i| i.key.as_str()).collect();
        assert_eq!(keys, vec!["images/alice/1", "images/alice/2"]);
        assert_eq!(images[0].url, "memory://blobs/images/alice/1");
    }

    #[tokio::test]
    async fn unknown_formats_upload_as_octet_stream() {
        let store = MemoryBlobStore::new();
        let heic = b"\0\0\0\x18ftypheic\0\0\0\0mif1heic".to_vec();
        let stored = upload_image_at(&store, "alice", heic.clone(), 7).await.unwrap();

        assert_eq!(store.upload_calls(), 1);
        assert_eq!(store.bytes_of("images/alice/7"), Some(heic));
        assert_eq!(
            store.content_type_of(&stored.key).as_deref(),
            Some("application/octet-stream")
        );
    }

    #[tokio::test]
    async fn upload_writes_under_timestamp_key() {
        let store = MemoryBlobStore::new();
        let stored = upload_image_at(&store, "alice", PNG_BYTES.to_vec(), 42)
            .await
            .unwrap();
        assert_eq!(stored.key, "images/alice/42");
        assert_eq!(store.content_type_of("images/alice/42").as_deref(), Some("image/png"));
    }

    #[tokio::test]
    async fn delete_by_url_rederives_the_reference() {
        let store = MemoryBlobStore::new();
        store.insert("images/alice/1", PNG_BYTES.to_vec());

        let deleted = delete_by_url(&store, "alice", "memory://blobs/images/alice/1")
            .await
            .unwrap();
        assert_eq!(deleted.key, "images/alice/1");
        assert!(!store.contains("images/alice/1"));

        let err = delete_by_url(&store, "alice", "https://elsewhere/x").await.unwrap_err();
        assert!(matches!(err, StorageError::InvalidReference(_)));
    }

    #[tokio::test]
    async fn delete_by_url_refuses_other_namespaces() {
        let store = MemoryBlobStore::new();
        store.insert("images/bob/5", PNG_BYTES.to_vec());

        let err = delete_by_url(&store, "alice", "memory://blobs/images/bob/5")
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::InvalidReference(_)));
        assert!(store.contains("images/bob/5"));
        assert_eq!(store.delete_calls(), 0);
    }
}
