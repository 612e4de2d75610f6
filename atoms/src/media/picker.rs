use async_trait::async_trait;

use super::model::LocalImage;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MediaError {
    #[error("Could not read {uri}: {message}")]
    Unreadable { uri: String, message: String },
    #[error("{0}")]
    Picker(String),
}

/// Device media picker.
#[async_trait]
pub trait MediaPicker: Send + Sync {
    /// Ask the user for an image. `Ok(None)` means the selection was cancelled.
    async fn pick_image(&self) -> Result<Option<LocalImage>, MediaError>;

    /// Bytes behind a picked image. Defaults to reading the local file.
    async fn read_image(&self, image: &LocalImage) -> Result<Vec<u8>, MediaError> {
        let path = image.uri.strip_prefix("file://").unwrap_or(&image.uri);
        tokio::fs::read(path).await.map_err(|e| MediaError::Unreadable {
            uri: image.uri.clone(),
            message: e.to_string(),
        })
    }
}
