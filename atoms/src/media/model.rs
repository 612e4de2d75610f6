use image::ImageFormat;
use serde::{Deserialize, Serialize};

/// Prefix every user's report images live under.
pub const IMAGES_PREFIX: &str = "images";

/// Reference to an object held by the blob collaborator.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Hash)]
pub struct BlobRef {
    pub key: String,
}

impl BlobRef {
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }
}

/// A stored report image together with its retrieval URL.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct StoredImage {
    pub key: String,
    pub url: String,
}

/// Image chosen on the device, not yet uploaded.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct LocalImage {
    pub uri: String,
}

impl LocalImage {
    pub fn new(uri: impl Into<String>) -> Self {
        Self { uri: uri.into() }
    }
}

/// Namespace key grouping a user's images: `images/{user_id}`
pub fn namespace_key(user_id: &str) -> String {
    format!("{}/{}", IMAGES_PREFIX, user_id)
}

/// Item key for a new image: `images/{user_id}/{timestamp_ms}`
pub fn image_key(user_id: &str, timestamp_ms: i64) -> String {
    format!("{}/{}", namespace_key(user_id), timestamp_ms)
}

/// Last path segment of an image key, used as the report id.
pub fn report_id_from_key(key: &str) -> &str {
    key.rsplit('/').next().unwrap_or(key)
}

/// Owner encoded in an `images/{user_id}/...` key.
pub fn owner_from_key(key: &str) -> Option<&str> {
    let rest = key.strip_prefix(IMAGES_PREFIX)?.strip_prefix('/')?;
    let (owner, _) = rest.split_once('/')?;
    (!owner.is_empty()).then_some(owner)
}

/// Content type for payloads the sniffer does not recognise.
pub const OCTET_STREAM: &str = "application/octet-stream";

/// MIME type of an image payload, sniffed from its magic bytes.
pub fn detect_content_type(bytes: &[u8]) -> Option<&'static str> {
    let format = image::guess_format(bytes).ok()?;
    let mime = match format {
        ImageFormat::Png => "image/png",
        ImageFormat::Jpeg => "image/jpeg",
        ImageFormat::Gif => "image/gif",
        ImageFormat::WebP => "image/webp",
        ImageFormat::Bmp => "image/bmp",
        ImageFormat::Tiff => "image/tiff",
        _ => return None,
    };
    Some(mime)
}
