use async_trait::async_trait;
use aws_sdk_s3::error::{DisplayErrorContext, ProvideErrorMetadata};
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client as S3Client;
use fixit_atoms::media::{BlobRef, BlobStore, StorageError};

/// Blob store backed by an S3 bucket.
///
/// Retrieval URLs are plain object URLs, so they stay stable for the life of
/// the object and can be turned back into keys for deletion.
pub struct S3BlobStore {
    client: S3Client,
    bucket: String,
    base_url: String,
}

fn to_storage_error<E>(operation: &str, err: E) -> StorageError
where
    E: ProvideErrorMetadata + std::error::Error,
{
    match err.code() {
        Some("NoSuchKey") | Some("NotFound") => {
            StorageError::NotFound(err.message().unwrap_or("object not found").to_string())
        }
        Some(code) => StorageError::Service(format!(
            "S3 {} error: {}",
            operation,
            err.message().unwrap_or(code)
        )),
        None => StorageError::Service(format!(
            "S3 {} error: {}",
            operation,
            DisplayErrorContext(&err)
        )),
    }
}

/// Default public base for a bucket: `https://{bucket}.s3.{region}.amazonaws.com`
pub fn default_base_url(bucket: &str, region: Option<&str>) -> String {
    match region {
        Some(region) => format!("https://{}.s3.{}.amazonaws.com", bucket, region),
        None => format!("https://{}.s3.amazonaws.com", bucket),
    }
}

/// Parse bucket and key from an S3 URL like https://bucket.s3.amazonaws.com/key
/// or https://s3.<region>.amazonaws.com/bucket/key
pub fn parse_bucket_and_key(url: &str) -> Option<(String, String)> {
    let no_scheme = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))
        .unwrap_or(url);
    let no_query = no_scheme.split(|c: char| c == '?' || c == '#').next().unwrap_or(no_scheme);
    let (host, path) = no_query.split_once('/')?;

    let (bucket, key) = if host.starts_with("s3.") || host == "s3.amazonaws.com" {
        // Path style: s3.region.amazonaws.com/bucket/key
        let (bucket, key) = path.split_once('/')?;
        (bucket.to_string(), key.to_string())
    } else if host.contains(".s3.") || host.contains(".s3-") {
        // Virtual-hosted style: bucket.s3.region.amazonaws.com/key
        let bucket = host.split(".s3").next()?;
        (bucket.to_string(), path.to_string())
    } else {
        return None;
    };

    if bucket.is_empty() || key.is_empty() {
        return None;
    }
    Some((bucket, key))
}

impl S3BlobStore {
    pub fn new(client: S3Client, bucket: String, public_base_url: Option<String>) -> Self {
        let base_url = public_base_url.unwrap_or_else(|| {
            let region = client.config().region().map(|r| r.as_ref().to_string());
            default_base_url(&bucket, region.as_deref())
        });
        Self {
            client,
            bucket,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn url_for(&self, key: &str) -> String {
        format!("{}/{}", self.base_url, key)
    }

    fn key_from_url(&self, url: &str) -> Option<String> {
        if let Some(key) = url
            .strip_prefix(&self.base_url)
            .and_then(|rest| rest.strip_prefix('/'))
        {
            return Some(key.split(|c: char| c == '?' || c == '#').next().unwrap_or(key).to_string());
        }

        let (bucket, key) = parse_bucket_and_key(url)?;
        (bucket == self.bucket).then_some(key)
    }
}

#[async_trait]
impl BlobStore for S3BlobStore {
    async fn list_children(&self, namespace: &str) -> Result<Vec<BlobRef>, StorageError> {
        let prefix = format!("{}/", namespace.trim_end_matches('/'));
        let mut refs = Vec::new();
        let mut continuation: Option<String> = None;

        loop {
            let mut req = self
                .client
                .list_objects_v2()
                .bucket(&self.bucket)
                .prefix(&prefix)
                .delimiter("/");
            if let Some(token) = continuation.as_ref() {
                req = req.continuation_token(token);
            }
            let resp = req.send().await.map_err(|e| {
                tracing::error!("S3 list_objects_v2 failed for prefix {}: {}", prefix, DisplayErrorContext(&e));
                to_storage_error("list_objects_v2", e)
            })?;

            refs.extend(
                resp.contents()
                    .iter()
                    .filter_map(|o| o.key())
                    .filter(|k| k.len() > prefix.len())
                    .map(BlobRef::new),
            );

            if resp.is_truncated().unwrap_or(false) {
                continuation = resp.next_continuation_token().map(|s| s.to_string());
                if continuation.is_none() {
                    break;
                }
            } else {
                break;
            }
        }

        Ok(refs)
    }

    async fn retrieval_url(&self, blob: &BlobRef) -> Result<String, StorageError> {
        if blob.key.is_empty() {
            return Err(StorageError::InvalidReference(blob.key.clone()));
        }
        Ok(self.url_for(&blob.key))
    }

    async fn upload(
        &self,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<BlobRef, StorageError> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .body(ByteStream::from(bytes))
            .send()
            .await
            .map_err(|e| to_storage_error("put_object", e))?;
        Ok(BlobRef::new(key))
    }

    async fn delete(&self, blob: &BlobRef) -> Result<(), StorageError> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(&blob.key)
            .send()
            .await
            .map_err(|e| to_storage_error("delete_object", e))?;
        Ok(())
    }

    fn reference_from_url(&self, url: &str) -> Result<BlobRef, StorageError> {
        self.key_from_url(url)
            .filter(|k| !k.is_empty())
            .map(BlobRef::new)
            .ok_or_else(|| StorageError::InvalidReference(url.to_string()))
    }
}
