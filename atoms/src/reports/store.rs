use async_trait::async_trait;

use super::model::ReportRecord;
use crate::media::StorageError;

/// Store for report metadata, keyed by owner and report id.
#[async_trait]
pub trait ReportStore: Send + Sync {
    async fn put_report(&self, record: &ReportRecord) -> Result<(), StorageError>;

    async fn list_reports(&self, user_id: &str) -> Result<Vec<ReportRecord>, StorageError>;

    async fn delete_report(&self, user_id: &str, report_id: &str) -> Result<(), StorageError>;
}
