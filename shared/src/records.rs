use std::collections::HashMap;

use async_trait::async_trait;
use aws_sdk_dynamodb::error::DisplayErrorContext;
use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_dynamodb::Client as DynamoClient;
use fixit_atoms::media::StorageError;
use fixit_atoms::reports::{Address, Category, ReportRecord, ReportStatus, ReportStore};

/// Report metadata in a single DynamoDB table.
///
/// Layout: `PK = USER#{user_id}`, `SK = REPORT#{report_id}`; the address is
/// kept as a JSON string.
pub struct DynamoReportStore {
    client: DynamoClient,
    table_name: String,
}

fn user_pk(user_id: &str) -> String {
    format!("USER#{}", user_id)
}

fn report_sk(report_id: &str) -> String {
    format!("REPORT#{}", report_id)
}

fn get_s<'a>(item: &'a HashMap<String, AttributeValue>, name: &str) -> Option<&'a str> {
    item.get(name).and_then(|v| v.as_s().ok()).map(|s| s.as_str())
}

/// Attribute map for a record.
pub fn record_to_item(record: &ReportRecord) -> Result<HashMap<String, AttributeValue>, StorageError> {
    let address = serde_json::to_string(&record.address)
        .map_err(|e| StorageError::Service(format!("Failed to encode address: {}", e)))?;

    let mut item = HashMap::new();
    item.insert("PK".to_string(), AttributeValue::S(user_pk(&record.user_id)));
    item.insert("SK".to_string(), AttributeValue::S(report_sk(&record.report_id)));
    item.insert("image_key".to_string(), AttributeValue::S(record.image_key.clone()));
    item.insert("image_url".to_string(), AttributeValue::S(record.image_url.clone()));
    item.insert("description".to_string(), AttributeValue::S(record.description.clone()));
    item.insert("category".to_string(), AttributeValue::S(record.category.label().to_string()));
    item.insert("address".to_string(), AttributeValue::S(address));
    item.insert("status".to_string(), AttributeValue::S(record.status.label().to_string()));
    item.insert("created_at".to_string(), AttributeValue::S(record.created_at.clone()));
    Ok(item)
}

/// Parse a stored item back into a record. Items that are not reports, or
/// that carry an unknown category, are skipped.
pub fn record_from_item(item: &HashMap<String, AttributeValue>) -> Option<ReportRecord> {
    let user_id = get_s(item, "PK")?.strip_prefix("USER#")?;
    let report_id = get_s(item, "SK")?.strip_prefix("REPORT#")?;
    let category: Category = get_s(item, "category")?.parse().ok()?;

    let address = get_s(item, "address")
        .and_then(|raw| serde_json::from_str::<Address>(raw).ok())
        .unwrap_or_default();
    let status = get_s(item, "status")
        .and_then(|s| s.parse::<ReportStatus>().ok())
        .unwrap_or_default();

    Some(ReportRecord {
        report_id: report_id.to_string(),
        user_id: user_id.to_string(),
        image_key: get_s(item, "image_key").unwrap_or_default().to_string(),
        image_url: get_s(item, "image_url").unwrap_or_default().to_string(),
        description: get_s(item, "description").unwrap_or_default().to_string(),
        category,
        address,
        status,
        created_at: get_s(item, "created_at").unwrap_or_default().to_string(),
    })
}

impl DynamoReportStore {
    pub fn new(client: DynamoClient, table_name: String) -> Self {
        Self { client, table_name }
    }
}

#[async_trait]
impl ReportStore for DynamoReportStore {
    async fn put_report(&self, record: &ReportRecord) -> Result<(), StorageError> {
        let item = record_to_item(record)?;

        self.client
            .put_item()
            .table_name(&self.table_name)
            .set_item(Some(item))
            .send()
            .await
            .map_err(|e| {
                StorageError::Service(format!("DynamoDB put_item error: {}", DisplayErrorContext(&e)))
            })?;
        Ok(())
    }

    async fn list_reports(&self, user_id: &str) -> Result<Vec<ReportRecord>, StorageError> {
        let mut records = Vec::new();
        let mut start_key: Option<HashMap<String, AttributeValue>> = None;

        loop {
            let result = self
                .client
                .query()
                .table_name(&self.table_name)
                .key_condition_expression("PK = :pk AND begins_with(SK, :sk_prefix)")
                .expression_attribute_values(":pk", AttributeValue::S(user_pk(user_id)))
                .expression_attribute_values(":sk_prefix", AttributeValue::S("REPORT#".to_string()))
                .set_exclusive_start_key(start_key.take())
                .send()
                .await
                .map_err(|e| {
                    StorageError::Service(format!("DynamoDB query error: {}", DisplayErrorContext(&e)))
                })?;

            records.extend(result.items().iter().filter_map(record_from_item));

            match result.last_evaluated_key() {
                Some(key) if !key.is_empty() => start_key = Some(key.clone()),
                _ => break,
            }
        }

        Ok(records)
    }

    async fn delete_report(&self, user_id: &str, report_id: &str) -> Result<(), StorageError> {
        self.client
            .delete_item()
            .table_name(&self.table_name)
            .key("PK", AttributeValue::S(user_pk(user_id)))
            .key("SK", AttributeValue::S(report_sk(report_id)))
            .send()
            .await
            .map_err(|e| {
                StorageError::Service(format!("DynamoDB delete_item error: {}", DisplayErrorContext(&e)))
            })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> ReportRecord {
        ReportRecord {
            report_id: "1700000000000".into(),
            user_id: "u1".into(),
            image_key: "images/u1/1700000000000".into(),
            image_url: "https://reports.s3.amazonaws.com/images/u1/1700000000000".into(),
            description: "pothole".into(),
            category: Category::Potholes,
            address: Address {
                line1: "1 Main St".into(),
                line2: Some("Apt 2".into()),
                city: "Dublin".into(),
                eircode: "D01 F5P2".into(),
                country: "Ireland".into(),
            },
            status: ReportStatus::Pending,
            created_at: "2026-10-16T09:00:00+00:00".into(),
        }
    }

    #[test]
    fn items_use_user_and_report_keys() {
        let item = record_to_item(&record()).unwrap();
        assert_eq!(get_s(&item, "PK"), Some("USER#u1"));
        assert_eq!(get_s(&item, "SK"), Some("REPORT#1700000000000"));
        assert_eq!(get_s(&item, "category"), Some("Potholes"));
    }

    #[test]
    fn stored_items_parse_back() {
        let item = record_to_item(&record()).unwrap();
        assert_eq!(record_from_item(&item), Some(record()));
    }

    #[test]
    fn foreign_items_are_skipped() {
        let mut item = record_to_item(&record()).unwrap();
        item.insert("SK".to_string(), AttributeValue::S("USER#u1".to_string()));
        assert_eq!(record_from_item(&item), None);

        let mut item = record_to_item(&record()).unwrap();
        item.insert("category".to_string(), AttributeValue::S("Noise".to_string()));
        assert_eq!(record_from_item(&item), None);
    }
}
