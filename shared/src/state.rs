use std::sync::Arc;

use aws_sdk_cognitoidentityprovider::Client as CognitoClient;
use aws_sdk_dynamodb::Client as DynamoClient;
use aws_sdk_s3::Client as S3Client;
use fixit_atoms::media::BlobStore;
use fixit_atoms::reports::ReportStore;
use fixit_atoms::users::IdentityProvider;

use crate::auth::CognitoIdentity;
use crate::config::{AppConfig, ConfigError};
use crate::records::DynamoReportStore;
use crate::storage::S3BlobStore;

/// AWS clients and configuration shared by every collaborator.
#[derive(Clone)]
pub struct AppState {
    pub cognito_client: CognitoClient,
    pub s3_client: S3Client,
    pub dynamo_client: DynamoClient,
    pub config: AppConfig,
}

impl AppState {
    /// Load AWS settings and app configuration from the environment.
    pub async fn from_env() -> Result<Self, ConfigError> {
        let config = AppConfig::from_env()?;
        let aws = aws_config::load_from_env().await;

        tracing::info!(
            "⚙️ AppState ready: bucket={}, table={}, region={:?}, persist_metadata={}",
            config.bucket_name,
            config.table_name,
            aws.region(),
            config.persist_report_metadata
        );

        Ok(Self {
            cognito_client: CognitoClient::new(&aws),
            s3_client: S3Client::new(&aws),
            dynamo_client: DynamoClient::new(&aws),
            config,
        })
    }

    pub fn identity(&self) -> Arc<dyn IdentityProvider> {
        Arc::new(CognitoIdentity::new(
            self.cognito_client.clone(),
            self.config.cognito_client_id.clone(),
            self.config.cognito_client_secret.clone(),
        ))
    }

    pub fn blob_store(&self) -> Arc<dyn BlobStore> {
        Arc::new(S3BlobStore::new(
            self.s3_client.clone(),
            self.config.bucket_name.clone(),
            self.config.public_base_url.clone(),
        ))
    }

    /// Report metadata store, or `None` when only images are persisted.
    pub fn report_store(&self) -> Option<Arc<dyn ReportStore>> {
        if !self.config.persist_report_metadata {
            return None;
        }
        Some(Arc::new(DynamoReportStore::new(
            self.dynamo_client.clone(),
            self.config.table_name.clone(),
        )))
    }
}
