use std::env;

/// Runtime configuration, read from the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub cognito_client_id: String,
    pub cognito_client_secret: Option<String>,
    pub bucket_name: String,
    pub public_base_url: Option<String>,
    pub table_name: String,
    pub persist_report_metadata: bool,
}

pub const DEFAULT_BUCKET_NAME: &str = "fixit-reports";
pub const DEFAULT_TABLE_NAME: &str = "fixit";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{name} must be true or false, got {value:?}")]
    InvalidBool { name: &'static str, value: String },
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build the config from any variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let cognito_client_id =
            non_empty("COGNITO_CLIENT_ID").ok_or(ConfigError::Missing("COGNITO_CLIENT_ID"))?;

        let persist_report_metadata = match non_empty("PERSIST_REPORT_METADATA") {
            None => true,
            Some(raw) => parse_bool(&raw).ok_or(ConfigError::InvalidBool {
                name: "PERSIST_REPORT_METADATA",
                value: raw,
            })?,
        };

        Ok(AppConfig {
            cognito_client_id,
            cognito_client_secret: non_empty("COGNITO_CLIENT_SECRET"),
            bucket_name: non_empty("S3_BUCKET_NAME").unwrap_or_else(|| DEFAULT_BUCKET_NAME.to_string()),
            public_base_url: non_empty("S3_PUBLIC_BASE_URL")
                .map(|url| url.trim_end_matches('/').to_string()),
            table_name: non_empty("TABLE_NAME").unwrap_or_else(|| DEFAULT_TABLE_NAME.to_string()),
            persist_report_metadata,
        })
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn defaults_apply_when_only_client_id_is_set() {
        let config = AppConfig::from_lookup(lookup(&[("COGNITO_CLIENT_ID", "client")])).unwrap();
        assert_eq!(config.cognito_client_id, "client");
        assert_eq!(config.cognito_client_secret, None);
        assert_eq!(config.bucket_name, DEFAULT_BUCKET_NAME);
        assert_eq!(config.table_name, DEFAULT_TABLE_NAME);
        assert_eq!(config.public_base_url, None);
        assert!(config.persist_report_metadata);
    }

    #[test]
    fn client_id_is_required() {
        let err = AppConfig::from_lookup(lookup(&[("COGNITO_CLIENT_ID", "  ")])).unwrap_err();
        assert_eq!(err, ConfigError::Missing("COGNITO_CLIENT_ID"));
    }

    #[test]
    fn overrides_are_read() {
        let config = AppConfig::from_lookup(lookup(&[
            ("COGNITO_CLIENT_ID", "client"),
            ("COGNITO_CLIENT_SECRET", "secret"),
            ("S3_BUCKET_NAME", "reports-bucket"),
            ("S3_PUBLIC_BASE_URL", "https://cdn.example.ie/"),
            ("TABLE_NAME", "reports"),
            ("PERSIST_REPORT_METADATA", "off"),
        ]))
        .unwrap();
        assert_eq!(config.cognito_client_secret.as_deref(), Some("secret"));
        assert_eq!(config.bucket_name, "reports-bucket");
        assert_eq!(config.public_base_url.as_deref(), Some("https://cdn.example.ie"));
        assert_eq!(config.table_name, "reports");
        assert!(!config.persist_report_metadata);
    }

    #[test]
    fn rejects_garbage_booleans() {
        let err = AppConfig::from_lookup(lookup(&[
            ("COGNITO_CLIENT_ID", "client"),
            ("PERSIST_REPORT_METADATA", "maybe"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidBool { .. }));
    }
}
