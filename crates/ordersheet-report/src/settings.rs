//! Store endpoint and API keys, read from the database config table.

use std::fmt;

use ordersheet_db::{DataAccess, DbValue, FetchOptions, TabularPayload};
use serde::Deserialize;
use tracing::debug;

use crate::{Error, Result};

pub const DEFAULT_CONFIG_TABLE: &str = "stock_update_config";

const ENDPOINT_COLUMN: &str = "endpoint_url";
const KEYS_COLUMN: &str = "endpoint_keys";

#[derive(Clone, PartialEq, Eq)]
pub struct StoreSettings {
    pub endpoint: String,
    pub consumer_key: String,
    pub consumer_secret: String,
}

#[derive(Deserialize)]
struct EndpointKeys {
    customer_key: Option<String>,
    client_secret: Option<String>,
}

impl StoreSettings {
    pub fn new(
        endpoint: impl Into<String>,
        consumer_key: impl Into<String>,
        consumer_secret: impl Into<String>,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            consumer_key: consumer_key.into(),
            consumer_secret: consumer_secret.into(),
        }
    }

    /// Reads the first row of `table`.
    pub async fn load(access: &DataAccess, table: &str) -> Result<Self> {
        let options = FetchOptions::default().with_columns([ENDPOINT_COLUMN, KEYS_COLUMN]);
        let payload = access.fetch(table, &options).await?;
        debug!(table, rows = payload.len(), "Loaded store settings rows");
        Self::from_payload(&payload)
    }

    pub fn from_payload(payload: &TabularPayload) -> Result<Self> {
        if payload.is_empty() {
            return Err(settings_error("config table has no rows"));
        }

        let endpoint = text_cell(payload, ENDPOINT_COLUMN)?;
        let keys: EndpointKeys = serde_json::from_str(&text_cell(payload, KEYS_COLUMN)?)
            .map_err(|e| settings_error(format!("{KEYS_COLUMN} is not valid JSON: {e}")))?;

        let consumer_key = keys
            .customer_key
            .ok_or_else(|| settings_error(format!("{KEYS_COLUMN} has no customer_key")))?;
        let consumer_secret = keys
            .client_secret
            .ok_or_else(|| settings_error(format!("{KEYS_COLUMN} has no client_secret")))?;

        Ok(Self {
            endpoint,
            consumer_key,
            consumer_secret,
        })
    }
}

impl fmt::Debug for StoreSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreSettings")
            .field("endpoint", &self.endpoint)
            .field("consumer_key", &self.consumer_key)
            .field("consumer_secret", &"<redacted>")
            .finish()
    }
}

fn text_cell(payload: &TabularPayload, column: &str) -> Result<String> {
    match payload.get(0, column) {
        Some(DbValue::Null) => Err(settings_error(format!("{column} is null"))),
        Some(value) => Ok(value.to_string()),
        None => Err(settings_error(format!("missing column {column}"))),
    }
}

fn settings_error(details: impl Into<String>) -> Error {
    Error::Settings {
        details: details.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(endpoint: DbValue, keys: &str) -> TabularPayload {
        TabularPayload::new([ENDPOINT_COLUMN, KEYS_COLUMN])
            .unwrap()
            .with_row([endpoint, DbValue::from(keys)])
            .unwrap()
    }

    #[test]
    fn test_from_payload() {
        let payload = payload(
            DbValue::from("shop.example.com"),
            r#"{"customer_key": "ck_1", "client_secret": "cs_1"}"#,
        );

        let settings = StoreSettings::from_payload(&payload).unwrap();
        assert_eq!(settings, StoreSettings::new("shop.example.com", "ck_1", "cs_1"));
    }

    #[test]
    fn test_empty_table() {
        let payload = TabularPayload::new([ENDPOINT_COLUMN, KEYS_COLUMN]).unwrap();
        let err = StoreSettings::from_payload(&payload).unwrap_err();
        assert!(err.to_string().contains("no rows"));
    }

    #[test]
    fn test_invalid_keys_json() {
        let payload = payload(DbValue::from("shop.example.com"), "not json");
        let err = StoreSettings::from_payload(&payload).unwrap_err();
        assert!(matches!(err, Error::Settings { .. }));
    }

    #[test]
    fn test_missing_secret() {
        let payload = payload(DbValue::from("shop.example.com"), r#"{"customer_key": "ck"}"#);
        let err = StoreSettings::from_payload(&payload).unwrap_err();
        assert!(err.to_string().contains("client_secret"));
    }

    #[test]
    fn test_null_endpoint() {
        let payload = payload(DbValue::Null, r#"{"customer_key": "a", "client_secret": "b"}"#);
        assert!(StoreSettings::from_payload(&payload).is_err());
    }

    #[test]
    fn test_debug_redacts_secret() {
        let settings = StoreSettings::new("shop", "ck", "very-secret");
        let debug = format!("{settings:?}");
        assert!(!debug.contains("very-secret"));
    }
}
