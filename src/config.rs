use std::time::Duration;

use serde::Deserialize;
use serde_json::Value;

use crate::normalize::VendorSchema;
use crate::{Error, Result};

/// Start-up configuration as handed over by the host platform.
///
/// ```json
/// { "subscriptionKey": "...", "options": { "scan_interval": 120, "enable_sensors": true } }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SessionConfig {
    pub subscription_key: Option<String>,
    #[serde(default)]
    pub options: SessionOptions,
}

/// Keys the session does not know are ignored; hosts keep their own entries here.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SessionOptions {
    /// Seconds; raised to the 15 s floor when lower.
    pub scan_interval: Option<u64>,
    pub enable_sensors: Option<bool>,
    pub vendor_schema: Option<VendorSchema>,
}

impl SessionConfig {
    pub fn new(subscription_key: impl Into<String>) -> Self {
        Self {
            subscription_key: Some(subscription_key.into()),
            options: SessionOptions::default(),
        }
    }

    pub fn from_json(value: &Value) -> Result<Self> {
        Self::deserialize(value).map_err(|e| Error::UnknownConfiguration(e.to_string()))
    }

    pub fn from_json_str(s: &str) -> Result<Self> {
        serde_json::from_str(s).map_err(|e| Error::UnknownConfiguration(e.to_string()))
    }

    pub fn scan_interval(&self) -> Option<Duration> {
        self.options.scan_interval.map(Duration::from_secs)
    }

    /// The key, or `UnknownConfiguration` when the host supplied none.
    pub fn require_subscription_key(&self) -> Result<&str> {
        match self.subscription_key.as_deref() {
            Some(key) if !key.is_empty() => Ok(key),
            _ => Err(Error::UnknownConfiguration(
                "subscriptionKey is missing".to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_host_shape() {
        let config = SessionConfig::from_json(&json!({
            "subscriptionKey": "abc",
            "options": { "scan_interval": 30, "enable_sensors": true, "vendor_schema": "legacy" }
        }))
        .unwrap();
        assert_eq!(config.require_subscription_key().unwrap(), "abc");
        assert_eq!(config.scan_interval(), Some(Duration::from_secs(30)));
        assert_eq!(config.options.enable_sensors, Some(true));
        assert_eq!(config.options.vendor_schema, Some(VendorSchema::Legacy));
    }

    #[test]
    fn options_are_optional() {
        let config = SessionConfig::from_json_str(r#"{"subscriptionKey": "abc"}"#).unwrap();
        assert_eq!(config.options, SessionOptions::default());
        assert!(config.scan_interval().is_none());
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let err = SessionConfig::from_json(&json!({ "subscriptionKey": "abc", "password": "x" }))
            .unwrap_err();
        assert!(matches!(err, Error::UnknownConfiguration(_)));
    }

    #[test]
    fn malformed_json_is_a_configuration_error() {
        let err = SessionConfig::from_json_str("{ not json").unwrap_err();
        assert!(matches!(err, Error::UnknownConfiguration(_)));
    }

    #[test]
    fn host_keys_in_options_are_ignored() {
        let config = SessionConfig::from_json(&json!({
            "subscriptionKey": "k",
            "options": { "scan_interval": 120, "name": "OSO" }
        }))
        .unwrap();
        assert_eq!(config.scan_interval(), Some(Duration::from_secs(120)));
    }

    #[test]
    fn null_key_is_a_configuration_error() {
        let config = SessionConfig::from_json(&json!({ "subscriptionKey": null })).unwrap();
        assert!(matches!(
            config.require_subscription_key(),
            Err(Error::UnknownConfiguration(_))
        ));
    }
}
