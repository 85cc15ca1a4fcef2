use std::future::Future;
use std::sync::{Mutex, RwLock};

use reqwest::Method;
use serde_json::Value;
use tracing::{debug, trace, warn};

use crate::logger::MessageLogger;
use crate::protocol::{self, DeviceField, SUBSCRIPTION_KEY_HEADER};
use crate::{Error, Result};

/// Raw outcome of one API call. HTTP error statuses are reported here, not as
/// errors.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Option<Value>,
}

impl ApiResponse {
    pub fn new(status: u16, body: Option<Value>) -> Self {
        Self { status, body }
    }

    /// Any 2xx status. Reads accept this.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Exactly 200. Writes require this.
    pub fn is_ok(&self) -> bool {
        self.status == 200
    }
}

/// The cloud endpoints the session needs. One call per operation, no retries.
///
/// Implementations return `Error::NoSubscriptionKey` before any network I/O
/// when no key is configured, and `Error::Http` for transport failures.
pub trait RemoteApi: Send + Sync {
    fn list_devices(&self) -> impl Future<Output = Result<ApiResponse>> + Send;

    fn get_field(
        &self,
        device_id: &str,
        field: DeviceField,
    ) -> impl Future<Output = Result<ApiResponse>> + Send;

    fn set_power(
        &self,
        device_id: &str,
        on: bool,
        full_utilization: bool,
    ) -> impl Future<Output = Result<ApiResponse>> + Send;

    fn set_v40_min(&self, device_id: &str, value: f64) -> impl Future<Output = Result<ApiResponse>> + Send;

    fn set_optimization_mode(
        &self,
        device_id: &str,
        option: &str,
        sub_option: &str,
    ) -> impl Future<Output = Result<ApiResponse>> + Send;

    fn set_profile(
        &self,
        device_id: &str,
        hours: &[f64; 24],
    ) -> impl Future<Output = Result<ApiResponse>> + Send;

    fn set_subscription_key(&self, key: Option<String>);
}

/// `RemoteApi` over HTTPS with the subscription-key header.
pub struct HttpApi {
    http: reqwest::Client,
    base_url: String,
    subscription_key: RwLock<Option<String>>,
    logger: Option<Mutex<MessageLogger>>,
}

impl HttpApi {
    pub(crate) fn new(
        http: reqwest::Client,
        base_url: impl Into<String>,
        subscription_key: Option<String>,
        logger: Option<MessageLogger>,
    ) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            subscription_key: RwLock::new(subscription_key),
            logger: logger.map(Mutex::new),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn current_key(&self) -> Result<String> {
        let guard = self
            .subscription_key
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        match guard.as_deref() {
            Some(key) if !key.is_empty() => Ok(key.to_string()),
            _ => Err(Error::NoSubscriptionKey),
        }
    }

    async fn request(&self, method: Method, path: &str, body: Option<Value>) -> Result<ApiResponse> {
        let key = self.current_key()?;
        let url = format!("{}{}", self.base_url, path);
        debug!(method = %method, url = %url, "calling OSO API");

        if let Some(logger) = &self.logger
            && let Ok(mut logger) = logger.lock()
        {
            logger.log_request(method.as_str(), path, body.as_ref());
        }

        let mut req = self
            .http
            .request(method, url.as_str())
            .header(SUBSCRIPTION_KEY_HEADER, key)
            .header(reqwest::header::ACCEPT, "*/*");
        if let Some(ref body) = body {
            req = req.json(body);
        }

        let resp = req.send().await?;
        let status = resp.status().as_u16();
        let text = resp.text().await?;
        let body = protocol::parse_body(&text);

        if let Some(logger) = &self.logger
            && let Ok(mut logger) = logger.lock()
        {
            logger.log_response(path, status, body.as_ref());
        }

        match status {
            200..=299 => trace!(url = %url, status, "OSO API call succeeded"),
            401 | 403 => warn!(url = %url, status, "subscription key not authorized"),
            _ => warn!(url = %url, status, "OSO API call failed"),
        }

        Ok(ApiResponse { status, body })
    }
}

impl RemoteApi for HttpApi {
    async fn list_devices(&self) -> Result<ApiResponse> {
        self.request(Method::GET, &protocol::devices_path(), None).await
    }

    async fn get_field(&self, device_id: &str, field: DeviceField) -> Result<ApiResponse> {
        self.request(Method::GET, &protocol::field_path(device_id, field), None)
            .await
    }

    async fn set_power(&self, device_id: &str, on: bool, full_utilization: bool) -> Result<ApiResponse> {
        self.request(
            Method::POST,
            &protocol::power_path(device_id, on, full_utilization),
            None,
        )
        .await
    }

    async fn set_v40_min(&self, device_id: &str, value: f64) -> Result<ApiResponse> {
        self.request(Method::PUT, &protocol::set_v40_min_path(device_id, value), None)
            .await
    }

    async fn set_optimization_mode(&self, device_id: &str, option: &str, sub_option: &str) -> Result<ApiResponse> {
        let body = protocol::optimization_mode_body(option, sub_option);
        self.request(Method::PUT, &protocol::optimization_mode_path(device_id), Some(body))
            .await
    }

    async fn set_profile(&self, device_id: &str, hours: &[f64; 24]) -> Result<ApiResponse> {
        let body = protocol::profile_body(hours);
        self.request(Method::PUT, &protocol::profile_path(device_id), Some(body))
            .await
    }

    fn set_subscription_key(&self, key: Option<String>) {
        let mut guard = self
            .subscription_key
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *guard = key;
    }
}
