use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::api::{HttpApi, RemoteApi};
use crate::attributes::Attributes;
use crate::config::SessionConfig;
use crate::entities::{
    build_entities, sensor_status, water_heater_status, EntityList, SensorKind, SensorStatus,
    WaterHeaterStatus,
};
use crate::logger::{MessageLogMode, MessageLogger};
use crate::normalize::{NormalizationTables, VendorSchema};
use crate::protocol::{DeviceField, DEFAULT_BASE_URL};
use crate::recovery::RecoveryLedger;
use crate::snapshot::DeviceSnapshot;
use crate::sync::{SyncEngine, DEFAULT_SCAN_INTERVAL};
use crate::{Error, Result};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

pub struct SessionBuilder {
    subscription_key: Option<String>,
    base_url: String,
    scan_interval: Duration,
    enable_sensors: bool,
    schema: VendorSchema,
    timeout: Duration,
    log_mode: Option<MessageLogMode>,
    log_path: Option<String>,
}

impl SessionBuilder {
    pub fn new(subscription_key: impl Into<String>) -> Self {
        Self {
            subscription_key: Some(subscription_key.into()),
            base_url: DEFAULT_BASE_URL.to_string(),
            scan_interval: DEFAULT_SCAN_INTERVAL,
            enable_sensors: false,
            schema: VendorSchema::default(),
            timeout: DEFAULT_TIMEOUT,
            log_mode: None,
            log_path: None,
        }
    }

    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Raised to 15 s when lower.
    pub fn scan_interval(mut self, interval: Duration) -> Self {
        self.scan_interval = interval;
        self
    }

    pub fn enable_sensors(mut self, enabled: bool) -> Self {
        self.enable_sensors = enabled;
        self
    }

    pub fn vendor_schema(mut self, schema: VendorSchema) -> Self {
        self.schema = schema;
        self
    }

    /// Per-request timeout of the HTTP transport.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn message_log(mut self, mode: MessageLogMode, path: impl Into<String>) -> Self {
        self.log_mode = Some(mode);
        self.log_path = Some(path.into());
        self
    }

    pub fn build(mut self) -> Result<Session<HttpApi>> {
        let http = reqwest::Client::builder().timeout(self.timeout).build()?;

        let logger = match (self.log_mode.take(), self.log_path.take()) {
            (Some(mode), Some(path)) => Some(MessageLogger::new(mode, &path)?),
            _ => None,
        };

        let api = HttpApi::new(http, self.base_url.clone(), self.subscription_key.take(), logger);
        Ok(self.build_with_api(api))
    }

    /// Build over any transport. The builder's subscription key replaces the
    /// transport's.
    pub fn build_with_api<A: RemoteApi>(mut self, api: A) -> Session<A> {
        if let Some(key) = self.subscription_key.take() {
            api.set_subscription_key(Some(key));
        }
        Session {
            api,
            sync: SyncEngine::new(self.scan_interval),
            tables: RwLock::new(NormalizationTables::new(self.schema)),
            enable_sensors: AtomicBool::new(self.enable_sensors),
            recovery: Mutex::new(RecoveryLedger::new()),
        }
    }
}

/// One account's connection to the OSO cloud.
///
/// All methods take `&self`; share a session between tasks with `Arc`.
pub struct Session<A: RemoteApi = HttpApi> {
    pub(crate) api: A,
    pub(crate) sync: SyncEngine,
    tables: RwLock<NormalizationTables>,
    enable_sensors: AtomicBool,
    recovery: Mutex<RecoveryLedger>,
}

impl Session<HttpApi> {
    pub fn builder(subscription_key: impl Into<String>) -> SessionBuilder {
        SessionBuilder::new(subscription_key)
    }
}

impl<A: RemoteApi> Session<A> {
    /// Apply host configuration, fetch the device list and return the entities
    /// to register.
    ///
    /// Fails with `ReauthRequired` when the account yields no devices.
    pub async fn start(&self, config: Option<&SessionConfig>) -> Result<EntityList> {
        if let Some(config) = config {
            let key = config.require_subscription_key()?;
            self.update_subscription_key(key);
            if let Some(interval) = config.scan_interval() {
                self.update_interval(interval);
            }
            if let Some(enabled) = config.options.enable_sensors {
                self.set_sensors_enabled(enabled);
            }
            if let Some(schema) = config.options.vendor_schema {
                *self.tables.write().unwrap_or_else(|p| p.into_inner()) =
                    NormalizationTables::new(schema);
            }
        }

        self.sync.force_refresh(&self.api).await?;

        let snapshot = self.snapshot();
        if snapshot.is_empty() {
            warn!("no devices returned at session start");
            return Err(Error::ReauthRequired);
        }
        info!(devices = snapshot.len(), "session started");
        Ok(self.entities())
    }

    /// Refresh the snapshot if the scan interval has elapsed.
    pub async fn refresh(&self) -> Result<bool> {
        self.sync.refresh(&self.api).await
    }

    pub fn update_interval(&self, interval: Duration) -> Duration {
        self.sync.set_scan_interval(interval)
    }

    pub fn scan_interval(&self) -> Duration {
        self.sync.scan_interval()
    }

    pub fn update_subscription_key(&self, key: impl Into<String>) {
        self.api.set_subscription_key(Some(key.into()));
        debug!("subscription key updated");
    }

    pub fn sensors_enabled(&self) -> bool {
        self.enable_sensors.load(Ordering::Relaxed)
    }

    pub fn set_sensors_enabled(&self, enabled: bool) {
        self.enable_sensors.store(enabled, Ordering::Relaxed);
    }

    pub fn tables(&self) -> NormalizationTables {
        *self.tables.read().unwrap_or_else(|p| p.into_inner())
    }

    /// The current snapshot generation.
    pub fn snapshot(&self) -> Arc<DeviceSnapshot> {
        self.sync.snapshot()
    }

    /// Attribute reader pinned to the current snapshot generation.
    pub fn attributes(&self) -> Attributes {
        Attributes::new(self.snapshot(), self.tables())
    }

    pub fn entities(&self) -> EntityList {
        build_entities(&self.snapshot(), self.tables(), self.sensors_enabled())
    }

    /// Water-heater state for the host entity. Offline devices are flagged in
    /// the recovery ledger until they are seen online again.
    pub fn water_heater(&self, device_id: &str) -> Option<WaterHeaterStatus> {
        let status = water_heater_status(&self.attributes(), device_id)?;
        self.observe(device_id, status.online);
        Some(status)
    }

    pub fn sensor(&self, device_id: &str, kind: SensorKind) -> Option<SensorStatus> {
        let status = sensor_status(&self.attributes(), device_id, kind)?;
        self.observe(device_id, status.available);
        Some(status)
    }

    pub fn is_errored(&self, device_id: &str) -> bool {
        self.recovery
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .is_errored(device_id)
    }

    /// Read one per-device endpoint directly. `None` unless the call returned
    /// 2xx with a body.
    pub async fn device_field(&self, device_id: &str, field: DeviceField) -> Result<Option<Value>> {
        match self.api.get_field(device_id, field).await {
            Ok(resp) if resp.is_success() => Ok(resp.body),
            Ok(resp) => {
                warn!(device_id, field = field.as_path(), status = resp.status, "field read failed");
                Ok(None)
            }
            Err(e) if e.is_configuration() => Err(e),
            Err(e) => {
                warn!(device_id, field = field.as_path(), error = %e, "field read failed");
                Ok(None)
            }
        }
    }

    fn observe(&self, device_id: &str, online: bool) {
        let mut ledger = self.recovery.lock().unwrap_or_else(|p| p.into_inner());
        if online {
            if ledger.mark_recovered(device_id) {
                info!(device_id, "device back online");
            }
        } else if ledger.mark_errored(device_id) {
            warn!(device_id, "device offline");
        }
    }
}
