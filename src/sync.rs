use std::sync::{Arc, Mutex, RwLock};
use std::time::{Duration, Instant};

use tracing::{debug, trace, warn};

use crate::api::RemoteApi;
use crate::snapshot::{index_devices, DeviceSnapshot};
use crate::Result;

/// Lowest accepted scan interval.
pub const MIN_SCAN_INTERVAL: Duration = Duration::from_secs(15);
pub const DEFAULT_SCAN_INTERVAL: Duration = Duration::from_secs(120);

/// Rate-limited refresh of the device snapshot.
///
/// `last_fetch` doubles as the refresh lock: the staleness check, the fetch and
/// the swap all run while it is held. The snapshot cell is only written by a
/// pointer swap under that lock.
pub(crate) struct SyncEngine {
    last_fetch: tokio::sync::Mutex<Option<Instant>>,
    scan_interval: Mutex<Duration>,
    snapshot: RwLock<Arc<DeviceSnapshot>>,
}

impl SyncEngine {
    pub fn new(scan_interval: Duration) -> Self {
        Self {
            last_fetch: tokio::sync::Mutex::new(None),
            scan_interval: Mutex::new(clamp_interval(scan_interval)),
            snapshot: RwLock::new(Arc::new(DeviceSnapshot::default())),
        }
    }

    pub fn scan_interval(&self) -> Duration {
        *self
            .scan_interval
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn set_scan_interval(&self, interval: Duration) -> Duration {
        let clamped = clamp_interval(interval);
        if clamped != interval {
            debug!(requested = ?interval, applied = ?clamped, "scan interval raised to minimum");
        }
        *self
            .scan_interval
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = clamped;
        clamped
    }

    pub fn snapshot(&self) -> Arc<DeviceSnapshot> {
        self.snapshot
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Fetch if the scan interval has elapsed since the last good fetch.
    ///
    /// Returns `Ok(true)` when a structurally valid device list was received.
    /// Fetch failures leave the snapshot untouched and return `Ok(false)`; only
    /// configuration errors are returned as `Err`.
    pub async fn refresh<A: RemoteApi>(&self, api: &A) -> Result<bool> {
        let mut last_fetch = self.last_fetch.lock().await;
        if let Some(at) = *last_fetch
            && at.elapsed() < self.scan_interval()
        {
            trace!(age = ?at.elapsed(), "device data still fresh, skipping fetch");
            return Ok(false);
        }
        self.fetch(api, &mut last_fetch).await
    }

    /// Fetch regardless of the scan interval, still under the refresh lock.
    pub async fn force_refresh<A: RemoteApi>(&self, api: &A) -> Result<bool> {
        let mut last_fetch = self.last_fetch.lock().await;
        self.fetch(api, &mut last_fetch).await
    }

    async fn fetch<A: RemoteApi>(&self, api: &A, last_fetch: &mut Option<Instant>) -> Result<bool> {
        let response = match api.list_devices().await {
            Ok(response) => response,
            Err(e) if e.is_configuration() => return Err(e),
            Err(e) => {
                warn!(error = %e, "device list fetch failed");
                return Ok(false);
            }
        };

        if !response.is_success() {
            warn!(status = response.status, "device list fetch returned error status");
            return Ok(false);
        }
        let Some(body) = response.body else {
            warn!(status = response.status, "device list fetch returned no body");
            return Ok(false);
        };
        let Some(items) = body.as_array() else {
            warn!("device list body is not an array");
            return Ok(false);
        };

        let devices = index_devices(items);
        if devices.is_empty() {
            debug!("device list is empty, keeping previous snapshot");
        } else {
            let mut cell = self
                .snapshot
                .write()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            let generation = cell.generation() + 1;
            debug!(devices = devices.len(), generation, "device snapshot replaced");
            *cell = Arc::new(DeviceSnapshot::new(devices, generation));
        }

        *last_fetch = Some(Instant::now());
        Ok(true)
    }

    #[cfg(test)]
    pub async fn backdate_last_fetch(&self, by: Duration) {
        let mut last_fetch = self.last_fetch.lock().await;
        if let Some(at) = last_fetch.as_mut() {
            *at = at.checked_sub(by).unwrap_or(*at);
        }
    }
}

fn clamp_interval(interval: Duration) -> Duration {
    interval.max(MIN_SCAN_INTERVAL)
}
