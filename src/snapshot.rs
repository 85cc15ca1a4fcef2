use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::warn;

use crate::types::Device;

/// All devices of the account as of one successful refresh.
///
/// A snapshot is never mutated once published; a refresh builds a new one and
/// swaps it in, so holders of an `Arc<DeviceSnapshot>` see one generation.
#[derive(Debug, Default)]
pub struct DeviceSnapshot {
    devices: BTreeMap<String, Device>,
    generation: u64,
    fetched_at: Option<DateTime<Utc>>,
}

impl DeviceSnapshot {
    pub(crate) fn new(devices: BTreeMap<String, Device>, generation: u64) -> Self {
        Self {
            devices,
            generation,
            fetched_at: Some(Utc::now()),
        }
    }

    pub fn get(&self, device_id: &str) -> Option<&Device> {
        self.devices.get(device_id)
    }

    pub fn contains(&self, device_id: &str) -> bool {
        self.devices.contains_key(device_id)
    }

    pub fn devices(&self) -> impl Iterator<Item = &Device> {
        self.devices.values()
    }

    pub fn device_ids(&self) -> impl Iterator<Item = &str> {
        self.devices.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    /// 0 for the empty start-up snapshot, incremented on every swap.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn fetched_at(&self) -> Option<DateTime<Utc>> {
        self.fetched_at
    }
}

/// Index a device-list payload by `deviceId`. A later duplicate id wins.
pub(crate) fn index_devices(items: &[Value]) -> BTreeMap<String, Device> {
    let mut devices = BTreeMap::new();
    for item in items {
        match Device::from_json(item) {
            Some(device) => {
                devices.insert(device.device_id.clone(), device);
            }
            None => warn!("skipping device entry without deviceId"),
        }
    }
    devices
}
