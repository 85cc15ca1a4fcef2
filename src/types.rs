use serde::Serialize;
use serde_json::Value;

use crate::normalize::{DEFAULT_MAX_TEMPERATURE, DEFAULT_MIN_TEMPERATURE};

/// Hours in a heating profile (one slot per UTC hour).
pub const PROFILE_HOURS: usize = 24;

/// Nested `data` block of a device payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DeviceData {
    pub tapping_capacity_kwh: Option<f64>,
    pub capacity_mixed_water_40: Option<f64>,
    pub actual_load_kwh: Option<f64>,
}

impl DeviceData {
    fn from_json(data: &Value) -> Self {
        Self {
            tapping_capacity_kwh: number(data, "tappingCapacitykWh"),
            capacity_mixed_water_40: number(data, "capacityMixedWater40"),
            actual_load_kwh: number(data, "actualLoadKwh"),
        }
    }
}

/// Nested `control` block of a device payload. Codes are kept raw.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DeviceControl {
    pub heater: Option<String>,
    pub mode: Option<String>,
    pub current_set_point: Option<f64>,
    pub current_temperature: Option<f64>,
    pub target_temperature: Option<f64>,
    pub target_temperature_low: Option<f64>,
    pub target_temperature_high: Option<f64>,
    pub min_temperature: Option<f64>,
    pub max_temperature: Option<f64>,
}

impl DeviceControl {
    fn from_json(control: &Value) -> Self {
        Self {
            heater: string(control, "heater"),
            mode: string(control, "mode"),
            current_set_point: number(control, "currentSetPoint"),
            current_temperature: number(control, "currentTemperature"),
            target_temperature: number(control, "targetTemperature"),
            target_temperature_low: number(control, "targetTemperatureLow"),
            target_temperature_high: number(control, "targetTemperatureHigh"),
            min_temperature: number(control, "minTemperature"),
            max_temperature: number(control, "maxTemperature"),
        }
    }
}

/// One water heater as last reported by the cloud.
///
/// Every field except `device_id` is optional in the vendor payload. The
/// accessor methods substitute the documented default for a missing field, so
/// one absent value never hides the rest of the device.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Device {
    pub device_id: String,
    pub device_type: Option<String>,
    pub device_name: Option<String>,
    pub connection_state: Option<String>,
    pub power_consumption: Option<f64>,
    pub volume: Option<f64>,
    pub data: Option<DeviceData>,
    pub control: Option<DeviceControl>,
    pub optimization_option: Option<String>,
    pub optimization_sub_option: Option<String>,
    pub power_save: Option<bool>,
    pub extra_energy: Option<bool>,
    pub v40_min: Option<f64>,
    pub profile: Option<Vec<f64>>,
}

impl Device {
    /// Parse one element of the device list. Returns `None` when the element
    /// has no string `deviceId`.
    pub fn from_json(value: &Value) -> Option<Self> {
        let device_id = value.get("deviceId")?.as_str()?.to_string();

        Some(Self {
            device_id,
            device_type: string(value, "deviceType"),
            device_name: string(value, "deviceName"),
            connection_state: value
                .pointer("/connectionState/connectionState")
                .and_then(|v| v.as_str())
                .map(str::to_string),
            power_consumption: number(value, "powerConsumption"),
            volume: number(value, "volume"),
            data: value
                .get("data")
                .filter(|v| v.is_object())
                .map(DeviceData::from_json),
            control: value
                .get("control")
                .filter(|v| v.is_object())
                .map(DeviceControl::from_json),
            optimization_option: string(value, "optimizationOption"),
            optimization_sub_option: string(value, "optimizationSubOption"),
            power_save: value.get("isInPowerSave").and_then(|v| v.as_bool()),
            extra_energy: value.get("isInExtraEnergy").and_then(|v| v.as_bool()),
            v40_min: number(value, "v40Min"),
            profile: value.get("profile").and_then(|v| v.as_array()).map(|hours| {
                hours.iter().map(|h| h.as_f64().unwrap_or(0.0)).collect()
            }),
        })
    }

    /// Defaults to `"Unknown"`.
    pub fn device_type(&self) -> &str {
        self.device_type.as_deref().unwrap_or("Unknown")
    }

    /// Defaults to `"Water Heater"`.
    pub fn display_name(&self) -> &str {
        self.device_name.as_deref().unwrap_or("Water Heater")
    }

    /// Watts, defaults to 0.
    pub fn power_consumption_w(&self) -> f64 {
        self.power_consumption.unwrap_or(0.0)
    }

    /// Litres, defaults to 0.
    pub fn volume_l(&self) -> f64 {
        self.volume.unwrap_or(0.0)
    }

    pub fn tapping_capacity_kwh(&self) -> f64 {
        self.data.as_ref().and_then(|d| d.tapping_capacity_kwh).unwrap_or(0.0)
    }

    pub fn capacity_mixed_water_40(&self) -> f64 {
        self.data.as_ref().and_then(|d| d.capacity_mixed_water_40).unwrap_or(0.0)
    }

    pub fn actual_load_kwh(&self) -> f64 {
        self.data.as_ref().and_then(|d| d.actual_load_kwh).unwrap_or(0.0)
    }

    pub fn heater_code(&self) -> Option<&str> {
        self.control.as_ref().and_then(|c| c.heater.as_deref())
    }

    pub fn mode_code(&self) -> Option<&str> {
        self.control.as_ref().and_then(|c| c.mode.as_deref())
    }

    pub fn current_set_point(&self) -> f64 {
        self.control_value(|c| c.current_set_point).unwrap_or(0.0)
    }

    pub fn current_temperature(&self) -> f64 {
        self.control_value(|c| c.current_temperature).unwrap_or(0.0)
    }

    pub fn target_temperature(&self) -> f64 {
        self.control_value(|c| c.target_temperature).unwrap_or(0.0)
    }

    pub fn target_temperature_low(&self) -> f64 {
        self.control_value(|c| c.target_temperature_low).unwrap_or(0.0)
    }

    pub fn target_temperature_high(&self) -> f64 {
        self.control_value(|c| c.target_temperature_high).unwrap_or(0.0)
    }

    /// Defaults to the device constant of 10 °C.
    pub fn min_temperature(&self) -> f64 {
        self.control_value(|c| c.min_temperature)
            .unwrap_or(DEFAULT_MIN_TEMPERATURE)
    }

    /// Defaults to the device constant of 80 °C.
    pub fn max_temperature(&self) -> f64 {
        self.control_value(|c| c.max_temperature)
            .unwrap_or(DEFAULT_MAX_TEMPERATURE)
    }

    pub fn v40_min(&self) -> f64 {
        self.v40_min.unwrap_or(0.0)
    }

    /// Empty when the vendor sent no profile.
    pub fn profile(&self) -> &[f64] {
        self.profile.as_deref().unwrap_or(&[])
    }

    fn control_value(&self, f: impl FnOnce(&DeviceControl) -> Option<f64>) -> Option<f64> {
        self.control.as_ref().and_then(f)
    }
}

fn string(parent: &Value, key: &str) -> Option<String> {
    parent.get(key).and_then(|v| v.as_str()).map(str::to_string)
}

fn number(parent: &Value, key: &str) -> Option<f64> {
    parent.get(key).and_then(|v| v.as_f64())
}
