use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, warn};

use crate::normalize::{
    HeaterMode, HeaterState, NormalizationTables, OptimizationMode, DEFAULT_MAX_TEMPERATURE,
    DEFAULT_MIN_TEMPERATURE,
};
use crate::snapshot::DeviceSnapshot;
use crate::types::Device;

/// Every derived attribute of one device, in the order hosts display them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StateAttributes {
    pub available: bool,
    pub power_load: f64,
    pub volume: f64,
    #[serde(rename = "tapping_capacity_kWh")]
    pub tapping_capacity_kwh: f64,
    pub capacity_mixed_water_40: f64,
    pub actual_load_kwh: f64,
    pub heater_state: HeaterState,
    pub heater_mode: HeaterMode,
    pub current_set_point: f64,
    pub current_temperature: f64,
    pub optimization_mode: OptimizationMode,
    pub sub_optimization_mode: Option<String>,
    pub power_save: bool,
    pub extra_energy: bool,
    pub v40_min: f64,
    pub profile: Vec<f64>,
}

/// Read-only attribute queries over one snapshot generation.
///
/// Getters never fail: an unknown device id is logged and every getter then
/// returns its default, same as a device whose payload lacked the field.
#[derive(Debug, Clone)]
pub struct Attributes {
    snapshot: Arc<DeviceSnapshot>,
    tables: NormalizationTables,
}

impl Attributes {
    pub fn new(snapshot: Arc<DeviceSnapshot>, tables: NormalizationTables) -> Self {
        Self { snapshot, tables }
    }

    pub fn snapshot(&self) -> &DeviceSnapshot {
        &self.snapshot
    }

    fn device(&self, device_id: &str) -> Option<&Device> {
        let device = self.snapshot.get(device_id);
        if device.is_none() {
            warn!(device_id, "attribute lookup for unknown device");
        }
        device
    }

    fn read<T>(&self, device_id: &str, default: T, f: impl FnOnce(&Device) -> T) -> T {
        self.device(device_id).map(f).unwrap_or(default)
    }

    /// Raw field read; a missing field is logged and replaced by `default`.
    fn field<T>(
        &self,
        device_id: &str,
        field: &'static str,
        default: T,
        f: impl FnOnce(&Device) -> Option<T>,
    ) -> T {
        match self.device(device_id).map(f) {
            Some(Some(value)) => value,
            Some(None) => {
                missing(device_id, field);
                default
            }
            None => default,
        }
    }

    pub fn online(&self, device_id: &str) -> bool {
        self.read(device_id, false, |d| {
            let state = d.connection_state.as_deref();
            self.tables.connection(present(device_id, "connectionState", state))
        })
    }

    pub fn power_consumption(&self, device_id: &str) -> f64 {
        self.field(device_id, "powerConsumption", 0.0, |d| d.power_consumption)
    }

    pub fn volume(&self, device_id: &str) -> f64 {
        self.field(device_id, "volume", 0.0, |d| d.volume)
    }

    pub fn tapping_capacity_kwh(&self, device_id: &str) -> f64 {
        self.field(device_id, "data.tappingCapacitykWh", 0.0, |d| {
            d.data.as_ref()?.tapping_capacity_kwh
        })
    }

    pub fn capacity_mixed_water_40(&self, device_id: &str) -> f64 {
        self.field(device_id, "data.capacityMixedWater40", 0.0, |d| {
            d.data.as_ref()?.capacity_mixed_water_40
        })
    }

    pub fn actual_load_kwh(&self, device_id: &str) -> f64 {
        self.field(device_id, "data.actualLoadKwh", 0.0, |d| {
            d.data.as_ref()?.actual_load_kwh
        })
    }

    pub fn heater_state(&self, device_id: &str) -> HeaterState {
        self.read(device_id, HeaterState::Off, |d| {
            let code = present(device_id, "control.heater", d.heater_code());
            self.tables.heater_state(code)
        })
    }

    pub fn heater_mode(&self, device_id: &str) -> HeaterMode {
        self.read(device_id, HeaterMode::Off, |d| {
            let code = self.tables.mode_code(d.heater_code(), d.mode_code());
            HeaterMode::from_vendor(present(device_id, self.tables.mode_field(), code))
        })
    }

    pub fn current_set_point(&self, device_id: &str) -> f64 {
        self.field(device_id, "control.currentSetPoint", 0.0, |d| {
            d.control.as_ref()?.current_set_point
        })
    }

    pub fn current_temperature(&self, device_id: &str) -> f64 {
        self.field(device_id, "control.currentTemperature", 0.0, |d| {
            d.control.as_ref()?.current_temperature
        })
    }

    pub fn target_temperature(&self, device_id: &str) -> f64 {
        self.field(device_id, "control.targetTemperature", 0.0, |d| {
            d.control.as_ref()?.target_temperature
        })
    }

    pub fn target_temperature_low(&self, device_id: &str) -> f64 {
        self.field(device_id, "control.targetTemperatureLow", 0.0, |d| {
            d.control.as_ref()?.target_temperature_low
        })
    }

    pub fn target_temperature_high(&self, device_id: &str) -> f64 {
        self.field(device_id, "control.targetTemperatureHigh", 0.0, |d| {
            d.control.as_ref()?.target_temperature_high
        })
    }

    pub fn min_temperature(&self, device_id: &str) -> f64 {
        self.field(device_id, "control.minTemperature", DEFAULT_MIN_TEMPERATURE, |d| {
            d.control.as_ref()?.min_temperature
        })
    }

    pub fn max_temperature(&self, device_id: &str) -> f64 {
        self.field(device_id, "control.maxTemperature", DEFAULT_MAX_TEMPERATURE, |d| {
            d.control.as_ref()?.max_temperature
        })
    }

    pub fn optimization_mode(&self, device_id: &str) -> OptimizationMode {
        self.read(device_id, OptimizationMode::Off, |d| {
            let code = d.optimization_option.as_deref();
            self.tables.optimization_mode(present(device_id, "optimizationOption", code))
        })
    }

    pub fn sub_optimization_mode(&self, device_id: &str) -> Option<String> {
        self.read(device_id, None, |d| {
            let code = d.optimization_sub_option.as_deref();
            self.tables.sub_optimization_mode(present(device_id, "optimizationSubOption", code))
        })
    }

    pub fn power_save(&self, device_id: &str) -> bool {
        self.field(device_id, "isInPowerSave", false, |d| {
            d.power_save.map(|flag| self.tables.power_save(Some(flag)))
        })
    }

    pub fn extra_energy(&self, device_id: &str) -> bool {
        self.field(device_id, "isInExtraEnergy", false, |d| {
            d.extra_energy.map(|flag| self.tables.extra_energy(Some(flag)))
        })
    }

    pub fn v40_min(&self, device_id: &str) -> f64 {
        self.field(device_id, "v40Min", 0.0, |d| d.v40_min)
    }

    pub fn profile(&self, device_id: &str) -> Vec<f64> {
        self.field(device_id, "profile", Vec::new(), |d| d.profile.clone())
    }

    /// All attributes at once, or `None` for an unknown device.
    pub fn state_attributes(&self, device_id: &str) -> Option<StateAttributes> {
        if !self.snapshot.contains(device_id) {
            warn!(device_id, "state attributes requested for unknown device");
            return None;
        }
        Some(StateAttributes {
            available: self.online(device_id),
            power_load: self.power_consumption(device_id),
            volume: self.volume(device_id),
            tapping_capacity_kwh: self.tapping_capacity_kwh(device_id),
            capacity_mixed_water_40: self.capacity_mixed_water_40(device_id),
            actual_load_kwh: self.actual_load_kwh(device_id),
            heater_state: self.heater_state(device_id),
            heater_mode: self.heater_mode(device_id),
            current_set_point: self.current_set_point(device_id),
            current_temperature: self.current_temperature(device_id),
            optimization_mode: self.optimization_mode(device_id),
            sub_optimization_mode: self.sub_optimization_mode(device_id),
            power_save: self.power_save(device_id),
            extra_energy: self.extra_energy(device_id),
            v40_min: self.v40_min(device_id),
            profile: self.profile(device_id),
        })
    }
}

fn missing(device_id: &str, field: &'static str) {
    debug!(device_id, field, "field missing, using default");
}

/// Passes a raw code through, logging when it is absent.
fn present<'a>(device_id: &str, field: &'static str, code: Option<&'a str>) -> Option<&'a str> {
    if code.is_none() {
        missing(device_id, field);
    }
    code
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::VendorSchema;
    use crate::snapshot::index_devices;
    use serde_json::json;

    fn attributes(payload: serde_json::Value, schema: VendorSchema) -> Attributes {
        let items = payload.as_array().unwrap().clone();
        let snapshot = DeviceSnapshot::new(index_devices(&items), 1);
        Attributes::new(Arc::new(snapshot), NormalizationTables::new(schema))
    }

    #[test]
    fn missing_control_block_uses_defaults() {
        let attrs = attributes(json!([{ "deviceId": "A1" }]), VendorSchema::Current);
        assert_eq!(attrs.heater_state("A1"), HeaterState::Off);
        assert_eq!(attrs.heater_mode("A1"), HeaterMode::Off);
        assert_eq!(attrs.current_temperature("A1"), 0.0);
        assert_eq!(attrs.min_temperature("A1"), 10.0);
        assert_eq!(attrs.max_temperature("A1"), 80.0);
        assert!(!attrs.online("A1"));
    }

    #[derive(Clone, Default)]
    struct Captured(Arc<std::sync::Mutex<Vec<u8>>>);

    impl std::io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl Captured {
        fn text(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    fn with_captured_logs(f: impl FnOnce()) -> String {
        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::TRACE)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();
        tracing::subscriber::with_default(subscriber, f);
        captured.text()
    }

    #[test]
    fn missing_fields_are_logged() {
        let attrs = attributes(json!([{ "deviceId": "A1" }]), VendorSchema::Current);
        let logs = with_captured_logs(|| {
            assert_eq!(attrs.heater_state("A1"), HeaterState::Off);
            assert_eq!(attrs.current_temperature("A1"), 0.0);
            assert_eq!(attrs.optimization_mode("A1"), OptimizationMode::Off);
            assert_eq!(attrs.v40_min("A1"), 0.0);
        });

        assert!(logs.contains("field missing, using default"));
        for field in [
            "control.heater",
            "control.currentTemperature",
            "optimizationOption",
            "v40Min",
        ] {
            assert!(logs.contains(field), "no log for {field}: {logs}");
        }
    }

    #[test]
    fn present_fields_are_not_logged() {
        let attrs = attributes(
            json!([{ "deviceId": "A1", "v40Min": 150, "control": { "mode": "manual" } }]),
            VendorSchema::Current,
        );
        let logs = with_captured_logs(|| {
            assert_eq!(attrs.v40_min("A1"), 150.0);
            assert_eq!(attrs.heater_mode("A1"), HeaterMode::Manual);
        });
        assert!(!logs.contains("field missing"), "{logs}");
    }

    #[test]
    fn legacy_schema_logs_its_own_mode_field() {
        let attrs = attributes(
            json!([{ "deviceId": "A1", "control": { "mode": "auto" } }]),
            VendorSchema::Legacy,
        );
        let logs = with_captured_logs(|| {
            assert_eq!(attrs.heater_mode("A1"), HeaterMode::Off);
        });
        assert!(logs.contains("control.heater"), "{logs}");
    }

    #[test]
    fn unknown_device_yields_defaults() {
        let attrs = attributes(json!([{ "deviceId": "A1", "volume": 200 }]), VendorSchema::Current);
        assert_eq!(attrs.volume("nope"), 0.0);
        assert!(!attrs.online("nope"));
        assert_eq!(attrs.optimization_mode("nope"), OptimizationMode::Off);
        assert!(attrs.profile("nope").is_empty());
        assert_eq!(attrs.max_temperature("nope"), 80.0);
        assert!(attrs.state_attributes("nope").is_none());
    }

    #[test]
    fn normalizes_vendor_codes() {
        let attrs = attributes(
            json!([{
                "deviceId": "A1",
                "connectionState": { "connectionState": "Connected" },
                "control": { "heater": "on", "mode": "ExtraEnergy" },
                "optimizationOption": "futureMode",
                "optimizationSubOption": "nightOnly",
                "isInExtraEnergy": true
            }]),
            VendorSchema::Current,
        );
        assert!(attrs.online("A1"));
        assert_eq!(attrs.heater_state("A1"), HeaterState::On);
        assert_eq!(attrs.heater_mode("A1"), HeaterMode::ExtraEnergy);
        assert_eq!(attrs.optimization_mode("A1"), OptimizationMode::Other("futureMode".into()));
        assert_eq!(attrs.sub_optimization_mode("A1").as_deref(), Some("nightOnly"));
        assert!(attrs.extra_energy("A1"));
        assert!(!attrs.power_save("A1"));
    }

    #[test]
    fn legacy_schema_reads_mode_from_heater_field() {
        let attrs = attributes(
            json!([{ "deviceId": "A1", "control": { "heater": "manual" } }]),
            VendorSchema::Legacy,
        );
        assert_eq!(attrs.heater_mode("A1"), HeaterMode::Manual);
    }

    #[test]
    fn state_attributes_serialize_in_fixed_order() {
        let attrs = attributes(
            json!([{
                "deviceId": "A1",
                "connectionState": { "connectionState": "Connected" },
                "powerConsumption": 3000,
                "volume": 200,
                "data": { "tappingCapacitykWh": 5.5 },
                "v40Min": 160,
                "profile": [60, 61]
            }]),
            VendorSchema::Current,
        );
        let state = attrs.state_attributes("A1").unwrap();
        assert!(state.available);
        assert_eq!(state.power_load, 3000.0);
        assert_eq!(state.tapping_capacity_kwh, 5.5);
        assert_eq!(state.capacity_mixed_water_40, 0.0);

        let json = serde_json::to_string(&state).unwrap();
        let keys = [
            "available",
            "power_load",
            "volume",
            "tapping_capacity_kWh",
            "capacity_mixed_water_40",
            "actual_load_kwh",
            "heater_state",
            "heater_mode",
            "current_set_point",
            "current_temperature",
            "optimization_mode",
            "sub_optimization_mode",
            "power_save",
            "extra_energy",
            "v40_min",
            "profile",
        ];
        let positions: Vec<usize> = keys
            .iter()
            .map(|k| json.find(&format!("\"{k}\":")).unwrap())
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }
}
