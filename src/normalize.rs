use std::fmt;

use serde::{Deserialize, Serialize};

/// Lowest target temperature the heater accepts, in Celsius.
pub const DEFAULT_MIN_TEMPERATURE: f64 = 10.0;
/// Highest target temperature the heater accepts, in Celsius.
pub const DEFAULT_MAX_TEMPERATURE: f64 = 80.0;

/// Which revision of the vendor payload the account speaks.
///
/// The two revisions differ in where the heater mode lives: `Current` reads it
/// from `control.mode`, `Legacy` reuses the `control.heater` run-state field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VendorSchema {
    #[default]
    Current,
    Legacy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HeaterState {
    On,
    #[default]
    Off,
}

impl HeaterState {
    pub fn as_str(&self) -> &'static str {
        match self {
            HeaterState::On => "on",
            HeaterState::Off => "off",
        }
    }

    /// Unknown or missing run states read as off.
    pub fn from_vendor(code: Option<&str>) -> Self {
        match code {
            Some("on") => HeaterState::On,
            _ => HeaterState::Off,
        }
    }
}

impl fmt::Display for HeaterState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum HeaterMode {
    Auto,
    Manual,
    #[default]
    Off,
    Legionella,
    PowerSave,
    ExtraEnergy,
    Voltage,
    Other(String),
}

impl HeaterMode {
    pub fn as_str(&self) -> &str {
        match self {
            HeaterMode::Auto => "auto",
            HeaterMode::Manual => "manual",
            HeaterMode::Off => "off",
            HeaterMode::Legionella => "legionella",
            HeaterMode::PowerSave => "powerSave",
            HeaterMode::ExtraEnergy => "extraEnergy",
            HeaterMode::Voltage => "voltage",
            HeaterMode::Other(raw) => raw,
        }
    }

    /// Missing codes read as off; unknown codes pass through as `Other`.
    pub fn from_vendor(code: Option<&str>) -> Self {
        match code {
            None | Some("off") => HeaterMode::Off,
            Some("auto") => HeaterMode::Auto,
            Some("manual") => HeaterMode::Manual,
            Some("Legionella") => HeaterMode::Legionella,
            Some("PowerSave") => HeaterMode::PowerSave,
            Some("ExtraEnergy") => HeaterMode::ExtraEnergy,
            Some("Voltage") => HeaterMode::Voltage,
            Some(other) => HeaterMode::Other(other.to_string()),
        }
    }
}

impl fmt::Display for HeaterMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for HeaterMode {
    fn serialize<S: serde::Serializer>(&self, s: S) -> std::result::Result<S::Ok, S::Error> {
        s.serialize_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum OptimizationMode {
    #[default]
    Off,
    GridCompany,
    SmartCompany,
    Advanced,
    Other(String),
}

impl OptimizationMode {
    pub fn as_str(&self) -> &str {
        match self {
            OptimizationMode::Off => "off",
            OptimizationMode::GridCompany => "gridCompany",
            OptimizationMode::SmartCompany => "smartCompany",
            OptimizationMode::Advanced => "advanced",
            OptimizationMode::Other(raw) => raw,
        }
    }

    /// Missing codes read as off; unknown codes pass through as `Other` so new
    /// vendor modes stay visible before they are mapped.
    pub fn from_vendor(code: Option<&str>) -> Self {
        match code {
            None | Some("off") => OptimizationMode::Off,
            Some("gridCompany") => OptimizationMode::GridCompany,
            Some("smartCompany") => OptimizationMode::SmartCompany,
            Some("advanced") => OptimizationMode::Advanced,
            Some(other) => OptimizationMode::Other(other.to_string()),
        }
    }
}

impl fmt::Display for OptimizationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for OptimizationMode {
    fn serialize<S: serde::Serializer>(&self, s: S) -> std::result::Result<S::Ok, S::Error> {
        s.serialize_str(self.as_str())
    }
}

/// Vendor-code lookups, applied when attributes are read rather than when the
/// snapshot is ingested.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct NormalizationTables {
    schema: VendorSchema,
}

impl NormalizationTables {
    pub fn new(schema: VendorSchema) -> Self {
        Self { schema }
    }

    pub fn schema(&self) -> VendorSchema {
        self.schema
    }

    /// Only `"Connected"` counts as online.
    pub fn connection(&self, state: Option<&str>) -> bool {
        matches!(state, Some("Connected"))
    }

    pub fn heater_state(&self, code: Option<&str>) -> HeaterState {
        HeaterState::from_vendor(code)
    }

    /// Payload path the schema reads the heater mode from.
    pub fn mode_field(&self) -> &'static str {
        match self.schema {
            VendorSchema::Current => "control.mode",
            VendorSchema::Legacy => "control.heater",
        }
    }

    /// The schema's mode code out of the two raw control codes.
    pub fn mode_code<'a>(&self, heater: Option<&'a str>, mode: Option<&'a str>) -> Option<&'a str> {
        match self.schema {
            VendorSchema::Current => mode,
            VendorSchema::Legacy => heater,
        }
    }

    pub fn heater_mode(&self, heater: Option<&str>, mode: Option<&str>) -> HeaterMode {
        HeaterMode::from_vendor(self.mode_code(heater, mode))
    }

    pub fn optimization_mode(&self, code: Option<&str>) -> OptimizationMode {
        OptimizationMode::from_vendor(code)
    }

    pub fn sub_optimization_mode(&self, code: Option<&str>) -> Option<String> {
        code.map(str::to_string)
    }

    pub fn power_save(&self, flag: Option<bool>) -> bool {
        flag.unwrap_or(false)
    }

    pub fn extra_energy(&self, flag: Option<bool>) -> bool {
        flag.unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connection_fails_safe() {
        let t = NormalizationTables::default();
        assert!(t.connection(Some("Connected")));
        assert!(!t.connection(Some("Disconnected")));
        assert!(!t.connection(Some("connected")));
        assert!(!t.connection(None));
    }

    #[test]
    fn heater_state_defaults_off() {
        assert_eq!(HeaterState::from_vendor(Some("on")), HeaterState::On);
        assert_eq!(HeaterState::from_vendor(Some("off")), HeaterState::Off);
        assert_eq!(HeaterState::from_vendor(Some("blinking")), HeaterState::Off);
        assert_eq!(HeaterState::from_vendor(None), HeaterState::Off);
    }

    #[test]
    fn heater_mode_passes_unknown_through() {
        assert_eq!(HeaterMode::from_vendor(Some("PowerSave")), HeaterMode::PowerSave);
        assert_eq!(HeaterMode::from_vendor(None), HeaterMode::Off);
        let unknown = HeaterMode::from_vendor(Some("Ffr"));
        assert_eq!(unknown, HeaterMode::Other("Ffr".to_string()));
        assert_eq!(unknown.as_str(), "Ffr");
    }

    #[test]
    fn heater_mode_field_follows_schema() {
        let current = NormalizationTables::new(VendorSchema::Current);
        let legacy = NormalizationTables::new(VendorSchema::Legacy);
        assert_eq!(current.heater_mode(Some("on"), Some("auto")), HeaterMode::Auto);
        assert_eq!(legacy.heater_mode(Some("manual"), Some("auto")), HeaterMode::Manual);
        assert_eq!(current.heater_mode(Some("on"), None), HeaterMode::Off);
    }

    #[test]
    fn optimization_mode_passes_unknown_through() {
        assert_eq!(OptimizationMode::from_vendor(None), OptimizationMode::Off);
        assert_eq!(
            OptimizationMode::from_vendor(Some("gridCompany")),
            OptimizationMode::GridCompany
        );
        assert_eq!(OptimizationMode::from_vendor(Some("solarBoost")).as_str(), "solarBoost");
    }

    #[test]
    fn flags_default_off() {
        let t = NormalizationTables::default();
        assert!(!t.power_save(None));
        assert!(t.power_save(Some(true)));
        assert!(!t.extra_energy(Some(false)));
    }

    #[test]
    fn modes_serialize_as_normalized_strings() {
        let v = serde_json::to_value(HeaterMode::ExtraEnergy).unwrap();
        assert_eq!(v, "extraEnergy");
        let v = serde_json::to_value(HeaterState::On).unwrap();
        assert_eq!(v, "on");
        let v = serde_json::to_value(OptimizationMode::Other("x".into())).unwrap();
        assert_eq!(v, "x");
    }
}
