use serde_json::{json, Value};

pub const DEFAULT_BASE_URL: &str = "https://osowh-apimanagement.azure-api.net/water-heater-api";

pub const SUBSCRIPTION_KEY_HEADER: &str = "Ocp-Apim-Subscription-Key";

/// Per-device read endpoints under `/1/Device/{id}/`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceField {
    TappingCapacityKwh,
    ActualLoad,
    Status,
    Metadata,
    V40Min,
}

impl DeviceField {
    pub fn as_path(&self) -> &'static str {
        match self {
            DeviceField::TappingCapacityKwh => "TappingCapacityKwh",
            DeviceField::ActualLoad => "ActualLoad",
            DeviceField::Status => "Status",
            DeviceField::Metadata => "Metadata",
            DeviceField::V40Min => "V40Min",
        }
    }
}

pub fn devices_path() -> String {
    "/1/Device/All".to_string()
}

pub fn field_path(device_id: &str, field: DeviceField) -> String {
    format!("/1/Device/{device_id}/{}", field.as_path())
}

pub fn power_path(device_id: &str, on: bool, full_utilization: bool) -> String {
    let action = if on { "TurnOn" } else { "TurnOff" };
    format!("/1/Device/{device_id}/{action}?fullUtilizationParam={full_utilization}")
}

pub fn set_v40_min_path(device_id: &str, value: f64) -> String {
    format!("/1/Device/{device_id}/V40Min/{value}")
}

pub fn optimization_mode_path(device_id: &str) -> String {
    format!("/1/Device/{device_id}/OptimizationMode")
}

pub fn profile_path(device_id: &str) -> String {
    format!("/1/Device/{device_id}/Profile")
}

pub fn optimization_mode_body(option: &str, sub_option: &str) -> Value {
    json!({
        "optimizationOption": option,
        "optimizationSubOption": sub_option
    })
}

pub fn profile_body(hours: &[f64]) -> Value {
    json!({ "hours": hours })
}

/// Parse a response body. Empty, `null` and malformed bodies all yield `None`.
pub fn parse_body(body: &str) -> Option<Value> {
    if body.trim().is_empty() {
        return None;
    }
    match serde_json::from_str(body) {
        Ok(Value::Null) | Err(_) => None,
        Ok(v) => Some(v),
    }
}
