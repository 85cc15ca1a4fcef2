use std::sync::Arc;

use serde::Serialize;
use serde_json::{json, Value};

use crate::attributes::{Attributes, StateAttributes};
use crate::normalize::{HeaterState, NormalizationTables};
use crate::snapshot::DeviceSnapshot;
use crate::types::{Device, DeviceControl, DeviceData};

pub const WATER_HEATER_TYPE: &str = "water_heater";
pub const SENSOR_TYPE: &str = "sensor";

/// Per-device sensors a host may expose alongside the water heater.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SensorKind {
    PowerSave,
    ExtraEnergy,
    PowerLoad,
    Volume,
    TappingCapacityKwh,
    #[serde(rename = "CAPACITY_MIXED_WATER_40")]
    CapacityMixedWater40,
    HeaterState,
    HeaterMode,
    OptimizationMode,
    SubOptimizationMode,
    V40Min,
    Profile,
}

impl SensorKind {
    pub const ALL: [SensorKind; 12] = [
        SensorKind::PowerSave,
        SensorKind::ExtraEnergy,
        SensorKind::PowerLoad,
        SensorKind::Volume,
        SensorKind::TappingCapacityKwh,
        SensorKind::CapacityMixedWater40,
        SensorKind::HeaterState,
        SensorKind::HeaterMode,
        SensorKind::OptimizationMode,
        SensorKind::SubOptimizationMode,
        SensorKind::V40Min,
        SensorKind::Profile,
    ];

    /// Appended to the device display name.
    pub fn name_suffix(&self) -> &'static str {
        match self {
            SensorKind::PowerSave => " Power Save",
            SensorKind::ExtraEnergy => " Extra Energy",
            SensorKind::PowerLoad => " Power Load",
            SensorKind::Volume => " Volume",
            SensorKind::TappingCapacityKwh => " Tapping Capacity kWh",
            SensorKind::CapacityMixedWater40 => " Capacity Mixed Water 40",
            SensorKind::HeaterState => " Heater State",
            SensorKind::HeaterMode => " Heater Mode",
            SensorKind::OptimizationMode => " Optimization Mode",
            SensorKind::SubOptimizationMode => " Sub Optimization Mode",
            SensorKind::V40Min => " V40 Min",
            SensorKind::Profile => " Profile",
        }
    }

    pub fn read(&self, attrs: &Attributes, device_id: &str) -> Value {
        match self {
            SensorKind::PowerSave => json!(attrs.power_save(device_id)),
            SensorKind::ExtraEnergy => json!(attrs.extra_energy(device_id)),
            SensorKind::PowerLoad => json!(attrs.actual_load_kwh(device_id)),
            SensorKind::Volume => json!(attrs.volume(device_id)),
            SensorKind::TappingCapacityKwh => json!(attrs.tapping_capacity_kwh(device_id)),
            SensorKind::CapacityMixedWater40 => json!(attrs.capacity_mixed_water_40(device_id)),
            SensorKind::HeaterState => json!(attrs.heater_state(device_id)),
            SensorKind::HeaterMode => json!(attrs.heater_mode(device_id)),
            SensorKind::OptimizationMode => json!(attrs.optimization_mode(device_id)),
            SensorKind::SubOptimizationMode => json!(attrs.sub_optimization_mode(device_id)),
            SensorKind::V40Min => json!(attrs.v40_min(device_id)),
            SensorKind::Profile => json!(attrs.profile(device_id)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WaterHeaterEntity {
    pub device_id: String,
    pub device_type: String,
    pub device_name: String,
    pub online: bool,
    pub power_consumption: f64,
    pub volume: f64,
    pub data: DeviceData,
    pub control: DeviceControl,
    pub optimization_option: String,
    pub optimization_suboption: String,
    pub v40_min: f64,
    pub profile: Vec<f64>,
    pub ha_type: &'static str,
    pub ha_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SensorEntity {
    pub device_id: String,
    pub device_type: String,
    pub device_name: String,
    pub sensor_type: SensorKind,
    pub available: bool,
    pub state: Value,
    pub ha_type: &'static str,
    pub ha_name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EntityList {
    pub water_heater: Vec<WaterHeaterEntity>,
    pub sensor: Vec<SensorEntity>,
}

/// Project a snapshot into host entities. Reads only the snapshot.
pub fn build_entities(
    snapshot: &Arc<DeviceSnapshot>,
    tables: NormalizationTables,
    enable_sensors: bool,
) -> EntityList {
    let mut list = EntityList::default();
    for device in snapshot.devices() {
        let online = tables.connection(device.connection_state.as_deref());
        list.water_heater.push(water_heater_entity(device, online));
    }

    if enable_sensors {
        let attrs = Attributes::new(Arc::clone(snapshot), tables);
        for device in snapshot.devices() {
            let online = tables.connection(device.connection_state.as_deref());
            for kind in SensorKind::ALL {
                list.sensor.push(SensorEntity {
                    device_id: device.device_id.clone(),
                    device_type: device.device_type().to_string(),
                    device_name: device.display_name().to_string(),
                    sensor_type: kind,
                    available: online,
                    state: kind.read(&attrs, &device.device_id),
                    ha_type: SENSOR_TYPE,
                    ha_name: format!("{}{}", device.display_name(), kind.name_suffix()),
                });
            }
        }
    }

    list
}

/// Live state of a water-heater entity.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WaterHeaterStatus {
    pub device_id: String,
    pub device_name: String,
    pub online: bool,
    pub current_operation: HeaterState,
    pub target_temperature: f64,
    pub min_temperature: f64,
    pub max_temperature: f64,
    pub attributes: StateAttributes,
}

/// Live state of one sensor entity.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SensorStatus {
    pub device_id: String,
    pub sensor_type: SensorKind,
    pub available: bool,
    pub state: Value,
}

/// `None` for a device the snapshot does not know.
pub fn water_heater_status(attrs: &Attributes, device_id: &str) -> Option<WaterHeaterStatus> {
    let attributes = attrs.state_attributes(device_id)?;
    let device = attrs.snapshot().get(device_id)?;
    Some(WaterHeaterStatus {
        device_id: device_id.to_string(),
        device_name: device.display_name().to_string(),
        online: attributes.available,
        current_operation: attributes.heater_state,
        target_temperature: attrs.current_set_point(device_id),
        min_temperature: attrs.min_temperature(device_id),
        max_temperature: attrs.max_temperature(device_id),
        attributes,
    })
}

pub fn sensor_status(attrs: &Attributes, device_id: &str, kind: SensorKind) -> Option<SensorStatus> {
    if !attrs.snapshot().contains(device_id) {
        return None;
    }
    Some(SensorStatus {
        device_id: device_id.to_string(),
        sensor_type: kind,
        available: attrs.online(device_id),
        state: kind.read(attrs, device_id),
    })
}

fn water_heater_entity(device: &Device, online: bool) -> WaterHeaterEntity {
    WaterHeaterEntity {
        device_id: device.device_id.clone(),
        device_type: device.device_type().to_string(),
        device_name: device.display_name().to_string(),
        online,
        power_consumption: device.power_consumption_w(),
        volume: device.volume_l(),
        data: device.data.clone().unwrap_or_default(),
        control: device.control.clone().unwrap_or_default(),
        optimization_option: device.optimization_option.clone().unwrap_or_default(),
        optimization_suboption: device.optimization_sub_option.clone().unwrap_or_default(),
        v40_min: device.v40_min(),
        profile: device.profile().to_vec(),
        ha_type: WATER_HEATER_TYPE,
        ha_name: device.display_name().to_string(),
    }
}
