mod api;
mod attributes;
mod commands;
mod config;
mod entities;
mod error;
mod logger;
mod normalize;
mod protocol;
mod recovery;
mod session;
mod snapshot;
mod sync;
mod types;

pub use api::{ApiResponse, HttpApi, RemoteApi};
pub use attributes::{Attributes, StateAttributes};
pub use config::{SessionConfig, SessionOptions};
pub use entities::{
    build_entities, EntityList, SensorEntity, SensorKind, SensorStatus, WaterHeaterEntity,
    WaterHeaterStatus,
};
pub use error::{Error, Result};
pub use logger::MessageLogMode;
pub use normalize::*;
pub use protocol::{DeviceField, DEFAULT_BASE_URL};
pub use recovery::RecoveryLedger;
pub use session::{Session, SessionBuilder};
pub use snapshot::DeviceSnapshot;
pub use sync::{DEFAULT_SCAN_INTERVAL, MIN_SCAN_INTERVAL};
pub use types::*;
