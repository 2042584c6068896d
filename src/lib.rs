//! Rust library exposing Anthem A/V receiver zones as media player entities
//!
//! Gen1 Anthem receivers and processors (D1, D2, D2v, AVM 20/30/50, MRX) are
//! controlled over RS-232. This crate sits on top of an external serial
//! controller and provides:
//!
//! - A zone coordinator that owns the one serial connection, polls every
//!   zone on a fixed interval and serializes all device commands
//! - One media player entity per zone, with a configurable volume ceiling
//! - Config entries with setup and options validation
//! - Setup/unload lifecycle and a redacted diagnostics dump
//!
//! # Quick Start
//!
//! ```no_run
//! use anthem_zones::{setup_entry, ConfigFlow, ControllerFactory, UserInput};
//! use std::sync::Arc;
//!
//! # async fn run(factory: Arc<dyn ControllerFactory>) -> Result<(), Box<dyn std::error::Error>> {
//! let entry = ConfigFlow::default().step_user(UserInput {
//!     port: "/dev/ttyUSB0".to_string(),
//!     series: "d2v".to_string(),
//!     ..Default::default()
//! })?;
//!
//! let loaded = setup_entry(entry, factory).await?;
//! if let Some(main) = loaded.entity(1) {
//!     main.turn_on().await;
//!     main.set_volume_level(0.4).await;
//!     main.select_source("Tuner").await;
//!
//!     let mut updates = main.subscribe();
//!     updates.recv().await?;
//!     println!("{:?}", main.render());
//! }
//!
//! loaded.unload().await;
//! # Ok(())
//! # }
//! ```
//!
//! # Architecture
//!
//! - **Controller**: capability traits implemented by the serial protocol layer
//! - **Coordinator**: connection ownership, polling, command serialization
//! - **Entity**: per-zone projection of the coordinator's snapshots
//! - **Config**: persisted entries and the flows that edit them
//! - **Integration**: setup, unload and reload of an entry
//! - **Diagnostics**: redacted state dump

mod config;
mod controller;
mod coordinator;
mod diagnostics;
mod entity;
mod error;
mod integration;
mod series;
mod sources;
mod subscription;
mod types;

#[cfg(test)]
mod test_support;

// Public exports
pub use config::{
    ConfigEntry, ConfigFlow, EntryData, EntryOptions, OptionsFlow, UserInput, DEFAULT_NAME,
    DEFAULT_SERIAL_NUMBER, DOMAIN, MAX_VOLUME_RANGE, SCAN_INTERVAL_RANGE,
};
pub use controller::{AmpController, ControllerFactory};
pub use coordinator::{CoordinatorSettings, ZoneCoordinator, DEFAULT_SCAN_INTERVAL};
pub use diagnostics::{entry_diagnostics, redact, REDACTED, REDACT_KEYS};
pub use entity::{ZoneEntity, ZoneView, DEFAULT_MAX_VOLUME};
pub use error::{AnthemError, Result};
pub use integration::{setup_entry, LoadedEntry};
pub use series::Series;
pub use sources::SourceRegistry;
pub use subscription::{ZoneUpdate, ZoneUpdates};
pub use types::{
    zone_name, DeviceInfo, PowerState, SourceId, VolumeLevel, ZoneFeature, ZoneId, ZoneStatus,
    DEFAULT_ZONES, ZONE_FEATURES,
};
