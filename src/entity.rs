use crate::coordinator::ZoneCoordinator;
use crate::config::DOMAIN;
use crate::subscription::ZoneUpdates;
use crate::types::{zone_name, DeviceInfo, PowerState, VolumeLevel, ZoneFeature, ZoneId, ZoneStatus, ZONE_FEATURES};
use serde::Serialize;
use tracing::{debug, info, warn};

/// Volume ceiling applied when the entry has no `max_volume` option
pub const DEFAULT_MAX_VOLUME: VolumeLevel = 0.6;

/// Media player view of one receiver zone
///
/// Every read is computed from the coordinator's latest snapshot; the entity
/// keeps no zone state of its own. Commands go through the coordinator,
/// with the volume capped at `max_volume`.
#[derive(Clone)]
pub struct ZoneEntity {
    coordinator: ZoneCoordinator,
    serial_number: String,
    zone_id: ZoneId,
    zone_name: String,
    max_volume: VolumeLevel,
}

/// Rendered entity state
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ZoneView {
    pub unique_id: String,
    pub name: String,
    pub available: bool,
    pub state: PowerState,
    pub volume_level: Option<VolumeLevel>,
    pub is_volume_muted: Option<bool>,
    pub source: Option<String>,
    pub source_list: Vec<String>,
}

impl ZoneEntity {
    pub fn new(
        coordinator: ZoneCoordinator,
        serial_number: impl Into<String>,
        zone_id: ZoneId,
        max_volume: VolumeLevel,
    ) -> Self {
        Self {
            coordinator,
            serial_number: serial_number.into(),
            zone_id,
            zone_name: zone_name(zone_id),
            max_volume,
        }
    }

    /// Stable id, kept compatible with previously registered entities
    pub fn unique_id(&self) -> String {
        format!("{}_{}_{}", DOMAIN, self.serial_number, self.zone_id)
    }

    pub fn name(&self) -> &str {
        &self.zone_name
    }

    pub fn zone_id(&self) -> ZoneId {
        self.zone_id
    }

    pub fn max_volume(&self) -> VolumeLevel {
        self.max_volume
    }

    pub fn coordinator(&self) -> &ZoneCoordinator {
        &self.coordinator
    }

    pub fn device_info(&self) -> DeviceInfo {
        let model = self.coordinator.series().model();
        DeviceInfo {
            identifiers: vec![(DOMAIN.to_string(), self.serial_number.clone())],
            name: format!("Anthem {}", model),
            manufacturer: "Anthem".to_string(),
            model,
            serial_number: self.serial_number.clone(),
        }
    }

    pub fn supported_features(&self) -> &'static [ZoneFeature] {
        &ZONE_FEATURES
    }

    /// False while the coordinator cannot reach the receiver
    pub fn available(&self) -> bool {
        self.coordinator.last_update_success()
    }

    /// Updates pushed by the coordinator after every refresh
    pub fn subscribe(&self) -> ZoneUpdates {
        self.coordinator.subscribe()
    }

    fn status(&self) -> ZoneStatus {
        self.coordinator.zone_status(self.zone_id)
    }

    // ========== State ==========

    pub fn state(&self) -> PowerState {
        PowerState::from(self.status().power)
    }

    pub fn volume_level(&self) -> Option<VolumeLevel> {
        self.status().volume
    }

    /// Mute state; a zone that is off without a mute reading counts as muted
    pub fn is_volume_muted(&self) -> Option<bool> {
        let status = self.status();
        match (status.mute, status.power) {
            (Some(mute), _) => Some(mute),
            (None, Some(false)) => Some(true),
            (None, _) => None,
        }
    }

    /// Name of the current source
    ///
    /// A source id without a configured name is registered as
    /// `Source <id>` and becomes selectable from then on.
    pub fn source(&self) -> Option<String> {
        let id = self.status().source?;
        Some(self.coordinator.resolve_or_register_source(id))
    }

    pub fn source_list(&self) -> Vec<String> {
        self.coordinator.source_names()
    }

    pub fn render(&self) -> ZoneView {
        // source() may register a name, so resolve it before listing
        let source = self.source();
        ZoneView {
            unique_id: self.unique_id(),
            name: self.zone_name.clone(),
            available: self.available(),
            state: self.state(),
            volume_level: self.volume_level(),
            is_volume_muted: self.is_volume_muted(),
            source,
            source_list: self.source_list(),
        }
    }

    // ========== Commands ==========

    pub async fn turn_on(&self) {
        info!(zone = self.zone_id, "Turning on {}", self.zone_name);
        self.coordinator.set_power(self.zone_id, true).await
    }

    pub async fn turn_off(&self) {
        info!(zone = self.zone_id, "Turning off {}", self.zone_name);
        self.coordinator.set_power(self.zone_id, false).await
    }

    /// Set the volume, capped at `max_volume`
    ///
    /// Only the upper bound is enforced.
    pub async fn set_volume_level(&self, volume: VolumeLevel) {
        let volume = if volume > self.max_volume {
            warn!(
                zone = self.zone_id,
                "Volume {} exceeds max {} for {}, limiting", volume, self.max_volume, self.zone_name
            );
            self.max_volume
        } else {
            volume
        };

        info!(zone = self.zone_id, "Setting {} volume to {}", self.zone_name, volume);
        self.coordinator.set_volume(self.zone_id, volume).await
    }

    pub async fn volume_up(&self) {
        debug!(zone = self.zone_id, "Increasing volume for {}", self.zone_name);
        self.coordinator.volume_up(self.zone_id).await
    }

    pub async fn volume_down(&self) {
        debug!(zone = self.zone_id, "Decreasing volume for {}", self.zone_name);
        self.coordinator.volume_down(self.zone_id).await
    }

    pub async fn mute_volume(&self, mute: bool) {
        info!(zone = self.zone_id, "Setting mute to {} for {}", mute, self.zone_name);
        self.coordinator.set_mute(self.zone_id, mute).await
    }

    /// Select a source by display name; unknown names are ignored
    pub async fn select_source(&self, source: &str) {
        let Some(source_id) = self.coordinator.source_id(source) else {
            warn!(zone = self.zone_id, "Source \"{}\" not found for {}", source, self.zone_name);
            return;
        };

        info!(
            zone = self.zone_id,
            "Selecting source \"{}\" (id={}) for {}", source, source_id, self.zone_name
        );
        self.coordinator.set_source(self.zone_id, source_id).await
    }
}
