use serde::{Deserialize, Serialize};

/// Zone identifier (1 is the main zone)
pub type ZoneId = u8;

/// Input source identifier
pub type SourceId = u8;

/// Volume level in the range `0.0..=1.0`
pub type VolumeLevel = f64;

/// Zones polled when nothing else is configured
pub const DEFAULT_ZONES: [ZoneId; 3] = [1, 2, 3];

/// Last known state of a single zone
///
/// Every field is optional: the receiver omits most values while a zone is
/// powered off, and a failed query yields an empty status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ZoneStatus {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub power: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume: Option<VolumeLevel>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mute: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<SourceId>,
}

impl ZoneStatus {
    /// Status with no known fields
    pub fn empty() -> Self {
        Self::default()
    }

    /// Whether no field is known
    pub fn is_empty(&self) -> bool {
        self.power.is_none() && self.volume.is_none() && self.mute.is_none() && self.source.is_none()
    }
}

/// Power state reported by an entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PowerState {
    On,
    Off,
    Unknown,
}

impl From<Option<bool>> for PowerState {
    fn from(power: Option<bool>) -> Self {
        match power {
            Some(true) => PowerState::On,
            Some(false) => PowerState::Off,
            None => PowerState::Unknown,
        }
    }
}

/// Features supported by a zone entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZoneFeature {
    TurnOn,
    TurnOff,
    VolumeSet,
    VolumeMute,
    VolumeStep,
    SelectSource,
}

/// Every feature an Anthem zone exposes
pub const ZONE_FEATURES: [ZoneFeature; 6] = [
    ZoneFeature::TurnOn,
    ZoneFeature::TurnOff,
    ZoneFeature::VolumeSet,
    ZoneFeature::VolumeMute,
    ZoneFeature::VolumeStep,
    ZoneFeature::SelectSource,
];

/// Device registry metadata shared by all zones of one receiver
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInfo {
    /// `(domain, serial number)` pairs identifying the device
    pub identifiers: Vec<(String, String)>,
    pub name: String,
    pub manufacturer: String,
    pub model: String,
    pub serial_number: String,
}

/// Display name for a zone
pub fn zone_name(zone: ZoneId) -> String {
    if zone == 1 {
        "Main Zone".to_string()
    } else {
        format!("Zone {}", zone)
    }
}
