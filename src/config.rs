//! Persisted config entries and the flows that create and edit them
//!
//! An entry stores only the device identity (`port`, `series`,
//! `serial_number`) and the user options (`scan_interval`, `max_volume`).
//! Zone state is never persisted.

use crate::coordinator::{CoordinatorSettings, DEFAULT_SCAN_INTERVAL};
use crate::entity::DEFAULT_MAX_VOLUME;
use crate::error::{AnthemError, Result};
use crate::series::Series;
use crate::types::VolumeLevel;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::ops::RangeInclusive;
use std::time::Duration;
use tracing::{debug, info};

/// Integration domain, also the prefix of entity unique ids
pub const DOMAIN: &str = "anthemav_serial";

pub const DEFAULT_NAME: &str = "Anthem Receiver";
pub const DEFAULT_SERIAL_NUMBER: &str = "000000";

/// Allowed `scan_interval` values in seconds
pub const SCAN_INTERVAL_RANGE: RangeInclusive<u64> = 5..=300;

/// Allowed `max_volume` values
pub const MAX_VOLUME_RANGE: RangeInclusive<VolumeLevel> = 0.0..=1.0;

const ENTRY_VERSION: u32 = 1;

/// Device identity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryData {
    pub port: String,
    pub series: Series,
    #[serde(default = "default_serial_number")]
    pub serial_number: String,
}

/// User tunable options
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EntryOptions {
    /// Poll interval in seconds
    #[serde(default = "default_scan_interval")]
    pub scan_interval: u64,

    #[serde(default = "default_max_volume")]
    pub max_volume: VolumeLevel,
}

fn default_serial_number() -> String {
    DEFAULT_SERIAL_NUMBER.to_string()
}

fn default_scan_interval() -> u64 {
    DEFAULT_SCAN_INTERVAL.as_secs()
}

fn default_max_volume() -> VolumeLevel {
    DEFAULT_MAX_VOLUME
}

impl Default for EntryOptions {
    fn default() -> Self {
        Self {
            scan_interval: default_scan_interval(),
            max_volume: default_max_volume(),
        }
    }
}

impl EntryOptions {
    pub fn validate(&self) -> Result<()> {
        if !SCAN_INTERVAL_RANGE.contains(&self.scan_interval) {
            return Err(AnthemError::InvalidOption {
                key: "scan_interval",
                detail: format!(
                    "{} is outside {}..={} seconds",
                    self.scan_interval,
                    SCAN_INTERVAL_RANGE.start(),
                    SCAN_INTERVAL_RANGE.end()
                ),
            });
        }

        if !MAX_VOLUME_RANGE.contains(&self.max_volume) {
            return Err(AnthemError::InvalidOption {
                key: "max_volume",
                detail: format!("{} is outside 0.0..=1.0", self.max_volume),
            });
        }

        Ok(())
    }

    pub fn update_interval(&self) -> Duration {
        Duration::from_secs(self.scan_interval)
    }
}

/// One configured receiver
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigEntry {
    pub entry_id: String,
    pub version: u32,
    pub domain: String,
    pub title: String,
    pub unique_id: String,
    pub data: EntryData,
    #[serde(default)]
    pub options: EntryOptions,
}

impl ConfigEntry {
    pub fn new(title: impl Into<String>, data: EntryData, options: EntryOptions) -> Self {
        Self {
            entry_id: uuid::Uuid::new_v4().simple().to_string(),
            version: ENTRY_VERSION,
            domain: DOMAIN.to_string(),
            title: title.into(),
            unique_id: data.port.clone(),
            data,
            options,
        }
    }

    /// Load a persisted entry, rejecting out of range options
    pub fn from_json(json: &str) -> Result<Self> {
        let entry: ConfigEntry = serde_json::from_str(json)?;
        entry.options.validate()?;
        Ok(entry)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Coordinator settings for this entry
    pub fn coordinator_settings(&self) -> CoordinatorSettings {
        CoordinatorSettings::new(self.data.port.clone(), self.data.series)
            .with_update_interval(self.options.update_interval())
    }
}

/// Input of the initial setup form
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserInput {
    pub port: String,
    pub series: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub serial_number: Option<String>,
}

/// Setup form: validates input and produces new entries
///
/// The port doubles as the unique id, so one serial port can back at most
/// one entry.
#[derive(Debug, Default)]
pub struct ConfigFlow {
    configured: BTreeSet<String>,
}

impl ConfigFlow {
    /// Flow aware of the unique ids of existing entries
    pub fn new<I, S>(configured: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            configured: configured.into_iter().map(Into::into).collect(),
        }
    }

    /// `(value, label)` pairs for the series dropdown
    pub fn series_options() -> Vec<(&'static str, &'static str)> {
        Series::ALL.iter().map(|s| (s.as_str(), s.label())).collect()
    }

    /// Handle the user step
    pub fn step_user(&mut self, input: UserInput) -> Result<ConfigEntry> {
        let series: Series = input.series.parse()?;

        let port = input.port.trim().to_string();
        if port.is_empty() {
            return Err(AnthemError::InvalidOption {
                key: "port",
                detail: "port must not be empty".to_string(),
            });
        }

        if self.configured.contains(&port) {
            debug!(port = %port, "Entry already configured");
            return Err(AnthemError::AlreadyConfigured(port));
        }

        let title = input
            .name
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| format!("Anthem {}", series.model()));

        let serial_number = input
            .serial_number
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(default_serial_number);

        let entry = ConfigEntry::new(
            title,
            EntryData {
                port: port.clone(),
                series,
                serial_number,
            },
            EntryOptions::default(),
        );

        self.configured.insert(port);
        info!(title = %entry.title, series = %series, "Created config entry");
        Ok(entry)
    }
}

/// Options form for an existing entry
pub struct OptionsFlow<'a> {
    entry: &'a mut ConfigEntry,
}

impl<'a> OptionsFlow<'a> {
    pub fn new(entry: &'a mut ConfigEntry) -> Self {
        Self { entry }
    }

    /// Values the form is pre-filled with
    pub fn current(&self) -> EntryOptions {
        self.entry.options
    }

    /// Validate and store new options
    ///
    /// Returns whether anything changed, which means the entry must be
    /// reloaded for the new values to take effect.
    pub fn step_init(&mut self, options: EntryOptions) -> Result<bool> {
        options.validate()?;

        let changed = self.entry.options != options;
        self.entry.options = options;
        if changed {
            info!(entry_id = %self.entry.entry_id, ?options, "Options updated");
        }
        Ok(changed)
    }
}
