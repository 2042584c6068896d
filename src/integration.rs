use crate::config::{ConfigEntry, EntryOptions, OptionsFlow};
use crate::controller::ControllerFactory;
use crate::coordinator::ZoneCoordinator;
use crate::diagnostics;
use crate::entity::ZoneEntity;
use crate::error::Result;
use crate::types::ZoneId;
use std::sync::Arc;
use tracing::info;

/// Set up a config entry
///
/// Builds the coordinator, runs the first refresh (failing with
/// [`AnthemError::UpdateFailed`](crate::AnthemError::UpdateFailed) when the
/// receiver is unreachable), creates one entity per zone and starts polling.
pub async fn setup_entry(entry: ConfigEntry, factory: Arc<dyn ControllerFactory>) -> Result<LoadedEntry> {
    entry.options.validate()?;

    let coordinator = ZoneCoordinator::new(entry.coordinator_settings(), factory.clone());
    coordinator.refresh().await?;

    let series = coordinator.series();
    let entities: Vec<ZoneEntity> = coordinator
        .zones()
        .iter()
        .map(|&zone| {
            let entity = ZoneEntity::new(
                coordinator.clone(),
                entry.data.serial_number.clone(),
                zone,
                entry.options.max_volume,
            );
            info!("Adding Anthem {} zone {} ({})", series, zone, entity.name());
            entity
        })
        .collect();

    coordinator.start();
    info!(
        "Anthem {} setup complete for {} with {} zones",
        series,
        entry.data.port,
        entities.len()
    );

    Ok(LoadedEntry {
        entry,
        factory,
        coordinator,
        entities,
    })
}

/// A set-up entry: owns its coordinator and the zone entities
pub struct LoadedEntry {
    entry: ConfigEntry,
    factory: Arc<dyn ControllerFactory>,
    coordinator: ZoneCoordinator,
    entities: Vec<ZoneEntity>,
}

impl LoadedEntry {
    pub fn entry(&self) -> &ConfigEntry {
        &self.entry
    }

    pub fn coordinator(&self) -> &ZoneCoordinator {
        &self.coordinator
    }

    pub fn entities(&self) -> &[ZoneEntity] {
        &self.entities
    }

    pub fn entity(&self, zone: ZoneId) -> Option<&ZoneEntity> {
        self.entities.iter().find(|e| e.zone_id() == zone)
    }

    /// Diagnostics dump with identity fields redacted
    pub fn diagnostics(&self) -> serde_json::Value {
        diagnostics::entry_diagnostics(&self.entry, &self.coordinator)
    }

    /// Stop polling and release the receiver
    ///
    /// Returns the entry so it can be set up again.
    pub async fn unload(self) -> ConfigEntry {
        self.coordinator.stop().await;
        self.coordinator.disconnect().await;
        info!("Anthem integration unloaded for {}", self.entry.data.port);
        self.entry
    }

    /// Tear down and set up again from the stored entry
    pub async fn reload(self) -> Result<LoadedEntry> {
        let factory = self.factory.clone();
        let entry = self.unload().await;
        setup_entry(entry, factory).await
    }

    /// Apply new options, reloading when they changed
    pub async fn update_options(mut self, options: EntryOptions) -> Result<LoadedEntry> {
        if OptionsFlow::new(&mut self.entry).step_init(options)? {
            self.reload().await
        } else {
            Ok(self)
        }
    }
}
