//! Capability interface for the external RS-232 amp controller
//!
//! The serial transport, framing and per-series command dialects live behind
//! these traits. The coordinator only ever talks to a receiver through an
//! [`AmpController`] obtained from a [`ControllerFactory`].

use crate::error::Result;
use crate::series::Series;
use crate::types::{SourceId, VolumeLevel, ZoneId, ZoneStatus};
use async_trait::async_trait;
use std::collections::BTreeMap;

/// Live handle to one receiver
#[async_trait]
pub trait AmpController: Send + Sync {
    /// Query the current status of a zone
    ///
    /// `Ok(None)` means the receiver replied without usable data.
    async fn zone_status(&self, zone: ZoneId) -> Result<Option<ZoneStatus>>;

    /// Power a zone on or off
    async fn set_power(&self, zone: ZoneId, power: bool) -> Result<()>;

    /// Set the absolute volume of a zone
    async fn set_volume(&self, zone: ZoneId, volume: VolumeLevel) -> Result<()>;

    /// Mute or unmute a zone
    async fn set_mute(&self, zone: ZoneId, mute: bool) -> Result<()>;

    /// Select the input source of a zone
    async fn set_source(&self, zone: ZoneId, source: SourceId) -> Result<()>;

    /// Step the zone volume up by one receiver increment
    async fn volume_up(&self, zone: ZoneId) -> Result<()>;

    /// Step the zone volume down by one receiver increment
    async fn volume_down(&self, zone: ZoneId) -> Result<()>;

    /// Release the serial port
    async fn close(&self) -> Result<()>;
}

/// Creates controller handles for a given series and port
#[async_trait]
pub trait ControllerFactory: Send + Sync {
    /// Open a controller
    ///
    /// `overrides` carries optional serial settings (baud rate, timeouts)
    /// passed through to the implementation untouched. `Ok(None)` means the
    /// implementation could not produce a usable handle.
    async fn create(
        &self,
        series: Series,
        port: &str,
        overrides: Option<&serde_json::Value>,
    ) -> Result<Option<Box<dyn AmpController>>>;

    /// Source names a freshly configured device starts with
    fn default_sources(&self, series: Series) -> BTreeMap<SourceId, String> {
        series.default_sources()
    }
}
