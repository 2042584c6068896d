use crate::error::{AnthemError, Result};
use crate::types::{ZoneId, ZoneStatus};
use std::collections::BTreeMap;
use tokio::sync::broadcast;

/// Notification published by the coordinator after every refresh
#[derive(Debug, Clone)]
pub enum ZoneUpdate {
    /// Fresh snapshots for every configured zone
    Refreshed(BTreeMap<ZoneId, ZoneStatus>),

    /// The refresh could not reach the device
    UpdateFailed(String),

    /// The connection was closed and all snapshots discarded
    Disconnected,
}

/// Receiver for zone updates
pub struct ZoneUpdates {
    rx: broadcast::Receiver<ZoneUpdate>,
}

impl ZoneUpdates {
    pub(crate) fn new(rx: broadcast::Receiver<ZoneUpdate>) -> Self {
        Self { rx }
    }

    /// Receive the next update
    ///
    /// Fails with [`AnthemError::ChannelError`] once the coordinator is gone.
    pub async fn recv(&mut self) -> Result<ZoneUpdate> {
        self.rx.recv().await.map_err(|e| match e {
            broadcast::error::RecvError::Closed => AnthemError::ChannelError("Coordinator dropped".to_string()),
            broadcast::error::RecvError::Lagged(n) => {
                AnthemError::ChannelError(format!("Lagged by {} messages", n))
            }
        })
    }

    /// Try to receive an update without blocking
    ///
    /// Returns `None` if no message is available.
    pub fn try_recv(&mut self) -> Result<Option<ZoneUpdate>> {
        match self.rx.try_recv() {
            Ok(update) => Ok(Some(update)),
            Err(broadcast::error::TryRecvError::Empty) => Ok(None),
            Err(broadcast::error::TryRecvError::Closed) => {
                Err(AnthemError::ChannelError("Coordinator dropped".to_string()))
            }
            Err(broadcast::error::TryRecvError::Lagged(n)) => {
                Err(AnthemError::ChannelError(format!("Lagged by {} messages", n)))
            }
        }
    }
}
