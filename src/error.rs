use crate::types::ZoneId;
use thiserror::Error;

/// Result type for Anthem operations
pub type Result<T> = std::result::Result<T, AnthemError>;

/// Errors that can occur when talking to an Anthem receiver
///
/// Only [`AnthemError::UpdateFailed`] ever leaves the coordinator. The other
/// device-side variants are logged and absorbed where they occur.
#[derive(Error, Debug)]
pub enum AnthemError {
    /// The controller factory returned no usable handle
    #[error("Failed to create amp controller for {port}")]
    ConnectionFailed {
        /// Serial port the connection was attempted on
        port: String,
    },

    /// A refresh could not run because the device is unreachable
    #[error("Update failed: {0}")]
    UpdateFailed(String),

    /// Status query for a single zone failed
    #[error("Zone {zone} status query failed: {detail}")]
    ZoneQueryFailed {
        /// Zone that failed
        zone: ZoneId,
        /// Error detail reported by the controller
        detail: String,
    },

    /// A device command was rejected or failed in transit
    #[error("Command {command} failed for zone {zone}: {detail}")]
    CommandFailed {
        /// Command name
        command: &'static str,
        /// Target zone
        zone: ZoneId,
        /// Error detail reported by the controller
        detail: String,
    },

    /// Closing the controller handle failed
    #[error("Disconnect failed: {0}")]
    DisconnectFailed(String),

    /// Error raised by a controller implementation
    #[error("Controller error: {0}")]
    Controller(String),

    /// Series identifier not in the supported set
    #[error("Invalid series: {0}")]
    InvalidSeries(String),

    /// Option value outside its allowed range
    #[error("Invalid option {key}: {detail}")]
    InvalidOption {
        /// Option key
        key: &'static str,
        /// Why it was rejected
        detail: String,
    },

    /// An entry with the same unique id already exists
    #[error("Already configured: {0}")]
    AlreadyConfigured(String),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Channel receive error
    #[error("Channel error: {0}")]
    ChannelError(String),
}

impl AnthemError {
    /// Short error key as shown by the config flow form
    pub fn form_key(&self) -> &'static str {
        match self {
            AnthemError::InvalidSeries(_) => "invalid_series",
            AnthemError::InvalidOption { .. } => "invalid_option",
            AnthemError::AlreadyConfigured(_) => "already_configured",
            AnthemError::ConnectionFailed { .. } | AnthemError::UpdateFailed(_) => "cannot_connect",
            _ => "unknown",
        }
    }
}
