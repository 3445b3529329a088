use thiserror::Error;

pub type Result<T> = std::result::Result<T, SessionError>;

/// Error taxonomy for the broadcast session core.
///
/// Recoverability is part of the contract: `Permission`, `DeviceSwitch` and
/// `Network` leave the session in a state the user can retry from;
/// `Protocol` is contained inside the channel and never reaches the user;
/// `State` is rejected synchronously before any device or network call.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("device access denied: {0}")]
    Permission(String),

    #[error("no capture device found: {0}")]
    DeviceNotFound(String),

    #[error("device switch failed: {0}")]
    DeviceSwitch(String),

    #[error("backend call failed{}: {message}", .status.map(|s| format!(" ({s})")).unwrap_or_default())]
    Network {
        status: Option<u16>,
        message: String,
    },

    #[error("malformed channel message: {0}")]
    Protocol(String),

    #[error("operation not valid in current state: {0}")]
    State(String),

    #[error("realtime channel failure: {0}")]
    Channel(String),
}

impl SessionError {
    pub fn network(status: impl Into<Option<u16>>, message: impl Into<String>) -> Self {
        Self::Network {
            status: status.into(),
            message: message.into(),
        }
    }

    /// Whether the user can retry the failed operation without tearing the
    /// session down.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Permission(_) | Self::DeviceSwitch(_) | Self::Network { .. }
        )
    }
}
