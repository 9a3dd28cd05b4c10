//! Effect engine error types

use rhino_transport::{ParseError, TransportError};
use thiserror::Error;

/// Errors from device and effect operations
#[derive(Error, Debug)]
pub enum FfbError {
    /// Opening the device failed
    #[error("Device unavailable: {0}")]
    DeviceUnavailable(String),

    /// A read or write failed; the connection has been dropped
    #[error("I/O error: {0}")]
    Io(String),

    /// The device answered with a report that could not be decoded
    #[error("Malformed report: {0}")]
    MalformedReport(String),

    /// The device has no free effect slots (block load status attached)
    #[error("Effect pool exhausted (load status {status})")]
    PoolExhausted { status: u8 },

    /// Operation on a destroyed or reset effect handle
    #[error("Effect handle invalidated")]
    InvalidatedHandle,

    /// No transport is open right now (reconnection pending)
    #[error("Device disconnected")]
    Disconnected,

    /// Invalid parameter value
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Any other transport layer error
    #[error("Transport error: {0}")]
    Transport(TransportError),
}

impl FfbError {
    /// Whether the error should hand the connection to the reconnection supervisor
    pub fn is_connection_loss(&self) -> bool {
        matches!(self, Self::Io(_) | Self::Disconnected)
    }
}

impl From<TransportError> for FfbError {
    fn from(e: TransportError) -> Self {
        match e {
            TransportError::Io(msg) => FfbError::Io(msg),
            TransportError::Disconnected => FfbError::Disconnected,
            TransportError::DeviceNotFound(msg) | TransportError::DeviceUnavailable(msg) => {
                FfbError::DeviceUnavailable(msg)
            }
            TransportError::MalformedReport(e) => FfbError::MalformedReport(e.to_string()),
            other => FfbError::Transport(other),
        }
    }
}

impl From<ParseError> for FfbError {
    fn from(e: ParseError) -> Self {
        FfbError::MalformedReport(e.to_string())
    }
}

/// Result alias for effect engine operations
pub type Result<T> = std::result::Result<T, FfbError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_error_mapping() {
        assert!(matches!(
            FfbError::from(TransportError::Io("x".into())),
            FfbError::Io(_)
        ));
        assert!(matches!(
            FfbError::from(TransportError::DeviceNotFound("x".into())),
            FfbError::DeviceUnavailable(_)
        ));
        assert!(matches!(
            FfbError::from(TransportError::PermissionDenied("x".into())),
            FfbError::Transport(TransportError::PermissionDenied(_))
        ));
    }

    #[test]
    fn test_connection_loss() {
        assert!(FfbError::Io("write".into()).is_connection_loss());
        assert!(FfbError::Disconnected.is_connection_loss());
        assert!(!FfbError::PoolExhausted { status: 2 }.is_connection_loss());
    }
}
