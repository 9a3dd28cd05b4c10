//! Transport error types

use thiserror::Error;

/// Errors that can occur during transport operations
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Device not found: {0}")]
    DeviceNotFound(String),

    /// Open failed (in use, unplugged, driver refused)
    #[error("Device unavailable: {0}")]
    DeviceUnavailable(String),

    #[error("HID permission denied: {0}")]
    PermissionDenied(String),

    /// A read or write call failed; the connection must be considered dead
    #[error("HID I/O error: {0}")]
    Io(String),

    #[error("Malformed report: {0}")]
    MalformedReport(#[from] ParseError),

    #[error("Device disconnected")]
    Disconnected,

    /// USB control transfer failure (firmware query)
    #[error("USB error: {0}")]
    Usb(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl TransportError {
    /// Whether this error means the open transport can no longer be used
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Io(_) | Self::Disconnected)
    }
}

impl From<hidapi::HidError> for TransportError {
    fn from(e: hidapi::HidError) -> Self {
        let msg = e.to_string();
        if msg.contains("Permission denied") || msg.contains("EPERM") || msg.contains("EACCES") {
            TransportError::PermissionDenied(msg)
        } else {
            TransportError::Io(msg)
        }
    }
}

/// Decode failure for a fixed-layout report
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("{report}: too short, expected {expected} bytes, got {got}")]
    TooShort {
        report: &'static str,
        expected: usize,
        got: usize,
    },

    #[error("{report}: report id mismatch, expected {expected}, got {got}")]
    ReportIdMismatch {
        report: &'static str,
        expected: u8,
        got: u8,
    },

    #[error("invalid value for {field}: {value}")]
    InvalidValue { field: &'static str, value: u8 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatal_classification() {
        assert!(TransportError::Io("write".into()).is_fatal());
        assert!(TransportError::Disconnected.is_fatal());
        assert!(!TransportError::Usb("stall".into()).is_fatal());
    }

    #[test]
    fn test_parse_error_display() {
        let err = ParseError::TooShort {
            report: "Input",
            expected: 19,
            got: 3,
        };
        assert_eq!(err.to_string(), "Input: too short, expected 19 bytes, got 3");
    }
}
