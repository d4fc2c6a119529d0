use std::time::Duration;
use thiserror::Error;

use super::{IoOperation, SerialErrorKind};

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Transport not open: {transport}")]
    NotOpen { transport: String },

    #[error("Serial port error: {kind} on {port} - {details}")]
    Serial {
        kind: SerialErrorKind,
        port: String,
        details: String,
        #[source]
        source: Option<serialport::Error>,
    },

    #[error("I/O error during {operation}: {details}")]
    Io {
        operation: IoOperation,
        details: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Connect timeout after {elapsed:?}, limit was {limit:?}")]
    ConnectTimeout { elapsed: Duration, limit: Duration },

    #[error("No response within {limit:?}")]
    NoResponse { limit: Duration },
}

impl TransportError {
    pub fn not_open(transport: impl Into<String>) -> Self {
        TransportError::NotOpen {
            transport: transport.into(),
        }
    }

    pub fn io(operation: IoOperation, details: impl Into<String>, source: std::io::Error) -> Self {
        TransportError::Io {
            operation,
            details: details.into(),
            source,
        }
    }
}

impl From<serialport::Error> for TransportError {
    fn from(err: serialport::Error) -> Self {
        match err.kind {
            serialport::ErrorKind::NoDevice => TransportError::Serial {
                kind: SerialErrorKind::OpenFailed,
                port: err.to_string(),
                details: "Device not found".into(),
                source: Some(err),
            },
            serialport::ErrorKind::InvalidInput => TransportError::Serial {
                kind: SerialErrorKind::ConfigurationFailed,
                port: err.to_string(),
                details: "Invalid configuration".into(),
                source: Some(err),
            },
            serialport::ErrorKind::Io(io_err) => TransportError::Io {
                operation: match io_err {
                    std::io::ErrorKind::NotFound => IoOperation::Configure,
                    std::io::ErrorKind::PermissionDenied => IoOperation::Configure,
                    std::io::ErrorKind::TimedOut => IoOperation::Read,
                    std::io::ErrorKind::WriteZero => IoOperation::Write,
                    _ => IoOperation::Control,
                },
                details: io_err.to_string(),
                source: std::io::Error::new(io_err, err.description),
            },
            _ => TransportError::Serial {
                kind: SerialErrorKind::OpenFailed,
                port: err.to_string(),
                details: err.to_string(),
                source: Some(err),
            },
        }
    }
}

impl From<std::io::Error> for TransportError {
    fn from(err: std::io::Error) -> Self {
        TransportError::Io {
            operation: match err.kind() {
                std::io::ErrorKind::TimedOut => IoOperation::Read,
                std::io::ErrorKind::WouldBlock => IoOperation::Read,
                std::io::ErrorKind::WriteZero => IoOperation::Write,
                std::io::ErrorKind::Interrupted => IoOperation::Control,
                _ => IoOperation::Control,
            },
            details: err.to_string(),
            source: err,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_open_display() {
        let err = TransportError::not_open("serial /dev/ttyUSB0");
        assert_eq!(err.to_string(), "Transport not open: serial /dev/ttyUSB0");
    }

    #[test]
    fn test_transport_error_from_serial_error() {
        let serial_err =
            serialport::Error::new(serialport::ErrorKind::NoDevice, "Device not found");

        let transport_err = TransportError::from(serial_err);
        match transport_err {
            TransportError::Serial { kind, .. } => {
                assert_eq!(kind, SerialErrorKind::OpenFailed);
            }
            _ => panic!("Expected Serial error variant"),
        }
    }

    #[test]
    fn test_transport_error_from_io_timeout() {
        let io_err = std::io::Error::new(std::io::ErrorKind::TimedOut, "timed out");
        match TransportError::from(io_err) {
            TransportError::Io { operation, .. } => assert_eq!(operation, IoOperation::Read),
            _ => panic!("Expected Io error variant"),
        }
    }
}
