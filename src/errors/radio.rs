use thiserror::Error;

use super::{ConfigError, FrameError, ProtocolErrorKind, TransportError};

/// Top-level error type for the radio control stack.
///
/// `Protocol` means the device answered and rejected the request; it is kept
/// distinct from `Transport`, where the device never answered correctly.
#[derive(Error, Debug)]
pub enum RadioError {
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Frame error: {0}")]
    Frame(#[from] FrameError),

    #[error("Device exception from address {device}: code 0x{code:02X} ({kind:?})")]
    Protocol {
        device: u8,
        kind: Option<ProtocolErrorKind>,
        code: u8,
    },

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Initialization error: {0}")]
    Init(String),
}

impl RadioError {
    /// Builds a `Protocol` error from a raw exception code.
    pub fn exception(device: u8, code: u8) -> Self {
        RadioError::Protocol {
            device,
            kind: ProtocolErrorKind::from_exception_code(code),
            code,
        }
    }

    pub fn validation(details: impl Into<String>) -> Self {
        RadioError::Validation(details.into())
    }

    pub fn init(details: impl Into<String>) -> Self {
        RadioError::Init(details.into())
    }

    /// True when the device responded with an exception frame.
    pub fn is_device_exception(&self) -> bool {
        matches!(self, RadioError::Protocol { .. })
    }
}
