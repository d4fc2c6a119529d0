//! Byte transports carrying the RS-485 bus.
//!
//! A transport moves raw bytes with bounded timeouts and performs no protocol
//! interpretation whatsoever; framing and CRC live one layer up in
//! [`crate::client`].

mod serial;
mod tcp;

pub use serial::SerialTransport;
pub use tcp::TcpTransport;

use std::fmt;
use std::time::Duration;

use crate::errors::TransportError;

/// Increment used by the bounded read poll loops.
pub(crate) const POLL_INTERVAL: Duration = Duration::from_millis(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportKind {
    Serial,
    Tcp,
    Loopback,
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportKind::Serial => write!(f, "serial"),
            TransportKind::Tcp => write!(f, "tcp"),
            TransportKind::Loopback => write!(f, "loopback"),
        }
    }
}

/// Byte channel with bounded-timeout reads.
///
/// `read` polls in [`POLL_INTERVAL`] increments until `max_len` bytes arrive
/// or `timeout` elapses, then returns whatever accumulated, possibly fewer
/// bytes than requested and possibly none. It never blocks past the timeout.
/// Partial data is not an error at this layer; the caller decides whether a
/// short read is fatal.
pub trait Transport: Send {
    fn open(&mut self) -> Result<(), TransportError>;

    fn close(&mut self) -> Result<(), TransportError>;

    fn is_open(&self) -> bool;

    /// Writes `data`, returning the number of bytes actually written.
    fn write(&mut self, data: &[u8]) -> Result<usize, TransportError>;

    /// Reads up to `max_len` bytes within `timeout`.
    fn read(&mut self, max_len: usize, timeout: Duration) -> Result<Vec<u8>, TransportError>;

    fn flush(&mut self) -> Result<(), TransportError>;

    fn kind(&self) -> TransportKind;

    /// Human-readable connection descriptor (port name or host:port).
    fn connection_string(&self) -> String;
}
