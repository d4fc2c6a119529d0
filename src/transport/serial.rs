use std::io::{Read, Write};
use std::time::Instant;

use serialport::SerialPort;
use tracing::{debug, info};

use crate::config::SerialConfig;
use crate::errors::{IoOperation, TransportError};

use super::{Transport, TransportKind, POLL_INTERVAL};

/// Directly attached RS-485 serial adapter.
pub struct SerialTransport {
    config: SerialConfig,
    port: Option<Box<dyn SerialPort>>,
}

impl SerialTransport {
    pub fn new(config: SerialConfig) -> Self {
        Self { config, port: None }
    }

    fn port_mut(&mut self) -> Result<&mut Box<dyn SerialPort>, TransportError> {
        let info = self.config.port_info();
        self.port
            .as_mut()
            .ok_or_else(|| TransportError::not_open(format!("serial {}", info)))
    }
}

impl Transport for SerialTransport {
    fn open(&mut self) -> Result<(), TransportError> {
        if self.port.is_some() {
            return Ok(());
        }

        info!("Opening serial port {}", self.config.port_info());

        let port = serialport::new(&self.config.device, self.config.baud_rate)
            .data_bits(self.config.data_bits.into())
            .parity(self.config.parity.into())
            .stop_bits(self.config.stop_bits.into())
            .flow_control(serialport::FlowControl::None)
            // Short poll timeout; the overall deadline is enforced in read()
            .timeout(POLL_INTERVAL)
            .open()?;

        port.clear(serialport::ClearBuffer::All)?;

        self.port = Some(port);
        Ok(())
    }

    fn close(&mut self) -> Result<(), TransportError> {
        if let Some(port) = self.port.take() {
            port.clear(serialport::ClearBuffer::All)?;
            info!("Closed serial port {}", self.config.device);
        }
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.port.is_some()
    }

    fn write(&mut self, data: &[u8]) -> Result<usize, TransportError> {
        let port = self.port_mut()?;

        let written = port.write(data).map_err(|e| {
            TransportError::io(IoOperation::Write, "Failed to write request", e)
        })?;

        if written != data.len() {
            debug!("Short write: {} of {} bytes", written, data.len());
        }

        Ok(written)
    }

    fn read(
        &mut self,
        max_len: usize,
        timeout: std::time::Duration,
    ) -> Result<Vec<u8>, TransportError> {
        let port = self.port_mut()?;

        let deadline = Instant::now() + timeout;
        let mut accumulated = Vec::with_capacity(max_len);
        let mut chunk = [0u8; 256];

        while accumulated.len() < max_len && Instant::now() < deadline {
            let want = (max_len - accumulated.len()).min(chunk.len());
            match port.read(&mut chunk[..want]) {
                Ok(0) => {}
                Ok(n) => accumulated.extend_from_slice(&chunk[..n]),
                // Poll timeout elapsed with nothing pending; keep waiting
                // until the overall deadline.
                Err(e) if e.kind() == std::io::ErrorKind::TimedOut => {}
                Err(e) => {
                    return Err(TransportError::io(
                        IoOperation::Read,
                        "Failed to read response",
                        e,
                    ));
                }
            }
        }

        Ok(accumulated)
    }

    fn flush(&mut self) -> Result<(), TransportError> {
        let port = self.port_mut()?;
        port.flush()
            .map_err(|e| TransportError::io(IoOperation::Flush, "Failed to flush port", e))?;
        Ok(())
    }

    fn kind(&self) -> TransportKind {
        TransportKind::Serial
    }

    fn connection_string(&self) -> String {
        self.config.port_info()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operations_fail_before_open() {
        let mut transport = SerialTransport::new(SerialConfig::default());
        assert!(!transport.is_open());

        match transport.write(&[0x01]) {
            Err(TransportError::NotOpen { transport }) => {
                assert!(transport.contains("/dev/ttyUSB0"));
            }
            other => panic!("Expected NotOpen, got {:?}", other.map(|_| ())),
        }

        assert!(matches!(
            transport.read(8, std::time::Duration::from_millis(10)),
            Err(TransportError::NotOpen { .. })
        ));
    }

    #[test]
    fn test_close_without_open_is_noop() {
        let mut transport = SerialTransport::new(SerialConfig::default());
        assert!(transport.close().is_ok());
    }

    #[test]
    fn test_descriptors() {
        let transport = SerialTransport::new(SerialConfig::default());
        assert_eq!(transport.kind(), TransportKind::Serial);
        assert_eq!(transport.connection_string(), "/dev/ttyUSB0@9600 8N1");
    }
}
