use std::io::{Read, Write};
use std::net::{Shutdown, TcpStream, ToSocketAddrs};
use std::time::Instant;

use tracing::info;

use crate::config::TcpConfig;
use crate::errors::{IoOperation, TransportError};

use super::{Transport, TransportKind, POLL_INTERVAL};

/// Network-tunneled serial link through a TCP-to-serial bridge.
pub struct TcpTransport {
    config: TcpConfig,
    stream: Option<TcpStream>,
}

impl TcpTransport {
    pub fn new(config: TcpConfig) -> Self {
        Self {
            config,
            stream: None,
        }
    }

    fn stream_mut(&mut self) -> Result<&mut TcpStream, TransportError> {
        let endpoint = self.config.endpoint();
        self.stream
            .as_mut()
            .ok_or_else(|| TransportError::not_open(format!("tcp {}", endpoint)))
    }
}

impl Transport for TcpTransport {
    fn open(&mut self) -> Result<(), TransportError> {
        if self.stream.is_some() {
            return Ok(());
        }

        let endpoint = self.config.endpoint();
        info!("Connecting to serial bridge {}", endpoint);

        let addr = endpoint
            .to_socket_addrs()
            .map_err(|e| {
                TransportError::io(IoOperation::Connect, format!("Resolving {}", endpoint), e)
            })?
            .next()
            .ok_or_else(|| {
                TransportError::io(
                    IoOperation::Connect,
                    format!("Resolving {}", endpoint),
                    std::io::Error::new(std::io::ErrorKind::NotFound, "No address resolved"),
                )
            })?;

        let started = Instant::now();
        let stream =
            TcpStream::connect_timeout(&addr, self.config.connect_timeout).map_err(|e| {
                if e.kind() == std::io::ErrorKind::TimedOut {
                    TransportError::ConnectTimeout {
                        elapsed: started.elapsed(),
                        limit: self.config.connect_timeout,
                    }
                } else {
                    TransportError::io(
                        IoOperation::Connect,
                        format!("Connecting to {}", endpoint),
                        e,
                    )
                }
            })?;

        stream.set_nodelay(true).map_err(|e| {
            TransportError::io(IoOperation::Configure, "Setting TCP_NODELAY", e)
        })?;
        // Short poll timeout; the overall deadline is enforced in read()
        stream.set_read_timeout(Some(POLL_INTERVAL)).map_err(|e| {
            TransportError::io(IoOperation::Configure, "Setting read timeout", e)
        })?;

        self.stream = Some(stream);
        Ok(())
    }

    fn close(&mut self) -> Result<(), TransportError> {
        if let Some(stream) = self.stream.take() {
            // A bridge that already dropped the link makes shutdown fail
            // with NotConnected; that is not worth surfacing.
            match stream.shutdown(Shutdown::Both) {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotConnected => {}
                Err(e) => {
                    return Err(TransportError::io(
                        IoOperation::Control,
                        "Failed to shut down connection",
                        e,
                    ));
                }
            }
            info!("Disconnected from {}", self.config.endpoint());
        }
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.stream.is_some()
    }

    fn write(&mut self, data: &[u8]) -> Result<usize, TransportError> {
        let stream = self.stream_mut()?;
        stream
            .write(data)
            .map_err(|e| TransportError::io(IoOperation::Write, "Failed to write request", e))
    }

    fn read(
        &mut self,
        max_len: usize,
        timeout: std::time::Duration,
    ) -> Result<Vec<u8>, TransportError> {
        let stream = self.stream_mut()?;

        let deadline = Instant::now() + timeout;
        let mut accumulated = Vec::with_capacity(max_len);
        let mut chunk = [0u8; 256];

        while accumulated.len() < max_len && Instant::now() < deadline {
            let want = (max_len - accumulated.len()).min(chunk.len());
            match stream.read(&mut chunk[..want]) {
                // Peer closed the connection; return what we have.
                Ok(0) => break,
                Ok(n) => accumulated.extend_from_slice(&chunk[..n]),
                Err(e)
                    if e.kind() == std::io::ErrorKind::TimedOut
                        || e.kind() == std::io::ErrorKind::WouldBlock => {}
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
        let stream = self.stream_mut()?;
        stream
            .flush()
            .map_err(|e| TransportError::io(IoOperation::Flush, "Failed to flush stream", e))
    }

    fn kind(&self) -> TransportKind {
        TransportKind::Tcp
    }

    fn connection_string(&self) -> String {
        self.config.endpoint()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_operations_fail_before_open() {
        let mut transport = TcpTransport::new(TcpConfig::default());
        assert!(!transport.is_open());
        assert!(matches!(
            transport.write(&[0x01]),
            Err(TransportError::NotOpen { .. })
        ));
        assert!(matches!(
            transport.read(8, Duration::from_millis(10)),
            Err(TransportError::NotOpen { .. })
        ));
        assert!(transport.close().is_ok());
    }

    #[test]
    fn test_round_trip_against_local_listener() {
        use std::net::TcpListener;

        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();

        let echo = std::thread::spawn(move || {
            let (mut socket, _) = listener.accept().unwrap();
            let mut buf = [0u8; 16];
            let n = socket.read(&mut buf).unwrap();
            socket.write_all(&buf[..n]).unwrap();
        });

        let mut transport = TcpTransport::new(TcpConfig {
            host: "127.0.0.1".to_string(),
            port,
            ..Default::default()
        });

        transport.open().unwrap();
        assert!(transport.is_open());
        assert_eq!(transport.kind(), TransportKind::Tcp);

        let frame = [0x01, 0x03, 0x00, 0x00, 0x00, 0x01, 0x84, 0x0A];
        assert_eq!(transport.write(&frame).unwrap(), frame.len());

        let response = transport
            .read(frame.len(), Duration::from_secs(1))
            .unwrap();
        assert_eq!(response, frame);

        transport.close().unwrap();
        assert!(!transport.is_open());
        echo.join().unwrap();
    }

    #[test]
    fn test_read_returns_partial_data_on_timeout() {
        use std::net::TcpListener;

        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();

        let partial = std::thread::spawn(move || {
            let (mut socket, _) = listener.accept().unwrap();
            socket.write_all(&[0xAA, 0xBB]).unwrap();
            // Keep the socket open so the reader has to wait out its deadline
            std::thread::sleep(Duration::from_millis(300));
        });

        let mut transport = TcpTransport::new(TcpConfig {
            host: "127.0.0.1".to_string(),
            port,
            ..Default::default()
        });
        transport.open().unwrap();

        let got = transport.read(8, Duration::from_millis(100)).unwrap();
        assert_eq!(got, vec![0xAA, 0xBB]);

        transport.close().unwrap();
        partial.join().unwrap();
    }
}
