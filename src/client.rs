//! Modbus RTU request/response client.
//!
//! Builds request frames, drives a [`Transport`], and validates responses:
//! every frame is CRC-checked before a single payload byte is trusted, and
//! exception responses (function byte ORed with 0x80) surface as
//! [`RadioError::Protocol`] so callers can tell "device rejected it" from
//! "device never answered".
//!
//! The client never retries; retry policy belongs to the caller.

use std::time::Duration;

use tracing::{debug, trace, warn};

use crate::crc16;
use crate::errors::{FrameError, RadioError, TransportError};
use crate::transport::Transport;

pub const FUNC_READ_HOLDING: u8 = 0x03;
pub const FUNC_WRITE_SINGLE: u8 = 0x06;
pub const FUNC_WRITE_MULTIPLE: u8 = 0x10;
pub const FUNC_DEVICE_ID: u8 = 0x11;

/// Default response deadline per the device manual's timing table.
pub const DEFAULT_RESPONSE_TIMEOUT: Duration = Duration::from_millis(2000);

/// RS-485 turnaround pause after each write, before listening for the
/// response. 5 ms covers 3.5 character times at 9600 baud.
pub const INTER_FRAME_DELAY: Duration = Duration::from_millis(5);

/// Exception responses are always 5 bytes: addr, func|0x80, code, CRC.
const EXCEPTION_FRAME_LEN: usize = 5;

pub struct ModbusClient<T: Transport> {
    transport: T,
    response_timeout: Duration,
}

impl<T: Transport> ModbusClient<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            response_timeout: DEFAULT_RESPONSE_TIMEOUT,
        }
    }

    pub fn with_response_timeout(transport: T, response_timeout: Duration) -> Self {
        Self {
            transport,
            response_timeout,
        }
    }

    pub fn set_response_timeout(&mut self, timeout: Duration) {
        self.response_timeout = timeout;
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn into_transport(self) -> T {
        self.transport
    }

    /// Reads `count` holding registers starting at `start` (function 0x03).
    pub fn read_holding_registers(
        &mut self,
        address: u8,
        start: u16,
        count: u16,
    ) -> Result<Vec<u16>, RadioError> {
        let mut request = vec![
            address,
            FUNC_READ_HOLDING,
            (start >> 8) as u8,
            (start & 0xFF) as u8,
            (count >> 8) as u8,
            (count & 0xFF) as u8,
        ];
        crc16::append(&mut request);

        // addr + func + byte count + data + CRC
        let expected_len = 3 + count as usize * 2 + 2;
        let response = self.exchange(address, FUNC_READ_HOLDING, &request, expected_len)?;

        let byte_count = response[2] as usize;
        if byte_count != count as usize * 2 {
            return Err(FrameError::unexpected(
                format!(
                    "Byte count {} does not match requested {} registers",
                    byte_count, count
                ),
                Some(response),
            )
            .into());
        }

        let values = response[3..3 + byte_count]
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();

        Ok(values)
    }

    /// Writes one holding register (function 0x06). The device echoes the
    /// request back on success.
    pub fn write_single_register(
        &mut self,
        address: u8,
        register: u16,
        value: u16,
    ) -> Result<(), RadioError> {
        let mut request = vec![
            address,
            FUNC_WRITE_SINGLE,
            (register >> 8) as u8,
            (register & 0xFF) as u8,
            (value >> 8) as u8,
            (value & 0xFF) as u8,
        ];
        crc16::append(&mut request);

        self.exchange(address, FUNC_WRITE_SINGLE, &request, 8)?;
        Ok(())
    }

    /// Writes a contiguous register range (function 0x10).
    pub fn write_multiple_registers(
        &mut self,
        address: u8,
        start: u16,
        values: &[u16],
    ) -> Result<(), RadioError> {
        if values.is_empty() || values.len() > 123 {
            return Err(RadioError::validation(format!(
                "Register count {} outside valid range 1-123",
                values.len()
            )));
        }

        let count = values.len() as u16;
        let byte_count = (count * 2) as u8;

        let mut request = vec![
            address,
            FUNC_WRITE_MULTIPLE,
            (start >> 8) as u8,
            (start & 0xFF) as u8,
            (count >> 8) as u8,
            (count & 0xFF) as u8,
            byte_count,
        ];
        for value in values {
            request.extend_from_slice(&value.to_be_bytes());
        }
        crc16::append(&mut request);

        // Acknowledgment: addr + func + start + count + CRC
        self.exchange(address, FUNC_WRITE_MULTIPLE, &request, 8)?;
        Ok(())
    }

    /// Reads the device identification string (function 0x11).
    ///
    /// The response is variable-length (`[addr, 0x11, len, ascii.., CRC]`),
    /// so the header is read first and the string length taken from it.
    pub fn read_device_id(&mut self, address: u8) -> Result<String, RadioError> {
        // Two zero padding bytes keep the request at the 6-byte bus minimum.
        let mut request = vec![address, FUNC_DEVICE_ID, 0x00, 0x00];
        crc16::append(&mut request);

        self.send_request(&request)?;

        let header = self.transport.read(3, self.response_timeout)?;
        if header.is_empty() {
            return Err(TransportError::NoResponse {
                limit: self.response_timeout,
            }
            .into());
        }
        if header.len() < 3 {
            return Err(
                FrameError::too_short("Response header incomplete", Some(header)).into(),
            );
        }

        if header[1] & 0x80 != 0 {
            let mut frame = header;
            frame.extend(self.transport.read(2, self.response_timeout)?);
            return Err(self.decode_exception(address, frame));
        }

        let id_len = header[2] as usize;
        let mut frame = header;
        let tail = self.transport.read(id_len + 2, self.response_timeout)?;
        frame.extend_from_slice(&tail);

        if frame.len() < 3 + id_len + 2 {
            return Err(FrameError::too_short(
                format!("Got {} bytes, expected {}", frame.len(), 3 + id_len + 2),
                Some(frame),
            )
            .into());
        }

        self.check_crc(&frame)?;

        Ok(String::from_utf8_lossy(&frame[3..3 + id_len]).into_owned())
    }

    /// One request/response cycle with a fixed-length expected response.
    fn exchange(
        &mut self,
        address: u8,
        function: u8,
        request: &[u8],
        expected_len: usize,
    ) -> Result<Vec<u8>, RadioError> {
        self.send_request(request)?;

        let response = self.transport.read(expected_len, self.response_timeout)?;

        trace!("RX: {} bytes: {:02X?}", response.len(), response);

        if response.is_empty() {
            warn!(
                "No response from address {} within {:?}",
                address, self.response_timeout
            );
            return Err(TransportError::NoResponse {
                limit: self.response_timeout,
            }
            .into());
        }

        // An exception response is shorter than the expected frame, so it
        // must be recognized before the length check.
        if response.len() >= EXCEPTION_FRAME_LEN
            && response[1] == function | 0x80
            && crc16::verify(&response[..EXCEPTION_FRAME_LEN])
        {
            return Err(self.decode_exception(address, response));
        }

        if response.len() < expected_len {
            return Err(FrameError::too_short(
                format!("Got {} bytes, expected {}", response.len(), expected_len),
                Some(response),
            )
            .into());
        }

        self.check_crc(&response)?;

        if response[0] != address || response[1] != function {
            return Err(FrameError::unexpected(
                format!(
                    "Reply from address {} function 0x{:02X}, expected address {} function 0x{:02X}",
                    response[0], response[1], address, function
                ),
                Some(response),
            )
            .into());
        }

        Ok(response)
    }

    fn send_request(&mut self, request: &[u8]) -> Result<(), RadioError> {
        if !self.transport.is_open() {
            return Err(TransportError::not_open(self.transport.connection_string()).into());
        }

        trace!("TX: {} bytes: {:02X?}", request.len(), request);

        let written = self.transport.write(request)?;
        if written != request.len() {
            return Err(TransportError::io(
                crate::errors::IoOperation::Write,
                format!("Short write: {} of {} bytes", written, request.len()),
                std::io::Error::new(std::io::ErrorKind::WriteZero, "incomplete write"),
            )
            .into());
        }
        self.transport.flush()?;

        // RS-485 turnaround: give the device bus silence before listening.
        std::thread::sleep(INTER_FRAME_DELAY);

        Ok(())
    }

    fn check_crc(&self, frame: &[u8]) -> Result<(), RadioError> {
        if !crc16::verify(frame) {
            let calculated = crc16::calculate(&frame[..frame.len() - 2]);
            let received = u16::from_le_bytes([frame[frame.len() - 2], frame[frame.len() - 1]]);
            warn!(
                "CRC mismatch: calculated {:04X}, received {:04X}",
                calculated, received
            );
            return Err(FrameError::crc(calculated, received, frame).into());
        }
        Ok(())
    }

    fn decode_exception(&self, address: u8, frame: Vec<u8>) -> RadioError {
        if frame.len() < EXCEPTION_FRAME_LEN || !crc16::verify(&frame[..EXCEPTION_FRAME_LEN]) {
            return FrameError::unexpected("Malformed exception response", Some(frame)).into();
        }
        let code = frame[2];
        debug!("Device {} replied with exception 0x{:02X}", address, code);
        RadioError::exception(address, code)
    }
}
