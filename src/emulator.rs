//! In-process Fazan-19 P5 emulator.
//!
//! Answers raw request frames the way the real transceiver does on the
//! RS-485 bus, including the silences: an offline device, a wrong slave
//! address, a runt frame or a bad CRC all produce no reply at all, and the
//! caller sees a timeout. Used by the test suites and by the `Loopback`
//! transport for soak runs without hardware.

use std::time::Duration;

use crate::crc16;
use crate::device::registers::{self, mode};
use crate::device::{encode_frequency, KfCoefficient};
use crate::errors::TransportError;
use crate::transport::{Transport, TransportKind};

const DEVICE_ID: &str = "Fazan-19 P5 EMU";

/// Shortest frame the device electronics will clock in off the wire.
const MIN_REQUEST_LEN: usize = 6;

/// Callback observing each (request, response) exchange.
pub type ExchangeObserver = Box<dyn FnMut(&[u8], &[u8]) + Send>;

/// Register-level model of one Fazan-19 P5 on the bus.
pub struct Fazan19Emulator {
    address: u8,
    online: bool,
    registers: [u16; registers::TOTAL_REGISTERS as usize],
    response_delay: Option<Duration>,
    observer: Option<ExchangeObserver>,
}

impl Fazan19Emulator {
    /// Creates an emulator in its power-on state: tuned to the 121.5 MHz
    /// emergency channel, 1234 operating hours, nominal ADC readings and
    /// remote control enabled.
    pub fn new(address: u8) -> Self {
        let mut emulator = Self {
            address,
            online: true,
            registers: [0; registers::TOTAL_REGISTERS as usize],
            response_delay: None,
            observer: None,
        };

        emulator.set_frequency(121.5);
        emulator.set_operating_hours(1234);
        emulator.set_register(registers::AD0, 240);
        emulator.set_register(registers::AD1, 250);
        emulator.set_register(registers::AD2, 50);
        emulator.set_remote_mode(true);
        emulator
    }

    pub fn address(&self) -> u8 {
        self.address
    }

    pub fn set_online(&mut self, online: bool) {
        self.online = online;
    }

    pub fn is_online(&self) -> bool {
        self.online
    }

    pub fn register(&self, address: u16) -> u16 {
        self.registers
            .get(address as usize)
            .copied()
            .unwrap_or(0)
    }

    pub fn set_register(&mut self, address: u16, value: u16) {
        if let Some(slot) = self.registers.get_mut(address as usize) {
            *slot = value;
        }
    }

    pub fn set_frequency(&mut self, freq_mhz: f64) {
        let value = encode_frequency(freq_mhz, KfCoefficient::Step8_33);
        self.set_register(registers::FR_RS, value);
    }

    /// Sets the hours counter, saturating at the 16-bit register limit.
    pub fn set_operating_hours(&mut self, hours: u32) {
        self.set_register(registers::COUNT_WORK, hours.min(u16::MAX as u32) as u16);
    }

    pub fn set_errors(&mut self, dv1: u16, dv2: u16, dv3: u16, dv4: u16) {
        self.set_register(registers::DV1, dv1);
        self.set_register(registers::DV2, dv2);
        self.set_register(registers::DV3, dv3);
        self.set_register(registers::DV4, dv4);
    }

    pub fn clear_errors(&mut self) {
        self.set_errors(0, 0, 0, 0);
    }

    pub fn set_remote_mode(&mut self, remote: bool) {
        self.set_mode_bit(mode::REMOTE, remote);
    }

    pub fn set_transmitting(&mut self, on: bool) {
        self.set_mode_bit(mode::TX, on);
    }

    pub fn set_squelch_open(&mut self, on: bool) {
        self.set_mode_bit(mode::SQUELCH, on);
    }

    /// Artificial turnaround latency applied by the loopback transport.
    pub fn set_response_delay(&mut self, delay: Duration) {
        self.response_delay = Some(delay);
    }

    pub fn response_delay(&self) -> Option<Duration> {
        self.response_delay
    }

    pub fn set_observer(&mut self, observer: ExchangeObserver) {
        self.observer = Some(observer);
    }

    fn set_mode_bit(&mut self, bit: u16, on: bool) {
        let mut value = self.register(registers::MOD_TR);
        if on {
            value |= bit;
        } else {
            value &= !bit;
        }
        self.set_register(registers::MOD_TR, value);
    }

    /// Processes one request frame. `None` means bus silence: the device is
    /// offline, the frame is shorter than the hardware minimum, it is
    /// addressed to a different slave, or its CRC does not check out.
    pub fn process_request(&mut self, frame: &[u8]) -> Option<Vec<u8>> {
        if !self.online || frame.len() < MIN_REQUEST_LEN {
            return None;
        }
        if frame[0] != self.address || !crc16::verify(frame) {
            return None;
        }

        let function = frame[1];
        let payload = &frame[2..frame.len() - 2];

        let response = match function {
            0x03 => self.handle_read_holding(payload),
            0x06 => self.handle_write_single(payload),
            0x10 => self.handle_write_multiple(payload),
            0x11 => self.handle_device_id(),
            _ => Err(0x01),
        };

        let frame_out = match response {
            Ok(body) => self.seal(function, body),
            Err(code) => self.seal(function | 0x80, vec![code]),
        };

        if let Some(observer) = self.observer.as_mut() {
            observer(frame, &frame_out);
        }
        Some(frame_out)
    }

    fn handle_read_holding(&self, payload: &[u8]) -> Result<Vec<u8>, u8> {
        if payload.len() != 4 {
            return Err(0x03);
        }
        let start = u16::from_be_bytes([payload[0], payload[1]]);
        let count = u16::from_be_bytes([payload[2], payload[3]]);

        if count == 0 || count > 125 {
            return Err(0x03);
        }
        if start.checked_add(count).map_or(true, |end| end > registers::TOTAL_REGISTERS) {
            return Err(0x02);
        }

        let mut body = Vec::with_capacity(1 + count as usize * 2);
        body.push((count * 2) as u8);
        for reg in start..start + count {
            body.extend_from_slice(&self.register(reg).to_be_bytes());
        }
        Ok(body)
    }

    fn handle_write_single(&mut self, payload: &[u8]) -> Result<Vec<u8>, u8> {
        if payload.len() != 4 {
            return Err(0x03);
        }
        let register = u16::from_be_bytes([payload[0], payload[1]]);
        let value = u16::from_be_bytes([payload[2], payload[3]]);

        if register >= registers::TOTAL_REGISTERS {
            return Err(0x02);
        }

        self.set_register(register, value);
        // 0x06 echoes the request body back
        Ok(payload.to_vec())
    }

    fn handle_write_multiple(&mut self, payload: &[u8]) -> Result<Vec<u8>, u8> {
        if payload.len() < 5 {
            return Err(0x03);
        }
        let start = u16::from_be_bytes([payload[0], payload[1]]);
        let count = u16::from_be_bytes([payload[2], payload[3]]);
        let byte_count = payload[4] as usize;

        if count == 0 || count > 123 || byte_count != count as usize * 2 {
            return Err(0x03);
        }
        if payload.len() != 5 + byte_count {
            return Err(0x03);
        }
        if start.checked_add(count).map_or(true, |end| end > registers::TOTAL_REGISTERS) {
            return Err(0x02);
        }

        for (i, chunk) in payload[5..].chunks_exact(2).enumerate() {
            self.set_register(start + i as u16, u16::from_be_bytes([chunk[0], chunk[1]]));
        }

        Ok(payload[..4].to_vec())
    }

    fn handle_device_id(&self) -> Result<Vec<u8>, u8> {
        let id = DEVICE_ID.as_bytes();
        let mut body = Vec::with_capacity(1 + id.len());
        body.push(id.len() as u8);
        body.extend_from_slice(id);
        Ok(body)
    }

    fn seal(&self, function: u8, body: Vec<u8>) -> Vec<u8> {
        let mut frame = Vec::with_capacity(2 + body.len() + 2);
        frame.push(self.address);
        frame.push(function);
        frame.extend_from_slice(&body);
        crc16::append(&mut frame);
        frame
    }
}

/// In-memory transport wired straight to a [`Fazan19Emulator`].
pub struct LoopbackTransport {
    emulator: Fazan19Emulator,
    open: bool,
    pending: Vec<u8>,
    // Turnaround latency still owed before pending bytes become readable
    delay_left: Duration,
    corrupt_next: bool,
    request_count: u32,
}

impl LoopbackTransport {
    pub fn new(emulator: Fazan19Emulator) -> Self {
        Self {
            emulator,
            open: false,
            pending: Vec::new(),
            delay_left: Duration::ZERO,
            corrupt_next: false,
            request_count: 0,
        }
    }

    pub fn emulator(&self) -> &Fazan19Emulator {
        &self.emulator
    }

    pub fn emulator_mut(&mut self) -> &mut Fazan19Emulator {
        &mut self.emulator
    }

    /// Flips the last byte of the next response, breaking its CRC.
    pub fn corrupt_next_response(&mut self) {
        self.corrupt_next = true;
    }

    /// Number of requests that reached the emulator since open.
    pub fn request_count(&self) -> u32 {
        self.request_count
    }
}

impl Transport for LoopbackTransport {
    fn open(&mut self) -> Result<(), TransportError> {
        self.open = true;
        self.pending.clear();
        self.request_count = 0;
        Ok(())
    }

    fn close(&mut self) -> Result<(), TransportError> {
        self.open = false;
        self.pending.clear();
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.open
    }

    fn write(&mut self, data: &[u8]) -> Result<usize, TransportError> {
        if !self.open {
            return Err(TransportError::not_open(self.connection_string()));
        }

        // A new request claims the bus; leftovers from an exchange the
        // reader abandoned must not surface as this request's response.
        self.pending.clear();
        self.delay_left = Duration::ZERO;

        self.request_count += 1;
        if let Some(mut response) = self.emulator.process_request(data) {
            if self.corrupt_next {
                if let Some(last) = response.last_mut() {
                    *last ^= 0xFF;
                }
                self.corrupt_next = false;
            }
            self.pending = response;
            self.delay_left = self.emulator.response_delay.unwrap_or(Duration::ZERO);
        }
        Ok(data.len())
    }

    fn read(&mut self, max_len: usize, timeout: Duration) -> Result<Vec<u8>, TransportError> {
        if !self.open {
            return Err(TransportError::not_open(self.connection_string()));
        }

        if self.pending.is_empty() {
            // Bus silence: burn the timeout like a real poll loop would
            std::thread::sleep(timeout);
            return Ok(Vec::new());
        }

        // A device slower than the reader's deadline looks exactly like a
        // silent one; whatever delay remains carries over to the next read.
        if self.delay_left >= timeout {
            std::thread::sleep(timeout);
            self.delay_left -= timeout;
            return Ok(Vec::new());
        }
        if !self.delay_left.is_zero() {
            std::thread::sleep(self.delay_left);
            self.delay_left = Duration::ZERO;
        }

        let take = max_len.min(self.pending.len());
        Ok(self.pending.drain(..take).collect())
    }

    fn flush(&mut self) -> Result<(), TransportError> {
        Ok(())
    }

    fn kind(&self) -> TransportKind {
        TransportKind::Loopback
    }

    fn connection_string(&self) -> String {
        format!("loopback:{}", self.emulator.address)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::registers;

    fn request(address: u8, function: u8, payload: &[u8]) -> Vec<u8> {
        let mut frame = vec![address, function];
        frame.extend_from_slice(payload);
        crc16::append(&mut frame);
        frame
    }

    #[test]
    fn test_silent_when_offline() {
        let mut emulator = Fazan19Emulator::new(1);
        emulator.set_online(false);
        let frame = request(1, 0x03, &[0, 0, 0, 1]);
        assert_eq!(emulator.process_request(&frame), None);
    }

    #[test]
    fn test_silent_on_short_frame() {
        let mut emulator = Fazan19Emulator::new(1);
        let mut frame = vec![1, 0x11];
        crc16::append(&mut frame);
        assert_eq!(frame.len(), 4);
        assert_eq!(emulator.process_request(&frame), None);
    }

    #[test]
    fn test_silent_on_address_mismatch() {
        let mut emulator = Fazan19Emulator::new(5);
        let frame = request(1, 0x03, &[0, 0, 0, 1]);
        assert_eq!(emulator.process_request(&frame), None);
    }

    #[test]
    fn test_silent_on_bad_crc() {
        let mut emulator = Fazan19Emulator::new(1);
        let mut frame = request(1, 0x03, &[0, 0, 0, 1]);
        let last = frame.len() - 1;
        frame[last] ^= 0xFF;
        assert_eq!(emulator.process_request(&frame), None);
    }

    #[test]
    fn test_read_holding_response_layout() {
        let mut emulator = Fazan19Emulator::new(1);
        emulator.set_register(registers::PKM, 0xABCD);
        let frame = request(1, 0x03, &[0x00, 0x04, 0x00, 0x01]);

        let response = emulator.process_request(&frame).unwrap();
        assert!(crc16::verify(&response));
        assert_eq!(&response[..5], &[0x01, 0x03, 0x02, 0xAB, 0xCD]);
    }

    #[test]
    fn test_write_single_echoes_request() {
        let mut emulator = Fazan19Emulator::new(1);
        let frame = request(1, 0x06, &[0x00, 0x04, 0x12, 0x34]);

        let response = emulator.process_request(&frame).unwrap();
        assert_eq!(response, frame);
        assert_eq!(emulator.register(registers::PKM), 0x1234);
    }

    #[test]
    fn test_write_multiple_and_confirmation() {
        let mut emulator = Fazan19Emulator::new(1);
        let frame = request(
            1,
            0x10,
            &[0x00, 0x10, 0x00, 0x02, 0x04, 0x00, 0xF0, 0x00, 0xFA],
        );

        let response = emulator.process_request(&frame).unwrap();
        assert!(crc16::verify(&response));
        assert_eq!(&response[..6], &[0x01, 0x10, 0x00, 0x10, 0x00, 0x02]);
        assert_eq!(emulator.register(registers::AD0), 0x00F0);
        assert_eq!(emulator.register(registers::AD1), 0x00FA);
    }

    #[test]
    fn test_device_id_payload() {
        let mut emulator = Fazan19Emulator::new(1);
        let frame = request(1, 0x11, &[0x00, 0x00]);

        let response = emulator.process_request(&frame).unwrap();
        assert_eq!(response[2] as usize, DEVICE_ID.len());
        let text = &response[3..3 + DEVICE_ID.len()];
        assert_eq!(text, DEVICE_ID.as_bytes());
    }

    #[test]
    fn test_unknown_function_yields_illegal_function() {
        let mut emulator = Fazan19Emulator::new(1);
        let frame = request(1, 0x2B, &[0x00, 0x00]);

        let response = emulator.process_request(&frame).unwrap();
        assert_eq!(response[1], 0x2B | 0x80);
        assert_eq!(response[2], 0x01);
        assert!(crc16::verify(&response));
    }

    #[test]
    fn test_out_of_range_read_yields_illegal_address() {
        let mut emulator = Fazan19Emulator::new(1);
        let frame = request(1, 0x03, &[0x00, 0x1A, 0x00, 0x04]);

        let response = emulator.process_request(&frame).unwrap();
        assert_eq!(response[1], 0x83);
        assert_eq!(response[2], 0x02);
    }

    #[test]
    fn test_zero_count_read_yields_illegal_value() {
        let mut emulator = Fazan19Emulator::new(1);
        let frame = request(1, 0x03, &[0x00, 0x00, 0x00, 0x00]);

        let response = emulator.process_request(&frame).unwrap();
        assert_eq!(response[2], 0x03);
    }

    #[test]
    fn test_oversized_count_read_yields_illegal_value() {
        let mut emulator = Fazan19Emulator::new(1);
        let frame = request(1, 0x03, &[0x00, 0x00, 0x00, 126]);

        let response = emulator.process_request(&frame).unwrap();
        assert_eq!(response[1], 0x83);
        assert_eq!(response[2], 0x03);
        assert!(crc16::verify(&response));
    }

    #[test]
    fn test_operating_hours_saturate() {
        let mut emulator = Fazan19Emulator::new(1);
        emulator.set_operating_hours(1_000_000);
        assert_eq!(emulator.register(registers::COUNT_WORK), 0xFFFF);
    }

    #[test]
    fn test_power_on_defaults() {
        let emulator = Fazan19Emulator::new(1);
        assert_eq!(emulator.register(registers::COUNT_WORK), 1234);
        assert_eq!(emulator.register(registers::AD0), 240);
        assert_eq!(emulator.register(registers::AD1), 250);
        assert_eq!(emulator.register(registers::AD2), 50);
        assert_ne!(emulator.register(registers::MOD_TR) & mode::REMOTE, 0);

        let freq = crate::device::decode_frequency(emulator.register(registers::FR_RS));
        assert!((freq - 121.5).abs() < 0.005);
    }

    #[test]
    fn test_observer_sees_both_frames() {
        use std::sync::atomic::{AtomicU32, Ordering};
        use std::sync::Arc;

        let count = Arc::new(AtomicU32::new(0));
        let seen = Arc::clone(&count);

        let mut emulator = Fazan19Emulator::new(1);
        emulator.set_observer(Box::new(move |req, resp| {
            assert_eq!(req[0], 1);
            assert_eq!(resp[0], 1);
            seen.fetch_add(1, Ordering::SeqCst);
        }));

        let frame = request(1, 0x03, &[0, 0, 0, 1]);
        emulator.process_request(&frame).unwrap();
        // Silent drops do not reach the observer
        let misaddressed = request(9, 0x03, &[0, 0, 0, 1]);
        assert!(emulator.process_request(&misaddressed).is_none());

        assert_eq!(count.load(Ordering::SeqCst), 1);
    }
}
