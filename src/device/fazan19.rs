//! Fazan-19 P5 driver: the device-facing surface of the stack.
//!
//! Translates between physical quantities and register exchanges through a
//! [`ModbusClient`]. Range policy (the configured tuning band, squelch level
//! limits) lives here, not in the codec; the codec only quantizes.

use std::fmt;

use time::OffsetDateTime;
use tracing::{info, warn};

use crate::client::ModbusClient;
use crate::config::DeviceConfig;
use crate::errors::RadioError;
use crate::transport::Transport;

use super::codec::{self, Alarm, KfCoefficient, ModeWord};
use super::registers;

/// Supported device protocols. A closed set: adding a device type means
/// adding a variant and its register map, not implementing a trait object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceType {
    Fazan19P5,
}

impl fmt::Display for DeviceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceType::Fazan19P5 => write!(f, "Fazan-19 P5"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlMode {
    Local,
    Remote,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkMode {
    Voice,
    Data,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineType {
    TwoWire,
    FourWire,
}

/// Snapshot of the transceiver state from one full register read.
#[derive(Debug, Clone)]
pub struct DeviceStatus {
    pub online: bool,
    pub frequency_mhz: f64,
    pub transmitting: bool,
    pub squelch_enabled: bool,
    pub control_mode: ControlMode,
    pub work_mode: WorkMode,
    pub line_type: LineType,
    pub power_level: u8,
    pub signal_level: u16,
    pub voltage_24v: f64,
    pub temperature: f64,
    pub operating_hours: u32,
    pub last_update: OffsetDateTime,
}

/// Fazan-19 P5 transceiver on one bus address.
pub struct Fazan19Device<T: Transport> {
    client: ModbusClient<T>,
    config: DeviceConfig,
}

impl<T: Transport> Fazan19Device<T> {
    pub fn new(transport: T, config: DeviceConfig) -> Self {
        let client = ModbusClient::with_response_timeout(transport, config.response_timeout);
        Self { client, config }
    }

    pub fn device_type(&self) -> DeviceType {
        DeviceType::Fazan19P5
    }

    pub fn address(&self) -> u8 {
        self.config.address
    }

    pub fn config(&self) -> &DeviceConfig {
        &self.config
    }

    pub fn open(&mut self) -> Result<(), RadioError> {
        self.client.transport_mut().open()?;
        info!(
            "Opened {} for {} (address {})",
            self.client.transport().connection_string(),
            self.device_type(),
            self.config.address
        );
        Ok(())
    }

    pub fn close(&mut self) -> Result<(), RadioError> {
        self.client.transport_mut().close()?;
        Ok(())
    }

    pub fn is_open(&self) -> bool {
        self.client.transport().is_open()
    }

    pub fn client_mut(&mut self) -> &mut ModbusClient<T> {
        &mut self.client
    }

    /// Reads the full register file and decodes it into a status snapshot.
    pub fn read_status(&mut self) -> Result<DeviceStatus, RadioError> {
        let address = self.config.address;
        let values = self.retried(|client| {
            client.read_holding_registers(address, 0, registers::TOTAL_REGISTERS)
        })?;

        let mode = ModeWord(values[registers::MOD_TR as usize]);

        // TODO: replace the flat 0.1 scale with the per-channel calibration
        // table from the manual once the ADC section is transcribed.
        let voltage_24v = values[registers::AD0 as usize] as f64 * 0.1;
        let temperature = values[registers::AD1 as usize] as f64 * 0.1;

        Ok(DeviceStatus {
            online: true,
            frequency_mhz: codec::decode_frequency(values[registers::FR_RS as usize]),
            transmitting: mode.tx(),
            squelch_enabled: mode.squelch(),
            control_mode: if mode.remote() {
                ControlMode::Remote
            } else {
                ControlMode::Local
            },
            work_mode: if mode.data_mode() {
                WorkMode::Data
            } else {
                WorkMode::Voice
            },
            line_type: if mode.four_wire() {
                LineType::FourWire
            } else {
                LineType::TwoWire
            },
            power_level: mode.power_level(),
            signal_level: values[registers::AD2 as usize],
            voltage_24v,
            temperature,
            operating_hours: codec::decode_operating_hours(
                &values[..2],
                self.config.hours_encoding,
            ),
            last_update: OffsetDateTime::now_utc(),
        })
    }

    /// Reads the four diagnostic registers and decodes the active alarms.
    pub fn read_alarms(&mut self) -> Result<Vec<Alarm>, RadioError> {
        let address = self.config.address;
        let values = self
            .retried(|client| client.read_holding_registers(address, registers::DV1, 4))?;

        let dv = [values[0], values[1], values[2], values[3]];
        Ok(codec::decode_diagnostics(&dv))
    }

    /// Tunes the transceiver. The frequency must lie inside the configured
    /// band; encoding quantizes it to the 8.33 kHz grid.
    pub fn set_frequency(&mut self, freq_mhz: f64) -> Result<(), RadioError> {
        if freq_mhz < self.config.freq_min_mhz || freq_mhz > self.config.freq_max_mhz {
            return Err(RadioError::validation(format!(
                "Frequency {:.3} MHz outside configured band {:.3}-{:.3} MHz",
                freq_mhz, self.config.freq_min_mhz, self.config.freq_max_mhz
            )));
        }

        let register = codec::encode_frequency(freq_mhz, KfCoefficient::Step8_33);
        let address = self.config.address;
        self.retried(|client| {
            client.write_single_register(address, registers::FR_RS, register)
        })?;

        info!(
            "Set frequency to {:.3} MHz (register 0x{:04X})",
            freq_mhz, register
        );
        Ok(())
    }

    /// Reads back the currently tuned frequency in MHz.
    pub fn get_frequency(&mut self) -> Result<f64, RadioError> {
        let address = self.config.address;
        let values =
            self.retried(|client| client.read_holding_registers(address, registers::FR_RS, 1))?;
        Ok(codec::decode_frequency(values[0]))
    }

    /// Enables or disables the noise suppressor.
    ///
    /// `level` (0-15) is validated and logged; the canonical register map
    /// has no squelch-level register, so only the enable bit reaches the
    /// device.
    pub fn set_squelch(&mut self, enabled: bool, level: u8) -> Result<(), RadioError> {
        if level > 15 {
            return Err(RadioError::validation(format!(
                "Squelch level {} outside valid range 0-15",
                level
            )));
        }

        self.update_mode(|mode| mode.set_squelch(enabled))?;
        info!(
            "Set squelch {} (level {})",
            if enabled { "on" } else { "off" },
            level
        );
        Ok(())
    }

    /// Keys or releases the transmitter (PTT).
    pub fn set_ptt(&mut self, enabled: bool) -> Result<(), RadioError> {
        self.update_mode(|mode| mode.set_tx(enabled))?;
        info!("Set PTT {}", if enabled { "on" } else { "off" });
        Ok(())
    }

    /// Reads the device identification string.
    pub fn read_device_id(&mut self) -> Result<String, RadioError> {
        let address = self.config.address;
        self.retried(|client| client.read_device_id(address))
    }

    /// Read-modify-write on the mode register. Safe against partial state
    /// since every flag owns a distinct bit.
    fn update_mode(&mut self, mutate: impl Fn(&mut ModeWord)) -> Result<(), RadioError> {
        let address = self.config.address;

        let values =
            self.retried(|client| client.read_holding_registers(address, registers::MOD_TR, 1))?;
        let mut mode = ModeWord(values[0]);
        mutate(&mut mode);

        self.retried(|client| {
            client.write_single_register(address, registers::MOD_TR, mode.raw())
        })
    }

    /// Runs one exchange up to `retry_count + 1` times. Device exceptions
    /// and validation failures are final; only transport and frame failures
    /// are worth repeating.
    fn retried<R>(
        &mut self,
        mut op: impl FnMut(&mut ModbusClient<T>) -> Result<R, RadioError>,
    ) -> Result<R, RadioError> {
        let attempts = self.config.retry_count as u32 + 1;
        let mut last_err = None;

        for attempt in 1..=attempts {
            match op(&mut self.client) {
                Ok(result) => return Ok(result),
                Err(err) if err.is_device_exception() => return Err(err),
                Err(err @ RadioError::Validation(_)) => return Err(err),
                Err(err) => {
                    warn!(
                        "Exchange attempt {}/{} failed: {}",
                        attempt, attempts, err
                    );
                    last_err = Some(err);
                }
            }
        }

        Err(last_err.unwrap_or_else(|| RadioError::validation("No attempts were made")))
    }
}
