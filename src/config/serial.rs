use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::errors::ConfigError;

use super::{DataBits, Parity, StopBits};

/// Serial adapter settings for a directly attached RS-485 converter.
///
/// Defaults follow the device manual: 9600 8N1, no flow control.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SerialConfig {
    pub device: String,
    pub baud_rate: u32,
    #[serde(default)]
    pub data_bits: DataBits,
    #[serde(default)]
    pub parity: Parity,
    #[serde(default)]
    pub stop_bits: StopBits,

    /// Overall deadline for a single read call; polled in small increments.
    #[serde(with = "humantime_serde")]
    pub read_timeout: Duration,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            device: "/dev/ttyUSB0".to_string(),
            baud_rate: 9600,
            data_bits: DataBits::default(),
            parity: Parity::default(),
            stop_bits: StopBits::default(),
            read_timeout: Duration::from_millis(1000),
        }
    }
}

impl SerialConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.device.is_empty() {
            return Err(ConfigError::serial("Device path cannot be empty"));
        }

        if self.baud_rate == 0 {
            return Err(ConfigError::serial("Baud rate cannot be 0"));
        }

        if DataBits::new(self.data_bits.get()).is_none() {
            return Err(ConfigError::serial(format!(
                "Data bits {} outside valid range 5-8",
                self.data_bits.get()
            )));
        }

        if self.read_timeout.as_millis() == 0 {
            return Err(ConfigError::timing("Serial read timeout cannot be 0"));
        }

        Ok(())
    }

    pub fn port_info(&self) -> String {
        format!(
            "{}@{} {}{}{}",
            self.device, self.baud_rate, self.data_bits, self.parity, self.stop_bits,
        )
    }
}
