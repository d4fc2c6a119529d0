use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::device::HoursEncoding;
use crate::errors::ConfigError;

/// Per-device protocol settings.
///
/// Defaults come straight from the device manual's timing table: 2 s response
/// timeout, 1 s poll interval, 3 retries.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeviceConfig {
    /// Modbus bus address, 1-247.
    pub address: u8,

    #[serde(with = "humantime_serde")]
    pub response_timeout: Duration,

    /// Cadence for the caller's polling loop; the core itself never polls.
    #[serde(with = "humantime_serde")]
    pub poll_interval: Duration,

    /// Retries per exchange at the device layer. The RTU client itself
    /// never retries.
    pub retry_count: u8,

    /// Lower bound of the accepted tuning range in MHz.
    pub freq_min_mhz: f64,

    /// Upper bound of the accepted tuning range in MHz.
    pub freq_max_mhz: f64,

    /// Operating-hours register scheme; `single` is canonical, `dual-word`
    /// covers the legacy two-register firmware.
    #[serde(default)]
    pub hours_encoding: HoursEncoding,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            address: 1,
            response_timeout: Duration::from_millis(2000),
            poll_interval: Duration::from_millis(1000),
            retry_count: 3,
            // Aviation VHF band; hardware accepts 100.000-149.975
            freq_min_mhz: 118.0,
            freq_max_mhz: 136.975,
            hours_encoding: HoursEncoding::default(),
        }
    }
}

impl DeviceConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.address == 0 || self.address > 247 {
            return Err(ConfigError::device(format!(
                "Address {} outside valid range 1-247",
                self.address
            )));
        }

        if self.response_timeout.as_millis() == 0 {
            return Err(ConfigError::timing("Response timeout cannot be 0"));
        }

        if self.poll_interval.as_millis() == 0 {
            return Err(ConfigError::timing("Poll interval cannot be 0"));
        }

        if self.freq_min_mhz >= self.freq_max_mhz {
            return Err(ConfigError::device(format!(
                "Frequency band {:.3}-{:.3} MHz is empty",
                self.freq_min_mhz, self.freq_max_mhz
            )));
        }

        // Hardware limits from the frequency register format
        if self.freq_min_mhz < 100.0 || self.freq_max_mhz > 149.975 {
            return Err(ConfigError::device(
                "Frequency band outside hardware range 100.000-149.975 MHz",
            ));
        }

        Ok(())
    }
}
