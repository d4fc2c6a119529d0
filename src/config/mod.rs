mod device;
mod logging;
mod serial;
mod tcp;
mod types;

pub use device::DeviceConfig;
pub use logging::LogConfig;
pub use serial::SerialConfig;
pub use tcp::TcpConfig;
pub use types::{DataBits, Parity, StopBits};

use serde::{Deserialize, Serialize};

use crate::errors::ConfigError;

/// Which byte channel carries the RS-485 bus.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "kind")]
pub enum TransportConfig {
    Serial(SerialConfig),
    Tcp(TcpConfig),
}

impl TransportConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self {
            TransportConfig::Serial(serial) => serial.validate(),
            TransportConfig::Tcp(tcp) => tcp.validate(),
        }
    }
}

impl Default for TransportConfig {
    fn default() -> Self {
        TransportConfig::Serial(SerialConfig::default())
    }
}

/// Top-level configuration loaded from the JSON config file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RadioConfig {
    pub transport: TransportConfig,

    pub device: DeviceConfig,

    #[serde(default)]
    pub log: LogConfig,
}

impl RadioConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.transport.validate()?;
        self.device.validate()?;
        self.log.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(RadioConfig::default().validate().is_ok());
    }

    #[test]
    fn test_json_round_trip() {
        let config = RadioConfig {
            transport: TransportConfig::Tcp(TcpConfig::default()),
            ..Default::default()
        };

        let json = serde_json::to_string_pretty(&config).unwrap();
        let parsed: RadioConfig = serde_json::from_str(&json).unwrap();
        assert!(parsed.validate().is_ok());
        match parsed.transport {
            TransportConfig::Tcp(tcp) => assert_eq!(tcp.port, 4001),
            _ => panic!("Expected TCP transport"),
        }
    }

    #[test]
    fn test_rejects_unknown_fields() {
        let json = r#"{
            "transport": { "kind": "tcp", "host": "10.0.0.1", "port": 4001,
                           "connect_timeout": "3s", "read_timeout": "1s" },
            "device": { "address": 1, "response_timeout": "2s",
                        "poll_interval": "1s", "retry_count": 3,
                        "freq_min_mhz": 118.0, "freq_max_mhz": 136.975 },
            "surprise": true
        }"#;
        assert!(serde_json::from_str::<RadioConfig>(json).is_err());
    }

    #[test]
    fn test_durations_accept_humantime_strings() {
        let json = r#"{
            "transport": { "kind": "serial", "device": "/dev/ttyUSB1",
                           "baud_rate": 9600, "read_timeout": "500ms" },
            "device": { "address": 3, "response_timeout": "2s",
                        "poll_interval": "1s", "retry_count": 3,
                        "freq_min_mhz": 118.0, "freq_max_mhz": 136.975 }
        }"#;
        let config: RadioConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.device.address, 3);
        match config.transport {
            TransportConfig::Serial(serial) => {
                assert_eq!(serial.read_timeout.as_millis(), 500);
            }
            _ => panic!("Expected serial transport"),
        }
    }

    #[test]
    fn test_config_file_round_trip() {
        use std::io::Write;

        let config = RadioConfig::default();
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{}", serde_json::to_string_pretty(&config).unwrap()).unwrap();

        let content = std::fs::read_to_string(file.path()).unwrap();
        let loaded: RadioConfig = serde_json::from_str(&content).unwrap();
        assert!(loaded.validate().is_ok());
    }
}
