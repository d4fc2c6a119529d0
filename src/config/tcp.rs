use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::errors::ConfigError;

/// TCP-to-serial bridge settings (e.g. a MOXA NPort in raw mode).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TcpConfig {
    pub host: String,
    pub port: u16,

    #[serde(with = "humantime_serde")]
    pub connect_timeout: Duration,

    /// Overall deadline for a single read call; polled in small increments.
    #[serde(with = "humantime_serde")]
    pub read_timeout: Duration,
}

impl Default for TcpConfig {
    fn default() -> Self {
        Self {
            host: "192.168.1.100".to_string(),
            port: 4001,
            connect_timeout: Duration::from_secs(3),
            read_timeout: Duration::from_millis(1000),
        }
    }
}

impl TcpConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.host.is_empty() {
            return Err(ConfigError::tcp("Host cannot be empty"));
        }

        if self.port == 0 {
            return Err(ConfigError::tcp("Port cannot be 0"));
        }

        if self.connect_timeout.as_millis() == 0 {
            return Err(ConfigError::timing("Connect timeout cannot be 0"));
        }

        if self.read_timeout.as_millis() == 0 {
            return Err(ConfigError::timing("TCP read timeout cannot be 0"));
        }

        Ok(())
    }

    pub fn endpoint(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(TcpConfig::default().validate().is_ok());
    }

    #[test]
    fn test_rejects_port_zero() {
        let config = TcpConfig {
            port: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::InvalidTcp(_))));
    }

    #[test]
    fn test_endpoint_format() {
        let config = TcpConfig::default();
        assert_eq!(config.endpoint(), "192.168.1.100:4001");
    }
}
