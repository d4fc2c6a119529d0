use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid serial configuration: {0}")]
    InvalidSerial(String),

    #[error("Invalid TCP configuration: {0}")]
    InvalidTcp(String),

    #[error("Invalid timing configuration: {0}")]
    InvalidTiming(String),

    #[error("Invalid device configuration: {0}")]
    InvalidDevice(String),

    #[error("Invalid logging configuration: {0}")]
    InvalidLogging(String),
}

impl ConfigError {
    pub fn serial(details: impl Into<String>) -> Self {
        ConfigError::InvalidSerial(details.into())
    }

    pub fn tcp(details: impl Into<String>) -> Self {
        ConfigError::InvalidTcp(details.into())
    }

    pub fn timing(details: impl Into<String>) -> Self {
        ConfigError::InvalidTiming(details.into())
    }

    pub fn device(details: impl Into<String>) -> Self {
        ConfigError::InvalidDevice(details.into())
    }

    pub fn logging(details: impl Into<String>) -> Self {
        ConfigError::InvalidLogging(details.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_creation() {
        let err = ConfigError::tcp("Port cannot be 0");
        assert!(matches!(err, ConfigError::InvalidTcp(_)));
        assert_eq!(err.to_string(), "Invalid TCP configuration: Port cannot be 0");
    }
}
