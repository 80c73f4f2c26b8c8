use serde::{Deserialize, Serialize};

use crate::config::{LoggingConfig, MemoryConfig, RtuConfig, TimingConfig, SUPPORTED_BAUD_RATES};
use crate::errors::ConfigValidationError;

/// Top-level configuration of the hosted slave runner.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Station address this slave answers on (1..=247)
    pub address: u8,

    /// Serial line configuration
    pub rtu: RtuConfig,

    /// Silent-interval overrides
    pub timing: TimingConfig,

    /// Memory window exposed by the reference slave
    pub memory: MemoryConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if !(1..=247).contains(&self.address) {
            return Err(ConfigValidationError::InvalidAddress(self.address));
        }
        if self.rtu.device.is_empty() {
            return Err(ConfigValidationError::MissingDevice);
        }
        if !SUPPORTED_BAUD_RATES.contains(&self.rtu.baud_rate) {
            return Err(ConfigValidationError::UnsupportedBaudRate(
                self.rtu.baud_rate,
            ));
        }
        if self.memory.size == 0
            || self
                .memory
                .addr_begin
                .checked_add(self.memory.size)
                .is_none()
        {
            return Err(ConfigValidationError::InvalidMemoryWindow {
                begin: self.memory.addr_begin,
                size: self.memory.size,
            });
        }
        if self.timing.t1_5_us == Some(0) || self.timing.t3_5_us == Some(0) {
            return Err(ConfigValidationError::InvalidTiming(
                "zero-length silent interval".to_string(),
            ));
        }
        self.logging.validate()?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> Config {
        let mut config = Config::default();
        config.address = 0xAA;
        config.rtu.device = "/dev/ttyUSB0".to_string();
        config
    }

    #[test]
    fn accepts_a_complete_config() {
        valid().validate().unwrap();
    }

    #[test]
    fn defaults_are_incomplete_on_purpose() {
        // address and device must come from the caller
        assert!(Config::default().validate().is_err());
    }

    #[test]
    fn rejects_out_of_range_values() {
        let mut config = valid();
        config.address = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigValidationError::InvalidAddress(0))
        ));

        let mut config = valid();
        config.rtu.baud_rate = 38_400;
        assert!(matches!(
            config.validate(),
            Err(ConfigValidationError::UnsupportedBaudRate(38_400))
        ));

        let mut config = valid();
        config.memory.addr_begin = 0xFFFF;
        config.memory.size = 2;
        assert!(matches!(
            config.validate(),
            Err(ConfigValidationError::InvalidMemoryWindow { .. })
        ));

        let mut config = valid();
        config.timing.t1_5_us = Some(0);
        assert!(matches!(
            config.validate(),
            Err(ConfigValidationError::InvalidTiming(_))
        ));
    }

    #[test]
    fn serde_round_trip() {
        let config = valid();
        let json = serde_json::to_string_pretty(&config).unwrap();
        let back: Config = serde_json::from_str(&json).unwrap();
        assert_eq!(back.address, 0xAA);
        assert_eq!(back.rtu.device, "/dev/ttyUSB0");
        back.validate().unwrap();
    }
}
