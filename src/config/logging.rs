use serde::{Deserialize, Serialize};
use tracing::level_filters::LevelFilter;

use crate::errors::ConfigValidationError;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Minimum log level for console output
    pub level: String,

    /// Whether to include source code location in logs
    pub include_location: bool,

    /// Hex-dump transferred frames, truncated to this many bytes
    /// (0 disables the dumps)
    pub trace_bytes: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            include_location: false,
            trace_bytes: 0,
        }
    }
}

impl Config {
    pub fn get_level_filter(&self) -> LevelFilter {
        match self.level.to_lowercase().as_str() {
            "error" => LevelFilter::ERROR,
            "warn" => LevelFilter::WARN,
            "info" => LevelFilter::INFO,
            "debug" => LevelFilter::DEBUG,
            "trace" => LevelFilter::TRACE,
            _ => LevelFilter::INFO,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        match self.level.to_lowercase().as_str() {
            "error" | "warn" | "info" | "debug" | "trace" => Ok(()),
            _ => Err(ConfigValidationError::InvalidLogLevel(self.level.clone())),
        }
    }
}
