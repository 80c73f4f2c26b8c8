use serde::{Deserialize, Serialize};

use crate::config::types::{DataBits, Parity, StopBits};

/// Baud rates the runner accepts.
pub const SUPPORTED_BAUD_RATES: [u32; 7] = [1_200, 2_400, 4_800, 9_600, 19_200, 57_600, 115_200];

/// Serial line settings for the RTU bus. Stop bits are not listed: they
/// follow from parity to keep the 11-bit character.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub device: String,
    pub baud_rate: u32,
    pub data_bits: DataBits,
    pub parity: Parity,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            device: String::new(),
            baud_rate: 19_200,
            data_bits: DataBits::default(),
            parity: Parity::default(),
        }
    }
}

impl Config {
    pub fn serial_port_info(&self) -> String {
        format!(
            "{} ({} baud, {} data bits, {} parity, {} stop bits)",
            self.device,
            self.baud_rate,
            self.data_bits,
            self.parity,
            StopBits::for_parity(self.parity)
        )
    }
}
