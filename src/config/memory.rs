use serde::{Deserialize, Serialize};

/// The slave's byte-addressable window `[addr_begin, addr_begin + size)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub addr_begin: u16,
    pub size: u16,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            addr_begin: 0x1000,
            size: 1024,
        }
    }
}
