use serde::{Deserialize, Serialize};

/// Overrides for the silent-interval timers. When absent, both intervals
/// are derived from the baud rate.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Custom 1.5 character interval, in microseconds.
    pub t1_5_us: Option<u64>,

    /// Custom 3.5 character interval, in microseconds.
    pub t3_5_us: Option<u64>,
}
