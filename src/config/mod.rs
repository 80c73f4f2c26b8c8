mod logging;
mod memory;
mod rtu;
mod slave;
mod timing;
mod types;

pub use logging::Config as LoggingConfig;
pub use memory::Config as MemoryConfig;
pub use rtu::{Config as RtuConfig, SUPPORTED_BAUD_RATES};
pub use slave::Config as SlaveConfig;
pub use timing::Config as TimingConfig;
pub use types::{DataBits, Parity, StopBits};
