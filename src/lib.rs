pub mod client;
pub mod config;
pub mod crc;
pub mod driver;
pub mod errors;
pub mod frame;
pub mod logging;
pub mod memory;
pub mod rtu;
pub mod timing;
pub mod transport;

pub use config::{LoggingConfig, MemoryConfig, RtuConfig, SlaveConfig, TimingConfig};
pub use config::{DataBits, Parity, StopBits};
pub use driver::{Driver, PduHandler};
pub use errors::{
    ConfigValidationError, FrameError, RequestError, StackError, TransportError,
};
pub use frame::{ExceptionCode, FunctionCode};
pub use logging::setup_logging;
pub use memory::RtuMemory;
pub use rtu::{LineState, Rtu, Stats, TimerReason};
pub use transport::{run_slave, SerialDriver};
