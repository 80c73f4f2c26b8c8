//! Hosted serial transport.
//!
//! [`SerialDriver`] adapts a blocking `serialport` handle to the
//! [`Driver`] capability: the two character timers become a software
//! one-shot checked between reads, and `serial_send` writes and drains
//! the port before reporting completion. [`run_slave`] is the dispatcher
//! loop — a single thread owns the machine and feeds it bytes and timer
//! expirations until the stop flag is raised.

use std::io::{Read, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use serialport::SerialPort;
use tracing::{debug, error, info, trace};

use crate::config::{RtuConfig, SlaveConfig, StopBits, TimingConfig};
use crate::driver::{Driver, PduHandler};
use crate::errors::{StackError, TransportError};
use crate::frame::ADU_CAPACITY;
use crate::memory::RtuMemory;
use crate::rtu::Rtu;
use crate::timing;

/// Upper bound on a single blocking read while no timer is armed; keeps
/// the loop responsive to the stop flag.
const IDLE_POLL: Duration = Duration::from_millis(100);

/// Slack on top of the computed minimum transmission time when writing.
const TX_SLACK: Duration = Duration::from_millis(100);

/// One-shot interval measured against a monotonic clock.
#[derive(Debug)]
struct SoftTimer {
    started_at: Instant,
    interval: Duration,
    armed: bool,
}

impl SoftTimer {
    fn new() -> Self {
        Self {
            started_at: Instant::now(),
            interval: Duration::ZERO,
            armed: false,
        }
    }

    fn start(&mut self, interval: Duration) {
        debug_assert!(!self.armed, "timer double-armed");
        self.started_at = Instant::now();
        self.interval = interval;
        self.armed = true;
    }

    fn stop(&mut self) {
        self.armed = false;
    }

    fn reset(&mut self) {
        debug_assert!(self.armed, "reset of a stopped timer");
        self.started_at = Instant::now();
    }

    fn remaining(&self) -> Option<Duration> {
        self.armed
            .then(|| self.interval.saturating_sub(self.started_at.elapsed()))
    }
}

/// Blocking serial-line driver for hosted targets.
pub struct SerialDriver {
    port: Box<dyn SerialPort>,
    baud_rate: u32,
    t1_5: Duration,
    t3_5: Duration,
    timer: SoftTimer,
    trace_bytes: usize,
}

impl SerialDriver {
    /// Opens and configures the device. Stop bits follow from parity so
    /// the character stays 11 bits either way.
    pub fn open(
        config: &RtuConfig,
        timing_cfg: &TimingConfig,
        trace_bytes: usize,
    ) -> Result<Self, TransportError> {
        let port = serialport::new(&config.device, config.baud_rate)
            .data_bits(config.data_bits.into())
            .parity(config.parity.into())
            .stop_bits(StopBits::for_parity(config.parity).into())
            .timeout(IDLE_POLL)
            .open()?;
        port.clear(serialport::ClearBuffer::All)?;

        let t1_5 = timing_cfg
            .t1_5_us
            .map(Duration::from_micros)
            .unwrap_or_else(|| timing::interval_1t5(config.baud_rate));
        let t3_5 = timing_cfg
            .t3_5_us
            .map(Duration::from_micros)
            .unwrap_or_else(|| timing::interval_3t5(config.baud_rate));

        info!(
            port = %config.serial_port_info(),
            "1.5t {}us, 3.5t {}us",
            t1_5.as_micros(),
            t3_5.as_micros()
        );

        Ok(Self {
            port,
            baud_rate: config.baud_rate,
            t1_5,
            t3_5,
            timer: SoftTimer::new(),
            trace_bytes,
        })
    }

    fn timer_fired(&self) -> bool {
        matches!(self.timer.remaining(), Some(remaining) if remaining.is_zero())
    }

    /// How long the next read may block: the armed timer bounds it, the
    /// idle poll period caps it.
    fn poll_budget(&self) -> Duration {
        self.timer
            .remaining()
            .map(|remaining| remaining.clamp(Duration::from_millis(1), IDLE_POLL))
            .unwrap_or(IDLE_POLL)
    }

    fn read_some(&mut self, buf: &mut [u8], budget: Duration) -> Result<usize, TransportError> {
        self.port.set_timeout(budget)?;
        match self.port.read(buf) {
            Ok(n) => Ok(n),
            Err(err)
                if matches!(
                    err.kind(),
                    std::io::ErrorKind::TimedOut
                        | std::io::ErrorKind::WouldBlock
                        | std::io::ErrorKind::Interrupted
                ) =>
            {
                Ok(0)
            }
            Err(err) => Err(err.into()),
        }
    }

    fn dump(&self, direction: &str, bytes: &[u8]) {
        if self.trace_bytes > 0 {
            let shown = bytes.len().min(self.trace_bytes);
            trace!("{direction} {}", hex::encode(&bytes[..shown]));
        }
    }
}

impl Driver for SerialDriver {
    fn timer_start_1t5(&mut self) {
        self.timer.start(self.t1_5);
    }

    fn timer_start_3t5(&mut self) {
        self.timer.start(self.t3_5);
    }

    fn timer_stop(&mut self) {
        self.timer.stop();
    }

    fn timer_reset(&mut self) {
        self.timer.reset();
    }

    fn serial_send(&mut self, frame: &[u8]) -> bool {
        self.dump("tx", frame);

        let budget = timing::min_tx_time(self.baud_rate, frame.len()) + TX_SLACK;
        if let Err(err) = self.port.set_timeout(budget) {
            error!(%err, "failed to set transmit timeout");
        }

        match self
            .port
            .write_all(frame)
            .and_then(|()| self.port.flush())
        {
            Ok(()) => true,
            Err(err) => {
                // the frame is lost; reporting completion lets the
                // machine reinitialize instead of sticking in BUSY
                error!(%err, "serial transmit failed");
                true
            }
        }
    }
}

/// Drives `rtu` until `stop` is raised. Bytes are fed in wire order,
/// each followed by an `event` round; the software timer expiry is
/// checked between reads.
pub fn run<H: PduHandler>(
    driver: SerialDriver,
    addr: u8,
    handler: H,
    stop: &AtomicBool,
) -> Result<(), StackError> {
    let mut rtu = Rtu::new(addr, driver, handler);
    rtu.event(); // arms the initial silent interval

    let mut buf = [0u8; ADU_CAPACITY];

    while !stop.load(Ordering::Relaxed) {
        if rtu.driver().timer_fired() {
            rtu.timer_expired();
            rtu.event();
            continue;
        }

        let budget = rtu.driver().poll_budget();
        let received = rtu.driver_mut().read_some(&mut buf, budget)?;
        if received > 0 {
            rtu.driver().dump("rx", &buf[..received]);
            // TODO: deliver per-byte parity errors via serial_recv_err
            // once serialport surfaces them
            for &byte in &buf[..received] {
                rtu.serial_recv(byte);
                rtu.event();
            }
        }
    }

    debug!(stats = ?rtu.stats(), "stop requested, shutting down");
    Ok(())
}

/// Brings up the reference memory slave described by `config` and runs
/// it until `stop` is raised.
pub fn run_slave(config: &SlaveConfig, stop: &AtomicBool) -> Result<(), StackError> {
    config.validate()?;

    let driver = SerialDriver::open(&config.rtu, &config.timing, config.logging.trace_bytes)?;
    let memory = RtuMemory::new(config.address, config.memory.addr_begin, config.memory.size)
        .ok_or_else(|| StackError::Init("memory window rejected".to_string()))?;

    info!(
        address = config.address,
        addr_begin = config.memory.addr_begin,
        size = config.memory.size,
        "starting memory slave"
    );

    run(driver, config.address, memory, stop)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn soft_timer_one_shot() {
        let mut timer = SoftTimer::new();
        assert_eq!(timer.remaining(), None);

        timer.start(Duration::from_millis(50));
        assert!(timer.remaining().unwrap() <= Duration::from_millis(50));

        timer.stop();
        assert_eq!(timer.remaining(), None);
        timer.stop(); // idempotent
    }

    #[test]
    fn soft_timer_reset_rewinds() {
        let mut timer = SoftTimer::new();
        timer.start(Duration::from_secs(1));
        std::thread::sleep(Duration::from_millis(5));
        let before = timer.remaining().unwrap();
        timer.reset();
        let after = timer.remaining().unwrap();
        assert!(after >= before);
    }
}
