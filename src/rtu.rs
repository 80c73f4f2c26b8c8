//! The RTU receive/dispatch/reply state machine.
//!
//! Frames are delimited purely by time: a silent interval of at least
//! 3.5 character periods separates frames, and a gap of more than 1.5
//! character periods inside a frame invalidates it. The machine tracks
//! this with two one-shot timers supplied by the [`Driver`]:
//!
//! ```text
//!              3.5t expire
//!  INIT ──────────────────────► IDLE
//!                ▲
//!  byte recv     │ 3.5t expire (from EOF, confirms the gap)
//!  from IDLE     │
//!       │        │
//!       ▼        │
//!  SOF ──byte──► RECV ──1.5t expire──► EOF ──3.5t expire──► IDLE
//!                 │
//!                 └── reset 1.5t on each byte
//!
//!  reply built ──► BUSY ──tx complete──► INIT
//! ```
//!
//! Callbacks (`serial_recv`, `timer_expired`, `serial_sent`) only record
//! transitions; [`Rtu::event`] performs the entry actions. Any
//! unexpected stimulus raises the error flag, and the next `event`
//! reinitializes the machine. `event` must not be re-entered from a
//! callback; it drains every pending transition before returning.

use tracing::{debug, trace, warn};

use crate::crc::{calc_crc16, encode_crc, CRC_SIZE};
use crate::driver::{Driver, PduHandler};
use crate::frame::{ADU_CAPACITY, ADU_MIN_SIZE};

/// Line states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineState {
    Init,
    Idle,
    /// First character of a frame observed.
    Sof,
    Recv,
    /// Possible end of frame; waiting out the silent interval.
    Eof,
    /// Reply transmission in progress.
    Busy,
}

/// Why the currently armed timer was started.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerReason {
    /// 1.5t: maximum gap between characters of one frame.
    InterFrameTimeout,
    /// 3.5t: minimum gap between frames.
    SilentInterval,
}

/// Saturating error counters, observable via [`Rtu::stats`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Stats {
    pub err: u8,
    pub serial_recv_err: u8,
    pub crc_err: u8,
}

#[derive(Debug, Clone, Copy)]
struct Status {
    updated: bool,
    error: bool,
    prev: LineState,
    curr: LineState,
}

/// A slave-side RTU instance bound to a [`Driver`] and a [`PduHandler`].
pub struct Rtu<D: Driver, H: PduHandler> {
    addr: u8,
    driver: D,
    handler: H,
    status: Status,
    timer_reason: Option<TimerReason>,
    rxbuf: [u8; ADU_CAPACITY],
    rxbuf_len: usize,
    txbuf: [u8; ADU_CAPACITY],
    txbuf_len: usize,
    stats: Stats,
}

impl<D: Driver, H: PduHandler> Rtu<D, H> {
    /// Creates the instance in INIT with a pending transition; call
    /// [`Rtu::event`] once to arm the initial silent interval.
    pub fn new(addr: u8, driver: D, handler: H) -> Self {
        Self {
            addr,
            driver,
            handler,
            status: Status {
                updated: true,
                error: false,
                prev: LineState::Init,
                curr: LineState::Init,
            },
            timer_reason: None,
            rxbuf: [0; ADU_CAPACITY],
            rxbuf_len: 0,
            txbuf: [0; ADU_CAPACITY],
            txbuf_len: 0,
            stats: Stats::default(),
        }
    }

    /// The station address this instance was configured with.
    pub fn addr(&self) -> u8 {
        self.addr
    }

    pub fn idle(&self) -> bool {
        self.status.curr == LineState::Idle
    }

    pub fn state(&self) -> LineState {
        self.status.curr
    }

    pub fn stats(&self) -> Stats {
        self.stats
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    pub fn driver_mut(&mut self) -> &mut D {
        &mut self.driver
    }

    pub fn handler(&self) -> &H {
        &self.handler
    }

    pub fn handler_mut(&mut self) -> &mut H {
        &mut self.handler
    }

    fn update(&mut self, next: LineState) {
        self.status.updated = true;
        self.status.prev = self.status.curr;
        self.status.curr = next;
    }

    fn raise_error(&mut self) {
        self.status.updated = true;
        self.status.error = true;
    }

    fn rxbuf_append(&mut self, data: u8) {
        if self.rxbuf_len < ADU_CAPACITY {
            self.rxbuf[self.rxbuf_len] = data;
            self.rxbuf_len += 1;
        } else {
            warn!("receive buffer overrun");
            self.raise_error();
        }
    }

    /// Delivers one byte received on the serial line, in wire order.
    pub fn serial_recv(&mut self, data: u8) {
        match self.status.curr {
            LineState::Idle => {
                // First character: start of frame, switch from 3.5t to 1.5t
                self.update(LineState::Sof);
                self.rxbuf_append(data);
                self.timer_reason = Some(TimerReason::InterFrameTimeout);
                self.driver.timer_start_1t5();
            }
            LineState::Sof | LineState::Recv => {
                self.update(LineState::Recv);
                self.rxbuf_append(data);
                self.driver.timer_reset();
            }
            state => {
                trace!(?state, data, "unexpected byte on the line");
                self.raise_error();
            }
        }
    }

    /// Reports a framing/parity error observed by the serial driver. The
    /// partial frame is dropped and the machine reinitializes.
    pub fn serial_recv_err(&mut self, _data: u8) {
        self.stats.serial_recv_err = self.stats.serial_recv_err.saturating_add(1);
        self.raise_error();
    }

    /// Confirms that the last byte of the reply has left the line.
    pub fn serial_sent(&mut self) {
        if self.status.curr == LineState::Busy {
            self.txbuf_len = 0;
            self.update(LineState::Init);
        } else {
            trace!(state = ?self.status.curr, "transmit completion outside BUSY");
            self.raise_error();
        }
    }

    /// Delivers the expiry of the armed timer.
    pub fn timer_expired(&mut self) {
        match self.timer_reason {
            Some(TimerReason::SilentInterval) => self.silent_interval_elapsed(),
            Some(TimerReason::InterFrameTimeout) => self.inter_frame_timeout(),
            None => {
                trace!("spurious timer expiry");
                self.raise_error();
            }
        }
    }

    fn silent_interval_elapsed(&mut self) {
        match (self.status.prev, self.status.curr) {
            // INIT -> IDLE happens on start/restart
            (_, LineState::Init) | (LineState::Recv, LineState::Eof) => {
                self.update(LineState::Idle);
                self.driver.timer_stop();
                self.timer_reason = None;
            }
            (prev, curr) => {
                trace!(?prev, ?curr, "unexpected silent-interval expiry");
                self.raise_error();
            }
        }
    }

    fn inter_frame_timeout(&mut self) {
        if self.status.curr == LineState::Recv {
            // Possible end of frame: 1.5t elapsed since the last
            // character. Wait a further 3.5t to confirm the gap.
            self.update(LineState::Eof);
            self.driver.timer_stop();
            self.timer_reason = Some(TimerReason::SilentInterval);
            self.driver.timer_start_3t5();
        } else {
            trace!(state = ?self.status.curr, "unexpected inter-frame timeout");
            self.raise_error();
        }
    }

    /// Processes every pending transition recorded by the callbacks.
    pub fn event(&mut self) {
        while self.status.updated {
            self.step();
        }
    }

    fn step(&mut self) {
        self.status.updated = false;

        if self.status.error {
            self.recover();
            return;
        }

        match self.status.curr {
            LineState::Init => self.restart(),
            LineState::Idle => match self.status.prev {
                LineState::Init => {}
                LineState::Eof => {
                    if self.txbuf_len != 0 {
                        // previous reply still outstanding; must never
                        // happen outside BUSY
                        self.recover();
                        return;
                    }
                    self.adu_process();
                    self.driver.resume();
                }
                _ => self.recover(),
            },
            LineState::Sof => {
                self.driver.suspend();
                if self.status.prev != LineState::Idle {
                    self.recover();
                }
            }
            // 1.5t reset handled directly in serial_recv
            LineState::Recv => {}
            LineState::Eof => {
                if self.status.prev != LineState::Recv {
                    self.recover();
                }
            }
            // reply transmission in progress
            LineState::Busy => {}
        }
    }

    fn recover(&mut self) {
        self.stats.err = self.stats.err.saturating_add(1);
        warn!(
            err = self.stats.err,
            serial_recv_err = self.stats.serial_recv_err,
            crc_err = self.stats.crc_err,
            "reinitializing after error"
        );
        self.update(LineState::Init);
        self.status.updated = false;
        self.status.error = false;
        self.restart();
    }

    fn restart(&mut self) {
        self.rxbuf.fill(0);
        self.rxbuf_len = 0;
        self.txbuf.fill(0);
        self.txbuf_len = 0;
        self.driver.timer_stop();
        self.timer_reason = Some(TimerReason::SilentInterval);
        self.driver.timer_start_3t5();
    }

    fn adu_check(&mut self) -> bool {
        if self.rxbuf_len < ADU_MIN_SIZE {
            return false;
        }

        let payload = &self.rxbuf[..self.rxbuf_len - CRC_SIZE];
        let calculated = calc_crc16(payload);
        let received =
            u16::from_le_bytes([self.rxbuf[self.rxbuf_len - 2], self.rxbuf[self.rxbuf_len - 1]]);

        if calculated != received {
            debug!("CRC mismatch: calculated={calculated:04X} received={received:04X}");
            self.stats.crc_err = self.stats.crc_err.saturating_add(1);
            return false;
        }

        true
    }

    fn adu_process(&mut self) {
        if !self.adu_check() {
            self.raise_error();
            return;
        }

        let addr = self.rxbuf[0];
        let fcode = self.rxbuf[1];
        let src_len = self.rxbuf_len - CRC_SIZE;
        let written = self.handler.handle_pdu(
            addr,
            fcode,
            &self.rxbuf[..src_len],
            &mut self.txbuf[..ADU_CAPACITY - CRC_SIZE],
        );

        self.rxbuf_len = 0;

        if written == 0 {
            // frame for another station, or a broadcast: nothing to send
            return;
        }
        if written > ADU_CAPACITY - CRC_SIZE {
            self.raise_error();
            return;
        }

        let crc = calc_crc16(&self.txbuf[..written]);
        self.txbuf[written..written + CRC_SIZE].copy_from_slice(&encode_crc(crc));
        self.txbuf_len = written + CRC_SIZE;

        self.update(LineState::Busy);
        if self.driver.serial_send(&self.txbuf[..self.txbuf_len]) {
            self.serial_sent();
        }
    }
}
