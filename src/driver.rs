//! Capability seams between the state machine and its host.
//!
//! The machine itself never blocks and never touches hardware: character
//! timers and the transmit path live behind [`Driver`], frame semantics
//! behind [`PduHandler`]. Hosts deliver inbound bytes and timer
//! expirations by calling back into [`crate::rtu::Rtu`].

/// Timer and serial-line operations the state machine calls out to.
///
/// At most one timer is armed at any instant: the machine stops the
/// running timer before arming the other one, and implementations may
/// assert on double-arming.
pub trait Driver {
    /// Arm a one-shot timer for ~1.5 character periods (the inter-frame
    /// timeout). Fires once via [`crate::rtu::Rtu::timer_expired`].
    fn timer_start_1t5(&mut self);

    /// Arm a one-shot timer for ~3.5 character periods (the silent
    /// interval).
    fn timer_start_3t5(&mut self);

    /// Cancel any pending expiry. Idempotent.
    fn timer_stop(&mut self);

    /// Restart the armed interval from zero without disarming.
    fn timer_reset(&mut self);

    /// Transmit `frame`. Returns `true` when the last byte has left the
    /// line before this call returns; the machine then completes the
    /// transmission immediately. A driver that queues the frame returns
    /// `false` and calls [`crate::rtu::Rtu::serial_sent`] once done.
    fn serial_send(&mut self, frame: &[u8]) -> bool;

    /// The line just became busy with an inbound frame. Embedders can
    /// gate power or defer background work here.
    fn suspend(&mut self) {}

    /// The line returned to idle after a processed frame.
    fn resume(&mut self) {}
}

/// Handler invoked once per validated, CRC-checked inbound frame.
pub trait PduHandler {
    /// `request` is the inbound ADU minus its CRC trailer: the station
    /// address at `[0]`, the function code at `[1]`, the data from `[2]`
    /// on. The handler writes its reply into `reply` (station address
    /// included, CRC excluded; the machine appends the trailer) and
    /// returns the number of bytes written. Returning 0 means "no reply"
    /// and is the correct answer for frames addressed elsewhere and for
    /// broadcasts.
    fn handle_pdu(&mut self, addr: u8, fcode: u8, request: &[u8], reply: &mut [u8]) -> usize;
}
