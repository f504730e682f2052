//! Bounded status waits

use crate::hal::twi::{TwiRegs, TwiStatus};
use crate::internal::constants::DEFAULT_I2C_WAIT_ITERATIONS;

/// Upper bound on status polls for one wait
///
/// Expressed as an iteration count so it works with every interrupt
/// (including the system tick) masked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct WaitTimeout(u32);

impl WaitTimeout {
    /// Fixed number of polls
    pub const fn new(iterations: u32) -> Self {
        Self(iterations)
    }

    /// Scale a duration in bus clock cycles to core-side polls.
    ///
    /// One poll costs at least one bus access, so `cycles` bus cycles are
    /// covered by `cycles * (core_hz / bus_hz)` polls.
    pub const fn from_bus_cycles(cycles: u32, core_hz: u32, bus_hz: u32) -> Self {
        let ratio = if bus_hz == 0 || core_hz <= bus_hz {
            1
        } else {
            core_hz / bus_hz
        };
        Self(cycles.saturating_mul(ratio))
    }

    /// Number of polls
    pub const fn iterations(self) -> u32 {
        self.0
    }
}

impl Default for WaitTimeout {
    fn default() -> Self {
        Self(DEFAULT_I2C_WAIT_ITERATIONS)
    }
}

/// Strategy used by [`TwoWire`](super::TwoWire) to wait for status bits
///
/// Returns the last status observed. The caller treats the wait as
/// successful only if every requested bit is set; a set NACK bit
/// classifies a failure as a NAK rather than a timeout.
pub trait StatusWait {
    /// Wait until `bits` (or NACK) appear, or give up
    fn wait_for<T: TwiRegs>(&mut self, twi: &T, bits: TwiStatus) -> TwiStatus;
}

/// Busy-poll the status register
#[derive(Debug, Clone, Copy, Default)]
pub struct PollWait {
    timeout: WaitTimeout,
}

impl PollWait {
    /// Poll at most `timeout` times
    pub const fn new(timeout: WaitTimeout) -> Self {
        Self { timeout }
    }
}

impl StatusWait for PollWait {
    fn wait_for<T: TwiRegs>(&mut self, twi: &T, bits: TwiStatus) -> TwiStatus {
        let mut status = twi.status();
        let mut remaining = self.timeout.iterations();
        while !status.contains(bits) && !status.contains(TwiStatus::NACK) && remaining > 0 {
            remaining -= 1;
            core::hint::spin_loop();
            status = twi.status();
        }
        status
    }
}
