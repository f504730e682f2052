//! TWI master transfers

use crate::error::{ConfigError, ConfigResult};
use crate::hal::twi::{TwiRegs, TwiStatus};
use crate::internal::constants::{MAX_TWI_INTERNAL_ADDRESS_BYTES, TWI_DEFAULT_CLOCK_HZ};
use crate::sync::CriticalSectionCell;

use super::clock::TwiClock;
use super::wait::{PollWait, StatusWait, WaitTimeout};

/// Cumulative fault counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ErrorCounts {
    /// Waits aborted by a NACK
    pub naks: u32,
    /// Transmit-ready waits that timed out
    pub send_timeouts: u32,
    /// Receive-ready waits that timed out
    pub recv_timeouts: u32,
    /// Transfer-complete waits that timed out
    pub finish_timeouts: u32,
}

impl ErrorCounts {
    /// Zero every counter
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// True when no fault has been recorded
    pub const fn is_clear(&self) -> bool {
        self.naks == 0 && self.send_timeouts == 0 && self.recv_timeouts == 0 && self.finish_timeouts == 0
    }
}

#[derive(Clone, Copy)]
enum Phase {
    Send,
    Receive,
    Finish,
}

/// Blocking TWI master with bounded waits
///
/// Transfers never return an error: they report how many bytes moved and
/// record every failed wait in [`ErrorCounts`].
pub struct TwoWire<T> {
    twi: T,
    errors: CriticalSectionCell<ErrorCounts>,
}

impl<T: TwiRegs> TwoWire<T> {
    /// Wrap a controller (const, suitable for static initialization).
    pub const fn new(twi: T) -> Self {
        Self {
            twi,
            errors: CriticalSectionCell::new(ErrorCounts {
                naks: 0,
                send_timeouts: 0,
                recv_timeouts: 0,
                finish_timeouts: 0,
            }),
        }
    }

    /// Underlying controller
    pub fn twi(&self) -> &T {
        &self.twi
    }

    /// Initialise the controller as bus master at the standard-mode rate
    /// ([`TWI_DEFAULT_CLOCK_HZ`]).
    ///
    /// # Errors
    ///
    /// [`ConfigError::InvalidClock`] if the master clock cannot be divided
    /// down to that rate.
    pub fn begin(&self) -> ConfigResult<TwiClock> {
        self.begin_master(TWI_DEFAULT_CLOCK_HZ)
    }

    /// Initialise the controller as bus master at `clock_hz`.
    ///
    /// # Errors
    ///
    /// [`ConfigError::InvalidClock`] if the rate cannot be generated; the
    /// controller is not touched in that case.
    pub fn begin_master(&self, clock_hz: u32) -> ConfigResult<TwiClock> {
        let clock = TwiClock::new(self.twi.master_clock_hz(), clock_hz)?;
        self.twi.init_master(clock);

        #[cfg(feature = "defmt")]
        defmt::info!(
            "twi: master at {} Hz (ckdiv {}, div {})",
            clock.actual_hz(self.twi.master_clock_hz()),
            clock.ckdiv,
            clock.cldiv
        );
        Ok(clock)
    }

    /// Check that a transfer can be expressed on this controller.
    ///
    /// A combined write-then-read sends the written bytes as the internal
    /// address, so together with the low byte of a 10-bit address they must
    /// fit in three bytes.
    pub fn validate(address: u16, num_write: usize, num_read: usize) -> ConfigResult<()> {
        if num_read > 0 && internal_address_len(address, num_write) > MAX_TWI_INTERNAL_ADDRESS_BYTES {
            return Err(ConfigError::TooManyWriteBytes);
        }
        Ok(())
    }

    /// Write `num_write` bytes from `buffer`, then read `num_read` bytes into
    /// it, polling with `timeout`.
    ///
    /// Returns the number of bytes transferred before any failure.
    pub fn transfer(
        &self,
        address: u16,
        buffer: &mut [u8],
        num_write: usize,
        num_read: usize,
        timeout: WaitTimeout,
    ) -> usize {
        self.transfer_with_wait(address, buffer, num_write, num_read, &mut PollWait::new(timeout))
    }

    /// [`transfer`](Self::transfer) with a caller-supplied wait strategy
    pub fn transfer_with_wait<W: StatusWait>(
        &self,
        address: u16,
        buffer: &mut [u8],
        num_write: usize,
        num_read: usize,
        wait: &mut W,
    ) -> usize {
        let num_write = num_write.min(buffer.len());
        let num_read = num_read.min(buffer.len());

        if let Err(_e) = Self::validate(address, num_write, num_read) {
            #[cfg(feature = "defmt")]
            defmt::warn!("twi: {} ({} bytes before read)", _e, num_write);
            return 0;
        }

        let (target, mut iadr, mut ilen) = if address > 0x7F {
            (0x78 | ((address >> 8) as u8 & 0x03), u32::from(address as u8), 1u8)
        } else {
            (address as u8, 0, 0u8)
        };

        if num_read == 0 {
            if num_write == 0 {
                return 0;
            }
            self.twi.set_target(target, false, ilen);
            self.twi.set_internal_address(iadr);
            return self.write_phase(&buffer[..num_write], wait);
        }

        for &byte in &buffer[..num_write] {
            iadr = (iadr << 8) | u32::from(byte);
            ilen += 1;
        }
        self.twi.set_target(target, true, ilen);
        self.twi.set_internal_address(iadr);

        match self.read_phase(&mut buffer[..num_read], wait) {
            0 => 0,
            read => num_write + read,
        }
    }

    /// Read the fault counters, zeroing them if `clear` is set.
    pub fn get_error_counts(&self, clear: bool) -> ErrorCounts {
        self.errors.with(|e| {
            let counts = *e;
            if clear {
                e.clear();
            }
            counts
        })
    }

    fn write_phase<W: StatusWait>(&self, data: &[u8], wait: &mut W) -> usize {
        let last = data.len() - 1;
        for (i, &byte) in data.iter().enumerate() {
            if i == last {
                self.twi.stop();
            }
            self.twi.write_data(byte);
            if !self.wait(wait, TwiStatus::TX_READY, Phase::Send) {
                return i;
            }
        }
        self.wait(wait, TwiStatus::TX_COMPLETE, Phase::Finish);
        data.len()
    }

    fn read_phase<W: StatusWait>(&self, data: &mut [u8], wait: &mut W) -> usize {
        let n = data.len();

        if n == 1 {
            self.twi.start_stop();
            if !self.wait(wait, TwiStatus::RX_READY, Phase::Receive) {
                return 0;
            }
            data[0] = self.twi.read_data();
            self.wait(wait, TwiStatus::TX_COMPLETE, Phase::Finish);
            return 1;
        }

        self.twi.start();
        for (i, slot) in data[..n - 2].iter_mut().enumerate() {
            if !self.wait(wait, TwiStatus::RX_READY, Phase::Receive) {
                return i;
            }
            *slot = self.twi.read_data();
        }

        // STOP has to be requested before the second-to-last byte is taken
        // out of RHR, otherwise the controller clocks in one byte too many.
        if !self.wait(wait, TwiStatus::RX_READY, Phase::Receive) {
            return n - 2;
        }
        self.twi.stop();
        data[n - 2] = self.twi.read_data();

        if !self.wait(wait, TwiStatus::TX_COMPLETE, Phase::Finish) {
            return n - 1;
        }
        data[n - 1] = self.twi.read_data();
        n
    }

    fn wait<W: StatusWait>(&self, wait: &mut W, bits: TwiStatus, phase: Phase) -> bool {
        let status = wait.wait_for(&self.twi, bits);
        if status.contains(bits) {
            return true;
        }
        self.errors.with(|e| {
            if status.contains(TwiStatus::NACK) {
                e.naks += 1;
            } else {
                match phase {
                    Phase::Send => e.send_timeouts += 1,
                    Phase::Receive => e.recv_timeouts += 1,
                    Phase::Finish => e.finish_timeouts += 1,
                }
            }
        });
        false
    }
}

fn internal_address_len(address: u16, num_write: usize) -> usize {
    num_write + usize::from(address > 0x7F)
}
