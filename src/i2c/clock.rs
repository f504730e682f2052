//! TWI bus clock generator settings

use crate::error::{ConfigError, ConfigResult};
use crate::internal::constants::{TWI_MAX_CKDIV, TWI_MAX_CLOCK_HZ};

/// Clock waveform generator settings (CWGR fields)
///
/// SCL low and high periods are both `(div * 2^ckdiv + 4)` master clocks,
/// giving a 50 % duty cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TwiClock {
    /// Clock low divider
    pub cldiv: u8,
    /// Clock high divider
    pub chdiv: u8,
    /// Power-of-two prescaler (0..=7)
    pub ckdiv: u8,
}

impl TwiClock {
    /// Compute settings for `bus_hz` from the master clock.
    ///
    /// # Errors
    ///
    /// [`ConfigError::InvalidClock`] for a zero or above-400 kHz request, or
    /// when the divider would not fit even at the largest prescaler.
    pub fn new(master_clock_hz: u32, bus_hz: u32) -> ConfigResult<Self> {
        if bus_hz == 0 || bus_hz > TWI_MAX_CLOCK_HZ {
            return Err(ConfigError::InvalidClock);
        }

        let mut div = (master_clock_hz / (2 * bus_hz)).saturating_sub(4);
        let mut ckdiv = 0u8;
        while div > 0xFF && u32::from(ckdiv) < TWI_MAX_CKDIV {
            ckdiv += 1;
            div /= 2;
        }
        if div > 0xFF {
            return Err(ConfigError::InvalidClock);
        }

        Ok(Self {
            cldiv: div as u8,
            chdiv: div as u8,
            ckdiv,
        })
    }

    /// Raw CWGR register value
    pub const fn cwgr(&self) -> u32 {
        (self.cldiv as u32) | ((self.chdiv as u32) << 8) | ((self.ckdiv as u32) << 16)
    }

    /// Bus frequency these settings actually produce
    pub const fn actual_hz(&self, master_clock_hz: u32) -> u32 {
        let low = ((self.cldiv as u32) << self.ckdiv) + 4;
        let high = ((self.chdiv as u32) << self.ckdiv) + 4;
        master_clock_hz / (low + high)
    }
}
