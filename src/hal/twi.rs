//! TWI (I2C) master capability

use crate::i2c::TwiClock;

/// TWI status flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TwiStatus(pub u32);

impl TwiStatus {
    /// Transfer complete, STOP sent
    pub const TX_COMPLETE: Self = Self(1 << 0);
    /// Receive holding register has a byte
    pub const RX_READY: Self = Self(1 << 1);
    /// Transmit holding register can accept a byte
    pub const TX_READY: Self = Self(1 << 2);
    /// Target did not acknowledge
    pub const NACK: Self = Self(1 << 8);

    /// True when all bits of `other` are set
    #[inline]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// True when any bit of `other` is set
    #[inline]
    pub const fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }
}

impl core::ops::BitOr for TwiStatus {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// Register-level TWI master operations
pub trait TwiRegs {
    /// Master clock feeding the TWI clock generator
    fn master_clock_hz(&self) -> u32;

    /// Enable the peripheral clock, reset, disable slave mode, enable master
    /// mode and program the bus clock
    fn init_master(&self, clock: TwiClock);

    /// Current status flags. Reading may clear latched bits.
    fn status(&self) -> TwiStatus;

    /// Program the target address, direction and number of internal address
    /// bytes for the next transfer
    fn set_target(&self, address: u8, read: bool, internal_address_len: u8);

    /// Program the internal address sent before the data phase
    fn set_internal_address(&self, internal_address: u32);

    /// Request a START condition
    fn start(&self);

    /// Request a STOP condition after the current byte
    fn stop(&self);

    /// Request START and STOP together (single-byte read)
    fn start_stop(&self);

    /// Write the transmit holding register
    fn write_data(&self, byte: u8);

    /// Read the receive holding register
    fn read_data(&self) -> u8;
}
