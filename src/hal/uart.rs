//! UART capability
//!
//! The serial driver needs very little from the hardware: a status word, a
//! data register in each direction, interrupt masking, and one-shot
//! configuration. [`UartRegs`] captures exactly that so that the same driver
//! serves every UART instance of every family.

/// Serial frame format (always 8 data bits, 1 stop bit)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SerialMode {
    /// No parity
    #[default]
    Mode8N1,
    /// Even parity
    Mode8E1,
    /// Odd parity
    Mode8O1,
    /// Parity bit forced to 1
    Mode8M1,
    /// Parity bit forced to 0
    Mode8S1,
}

/// UART status / interrupt flags
///
/// The same bit layout is used for the status register and for the
/// interrupt enable/disable registers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct UartFlags(pub u32);

impl UartFlags {
    /// Receive holding register has a byte
    pub const RX_READY: Self = Self(1 << 0);
    /// Transmit holding register can accept a byte
    pub const TX_READY: Self = Self(1 << 1);
    /// Receive overrun
    pub const OVERRUN: Self = Self(1 << 5);
    /// Framing error
    pub const FRAMING: Self = Self(1 << 6);
    /// Transmitter idle, shift register empty
    pub const TX_EMPTY: Self = Self(1 << 9);

    /// No flags
    pub const NONE: Self = Self(0);

    /// Flags enabled while the port is open
    pub const RX_EVENTS: Self = Self(Self::RX_READY.0 | Self::OVERRUN.0 | Self::FRAMING.0);

    /// Every flag the driver uses
    pub const ALL: Self = Self(
        Self::RX_READY.0 | Self::TX_READY.0 | Self::OVERRUN.0 | Self::FRAMING.0 | Self::TX_EMPTY.0,
    );

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

    /// Bitwise union
    #[inline]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }
}

impl core::ops::BitOr for UartFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        self.union(rhs)
    }
}

/// Register-level UART operations
///
/// Implementations are expected to be thin wrappers over the peripheral's
/// registers. All methods take `&self` because the interrupt handler and the
/// foreground share the instance.
pub trait UartRegs {
    /// Peripheral clock feeding the baud-rate generator
    fn peripheral_clock_hz(&self) -> u32;

    /// Enable the peripheral clock in the power manager
    fn enable_clock(&self);

    /// Disable the peripheral clock in the power manager
    fn disable_clock(&self);

    /// Reset and disable receiver and transmitter, stop any PDC transfer
    fn reset(&self);

    /// Program frame format and baud-rate divisor
    fn configure(&self, mode: SerialMode, divisor: u16);

    /// Enable receiver and transmitter
    fn enable(&self);

    /// Current status flags
    fn status(&self) -> UartFlags;

    /// Clear latched overrun/framing status
    fn reset_status(&self);

    /// Read the receive holding register
    fn read_data(&self) -> u8;

    /// Write the transmit holding register
    fn write_data(&self, byte: u8);

    /// Unmask interrupt sources
    fn enable_interrupts(&self, flags: UartFlags);

    /// Mask interrupt sources
    fn disable_interrupts(&self, flags: UartFlags);

    /// Currently unmasked interrupt sources
    fn enabled_interrupts(&self) -> UartFlags;
}
