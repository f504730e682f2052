//! SPI master capability
//!
//! Covers both the dedicated SPI peripheral and a USART running in SPI
//! master mode. The shared-bus driver only polls three status bits and moves
//! words through the data registers; everything family-specific (divisor
//! rounding, phase bit polarity, word sizes) lives behind [`SpiRegs`].

use embedded_hal::spi::{Mode, Phase, Polarity};

/// Clock polarity / phase combination
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SpiMode {
    /// CPOL=0, CPHA=0
    #[default]
    Mode0,
    /// CPOL=0, CPHA=1
    Mode1,
    /// CPOL=1, CPHA=0
    Mode2,
    /// CPOL=1, CPHA=1
    Mode3,
}

impl SpiMode {
    /// Build from the two-bit encoding (bit 1 = CPOL, bit 0 = CPHA)
    pub const fn from_bits(bits: u8) -> Self {
        match bits & 0b11 {
            0 => Self::Mode0,
            1 => Self::Mode1,
            2 => Self::Mode2,
            _ => Self::Mode3,
        }
    }

    /// Clock idles high
    pub const fn cpol(self) -> bool {
        matches!(self, Self::Mode2 | Self::Mode3)
    }

    /// Data captured on the second clock edge
    pub const fn cpha(self) -> bool {
        matches!(self, Self::Mode1 | Self::Mode3)
    }
}

impl From<Mode> for SpiMode {
    fn from(mode: Mode) -> Self {
        let cpol = u8::from(mode.polarity == Polarity::IdleHigh);
        let cpha = u8::from(mode.phase == Phase::CaptureOnSecondTransition);
        Self::from_bits((cpol << 1) | cpha)
    }
}

/// Bits per transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum WordSize {
    /// 8-bit words
    #[default]
    Eight,
    /// 16-bit words
    Sixteen,
}

/// Settings pushed to the controller when a device is configured
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SpiSettings {
    /// Clock polarity and phase
    pub mode: SpiMode,
    /// Word size (already clamped to what the controller supports)
    pub word_size: WordSize,
    /// Requested clock in Hz
    pub clock_hz: u32,
}

/// Register-level SPI master operations
pub trait SpiRegs {
    /// Whether the controller can move 16-bit words
    const SUPPORTS_16_BIT: bool;

    /// Enable clocks, reset the controller and put it in master mode
    fn init_master(&self);

    /// Program mode, divisor and word size for the next device
    fn configure(&self, settings: &SpiSettings);

    /// Transmit data register can take a word
    fn tx_ready(&self) -> bool;

    /// Receive data register holds a word
    fn rx_ready(&self) -> bool;

    /// Shifter idle and transmit register empty
    fn tx_empty(&self) -> bool;

    /// Write one word. `last` marks the final word of a transfer on
    /// controllers that support it.
    fn write_word(&self, word: u16, last: bool);

    /// Read one word
    fn read_word(&self) -> u16;
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_hal::spi::{MODE_0, MODE_1, MODE_2, MODE_3};

    #[test]
    fn mode_bits_follow_two_bit_encoding() {
        for bits in 0..4u8 {
            let mode = SpiMode::from_bits(bits);
            assert_eq!(mode.cpol(), bits & 2 != 0);
            assert_eq!(mode.cpha(), bits & 1 != 0);
        }
    }

    #[test]
    fn mode_from_embedded_hal() {
        assert_eq!(SpiMode::from(MODE_0), SpiMode::Mode0);
        assert_eq!(SpiMode::from(MODE_1), SpiMode::Mode1);
        assert_eq!(SpiMode::from(MODE_2), SpiMode::Mode2);
        assert_eq!(SpiMode::from(MODE_3), SpiMode::Mode3);
    }
}
