//! SPI device descriptor

use embedded_hal::digital::OutputPin;

use crate::error::{BusError, BusResult};
use crate::hal::spi::{SpiMode, SpiSettings, WordSize};
use crate::internal::constants::DEFAULT_SPI_CLOCK_HZ;

/// One logical device on the shared SPI bus
///
/// Owns the device's chip-select pin. Chip select is active low unless
/// [`active_high`](Self::active_high) is used.
///
/// # Example
///
/// ```ignore
/// let mut thermocouple = SpiDevice::new(cs_pin)
///     .with_mode(SpiMode::Mode1)
///     .with_clock_hz(4_000_000);
/// ```
#[derive(Debug)]
pub struct SpiDevice<CS> {
    cs: CS,
    active_high: bool,
    mode: SpiMode,
    word_size: WordSize,
    clock_hz: u32,
}

impl<CS: OutputPin> SpiDevice<CS> {
    /// Mode 0, 8-bit words, default clock, active-low chip select
    pub fn new(cs: CS) -> Self {
        Self {
            cs,
            active_high: false,
            mode: SpiMode::Mode0,
            word_size: WordSize::Eight,
            clock_hz: DEFAULT_SPI_CLOCK_HZ,
        }
    }

    /// Set clock polarity and phase
    #[must_use]
    pub fn with_mode(mut self, mode: SpiMode) -> Self {
        self.mode = mode;
        self
    }

    /// Set the target clock frequency
    #[must_use]
    pub fn with_clock_hz(mut self, clock_hz: u32) -> Self {
        self.clock_hz = clock_hz;
        self
    }

    /// Set bits per transfer. 16 selects 16-bit words; anything else
    /// selects 8.
    #[must_use]
    pub fn with_bits(mut self, bits: u8) -> Self {
        self.word_size = if bits == 16 {
            WordSize::Sixteen
        } else {
            WordSize::Eight
        };
        self
    }

    /// Chip select is asserted high
    #[must_use]
    pub fn active_high(mut self) -> Self {
        self.active_high = true;
        self
    }

    /// Clock polarity and phase
    pub fn mode(&self) -> SpiMode {
        self.mode
    }

    /// Bits per transfer
    pub fn word_size(&self) -> WordSize {
        self.word_size
    }

    /// Target clock in Hz
    pub fn clock_hz(&self) -> u32 {
        self.clock_hz
    }

    /// Whether chip select is asserted high
    pub fn is_active_high(&self) -> bool {
        self.active_high
    }

    /// Settings for the controller
    pub fn settings(&self) -> SpiSettings {
        SpiSettings {
            mode: self.mode,
            word_size: self.word_size,
            clock_hz: self.clock_hz,
        }
    }

    /// Give the pin back
    pub fn release(self) -> CS {
        self.cs
    }

    pub(crate) fn force_word_size(&mut self, word_size: WordSize) {
        self.word_size = word_size;
    }

    pub(crate) fn assert_cs(&mut self) -> BusResult<()> {
        self.drive_cs(self.active_high)
    }

    pub(crate) fn deassert_cs(&mut self) -> BusResult<()> {
        self.drive_cs(!self.active_high)
    }

    fn drive_cs(&mut self, high: bool) -> BusResult<()> {
        let result = if high {
            self.cs.set_high()
        } else {
            self.cs.set_low()
        };
        result.map_err(|_| BusError::ChipSelect)
    }
}

/// SPI-peripheral clock divisor: smallest divisor that does not exceed the
/// requested clock, clamped to the 8-bit SCBR field.
pub fn divisor_ceil(source_hz: u32, clock_hz: u32) -> u8 {
    let clock_hz = clock_hz.max(1);
    source_hz.div_ceil(clock_hz).clamp(1, 255) as u8
}

/// USART-in-SPI-mode divisor: truncating division, clamped like
/// [`divisor_ceil`].
pub fn divisor_floor(source_hz: u32, clock_hz: u32) -> u16 {
    let clock_hz = clock_hz.max(1);
    (source_hz / clock_hz).clamp(1, u32::from(u16::MAX)) as u16
}
