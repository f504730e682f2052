//! SAM3X (Cortex-M3, no cache)

use crate::analog::ChannelLayout;
use crate::cache::Cache;
use crate::hal::adc::{AnalogConverter, ChannelSetup};
use crate::hal::cache::{NoCache, NoMpu};
use crate::internal::register::{RegisterBlock, reg_ro, reg_wo};

use super::common::{Pmc, SamSpi, SamTwi, SamUart};

/// Master clock
pub const MASTER_CLOCK_HZ: u32 = 84_000_000;

/// PMC base address
pub const PMC_BASE: usize = 0x400E_0600;

// SAFETY: fixed PMC mapping on SAM3X
const PMC: Pmc = unsafe { Pmc::new(PMC_BASE) };

// =============================================================================
// Peripheral instances
// =============================================================================

/// UART base address
pub const UART_BASE: usize = 0x400E_0800;
/// UART peripheral ID
pub const ID_UART: u8 = 8;
/// SPI0 base address
pub const SPI0_BASE: usize = 0x4000_8000;
/// SPI0 peripheral ID
pub const ID_SPI0: u8 = 24;
/// Chip-select line driven by SPI0; devices use GPIO selects
pub const SPI0_NPCS: u8 = 3;
/// TWI0 base address
pub const TWI0_BASE: usize = 0x4008_C000;
/// TWI0 peripheral ID
pub const ID_TWI0: u8 = 22;
/// ADC base address
pub const ADC_BASE: usize = 0x400C_0000;
/// ADC peripheral ID
pub const ID_ADC: u8 = 37;

/// Serial UART
pub type Uart = SamUart;
/// SPI master used by [`crate::spi::SharedSpi`]
pub type SpiBus = SamSpi<true>;
/// I2C master
pub type Twi = SamTwi;
/// Analog converter
pub type Converter = Adc;
/// Cache controller
pub type CacheCtl = NoCache;
/// Memory protection
pub type Mpu = NoMpu;

impl SamUart {
    /// The single UART
    pub const fn uart0() -> Self {
        // SAFETY: fixed UART mapping on SAM3X
        unsafe { Self::new(UART_BASE, ID_UART, MASTER_CLOCK_HZ, PMC, true) }
    }
}

impl SamSpi<true> {
    /// SPI0
    pub const fn spi0() -> Self {
        // SAFETY: fixed SPI0 mapping on SAM3X
        unsafe { Self::new(SPI0_BASE, ID_SPI0, SPI0_NPCS, MASTER_CLOCK_HZ, PMC) }
    }
}

impl SamTwi {
    /// TWI0
    pub const fn twi0() -> Self {
        // SAFETY: fixed TWI0 mapping on SAM3X
        unsafe { Self::new(TWI0_BASE, ID_TWI0, MASTER_CLOCK_HZ, PMC, true) }
    }
}

/// One 16-channel ADC; the temperature sensor is channel 15
pub const ANALOG_LAYOUT: ChannelLayout = ChannelLayout {
    channels_per_converter: 16,
    populated_channels: 16,
    converters: 1,
    temperature_channel: 15,
    resolution_bits: 12,
};

/// The ADC
pub const fn analog_converters() -> [Converter; 1] {
    [Adc::new()]
}

/// Cache handle; barriers only
pub const fn cache() -> Cache<CacheCtl> {
    Cache::new(NoCache)
}

// =============================================================================
// ADC
// =============================================================================

/// Control Register offset
pub const ADC_CR_OFFSET: usize = 0x00;
/// Mode Register offset
pub const ADC_MR_OFFSET: usize = 0x04;
/// Channel Enable Register offset
pub const ADC_CHER_OFFSET: usize = 0x10;
/// Channel Disable Register offset
pub const ADC_CHDR_OFFSET: usize = 0x14;
/// Interrupt Disable Register offset
pub const ADC_IDR_OFFSET: usize = 0x28;
/// Interrupt Status Register offset
pub const ADC_ISR_OFFSET: usize = 0x30;
/// Analog Control Register offset
pub const ADC_ACR_OFFSET: usize = 0x94;
/// Channel Data Register 0 offset (one word per channel)
pub const ADC_CDR0_OFFSET: usize = 0x50;

/// Software reset
pub const ADC_CR_SWRST: u32 = 1 << 0;
/// Start conversion
pub const ADC_CR_START: u32 = 1 << 1;

/// Prescaler field shift
pub const ADC_MR_PRESCAL_SHIFT: u32 = 8;
/// Start-up time: 768 periods of the ADC clock
pub const ADC_MR_STARTUP_SUT768: u32 = 12 << 16;
/// Settling time: 17 periods
pub const ADC_MR_SETTLING_AST17: u32 = 3 << 20;
/// Tracking time field shift
pub const ADC_MR_TRACKTIM_SHIFT: u32 = 24;
/// Transfer period field shift
pub const ADC_MR_TRANSFER_SHIFT: u32 = 28;

/// Temperature sensor on
pub const ADC_ACR_TSON: u32 = 1 << 4;

/// Lowest ADC clock; conversions run slow for accuracy
pub const ADC_CLOCK_HZ: u32 = 1_000_000;

/// MR value for software-triggered conversions at [`ADC_CLOCK_HZ`]
pub const fn adc_mode_bits(master_clock_hz: u32) -> u32 {
    let prescal = (master_clock_hz / (2 * ADC_CLOCK_HZ)).saturating_sub(1) & 0xFF;
    (prescal << ADC_MR_PRESCAL_SHIFT)
        | ADC_MR_STARTUP_SUT768
        | ADC_MR_SETTLING_AST17
        | (3 << ADC_MR_TRACKTIM_SHIFT)
        | (1 << ADC_MR_TRANSFER_SHIFT)
}

/// 12-bit ADC
///
/// Gain and offset are fixed on this part; [`ChannelSetup`] is ignored.
#[derive(Debug)]
pub struct Adc {
    regs: RegisterBlock,
}

impl Adc {
    /// The single ADC instance
    pub const fn new() -> Self {
        Self {
            // SAFETY: fixed ADC mapping on SAM3X
            regs: unsafe { RegisterBlock::new(ADC_BASE) },
        }
    }

    reg_wo!(write_cr, ADC_CR_OFFSET, "ADC control register");
    reg_ro!(isr, ADC_ISR_OFFSET, "ADC interrupt status register");
}

impl Default for Adc {
    fn default() -> Self {
        Self::new()
    }
}

impl AnalogConverter for Adc {
    fn init(&self) {
        PMC.enable_peripheral(ID_ADC);
        self.write_cr(ADC_CR_SWRST);
        self.regs.write(ADC_MR_OFFSET, adc_mode_bits(MASTER_CLOCK_HZ));
        self.regs.write(ADC_IDR_OFFSET, u32::MAX);
        self.regs.write(ADC_CHDR_OFFSET, 0xFFFF);
    }

    fn configure_channel(&self, _channel: u8, _setup: ChannelSetup) {}

    fn enable_channel(&self, channel: u8) {
        self.regs.write(ADC_CHER_OFFSET, 1 << channel);
    }

    fn disable_channel(&self, channel: u8) {
        self.regs.write(ADC_CHDR_OFFSET, 1 << channel);
    }

    fn enable_temperature_sensor(&self) {
        self.regs.set_bits(ADC_ACR_OFFSET, ADC_ACR_TSON);
    }

    fn start(&self) {
        self.write_cr(ADC_CR_START);
    }

    fn ready_mask(&self) -> u32 {
        self.isr() & 0xFFFF
    }

    fn read(&self, channel: u8) -> u16 {
        (self.regs.read(ADC_CDR0_OFFSET + 4 * usize::from(channel)) & 0x0FFF) as u16
    }
}
