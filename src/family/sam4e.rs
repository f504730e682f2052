//! SAM4E (Cortex-M4, CMCC)
//!
//! SPI devices hang off USART0 in SPI master mode; the dedicated SPI block is
//! left to the SD card driver. Analog inputs span AFEC0 (channels 0..16) and
//! AFEC1 (channels 16..32).

use crate::analog::ChannelLayout;
use crate::cache::Cache;
use crate::hal::cache::{CacheController, CachePolicy, NoMpu};
use crate::internal::register::{RegisterBlock, reg_ro, reg_rw, reg_wo};

use super::afec::{Afec, AfecKind};
use super::common::{Pmc, SamTwi, SamUart, UsartSpi};

/// Master clock
pub const MASTER_CLOCK_HZ: u32 = 120_000_000;

/// PMC base address
pub const PMC_BASE: usize = 0x400E_0400;

// SAFETY: fixed PMC mapping on SAM4E
const PMC: Pmc = unsafe { Pmc::new(PMC_BASE) };

// =============================================================================
// Peripheral instances
// =============================================================================

/// UART0 base address
pub const UART0_BASE: usize = 0x400E_0600;
/// UART0 peripheral ID
pub const ID_UART0: u8 = 7;
/// USART0 base address
pub const USART0_BASE: usize = 0x400A_0000;
/// USART0 peripheral ID
pub const ID_USART0: u8 = 14;
/// TWI0 base address
pub const TWI0_BASE: usize = 0x400A_8000;
/// TWI0 peripheral ID
pub const ID_TWI0: u8 = 19;
/// AFEC0 base address
pub const AFEC0_BASE: usize = 0x400B_0000;
/// AFEC0 peripheral ID
pub const ID_AFEC0: u8 = 30;
/// AFEC1 base address
pub const AFEC1_BASE: usize = 0x400B_4000;
/// AFEC1 peripheral ID
pub const ID_AFEC1: u8 = 31;
/// CMCC base address
pub const CMCC_BASE: usize = 0x400C_4000;

/// Serial UART
pub type Uart = SamUart;
/// SPI master used by [`crate::spi::SharedSpi`]
pub type SpiBus = UsartSpi;
/// I2C master
pub type Twi = SamTwi;
/// Analog converter
pub type Converter = Afec;
/// Cache controller
pub type CacheCtl = Cmcc;
/// Memory protection
pub type Mpu = NoMpu;

impl SamUart {
    /// UART0
    pub const fn uart0() -> Self {
        // SAFETY: fixed UART0 mapping on SAM4E
        unsafe { Self::new(UART0_BASE, ID_UART0, MASTER_CLOCK_HZ, PMC, true) }
    }
}

impl UsartSpi {
    /// USART0 as SPI master
    pub const fn spi0() -> Self {
        // SAFETY: fixed USART0 mapping on SAM4E
        unsafe { Self::new(USART0_BASE, ID_USART0, MASTER_CLOCK_HZ, PMC) }
    }
}

impl SamTwi {
    /// TWI0
    pub const fn twi0() -> Self {
        // SAFETY: fixed TWI0 mapping on SAM4E
        unsafe { Self::new(TWI0_BASE, ID_TWI0, MASTER_CLOCK_HZ, PMC, true) }
    }
}

/// Two 16-channel AFECs; the temperature sensor is AFEC0 channel 15
pub const ANALOG_LAYOUT: ChannelLayout = ChannelLayout {
    channels_per_converter: 16,
    populated_channels: 16,
    converters: 2,
    temperature_channel: 15,
    resolution_bits: 12,
};

/// AFEC0 and AFEC1, in logical channel order
pub const fn analog_converters() -> [Converter; 2] {
    // SAFETY: fixed AFEC mappings on SAM4E
    unsafe {
        [
            Afec::new(AFEC0_BASE, ID_AFEC0, MASTER_CLOCK_HZ, PMC, AfecKind::Sam4e),
            Afec::new(AFEC1_BASE, ID_AFEC1, MASTER_CLOCK_HZ, PMC, AfecKind::Sam4e),
        ]
    }
}

/// Cache handle; no MPU regions
pub const fn cache() -> Cache<CacheCtl> {
    Cache::new(Cmcc::new())
}

// =============================================================================
// CMCC
// =============================================================================

/// Control Register offset
pub const CMCC_CTRL_OFFSET: usize = 0x08;
/// Status Register offset
pub const CMCC_SR_OFFSET: usize = 0x0C;
/// Maintenance Register 0 offset
pub const CMCC_MAINT0_OFFSET: usize = 0x20;
/// Monitor Configuration Register offset
pub const CMCC_MCFG_OFFSET: usize = 0x28;
/// Monitor Enable Register offset
pub const CMCC_MEN_OFFSET: usize = 0x2C;
/// Monitor Control Register offset
pub const CMCC_MCTRL_OFFSET: usize = 0x30;
/// Monitor Status Register offset
pub const CMCC_MSR_OFFSET: usize = 0x34;

/// Cache enable
pub const CMCC_CTRL_CEN: u32 = 1 << 0;
/// Cache controller status
pub const CMCC_SR_CSTS: u32 = 1 << 0;
/// Invalidate all lines
pub const CMCC_MAINT0_INVALL: u32 = 1 << 0;
/// Monitor counts data hits
pub const CMCC_MCFG_MODE_DHIT: u32 = 2;
/// Monitor enable
pub const CMCC_MEN_MENABLE: u32 = 1 << 0;
/// Monitor counter reset
pub const CMCC_MCTRL_SWRST: u32 = 1 << 0;

/// Polls of CSTS before giving up on a disable
const CMCC_DISABLE_POLLS: u32 = 1000;

/// Cortex-M cache controller
///
/// Caches reads only, so it is treated as write-through.
#[derive(Debug)]
pub struct Cmcc {
    regs: RegisterBlock,
}

impl Cmcc {
    /// The single CMCC instance
    pub const fn new() -> Self {
        Self {
            // SAFETY: fixed CMCC mapping on SAM4E
            regs: unsafe { RegisterBlock::new(CMCC_BASE) },
        }
    }

    reg_rw!(ctrl, set_ctrl, CMCC_CTRL_OFFSET, "CMCC control register");
    reg_ro!(sr, CMCC_SR_OFFSET, "CMCC status register");
    reg_wo!(write_maint0, CMCC_MAINT0_OFFSET, "CMCC maintenance register 0");
    reg_ro!(msr, CMCC_MSR_OFFSET, "CMCC monitor status register");
}

impl Default for Cmcc {
    fn default() -> Self {
        Self::new()
    }
}

impl CacheController for Cmcc {
    const POLICY: CachePolicy = CachePolicy::WriteThrough;

    fn is_enabled(&self) -> bool {
        self.sr() & CMCC_SR_CSTS != 0
    }

    fn enable(&mut self) {
        self.set_ctrl(CMCC_CTRL_CEN);
    }

    fn disable(&mut self) {
        self.set_ctrl(0);
        for _ in 0..CMCC_DISABLE_POLLS {
            if self.sr() & CMCC_SR_CSTS == 0 {
                return;
            }
        }
        #[cfg(feature = "defmt")]
        defmt::warn!("cmcc: still enabled after disable");
    }

    fn invalidate_all(&mut self) {
        self.write_maint0(CMCC_MAINT0_INVALL);
    }

    fn enable_monitor(&mut self) {
        self.regs.write(CMCC_MCTRL_OFFSET, CMCC_MCTRL_SWRST);
        self.regs.write(CMCC_MCFG_OFFSET, CMCC_MCFG_MODE_DHIT);
        self.regs.write(CMCC_MEN_OFFSET, CMCC_MEN_MENABLE);
    }

    fn hit_count(&self) -> Option<u32> {
        Some(self.msr())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_covers_both_afecs() {
        assert!(ANALOG_LAYOUT.is_valid());
        assert_eq!(ANALOG_LAYOUT.channel_count(), 32);
        assert_eq!(ANALOG_LAYOUT.locate(17), Some((1, 1)));
        assert_eq!(ANALOG_LAYOUT.locate(ANALOG_LAYOUT.temperature_channel), Some((0, 15)));
    }

    #[test]
    fn usart_spi_is_byte_wide() {
        use crate::hal::spi::SpiRegs;
        const { assert!(!<SpiBus as SpiRegs>::SUPPORTS_16_BIT) };
    }
}
