//! SAME70 (Cortex-M7, L1 caches, MPU)
//!
//! The data cache is write-back, so DMA buffers must sit in the single
//! non-cacheable window of [`DEFAULT_REGIONS`]. The linker script places the
//! `.dma` sections there.

use cortex_m::peripheral::SCB;

use crate::analog::ChannelLayout;
use crate::cache::{Cache, MemoryAttributes, MpuRegion};
use crate::hal::cache::{CacheController, CachePolicy};

use super::afec::{Afec, AfecKind};
use super::common::{ArmMpu, Pmc, SamSpi, SamTwi, SamUart};

/// Master clock
pub const MASTER_CLOCK_HZ: u32 = 150_000_000;

/// PMC base address
pub const PMC_BASE: usize = 0x400E_0600;

// SAFETY: fixed PMC mapping on SAME70
const PMC: Pmc = unsafe { Pmc::new(PMC_BASE) };

// =============================================================================
// Peripheral instances
// =============================================================================

/// UART0 base address
pub const UART0_BASE: usize = 0x400E_0800;
/// UART0 peripheral ID
pub const ID_UART0: u8 = 7;
/// UART1 base address
pub const UART1_BASE: usize = 0x400E_0A00;
/// UART1 peripheral ID
pub const ID_UART1: u8 = 8;
/// SPI0 base address
pub const SPI0_BASE: usize = 0x4000_8000;
/// SPI0 peripheral ID
pub const ID_SPI0: u8 = 21;
/// Chip-select line driven by SPI0; devices use GPIO selects
pub const SPI0_NPCS: u8 = 2;
/// TWIHS0 base address
pub const TWIHS0_BASE: usize = 0x4001_8000;
/// TWIHS0 peripheral ID
pub const ID_TWIHS0: u8 = 19;
/// AFEC0 base address
pub const AFEC0_BASE: usize = 0x4003_C000;
/// AFEC0 peripheral ID
pub const ID_AFEC0: u8 = 29;
/// AFEC1 base address
pub const AFEC1_BASE: usize = 0x4006_4000;
/// AFEC1 peripheral ID
pub const ID_AFEC1: u8 = 40;

/// Serial UART
pub type Uart = SamUart;
/// SPI master used by [`crate::spi::SharedSpi`]
pub type SpiBus = SamSpi<false>;
/// I2C master (TWIHS, register compatible with TWI)
pub type Twi = SamTwi;
/// Analog converter
pub type Converter = Afec;
/// Cache controller
pub type CacheCtl = CoreCache;
/// Memory protection
pub type Mpu = ArmMpu;

impl SamUart {
    /// UART0
    pub const fn uart0() -> Self {
        // SAFETY: fixed UART0 mapping on SAME70
        unsafe { Self::new(UART0_BASE, ID_UART0, MASTER_CLOCK_HZ, PMC, false) }
    }

    /// UART1
    pub const fn uart1() -> Self {
        // SAFETY: fixed UART1 mapping on SAME70
        unsafe { Self::new(UART1_BASE, ID_UART1, MASTER_CLOCK_HZ, PMC, false) }
    }
}

impl SamSpi<false> {
    /// SPI0
    pub const fn spi0() -> Self {
        // SAFETY: fixed SPI0 mapping on SAME70
        unsafe { Self::new(SPI0_BASE, ID_SPI0, SPI0_NPCS, MASTER_CLOCK_HZ, PMC) }
    }
}

impl SamTwi {
    /// TWIHS0
    pub const fn twi0() -> Self {
        // SAFETY: fixed TWIHS0 mapping on SAME70
        unsafe { Self::new(TWIHS0_BASE, ID_TWIHS0, MASTER_CLOCK_HZ, PMC, false) }
    }
}

/// Two 12-channel AFECs numbered in blocks of 16, so AFEC1 starts at
/// logical channel 16 as on SAM4E; the temperature sensor is AFEC1 channel 11
pub const ANALOG_LAYOUT: ChannelLayout = ChannelLayout {
    channels_per_converter: 16,
    populated_channels: 12,
    converters: 2,
    temperature_channel: 27,
    resolution_bits: 12,
};

/// AFEC0 and AFEC1, in logical channel order
pub const fn analog_converters() -> [Converter; 2] {
    // SAFETY: fixed AFEC mappings on SAME70
    unsafe {
        [
            Afec::new(AFEC0_BASE, ID_AFEC0, MASTER_CLOCK_HZ, PMC, AfecKind::Same70),
            Afec::new(AFEC1_BASE, ID_AFEC1, MASTER_CLOCK_HZ, PMC, AfecKind::Same70),
        ]
    }
}

// =============================================================================
// Memory map
// =============================================================================

/// Base of the non-cacheable DMA window
pub const DMA_WINDOW_BASE: u32 = 0x2040_0000;
/// Size of the non-cacheable DMA window
pub const DMA_WINDOW_SIZE: u32 = 64 * 1024;

/// Region table applied by [`cache`]
///
/// Later entries win where regions overlap.
pub static DEFAULT_REGIONS: [MpuRegion; 10] = [
    // internal flash
    MpuRegion::new(0x0040_0000, 1024 * 1024, MemoryAttributes::WriteBackWriteAllocate)
        .read_only()
        .executable(),
    // flash page buffer, written when programming
    MpuRegion::new(0x0040_0000, 512, MemoryAttributes::WriteThroughNoWriteAllocate).executable(),
    // SRAM
    MpuRegion::new(0x2040_0000, 256 * 1024, MemoryAttributes::WriteBackWriteAllocate),
    MpuRegion::new(
        DMA_WINDOW_BASE,
        DMA_WINDOW_SIZE,
        MemoryAttributes::NonCacheable { shareable: true },
    ),
    // RAM functions
    MpuRegion::new(0x2041_0000, 256, MemoryAttributes::WriteBackWriteAllocate).executable(),
    // SRAM, upper 128K
    MpuRegion::new(0x2044_0000, 128 * 1024, MemoryAttributes::WriteBackWriteAllocate),
    // peripherals
    MpuRegion::new(0x4000_0000, 16 * 1024 * 1024, MemoryAttributes::Device),
    // USBHS RAM
    MpuRegion::new(0xA010_0000, 1024 * 1024, MemoryAttributes::Device).executable(),
    // ROM
    MpuRegion::new(0x0080_0000, 4 * 1024 * 1024, MemoryAttributes::WriteThroughNoWriteAllocate)
        .read_only()
        .executable(),
    // private peripheral bus
    MpuRegion::new(0xE000_0000, 1024 * 1024, MemoryAttributes::StronglyOrdered),
];

/// Cache handle with the default region table
pub fn cache() -> Cache<CacheCtl, Mpu> {
    // SAFETY: the cache handle is the only MPU owner
    let mpu = unsafe { ArmMpu::steal() };
    Cache::with_mpu(CoreCache::new(), mpu, &DEFAULT_REGIONS)
}

// =============================================================================
// Cortex-M7 L1 caches
// =============================================================================

/// Instruction and data caches, toggled together
#[derive(Debug, Default)]
pub struct CoreCache {
    _private: (),
}

impl CoreCache {
    /// Handle to the core's caches
    pub const fn new() -> Self {
        Self { _private: () }
    }

    fn with_scb<R>(f: impl FnOnce(&mut SCB, &mut cortex_m::peripheral::CPUID) -> R) -> R {
        // SAFETY: the caller holds `&mut CoreCache`, the only cache owner
        let mut p = unsafe { cortex_m::Peripherals::steal() };
        f(&mut p.SCB, &mut p.CPUID)
    }
}

impl CacheController for CoreCache {
    const POLICY: CachePolicy = CachePolicy::WriteBack;

    fn is_enabled(&self) -> bool {
        SCB::dcache_enabled()
    }

    fn enable(&mut self) {
        Self::with_scb(|scb, cpuid| {
            scb.enable_icache();
            scb.enable_dcache(cpuid);
        });
    }

    fn disable(&mut self) {
        Self::with_scb(|scb, cpuid| {
            scb.disable_dcache(cpuid);
            scb.disable_icache();
        });
    }

    fn invalidate_all(&mut self) {
        Self::with_scb(|scb, cpuid| {
            scb.clean_invalidate_dcache(cpuid);
            scb.invalidate_icache();
        });
    }
}
