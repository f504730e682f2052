//! Analog Front-End Controller (SAM4E, SAME70)

use crate::hal::adc::{AnalogConverter, ChannelSetup};
use crate::internal::register::{RegisterBlock, reg_ro, reg_wo};

use super::common::Pmc;

// =============================================================================
// Register Offsets
// =============================================================================

/// Control Register offset
pub const AFEC_CR_OFFSET: usize = 0x00;
/// Mode Register offset
pub const AFEC_MR_OFFSET: usize = 0x04;
/// Extended Mode Register offset
pub const AFEC_EMR_OFFSET: usize = 0x08;
/// Channel Enable Register offset
pub const AFEC_CHER_OFFSET: usize = 0x14;
/// Channel Disable Register offset
pub const AFEC_CHDR_OFFSET: usize = 0x18;
/// Interrupt Disable Register offset
pub const AFEC_IDR_OFFSET: usize = 0x28;
/// Interrupt Status Register offset
pub const AFEC_ISR_OFFSET: usize = 0x30;
/// Channel Gain Register offset
pub const AFEC_CGR_OFFSET: usize = 0x54;
/// Channel Selection Register offset
pub const AFEC_CSELR_OFFSET: usize = 0x64;
/// Channel Data Register offset (for the channel in CSELR)
pub const AFEC_CDR_OFFSET: usize = 0x68;
/// Channel Offset Compensation Register offset (for the channel in CSELR)
pub const AFEC_COCR_OFFSET: usize = 0x6C;
/// Temperature Sensor Mode Register offset
pub const AFEC_TEMPMR_OFFSET: usize = 0x70;
/// Analog Control Register offset
pub const AFEC_ACR_OFFSET: usize = 0x94;

// =============================================================================
// Register Bits
// =============================================================================

/// Software reset
pub const AFEC_CR_SWRST: u32 = 1 << 0;
/// Start conversion
pub const AFEC_CR_START: u32 = 1 << 1;
/// Automatic calibration (SAM4E only)
pub const AFEC_CR_AUTOCAL: u32 = 1 << 3;

/// Prescaler field shift
pub const AFEC_MR_PRESCAL_SHIFT: u32 = 8;
/// Start-up time: 64 periods of the AFEC clock
pub const AFEC_MR_STARTUP_SUT64: u32 = 4 << 16;
/// Must be written as one (SAME70)
pub const AFEC_MR_ONE: u32 = 1 << 23;
/// Tracking time field shift
pub const AFEC_MR_TRACKTIM_SHIFT: u32 = 24;
/// Transfer period field shift
pub const AFEC_MR_TRANSFER_SHIFT: u32 = 28;

/// Tag the last converted channel in LCDR
pub const AFEC_EMR_TAG: u32 = 1 << 24;

/// Programmable gain amplifier 0 enable
pub const AFEC_ACR_PGA0EN: u32 = 1 << 2;
/// Programmable gain amplifier 1 enable
pub const AFEC_ACR_PGA1EN: u32 = 1 << 3;
/// Bias current control: nominal
pub const AFEC_ACR_IBCTL_NOMINAL: u32 = 1 << 8;

/// Offset compensation field mask
pub const AFEC_COCR_AOFF_MASK: u32 = 0xFFF;

/// Target AFEC clock
pub const AFEC_CLOCK_HZ: u32 = 6_000_000;

/// CGR gain field for a requested gain (2 bits per channel)
pub const fn gain_bits(gain: u8) -> u32 {
    match gain {
        2 => 1,
        4 => 3,
        _ => 0,
    }
}

/// MR value for software-triggered conversions at [`AFEC_CLOCK_HZ`]
pub const fn mode_bits(master_clock_hz: u32, needs_one: bool) -> u32 {
    let prescal = (master_clock_hz / (2 * AFEC_CLOCK_HZ)).saturating_sub(1) & 0xFF;
    let mut mr = (prescal << AFEC_MR_PRESCAL_SHIFT)
        | AFEC_MR_STARTUP_SUT64
        | (2 << AFEC_MR_TRACKTIM_SHIFT)
        | (2 << AFEC_MR_TRANSFER_SHIFT);
    if needs_one {
        mr |= AFEC_MR_ONE;
    }
    mr
}

/// Silicon revision differences the driver cares about
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AfecKind {
    /// Has AUTOCAL
    Sam4e,
    /// No AUTOCAL; MR bit 23 must be set
    Same70,
}

/// One AFEC instance
#[derive(Debug)]
pub struct Afec {
    regs: RegisterBlock,
    pmc: Pmc,
    id: u8,
    clock_hz: u32,
    kind: AfecKind,
}

impl Afec {
    /// # Safety
    /// `base` and `id` must name the same AFEC instance, and no other handle
    /// may drive it.
    pub const unsafe fn new(base: usize, id: u8, clock_hz: u32, pmc: Pmc, kind: AfecKind) -> Self {
        Self {
            regs: unsafe { RegisterBlock::new(base) },
            pmc,
            id,
            clock_hz,
            kind,
        }
    }

    reg_wo!(write_cr, AFEC_CR_OFFSET, "AFEC control register");
    reg_ro!(isr, AFEC_ISR_OFFSET, "AFEC interrupt status register");

    fn select(&self, channel: u8) {
        self.regs.write(AFEC_CSELR_OFFSET, u32::from(channel));
    }
}

impl AnalogConverter for Afec {
    fn init(&self) {
        self.pmc.enable_peripheral(self.id);
        self.write_cr(AFEC_CR_SWRST);
        self.regs.write(
            AFEC_MR_OFFSET,
            mode_bits(self.clock_hz, self.kind == AfecKind::Same70),
        );
        self.regs.write(AFEC_EMR_OFFSET, AFEC_EMR_TAG);
        self.regs.write(
            AFEC_ACR_OFFSET,
            AFEC_ACR_IBCTL_NOMINAL | AFEC_ACR_PGA0EN | AFEC_ACR_PGA1EN,
        );
        self.regs.write(AFEC_IDR_OFFSET, u32::MAX);
        self.regs.write(AFEC_CHDR_OFFSET, u32::MAX);
    }

    fn configure_channel(&self, channel: u8, setup: ChannelSetup) {
        let shift = 2 * u32::from(channel);
        self.regs.modify(AFEC_CGR_OFFSET, |cgr| {
            (cgr & !(0x3 << shift)) | (gain_bits(setup.gain) << shift)
        });
        critical_section::with(|_| {
            self.select(channel);
            self.regs
                .write(AFEC_COCR_OFFSET, u32::from(setup.offset) & AFEC_COCR_AOFF_MASK);
        });
    }

    fn enable_channel(&self, channel: u8) {
        self.regs.write(AFEC_CHER_OFFSET, 1 << channel);
    }

    fn disable_channel(&self, channel: u8) {
        self.regs.write(AFEC_CHDR_OFFSET, 1 << channel);
    }

    fn enable_temperature_sensor(&self) {
        // powered with its channel; only the comparison trigger needs clearing
        self.regs.write(AFEC_TEMPMR_OFFSET, 0);
    }

    fn calibrate(&self) {
        if self.kind == AfecKind::Sam4e {
            self.write_cr(AFEC_CR_AUTOCAL);
        }
    }

    fn start(&self) {
        self.write_cr(AFEC_CR_START);
    }

    fn ready_mask(&self) -> u32 {
        self.isr() & 0xFFFF
    }

    fn read(&self, channel: u8) -> u16 {
        critical_section::with(|_| {
            self.select(channel);
            (self.regs.read(AFEC_CDR_OFFSET) & 0xFFFF) as u16
        })
    }
}
