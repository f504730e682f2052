//! Register blocks shared by every SAM family
//!
//! UART, SPI, USART (in SPI master mode) and TWI have the same register
//! layout on SAM3X, SAM4E and SAME70. Only base addresses, peripheral IDs and
//! clocks differ; those come from the family module.

use cortex_m::interrupt::InterruptNumber;
use cortex_m::peripheral::{MPU, NVIC};

use crate::hal::cache::MemoryProtection;
use crate::hal::irq::InterruptLine;
use crate::hal::spi::{SpiMode, SpiRegs, SpiSettings, WordSize};
use crate::hal::twi::{TwiRegs, TwiStatus};
use crate::hal::uart::{SerialMode, UartFlags, UartRegs};
use crate::i2c::TwiClock;
use crate::internal::constants::{MPU_REGION_SLOTS, NVIC_PRIORITY_BITS};
use crate::internal::register::{RegisterBlock, reg_ro, reg_rw, reg_wo};
use crate::spi::{divisor_ceil, divisor_floor};

// =============================================================================
// PMC
// =============================================================================

/// Peripheral Clock Enable Register 0 offset
pub const PMC_PCER0_OFFSET: usize = 0x10;
/// Peripheral Clock Disable Register 0 offset
pub const PMC_PCDR0_OFFSET: usize = 0x14;
/// Peripheral Clock Status Register 0 offset
pub const PMC_PCSR0_OFFSET: usize = 0x18;
/// Peripheral Clock Enable Register 1 offset
pub const PMC_PCER1_OFFSET: usize = 0x100;
/// Peripheral Clock Disable Register 1 offset
pub const PMC_PCDR1_OFFSET: usize = 0x104;
/// Peripheral Clock Status Register 1 offset
pub const PMC_PCSR1_OFFSET: usize = 0x108;

/// Power management controller: peripheral clock gates
#[derive(Debug, Clone, Copy)]
pub struct Pmc {
    regs: RegisterBlock,
}

impl Pmc {
    /// # Safety
    /// `base` must be the PMC of the running part.
    pub const unsafe fn new(base: usize) -> Self {
        Self {
            regs: unsafe { RegisterBlock::new(base) },
        }
    }

    /// Clock gate register offsets (enable, disable, status) and bit for
    /// peripheral `id`
    pub const fn gate(id: u8) -> (usize, usize, usize, u32) {
        if id < 32 {
            (PMC_PCER0_OFFSET, PMC_PCDR0_OFFSET, PMC_PCSR0_OFFSET, 1 << id)
        } else {
            (PMC_PCER1_OFFSET, PMC_PCDR1_OFFSET, PMC_PCSR1_OFFSET, 1 << (id - 32))
        }
    }

    /// Start the clock of peripheral `id`
    pub fn enable_peripheral(&self, id: u8) {
        let (enable, _, _, bit) = Self::gate(id);
        self.regs.write(enable, bit);
    }

    /// Stop the clock of peripheral `id`
    pub fn disable_peripheral(&self, id: u8) {
        let (_, disable, _, bit) = Self::gate(id);
        self.regs.write(disable, bit);
    }

    /// Whether the clock of peripheral `id` runs
    pub fn is_enabled(&self, id: u8) -> bool {
        let (_, _, status, bit) = Self::gate(id);
        self.regs.bits_set(status, bit)
    }
}

// =============================================================================
// NVIC line
// =============================================================================

/// NVIC interrupt number. On SAM parts this equals the peripheral ID.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Irq(pub u16);

// SAFETY: every `Irq` built by the family modules is a valid vector number
unsafe impl InterruptNumber for Irq {
    fn number(self) -> u16 {
        self.0
    }
}

impl Irq {
    /// Unmask the line
    pub fn enable(self) {
        // SAFETY: the owning driver installs its handler before unmasking
        unsafe { NVIC::unmask(self) }
    }

    /// Mask the line
    pub fn disable(self) {
        NVIC::mask(self);
    }

    /// Set priority; only the top [`NVIC_PRIORITY_BITS`] are implemented
    pub fn set_priority(self, priority: u8) {
        let shift = 8 - NVIC_PRIORITY_BITS;
        // SAFETY: single byte write to this line's IPR slot
        unsafe {
            let nvic = &*NVIC::PTR;
            nvic.ipr[usize::from(self.0)].write(priority << shift);
        }
    }

    /// Current priority
    pub fn priority(self) -> u8 {
        NVIC::get_priority(self) >> (8 - NVIC_PRIORITY_BITS)
    }
}

// =============================================================================
// UART
// =============================================================================

/// Control Register offset
pub const UART_CR_OFFSET: usize = 0x00;
/// Mode Register offset
pub const UART_MR_OFFSET: usize = 0x04;
/// Interrupt Enable Register offset
pub const UART_IER_OFFSET: usize = 0x08;
/// Interrupt Disable Register offset
pub const UART_IDR_OFFSET: usize = 0x0C;
/// Interrupt Mask Register offset
pub const UART_IMR_OFFSET: usize = 0x10;
/// Status Register offset
pub const UART_SR_OFFSET: usize = 0x14;
/// Receive Holding Register offset
pub const UART_RHR_OFFSET: usize = 0x18;
/// Transmit Holding Register offset
pub const UART_THR_OFFSET: usize = 0x1C;
/// Baud Rate Generator Register offset
pub const UART_BRGR_OFFSET: usize = 0x20;
/// PDC Transfer Control Register offset
pub const PDC_PTCR_OFFSET: usize = 0x120;

/// Reset receiver
pub const UART_CR_RSTRX: u32 = 1 << 2;
/// Reset transmitter
pub const UART_CR_RSTTX: u32 = 1 << 3;
/// Receiver enable
pub const UART_CR_RXEN: u32 = 1 << 4;
/// Receiver disable
pub const UART_CR_RXDIS: u32 = 1 << 5;
/// Transmitter enable
pub const UART_CR_TXEN: u32 = 1 << 6;
/// Transmitter disable
pub const UART_CR_TXDIS: u32 = 1 << 7;
/// Reset status bits (OVRE, FRAME, PARE)
pub const UART_CR_RSTSTA: u32 = 1 << 8;

/// Parity field shift in MR
pub const UART_MR_PAR_SHIFT: u32 = 9;
/// Even parity
pub const UART_MR_PAR_EVEN: u32 = 0 << UART_MR_PAR_SHIFT;
/// Odd parity
pub const UART_MR_PAR_ODD: u32 = 1 << UART_MR_PAR_SHIFT;
/// Parity forced to 0
pub const UART_MR_PAR_SPACE: u32 = 2 << UART_MR_PAR_SHIFT;
/// Parity forced to 1
pub const UART_MR_PAR_MARK: u32 = 3 << UART_MR_PAR_SHIFT;
/// No parity
pub const UART_MR_PAR_NO: u32 = 4 << UART_MR_PAR_SHIFT;

/// PDC receiver transfer disable
pub const PDC_PTCR_RXTDIS: u32 = 1 << 1;
/// PDC transmitter transfer disable
pub const PDC_PTCR_TXTDIS: u32 = 1 << 9;

/// MR value for a frame format (normal channel mode)
pub const fn uart_mode_bits(mode: SerialMode) -> u32 {
    match mode {
        SerialMode::Mode8N1 => UART_MR_PAR_NO,
        SerialMode::Mode8E1 => UART_MR_PAR_EVEN,
        SerialMode::Mode8O1 => UART_MR_PAR_ODD,
        SerialMode::Mode8M1 => UART_MR_PAR_MARK,
        SerialMode::Mode8S1 => UART_MR_PAR_SPACE,
    }
}

/// One UART instance
///
/// Status bits in SR line up with [`UartFlags`], so flags pass through
/// unchanged.
#[derive(Debug)]
pub struct SamUart {
    regs: RegisterBlock,
    pmc: Pmc,
    id: u8,
    clock_hz: u32,
    has_pdc: bool,
}

impl SamUart {
    /// # Safety
    /// `base` and `id` must name the same UART instance, and no other handle
    /// may drive it.
    pub const unsafe fn new(base: usize, id: u8, clock_hz: u32, pmc: Pmc, has_pdc: bool) -> Self {
        Self {
            regs: unsafe { RegisterBlock::new(base) },
            pmc,
            id,
            clock_hz,
            has_pdc,
        }
    }

    /// Override the peripheral clock used for baud-rate calculation
    #[must_use]
    pub const fn with_clock_hz(mut self, clock_hz: u32) -> Self {
        self.clock_hz = clock_hz;
        self
    }

    reg_wo!(write_cr, UART_CR_OFFSET, "UART control register");
    reg_rw!(mode, set_mode, UART_MR_OFFSET, "UART mode register");
    reg_ro!(sr, UART_SR_OFFSET, "UART status register");
    reg_ro!(imr, UART_IMR_OFFSET, "UART interrupt mask register");
    reg_rw!(brgr, set_brgr, UART_BRGR_OFFSET, "UART baud rate generator");
}

impl UartRegs for SamUart {
    fn peripheral_clock_hz(&self) -> u32 {
        self.clock_hz
    }

    fn enable_clock(&self) {
        self.pmc.enable_peripheral(self.id);
    }

    fn disable_clock(&self) {
        self.pmc.disable_peripheral(self.id);
    }

    fn reset(&self) {
        if self.has_pdc {
            self.regs.write(PDC_PTCR_OFFSET, PDC_PTCR_RXTDIS | PDC_PTCR_TXTDIS);
        }
        self.write_cr(UART_CR_RSTRX | UART_CR_RSTTX | UART_CR_RXDIS | UART_CR_TXDIS);
    }

    fn configure(&self, mode: SerialMode, divisor: u16) {
        self.set_mode(uart_mode_bits(mode));
        self.set_brgr(u32::from(divisor));
    }

    fn enable(&self) {
        self.write_cr(UART_CR_RXEN | UART_CR_TXEN);
    }

    fn status(&self) -> UartFlags {
        UartFlags(self.sr())
    }

    fn reset_status(&self) {
        self.write_cr(UART_CR_RSTSTA);
    }

    fn read_data(&self) -> u8 {
        self.regs.read(UART_RHR_OFFSET) as u8
    }

    fn write_data(&self, byte: u8) {
        self.regs.write(UART_THR_OFFSET, u32::from(byte));
    }

    fn enable_interrupts(&self, flags: UartFlags) {
        self.regs.write(UART_IER_OFFSET, flags.0);
    }

    fn disable_interrupts(&self, flags: UartFlags) {
        self.regs.write(UART_IDR_OFFSET, flags.0);
    }

    fn enabled_interrupts(&self) -> UartFlags {
        UartFlags(self.imr())
    }
}

impl InterruptLine for SamUart {
    fn enable_irq(&self) {
        Irq(u16::from(self.id)).enable();
    }

    fn disable_irq(&self) {
        Irq(u16::from(self.id)).disable();
    }

    fn set_priority(&self, priority: u8) {
        Irq(u16::from(self.id)).set_priority(priority);
    }

    fn priority(&self) -> u8 {
        Irq(u16::from(self.id)).priority()
    }
}

// =============================================================================
// SPI peripheral
// =============================================================================

/// Control Register offset
pub const SPI_CR_OFFSET: usize = 0x00;
/// Mode Register offset
pub const SPI_MR_OFFSET: usize = 0x04;
/// Receive Data Register offset
pub const SPI_RDR_OFFSET: usize = 0x08;
/// Transmit Data Register offset
pub const SPI_TDR_OFFSET: usize = 0x0C;
/// Status Register offset
pub const SPI_SR_OFFSET: usize = 0x10;
/// Interrupt Disable Register offset
pub const SPI_IDR_OFFSET: usize = 0x18;
/// Chip Select Register 0 offset (one word per NPCS line)
pub const SPI_CSR0_OFFSET: usize = 0x30;

/// SPI enable
pub const SPI_CR_SPIEN: u32 = 1 << 0;
/// SPI disable
pub const SPI_CR_SPIDIS: u32 = 1 << 1;
/// Software reset
pub const SPI_CR_SWRST: u32 = 1 << 7;
/// Release chip select after the current transfer
pub const SPI_CR_LASTXFER: u32 = 1 << 24;

/// Master mode
pub const SPI_MR_MSTR: u32 = 1 << 0;
/// Mode fault detection disabled
pub const SPI_MR_MODFDIS: u32 = 1 << 4;
/// Peripheral chip select field shift
pub const SPI_MR_PCS_SHIFT: u32 = 16;

/// Receive data register full
pub const SPI_SR_RDRF: u32 = 1 << 0;
/// Transmit data register empty
pub const SPI_SR_TDRE: u32 = 1 << 1;
/// Shifter and TDR empty
pub const SPI_SR_TXEMPTY: u32 = 1 << 9;

/// Clock polarity
pub const SPI_CSR_CPOL: u32 = 1 << 0;
/// Clock phase (data captured on the leading edge when set)
pub const SPI_CSR_NCPHA: u32 = 1 << 1;
/// Bits per transfer field shift (0 = 8 bits, 8 = 16 bits)
pub const SPI_CSR_BITS_SHIFT: u32 = 4;
/// Serial clock divisor field shift
pub const SPI_CSR_SCBR_SHIFT: u32 = 8;

/// MR value: master, no mode fault, fixed select of `npcs`
pub const fn spi_mode_bits(npcs: u8) -> u32 {
    let pcs = !(1u32 << npcs) & 0x0F;
    SPI_MR_MSTR | SPI_MR_MODFDIS | (pcs << SPI_MR_PCS_SHIFT)
}

/// CSR value for a device
///
/// The hardware phase bit is inverted relative to CPHA.
pub fn spi_csr_bits(settings: &SpiSettings, master_clock_hz: u32) -> u32 {
    let bits = match settings.word_size {
        WordSize::Eight => 0,
        WordSize::Sixteen => 8,
    };
    let mut csr = (u32::from(divisor_ceil(master_clock_hz, settings.clock_hz)) << SPI_CSR_SCBR_SHIFT)
        | (bits << SPI_CSR_BITS_SHIFT);
    if !settings.mode.cpha() {
        csr |= SPI_CSR_NCPHA;
    }
    if settings.mode.cpol() {
        csr |= SPI_CSR_CPOL;
    }
    csr
}

/// SPI peripheral driving one fixed chip-select line
///
/// `WIDE` enables 16-bit words.
#[derive(Debug)]
pub struct SamSpi<const WIDE: bool> {
    regs: RegisterBlock,
    pmc: Pmc,
    id: u8,
    npcs: u8,
    clock_hz: u32,
}

impl<const WIDE: bool> SamSpi<WIDE> {
    /// # Safety
    /// `base` and `id` must name the same SPI instance, and no other handle
    /// may drive it.
    pub const unsafe fn new(base: usize, id: u8, npcs: u8, clock_hz: u32, pmc: Pmc) -> Self {
        Self {
            regs: unsafe { RegisterBlock::new(base) },
            pmc,
            id,
            npcs,
            clock_hz,
        }
    }

    reg_wo!(write_cr, SPI_CR_OFFSET, "SPI control register");
    reg_rw!(mode, set_mode, SPI_MR_OFFSET, "SPI mode register");
    reg_ro!(sr, SPI_SR_OFFSET, "SPI status register");

    fn csr_offset(&self) -> usize {
        SPI_CSR0_OFFSET + 4 * usize::from(self.npcs)
    }
}

impl<const WIDE: bool> SpiRegs for SamSpi<WIDE> {
    const SUPPORTS_16_BIT: bool = WIDE;

    fn init_master(&self) {
        self.pmc.enable_peripheral(self.id);
        self.write_cr(SPI_CR_SPIDIS);
        self.write_cr(SPI_CR_SWRST);
        self.regs.write(SPI_IDR_OFFSET, u32::MAX);
        self.set_mode(spi_mode_bits(self.npcs));
        self.write_cr(SPI_CR_SPIEN);
    }

    fn configure(&self, settings: &SpiSettings) {
        self.set_mode(spi_mode_bits(self.npcs));
        self.regs.write(self.csr_offset(), spi_csr_bits(settings, self.clock_hz));
    }

    fn tx_ready(&self) -> bool {
        self.sr() & SPI_SR_TDRE != 0
    }

    fn rx_ready(&self) -> bool {
        self.sr() & SPI_SR_RDRF != 0
    }

    fn tx_empty(&self) -> bool {
        self.sr() & SPI_SR_TXEMPTY != 0
    }

    fn write_word(&self, word: u16, last: bool) {
        if last {
            self.write_cr(SPI_CR_LASTXFER);
        }
        self.regs.write(SPI_TDR_OFFSET, u32::from(word));
    }

    fn read_word(&self) -> u16 {
        self.regs.read(SPI_RDR_OFFSET) as u16
    }
}

// =============================================================================
// USART in SPI master mode
// =============================================================================

/// Control Register offset
pub const US_CR_OFFSET: usize = 0x00;
/// Mode Register offset
pub const US_MR_OFFSET: usize = 0x04;
/// Interrupt Disable Register offset
pub const US_IDR_OFFSET: usize = 0x0C;
/// Channel Status Register offset
pub const US_CSR_OFFSET: usize = 0x14;
/// Receive Holding Register offset
pub const US_RHR_OFFSET: usize = 0x18;
/// Transmit Holding Register offset
pub const US_THR_OFFSET: usize = 0x1C;
/// Baud Rate Generator Register offset
pub const US_BRGR_OFFSET: usize = 0x20;

/// SPI master mode
pub const US_MR_MODE_SPI_MASTER: u32 = 0xE;
/// 8-bit characters
pub const US_MR_CHRL_8: u32 = 3 << 6;
/// Clock phase (set for CPHA = 0)
pub const US_MR_CPHA: u32 = 1 << 8;
/// Clock polarity
pub const US_MR_CPOL: u32 = 1 << 16;
/// Drive SCK
pub const US_MR_CLKO: u32 = 1 << 18;

/// Receiver ready
pub const US_CSR_RXRDY: u32 = 1 << 0;
/// Transmitter ready
pub const US_CSR_TXRDY: u32 = 1 << 1;
/// Transmitter empty
pub const US_CSR_TXEMPTY: u32 = 1 << 9;

/// MR value for a mode; the hardware phase bit is inverted relative to CPHA
pub const fn usart_spi_mode_bits(mode: SpiMode) -> u32 {
    let mut mr = US_MR_MODE_SPI_MASTER | US_MR_CHRL_8 | US_MR_CLKO;
    if !mode.cpha() {
        mr |= US_MR_CPHA;
    }
    if mode.cpol() {
        mr |= US_MR_CPOL;
    }
    mr
}

/// USART running as an 8-bit SPI master
#[derive(Debug)]
pub struct UsartSpi {
    regs: RegisterBlock,
    pmc: Pmc,
    id: u8,
    clock_hz: u32,
}

impl UsartSpi {
    /// # Safety
    /// `base` and `id` must name the same USART instance, and no other handle
    /// may drive it.
    pub const unsafe fn new(base: usize, id: u8, clock_hz: u32, pmc: Pmc) -> Self {
        Self {
            regs: unsafe { RegisterBlock::new(base) },
            pmc,
            id,
            clock_hz,
        }
    }

    reg_wo!(write_cr, US_CR_OFFSET, "USART control register");
    reg_ro!(csr, US_CSR_OFFSET, "USART channel status register");
}

impl SpiRegs for UsartSpi {
    const SUPPORTS_16_BIT: bool = false;

    fn init_master(&self) {
        self.pmc.enable_peripheral(self.id);
        self.write_cr(UART_CR_RSTRX | UART_CR_RSTTX | UART_CR_RXDIS | UART_CR_TXDIS);
        self.regs.write(US_IDR_OFFSET, u32::MAX);
        self.regs.write(US_MR_OFFSET, usart_spi_mode_bits(SpiMode::Mode0));
        self.write_cr(UART_CR_RXEN | UART_CR_TXEN);
    }

    fn configure(&self, settings: &SpiSettings) {
        self.regs.write(US_MR_OFFSET, usart_spi_mode_bits(settings.mode));
        self.regs.write(
            US_BRGR_OFFSET,
            u32::from(divisor_floor(self.clock_hz, settings.clock_hz)),
        );
        self.write_cr(UART_CR_RXEN | UART_CR_TXEN);
    }

    fn tx_ready(&self) -> bool {
        self.csr() & US_CSR_TXRDY != 0
    }

    fn rx_ready(&self) -> bool {
        self.csr() & US_CSR_RXRDY != 0
    }

    fn tx_empty(&self) -> bool {
        self.csr() & US_CSR_TXEMPTY != 0
    }

    fn write_word(&self, word: u16, _last: bool) {
        self.regs.write(US_THR_OFFSET, u32::from(word & 0xFF));
    }

    fn read_word(&self) -> u16 {
        (self.regs.read(US_RHR_OFFSET) & 0xFF) as u16
    }
}

// =============================================================================
// TWI
// =============================================================================

/// Control Register offset
pub const TWI_CR_OFFSET: usize = 0x00;
/// Master Mode Register offset
pub const TWI_MMR_OFFSET: usize = 0x04;
/// Internal Address Register offset
pub const TWI_IADR_OFFSET: usize = 0x0C;
/// Clock Waveform Generator Register offset
pub const TWI_CWGR_OFFSET: usize = 0x10;
/// Status Register offset
pub const TWI_SR_OFFSET: usize = 0x20;
/// Interrupt Disable Register offset
pub const TWI_IDR_OFFSET: usize = 0x28;
/// Receive Holding Register offset
pub const TWI_RHR_OFFSET: usize = 0x30;
/// Transmit Holding Register offset
pub const TWI_THR_OFFSET: usize = 0x34;

/// Send a START condition
pub const TWI_CR_START: u32 = 1 << 0;
/// Send a STOP condition
pub const TWI_CR_STOP: u32 = 1 << 1;
/// Master mode enable
pub const TWI_CR_MSEN: u32 = 1 << 2;
/// Master mode disable
pub const TWI_CR_MSDIS: u32 = 1 << 3;
/// Slave mode disable
pub const TWI_CR_SVDIS: u32 = 1 << 5;
/// Software reset
pub const TWI_CR_SWRST: u32 = 1 << 7;

/// Internal address size field shift
pub const TWI_MMR_IADRSZ_SHIFT: u32 = 8;
/// Master read direction
pub const TWI_MMR_MREAD: u32 = 1 << 12;
/// Device address field shift
pub const TWI_MMR_DADR_SHIFT: u32 = 16;

/// MMR value for a transfer
pub const fn twi_master_mode_bits(address: u8, read: bool, internal_address_len: u8) -> u32 {
    let mut mmr = ((internal_address_len as u32 & 0x3) << TWI_MMR_IADRSZ_SHIFT)
        | ((address as u32 & 0x7F) << TWI_MMR_DADR_SHIFT);
    if read {
        mmr |= TWI_MMR_MREAD;
    }
    mmr
}

/// One TWI instance in master mode
///
/// SR bit positions line up with [`TwiStatus`].
#[derive(Debug)]
pub struct SamTwi {
    regs: RegisterBlock,
    pmc: Pmc,
    id: u8,
    clock_hz: u32,
    has_pdc: bool,
}

impl SamTwi {
    /// # Safety
    /// `base` and `id` must name the same TWI instance, and no other handle
    /// may drive it.
    pub const unsafe fn new(base: usize, id: u8, clock_hz: u32, pmc: Pmc, has_pdc: bool) -> Self {
        Self {
            regs: unsafe { RegisterBlock::new(base) },
            pmc,
            id,
            clock_hz,
            has_pdc,
        }
    }

    reg_wo!(write_cr, TWI_CR_OFFSET, "TWI control register");
    reg_rw!(master_mode, set_master_mode, TWI_MMR_OFFSET, "TWI master mode register");
    reg_rw!(internal_address, set_iadr, TWI_IADR_OFFSET, "TWI internal address register");
    reg_rw!(clock_waveform, set_clock_waveform, TWI_CWGR_OFFSET, "TWI clock waveform generator");
}

impl TwiRegs for SamTwi {
    fn master_clock_hz(&self) -> u32 {
        self.clock_hz
    }

    fn init_master(&self, clock: TwiClock) {
        self.pmc.enable_peripheral(self.id);
        if self.has_pdc {
            self.regs.write(PDC_PTCR_OFFSET, PDC_PTCR_RXTDIS | PDC_PTCR_TXTDIS);
        }
        self.regs.write(TWI_IDR_OFFSET, u32::MAX);
        let _ = self.regs.read(TWI_SR_OFFSET);
        self.write_cr(TWI_CR_SWRST);
        let _ = self.regs.read(TWI_RHR_OFFSET);
        self.write_cr(TWI_CR_MSDIS | TWI_CR_SVDIS);
        self.write_cr(TWI_CR_MSEN);
        self.set_clock_waveform(clock.cwgr());
    }

    fn status(&self) -> TwiStatus {
        TwiStatus(self.regs.read(TWI_SR_OFFSET))
    }

    fn set_target(&self, address: u8, read: bool, internal_address_len: u8) {
        self.set_master_mode(0);
        self.set_master_mode(twi_master_mode_bits(address, read, internal_address_len));
    }

    fn set_internal_address(&self, internal_address: u32) {
        self.set_iadr(0);
        self.set_iadr(internal_address & 0x00FF_FFFF);
    }

    fn start(&self) {
        self.write_cr(TWI_CR_START);
    }

    fn stop(&self) {
        self.write_cr(TWI_CR_STOP);
    }

    fn start_stop(&self) {
        self.write_cr(TWI_CR_START | TWI_CR_STOP);
    }

    fn write_data(&self, byte: u8) {
        self.regs.write(TWI_THR_OFFSET, u32::from(byte));
    }

    fn read_data(&self) -> u8 {
        self.regs.read(TWI_RHR_OFFSET) as u8
    }
}

// =============================================================================
// ARMv7-M MPU
// =============================================================================

/// MPU_CTRL: enable
pub const MPU_CTRL_ENABLE: u32 = 1 << 0;
/// MPU_CTRL: default map for privileged accesses outside all regions
pub const MPU_CTRL_PRIVDEFENA: u32 = 1 << 2;

/// The core's memory protection unit
#[derive(Debug)]
pub struct ArmMpu {
    _private: (),
}

impl ArmMpu {
    /// # Safety
    /// Only one handle may exist; region writes change how every access on
    /// the core behaves.
    pub const unsafe fn steal() -> Self {
        Self { _private: () }
    }

    fn regs(&self) -> &'static cortex_m::peripheral::mpu::RegisterBlock {
        // SAFETY: the MPU is always mapped; `steal` made this the sole owner
        unsafe { &*MPU::PTR }
    }
}

impl MemoryProtection for ArmMpu {
    fn region_slots(&self) -> usize {
        let dregion = (self.regs()._type.read() >> 8) & 0xFF;
        (dregion as usize).min(MPU_REGION_SLOTS)
    }

    fn disable(&mut self) {
        // SAFETY: turning the MPU off only relaxes checks
        unsafe { self.regs().ctrl.write(0) }
    }

    fn write_region(&mut self, slot: u8, rbar: u32, rasr: u32) {
        let mpu = self.regs();
        // SAFETY: RBAR carries VALID and the slot, so RNR is not needed
        unsafe {
            mpu.rnr.write(u32::from(slot));
            mpu.rbar.write(rbar);
            mpu.rasr.write(rasr);
        }
    }

    fn enable_with_default_map(&mut self) {
        // SAFETY: regions were validated before being written
        unsafe { self.regs().ctrl.write(MPU_CTRL_PRIVDEFENA | MPU_CTRL_ENABLE) }
    }
}
