//! Testing utilities and mock implementations
//!
//! Software stand-ins for every capability trait in [`crate::hal`], so the
//! drivers can be exercised on the host without hardware access. Each mock
//! records what the driver did and lets the test script what the
//! "hardware" reports back.
//!
//! Only available when running `cargo test`.

// Note: The #[cfg(test)] attribute is applied in lib.rs where this module is declared
#![allow(missing_docs)]
#![allow(clippy::std_instead_of_core, clippy::std_instead_of_alloc)]

extern crate std;

use core::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::vec::Vec;

use embedded_hal::digital::{ErrorKind, ErrorType, OutputPin};

use crate::hal::adc::{AnalogConverter, ChannelSetup};
use crate::hal::cache::{CacheController, CachePolicy, MemoryProtection};
use crate::hal::irq::InterruptLine;
use crate::hal::spi::{SpiRegs, SpiSettings};
use crate::hal::twi::{TwiRegs, TwiStatus};
use crate::hal::uart::{SerialMode, UartFlags, UartRegs};
use crate::i2c::TwiClock;

// =============================================================================
// Mock UART
// =============================================================================

/// Mock UART plus its NVIC line
///
/// Received bytes are queued with [`receive`](Self::receive) and reported
/// through `RX_READY` until read. Error flags raised with
/// [`raise`](Self::raise) stay latched until the driver resets status.
#[derive(Debug)]
pub struct MockUart {
    clock_hz: u32,
    clock_enabled: Cell<bool>,
    port_enabled: Cell<bool>,
    irq_enabled: Cell<bool>,
    configured: Cell<Option<(SerialMode, u16)>>,
    interrupt_mask: Cell<u32>,
    rx: RefCell<VecDeque<u8>>,
    tx: RefCell<Vec<u8>>,
    tx_ready: Cell<bool>,
    latched: Cell<u32>,
    status_resets: Cell<u32>,
    priority: Cell<u8>,
}

impl MockUart {
    pub fn new(clock_hz: u32) -> Self {
        Self {
            clock_hz,
            clock_enabled: Cell::new(false),
            port_enabled: Cell::new(false),
            irq_enabled: Cell::new(false),
            configured: Cell::new(None),
            interrupt_mask: Cell::new(0),
            rx: RefCell::new(VecDeque::new()),
            tx: RefCell::new(Vec::new()),
            tx_ready: Cell::new(true),
            latched: Cell::new(0),
            status_resets: Cell::new(0),
            priority: Cell::new(0),
        }
    }

    pub fn clock_enabled(&self) -> bool {
        self.clock_enabled.get()
    }

    pub fn port_enabled(&self) -> bool {
        self.port_enabled.get()
    }

    pub fn irq_enabled(&self) -> bool {
        self.irq_enabled.get()
    }

    /// Mode and divisor from the last `configure`
    pub fn configured(&self) -> Option<(SerialMode, u16)> {
        self.configured.get()
    }

    pub fn interrupt_mask(&self) -> UartFlags {
        UartFlags(self.interrupt_mask.get())
    }

    /// Simulate a byte arriving on the line
    pub fn receive(&self, byte: u8) {
        self.rx.borrow_mut().push_back(byte);
    }

    /// Whether the transmit holding register accepts a byte
    pub fn set_tx_ready(&self, ready: bool) {
        self.tx_ready.set(ready);
    }

    /// Every byte written to the transmit register so far
    pub fn transmitted(&self) -> Vec<u8> {
        self.tx.borrow().clone()
    }

    /// Latch status flags (overrun, framing) until the next status reset
    pub fn raise(&self, flags: UartFlags) {
        self.latched.set(self.latched.get() | flags.0);
    }

    pub fn status_resets(&self) -> u32 {
        self.status_resets.get()
    }
}

impl UartRegs for MockUart {
    fn peripheral_clock_hz(&self) -> u32 {
        self.clock_hz
    }

    fn enable_clock(&self) {
        self.clock_enabled.set(true);
    }

    fn disable_clock(&self) {
        self.clock_enabled.set(false);
    }

    fn reset(&self) {
        self.port_enabled.set(false);
    }

    fn configure(&self, mode: SerialMode, divisor: u16) {
        self.configured.set(Some((mode, divisor)));
    }

    fn enable(&self) {
        self.port_enabled.set(true);
    }

    fn status(&self) -> UartFlags {
        let mut status = self.latched.get();
        if !self.rx.borrow().is_empty() {
            status |= UartFlags::RX_READY.0;
        }
        if self.tx_ready.get() {
            status |= UartFlags::TX_READY.0 | UartFlags::TX_EMPTY.0;
        }
        UartFlags(status)
    }

    fn reset_status(&self) {
        self.latched.set(0);
        self.status_resets.set(self.status_resets.get() + 1);
    }

    fn read_data(&self) -> u8 {
        self.rx.borrow_mut().pop_front().unwrap_or(0)
    }

    fn write_data(&self, byte: u8) {
        self.tx.borrow_mut().push(byte);
    }

    fn enable_interrupts(&self, flags: UartFlags) {
        self.interrupt_mask.set(self.interrupt_mask.get() | flags.0);
    }

    fn disable_interrupts(&self, flags: UartFlags) {
        self.interrupt_mask.set(self.interrupt_mask.get() & !flags.0);
    }

    fn enabled_interrupts(&self) -> UartFlags {
        self.interrupt_mask()
    }
}

impl InterruptLine for MockUart {
    fn enable_irq(&self) {
        self.irq_enabled.set(true);
    }

    fn disable_irq(&self) {
        self.irq_enabled.set(false);
    }

    fn set_priority(&self, priority: u8) {
        self.priority.set(priority);
    }

    fn priority(&self) -> u8 {
        self.priority.get()
    }
}

// =============================================================================
// Mock Chip-Select Pin
// =============================================================================

/// Output pin that remembers its level, or fails every write
#[derive(Debug, Default)]
pub struct MockPin {
    high: bool,
    failing: bool,
}

impl MockPin {
    /// Pin starting low
    pub fn new() -> Self {
        Self::default()
    }

    /// Pin whose every write fails
    pub fn failing() -> Self {
        Self {
            high: false,
            failing: true,
        }
    }

    pub fn is_high(&self) -> bool {
        self.high
    }

    fn drive(&mut self, high: bool) -> Result<(), ErrorKind> {
        if self.failing {
            return Err(ErrorKind::Other);
        }
        self.high = high;
        Ok(())
    }
}

impl ErrorType for MockPin {
    type Error = ErrorKind;
}

impl OutputPin for MockPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.drive(false)
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.drive(true)
    }
}

// =============================================================================
// Mock SPI Controller
// =============================================================================

/// Loopback SPI controller: every read returns the last word written
///
/// `WIDE` selects 16-bit support.
#[derive(Debug, Default)]
pub struct MockSpiController<const WIDE: bool> {
    init_count: Cell<u32>,
    last_settings: Cell<Option<SpiSettings>>,
    writes: RefCell<Vec<(u16, bool)>>,
    last_word: Cell<u16>,
    reads: Cell<usize>,
    rx_stuck: Cell<bool>,
    tx_stuck: Cell<bool>,
}

/// Controller with 16-bit support
pub type MockSpi = MockSpiController<true>;
/// Controller limited to 8-bit words
pub type MockSpi8 = MockSpiController<false>;

impl<const WIDE: bool> MockSpiController<WIDE> {
    pub fn new() -> Self {
        Self {
            init_count: Cell::new(0),
            last_settings: Cell::new(None),
            writes: RefCell::new(Vec::new()),
            last_word: Cell::new(0),
            reads: Cell::new(0),
            rx_stuck: Cell::new(false),
            tx_stuck: Cell::new(false),
        }
    }

    pub fn init_count(&self) -> u32 {
        self.init_count.get()
    }

    pub fn last_settings(&self) -> Option<SpiSettings> {
        self.last_settings.get()
    }

    /// Every word written, with its last-transfer flag
    pub fn writes(&self) -> Vec<(u16, bool)> {
        self.writes.borrow().clone()
    }

    /// Number of receive register reads
    pub fn reads(&self) -> usize {
        self.reads.get()
    }

    /// Receiver never reports data
    pub fn set_rx_stuck(&self, stuck: bool) {
        self.rx_stuck.set(stuck);
    }

    /// Transmitter never drains
    pub fn set_tx_stuck(&self, stuck: bool) {
        self.tx_stuck.set(stuck);
    }
}

impl<const WIDE: bool> SpiRegs for MockSpiController<WIDE> {
    const SUPPORTS_16_BIT: bool = WIDE;

    fn init_master(&self) {
        self.init_count.set(self.init_count.get() + 1);
    }

    fn configure(&self, settings: &SpiSettings) {
        self.last_settings.set(Some(*settings));
    }

    fn tx_ready(&self) -> bool {
        !self.tx_stuck.get()
    }

    fn rx_ready(&self) -> bool {
        !self.rx_stuck.get()
    }

    fn tx_empty(&self) -> bool {
        !self.tx_stuck.get()
    }

    fn write_word(&self, word: u16, last: bool) {
        self.writes.borrow_mut().push((word, last));
        self.last_word.set(word);
    }

    fn read_word(&self) -> u16 {
        self.reads.set(self.reads.get() + 1);
        self.last_word.get()
    }
}

// =============================================================================
// Mock TWI Controller
// =============================================================================

/// Controller operation recorded by [`MockTwi`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TwiCall {
    Target { address: u8, read: bool, internal_len: u8 },
    InternalAddress(u32),
    Start,
    Stop,
    StartStop,
    Write(u8),
    Read(u8),
}

/// Scriptable TWI controller
///
/// Status reports every completion bit unless withheld; a NACK replaces all
/// of them. Status reads and `init_master` are not recorded as calls.
#[derive(Debug)]
pub struct MockTwi {
    clock: Cell<Option<TwiClock>>,
    calls: RefCell<Vec<TwiCall>>,
    rx: RefCell<VecDeque<u8>>,
    status_reads: Cell<u32>,
    data_reads: Cell<usize>,
    withheld: Cell<u32>,
    withheld_later: Cell<Option<(u32, usize)>>,
    nack: Cell<bool>,
}

impl MockTwi {
    /// Controller clocked at 120 MHz
    pub fn new() -> Self {
        Self {
            clock: Cell::new(None),
            calls: RefCell::new(Vec::new()),
            rx: RefCell::new(VecDeque::new()),
            status_reads: Cell::new(0),
            data_reads: Cell::new(0),
            withheld: Cell::new(0),
            withheld_later: Cell::new(None),
            nack: Cell::new(false),
        }
    }

    /// Clock from the last `init_master`
    pub fn clock(&self) -> Option<TwiClock> {
        self.clock.get()
    }

    pub fn calls(&self) -> Vec<TwiCall> {
        self.calls.borrow().clone()
    }

    /// Bytes the target will return
    pub fn queue_rx(&self, bytes: &[u8]) {
        self.rx.borrow_mut().extend(bytes.iter().copied());
    }

    pub fn status_reads(&self) -> u32 {
        self.status_reads.get()
    }

    /// Never report `bits`
    pub fn withhold(&self, bits: TwiStatus) {
        self.withheld.set(self.withheld.get() | bits.0);
    }

    /// Stop reporting `bits` once `reads` data bytes have been read
    pub fn withhold_after_reads(&self, bits: TwiStatus, reads: usize) {
        self.withheld_later.set(Some((bits.0, reads)));
    }

    pub fn set_nack(&self, nack: bool) {
        self.nack.set(nack);
    }

    fn record(&self, call: TwiCall) {
        self.calls.borrow_mut().push(call);
    }
}

impl Default for MockTwi {
    fn default() -> Self {
        Self::new()
    }
}

impl TwiRegs for MockTwi {
    fn master_clock_hz(&self) -> u32 {
        120_000_000
    }

    fn init_master(&self, clock: TwiClock) {
        self.clock.set(Some(clock));
    }

    fn status(&self) -> TwiStatus {
        self.status_reads.set(self.status_reads.get() + 1);
        if self.nack.get() {
            return TwiStatus::NACK;
        }
        let mut status = (TwiStatus::TX_COMPLETE | TwiStatus::RX_READY | TwiStatus::TX_READY).0;
        status &= !self.withheld.get();
        if let Some((bits, after)) = self.withheld_later.get()
            && self.data_reads.get() >= after
        {
            status &= !bits;
        }
        TwiStatus(status)
    }

    fn set_target(&self, address: u8, read: bool, internal_address_len: u8) {
        self.record(TwiCall::Target {
            address,
            read,
            internal_len: internal_address_len,
        });
    }

    fn set_internal_address(&self, internal_address: u32) {
        self.record(TwiCall::InternalAddress(internal_address));
    }

    fn start(&self) {
        self.record(TwiCall::Start);
    }

    fn stop(&self) {
        self.record(TwiCall::Stop);
    }

    fn start_stop(&self) {
        self.record(TwiCall::StartStop);
    }

    fn write_data(&self, byte: u8) {
        self.record(TwiCall::Write(byte));
    }

    fn read_data(&self) -> u8 {
        self.data_reads.set(self.data_reads.get() + 1);
        let byte = self.rx.borrow_mut().pop_front().unwrap_or(0);
        self.record(TwiCall::Read(byte));
        byte
    }
}

// =============================================================================
// Mock Analog Converter
// =============================================================================

/// One converter with up to 32 channels
///
/// Conversions complete only when the test calls
/// [`complete`](Self::complete); reading a channel clears its ready bit.
#[derive(Debug, Default)]
pub struct MockConverter {
    initialised: Cell<bool>,
    setups: RefCell<[Option<ChannelSetup>; 32]>,
    enabled: Cell<u32>,
    calibrations: Cell<u32>,
    temperature_sensor: Cell<bool>,
    starts: Cell<u32>,
    ready: Cell<u32>,
    reads: Cell<u32>,
    values: RefCell<[u16; 32]>,
}

impl MockConverter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn initialised(&self) -> bool {
        self.initialised.get()
    }

    pub fn setup(&self, channel: u8) -> Option<ChannelSetup> {
        self.setups.borrow()[usize::from(channel)]
    }

    pub fn channel_enabled(&self, channel: u8) -> bool {
        self.enabled.get() & (1 << channel) != 0
    }

    pub fn calibrations(&self) -> u32 {
        self.calibrations.get()
    }

    pub fn temperature_sensor_on(&self) -> bool {
        self.temperature_sensor.get()
    }

    pub fn starts(&self) -> u32 {
        self.starts.get()
    }

    /// Mark conversions finished on the given local channels
    pub fn complete(&self, mask: u32) {
        self.ready.set(self.ready.get() | mask);
    }

    pub fn reads(&self) -> u32 {
        self.reads.get()
    }

    pub fn set_value(&self, channel: u8, value: u16) {
        self.values.borrow_mut()[usize::from(channel)] = value;
    }
}

impl AnalogConverter for MockConverter {
    fn init(&self) {
        self.initialised.set(true);
    }

    fn configure_channel(&self, channel: u8, setup: ChannelSetup) {
        self.setups.borrow_mut()[usize::from(channel)] = Some(setup);
    }

    fn enable_channel(&self, channel: u8) {
        self.enabled.set(self.enabled.get() | (1 << channel));
    }

    fn disable_channel(&self, channel: u8) {
        self.enabled.set(self.enabled.get() & !(1 << channel));
    }

    fn enable_temperature_sensor(&self) {
        self.temperature_sensor.set(true);
    }

    fn calibrate(&self) {
        self.calibrations.set(self.calibrations.get() + 1);
    }

    fn start(&self) {
        self.starts.set(self.starts.get() + 1);
    }

    fn ready_mask(&self) -> u32 {
        self.ready.get()
    }

    fn read(&self, channel: u8) -> u16 {
        self.reads.set(self.reads.get() + 1);
        self.ready.set(self.ready.get() & !(1 << channel));
        self.values.borrow()[usize::from(channel)]
    }
}

// =============================================================================
// Mock Cache Controller and MPU
// =============================================================================

/// Cache maintenance operation recorded by [`MockCache`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheOp {
    Enable,
    Disable,
    Invalidate,
    Monitor,
}

/// Cache controller that records maintenance operations
#[derive(Debug, Default)]
pub struct MockCache<const WRITE_BACK: bool> {
    enabled: bool,
    ops: Vec<CacheOp>,
}

/// Cortex-M7 style data cache
pub type MockWriteBack = MockCache<true>;
/// CMCC style read cache
pub type MockWriteThrough = MockCache<false>;

impl<const WRITE_BACK: bool> MockCache<WRITE_BACK> {
    pub fn new() -> Self {
        Self {
            enabled: false,
            ops: Vec::new(),
        }
    }

    pub fn ops(&self) -> Vec<CacheOp> {
        self.ops.clone()
    }
}

impl<const WRITE_BACK: bool> CacheController for MockCache<WRITE_BACK> {
    const POLICY: CachePolicy = if WRITE_BACK {
        CachePolicy::WriteBack
    } else {
        CachePolicy::WriteThrough
    };

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn enable(&mut self) {
        self.enabled = true;
        self.ops.push(CacheOp::Enable);
    }

    fn disable(&mut self) {
        self.enabled = false;
        self.ops.push(CacheOp::Disable);
    }

    fn invalidate_all(&mut self) {
        self.ops.push(CacheOp::Invalidate);
    }

    fn enable_monitor(&mut self) {
        self.ops.push(CacheOp::Monitor);
    }

    fn hit_count(&self) -> Option<u32> {
        if WRITE_BACK { None } else { Some(0) }
    }
}

/// MPU that records region writes
#[derive(Debug)]
pub struct MockMpu {
    slots: usize,
    enabled: bool,
    cleared: usize,
    writes: Vec<(u8, u32, u32)>,
}

impl MockMpu {
    pub fn new(slots: usize) -> Self {
        Self {
            slots,
            enabled: false,
            cleared: 0,
            writes: Vec::new(),
        }
    }

    pub fn enabled_with_default_map(&self) -> bool {
        self.enabled
    }

    /// Number of slots cleared
    pub fn cleared(&self) -> usize {
        self.cleared
    }

    /// Region writes as (slot, RBAR, RASR), excluding clears
    pub fn writes(&self) -> Vec<(u8, u32, u32)> {
        self.writes.clone()
    }
}

impl MemoryProtection for MockMpu {
    fn region_slots(&self) -> usize {
        self.slots
    }

    fn disable(&mut self) {
        self.enabled = false;
    }

    fn write_region(&mut self, slot: u8, rbar: u32, rasr: u32) {
        self.writes.push((slot, rbar, rasr));
    }

    fn clear_region(&mut self, _slot: u8) {
        self.cleared += 1;
    }

    fn enable_with_default_map(&mut self) {
        self.enabled = true;
    }
}
