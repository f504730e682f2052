//! Interrupt-driven serial port
//!
//! [`Serial`] pairs one UART instance with an RX and a TX [`RingBuffer`].
//! Foreground code calls the byte-stream API; the UART interrupt handler
//! calls [`Serial::on_interrupt`]. The ring buffers carry the data between
//! the two contexts without locks:
//!
//! - RX: the interrupt handler is the only writer, foreground the only reader
//! - TX: foreground is the only writer, the interrupt handler the only reader
//!
//! Hardware faults never stop the stream. Overrun and framing errors are
//! counted and a [`OVERFLOW_SENTINEL`] byte is pushed into the RX stream so
//! the reader sees the fault in line with the data.

use core::sync::atomic::{AtomicUsize, Ordering};

use crate::error::{ConfigError, ConfigResult};
use crate::hal::irq::InterruptLine;
use crate::hal::uart::{SerialMode, UartFlags, UartRegs};
use crate::internal::constants::{
    DEFAULT_BAUD_RATE, INTERRUPT_SEQUENCE_FIRST, INTERRUPT_SEQUENCE_SECOND, OVERFLOW_SENTINEL,
    RING_BUFFER_SIZE,
};
use crate::sync::CriticalSectionCell;

use super::ring_buffer::RingBuffer;

const INTERRUPT_SEQUENCE: [u8; 2] = [INTERRUPT_SEQUENCE_FIRST, INTERRUPT_SEQUENCE_SECOND];

/// Function run from the UART interrupt when the interrupt sequence arrives.
///
/// It receives the port so it can answer on it. It runs in interrupt
/// context, so it must not wait on the TX buffer draining.
pub type InterruptCallback<U, const N: usize = RING_BUFFER_SIZE> = fn(&Serial<U, N>);

// =============================================================================
// Configuration
// =============================================================================

/// Serial port configuration
///
/// # Example
///
/// ```ignore
/// let config = SerialConfig::new()
///     .with_baud_rate(115_200)
///     .with_mode(SerialMode::Mode8E1);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SerialConfig {
    /// Baud rate in bits per second
    pub baud_rate: u32,
    /// Frame format
    pub mode: SerialMode,
    /// Peripheral clock override. `None` uses the UART's own clock.
    pub peripheral_clock_hz: Option<u32>,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl SerialConfig {
    /// 57600 baud, 8N1, family peripheral clock
    pub const fn new() -> Self {
        Self {
            baud_rate: DEFAULT_BAUD_RATE,
            mode: SerialMode::Mode8N1,
            peripheral_clock_hz: None,
        }
    }

    /// Set the baud rate
    #[must_use]
    pub const fn with_baud_rate(mut self, baud_rate: u32) -> Self {
        self.baud_rate = baud_rate;
        self
    }

    /// Set the frame format
    #[must_use]
    pub const fn with_mode(mut self, mode: SerialMode) -> Self {
        self.mode = mode;
        self
    }

    /// Override the peripheral clock used for the divisor
    #[must_use]
    pub const fn with_peripheral_clock_hz(mut self, hz: u32) -> Self {
        self.peripheral_clock_hz = Some(hz);
        self
    }

    /// Baud-rate generator divisor, rounded to nearest:
    /// `(clk + 8 * baud - 1) / (16 * baud)`
    pub fn divisor(&self, peripheral_clock_hz: u32) -> ConfigResult<u16> {
        if self.baud_rate == 0 {
            return Err(ConfigError::InvalidBaudRate);
        }
        let br16 = u64::from(self.baud_rate) * 16;
        let div = (u64::from(peripheral_clock_hz) + br16 / 2 - 1) / br16;
        match u16::try_from(div) {
            Ok(0) | Err(_) => Err(ConfigError::InvalidBaudRate),
            Ok(div) => Ok(div),
        }
    }
}

// =============================================================================
// Error Record
// =============================================================================

/// Cumulative serial fault counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SerialErrors {
    /// Hardware receive overruns
    pub uart_overrun: u32,
    /// Framing errors
    pub framing: u32,
    /// Bytes that did not fit in the RX ring buffer
    pub buffer_overrun: u32,
}

impl SerialErrors {
    /// True when no fault has been counted
    pub const fn is_clear(&self) -> bool {
        self.uart_overrun == 0 && self.framing == 0 && self.buffer_overrun == 0
    }
}

// =============================================================================
// Serial Port
// =============================================================================

/// Interrupt-driven serial port over one UART instance
pub struct Serial<U, const N: usize = RING_BUFFER_SIZE> {
    uart: U,
    rx: RingBuffer<N>,
    tx: RingBuffer<N>,
    errors: CriticalSectionCell<SerialErrors>,
    callback: CriticalSectionCell<Option<InterruptCallback<U, N>>>,
    sequence_matched: AtomicUsize,
}

impl<U, const N: usize> Serial<U, N>
where
    U: UartRegs + InterruptLine,
{
    /// Wrap a UART instance (const, suitable for static initialization).
    pub const fn new(uart: U) -> Self {
        Self {
            uart,
            rx: RingBuffer::new(),
            tx: RingBuffer::new(),
            errors: CriticalSectionCell::new(SerialErrors {
                uart_overrun: 0,
                framing: 0,
                buffer_overrun: 0,
            }),
            callback: CriticalSectionCell::new(None),
            sequence_matched: AtomicUsize::new(0),
        }
    }

    /// Underlying UART
    pub fn uart(&self) -> &U {
        &self.uart
    }

    /// Open the port.
    ///
    /// Resets the hardware, programs the divisor, empties both buffers,
    /// unmasks receive/overrun/framing interrupts and enables the port.
    pub fn begin(&self, config: &SerialConfig) -> ConfigResult<()> {
        let clock = config
            .peripheral_clock_hz
            .unwrap_or_else(|| self.uart.peripheral_clock_hz());
        let divisor = config.divisor(clock)?;

        self.uart.enable_clock();
        self.uart.reset();
        self.uart.configure(config.mode, divisor);

        self.rx.clear();
        self.tx.clear();
        self.sequence_matched.store(0, Ordering::Relaxed);

        self.uart.disable_interrupts(UartFlags::ALL);
        self.uart.enable_interrupts(UartFlags::RX_EVENTS);
        self.uart.enable_irq();

        self.errors.with(|e| *e = SerialErrors::default());
        self.uart.enable();

        #[cfg(feature = "defmt")]
        defmt::info!(
            "serial begin: {} baud, {}, divisor {}",
            config.baud_rate,
            config.mode,
            divisor
        );

        Ok(())
    }

    /// Close the port.
    ///
    /// Discards unread input, waits for pending output, masks the interrupt
    /// line and stops the peripheral clock.
    pub fn end(&self) {
        self.rx.discard();
        self.flush();
        self.uart.disable_irq();
        self.uart.disable_clock();

        #[cfg(feature = "defmt")]
        defmt::debug!("serial end");
    }

    /// Bytes waiting to be read
    pub fn available(&self) -> usize {
        self.rx.available()
    }

    /// Bytes that can be queued without waiting
    pub fn available_for_write(&self) -> usize {
        self.tx.room_left()
    }

    /// Same as [`available_for_write`](Self::available_for_write). One more
    /// byte may fit directly in the hardware register.
    pub fn can_write(&self) -> usize {
        self.tx.room_left()
    }

    /// Next received byte
    pub fn read(&self) -> Option<u8> {
        self.rx.read_byte()
    }

    /// Next received byte, left in the buffer
    pub fn peek(&self) -> Option<u8> {
        self.rx.peek()
    }

    /// Wait until every queued byte has been handed to the hardware.
    pub fn flush(&self) {
        while !self.tx.is_empty() {
            core::hint::spin_loop();
        }
        while !self.uart.status().contains(UartFlags::TX_READY) {
            core::hint::spin_loop();
        }
    }

    /// Send one byte.
    ///
    /// Goes straight to the hardware when it is idle and nothing is queued;
    /// otherwise the byte is queued and the transmit interrupt armed. Spins
    /// while the TX buffer is full.
    pub fn write(&self, byte: u8) {
        if self.uart.status().contains(UartFlags::TX_READY) && self.tx.is_empty() {
            self.uart.write_data(byte);
            return;
        }
        while self.tx.is_full() {
            core::hint::spin_loop();
        }
        self.tx.store_byte(byte);
        self.uart.enable_interrupts(UartFlags::TX_READY);
    }

    /// Queue a block of bytes, spinning while the TX buffer is full.
    ///
    /// Returns `data.len()`.
    pub fn write_all(&self, data: &[u8]) -> usize {
        let mut rest = data;
        while !rest.is_empty() {
            let written = self.tx.store_block(rest);
            rest = &rest[written..];
            self.uart.enable_interrupts(UartFlags::TX_READY);
            if written == 0 {
                core::hint::spin_loop();
            }
        }
        data.len()
    }

    /// Return the fault counters and reset them to zero.
    pub fn get_and_clear_errors(&self) -> SerialErrors {
        self.errors.take()
    }

    /// Set the NVIC priority of the UART line (low four bits are kept)
    pub fn set_interrupt_priority(&self, priority: u8) {
        self.uart.set_priority(priority & 0x0F);
    }

    /// NVIC priority of the UART line
    pub fn interrupt_priority(&self) -> u8 {
        self.uart.priority()
    }

    /// Install the interrupt-sequence callback, returning the previous one.
    pub fn set_interrupt_callback(
        &self,
        callback: Option<InterruptCallback<U, N>>,
    ) -> Option<InterruptCallback<U, N>> {
        self.callback.replace(callback)
    }

    /// UART interrupt handler body.
    ///
    /// Call from the UART interrupt vector. Never blocks.
    pub fn on_interrupt(&self) {
        let status = self.uart.status();

        if status.contains(UartFlags::RX_READY) {
            let byte = self.uart.read_data();
            self.match_interrupt_sequence(byte);
            if !self.rx.store_byte(byte) {
                self.errors.with(|e| e.buffer_overrun += 1);
            }
        }

        if status.contains(UartFlags::TX_READY) {
            match self.tx.read_byte() {
                Some(byte) => self.uart.write_data(byte),
                None => self.uart.disable_interrupts(UartFlags::TX_READY),
            }
        }

        if status.intersects(UartFlags::OVERRUN | UartFlags::FRAMING) {
            self.errors.with(|e| {
                if status.contains(UartFlags::OVERRUN) {
                    e.uart_overrun += 1;
                }
                if status.contains(UartFlags::FRAMING) {
                    e.framing += 1;
                }
            });
            self.uart.reset_status();
            self.rx.store_byte(OVERFLOW_SENTINEL);
        }
    }

    fn match_interrupt_sequence(&self, byte: u8) {
        let matched = self.sequence_matched.load(Ordering::Relaxed);
        if byte != INTERRUPT_SEQUENCE[matched] {
            self.sequence_matched.store(0, Ordering::Relaxed);
            return;
        }
        if matched + 1 < INTERRUPT_SEQUENCE.len() {
            self.sequence_matched.store(matched + 1, Ordering::Relaxed);
            return;
        }
        self.sequence_matched.store(0, Ordering::Relaxed);
        if let Some(callback) = self.callback.get() {
            callback(self);
        }
    }
}

impl<U, const N: usize> core::fmt::Write for Serial<U, N>
where
    U: UartRegs + InterruptLine,
{
    fn write_str(&mut self, s: &str) -> core::fmt::Result {
        self.write_all(s.as_bytes());
        Ok(())
    }
}
