//! Shared SPI bus
//!
//! Several devices, each with its own chip-select pin, share one controller.
//! A single [`BusLock`] protects the whole select → transfer → deselect
//! sequence; it is independent of which device is being talked to.
//!
//! Every status wait is bounded by [`SPI_TIMEOUT_ITERATIONS`] polls. A timed
//! out transfer is abandoned in place: bytes already clocked stay clocked.

use core::sync::atomic::{AtomicBool, Ordering};

use embedded_hal::digital::OutputPin;

use crate::error::{BusError, BusResult, ConfigError, Error, Result};
use crate::hal::spi::{SpiRegs, WordSize};
use crate::internal::constants::{SPI_FILLER_BYTE, SPI_TIMEOUT_ITERATIONS};
use crate::sync::BusLock;

use super::device::SpiDevice;

/// Shared SPI master
pub struct SharedSpi<S> {
    regs: S,
    lock: BusLock,
    initialized: AtomicBool,
}

impl<S: SpiRegs> SharedSpi<S> {
    /// Wrap a controller (const, suitable for static initialization).
    pub const fn new(regs: S) -> Self {
        Self {
            regs,
            lock: BusLock::new(),
            initialized: AtomicBool::new(false),
        }
    }

    /// Underlying controller
    pub fn regs(&self) -> &S {
        &self.regs
    }

    // =========================================================================
    // Ownership
    // =========================================================================

    /// Take the bus. Returns `false` without waiting if it is held.
    #[must_use]
    pub fn acquire(&self) -> bool {
        self.lock.acquire()
    }

    /// Give the bus back.
    pub fn release(&self) {
        self.lock.release();
    }

    /// Whether the bus is currently held
    pub fn is_locked(&self) -> bool {
        self.lock.is_locked()
    }

    // =========================================================================
    // Device setup
    // =========================================================================

    /// Prepare a device for use on this bus.
    ///
    /// Drives its chip select inactive, initialises the controller on first
    /// use, and limits the device to 8-bit words on controllers without
    /// 16-bit support.
    pub fn master_init<CS: OutputPin>(&self, device: &mut SpiDevice<CS>) -> BusResult<()> {
        device.deassert_cs()?;

        if !self.initialized.swap(true, Ordering::AcqRel) {
            self.regs.init_master();
            #[cfg(feature = "defmt")]
            defmt::debug!("spi: controller initialised");
        }

        if !S::SUPPORTS_16_BIT {
            device.force_word_size(WordSize::Eight);
        }
        Ok(())
    }

    /// Program the controller for `device` (mode, divisor, word size).
    pub fn configure_device<CS: OutputPin>(&self, device: &SpiDevice<CS>) {
        let mut settings = device.settings();
        if !S::SUPPORTS_16_BIT {
            settings.word_size = WordSize::Eight;
        }
        self.regs.configure(&settings);

        #[cfg(feature = "defmt")]
        defmt::debug!(
            "spi: configure {} @ {} Hz, {}",
            settings.mode,
            settings.clock_hz,
            settings.word_size
        );
    }

    /// Assert the device's chip select.
    pub fn select_device<CS: OutputPin>(&self, device: &mut SpiDevice<CS>) -> BusResult<()> {
        device.assert_cs()
    }

    /// Wait for the transmitter to drain, then release chip select.
    ///
    /// Chip select is released even when the wait times out; the timeout is
    /// still reported.
    pub fn deselect_device<CS: OutputPin>(&self, device: &mut SpiDevice<CS>) -> BusResult<()> {
        let drained = self.wait_tx_empty();
        device.deassert_cs()?;
        drained
    }

    /// Run `f` as one locked transaction on `device`.
    ///
    /// Fails with [`BusError::Busy`] if the bus is held. The bus is released
    /// and the device deselected whatever `f` returns.
    pub fn transaction<CS, R, F>(&self, device: &mut SpiDevice<CS>, f: F) -> Result<R>
    where
        CS: OutputPin,
        F: FnOnce(&Self) -> Result<R>,
    {
        if !self.acquire() {
            return Err(BusError::Busy.into());
        }
        self.configure_device(device);
        let result = match self.select_device(device) {
            Ok(()) => {
                let body = f(self);
                let deselected = self.deselect_device(device);
                body.and_then(|r| deselected.map(|()| r).map_err(Error::from))
            }
            Err(e) => Err(e.into()),
        };
        self.release();
        result
    }

    // =========================================================================
    // Transfers
    // =========================================================================

    /// Clock `len` bytes.
    ///
    /// Sends `tx` (or [`SPI_FILLER_BYTE`] when `None`). Received bytes are
    /// stored in `rx` when supplied; otherwise the receive side is drained
    /// once at the end so the next transfer does not see stale data.
    pub fn transceive(&self, tx: Option<&[u8]>, rx: Option<&mut [u8]>, len: usize) -> Result<()> {
        if tx.is_some_and(|t| t.len() < len) || rx.as_ref().is_some_and(|r| r.len() < len) {
            return Err(ConfigError::BufferTooSmall.into());
        }

        match rx {
            Some(rx) => {
                for i in 0..len {
                    let out = tx.map_or(SPI_FILLER_BYTE, |t| t[i]);
                    self.wait_tx_ready()?;
                    self.regs.write_word(u16::from(out), i + 1 == len);
                    self.wait_rx_ready()?;
                    rx[i] = self.regs.read_word() as u8;
                }
            }
            None => {
                for i in 0..len {
                    let out = tx.map_or(SPI_FILLER_BYTE, |t| t[i]);
                    self.wait_tx_ready()?;
                    self.regs.write_word(u16::from(out), i + 1 == len);
                }
                // Transmit-only devices: clear the receive register.
                let _ = self.wait_tx_empty();
                let _ = self.regs.read_word();
            }
        }
        Ok(())
    }

    /// Clock 16-bit words, always waiting for each received word.
    ///
    /// Only available on controllers with 16-bit support.
    pub fn transceive16(
        &self,
        tx: Option<&[u16]>,
        mut rx: Option<&mut [u16]>,
        len: usize,
    ) -> Result<()> {
        if !S::SUPPORTS_16_BIT {
            return Err(ConfigError::InvalidConfig.into());
        }
        if tx.is_some_and(|t| t.len() < len) || rx.as_ref().is_some_and(|r| r.len() < len) {
            return Err(ConfigError::BufferTooSmall.into());
        }

        for i in 0..len {
            let out = tx.map_or(u16::from(SPI_FILLER_BYTE), |t| t[i]);
            self.wait_tx_ready()?;
            self.regs.write_word(out, i + 1 == len);
            self.wait_rx_ready()?;
            let word = self.regs.read_word();
            if let Some(rx) = rx.as_deref_mut() {
                rx[i] = word;
            }
        }
        Ok(())
    }

    /// Read `rx.len()` bytes, clocking out filler
    pub fn read_packet(&self, rx: &mut [u8]) -> Result<()> {
        let len = rx.len();
        self.transceive(None, Some(rx), len)
    }

    /// Write `tx`, discarding what comes back
    pub fn write_packet(&self, tx: &[u8]) -> Result<()> {
        self.transceive(Some(tx), None, tx.len())
    }

    // =========================================================================
    // Bounded waits
    // =========================================================================

    fn wait_tx_ready(&self) -> BusResult<()> {
        Self::wait_until(|| self.regs.tx_ready())
    }

    fn wait_rx_ready(&self) -> BusResult<()> {
        Self::wait_until(|| self.regs.rx_ready())
    }

    fn wait_tx_empty(&self) -> BusResult<()> {
        Self::wait_until(|| self.regs.tx_empty())
    }

    fn wait_until(mut ready: impl FnMut() -> bool) -> BusResult<()> {
        for _ in 0..SPI_TIMEOUT_ITERATIONS {
            if ready() {
                return Ok(());
            }
        }
        Err(BusError::Timeout)
    }
}

#[cfg(test)]
#[allow(clippy::std_instead_of_core)]
mod tests {
    extern crate std;

    use super::*;
    use crate::hal::spi::SpiMode;
    use crate::test_utils::{MockPin, MockSpi, MockSpi8};
    use std::vec::Vec;

    #[test]
    fn second_acquire_fails_until_release() {
        let spi = SharedSpi::new(MockSpi::new());
        assert!(spi.acquire());
        assert!(!spi.acquire());
        spi.release();
        assert!(spi.acquire());
    }

    #[test]
    fn master_init_runs_controller_setup_once() {
        let spi = SharedSpi::new(MockSpi::new());
        let mut a = SpiDevice::new(MockPin::new());
        let mut b = SpiDevice::new(MockPin::new()).active_high();
        spi.master_init(&mut a).unwrap();
        spi.master_init(&mut b).unwrap();
        assert_eq!(spi.regs().init_count(), 1);
        // inactive level: high for active-low, low for active-high
        assert!(a.release().is_high());
        assert!(!b.release().is_high());
    }

    #[test]
    fn eight_bit_controller_forces_eight_bit_words() {
        let spi = SharedSpi::new(MockSpi8::new());
        let mut dev = SpiDevice::new(MockPin::new()).with_bits(16);
        spi.master_init(&mut dev).unwrap();
        assert_eq!(dev.word_size(), WordSize::Eight);
        assert_eq!(
            spi.transceive16(None, None, 1),
            Err(Error::Config(ConfigError::InvalidConfig))
        );
    }

    #[test]
    fn configure_device_pushes_settings() {
        let spi = SharedSpi::new(MockSpi::new());
        let dev = SpiDevice::new(MockPin::new())
            .with_mode(SpiMode::Mode2)
            .with_clock_hz(500_000);
        spi.configure_device(&dev);
        let settings = spi.regs().last_settings().unwrap();
        assert_eq!(settings.mode, SpiMode::Mode2);
        assert_eq!(settings.clock_hz, 500_000);
    }

    #[test]
    fn loopback_returns_exactly_what_was_sent() {
        let spi = SharedSpi::new(MockSpi::new());
        let tx: Vec<u8> = (0..=255u8).collect();
        let mut rx = [0u8; 256];
        spi.transceive(Some(&tx), Some(&mut rx), tx.len()).unwrap();
        assert_eq!(&rx[..], &tx[..]);

        let writes = spi.regs().writes();
        assert_eq!(writes.len(), 256);
        // only the final word carries the last-transfer flag
        assert!(writes[..255].iter().all(|w| !w.1));
        assert!(writes[255].1);
    }

    #[test]
    fn receive_only_sends_filler() {
        let spi = SharedSpi::new(MockSpi::new());
        let mut rx = [0u8; 4];
        spi.read_packet(&mut rx).unwrap();
        assert_eq!(rx, [SPI_FILLER_BYTE; 4]);
    }

    #[test]
    fn transmit_only_drains_receive_register() {
        let spi = SharedSpi::new(MockSpi::new());
        spi.write_packet(&[1, 2, 3]).unwrap();
        assert_eq!(spi.regs().reads(), 1);
        assert_eq!(spi.regs().writes().len(), 3);
    }

    #[test]
    fn short_buffer_is_rejected_before_any_transfer() {
        let spi = SharedSpi::new(MockSpi::new());
        let mut rx = [0u8; 2];
        assert_eq!(
            spi.transceive(None, Some(&mut rx), 3),
            Err(Error::Config(ConfigError::BufferTooSmall))
        );
        assert!(spi.regs().writes().is_empty());
    }

    #[test]
    fn stuck_receiver_times_out_after_first_byte() {
        let spi = SharedSpi::new(MockSpi::new());
        spi.regs().set_rx_stuck(true);
        let mut rx = [0u8; 3];
        assert_eq!(
            spi.transceive(Some(&[9, 9, 9]), Some(&mut rx), 3),
            Err(Error::Bus(BusError::Timeout))
        );
        assert_eq!(spi.regs().writes().len(), 1);
    }

    #[test]
    fn deselect_releases_cs_even_on_timeout() {
        let spi = SharedSpi::new(MockSpi::new());
        let mut dev = SpiDevice::new(MockPin::new());
        spi.select_device(&mut dev).unwrap();
        spi.regs().set_tx_stuck(true);
        assert_eq!(spi.deselect_device(&mut dev), Err(BusError::Timeout));
        assert!(dev.release().is_high());
    }

    #[test]
    fn transceive16_moves_words() {
        let spi = SharedSpi::new(MockSpi::new());
        let tx = [0x1234u16, 0xBEEF];
        let mut rx = [0u16; 2];
        spi.transceive16(Some(&tx), Some(&mut rx), 2).unwrap();
        assert_eq!(rx, tx);
    }

    #[test]
    fn transaction_locks_selects_and_releases() {
        let spi = SharedSpi::new(MockSpi::new());
        let mut dev = SpiDevice::new(MockPin::new());
        let mut rx = [0u8; 2];
        spi.transaction(&mut dev, |bus| {
            assert!(bus.is_locked());
            bus.transceive(Some(&[0xA5, 0x5A]), Some(&mut rx), 2)
        })
        .unwrap();
        assert_eq!(rx, [0xA5, 0x5A]);
        assert!(!spi.is_locked());
        assert!(dev.release().is_high());
    }

    #[test]
    fn transaction_error_still_releases() {
        let spi = SharedSpi::new(MockSpi::new());
        let mut dev = SpiDevice::new(MockPin::new());
        let result: Result<()> = spi.transaction(&mut dev, |bus| {
            assert!(bus.is_locked());
            Err(ConfigError::BufferTooSmall.into())
        });
        assert_eq!(result, Err(Error::Config(ConfigError::BufferTooSmall)));
        assert!(!spi.is_locked());
        assert!(dev.release().is_high());
    }

    #[test]
    fn transaction_with_failing_select_still_releases() {
        let spi = SharedSpi::new(MockSpi::new());
        let mut dev = SpiDevice::new(MockPin::failing());
        let mut ran = false;
        let result = spi.transaction(&mut dev, |_| {
            ran = true;
            Ok(())
        });
        assert_eq!(result, Err(Error::Bus(BusError::ChipSelect)));
        assert!(!ran);
        assert!(!spi.is_locked());
    }

    #[test]
    fn transaction_on_held_bus_is_busy() {
        let spi = SharedSpi::new(MockSpi::new());
        let mut dev = SpiDevice::new(MockPin::new());
        assert!(spi.acquire());
        let result = spi.transaction(&mut dev, |_| Ok(()));
        assert_eq!(result, Err(Error::Bus(BusError::Busy)));
        assert!(spi.is_locked());
    }
}
