//! Shared SPI bus
//!
//! - [`SpiDevice`]: chip select, mode, clock and word size of one device
//! - [`SharedSpi`]: one controller shared by every device, with a
//!   non-blocking ownership lock and timeout-bounded transfers
//!
//! # Example
//!
//! ```ignore
//! use motion_periph::family::SpiBus;
//! use motion_periph::spi::{SharedSpi, SpiDevice};
//!
//! static SPI: SharedSpi<SpiBus> = SharedSpi::new(SpiBus::spi0());
//!
//! let mut driver = SpiDevice::new(cs).with_mode(SpiMode::Mode3).with_clock_hz(4_000_000);
//! SPI.master_init(&mut driver)?;
//!
//! let mut status = [0u8; 4];
//! SPI.transaction(&mut driver, |bus| bus.transceive(Some(&[0x6F, 0, 0, 0]), Some(&mut status), 4))?;
//! ```

mod bus;
mod device;

pub use bus::SharedSpi;
pub use device::{SpiDevice, divisor_ceil, divisor_floor};
