//! Chip family register implementations
//!
//! Exactly one of the `sam3x`, `sam4e` or `same70` features selects the
//! family compiled here. Each family exports the same names:
//!
//! | Item | Meaning |
//! |------|---------|
//! | `MASTER_CLOCK_HZ` | Peripheral clock assumed by every block |
//! | `Uart`, `Uart::uart0()` | Serial UART for [`crate::serial::Serial`] |
//! | `SpiBus`, `SpiBus::spi0()` | SPI master for [`crate::spi::SharedSpi`] |
//! | `Twi`, `Twi::twi0()` | I2C master for [`crate::i2c::TwoWire`] |
//! | `Converter`, `analog_converters()`, `ANALOG_LAYOUT` | Inputs for [`crate::analog::AnalogIn`] |
//! | `CacheCtl`, `Mpu`, `cache()` | Coherency handle, see [`crate::cache::Cache`] |
//!
//! The register blocks shared by all three families live in [`common`].

pub mod common;

#[cfg(any(feature = "sam4e", feature = "same70"))]
pub mod afec;

#[cfg(feature = "sam3x")]
mod sam3x;
#[cfg(feature = "sam3x")]
pub use sam3x::*;

#[cfg(feature = "sam4e")]
mod sam4e;
#[cfg(feature = "sam4e")]
pub use sam4e::*;

#[cfg(feature = "same70")]
mod same70;
#[cfg(feature = "same70")]
pub use same70::*;
