//! Hardware Abstraction Layer
//!
//! Capability traits describing what the foreground drivers need from each
//! peripheral. Every chip family in [`crate::family`] implements these over
//! its own registers; the host test mocks implement them in software.
//!
//! # Modules
//!
//! - [`uart`]: UART status, data and interrupt masking
//! - [`irq`]: NVIC line enable and priority
//! - [`spi`]: SPI (or USART-in-SPI-mode) master
//! - [`twi`]: TWI (I2C) master
//! - [`adc`]: Analog converters
//! - [`cache`]: Cache controller and MPU

pub mod adc;
pub mod cache;
pub mod irq;
pub mod spi;
pub mod twi;
pub mod uart;

// Re-export commonly used types
pub use adc::{AnalogConverter, ChannelSetup};
pub use cache::{CacheController, CachePolicy, MemoryProtection, NoCache, NoMpu};
pub use irq::InterruptLine;
pub use spi::{SpiMode, SpiRegs, SpiSettings, WordSize};
pub use twi::{TwiRegs, TwiStatus};
pub use uart::{SerialMode, UartFlags, UartRegs};
