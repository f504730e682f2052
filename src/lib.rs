//! Motion-Control Peripheral Layer
//!
//! A `no_std`, `no_alloc` coordination layer for the on-chip peripherals of
//! Microchip SAM Cortex-M parts used on motion-control boards (SAM3X, SAM4E,
//! SAME70).
//!
//! # Architecture
//!
//! The crate is organized into three layers:
//!
//! 1. **Drivers** ([`serial`], [`spi`], [`i2c`], [`analog`], [`cache`]):
//!    foreground APIs shared with interrupt handlers
//! 2. **HAL** ([`hal`]): capability traits each driver needs from its
//!    peripheral
//! 3. **Family** ([`family`]): register implementations of those traits for
//!    the selected chip
//!
//! Drivers are generic over the HAL traits, so every piece of driver logic
//! runs on the host against the mocks in the test suite.
//!
//! # Features
//!
//! - `sam4e` (default), `sam3x`, `same70`: chip family (exactly one)
//! - `defmt`: defmt formatting for public types and driver logging
//! - `single-core`: use cortex-m's interrupt-masking critical-section
//!   implementation
//!
//! # Example
//!
//! ```ignore
//! use motion_periph::family::{self, Twi, Uart};
//! use motion_periph::i2c::TwoWire;
//! use motion_periph::serial::{Serial, SerialConfig};
//!
//! static SERIAL0: Serial<Uart> = Serial::new(Uart::uart0());
//! static WIRE: TwoWire<Twi> = TwoWire::new(Twi::twi0());
//!
//! let mut cache = family::cache();
//! cache.init()?;
//! cache.enable();
//!
//! SERIAL0.begin(&SerialConfig::new())?;
//! WIRE.begin_master(400_000)?;
//! ```
//!
//! # Memory Requirements
//!
//! With default configuration each [`serial::Serial`] holds two 512-byte
//! ring buffers. Nothing else allocates beyond a few words of state.

#![no_std]
#![deny(missing_docs)]
#![allow(unsafe_code)]
#![deny(unsafe_op_in_unsafe_fn)]
// Clippy lint levels live here; Cargo.toml carries the rust lints.
#![deny(clippy::correctness)]
#![warn(
    clippy::suspicious,
    clippy::style,
    clippy::complexity,
    clippy::perf,
    clippy::cloned_instead_of_copied,
    clippy::explicit_iter_loop,
    clippy::implicit_clone,
    clippy::inconsistent_struct_constructor,
    clippy::manual_assert,
    clippy::manual_let_else,
    clippy::match_same_arms,
    clippy::needless_pass_by_value,
    clippy::semicolon_if_nothing_returned,
    clippy::uninlined_format_args,
    clippy::unnested_or_patterns,
    clippy::std_instead_of_core,
    clippy::std_instead_of_alloc,
    clippy::alloc_instead_of_core
)]
#![allow(
    clippy::mod_module_files,
    clippy::self_named_module_files,
    clippy::similar_names,
    clippy::too_many_arguments,
    clippy::struct_excessive_bools,
    clippy::fn_params_excessive_bools,
    clippy::type_complexity,
    clippy::must_use_candidate,
    clippy::assertions_on_constants,
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss,
    clippy::cast_lossless,
    clippy::panic_in_result_fn,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::module_name_repetitions,
    clippy::wildcard_imports,
    clippy::items_after_statements
)]

#[cfg(any(
    all(feature = "sam3x", feature = "sam4e"),
    all(feature = "sam3x", feature = "same70"),
    all(feature = "sam4e", feature = "same70")
))]
compile_error!("Features 'sam3x', 'sam4e' and 'same70' are mutually exclusive.");

#[cfg(not(any(feature = "sam3x", feature = "sam4e", feature = "same70")))]
compile_error!(
    "One of the features 'sam3x', 'sam4e' or 'same70' must be enabled. The default is 'sam4e'."
);

// =============================================================================
// Modules
// =============================================================================

pub mod analog;
pub mod cache;
pub mod error;
pub mod family;
pub mod hal;
pub mod i2c;
pub mod serial;
pub mod spi;
pub mod sync;

// Internal implementation details (pub(crate) only)
mod internal;

// Test utilities (only available during testing)
#[cfg(test)]
mod test_utils;

/// Shared constants: buffer sizes, wait budgets, clock limits
pub mod constants {
    pub use crate::internal::constants::*;
}

// =============================================================================
// Re-exports
// =============================================================================

pub use analog::{AnalogIn, ChannelLayout};
pub use cache::{Access, Cache, MemoryAttributes, MpuRegion, RegionTable};
pub use error::{
    BusError, BusResult, ConfigError, ConfigResult, Error, MpuError, MpuResult, Result,
};
pub use i2c::{ErrorCounts, TwiClock, TwoWire, WaitTimeout};
pub use serial::{RingBuffer, Serial, SerialConfig, SerialErrors};
pub use spi::{SharedSpi, SpiDevice};
