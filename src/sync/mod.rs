//! Synchronization and Concurrency Support
//!
//! Every driver in this crate is shared between foreground code and at least
//! one interrupt handler. This module holds the primitives they share:
//!
//! - [`CriticalSectionCell`] - ISR-safe interior mutability for small state
//!   (error counters, callbacks)
//! - [`BusLock`] - non-blocking ownership flag for a shared SPI bus
//!
//! The serial ring buffer is the one structure that avoids critical sections
//! entirely; see [`crate::serial::RingBuffer`].
//!
//! # Example
//!
//! ```ignore
//! use motion_periph::sync::{BusLock, CriticalSectionCell};
//!
//! static SPI_BUS: BusLock = BusLock::new();
//! static FAULTS: CriticalSectionCell<u32> = CriticalSectionCell::new(0);
//!
//! if SPI_BUS.acquire() {
//!     // ... talk to the device ...
//!     SPI_BUS.release();
//! } else {
//!     FAULTS.with(|n| *n += 1);
//! }
//! ```

mod bus_lock;
mod primitives;

pub use bus_lock::BusLock;
pub use primitives::CriticalSectionCell;
