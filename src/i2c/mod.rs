//! TWI (I2C) master
//!
//! Linear, non-reentrant transfers: optional write phase, optional read
//! phase, stop. Every status wait is bounded by a [`WaitTimeout`] and can end
//! early on a NACK; failures are counted in [`ErrorCounts`] rather than
//! returned.
//!
//! # Example
//!
//! ```ignore
//! use motion_periph::family::Twi;
//! use motion_periph::i2c::{TwoWire, WaitTimeout};
//!
//! static WIRE: TwoWire<Twi> = TwoWire::new(Twi::twi0());
//!
//! WIRE.begin_master(400_000)?;
//! let mut buf = [0x0F, 0];
//! let timeout = WaitTimeout::from_bus_cycles(100, 120_000_000, 400_000);
//! if WIRE.transfer(0x68, &mut buf, 1, 1, timeout) != 2 {
//!     let faults = WIRE.get_error_counts(true);
//! }
//! ```

mod clock;
mod master;
mod wait;

pub use clock::TwiClock;
pub use master::{ErrorCounts, TwoWire};
pub use wait::{PollWait, StatusWait, WaitTimeout};
