//! Interrupt-driven serial I/O
//!
//! - [`RingBuffer`]: lock-free SPSC byte queue shared with the ISR
//! - [`Serial`]: UART driver built on two ring buffers
//!
//! # Example
//!
//! ```ignore
//! use motion_periph::family::Uart;
//! use motion_periph::serial::{Serial, SerialConfig};
//!
//! static SERIAL0: Serial<Uart> = Serial::new(Uart::uart0());
//!
//! SERIAL0.begin(&SerialConfig::new().with_baud_rate(115_200))?;
//! SERIAL0.write_all(b"ok\n");
//!
//! #[interrupt]
//! fn UART0() {
//!     SERIAL0.on_interrupt();
//! }
//! ```

mod port;
mod ring_buffer;

pub use port::{InterruptCallback, Serial, SerialConfig, SerialErrors};
pub use ring_buffer::RingBuffer;
