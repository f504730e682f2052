//! Analog input scheduling
//!
//! One or two hardware converters share a single logical channel space.
//! [`AnalogIn`] tracks which channels are enabled, starts only the
//! converters that own a requested channel and reports readiness per mask.
//!
//! # Example
//!
//! ```ignore
//! use motion_periph::family;
//! use motion_periph::analog::AnalogIn;
//!
//! let analog = AnalogIn::new(family::analog_converters(), family::ANALOG_LAYOUT)?;
//! analog.init();
//! analog.enable_channel(THERMISTOR, true)?;
//! analog.enable_channel(analog.temperature_channel(), true)?;
//!
//! let mask = (1 << THERMISTOR) | (1 << analog.temperature_channel());
//! analog.start_conversion(mask);
//! while !analog.check_ready(mask) {}
//! let raw = analog.read_channel(THERMISTOR);
//! ```

mod input;
mod layout;

pub use input::AnalogIn;
pub use layout::ChannelLayout;
