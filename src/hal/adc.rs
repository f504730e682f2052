//! Analog converter capability
//!
//! One implementation per physical converter (ADC on SAM3X, AFEC0/AFEC1 on
//! SAM4E and SAME70). Channel numbers passed here are local to the
//! converter; the scheduler in [`crate::analog`] maps logical channels onto
//! converters.

/// Per-channel analog front-end setup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ChannelSetup {
    /// Programmable gain (1, 2 or 4). Converters without a gain stage ignore it.
    pub gain: u8,
    /// Analog offset DAC value. Converters without an offset DAC ignore it.
    pub offset: u16,
}

/// Register-level converter operations
pub trait AnalogConverter {
    /// Enable the clock, reset, select software trigger and mask all
    /// interrupts. Must be called once before any other method.
    fn init(&self);

    /// Apply gain and offset to a local channel
    fn configure_channel(&self, channel: u8, setup: ChannelSetup);

    /// Enable conversion of a local channel
    fn enable_channel(&self, channel: u8);

    /// Disable conversion of a local channel
    fn disable_channel(&self, channel: u8);

    /// Switch on the on-die temperature sensor feeding this converter
    fn enable_temperature_sensor(&self);

    /// Run the automatic offset/gain calibration, if the converter has one
    fn calibrate(&self) {}

    /// Software-trigger one conversion of every enabled channel
    fn start(&self);

    /// End-of-conversion flags, bit `n` for local channel `n`
    fn ready_mask(&self) -> u32;

    /// Latest result of a local channel. Reading clears its end-of-conversion
    /// flag.
    fn read(&self, channel: u8) -> u16;
}
