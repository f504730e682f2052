//! Multi-converter analog input scheduler

use core::sync::atomic::{AtomicU32, Ordering};

use crate::error::{ConfigError, ConfigResult};
use crate::hal::adc::{AnalogConverter, ChannelSetup};
use crate::internal::constants::ANALOG_CHANNEL_OFFSET;

use super::layout::ChannelLayout;

/// Analog inputs spread over `M` converters
///
/// Channels are addressed by logical number (see [`ChannelLayout`]). Only
/// channels enabled through [`enable_channel`](Self::enable_channel) take
/// part in conversions; other bits in a request mask are ignored.
///
/// A conversion is only meaningful when [`start_conversion`] and
/// [`check_ready`] are called with the same mask. A channel that was never
/// started keeps whatever end-of-conversion state it had, and
/// [`read_channel`](Self::read_channel) never checks freshness.
///
/// [`start_conversion`]: Self::start_conversion
/// [`check_ready`]: Self::check_ready
pub struct AnalogIn<C, const M: usize> {
    converters: [C; M],
    layout: ChannelLayout,
    active: AtomicU32,
}

impl<C: AnalogConverter, const M: usize> AnalogIn<C, M> {
    /// Combine converters under one logical channel space.
    ///
    /// # Errors
    ///
    /// [`ConfigError::InvalidConfig`] if `layout` does not describe exactly
    /// `M` converters or needs more than 32 channel bits.
    pub fn new(converters: [C; M], layout: ChannelLayout) -> ConfigResult<Self> {
        if !layout.is_valid() || layout.converters as usize != M {
            return Err(ConfigError::InvalidConfig);
        }
        Ok(Self {
            converters,
            layout,
            active: AtomicU32::new(0),
        })
    }

    /// Initialise every converter: clock, software trigger, interrupts
    /// masked.
    pub fn init(&self) {
        for converter in &self.converters {
            converter.init();
        }
        #[cfg(feature = "defmt")]
        defmt::debug!(
            "analog: {} converter(s), {} channels, {}-bit",
            M,
            self.layout.channel_count(),
            self.layout.resolution_bits
        );
    }

    /// Enable or disable a logical channel.
    ///
    /// Enabling configures the front end (unity gain, mid-range offset),
    /// switches on the temperature sensor for its channel, enables the
    /// channel and recalibrates the converter. Disabling only stops the
    /// channel.
    ///
    /// # Errors
    ///
    /// [`ConfigError::InvalidChannel`] if `channel` is out of range.
    pub fn enable_channel(&self, channel: u8, enable: bool) -> ConfigResult<()> {
        let (index, local) = self.layout.locate(channel).ok_or(ConfigError::InvalidChannel)?;
        let converter = &self.converters[index];
        let bit = 1u32 << channel;

        if enable {
            converter.configure_channel(
                local,
                ChannelSetup {
                    gain: 1,
                    offset: ANALOG_CHANNEL_OFFSET,
                },
            );
            if channel == self.layout.temperature_channel {
                converter.enable_temperature_sensor();
            }
            converter.enable_channel(local);
            converter.calibrate();
            self.active.fetch_or(bit, Ordering::AcqRel);
        } else {
            self.active.fetch_and(!bit, Ordering::AcqRel);
            converter.disable_channel(local);
        }
        Ok(())
    }

    /// Latest value of a channel, fresh or not. Out-of-range channels read 0.
    pub fn read_channel(&self, channel: u8) -> u16 {
        match self.layout.locate(channel) {
            Some((index, local)) => self.converters[index].read(local),
            None => 0,
        }
    }

    /// Trigger conversions on every converter owning an active channel in
    /// `mask`.
    ///
    /// Stale end-of-conversion flags on a converter are drained before it is
    /// started. Converters with nothing to do are left alone.
    pub fn start_conversion(&self, mask: u32) {
        let mask = mask & self.active_channels();
        for (index, converter) in self.converters.iter().enumerate() {
            if self.layout.split(mask, index) == 0 {
                continue;
            }
            let stale = converter.ready_mask() & self.layout.local_mask();
            for local in 0..self.layout.populated_channels {
                if stale & (1 << local) != 0 {
                    let _ = converter.read(local);
                }
            }
            converter.start();
        }
    }

    /// Whether every active channel in `mask` has finished converting
    pub fn check_ready(&self, mask: u32) -> bool {
        let mask = mask & self.active_channels();
        self.converters.iter().enumerate().all(|(index, converter)| {
            let wanted = self.layout.split(mask, index);
            converter.ready_mask() & wanted == wanted
        })
    }

    /// Logical channel of the on-die temperature sensor
    pub fn temperature_channel(&self) -> u8 {
        self.layout.temperature_channel
    }

    /// Conversion result width in bits
    pub fn resolution_bits(&self) -> u8 {
        self.layout.resolution_bits
    }

    /// Channel numbering in use
    pub fn layout(&self) -> ChannelLayout {
        self.layout
    }

    /// Whether `channel` is enabled
    pub fn is_channel_active(&self, channel: u8) -> bool {
        channel < 32 && self.active_channels() & (1 << channel) != 0
    }

    /// Mask of enabled channels
    pub fn active_channels(&self) -> u32 {
        self.active.load(Ordering::Acquire)
    }

    /// One converter, by index
    pub fn converter(&self, index: usize) -> Option<&C> {
        self.converters.get(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::MockConverter;

    const LAYOUT: ChannelLayout = ChannelLayout {
        channels_per_converter: 16,
        populated_channels: 16,
        converters: 2,
        temperature_channel: 15,
        resolution_bits: 12,
    };

    fn analog() -> AnalogIn<MockConverter, 2> {
        let analog = AnalogIn::new([MockConverter::new(), MockConverter::new()], LAYOUT).unwrap();
        analog.init();
        analog
    }

    #[test]
    fn layout_must_match_converter_count() {
        let single = AnalogIn::new([MockConverter::new()], LAYOUT);
        assert_eq!(single.err(), Some(ConfigError::InvalidConfig));
    }

    #[test]
    fn init_reaches_every_converter() {
        let analog = analog();
        assert!(analog.converter(0).unwrap().initialised());
        assert!(analog.converter(1).unwrap().initialised());
    }

    #[test]
    fn enable_configures_then_marks_active() {
        let analog = analog();
        analog.enable_channel(17, true).unwrap();

        let afec1 = analog.converter(1).unwrap();
        assert_eq!(
            afec1.setup(1),
            Some(ChannelSetup {
                gain: 1,
                offset: ANALOG_CHANNEL_OFFSET
            })
        );
        assert!(afec1.channel_enabled(1));
        assert_eq!(afec1.calibrations(), 1);
        assert!(!afec1.temperature_sensor_on());
        assert!(analog.is_channel_active(17));
        assert_eq!(analog.active_channels(), 1 << 17);

        analog.enable_channel(17, false).unwrap();
        assert!(!afec1.channel_enabled(1));
        assert!(!analog.is_channel_active(17));
    }

    #[test]
    fn temperature_channel_turns_on_sensor() {
        let analog = analog();
        analog.enable_channel(analog.temperature_channel(), true).unwrap();
        assert!(analog.converter(0).unwrap().temperature_sensor_on());
    }

    #[test]
    fn out_of_range_channels() {
        let analog = analog();
        assert_eq!(analog.enable_channel(32, true), Err(ConfigError::InvalidChannel));
        assert_eq!(analog.read_channel(40), 0);
        assert!(!analog.is_channel_active(40));
    }

    #[test]
    fn mask_algebra_ignores_inactive_channels() {
        let analog = analog();
        analog.enable_channel(1, true).unwrap();
        analog.enable_channel(17, true).unwrap();
        let mask = (1 << 1) | (1 << 5) | (1 << 17);

        analog.start_conversion(mask);
        assert_eq!(analog.converter(0).unwrap().starts(), 1);
        assert_eq!(analog.converter(1).unwrap().starts(), 1);
        assert!(!analog.check_ready(mask));

        analog.converter(0).unwrap().complete(1 << 1);
        assert!(!analog.check_ready(mask));

        // channel 5 is requested but inactive: its flag never matters
        analog.converter(1).unwrap().complete(1 << 1);
        assert!(analog.check_ready(mask));
    }

    #[test]
    fn untouched_converter_is_not_started() {
        let analog = analog();
        analog.enable_channel(2, true).unwrap();
        analog.enable_channel(20, true).unwrap();
        analog.start_conversion(1 << 2);
        assert_eq!(analog.converter(0).unwrap().starts(), 1);
        assert_eq!(analog.converter(1).unwrap().starts(), 0);
    }

    #[test]
    fn stale_results_are_drained_before_start() {
        let analog = analog();
        analog.enable_channel(3, true).unwrap();
        let afec0 = analog.converter(0).unwrap();
        afec0.complete((1 << 3) | (1 << 9));

        analog.start_conversion(1 << 3);
        assert_eq!(afec0.ready_mask(), 0);
        assert_eq!(afec0.reads(), 2);
        assert!(!analog.check_ready(1 << 3));
    }

    #[test]
    fn read_channel_returns_latest_value() {
        let analog = analog();
        analog.converter(1).unwrap().set_value(4, 3210);
        assert_eq!(analog.read_channel(20), 3210);
    }
}
