//! Logical channel numbering

/// How logical channels map onto physical converters
///
/// Logical channel `n` belongs to converter `n / channels_per_converter` and
/// is local channel `n % channels_per_converter` there. A converter with
/// fewer inputs than the stride leaves the top of its block unused, so a
/// logical channel number means the same thing on every family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ChannelLayout {
    /// Logical channels reserved for each converter
    pub channels_per_converter: u8,
    /// Inputs each converter actually has (at most `channels_per_converter`)
    pub populated_channels: u8,
    /// Number of converters
    pub converters: u8,
    /// Logical channel wired to the on-die temperature sensor
    pub temperature_channel: u8,
    /// Conversion result width
    pub resolution_bits: u8,
}

impl ChannelLayout {
    /// Total number of logical channels
    pub const fn channel_count(&self) -> u8 {
        self.channels_per_converter * self.converters
    }

    /// Converter index and local channel of a logical channel
    pub const fn locate(&self, channel: u8) -> Option<(usize, u8)> {
        if channel >= self.channel_count() {
            return None;
        }
        let local = channel % self.channels_per_converter;
        if local >= self.populated_channels {
            return None;
        }
        Some(((channel / self.channels_per_converter) as usize, local))
    }

    /// Mask of populated local channel bits on one converter
    pub const fn local_mask(&self) -> u32 {
        if self.populated_channels >= 32 {
            u32::MAX
        } else {
            (1u32 << self.populated_channels) - 1
        }
    }

    /// Bits of a logical mask owned by `converter`, shifted down to local
    /// channel positions
    pub const fn split(&self, mask: u32, converter: usize) -> u32 {
        let shift = converter as u32 * self.channels_per_converter as u32;
        if shift >= 32 {
            return 0;
        }
        (mask >> shift) & self.local_mask()
    }

    /// Largest value a conversion can return
    pub const fn full_scale(&self) -> u16 {
        ((1u32 << self.resolution_bits) - 1) as u16
    }

    pub(crate) const fn is_valid(&self) -> bool {
        self.channels_per_converter > 0
            && self.populated_channels > 0
            && self.populated_channels <= self.channels_per_converter
            && self.converters > 0
            && (self.channels_per_converter as u32) * (self.converters as u32) <= 32
            && self.locate(self.temperature_channel).is_some()
            && self.resolution_bits > 0
            && self.resolution_bits <= 16
    }
}
