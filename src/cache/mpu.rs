//! MPU region descriptors and tables
//!
//! Regions use the ARMv7-M encoding:
//!
//! | Field | Register | Bits |
//! |-------|----------|------|
//! | ADDR / VALID / REGION | RBAR | 31:5 / 4 / 3:0 |
//! | XN | RASR | 28 |
//! | AP | RASR | 26:24 |
//! | TEX S C B | RASR | 21:19, 18, 17, 16 |
//! | SIZE | RASR | 5:1 (`log2(size) - 1`) |
//! | ENABLE | RASR | 0 |
//!
//! Where regions overlap, the one in the highest slot wins.

use crate::error::{MpuError, MpuResult};
use crate::internal::constants::MPU_MIN_REGION_SIZE;

/// Data access permission
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Access {
    /// Read/write, privileged and unprivileged
    FullAccess,
    /// Read-only, privileged and unprivileged
    ReadOnly,
}

impl Access {
    const fn ap(self) -> u32 {
        match self {
            Self::FullAccess => 0b011,
            Self::ReadOnly => 0b110,
        }
    }
}

/// Memory type and cacheability
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MemoryAttributes {
    /// Normal memory, write-back, read and write allocate
    ///
    /// TEX=001, C=1, B=1
    WriteBackWriteAllocate,
    /// Normal memory, write-through, no write allocate
    ///
    /// TEX=000, C=1, B=0
    WriteThroughNoWriteAllocate,
    /// Normal memory, not cached. DMA buffers live here.
    ///
    /// TEX=001, C=0, B=0
    NonCacheable {
        /// Shared between bus masters
        shareable: bool,
    },
    /// Shared device memory (peripheral registers)
    ///
    /// TEX=000, S=1, C=0, B=1
    Device,
    /// Strongly ordered (system control space)
    ///
    /// TEX=000, C=0, B=0
    StronglyOrdered,
}

impl MemoryAttributes {
    /// TEX/S/C/B bits in RASR position
    const fn rasr_bits(self) -> u32 {
        const fn bits(tex: u32, s: bool, c: bool, b: bool) -> u32 {
            (tex << 19) | ((s as u32) << 18) | ((c as u32) << 17) | ((b as u32) << 16)
        }
        match self {
            Self::WriteBackWriteAllocate => bits(0b001, false, true, true),
            Self::WriteThroughNoWriteAllocate => bits(0b000, false, true, false),
            Self::NonCacheable { shareable } => bits(0b001, shareable, false, false),
            Self::Device => bits(0b000, true, false, true),
            Self::StronglyOrdered => bits(0b000, false, false, false),
        }
    }

    /// Whether the data cache may hold lines from this memory
    pub const fn is_cacheable(self) -> bool {
        matches!(self, Self::WriteBackWriteAllocate | Self::WriteThroughNoWriteAllocate)
    }
}

/// One MPU region
///
/// Built with const constructors so region tables can be `static`. Nothing
/// is checked until [`validate`](Self::validate) (or
/// [`RegionTable::validate`]) runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MpuRegion {
    /// Base address, aligned to `size`
    pub base: u32,
    /// Size in bytes, a power of two of at least 32
    pub size: u32,
    /// Data access permission
    pub access: Access,
    /// Memory type and cacheability
    pub attributes: MemoryAttributes,
    /// Instruction fetches allowed
    pub executable: bool,
}

impl MpuRegion {
    /// Read/write, execute-never region
    pub const fn new(base: u32, size: u32, attributes: MemoryAttributes) -> Self {
        Self {
            base,
            size,
            access: Access::FullAccess,
            attributes,
            executable: false,
        }
    }

    /// Make the region read-only
    #[must_use]
    pub const fn read_only(mut self) -> Self {
        self.access = Access::ReadOnly;
        self
    }

    /// Allow instruction fetches
    #[must_use]
    pub const fn executable(mut self) -> Self {
        self.executable = true;
        self
    }

    /// Check size and alignment against what the MPU can express.
    ///
    /// # Errors
    ///
    /// - [`MpuError::SizeZero`] if `size == 0`
    /// - [`MpuError::SizeTooSmall`] if `size < 32`
    /// - [`MpuError::SizeNotPowerOfTwo`] if `size` is not a power of two
    /// - [`MpuError::AddressMisaligned`] if `base % size != 0`
    pub fn validate(&self) -> MpuResult<()> {
        if self.size == 0 {
            return Err(MpuError::SizeZero);
        }
        if self.size < MPU_MIN_REGION_SIZE {
            return Err(MpuError::SizeTooSmall);
        }
        if !self.size.is_power_of_two() {
            return Err(MpuError::SizeNotPowerOfTwo);
        }
        if self.base % self.size != 0 {
            return Err(MpuError::AddressMisaligned);
        }
        Ok(())
    }

    /// RASR SIZE field (`log2(size) - 1`)
    pub fn encode_size(size: u32) -> MpuResult<u8> {
        if size == 0 {
            return Err(MpuError::SizeZero);
        }
        if !size.is_power_of_two() {
            return Err(MpuError::SizeNotPowerOfTwo);
        }
        Ok((size.trailing_zeros() as u8).saturating_sub(1))
    }

    /// Exclusive end address
    pub const fn end(&self) -> u64 {
        self.base as u64 + self.size as u64
    }

    /// Whether `address` falls inside the region
    pub const fn contains(&self, address: u64) -> bool {
        address >= self.base as u64 && address < self.end()
    }

    /// Whether `[address, address + len)` lies entirely inside the region
    pub const fn contains_range(&self, address: u64, len: u64) -> bool {
        match address.checked_add(len) {
            Some(end) => address >= self.base as u64 && end <= self.end(),
            None => false,
        }
    }

    /// Whether two regions share any address
    pub const fn overlaps(&self, other: &Self) -> bool {
        (self.base as u64) < other.end() && (other.base as u64) < self.end()
    }

    /// A non-cacheable, non-executable region: the DMA window
    pub const fn is_dma_window(&self) -> bool {
        matches!(self.attributes, MemoryAttributes::NonCacheable { .. }) && !self.executable
    }

    /// RBAR value placing this region in `slot`
    pub const fn rbar(&self, slot: u8) -> u32 {
        (self.base & !0x1F) | (1 << 4) | (slot as u32 & 0x0F)
    }

    /// RASR value, region enabled, no subregions disabled
    pub fn rasr(&self) -> MpuResult<u32> {
        self.validate()?;
        let size = u32::from(Self::encode_size(self.size)?);
        Ok((u32::from(!self.executable) << 28)
            | (self.access.ap() << 24)
            | self.attributes.rasr_bits()
            | (size << 1)
            | 1)
    }
}

/// Priority-ordered region list
///
/// Index in the slice is the MPU slot; later entries override earlier ones.
#[derive(Debug, Clone, Copy)]
pub struct RegionTable<'a> {
    regions: &'a [MpuRegion],
}

impl<'a> RegionTable<'a> {
    /// Wrap a region list
    pub const fn new(regions: &'a [MpuRegion]) -> Self {
        Self { regions }
    }

    /// Regions in slot order
    pub const fn regions(&self) -> &'a [MpuRegion] {
        self.regions
    }

    /// Whether the table has no regions
    pub const fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    /// Check every region, the slot count and that exactly one DMA window
    /// exists.
    pub fn validate(&self, slots: usize) -> MpuResult<()> {
        if self.regions.len() > slots {
            return Err(MpuError::TooManyRegions);
        }
        for region in self.regions {
            region.validate()?;
        }
        match self.regions.iter().filter(|r| r.is_dma_window()).count() {
            0 => Err(MpuError::NoDmaWindow),
            1 => Ok(()),
            _ => Err(MpuError::MultipleDmaWindows),
        }
    }

    /// The non-cacheable DMA window, if any
    pub fn dma_window(&self) -> Option<&'a MpuRegion> {
        self.regions.iter().find(|r| r.is_dma_window())
    }

    /// Region whose attributes apply at `address` (highest slot wins)
    pub fn resolve(&self, address: u64) -> Option<&'a MpuRegion> {
        self.regions.iter().rev().find(|r| r.contains(address))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RAM: MpuRegion = MpuRegion::new(0x2040_0000, 0x4_0000, MemoryAttributes::WriteBackWriteAllocate);
    const WINDOW: MpuRegion = MpuRegion::new(
        0x2040_0000,
        0x1_0000,
        MemoryAttributes::NonCacheable { shareable: true },
    );
    const RAMFUNC: MpuRegion =
        MpuRegion::new(0x2040_8000, 0x100, MemoryAttributes::WriteBackWriteAllocate).executable();

    #[test]
    fn validation_catches_each_shape_error() {
        let attrs = MemoryAttributes::Device;
        assert_eq!(MpuRegion::new(0, 0, attrs).validate(), Err(MpuError::SizeZero));
        assert_eq!(MpuRegion::new(0, 16, attrs).validate(), Err(MpuError::SizeTooSmall));
        assert_eq!(MpuRegion::new(0, 96, attrs).validate(), Err(MpuError::SizeNotPowerOfTwo));
        assert_eq!(MpuRegion::new(0x20, 64, attrs).validate(), Err(MpuError::AddressMisaligned));
        assert!(MpuRegion::new(0x40, 64, attrs).validate().is_ok());
    }

    #[test]
    fn size_field_is_log2_minus_one() {
        assert_eq!(MpuRegion::encode_size(32), Ok(4));
        assert_eq!(MpuRegion::encode_size(64 * 1024), Ok(15));
        assert_eq!(MpuRegion::encode_size(1024 * 1024), Ok(19));
        assert_eq!(MpuRegion::encode_size(4 * 1024 * 1024), Ok(21));
        assert_eq!(MpuRegion::encode_size(48), Err(MpuError::SizeNotPowerOfTwo));
    }

    #[test]
    fn rbar_carries_valid_bit_and_slot() {
        assert_eq!(WINDOW.rbar(3), 0x2040_0000 | 0x10 | 3);
        assert_eq!(RAM.rbar(17), 0x2040_0000 | 0x10 | 1);
    }

    #[test]
    fn rasr_encodes_every_field() {
        // XN | AP=011 | TEX=001 S=1 | SIZE=15 | ENABLE
        assert_eq!(
            WINDOW.rasr(),
            Ok((1 << 28) | (0b011 << 24) | (0b001 << 19) | (1 << 18) | (15 << 1) | 1)
        );

        let flash = MpuRegion::new(0x0040_0000, 0x10_0000, MemoryAttributes::WriteBackWriteAllocate)
            .read_only()
            .executable();
        assert_eq!(
            flash.rasr(),
            Ok((0b110 << 24) | (0b001 << 19) | (1 << 17) | (1 << 16) | (19 << 1) | 1)
        );

        let ppb = MpuRegion::new(0xE000_0000, 0x10_0000, MemoryAttributes::StronglyOrdered);
        assert_eq!(ppb.rasr(), Ok((1 << 28) | (0b011 << 24) | (19 << 1) | 1));

        assert_eq!(
            MpuRegion::new(0x10, 32, MemoryAttributes::Device).rasr(),
            Err(MpuError::AddressMisaligned)
        );
    }

    #[test]
    fn highest_slot_wins_on_overlap() {
        let table = RegionTable::new(&[RAM, WINDOW, RAMFUNC]);
        assert_eq!(table.resolve(0x2040_0100), Some(&WINDOW));
        assert_eq!(table.resolve(0x2040_8010), Some(&RAMFUNC));
        assert_eq!(table.resolve(0x2041_0000), Some(&RAM));
        assert_eq!(table.resolve(0x2050_0000), None);

        // same regions, window last: it now shadows the code window too
        let reordered = RegionTable::new(&[RAM, RAMFUNC, WINDOW]);
        assert_eq!(reordered.resolve(0x2040_8010), Some(&WINDOW));
    }

    #[test]
    fn table_needs_exactly_one_window() {
        assert_eq!(RegionTable::new(&[RAM]).validate(16), Err(MpuError::NoDmaWindow));
        assert_eq!(
            RegionTable::new(&[RAM, WINDOW, WINDOW]).validate(16),
            Err(MpuError::MultipleDmaWindows)
        );
        assert_eq!(
            RegionTable::new(&[RAM, WINDOW, RAMFUNC]).validate(2),
            Err(MpuError::TooManyRegions)
        );
        let table = RegionTable::new(&[RAM, WINDOW, RAMFUNC]);
        assert!(table.validate(16).is_ok());
        assert_eq!(table.dma_window(), Some(&WINDOW));
    }

    #[test]
    fn range_containment_is_inclusive_of_end() {
        assert!(WINDOW.contains_range(0x2040_0000, 0x1_0000));
        assert!(!WINDOW.contains_range(0x2040_FFF0, 0x20));
        assert!(!WINDOW.contains_range(0x203F_FFF0, 0x20));
        assert!(!WINDOW.contains_range(u64::MAX, 2));
        assert!(RAM.overlaps(&WINDOW));
        assert!(!WINDOW.overlaps(&MpuRegion::new(0x2041_0000, 32, MemoryAttributes::Device)));
    }
}
