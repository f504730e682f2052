//! Cache / MPU coherency
//!
//! Keeps DMA buffers and the CPU's view of memory consistent:
//!
//! | Part | Cache | Strategy |
//! |------|-------|----------|
//! | SAM3X | none | barriers only |
//! | SAM4E | CMCC, write-through | flush is a barrier; invalidate clears the whole cache |
//! | SAME70 | Cortex-M7 L1, write-back | DMA buffers must sit in the MPU's non-cacheable window |
//!
//! On parts with an MPU window, the DMA hooks do no maintenance at all. They
//! check that the buffer is inside the window and panic if it is not: such a
//! buffer is a link-time layout bug, and continuing would silently corrupt
//! data.
//!
//! # Example
//!
//! ```ignore
//! use motion_periph::cache::Cache;
//! use motion_periph::family;
//!
//! let mut cache = family::cache();
//! cache.init()?;
//! cache.enable();
//!
//! cache.flush_before_dma_send(tx.as_ptr() as usize, tx.len());
//! start_dma();
//! ```

mod mpu;

pub use mpu::{Access, MemoryAttributes, MpuRegion, RegionTable};

use crate::error::{MpuError, MpuResult};
use crate::hal::cache::{CacheController, CachePolicy, MemoryProtection, NoMpu};
use crate::internal::barrier::{data_barrier, full_barrier};

/// Cache controller plus optional MPU region table
pub struct Cache<C, M = NoMpu> {
    controller: C,
    mpu: M,
    regions: RegionTable<'static>,
}

impl<C: CacheController> Cache<C, NoMpu> {
    /// Cache without MPU-based DMA exclusion
    pub const fn new(controller: C) -> Self {
        Self {
            controller,
            mpu: NoMpu,
            regions: RegionTable::new(&[]),
        }
    }
}

impl<C: CacheController, M: MemoryProtection> Cache<C, M> {
    /// Cache whose DMA buffers are kept out of the cache by `regions`
    pub const fn with_mpu(controller: C, mpu: M, regions: &'static [MpuRegion]) -> Self {
        Self {
            controller,
            mpu,
            regions: RegionTable::new(regions),
        }
    }

    /// Load the region table (if any) and start the hit counter.
    ///
    /// The MPU is disabled, every slot cleared, the table written slot by
    /// slot and the unit re-enabled with the default map kept for
    /// privileged accesses outside all regions.
    ///
    /// # Errors
    ///
    /// Any [`MpuError`] from table validation. Nothing is written to the MPU
    /// in that case.
    pub fn init(&mut self) -> MpuResult<()> {
        if !self.regions.is_empty() {
            let slots = self.mpu.region_slots();
            self.regions.validate(slots)?;

            self.mpu.disable();
            for slot in 0..slots {
                self.mpu.clear_region(slot as u8);
            }
            for (slot, region) in self.regions.regions().iter().enumerate() {
                let slot = slot as u8;
                self.mpu.write_region(slot, region.rbar(slot), region.rasr()?);
            }
            self.mpu.enable_with_default_map();

            #[cfg(feature = "defmt")]
            defmt::info!("mpu: {} regions loaded", self.regions.regions().len());
        }
        full_barrier();
        self.controller.enable_monitor();
        Ok(())
    }

    /// Turn the cache on
    pub fn enable(&mut self) {
        self.controller.enable();
        full_barrier();
        #[cfg(feature = "defmt")]
        defmt::debug!("cache: enabled ({})", C::POLICY);
    }

    /// Turn the cache off, returning whether it was on.
    ///
    /// The controller is always told to disable, since it may own more than
    /// the cache `is_enabled` reports on (the M7 instruction cache). A
    /// write-back cache cleans dirty lines while it turns off; that runs
    /// with interrupts masked.
    pub fn disable(&mut self) -> bool {
        let was_enabled = self.controller.is_enabled();
        if C::POLICY == CachePolicy::WriteBack {
            let controller = &mut self.controller;
            critical_section::with(|_| controller.disable());
        } else {
            self.controller.disable();
        }
        full_barrier();
        #[cfg(feature = "defmt")]
        defmt::debug!("cache: disabled (was {})", was_enabled);
        was_enabled
    }

    /// Whether the cache is on
    pub fn is_enabled(&self) -> bool {
        self.controller.is_enabled()
    }

    /// Make CPU writes to `[address, address + len)` visible to a DMA
    /// reader.
    ///
    /// # Panics
    ///
    /// With an MPU window and the cache on, if the buffer is not inside the
    /// window.
    pub fn flush_before_dma_send(&mut self, address: usize, len: usize) {
        match C::POLICY {
            CachePolicy::None | CachePolicy::WriteThrough => data_barrier(),
            CachePolicy::WriteBack => self.write_back_hook(address, len),
        }
    }

    /// Prepare `[address, address + len)` to be written by DMA.
    ///
    /// # Panics
    ///
    /// As [`flush_before_dma_send`](Self::flush_before_dma_send).
    pub fn flush_before_dma_receive(&mut self, address: usize, len: usize) {
        self.flush_before_dma_send(address, len);
    }

    /// Drop cached copies of `[address, address + len)` after a DMA write.
    ///
    /// # Panics
    ///
    /// As [`flush_before_dma_send`](Self::flush_before_dma_send).
    pub fn invalidate_after_dma_receive(&mut self, address: usize, len: usize) {
        match C::POLICY {
            CachePolicy::None => data_barrier(),
            CachePolicy::WriteThrough => self.invalidate_all(),
            CachePolicy::WriteBack => self.write_back_hook(address, len),
        }
    }

    /// Check that a DMA buffer lies inside the non-cacheable window.
    ///
    /// # Errors
    ///
    /// [`MpuError::NoDmaWindow`] without a region table,
    /// [`MpuError::OutsideDmaWindow`] if any byte falls outside it.
    pub fn check_dma_buffer(&self, address: usize, len: usize) -> MpuResult<()> {
        let window = self.regions.dma_window().ok_or(MpuError::NoDmaWindow)?;
        if window.contains_range(address as u64, len as u64) {
            Ok(())
        } else {
            Err(MpuError::OutsideDmaWindow)
        }
    }

    /// Raw hit counter, where the controller has one
    pub fn hit_count(&self) -> Option<u32> {
        self.controller.hit_count()
    }

    /// Region table in use
    pub fn regions(&self) -> RegionTable<'static> {
        self.regions
    }

    /// Underlying cache controller
    pub fn controller(&self) -> &C {
        &self.controller
    }

    /// Underlying MPU
    pub fn mpu(&self) -> &M {
        &self.mpu
    }

    fn write_back_hook(&mut self, address: usize, len: usize) {
        if self.regions.dma_window().is_none() {
            self.invalidate_all();
            return;
        }
        assert!(
            !self.controller.is_enabled() || self.check_dma_buffer(address, len).is_ok(),
            "DMA buffer {address:#x}+{len} is outside the non-cacheable window"
        );
        data_barrier();
    }

    /// Disable, invalidate and re-enable with interrupts masked so nothing
    /// runs against a half-maintained cache.
    fn invalidate_all(&mut self) {
        if !self.controller.is_enabled() {
            data_barrier();
            return;
        }
        let controller = &mut self.controller;
        critical_section::with(|_| {
            controller.disable();
            controller.invalidate_all();
            controller.enable();
        });
        full_barrier();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hal::cache::NoCache;
    use crate::test_utils::{CacheOp, MockMpu, MockWriteBack, MockWriteThrough};

    static TABLE: [MpuRegion; 3] = [
        MpuRegion::new(0x2040_0000, 0x4_0000, MemoryAttributes::WriteBackWriteAllocate),
        MpuRegion::new(
            0x2040_0000,
            0x1_0000,
            MemoryAttributes::NonCacheable { shareable: true },
        ),
        MpuRegion::new(0x4000_0000, 0x100_0000, MemoryAttributes::Device),
    ];

    static BAD_TABLE: [MpuRegion; 1] = [MpuRegion::new(
        0x2040_0000,
        0x1_0000,
        MemoryAttributes::WriteBackWriteAllocate,
    )];

    fn m7() -> Cache<MockWriteBack, MockMpu> {
        let mut cache = Cache::with_mpu(MockWriteBack::new(), MockMpu::new(16), &TABLE);
        cache.init().unwrap();
        cache.enable();
        cache
    }

    #[test]
    fn init_clears_slots_then_loads_table() {
        let cache = m7();
        let mpu = cache.mpu();
        assert!(mpu.enabled_with_default_map());
        assert_eq!(mpu.cleared(), 16);
        let writes = mpu.writes();
        assert_eq!(writes.len(), 3);
        for (slot, (written_slot, rbar, rasr)) in writes.iter().enumerate() {
            assert_eq!(usize::from(*written_slot), slot);
            assert_eq!(*rbar, TABLE[slot].rbar(slot as u8));
            assert_eq!(Ok(*rasr), TABLE[slot].rasr());
        }
        assert!(cache.controller().ops().contains(&CacheOp::Monitor));
    }

    #[test]
    fn invalid_table_is_not_written() {
        let mut cache = Cache::with_mpu(MockWriteBack::new(), MockMpu::new(16), &BAD_TABLE);
        assert_eq!(cache.init(), Err(MpuError::NoDmaWindow));
        assert!(cache.mpu().writes().is_empty());
        assert!(!cache.mpu().enabled_with_default_map());
    }

    #[test]
    fn disable_reports_previous_state() {
        let mut cache = m7();
        assert!(cache.disable());
        assert!(!cache.is_enabled());
        assert!(!cache.disable());
    }

    #[test]
    fn disable_reaches_controller_when_already_off() {
        let mut cache = m7();
        cache.disable();
        cache.disable();
        let ops = cache.controller().ops();
        let disables = ops.iter().filter(|op| **op == CacheOp::Disable).count();
        assert_eq!(disables, 2);
    }

    #[test]
    fn buffer_inside_window_needs_no_maintenance() {
        let mut cache = m7();
        let before = cache.controller().ops().len();
        cache.flush_before_dma_send(0x2040_0100, 64);
        cache.flush_before_dma_receive(0x2040_0100, 64);
        cache.invalidate_after_dma_receive(0x2040_FFC0, 64);
        assert_eq!(cache.controller().ops().len(), before);
        assert_eq!(cache.check_dma_buffer(0x2040_0100, 64), Ok(()));
    }

    #[test]
    #[should_panic(expected = "outside the non-cacheable window")]
    fn buffer_straddling_window_is_fatal() {
        let mut cache = m7();
        cache.flush_before_dma_send(0x2040_FFF0, 0x20);
    }

    #[test]
    fn straddling_buffer_reported_without_panicking() {
        let cache = m7();
        assert_eq!(
            cache.check_dma_buffer(0x2040_FFF0, 0x20),
            Err(MpuError::OutsideDmaWindow)
        );
        let plain = Cache::new(MockWriteThrough::new());
        assert_eq!(plain.check_dma_buffer(0, 4), Err(MpuError::NoDmaWindow));
    }

    #[test]
    fn disabled_cache_skips_window_check() {
        let mut cache = m7();
        cache.disable();
        cache.invalidate_after_dma_receive(0x2050_0000, 16);
    }

    #[test]
    fn write_through_flush_is_barrier_only() {
        let mut cache = Cache::new(MockWriteThrough::new());
        cache.init().unwrap();
        cache.enable();
        let before = cache.controller().ops().len();
        cache.flush_before_dma_send(0x2000_0000, 128);
        assert_eq!(cache.controller().ops().len(), before);
        assert_eq!(cache.hit_count(), Some(0));
    }

    #[test]
    fn write_through_invalidate_cycles_whole_cache() {
        let mut cache = Cache::new(MockWriteThrough::new());
        cache.enable();
        cache.invalidate_after_dma_receive(0x2000_0000, 128);
        let ops = cache.controller().ops();
        assert_eq!(
            &ops[ops.len() - 3..],
            &[CacheOp::Disable, CacheOp::Invalidate, CacheOp::Enable]
        );
        assert!(cache.is_enabled());
    }

    #[test]
    fn write_through_invalidate_when_off_touches_nothing() {
        let mut cache = Cache::new(MockWriteThrough::new());
        cache.invalidate_after_dma_receive(0x2000_0000, 128);
        assert!(cache.controller().ops().is_empty());
    }

    #[test]
    fn write_back_without_window_invalidates_everything() {
        let mut cache = Cache::new(MockWriteBack::new());
        cache.enable();
        cache.flush_before_dma_send(0x2000_0000, 128);
        assert!(cache.controller().ops().contains(&CacheOp::Invalidate));
    }

    #[test]
    fn no_cache_part_is_inert() {
        let mut cache = Cache::new(NoCache);
        cache.init().unwrap();
        cache.enable();
        assert!(!cache.disable());
        cache.flush_before_dma_send(0, 1);
        cache.invalidate_after_dma_receive(0, 1);
        assert_eq!(cache.hit_count(), None);
    }
}
