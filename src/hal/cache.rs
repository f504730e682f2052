//! Cache controller and memory-protection capabilities

/// How the data cache treats writes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CachePolicy {
    /// No cache fitted (SAM3X)
    None,
    /// Writes always reach memory; lines are never dirty (SAM4E CMCC)
    WriteThrough,
    /// Writes may stay in the cache; lines can be dirty (Cortex-M7)
    WriteBack,
}

/// Cache controller operations
pub trait CacheController {
    /// Write policy of this controller
    const POLICY: CachePolicy;

    /// Whether the (data) cache is currently on
    fn is_enabled(&self) -> bool;

    /// Turn the cache on, invalidating first if required
    fn enable(&mut self);

    /// Turn the cache off. Write-back implementations clean dirty lines as
    /// part of this and must be called with interrupts masked.
    fn disable(&mut self);

    /// Invalidate every line
    fn invalidate_all(&mut self);

    /// Start the hit-counter monitor, if the controller has one
    fn enable_monitor(&mut self) {}

    /// Raw hit counter, if the controller has one
    fn hit_count(&self) -> Option<u32> {
        None
    }
}

/// ARMv7-M memory protection unit operations
pub trait MemoryProtection {
    /// Number of region slots implemented
    fn region_slots(&self) -> usize;

    /// Disable the unit
    fn disable(&mut self);

    /// Program one slot. `rbar`/`rasr` are raw register values.
    fn write_region(&mut self, slot: u8, rbar: u32, rasr: u32);

    /// Clear one slot
    fn clear_region(&mut self, slot: u8) {
        self.write_region(slot, 0, 0);
    }

    /// Enable the unit, keeping the default memory map for privileged
    /// accesses that hit no region
    fn enable_with_default_map(&mut self);
}

/// Controller for parts without a cache
///
/// Every operation is a no-op and the cache always reads as disabled.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCache;

impl CacheController for NoCache {
    const POLICY: CachePolicy = CachePolicy::None;

    fn is_enabled(&self) -> bool {
        false
    }

    fn enable(&mut self) {}

    fn disable(&mut self) {}

    fn invalidate_all(&mut self) {}
}

/// Placeholder for parts that have no MPU in use
#[derive(Debug, Clone, Copy, Default)]
pub struct NoMpu;

impl MemoryProtection for NoMpu {
    fn region_slots(&self) -> usize {
        0
    }

    fn disable(&mut self) {}

    fn write_region(&mut self, _slot: u8, _rbar: u32, _rasr: u32) {}

    fn enable_with_default_map(&mut self) {}
}
