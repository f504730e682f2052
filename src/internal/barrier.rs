//! Memory barriers
//!
//! On Cortex-M these issue `DSB` followed by `ISB`. Host builds (unit tests)
//! fall back to a sequentially consistent fence.

/// Complete outstanding memory accesses and flush the pipeline.
#[inline(always)]
pub fn full_barrier() {
    #[cfg(target_arch = "arm")]
    {
        cortex_m::asm::dsb();
        cortex_m::asm::isb();
    }
    #[cfg(not(target_arch = "arm"))]
    core::sync::atomic::fence(core::sync::atomic::Ordering::SeqCst);
}

/// Complete outstanding memory accesses.
#[inline(always)]
pub fn data_barrier() {
    #[cfg(target_arch = "arm")]
    cortex_m::asm::dsb();
    #[cfg(not(target_arch = "arm"))]
    core::sync::atomic::fence(core::sync::atomic::Ordering::SeqCst);
}
