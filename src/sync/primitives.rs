//! Synchronization primitives for ISR-safe access.
//!
//! Low-level primitives shared by the serial, SPI and I2C drivers.

use core::cell::RefCell;
use critical_section::Mutex;

/// Cell providing interior mutability with critical section protection.
///
/// Combines `critical_section::Mutex` with `RefCell` for safe mutable access
/// from both normal code and interrupt handlers.
pub struct CriticalSectionCell<T> {
    inner: Mutex<RefCell<T>>,
}

impl<T> CriticalSectionCell<T> {
    /// Create a new cell (const, suitable for static initialization).
    pub const fn new(value: T) -> Self {
        Self {
            inner: Mutex::new(RefCell::new(value)),
        }
    }

    /// Execute a closure with exclusive mutable access.
    ///
    /// Interrupts are disabled for the duration of the closure.
    #[inline]
    pub fn with<R, F>(&self, f: F) -> R
    where
        F: FnOnce(&mut T) -> R,
    {
        critical_section::with(|cs| {
            let mut value = self.inner.borrow_ref_mut(cs);
            f(&mut value)
        })
    }

    /// Execute a closure with immutable access.
    #[inline]
    pub fn with_ref<R, F>(&self, f: F) -> R
    where
        F: FnOnce(&T) -> R,
    {
        critical_section::with(|cs| {
            let value = self.inner.borrow_ref(cs);
            f(&value)
        })
    }

    /// Replace the contained value, returning the previous one.
    #[inline]
    pub fn replace(&self, value: T) -> T {
        self.with(|slot| core::mem::replace(slot, value))
    }
}

impl<T: Default> CriticalSectionCell<T> {
    /// Take the contained value, leaving `T::default()` behind.
    #[inline]
    pub fn take(&self) -> T {
        self.with(core::mem::take)
    }
}

impl<T: Copy> CriticalSectionCell<T> {
    /// Copy the contained value out.
    #[inline]
    pub fn get(&self) -> T {
        self.with_ref(|v| *v)
    }
}

// SAFETY: every access happens inside a critical section, so the value is
// only ever touched from one context at a time. It may move between thread
// and interrupt context, hence `T: Send`.
unsafe impl<T: Send> Sync for CriticalSectionCell<T> {}

#[cfg(test)]
#[allow(clippy::std_instead_of_core, clippy::std_instead_of_alloc)]
mod tests {
    extern crate std;

    use super::*;

    #[test]
    fn critical_section_cell_new() {
        let cell: CriticalSectionCell<u32> = CriticalSectionCell::new(42);
        let value = cell.with(|v| *v);
        assert_eq!(value, 42);
    }

    #[test]
    fn critical_section_cell_with_mutates() {
        let cell: CriticalSectionCell<u32> = CriticalSectionCell::new(0);
        cell.with(|v| *v += 10);
        assert_eq!(cell.get(), 10);
    }

    #[test]
    fn critical_section_cell_with_ref_reads() {
        let cell: CriticalSectionCell<u32> = CriticalSectionCell::new(42);
        let value = cell.with_ref(|v| *v);
        assert_eq!(value, 42);
    }

    #[test]
    fn critical_section_cell_replace_returns_previous() {
        let cell: CriticalSectionCell<Option<u8>> = CriticalSectionCell::new(Some(1));
        assert_eq!(cell.replace(Some(2)), Some(1));
        assert_eq!(cell.get(), Some(2));
    }

    #[test]
    fn critical_section_cell_take_resets_to_default() {
        let cell: CriticalSectionCell<u32> = CriticalSectionCell::new(7);
        assert_eq!(cell.take(), 7);
        assert_eq!(cell.get(), 0);
    }

    #[test]
    fn critical_section_cell_is_sync_for_send_values() {
        fn assert_sync<T: Sync>() {}
        assert_sync::<CriticalSectionCell<u32>>();
        assert_sync::<CriticalSectionCell<Option<fn()>>>();
    }

    #[test]
    fn critical_section_cell_static_usage() {
        static CELL: CriticalSectionCell<u32> = CriticalSectionCell::new(0);
        CELL.with(|v| *v = 100);
        let value = CELL.with(|v| *v);
        assert_eq!(value, 100);
    }
}
