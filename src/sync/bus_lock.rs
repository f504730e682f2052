//! Non-blocking ownership flag for a shared bus.

use super::primitives::CriticalSectionCell;

/// Mutual-exclusion flag for one shared SPI bus.
///
/// `acquire` is test-and-set inside a critical section, so at most one caller
/// (task or ISR) holds the bus at a time. It never blocks: callers that lose
/// the race simply retry later.
pub struct BusLock {
    taken: CriticalSectionCell<bool>,
}

impl BusLock {
    /// Create an unlocked bus (const, suitable for static initialization).
    pub const fn new() -> Self {
        Self {
            taken: CriticalSectionCell::new(false),
        }
    }

    /// Take the bus. Returns `false` if it is already held.
    #[must_use]
    pub fn acquire(&self) -> bool {
        self.taken.with(|taken| {
            if *taken {
                false
            } else {
                *taken = true;
                true
            }
        })
    }

    /// Give the bus back.
    pub fn release(&self) {
        self.taken.with(|taken| *taken = false);
    }

    /// Whether some caller currently holds the bus.
    pub fn is_locked(&self) -> bool {
        self.taken.get()
    }
}

impl Default for BusLock {
    fn default() -> Self {
        Self::new()
    }
}
