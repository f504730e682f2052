//! Interrupt line capability

/// One NVIC interrupt line owned by a peripheral instance
pub trait InterruptLine {
    /// Unmask the line
    fn enable_irq(&self);

    /// Mask the line
    fn disable_irq(&self);

    /// Set the priority (0 = most urgent). Only the implemented bits are kept.
    fn set_priority(&self, priority: u8);

    /// Current priority
    fn priority(&self) -> u8;
}
