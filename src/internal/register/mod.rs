//! Memory-mapped register access for SAM peripheral blocks
//!
//! Every SAM peripheral instance is a register block at a fixed base address.
//! Drivers hold a [`RegisterBlock`] per instance so that the same code serves
//! UART0 and UART1, TWI0 and TWI1, and so on. All register access is volatile
//! to ensure proper hardware interaction.

/// Read a 32-bit register at the given address
///
/// # Safety
/// The caller must ensure the address is valid and properly aligned.
#[inline(always)]
pub unsafe fn read_reg(addr: usize) -> u32 {
    unsafe { core::ptr::read_volatile(addr as *const u32) }
}

/// Write a 32-bit value to a register at the given address
///
/// # Safety
/// The caller must ensure the address is valid and properly aligned.
#[inline(always)]
pub unsafe fn write_reg(addr: usize, value: u32) {
    unsafe { core::ptr::write_volatile(addr as *mut u32, value) }
}

/// Modify a register using a read-modify-write operation
///
/// # Safety
/// The caller must ensure the address is valid and properly aligned.
#[inline(always)]
pub unsafe fn modify_reg<F>(addr: usize, f: F)
where
    F: FnOnce(u32) -> u32,
{
    // SAFETY: caller guarantees address validity
    let value = unsafe { read_reg(addr) };
    unsafe { write_reg(addr, f(value)) }
}

/// Base address of one peripheral register block
///
/// Constructing a block is `unsafe`: every later accessor trusts that
/// `base + offset` is a mapped, aligned register of the intended peripheral.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegisterBlock {
    base: usize,
}

impl RegisterBlock {
    /// Create a block for the peripheral mapped at `base`.
    ///
    /// # Safety
    /// `base` must be the start of a register block that stays mapped for the
    /// lifetime of the returned value, and no other owner may drive it.
    pub const unsafe fn new(base: usize) -> Self {
        Self { base }
    }

    /// Block base address
    #[inline(always)]
    pub const fn base(&self) -> usize {
        self.base
    }

    /// Read the register at `offset`
    #[inline(always)]
    pub fn read(&self, offset: usize) -> u32 {
        // SAFETY: validity of base established in `new`
        unsafe { read_reg(self.base + offset) }
    }

    /// Write the register at `offset`
    #[inline(always)]
    pub fn write(&self, offset: usize, value: u32) {
        // SAFETY: validity of base established in `new`
        unsafe { write_reg(self.base + offset, value) }
    }

    /// Read-modify-write the register at `offset`
    #[inline(always)]
    pub fn modify<F>(&self, offset: usize, f: F)
    where
        F: FnOnce(u32) -> u32,
    {
        // SAFETY: validity of base established in `new`
        unsafe { modify_reg(self.base + offset, f) }
    }

    /// Set bits in the register at `offset`
    #[inline(always)]
    pub fn set_bits(&self, offset: usize, bits: u32) {
        self.modify(offset, |v| v | bits);
    }

    /// Clear bits in the register at `offset`
    #[inline(always)]
    pub fn clear_bits(&self, offset: usize, bits: u32) {
        self.modify(offset, |v| v & !bits);
    }

    /// True when every bit of `mask` is set
    #[inline(always)]
    pub fn bits_set(&self, offset: usize, mask: u32) -> bool {
        self.read(offset) & mask == mask
    }
}

// =============================================================================
// Register Access Macros
// =============================================================================

/// Generate read/write accessor methods for a register of `self.regs`.
///
/// # Example
/// ```ignore
/// impl UartBlock {
///     reg_rw!(mode, set_mode, UART_MR, "Mode register");
/// }
/// ```
macro_rules! reg_rw {
    ($read_fn:ident, $write_fn:ident, $offset:expr, $doc:expr) => {
        #[doc = concat!("Read ", $doc)]
        #[inline(always)]
        pub fn $read_fn(&self) -> u32 {
            self.regs.read($offset)
        }

        #[doc = concat!("Write ", $doc)]
        #[inline(always)]
        pub fn $write_fn(&self, value: u32) {
            self.regs.write($offset, value)
        }
    };
}

/// Generate a read-only accessor method for a register of `self.regs`.
macro_rules! reg_ro {
    ($read_fn:ident, $offset:expr, $doc:expr) => {
        #[doc = concat!("Read ", $doc)]
        #[inline(always)]
        pub fn $read_fn(&self) -> u32 {
            self.regs.read($offset)
        }
    };
}

/// Generate a write-only accessor method for a register of `self.regs`.
///
/// Control, interrupt-enable and interrupt-disable registers on SAM parts are
/// write-only strobes: writing zero bits has no effect.
macro_rules! reg_wo {
    ($write_fn:ident, $offset:expr, $doc:expr) => {
        #[doc = concat!("Write ", $doc)]
        #[inline(always)]
        pub fn $write_fn(&self, value: u32) {
            self.regs.write($offset, value)
        }
    };
}

pub(crate) use reg_ro;
pub(crate) use reg_rw;
pub(crate) use reg_wo;
