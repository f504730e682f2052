//! Centralized Constants
//!
//! This module provides a single source of truth for the magic numbers and
//! default values shared by the peripheral drivers.
//!
//! # Organization
//!
//! Constants are grouped by category:
//! - **Serial**: Ring buffer sizing, overflow sentinel, interrupt sequence
//! - **Bus timing**: SPI and I2C wait budgets
//! - **Clocks**: TWI clock limits
//! - **Analog**: Per-channel calibration defaults
//! - **Memory protection**: MPU region limits, NVIC priority width
//!
//! # Note
//!
//! Hardware register offsets and bit definitions live in the per-family
//! modules (`family/sam3x.rs`, `family/sam4e.rs`, `family/same70.rs`) as they
//! are specific to those register blocks.

// =============================================================================
// Serial
// =============================================================================

/// Default serial ring buffer capacity in slots (one slot is always kept free)
pub const RING_BUFFER_SIZE: usize = 512;

/// Byte stored in place of the newest element when the ring buffer overflows,
/// or into the receive stream on a UART overrun/framing error
pub const OVERFLOW_SENTINEL: u8 = 0x7F;

/// First byte of the out-of-band interrupt sequence
pub const INTERRUPT_SEQUENCE_FIRST: u8 = 0xF0;

/// Second byte of the out-of-band interrupt sequence
pub const INTERRUPT_SEQUENCE_SECOND: u8 = 0x0F;

/// Default serial baud rate
pub const DEFAULT_BAUD_RATE: u32 = 57_600;

// =============================================================================
// Bus Timing
// =============================================================================

/// Maximum status-poll iterations for one SPI byte phase
pub const SPI_TIMEOUT_ITERATIONS: u32 = 15_000;

/// Byte clocked out when a receive-only SPI transfer has no source buffer
pub const SPI_FILLER_BYTE: u8 = 0xFF;

/// Default SPI clock in Hz
pub const DEFAULT_SPI_CLOCK_HZ: u32 = 2_000_000;

/// Default I2C status-poll iteration budget
pub const DEFAULT_I2C_WAIT_ITERATIONS: u32 = 100_000;

/// Largest internal address the TWI can send ahead of a read (bytes)
pub const MAX_TWI_INTERNAL_ADDRESS_BYTES: usize = 3;

// =============================================================================
// Clocks
// =============================================================================

/// Fastest supported TWI bus clock in Hz (fast mode)
pub const TWI_MAX_CLOCK_HZ: u32 = 400_000;

/// Default TWI bus clock in Hz (standard mode)
pub const TWI_DEFAULT_CLOCK_HZ: u32 = 100_000;

/// Largest TWI clock prescaler exponent
pub const TWI_MAX_CKDIV: u32 = 7;

// =============================================================================
// Analog
// =============================================================================

/// Analog front-end offset applied to every enabled channel (mid-scale)
pub const ANALOG_CHANNEL_OFFSET: u16 = 2048;

// =============================================================================
// Memory Protection / Interrupts
// =============================================================================

/// Smallest MPU region in bytes
pub const MPU_MIN_REGION_SIZE: u32 = 32;

/// Number of MPU region slots on ARMv7-M
pub const MPU_REGION_SLOTS: usize = 16;

/// Number of implemented NVIC priority bits on SAM parts
pub const NVIC_PRIORITY_BITS: u8 = 4;
