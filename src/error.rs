//! Error types for the peripheral coordination layer
//!
//! Errors are organized by domain for better diagnostics:
//! - [`ConfigError`]: Invalid parameters handed to a driver
//! - [`BusError`]: SPI/I2C bus waits and chip-select failures
//! - [`MpuError`]: Memory-protection region table problems
//!
//! Transient hardware faults (UART overrun, framing errors, I2C NAKs) and
//! ring buffer overflow are deliberately *not* represented here. They are
//! accumulated in per-driver counters and never interrupt the data path.
//!
//! The unified [`Error`] enum wraps all domain errors and is returned
//! by most driver methods.

// =============================================================================
// Configuration Errors
// =============================================================================

/// Configuration and parameter errors
///
/// These errors are raised synchronously before any hardware is touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Analog channel number outside the logical channel space
    InvalidChannel,
    /// Baud rate of zero or above what the peripheral clock can produce
    InvalidBaudRate,
    /// Requested bus clock cannot be derived from the source clock
    InvalidClock,
    /// Caller buffer shorter than the requested transfer length
    BufferTooSmall,
    /// Too many write bytes to fold into a combined write-then-read
    TooManyWriteBytes,
    /// Invalid configuration parameter
    InvalidConfig,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ConfigError {
    /// Returns a human-readable description of the error
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            ConfigError::InvalidChannel => "invalid analog channel",
            ConfigError::InvalidBaudRate => "invalid baud rate",
            ConfigError::InvalidClock => "bus clock not reachable",
            ConfigError::BufferTooSmall => "buffer too small for transfer",
            ConfigError::TooManyWriteBytes => "too many write bytes for combined transfer",
            ConfigError::InvalidConfig => "invalid configuration",
        }
    }
}

// =============================================================================
// Bus Errors
// =============================================================================

/// Shared bus errors
///
/// A timed-out transfer is abandoned in place: bytes already clocked out
/// stay transferred.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BusError {
    /// A status bit did not appear within the iteration budget
    Timeout,
    /// The bus is held by another transaction
    Busy,
    /// Driving the chip-select pin failed
    ChipSelect,
}

impl core::fmt::Display for BusError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl BusError {
    /// Returns a human-readable description of the error
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            BusError::Timeout => "bus wait timed out",
            BusError::Busy => "bus busy",
            BusError::ChipSelect => "chip-select pin error",
        }
    }
}

// =============================================================================
// MPU Errors
// =============================================================================

/// Memory-protection region errors
///
/// Raised while validating a region table, before anything is written to
/// the MPU.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MpuError {
    /// Region size is zero
    SizeZero,
    /// Region size is below the 32-byte hardware minimum
    SizeTooSmall,
    /// Region size is not a power of two
    SizeNotPowerOfTwo,
    /// Base address is not aligned to the region size
    AddressMisaligned,
    /// Table holds more regions than the MPU has slots
    TooManyRegions,
    /// No region marks a non-cacheable DMA window
    NoDmaWindow,
    /// More than one region marks a non-cacheable DMA window
    MultipleDmaWindows,
    /// Buffer is not entirely inside the non-cacheable DMA window
    OutsideDmaWindow,
}

impl core::fmt::Display for MpuError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl MpuError {
    /// Returns a human-readable description of the error
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            MpuError::SizeZero => "region size is zero",
            MpuError::SizeTooSmall => "region smaller than 32 bytes",
            MpuError::SizeNotPowerOfTwo => "region size not a power of two",
            MpuError::AddressMisaligned => "region base not aligned to size",
            MpuError::TooManyRegions => "more regions than MPU slots",
            MpuError::NoDmaWindow => "no non-cacheable DMA window",
            MpuError::MultipleDmaWindows => "more than one DMA window",
            MpuError::OutsideDmaWindow => "buffer outside DMA window",
        }
    }
}

// =============================================================================
// Unified Error Type
// =============================================================================

/// This enum wraps all domain-specific errors for unified error handling.
///
/// Match on the inner domain error for specific handling:
/// ```ignore
/// match result {
///     Err(Error::Config(ConfigError::InvalidChannel)) => { /* ... */ }
///     Err(Error::Bus(BusError::Timeout)) => { /* ... */ }
///     Err(Error::Mpu(MpuError::NoDmaWindow)) => { /* ... */ }
///     _ => {}
/// }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// Configuration error
    Config(ConfigError),
    /// Bus error
    Bus(BusError),
    /// MPU error
    Mpu(MpuError),
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Error::Config(e) => write!(f, "config: {}", e.as_str()),
            Error::Bus(e) => write!(f, "bus: {}", e.as_str()),
            Error::Mpu(e) => write!(f, "mpu: {}", e.as_str()),
        }
    }
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Error::Config(e)
    }
}

impl From<BusError> for Error {
    fn from(e: BusError) -> Self {
        Error::Bus(e)
    }
}

impl From<MpuError> for Error {
    fn from(e: MpuError) -> Self {
        Error::Mpu(e)
    }
}

/// Result type alias for driver operations
pub type Result<T> = core::result::Result<T, Error>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = core::result::Result<T, ConfigError>;

/// Result type alias for bus operations
pub type BusResult<T> = core::result::Result<T, BusError>;

/// Result type alias for MPU operations
pub type MpuResult<T> = core::result::Result<T, MpuError>;
