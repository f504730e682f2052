//! Internal Implementation Details
//!
//! This module contains implementation details that are not part of the public API.
//! Types in this module may change without notice between minor versions.
//!
//! # Contents
//!
//! - [`register`]: Raw memory-mapped register access
//! - [`constants`]: Internal constants and magic numbers
//! - [`barrier`]: Memory barriers used around cache and MPU maintenance
//!
//! # Stability
//!
//! **WARNING:** This module is `pub(crate)` only. Do not depend on any types
//! or functions in this module from external code. They are subject to change
//! without notice.

pub(crate) mod barrier;
pub(crate) mod constants;
pub(crate) mod register;
