//! Codec layer for the compact binary primitives.
//!
//! # Submodules
//!
//! - [`chars`][]: 1-or-3 byte character encoding with a run terminator
//! - [`address`][]: variable-width (1 to 3 byte) offsets and their flag bits

pub mod address;
pub mod chars;
