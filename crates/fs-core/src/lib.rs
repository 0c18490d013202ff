//! Core library for a NAND/NOR block-device driver suite.
//!
//! Three layers compose around a hardware-independent core:
//!
//! - [`bsp`] defines the capability traits a board-support package must
//!   implement (chip-select, raw bus cycles, busy polling). This crate
//!   consumes those traits; it never implements them for real hardware.
//! - [`nand`] and [`nor`] drive specific part families through the BSP
//!   seam: a generic command-protocol controller for NAND, a
//!   family-specific physical-layer driver for NOR.
//! - [`device`] unifies every driver behind one sector-oriented façade.
//!
//! `no_std` by default; enable the `std` feature for `serde`
//! (de)serializable configuration types and `std::error::Error`.

#![cfg_attr(not(feature = "std"), no_std)]
#![warn(missing_docs)]

#[cfg(feature = "alloc")]
extern crate alloc;

pub mod bsp;
pub mod device;
pub mod error;
pub mod nand;
pub mod nor;
#[cfg(feature = "alloc")]
pub mod pool;
pub mod registry;

pub use error::{Error, Result};
#[cfg(feature = "std")]
pub use error::Report;
