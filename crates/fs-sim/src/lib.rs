//! In-memory BSP test doubles for `fs-core`.
//!
//! Each module implements one of `fs_core::bsp`'s capability traits against
//! a flat in-memory array, reproducing just enough of the real protocol's
//! command/address/data framing for the generic controller and physical
//! layer drivers to exercise their full read/program/erase paths without
//! real hardware.

pub mod ext;
pub mod nand;
pub mod parallel;
pub mod spi;

pub use ext::XorParityExt;
pub use nand::SimNandBsp;
pub use parallel::SimParallelNorBsp;
pub use spi::SimSpiNorBsp;
