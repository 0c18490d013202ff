//! Board-support-package (BSP) adapter contracts
//!
//! The BSP is a capability set consumed by this crate, never implemented by
//! it: chip-select control, raw bus-cycle I/O, and busy-wait polling are all
//! provided by a board-specific adapter. This module only defines the traits
//! the rest of the crate is written against; `fs-sim` provides in-memory
//! implementations used by the test suite.

mod guard;
mod nand;
mod parallel;
mod spi;

pub use guard::{ChipSelect, ChipSelectGuard};
pub use nand::NandBsp;
pub use parallel::ParallelNorBsp;
pub use spi::{SpiFeatures, SpiNorBsp};

/// Bus width a BSP primitive operates at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub enum BusWidth {
    /// 8-bit bus
    Eight,
    /// 16-bit bus
    Sixteen,
}

impl BusWidth {
    /// Number of bits
    pub const fn bits(&self) -> u8 {
        match self {
            Self::Eight => 8,
            Self::Sixteen => 16,
        }
    }
}
