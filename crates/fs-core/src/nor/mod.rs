//! NOR physical-layer drivers
//!
//! [`opcodes`] and [`spi_common`] hold protocol constants and the shared
//! write-enable/poll-busy/page-program discipline every SPI family uses;
//! [`phy`] holds one module per supported part family.

#[cfg(feature = "std")]
pub mod database;
pub mod opcodes;
pub mod phy;
pub mod spi_common;
