//! SPI NOR BSP contract

use super::ChipSelect;
use crate::error::{Error, Result};

const DEFAULT_POLL_DIVISOR: u32 = 64;

bitflags::bitflags! {
    /// Capabilities an identified SPI NOR part reports, analogous to the
    /// capability flags a CFI/SFDP query would surface for a parallel part.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct SpiFeatures: u8 {
        /// Supports Fast Read (0x0B) rather than only the slow Read (0x03).
        const FAST_READ = 1 << 0;
        /// Exceeds the 3-byte address space and needs `EN4B`/`EX4B`.
        const FOUR_BYTE_ADDR = 1 << 1;
        /// Programs through AAI (Auto Address Increment) rather than a
        /// bounded page-program command.
        const AAI_WORD = 1 << 2;
    }
}

/// Capability set a board-support package must provide for SPI NOR access.
pub trait SpiNorBsp: ChipSelect {
    /// Open the underlying SPI peripheral.
    fn open(&mut self) -> Result<()>;
    /// Close the underlying SPI peripheral.
    fn close(&mut self);

    /// Acquire the shared SPI bus (multiple chip selects may share one bus).
    fn lock(&mut self);
    /// Release the shared SPI bus.
    fn unlock(&mut self);

    /// Shift bytes out on MOSI while driving the clock, discarding MISO.
    fn wr(&mut self, data: &[u8]) -> Result<()>;
    /// Shift bytes in from MISO while driving the clock.
    fn rd(&mut self, buf: &mut [u8]) -> Result<()>;

    /// Change the SPI clock frequency.
    fn set_clk_freq(&mut self, hz: u32) -> Result<()>;

    /// Poll once whether the device reports BUSY.
    fn poll_busy(&mut self) -> Result<bool>;
    /// Delay for the given number of microseconds.
    fn delay_us(&mut self, us: u32);

    /// Poll [`SpiNorBsp::poll_busy`] until ready or `timeout_us` elapses.
    fn wait_while_busy(&mut self, timeout_us: u32) -> Result<()> {
        let poll_interval_us = core::cmp::max(1, timeout_us / DEFAULT_POLL_DIVISOR);
        let max_polls = timeout_us.div_ceil(poll_interval_us) + 1;

        for _ in 0..max_polls {
            if !self.poll_busy()? {
                return Ok(());
            }
            self.delay_us(poll_interval_us);
        }
        Err(Error::Timeout)
    }
}
