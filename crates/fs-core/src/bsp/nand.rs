//! NAND BSP contract

use super::{BusWidth, ChipSelect};
use crate::error::{Error, Result};

/// Default polling granularity used by the default `wait_while_busy`
/// implementation when a BSP does not override it.
const DEFAULT_POLL_DIVISOR: u32 = 64;

/// Capability set a board-support package must provide for NAND access.
///
/// All primitives report failure through the return `Result`; on any
/// primitive failure the caller must release chip-select before returning
/// (use [`crate::bsp::ChipSelectGuard`] to get this for free).
pub trait NandBsp: ChipSelect {
    /// Open the underlying bus peripheral.
    fn open(&mut self) -> Result<()>;
    /// Close the underlying bus peripheral.
    fn close(&mut self);

    /// Write command bytes.
    fn cmd_wr(&mut self, bytes: &[u8]) -> Result<()>;
    /// Write address bytes.
    fn addr_wr(&mut self, bytes: &[u8]) -> Result<()>;
    /// Write data bytes at the given bus width.
    fn data_wr(&mut self, data: &[u8], width: BusWidth) -> Result<()>;
    /// Read data bytes at the given bus width.
    fn data_rd(&mut self, buf: &mut [u8], width: BusWidth) -> Result<()>;

    /// Poll once whether the device is still busy (R/B# pin or equivalent).
    ///
    /// Returns `Ok(true)` while busy, `Ok(false)` once ready.
    fn poll_busy(&mut self) -> Result<bool>;

    /// Delay execution for the given number of microseconds.
    fn delay_us(&mut self, us: u32);

    /// Poll [`NandBsp::poll_busy`] at driver-chosen granularity until it
    /// reports ready or `timeout_us` has elapsed.
    ///
    /// The effective wall-clock wait is always >= `timeout_us`: the loop
    /// polls `ceil(timeout_us / poll_interval) + 1` times so a BSP that
    /// becomes ready exactly at the deadline still observes readiness.
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
