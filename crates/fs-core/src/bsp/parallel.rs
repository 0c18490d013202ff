//! Parallel (memory-mapped / address-bus) NOR BSP contract

use super::BusWidth;
use crate::error::Result;

/// Capability set a board-support package must provide for parallel NOR
/// access (Intel-compatible and SST39-style devices).
pub trait ParallelNorBsp {
    /// Map the device(s) at `base_addr`, configuring bus width and the
    /// number of interleaved devices.
    fn open(&mut self, base_addr: usize, bus_width: BusWidth, dev_count: u8) -> Result<()>;
    /// Unmap the device.
    fn close(&mut self);

    /// Read one bus word at an absolute address.
    ///
    /// For an 8-bit bus only the low byte is meaningful.
    fn rd_word(&mut self, addr: usize) -> Result<u16>;
    /// Write one bus word at an absolute address.
    fn wr_word(&mut self, addr: usize, value: u16) -> Result<()>;
}
