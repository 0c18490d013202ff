//! SST39-family parallel NOR
//!
//! Uses the classic two-cycle AMD-style unlock sequence
//! (`0x5555 <- 0xAA`, `0x2AAA <- 0x55`) ahead of every command, and an SST
//! algorithm code (`0x0701` or `0x0002`) read back through the
//! software-ID sequence instead of a CFI query. Completion is detected by
//! the toggle-bit method: two successive reads of the same address return
//! an identical DQ6 value once the operation has finished.

use crate::bsp::ParallelNorBsp;
use crate::error::{Error, Result};

use super::super::opcodes;

/// Accepted SST algorithm codes.
const SST_ALGORITHM_CODES: [u16; 2] = [0x0701, 0x0002];

/// Default program/erase completion-poll bound (iteration count, since a
/// parallel BSP has no delay primitive of its own).
pub const MAX_TOGGLE_POLLS: u32 = 1_000_000;

/// SST39-family driver.
pub struct Sst39<B> {
    bsp: B,
    base_addr: usize,
}

impl<B: ParallelNorBsp> Sst39<B> {
    /// Wrap `bsp`, mapping the device at `base_addr`.
    pub fn new(bsp: B, base_addr: usize) -> Self {
        Self { bsp, base_addr }
    }

    fn unlock(&mut self) -> Result<()> {
        self.bsp.wr_word(
            self.base_addr + opcodes::SST39_UNLOCK_ADDR1,
            opcodes::SST39_UNLOCK_DATA1,
        )?;
        self.bsp.wr_word(
            self.base_addr + opcodes::SST39_UNLOCK_ADDR2,
            opcodes::SST39_UNLOCK_DATA2,
        )
    }

    /// Map the device and verify it reports an SST algorithm code through
    /// the software-ID sequence.
    pub fn open(&mut self, bus_width: crate::bsp::BusWidth) -> Result<()> {
        self.bsp.open(self.base_addr, bus_width, 1)?;

        self.unlock()?;
        self.bsp
            .wr_word(self.base_addr + opcodes::SST39_UNLOCK_ADDR1, opcodes::SST39_CMD_SOFTWARE_ID)?;
        let manufacturer = self.bsp.rd_word(self.base_addr)?;
        let device = self.bsp.rd_word(self.base_addr + 1)?;
        self.bsp
            .wr_word(self.base_addr, opcodes::SST39_CMD_RESET)?;

        if manufacturer != opcodes::SST39_MANUFACTURER_ID {
            return Err(Error::InvalidLowParams);
        }
        if !SST_ALGORITHM_CODES.contains(&device) {
            return Err(Error::InvalidLowParams);
        }
        Ok(())
    }

    /// Unmap the device.
    pub fn close(&mut self) {
        self.bsp.close();
    }

    /// Read one octet at `addr`.
    pub fn read(&mut self, addr: usize) -> Result<u8> {
        Ok(self.bsp.rd_word(self.base_addr + addr)? as u8)
    }

    fn poll_toggle(&mut self, addr: usize) -> Result<()> {
        let mut prev = self.bsp.rd_word(self.base_addr + addr)? & opcodes::SST39_TOGGLE_BIT;
        for _ in 0..MAX_TOGGLE_POLLS {
            let cur = self.bsp.rd_word(self.base_addr + addr)? & opcodes::SST39_TOGGLE_BIT;
            if cur == prev {
                return Ok(());
            }
            prev = cur;
        }
        Err(Error::Timeout)
    }

    /// Program one octet at `addr`.
    pub fn program(&mut self, addr: usize, value: u8) -> Result<()> {
        self.unlock()?;
        self.bsp
            .wr_word(self.base_addr + opcodes::SST39_UNLOCK_ADDR1, opcodes::SST39_CMD_PROGRAM)?;
        self.bsp.wr_word(self.base_addr + addr, value as u16)?;
        self.poll_toggle(addr)
    }

    /// Erase the 4 KiB sector containing `addr`.
    pub fn erase_sector(&mut self, addr: usize) -> Result<()> {
        self.unlock()?;
        self.bsp.wr_word(
            self.base_addr + opcodes::SST39_UNLOCK_ADDR1,
            opcodes::SST39_CMD_SECTOR_ERASE,
        )?;
        self.unlock()?;
        self.bsp
            .wr_word(self.base_addr + addr, opcodes::SST39_CMD_SECTOR_ERASE)?;
        self.poll_toggle(addr)
    }
}

#[cfg(all(test, feature = "alloc"))]
mod tests {
    use super::*;
    use crate::bsp::BusWidth;
    use fs_sim::SimParallelNorBsp;

    #[test]
    fn open_rejects_a_mismatched_manufacturer_id() {
        let bsp = SimParallelNorBsp::new_sst39(256, 0x00EF, 0x0701);
        let mut sst = Sst39::new(bsp, 0);
        assert!(matches!(sst.open(BusWidth::Eight), Err(Error::InvalidLowParams)));
    }
}
