//! Intel-compatible parallel NOR
//!
//! Self-identifies through the Common Flash Interface (CFI) query protocol:
//! entering query mode at device offset `0x10` must yield the `QRY`
//! signature and the Intel/Sharp command-set algorithm code (`0x0001`).
//! Program and erase each write-enable, send the command, and poll the
//! status register; the device is always returned to read-array mode on
//! either success or failure.

use crate::bsp::{BusWidth, ParallelNorBsp};
use crate::error::{Error, Result};

use super::super::opcodes;

/// Parsed CFI query table fields this driver depends on.
#[derive(Debug, Clone, Copy)]
pub struct CfiInfo {
    /// Device size in octets.
    pub size: u32,
    /// Number of erase-block regions.
    pub region_cnt: u8,
    /// Octets per programmable unit (write buffer size, 1 if unsupported).
    pub write_buffer_size: u32,
}

const CFI_QUERY_OFFSET: usize = 0x10;
const CFI_SIGNATURE: [u8; 3] = *b"QRY";
const INTEL_ALGORITHM_CODE: u16 = 0x0001;

/// Default program/erase status-poll timeout.
pub const OP_TIMEOUT_US: u32 = 2_000_000;

/// Intel-compatible parallel NOR driver.
pub struct Intel<B> {
    bsp: B,
    bus_width: BusWidth,
    dev_count: u8,
    base_addr: usize,
    cfi: Option<CfiInfo>,
}

impl<B: ParallelNorBsp> Intel<B> {
    /// Wrap `bsp`, mapping the device(s) at `base_addr`.
    pub fn new(bsp: B, base_addr: usize, bus_width: BusWidth, dev_count: u8) -> Self {
        Self {
            bsp,
            bus_width,
            dev_count,
            base_addr,
            cfi: None,
        }
    }

    /// Map the device and run the CFI query, failing on any inconsistency.
    pub fn open(&mut self) -> Result<()> {
        self.bsp.open(self.base_addr, self.bus_width, self.dev_count)?;
        self.bsp.wr_word(self.base_addr, opcodes::CFI_QUERY)?;

        let mut sig = [0u8; 3];
        for (i, b) in sig.iter_mut().enumerate() {
            *b = self.bsp.rd_word(self.base_addr + CFI_QUERY_OFFSET + i)? as u8;
        }
        if sig != CFI_SIGNATURE {
            self.bsp.wr_word(self.base_addr, opcodes::CMD_READ_ARRAY)?;
            return Err(Error::InvalidLowParams);
        }

        let algo = self.bsp.rd_word(self.base_addr + CFI_QUERY_OFFSET + 3)?;
        if algo != INTEL_ALGORITHM_CODE {
            self.bsp.wr_word(self.base_addr, opcodes::CMD_READ_ARRAY)?;
            return Err(Error::InvalidLowParams);
        }

        let size_code = self.bsp.rd_word(self.base_addr + 0x27)? as u32;
        let region_cnt = self.bsp.rd_word(self.base_addr + 0x2C)? as u8;
        let write_buffer_code = self.bsp.rd_word(self.base_addr + 0x2A)?;
        let write_buffer_size = if write_buffer_code == 0 {
            1
        } else {
            1u32 << write_buffer_code
        };

        self.cfi = Some(CfiInfo {
            size: 1u32 << size_code,
            region_cnt,
            write_buffer_size,
        });

        self.bsp.wr_word(self.base_addr, opcodes::CMD_READ_ARRAY)?;
        Ok(())
    }

    /// Unmap the device.
    pub fn close(&mut self) {
        self.bsp.close();
    }

    /// CFI-derived geometry, available after a successful [`Intel::open`].
    pub fn cfi(&self) -> Option<CfiInfo> {
        self.cfi
    }

    /// Read `buf.len()` octets starting at `addr` in read-array mode.
    pub fn read(&mut self, addr: usize, buf: &mut [u8]) -> Result<()> {
        for (i, b) in buf.iter_mut().enumerate() {
            *b = self.bsp.rd_word(self.base_addr + addr + i)? as u8;
        }
        Ok(())
    }

    fn wait_ready(&mut self) -> Result<u16> {
        let poll_interval_us = core::cmp::max(1, OP_TIMEOUT_US / 64);
        let max_polls = OP_TIMEOUT_US.div_ceil(poll_interval_us) + 1;
        for _ in 0..max_polls {
            let sr = self.bsp.rd_word(self.base_addr)?;
            if sr & opcodes::INTEL_SR_WSMS != 0 {
                return Ok(sr);
            }
            // A parallel BSP has no generic delay primitive; the status
            // register itself is the only progress signal available.
        }
        Err(Error::Timeout)
    }

    /// Program one octet at `addr`.
    pub fn program(&mut self, addr: usize, value: u8) -> Result<()> {
        self.bsp.wr_word(self.base_addr, opcodes::CMD_CLEAR_STATUS)?;
        self.bsp
            .wr_word(self.base_addr + addr, opcodes::CMD_PROGRAM)?;
        self.bsp.wr_word(self.base_addr + addr, value as u16)?;

        let sr = self.wait_ready()?;
        self.bsp.wr_word(self.base_addr, opcodes::CMD_READ_ARRAY)?;
        if sr & (opcodes::INTEL_SR_PROGRAM_ERR | opcodes::INTEL_SR_LOCK_ERR) != 0 {
            return Err(Error::OpFailed);
        }
        Ok(())
    }

    /// Erase the block containing `addr`.
    pub fn erase_block(&mut self, addr: usize) -> Result<()> {
        self.bsp.wr_word(self.base_addr, opcodes::CMD_CLEAR_STATUS)?;
        self.bsp
            .wr_word(self.base_addr + addr, opcodes::CMD_ERASE_SETUP)?;
        self.bsp
            .wr_word(self.base_addr + addr, opcodes::CMD_ERASE_CONFIRM)?;

        let sr = self.wait_ready()?;
        self.bsp.wr_word(self.base_addr, opcodes::CMD_READ_ARRAY)?;
        if sr & (opcodes::INTEL_SR_ERASE_ERR | opcodes::INTEL_SR_LOCK_ERR) != 0 {
            return Err(Error::OpFailed);
        }
        Ok(())
    }
}
