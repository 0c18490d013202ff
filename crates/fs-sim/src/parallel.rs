//! In-memory parallel NOR BSP
//!
//! Unlike the SPI contract, [`ParallelNorBsp`] has no chip-select framing:
//! every cycle is one absolute-addressed word access, so the simulated
//! device is a flat word array plus a small command-register state machine
//! mirroring what `intel`/`sst39` actually write to it.

use fs_core::bsp::{BusWidth, ParallelNorBsp};
use fs_core::error::Result;
use fs_core::nor::opcodes;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    ReadArray,
    CfiQuery,
    SoftwareId,
}

/// In-memory Intel-or-SST39-compatible parallel NOR device.
pub struct SimParallelNorBsp {
    mem: Vec<u16>,
    block_size_words: usize,
    manufacturer_id: u16,
    device_id: u16,
    cfi_table: Vec<u16>,
    mode: Mode,
    armed: Option<u16>,
    status_ready_pending: bool,
}

impl SimParallelNorBsp {
    /// Build an Intel-style device: `len_words` words, CFI query table
    /// encoding `size_code`/`region_cnt`/`write_buffer_code` the way
    /// `Intel::open` expects to find them.
    pub fn new_intel(len_words: usize, size_code: u16, region_cnt: u16, write_buffer_code: u16) -> Self {
        let mut cfi_table = vec![0u16; 0x30];
        cfi_table[0x10] = b'Q' as u16;
        cfi_table[0x11] = b'R' as u16;
        cfi_table[0x12] = b'Y' as u16;
        cfi_table[0x13] = 0x0001;
        cfi_table[0x27] = size_code;
        cfi_table[0x2A] = write_buffer_code;
        cfi_table[0x2C] = region_cnt;
        Self {
            mem: vec![0xFFFFu16; len_words],
            block_size_words: 32,
            manufacturer_id: 0,
            device_id: 0x0001,
            cfi_table,
            mode: Mode::ReadArray,
            armed: None,
            status_ready_pending: false,
        }
    }

    /// Build an SST39-style device: `len_words` words, software-ID
    /// algorithm code `device_id` (must be one of the codes `Sst39::open`
    /// accepts).
    pub fn new_sst39(len_words: usize, manufacturer_id: u16, device_id: u16) -> Self {
        Self {
            mem: vec![0xFFFFu16; len_words],
            block_size_words: 32,
            manufacturer_id,
            device_id,
            cfi_table: Vec::new(),
            mode: Mode::ReadArray,
            armed: None,
            status_ready_pending: false,
        }
    }

    /// Snapshot of the simulated array.
    pub fn data(&self) -> &[u16] {
        &self.mem
    }
}

impl ParallelNorBsp for SimParallelNorBsp {
    fn open(&mut self, _base_addr: usize, _bus_width: BusWidth, _dev_count: u8) -> Result<()> {
        Ok(())
    }

    fn close(&mut self) {}

    fn rd_word(&mut self, addr: usize) -> Result<u16> {
        match self.mode {
            Mode::CfiQuery => Ok(self.cfi_table.get(addr).copied().unwrap_or(0)),
            Mode::SoftwareId => Ok(match addr {
                0 => self.manufacturer_id,
                1 => self.device_id,
                _ => 0,
            }),
            Mode::ReadArray => {
                if addr == 0 && self.status_ready_pending {
                    Ok(opcodes::INTEL_SR_WSMS)
                } else {
                    Ok(self.mem.get(addr).copied().unwrap_or(0xFFFF))
                }
            }
        }
    }

    fn wr_word(&mut self, addr: usize, value: u16) -> Result<()> {
        match (addr, value) {
            (0, opcodes::CFI_QUERY) => {
                self.mode = Mode::CfiQuery;
                return Ok(());
            }
            (0, opcodes::CMD_READ_ARRAY) => {
                self.mode = Mode::ReadArray;
                self.status_ready_pending = false;
                self.armed = None;
                return Ok(());
            }
            (0, opcodes::CMD_CLEAR_STATUS) => {
                self.status_ready_pending = false;
                return Ok(());
            }
            (0, opcodes::CMD_PROGRAM) => {
                self.armed = Some(opcodes::CMD_PROGRAM);
                return Ok(());
            }
            (0, opcodes::CMD_ERASE_SETUP) => {
                self.armed = Some(opcodes::CMD_ERASE_SETUP);
                return Ok(());
            }
            (opcodes::SST39_UNLOCK_ADDR1, opcodes::SST39_CMD_SOFTWARE_ID) => {
                self.mode = Mode::SoftwareId;
                return Ok(());
            }
            (_, opcodes::SST39_CMD_RESET) => {
                self.mode = Mode::ReadArray;
                self.armed = None;
                return Ok(());
            }
            (opcodes::SST39_UNLOCK_ADDR1, opcodes::SST39_CMD_PROGRAM) => {
                self.armed = Some(opcodes::SST39_CMD_PROGRAM);
                return Ok(());
            }
            (opcodes::SST39_UNLOCK_ADDR1, opcodes::SST39_CMD_SECTOR_ERASE) => {
                self.armed = Some(opcodes::SST39_CMD_SECTOR_ERASE);
                return Ok(());
            }
            (opcodes::SST39_UNLOCK_ADDR1, opcodes::SST39_UNLOCK_DATA1)
            | (opcodes::SST39_UNLOCK_ADDR2, opcodes::SST39_UNLOCK_DATA2) => return Ok(()),
            _ => {}
        }

        match self.armed {
            Some(op) if op == opcodes::CMD_PROGRAM || op == opcodes::SST39_CMD_PROGRAM => {
                if let Some(slot) = self.mem.get_mut(addr) {
                    *slot &= value;
                }
                self.status_ready_pending = true;
                self.armed = None;
            }
            Some(opcodes::CMD_ERASE_SETUP) if value == opcodes::CMD_ERASE_CONFIRM => {
                let start = addr - addr % self.block_size_words;
                let end = (start + self.block_size_words).min(self.mem.len());
                self.mem[start..end].fill(0xFFFF);
                self.status_ready_pending = true;
                self.armed = None;
            }
            Some(opcodes::SST39_CMD_SECTOR_ERASE) if value == opcodes::SST39_CMD_SECTOR_ERASE => {
                let start = addr - addr % self.block_size_words;
                let end = (start + self.block_size_words).min(self.mem.len());
                self.mem[start..end].fill(0xFFFF);
                self.armed = None;
            }
            _ => {
                if let Some(slot) = self.mem.get_mut(addr) {
                    *slot = value;
                }
            }
        }
        Ok(())
    }
}
