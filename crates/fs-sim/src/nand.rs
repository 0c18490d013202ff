//! In-memory NAND BSP
//!
//! Tracks the command/address framing the generic controller issues
//! ([`fs_core::nand::ctrlr::NandCtrlr`]) against a flat `(page + spare)`
//! array. Address bytes are decoded with the same [`AddrSizes`] derivation
//! the controller itself uses, so the simulator never needs to be told
//! the controller's internal column/row widths separately.

use fs_core::bsp::{BusWidth, ChipSelect, NandBsp};
use fs_core::error::Result;
use fs_core::nand::addr::{self, AddrSizes};
use fs_core::nand::opcodes;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReadSource {
    None,
    Page,
    ParamPage,
    Status,
}

fn le_to_u32(bytes: &[u8]) -> u32 {
    let mut v = 0u32;
    for (i, &b) in bytes.iter().enumerate() {
        v |= (b as u32) << (8 * i);
    }
    v
}

/// In-memory NAND device: one flat `(page_size + spare_size) * total_pages`
/// byte array plus an ONFI parameter-page stream.
pub struct SimNandBsp {
    pg_size: u32,
    spare_size: u32,
    pg_per_blk: u32,
    addr_sizes: AddrSizes,
    mem: Vec<u8>,
    param_page: Vec<u8>,

    last_cmd: u8,
    addr_bytes: heapless::Vec<u8, 8>,
    expected_addr_len: usize,
    read_source: ReadSource,
    read_cursor: usize,
    write_cursor: Option<usize>,
    pending_erase_row: Option<u32>,
}

impl SimNandBsp {
    /// Build a device of the given page/spare/block geometry, erased
    /// (`0xFF`-filled), backing the parameter page stream with
    /// `param_page` (as read back by `READ_PARAM_PAGE`/`CHANGE_READ_COLUMN`).
    pub fn new(pg_size: u32, spare_size: u32, pg_per_blk: u32, total_pages: u32, param_page: Vec<u8>) -> Self {
        let page_stride = (pg_size + spare_size) as usize;
        Self {
            pg_size,
            spare_size,
            pg_per_blk,
            addr_sizes: AddrSizes::derive(pg_size, total_pages),
            mem: vec![0xFFu8; page_stride * total_pages as usize],
            param_page,
            last_cmd: 0,
            addr_bytes: heapless::Vec::new(),
            expected_addr_len: 0,
            read_source: ReadSource::None,
            read_cursor: 0,
            write_cursor: None,
            pending_erase_row: None,
        }
    }

    fn page_stride(&self) -> usize {
        (self.pg_size + self.spare_size) as usize
    }

    fn zone_base(opcode: u8) -> u32 {
        match opcode {
            opcodes::READ_ZONE_B => 256,
            opcodes::READ_ZONE_C => 512,
            _ => 0,
        }
    }

    fn finalize_addr(&mut self) {
        let col_size = self.addr_sizes.col_addr_size as usize;
        let row_size = self.addr_sizes.row_addr_size as usize;
        match self.last_cmd {
            opcodes::READ_0 | opcodes::READ_ZONE_B | opcodes::READ_ZONE_C => {
                let col = le_to_u32(&self.addr_bytes[..col_size]) + Self::zone_base(self.last_cmd);
                let row = le_to_u32(&self.addr_bytes[col_size..col_size + row_size]);
                self.read_cursor = row as usize * self.page_stride() + col as usize;
                self.read_source = ReadSource::Page;
            }
            opcodes::PROGRAM_SETUP | opcodes::CHANGE_WRITE_COLUMN => {
                let col = le_to_u32(&self.addr_bytes[..col_size]);
                let row = le_to_u32(&self.addr_bytes[col_size..col_size + row_size]);
                self.write_cursor = Some(row as usize * self.page_stride() + col as usize);
            }
            opcodes::ERASE_SETUP => {
                self.pending_erase_row = Some(le_to_u32(&self.addr_bytes[..row_size]));
            }
            opcodes::READ_PARAM_PAGE => {
                self.read_cursor = self.addr_bytes[0] as usize;
                self.read_source = ReadSource::ParamPage;
            }
            opcodes::CHANGE_READ_COLUMN => {
                self.read_cursor = le_to_u32(&self.addr_bytes[..2]) as usize;
                self.read_source = ReadSource::ParamPage;
            }
            _ => {}
        }
    }
}

impl ChipSelect for SimNandBsp {
    fn chip_sel_en(&mut self) {}
    fn chip_sel_dis(&mut self) {}
}

impl NandBsp for SimNandBsp {
    fn open(&mut self) -> Result<()> {
        Ok(())
    }
    fn close(&mut self) {}

    fn cmd_wr(&mut self, bytes: &[u8]) -> Result<()> {
        for &b in bytes {
            match b {
                opcodes::READ_0
                | opcodes::READ_ZONE_B
                | opcodes::READ_ZONE_C
                | opcodes::PROGRAM_SETUP
                | opcodes::CHANGE_WRITE_COLUMN
                | opcodes::ERASE_SETUP
                | opcodes::READ_PARAM_PAGE
                | opcodes::CHANGE_READ_COLUMN => {
                    self.last_cmd = b;
                    self.addr_bytes.clear();
                    self.expected_addr_len = match b {
                        opcodes::ERASE_SETUP => self.addr_sizes.row_addr_size as usize,
                        opcodes::READ_PARAM_PAGE => 1,
                        opcodes::CHANGE_READ_COLUMN => 2,
                        _ => (self.addr_sizes.col_addr_size + self.addr_sizes.row_addr_size) as usize,
                    };
                }
                opcodes::READ_STATUS => {
                    self.read_source = ReadSource::Status;
                }
                opcodes::ERASE_CONFIRM => {
                    if let Some(row) = self.pending_erase_row.take() {
                        let start = row as usize * self.page_stride();
                        let end = start + self.pg_per_blk as usize * self.page_stride();
                        self.mem[start..end.min(self.mem.len())].fill(0xFF);
                    }
                }
                // READ_CONFIRM / PROGRAM_CONFIRM / CHANGE_READ_COLUMN_CONFIRM / RESET:
                // the read/write cursor was already latched when the address
                // bytes completed, so no further action is needed here.
                _ => {}
            }
        }
        Ok(())
    }

    fn addr_wr(&mut self, bytes: &[u8]) -> Result<()> {
        let _ = self.addr_bytes.extend_from_slice(bytes);
        if self.addr_bytes.len() >= self.expected_addr_len && self.expected_addr_len > 0 {
            self.finalize_addr();
        }
        Ok(())
    }

    fn data_wr(&mut self, data: &[u8], _width: BusWidth) -> Result<()> {
        if let Some(cursor) = self.write_cursor {
            let end = (cursor + data.len()).min(self.mem.len());
            self.mem[cursor..end].copy_from_slice(&data[..end - cursor]);
            self.write_cursor = Some(end);
        }
        Ok(())
    }

    fn data_rd(&mut self, buf: &mut [u8], _width: BusWidth) -> Result<()> {
        match self.read_source {
            ReadSource::Page => {
                let end = (self.read_cursor + buf.len()).min(self.mem.len());
                buf[..end - self.read_cursor].copy_from_slice(&self.mem[self.read_cursor..end]);
                self.read_cursor = end;
            }
            ReadSource::ParamPage => {
                let end = (self.read_cursor + buf.len()).min(self.param_page.len());
                let n = end.saturating_sub(self.read_cursor);
                buf[..n].copy_from_slice(&self.param_page[self.read_cursor..end]);
                buf[n..].fill(0xFF);
                self.read_cursor = end;
            }
            ReadSource::Status => buf.fill(opcodes::SR_READY),
            ReadSource::None => buf.fill(0xFF),
        }
        Ok(())
    }

    fn poll_busy(&mut self) -> Result<bool> {
        Ok(false)
    }

    fn delay_us(&mut self, _us: u32) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use fs_core::bsp::ChipSelectGuard;

    #[test]
    fn page_read_after_write_round_trips() {
        let mut bsp = SimNandBsp::new(2048, 64, 64, 1024, vec![0xFFu8; 256]);
        {
            let mut g = ChipSelectGuard::new(&mut bsp);
            g.bsp().cmd_wr(&[opcodes::PROGRAM_SETUP]).unwrap();
            let addr = addr::format(bsp.addr_sizes, 0, 5);
            g.bsp().addr_wr(&addr).unwrap();
            g.bsp().data_wr(&[0xAB; 2048], BusWidth::Eight).unwrap();
        }
        {
            let mut g = ChipSelectGuard::new(&mut bsp);
            g.bsp().cmd_wr(&[opcodes::READ_0]).unwrap();
            let addr = addr::format(bsp.addr_sizes, 0, 5);
            g.bsp().addr_wr(&addr).unwrap();
            g.bsp().cmd_wr(&[opcodes::READ_CONFIRM]).unwrap();
        }
        let mut buf = [0u8; 2048];
        {
            let mut g = ChipSelectGuard::new(&mut bsp);
            g.bsp().data_rd(&mut buf, BusWidth::Eight).unwrap();
        }
        assert_eq!(buf, [0xAB; 2048]);
    }

    #[test]
    fn block_erase_resets_all_pages_to_ff() {
        let mut bsp = SimNandBsp::new(2048, 64, 4, 16, vec![0xFFu8; 256]);
        bsp.mem[..10].fill(0xAB);
        {
            let mut g = ChipSelectGuard::new(&mut bsp);
            g.bsp().cmd_wr(&[opcodes::ERASE_SETUP]).unwrap();
            let addr = addr::format(bsp.addr_sizes, 0, 0);
            let row_size = bsp.addr_sizes.row_addr_size as usize;
            g.bsp().addr_wr(&addr[addr.len() - row_size..]).unwrap();
            g.bsp().cmd_wr(&[opcodes::ERASE_CONFIRM]).unwrap();
        }
        assert!(bsp.mem[..10].iter().all(|&b| b == 0xFF));
    }

    #[test]
    fn param_page_stream_reads_back_configured_bytes() {
        let mut page = vec![0u8; 256];
        page[0] = b'O';
        page[1] = b'N';
        page[2] = b'F';
        page[3] = b'I';
        let mut bsp = SimNandBsp::new(2048, 64, 64, 1024, page);
        {
            let mut g = ChipSelectGuard::new(&mut bsp);
            g.bsp().cmd_wr(&[opcodes::READ_PARAM_PAGE]).unwrap();
            g.bsp().addr_wr(&[0]).unwrap();
        }
        let mut buf = [0u8; 4];
        {
            let mut g = ChipSelectGuard::new(&mut bsp);
            g.bsp().data_rd(&mut buf, BusWidth::Eight).unwrap();
        }
        assert_eq!(&buf, b"ONFI");
    }
}
