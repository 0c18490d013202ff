//! In-memory SPI NOR BSP
//!
//! Accumulates the bytes shifted out across one chip-select window into a
//! command buffer, the same framing `spi_common` and the per-family drivers
//! assume (opcode, then address, then data, all inside one
//! `ChipSelectGuard` scope). Reads are decoded lazily in [`SpiNorBsp::rd`];
//! writes commit when chip select deasserts, since a program/erase opcode
//! never issues a read-back inside its own window.

use fs_core::bsp::{ChipSelect, SpiNorBsp};
use fs_core::error::Result;
use fs_core::nor::opcodes;

fn be24(b: &[u8]) -> u32 {
    ((b[0] as u32) << 16) | ((b[1] as u32) << 8) | b[2] as u32
}

/// In-memory JEDEC-family SPI NOR device.
pub struct SimSpiNorBsp {
    mem: Vec<u8>,
    status: u8,
    manufacturer_id: u8,
    device_id: u16,
    cmd_buf: heapless::Vec<u8, 264>,
    aai_cursor: Option<u32>,
}

impl SimSpiNorBsp {
    /// Build a device of `size` octets, erased (`0xFF`-filled).
    pub fn new(size: u32, manufacturer_id: u8, device_id: u16) -> Self {
        Self {
            mem: vec![0xFFu8; size as usize],
            status: 0,
            manufacturer_id,
            device_id,
            cmd_buf: heapless::Vec::new(),
            aai_cursor: None,
        }
    }

    /// Snapshot of the simulated array.
    pub fn data(&self) -> &[u8] {
        &self.mem
    }

    fn program_range(&mut self, addr: u32, data: &[u8]) {
        let start = addr as usize;
        for (i, &b) in data.iter().enumerate() {
            if let Some(slot) = self.mem.get_mut(start + i) {
                *slot &= b;
            }
        }
    }

    fn erase_range(&mut self, start: usize, len: usize) {
        for b in self.mem[start..(start + len).min(self.mem.len())].iter_mut() {
            *b = 0xFF;
        }
    }

    fn commit_write(&mut self) {
        let Some(&opcode) = self.cmd_buf.first() else {
            return;
        };
        match opcode {
            opcodes::WREN => self.status |= opcodes::SR1_WEL,
            opcodes::WRDI => {
                self.status &= !opcodes::SR1_WEL;
                self.aai_cursor = None;
            }
            opcodes::WRSR => {
                if let Some(&sr) = self.cmd_buf.get(1) {
                    self.status = sr;
                }
            }
            opcodes::PP if self.cmd_buf.len() > 4 => {
                let addr = be24(&self.cmd_buf[1..4]);
                let data = self.cmd_buf[4..].to_vec();
                self.program_range(addr, &data);
            }
            opcodes::SE if self.cmd_buf.len() >= 4 => {
                let addr = be24(&self.cmd_buf[1..4]) as usize;
                self.erase_range(addr - addr % 4096, 4096);
            }
            opcodes::BE if self.cmd_buf.len() >= 4 => {
                let addr = be24(&self.cmd_buf[1..4]) as usize;
                self.erase_range(addr - addr % (64 * 1024), 64 * 1024);
            }
            opcodes::CE => self.erase_range(0, self.mem.len()),
            opcodes::AAI_WORD_PROGRAM => {
                let (addr, data) = if self.cmd_buf.len() >= 6 {
                    (be24(&self.cmd_buf[1..4]), self.cmd_buf[4..].to_vec())
                } else {
                    (self.aai_cursor.unwrap_or(0), self.cmd_buf[1..].to_vec())
                };
                self.program_range(addr, &data);
                self.aai_cursor = Some(addr + data.len() as u32);
            }
            opcodes::AAI_BYTE_PROGRAM => {
                let (addr, data) = if self.cmd_buf.len() >= 5 {
                    (be24(&self.cmd_buf[1..4]), self.cmd_buf[4..].to_vec())
                } else {
                    (self.aai_cursor.unwrap_or(0), self.cmd_buf[1..].to_vec())
                };
                self.program_range(addr, &data);
                self.aai_cursor = Some(addr + data.len() as u32);
            }
            _ => {}
        }
    }
}

impl ChipSelect for SimSpiNorBsp {
    fn chip_sel_en(&mut self) {
        self.cmd_buf.clear();
    }
    fn chip_sel_dis(&mut self) {
        self.commit_write();
    }
}

impl SpiNorBsp for SimSpiNorBsp {
    fn open(&mut self) -> Result<()> {
        Ok(())
    }
    fn close(&mut self) {}
    fn lock(&mut self) {}
    fn unlock(&mut self) {}

    fn wr(&mut self, data: &[u8]) -> Result<()> {
        let _ = self.cmd_buf.extend_from_slice(data);
        Ok(())
    }

    fn rd(&mut self, buf: &mut [u8]) -> Result<()> {
        match self.cmd_buf.first().copied() {
            Some(opcodes::RDSR) => buf.fill(self.status),
            Some(opcodes::RDID) => {
                let id = [self.manufacturer_id, (self.device_id >> 8) as u8, self.device_id as u8];
                for (b, v) in buf.iter_mut().zip(id.iter().cycle()) {
                    *b = *v;
                }
            }
            Some(opcodes::READ) if self.cmd_buf.len() >= 4 => {
                let addr = be24(&self.cmd_buf[1..4]) as usize;
                for (i, b) in buf.iter_mut().enumerate() {
                    *b = *self.mem.get(addr + i).unwrap_or(&0xFF);
                }
            }
            Some(opcodes::FAST_READ) if self.cmd_buf.len() >= 5 => {
                let addr = be24(&self.cmd_buf[1..4]) as usize;
                for (i, b) in buf.iter_mut().enumerate() {
                    *b = *self.mem.get(addr + i).unwrap_or(&0xFF);
                }
            }
            _ => buf.fill(0),
        }
        Ok(())
    }

    fn set_clk_freq(&mut self, _hz: u32) -> Result<()> {
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
    use fs_core::nor::spi_common;

    #[test]
    fn program_then_read_round_trips() {
        let mut bsp = SimSpiNorBsp::new(4096, 0xEF, 0x4018);
        spi_common::program(&mut bsp, 0x10, &[1, 2, 3, 4], 256).unwrap();
        let mut buf = [0u8; 4];
        spi_common::read(&mut bsp, 0x10, &mut buf).unwrap();
        assert_eq!(buf, [1, 2, 3, 4]);
    }

    #[test]
    fn erase_sector_resets_to_ff() {
        let mut bsp = SimSpiNorBsp::new(8192, 0xEF, 0x4018);
        spi_common::program(&mut bsp, 0, &[0, 0, 0], 256).unwrap();
        spi_common::erase_sector(&mut bsp, 0).unwrap();
        let mut buf = [0u8; 3];
        spi_common::read(&mut bsp, 0, &mut buf).unwrap();
        assert_eq!(buf, [0xFF, 0xFF, 0xFF]);
    }

    #[test]
    fn jedec_id_matches_configured_value() {
        let mut bsp = SimSpiNorBsp::new(4096, 0xEF, 0x4018);
        let (manufacturer, device) = spi_common::read_jedec_id(&mut bsp).unwrap();
        assert_eq!(manufacturer, 0xEF);
        assert_eq!(device, 0x4018);
    }
}
