//! Shared SPI NOR command sequences
//!
//! Free functions generic over [`SpiNorBsp`], mirroring the write-enable /
//! poll-busy / page-program discipline every JEDEC-family part shares.
//! Per-family drivers in [`super::phy`] build on these instead of
//! re-implementing the handshake.

use crate::bsp::{ChipSelectGuard, SpiNorBsp};
use crate::error::{Error, Result};

use super::opcodes;

/// Default status-poll timeout for a page program.
pub const PROGRAM_TIMEOUT_US: u32 = 5_000;
/// Default status-poll timeout for a sector/block erase.
pub const ERASE_TIMEOUT_US: u32 = 2_000_000;

fn addr_3b(addr: u32) -> [u8; 3] {
    [(addr >> 16) as u8, (addr >> 8) as u8, addr as u8]
}

/// Read the status register.
pub fn read_status<B: SpiNorBsp>(bsp: &mut B) -> Result<u8> {
    let mut guard = ChipSelectGuard::new(bsp);
    guard.bsp().wr(&[opcodes::RDSR])?;
    let mut sr = [0u8; 1];
    guard.bsp().rd(&mut sr)?;
    Ok(sr[0])
}

/// Assert Write Enable Latch.
pub fn write_enable<B: SpiNorBsp>(bsp: &mut B) -> Result<()> {
    let mut guard = ChipSelectGuard::new(bsp);
    guard.bsp().wr(&[opcodes::WREN])
}

/// Poll the status register until BUSY clears.
pub fn wait_ready<B: SpiNorBsp>(bsp: &mut B, timeout_us: u32) -> Result<()> {
    let poll_interval_us = core::cmp::max(1, timeout_us / 64);
    let max_polls = timeout_us.div_ceil(poll_interval_us) + 1;
    for _ in 0..max_polls {
        let sr = read_status(bsp)?;
        if sr & opcodes::SR1_BUSY == 0 {
            return Ok(());
        }
        bsp.delay_us(poll_interval_us);
    }
    Err(Error::Timeout)
}

/// Read `buf.len()` octets starting at `addr` using the plain Read opcode.
pub fn read<B: SpiNorBsp>(bsp: &mut B, addr: u32, buf: &mut [u8]) -> Result<()> {
    let mut guard = ChipSelectGuard::new(bsp);
    guard.bsp().wr(&[opcodes::READ])?;
    guard.bsp().wr(&addr_3b(addr))?;
    guard.bsp().rd(buf)
}

/// Read `buf.len()` octets starting at `addr` using Fast Read (one dummy
/// byte follows the address).
pub fn fast_read<B: SpiNorBsp>(bsp: &mut B, addr: u32, buf: &mut [u8]) -> Result<()> {
    let mut guard = ChipSelectGuard::new(bsp);
    guard.bsp().wr(&[opcodes::FAST_READ])?;
    guard.bsp().wr(&addr_3b(addr))?;
    guard.bsp().wr(&[0x00])?;
    guard.bsp().rd(buf)
}

/// Program one page (must not cross a page boundary); blocks until the
/// operation completes or times out.
pub fn program_page<B: SpiNorBsp>(bsp: &mut B, addr: u32, data: &[u8]) -> Result<()> {
    write_enable(bsp)?;
    {
        let mut guard = ChipSelectGuard::new(bsp);
        guard.bsp().wr(&[opcodes::PP])?;
        guard.bsp().wr(&addr_3b(addr))?;
        guard.bsp().wr(data)?;
    }
    wait_ready(bsp, PROGRAM_TIMEOUT_US)
}

/// Erase the 4 KiB sector containing `addr`; blocks until completion.
pub fn erase_sector<B: SpiNorBsp>(bsp: &mut B, addr: u32) -> Result<()> {
    write_enable(bsp)?;
    {
        let mut guard = ChipSelectGuard::new(bsp);
        guard.bsp().wr(&[opcodes::SE])?;
        guard.bsp().wr(&addr_3b(addr))?;
    }
    wait_ready(bsp, ERASE_TIMEOUT_US)
}

/// Erase the entire chip; blocks until completion.
pub fn erase_chip<B: SpiNorBsp>(bsp: &mut B, timeout_us: u32) -> Result<()> {
    write_enable(bsp)?;
    {
        let mut guard = ChipSelectGuard::new(bsp);
        guard.bsp().wr(&[opcodes::CE])?;
    }
    wait_ready(bsp, timeout_us)
}

/// Read the 3-byte JEDEC ID.
pub fn read_jedec_id<B: SpiNorBsp>(bsp: &mut B) -> Result<(u8, u16)> {
    let mut guard = ChipSelectGuard::new(bsp);
    guard.bsp().wr(&[opcodes::RDID])?;
    let mut buf = [0u8; 3];
    guard.bsp().rd(&mut buf)?;
    Ok((buf[0], u16::from_be_bytes([buf[1], buf[2]])))
}

/// Program `data` one page at a time, splitting at `page_size` boundaries.
pub fn program<B: SpiNorBsp>(bsp: &mut B, addr: u32, data: &[u8], page_size: u32) -> Result<()> {
    let mut offset = 0u32;
    while (offset as usize) < data.len() {
        let page_off = (addr + offset) % page_size;
        let chunk_len = core::cmp::min(page_size - page_off, data.len() as u32 - offset);
        let chunk = &data[offset as usize..(offset + chunk_len) as usize];
        program_page(bsp, addr + offset, chunk)?;
        offset += chunk_len;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bsp::ChipSelect;

    struct FakeBsp {
        status: u8,
        last_cmd: heapless::Vec<u8, 8>,
    }

    impl ChipSelect for FakeBsp {
        fn chip_sel_en(&mut self) {}
        fn chip_sel_dis(&mut self) {}
    }

    impl SpiNorBsp for FakeBsp {
        fn open(&mut self) -> Result<()> {
            Ok(())
        }
        fn close(&mut self) {}
        fn lock(&mut self) {}
        fn unlock(&mut self) {}
        fn wr(&mut self, data: &[u8]) -> Result<()> {
            self.last_cmd.clear();
            let _ = self.last_cmd.extend_from_slice(data);
            Ok(())
        }
        fn rd(&mut self, buf: &mut [u8]) -> Result<()> {
            if self.last_cmd.first() == Some(&opcodes::RDSR) {
                buf[0] = self.status;
            }
            Ok(())
        }
        fn set_clk_freq(&mut self, _hz: u32) -> Result<()> {
            Ok(())
        }
        fn poll_busy(&mut self) -> Result<bool> {
            Ok(self.status & opcodes::SR1_BUSY != 0)
        }
        fn delay_us(&mut self, _us: u32) {}
    }

    #[test]
    fn wait_ready_returns_once_busy_clears() {
        let mut bsp = FakeBsp {
            status: 0,
            last_cmd: heapless::Vec::new(),
        };
        assert!(wait_ready(&mut bsp, 1000).is_ok());
    }

    #[test]
    fn wait_ready_times_out_while_busy() {
        let mut bsp = FakeBsp {
            status: opcodes::SR1_BUSY,
            last_cmd: heapless::Vec::new(),
        };
        assert_eq!(wait_ready(&mut bsp, 100), Err(Error::Timeout));
    }
}
