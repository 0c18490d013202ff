//! STM25-family SPI NOR
//!
//! Adds block-protect configuration through the status register's `BP`
//! bits, written with the standard write-enable-then-WRSR sequence.

use crate::bsp::{ChipSelectGuard, SpiFeatures, SpiNorBsp};
use crate::error::{Error, Result};

use super::super::{opcodes, spi_common};

/// JEDEC manufacturer ID recognized for the STM25 family (STMicroelectronics).
const MANUFACTURER_ID: u8 = 0x20;

/// One recognized device-ID table entry.
struct PartInfo {
    device_id: u16,
    size: u32,
    page_size: u32,
}

/// Built-in identification table, keyed by the JEDEC device-ID word read
/// back after the manufacturer byte.
const DEVICE_TABLE: &[PartInfo] = &[PartInfo { device_id: 0x2014, size: 4096, page_size: 256 }];

/// Number of parts [`DEVICE_TABLE`] recognizes, for the aggregate count in
/// [`super::super::database`].
pub(crate) const DEVICE_COUNT: usize = DEVICE_TABLE.len();

/// Block-protect level encoded in status register bits BP0-BP2.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockProtect {
    /// No protection.
    None,
    /// Upper quarter of the array protected.
    UpperQuarter,
    /// Upper half of the array protected.
    UpperHalf,
    /// Entire array protected.
    All,
}

impl BlockProtect {
    fn bp_bits(self) -> u8 {
        match self {
            BlockProtect::None => 0b000,
            BlockProtect::UpperQuarter => 0b001,
            BlockProtect::UpperHalf => 0b010,
            BlockProtect::All => 0b011,
        }
    }
}

/// Geometry needed to bound program/erase operations, confirmed (and
/// replaced wholesale) against [`DEVICE_TABLE`] at `open()`.
#[derive(Debug, Clone, Copy)]
pub struct Stm25Geometry {
    /// Total device size in octets.
    pub size: u32,
    /// Page-program granularity in octets.
    pub page_size: u32,
}

/// STM25-family driver.
pub struct Stm25<B> {
    bsp: B,
    geometry: Stm25Geometry,
    features: SpiFeatures,
}

impl<B: SpiNorBsp> Stm25<B> {
    /// Wrap `bsp`. `geometry` is a placeholder until `open()` identifies
    /// the part and replaces it with the matching table entry.
    pub fn new(bsp: B, geometry: Stm25Geometry) -> Self {
        Self {
            bsp,
            geometry,
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
        self.geometry = Stm25Geometry {
            size: part.size,
            page_size: part.page_size,
        };
        self.features = SpiFeatures::FAST_READ;
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

    /// Program `data`, splitting across page boundaries as needed.
    pub fn program(&mut self, addr: u32, data: &[u8]) -> Result<()> {
        spi_common::program(&mut self.bsp, addr, data, self.geometry.page_size)
    }

    /// Erase the sector containing `addr`.
    pub fn erase_sector(&mut self, addr: u32) -> Result<()> {
        spi_common::erase_sector(&mut self.bsp, addr)
    }

    /// Set the block-protect level, clearing write-protection around
    /// regions excluded from `level`.
    pub fn set_block_protect(&mut self, level: BlockProtect) -> Result<()> {
        spi_common::write_enable(&mut self.bsp)?;
        let mut guard = ChipSelectGuard::new(&mut self.bsp);
        guard.bsp().wr(&[opcodes::WRSR, level.bp_bits() << 2])
    }

    /// Device size in octets.
    pub fn size(&self) -> u32 {
        self.geometry.size
    }
}

#[cfg(all(test, feature = "alloc"))]
mod tests {
    use super::*;
    use crate::nor::spi_common;
    use fs_sim::SimSpiNorBsp;

    #[test]
    fn set_block_protect_writes_the_expected_status_bits() {
        let bsp = SimSpiNorBsp::new(4096, 0x20, 0x2014);
        let geometry = Stm25Geometry { size: 4096, page_size: 256 };
        let mut stm25 = Stm25::new(bsp, geometry);
        stm25.open().unwrap();
        stm25.set_block_protect(BlockProtect::UpperHalf).unwrap();
        let sr = spi_common::read_status(&mut stm25.bsp).unwrap();
        assert_eq!(sr, BlockProtect::UpperHalf.bp_bits() << 2);
    }

    #[test]
    fn program_then_read_round_trips() {
        let bsp = SimSpiNorBsp::new(4096, 0x20, 0x2014);
        let geometry = Stm25Geometry { size: 4096, page_size: 256 };
        let mut stm25 = Stm25::new(bsp, geometry);
        stm25.open().unwrap();
        stm25.program(0x40, &[7, 8, 9]).unwrap();
        let mut buf = [0u8; 3];
        stm25.read(0x40, &mut buf).unwrap();
        assert_eq!(buf, [7, 8, 9]);
    }

    #[test]
    fn open_rejects_a_mismatched_manufacturer_id() {
        let bsp = SimSpiNorBsp::new(4096, 0xEF, 0x2014);
        let geometry = Stm25Geometry { size: 4096, page_size: 256 };
        let mut stm25 = Stm25::new(bsp, geometry);
        assert!(matches!(stm25.open(), Err(Error::InvalidLowParams)));
    }

    #[test]
    fn open_rejects_an_unrecognized_device_id() {
        let bsp = SimSpiNorBsp::new(4096, 0x20, 0x9999);
        let geometry = Stm25Geometry { size: 4096, page_size: 256 };
        let mut stm25 = Stm25::new(bsp, geometry);
        assert!(matches!(stm25.open(), Err(Error::InvalidLowParams)));
    }
}
