//! AT25-family SPI NOR (plain JEDEC page-program protocol)

use crate::bsp::{SpiFeatures, SpiNorBsp};
use crate::error::{Error, Result};

use super::super::spi_common;

/// JEDEC manufacturer ID recognized for the AT25 family (Adesto/Atmel).
const MANUFACTURER_ID: u8 = 0x1F;

/// One recognized device-ID table entry.
struct PartInfo {
    device_id: u16,
    size: u32,
    page_size: u32,
}

/// Built-in identification table, keyed by the JEDEC device-ID word read
/// back after the manufacturer byte.
const DEVICE_TABLE: &[PartInfo] = &[
    PartInfo { device_id: 0x4408, size: 4096, page_size: 256 },
    PartInfo { device_id: 0x4409, size: 8192, page_size: 256 },
];

/// Number of parts [`DEVICE_TABLE`] recognizes, for the aggregate count in
/// [`super::super::database`].
pub(crate) const DEVICE_COUNT: usize = DEVICE_TABLE.len();

/// Geometry needed to bound program/erase operations, confirmed (and
/// replaced wholesale) against [`DEVICE_TABLE`] at `open()`.
#[derive(Debug, Clone, Copy)]
pub struct At25Geometry {
    /// Total device size in octets.
    pub size: u32,
    /// Page-program granularity in octets.
    pub page_size: u32,
}

/// AT25-family driver: one instance per chip-selected device.
pub struct At25<B> {
    bsp: B,
    geometry: At25Geometry,
    features: SpiFeatures,
}

impl<B: SpiNorBsp> At25<B> {
    /// Wrap `bsp`. `geometry` is a placeholder until `open()` identifies
    /// the part and replaces it with the matching table entry.
    pub fn new(bsp: B, geometry: At25Geometry) -> Self {
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
        self.geometry = At25Geometry {
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

    /// Erase the whole chip.
    pub fn erase_chip(&mut self) -> Result<()> {
        spi_common::erase_chip(&mut self.bsp, spi_common::ERASE_TIMEOUT_US * 8)
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
    fn program_then_read_round_trips_across_a_page_boundary() {
        let bsp = SimSpiNorBsp::new(4096, 0x1F, 0x4408);
        let geometry = At25Geometry { size: 4096, page_size: 256 };
        let mut at25 = At25::new(bsp, geometry);
        at25.open().unwrap();
        let data = [0xABu8; 300];
        at25.program(200, &data).unwrap();
        let mut buf = [0u8; 300];
        at25.read(200, &mut buf).unwrap();
        assert_eq!(&buf[..], &data[..]);
    }

    #[test]
    fn erase_sector_resets_to_ff() {
        let bsp = SimSpiNorBsp::new(8192, 0x1F, 0x4409);
        let geometry = At25Geometry { size: 8192, page_size: 256 };
        let mut at25 = At25::new(bsp, geometry);
        at25.open().unwrap();
        at25.program(0, &[0x11, 0x22, 0x33]).unwrap();
        at25.erase_sector(0).unwrap();
        let mut buf = [0u8; 3];
        at25.read(0, &mut buf).unwrap();
        assert_eq!(buf, [0xFF, 0xFF, 0xFF]);
    }

    #[test]
    fn open_rejects_a_mismatched_manufacturer_id() {
        let bsp = SimSpiNorBsp::new(4096, 0x20, 0x4408);
        let geometry = At25Geometry { size: 4096, page_size: 256 };
        let mut at25 = At25::new(bsp, geometry);
        assert!(matches!(at25.open(), Err(Error::InvalidLowParams)));
    }

    #[test]
    fn open_rejects_an_unrecognized_device_id() {
        let bsp = SimSpiNorBsp::new(4096, 0x1F, 0x9999);
        let geometry = At25Geometry { size: 4096, page_size: 256 };
        let mut at25 = At25::new(bsp, geometry);
        assert!(matches!(at25.open(), Err(Error::InvalidLowParams)));
    }
}
