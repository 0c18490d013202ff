//! W25Q-family SPI NOR
//!
//! Adds 4-byte addressing for parts whose size exceeds the 3-byte address
//! space (128 Mbit and above), entered/exited through `EN4B`/`EX4B`.

use crate::bsp::{ChipSelectGuard, SpiFeatures, SpiNorBsp};
use crate::error::{Error, Result};

use super::super::{opcodes, spi_common};

/// Addressing width a W25Q part may use across its lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AddrMode {
    ThreeByte,
    FourByte,
}

/// JEDEC manufacturer ID recognized for the W25Q family (Winbond).
const MANUFACTURER_ID: u8 = 0xEF;

/// One recognized device-ID table entry.
struct PartInfo {
    device_id: u16,
    size: u32,
    page_size: u32,
}

/// Built-in identification table, keyed by the JEDEC device-ID word read
/// back after the manufacturer byte.
const DEVICE_TABLE: &[PartInfo] = &[
    PartInfo { device_id: 0x4018, size: 4096, page_size: 256 },
    PartInfo { device_id: 0x4020, size: 32 * 1024 * 1024, page_size: 256 },
];

/// Number of parts [`DEVICE_TABLE`] recognizes, for the aggregate count in
/// [`super::super::database`].
pub(crate) const DEVICE_COUNT: usize = DEVICE_TABLE.len();

/// Geometry needed to bound program/erase operations, confirmed (and
/// replaced wholesale) against [`DEVICE_TABLE`] at `open()`.
#[derive(Debug, Clone, Copy)]
pub struct W25qGeometry {
    /// Total device size in octets.
    pub size: u32,
    /// Page-program granularity in octets.
    pub page_size: u32,
}

/// W25Q-family driver.
pub struct W25q<B> {
    bsp: B,
    geometry: W25qGeometry,
    addr_mode: AddrMode,
    features: SpiFeatures,
}

const FOUR_BYTE_ADDR_THRESHOLD: u32 = 16 * 1024 * 1024;

impl<B: SpiNorBsp> W25q<B> {
    /// Wrap `bsp`. `geometry` is a placeholder until `open()` identifies
    /// the part and replaces it with the matching table entry.
    pub fn new(bsp: B, geometry: W25qGeometry) -> Self {
        let addr_mode = if geometry.size > FOUR_BYTE_ADDR_THRESHOLD {
            AddrMode::FourByte
        } else {
            AddrMode::ThreeByte
        };
        Self {
            bsp,
            geometry,
            addr_mode,
            features: SpiFeatures::empty(),
        }
    }

    /// Open the underlying SPI peripheral, read back its JEDEC ID, match
    /// it against the built-in device table, and enter 4-byte addressing
    /// if the identified part requires it. Fails with `InvalidLowParams`
    /// on a manufacturer or device mismatch.
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
        self.geometry = W25qGeometry {
            size: part.size,
            page_size: part.page_size,
        };
        self.addr_mode = if part.size > FOUR_BYTE_ADDR_THRESHOLD {
            AddrMode::FourByte
        } else {
            AddrMode::ThreeByte
        };

        self.features = SpiFeatures::FAST_READ;
        if self.addr_mode == AddrMode::FourByte {
            self.features |= SpiFeatures::FOUR_BYTE_ADDR;
            let mut guard = ChipSelectGuard::new(&mut self.bsp);
            guard.bsp().wr(&[opcodes::EN4B])?;
        }
        Ok(())
    }

    /// Capabilities identified at `open()`.
    pub fn features(&self) -> SpiFeatures {
        self.features
    }

    /// Exit 4-byte mode (if entered) and close the underlying peripheral.
    pub fn close(&mut self) {
        if self.addr_mode == AddrMode::FourByte {
            let mut guard = ChipSelectGuard::new(&mut self.bsp);
            let _ = guard.bsp().wr(&[opcodes::EX4B]);
        }
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

    /// Device size in octets.
    pub fn size(&self) -> u32 {
        self.geometry.size
    }
}
