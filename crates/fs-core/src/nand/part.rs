//! NAND part descriptor
//!
//! Immutable-after-open geometry describing one NAND device, published
//! either by a static configuration table or by the ONFI parameter-page
//! reader in [`crate::nand::onfi`].

use crate::bsp::BusWidth;
use crate::error::{Error, Result};

/// Maximum number of free-spare regions a part descriptor can carry
pub const MAX_FREE_SPARE_REGIONS: usize = 8;

/// One usable (non-reserved) region of the physical spare area
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct FreeSpareRegion {
    /// Offset from the start of the spare area, in octets
    pub octet_offset: u16,
    /// Length of the region, in octets
    pub octet_len: u16,
}

impl FreeSpareRegion {
    /// Construct a region
    pub const fn new(octet_offset: u16, octet_len: u16) -> Self {
        Self {
            octet_offset,
            octet_len,
        }
    }

    /// Offset one past the last octet of this region
    pub const fn end(&self) -> u32 {
        self.octet_offset as u32 + self.octet_len as u32
    }
}

/// Ordered, non-overlapping, strictly-ascending list of usable spare regions
pub type FreeSpareMap = heapless::Vec<FreeSpareRegion, MAX_FREE_SPARE_REGIONS>;

/// Validate that a free-spare map is ordered, non-overlapping, and
/// strictly ascending.
pub fn validate_free_spare_map(map: &FreeSpareMap) -> Result<()> {
    let mut prev_end: u32 = 0;
    for (i, region) in map.iter().enumerate() {
        if region.octet_len == 0 {
            return Err(Error::InvalidLowParams);
        }
        if i > 0 && (region.octet_offset as u32) < prev_end {
            return Err(Error::InvalidLowParams);
        }
        prev_end = region.end();
    }
    Ok(())
}

/// Factory defect-mark encoding convention
///
/// Identifies where on the chip the factory bad-block marker lives; six
/// schemes are in common use across vendors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub enum DefectMarkType {
    /// Byte 1 of spare, first page of the block
    Page0Byte1,
    /// Word 1 of spare, first page of the block (16-bit bus)
    Page0Word1,
    /// Byte 1 of spare, first OR last page of the block
    Page0OrLastByte1,
    /// Word 1 of spare, first OR last page of the block (16-bit bus)
    Page0OrLastWord1,
    /// Byte 6 of spare, pages 0-1
    Page0Page1Byte6,
    /// Word 6 of spare, pages 0-1 (16-bit bus)
    Page0Page1Word6,
}

/// Immutable NAND part descriptor
#[derive(Debug, Clone)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct NandPartData {
    /// Total number of erase blocks
    pub blk_cnt: u32,
    /// Pages per erase block
    pub pg_per_blk: u32,
    /// Page size in octets (data area only, excludes spare)
    pub pg_size: u32,
    /// Spare area size per page, in octets
    pub spare_size: u16,
    /// Data bus width
    pub bus_width: BusWidth,
    /// Maximum number of partial programs per page between erases
    pub nbr_pgm_per_pg: u8,
    /// ECC correctable-bit count
    pub ecc_nbr_corr_bits: u8,
    /// ECC codeword size in octets
    pub ecc_codeword_size: u16,
    /// Factory defect-mark convention
    pub defect_mark_type: DefectMarkType,
    /// Maximum number of factory-marked bad blocks expected
    pub max_bad_blk_cnt: u32,
    /// Maximum number of erase cycles a block is rated for
    pub max_blk_erase: u32,
    /// Usable regions of the physical spare area
    pub free_spare_map: FreeSpareMap,
}

impl NandPartData {
    /// Validate internal consistency of the part descriptor.
    pub fn validate(&self) -> Result<()> {
        if self.pg_size == 0 || self.blk_cnt == 0 || self.pg_per_blk == 0 {
            return Err(Error::InvalidCfg);
        }
        if !matches!(self.bus_width, BusWidth::Eight | BusWidth::Sixteen) {
            return Err(Error::InvalidCfg);
        }
        validate_free_spare_map(&self.free_spare_map)?;
        let total_free: u32 = self.free_spare_map.iter().map(|r| r.octet_len as u32).sum();
        if total_free > self.spare_size as u32 {
            return Err(Error::InvalidLowParams);
        }
        Ok(())
    }

    /// Sum of the lengths of all free-spare regions
    pub fn spare_total_avail_size(&self) -> u32 {
        self.free_spare_map.iter().map(|r| r.octet_len as u32).sum()
    }
}
