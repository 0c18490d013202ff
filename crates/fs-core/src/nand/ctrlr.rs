//! Generic NAND controller
//!
//! Drives any part through the [`NandBsp`]/[`Extension`] capability seam,
//! implementing sector read/write, raw page/spare access and block erase on
//! top of the small-page/large-page command protocol.
//!
//! Grounded on the sector-read/write algorithms and `OOS_Setup` walked in
//! `Dev/NAND/Ctrlr/fs_dev_nand_ctrlr_gen.c`; the BSP/extension split mirrors
//! `rflasher-core`'s `programmer`/`flash` layering.

use heapless::Vec as HVec;

use crate::bsp::{BusWidth, ChipSelectGuard, NandBsp};
use crate::error::{worse_ecc_outcome, Error, Result};

use super::addr::{self, AddrSizes};
use super::ext::Extension;
use super::opcodes;
use super::part::{FreeSpareRegion, NandPartData};
use super::spare;

/// Sector sizes `setup` will accept.
pub const ALLOWED_SECTOR_SIZES: [u32; 4] = [512, 1024, 2048, 4096];
/// Maximum sectors a single page may be divided into.
pub const MAX_SEC_PER_PG: usize = 8;
/// Default status-poll timeout for program/erase operations.
pub const OP_TIMEOUT_US: u32 = 2_000_000;

/// One sector's spare-area placement within the page's physical spare area.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct OosSegment {
    phys_start: u32,
    phys_len: u32,
}

fn build_oos_segments(
    free: &[FreeSpareRegion],
    n_segments: u32,
    logical_len_per_seg: u32,
) -> HVec<OosSegment, MAX_SEC_PER_PG> {
    let mut segments = HVec::new();
    if free.is_empty() || n_segments == 0 {
        return segments;
    }

    let mut region_ix = 0usize;
    let mut pos_in_region = 0u32;
    let mut seg_phys_start = free[0].octet_offset as u32;

    for _ in 0..n_segments {
        let mut remaining = logical_len_per_seg;
        while remaining > 0 && region_ix < free.len() {
            let region_len = free[region_ix].octet_len as u32;
            let avail = region_len - pos_in_region;
            let take = avail.min(remaining);
            pos_in_region += take;
            remaining -= take;
            if pos_in_region == region_len {
                region_ix += 1;
                pos_in_region = 0;
            }
        }
        let seg_phys_end = if region_ix < free.len() {
            free[region_ix].octet_offset as u32 + pos_in_region
        } else {
            free.last().map(FreeSpareRegion::end).unwrap_or(seg_phys_start)
        };
        let _ = segments.push(OosSegment {
            phys_start: seg_phys_start,
            phys_len: seg_phys_end - seg_phys_start,
        });
        seg_phys_start = seg_phys_end;
    }
    segments
}

/// `IoCtl` opcode dispatched through [`NandCtrlr::io_ctl`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IoCtlOp {
    /// Read the raw ONFI/vendor parameter page (a single copy) into the
    /// caller's buffer.
    ParamPgRd,
    /// Read one physical page's data area, bypassing ECC and OOS unpacking.
    PhyRdPage,
}

/// Generic NAND controller bound to one BSP and one extension implementation.
pub struct NandCtrlr<B, X> {
    part: NandPartData,
    addr_sizes: AddrSizes,
    small_page: bool,
    sector_size: u32,
    n_sec_per_pg: u32,
    oos_size_per_sec: u32,
    rsvd_size: u32,
    oos_segments: HVec<OosSegment, MAX_SEC_PER_PG>,
    bsp: B,
    ext: X,
}

impl<B: NandBsp, X: Extension> NandCtrlr<B, X> {
    /// Construct a controller for `part`, driven through `bsp` and `ext`.
    ///
    /// Does not touch hardware; call [`NandCtrlr::setup`] before use.
    pub fn new(bsp: B, ext: X, part: NandPartData) -> Result<Self> {
        part.validate()?;
        Ok(Self {
            addr_sizes: AddrSizes::derive(part.pg_size, part.blk_cnt * part.pg_per_blk),
            small_page: part.pg_size <= opcodes::SMALL_PAGE_SIZE,
            sector_size: 0,
            n_sec_per_pg: 0,
            oos_size_per_sec: 0,
            rsvd_size: 0,
            oos_segments: HVec::new(),
            part,
            bsp,
            ext,
        })
    }

    /// Open the bus and extension, and compute the per-sector OOS layout.
    ///
    /// `sector_size` must be one of [`ALLOWED_SECTOR_SIZES`] and divide the
    /// part's page size.
    pub fn setup(&mut self, sector_size: u32) -> Result<()> {
        if !ALLOWED_SECTOR_SIZES.contains(&sector_size) || self.part.pg_size % sector_size != 0 {
            log::warn!(
                "rejecting sector size {} against page size {}",
                sector_size,
                self.part.pg_size
            );
            return Err(Error::InvalidCfg);
        }
        self.sector_size = sector_size;
        self.n_sec_per_pg = self.part.pg_size / sector_size;
        if self.n_sec_per_pg as usize > MAX_SEC_PER_PG {
            return Err(Error::InvalidCfg);
        }

        self.bsp.open()?;
        self.ext.open()?;
        self.ext
            .setup(self.part.ecc_codeword_size, self.part.ecc_nbr_corr_bits)?;

        let codewords_per_sec = (sector_size as u16).div_ceil(self.part.ecc_codeword_size.max(1));
        self.rsvd_size = codewords_per_sec as u32 * self.ext.ecc_parity_size() as u32;

        let total_free = self.part.spare_total_avail_size();
        let logical_per_seg = total_free / self.n_sec_per_pg;
        if logical_per_seg < self.rsvd_size {
            return Err(Error::InvalidLowParams);
        }
        self.oos_size_per_sec = logical_per_seg - self.rsvd_size;
        self.oos_segments =
            build_oos_segments(&self.part.free_spare_map, self.n_sec_per_pg, logical_per_seg);
        Ok(())
    }

    /// Release hardware resources acquired by [`NandCtrlr::setup`].
    pub fn close(&mut self) {
        self.ext.close();
        self.bsp.close();
    }

    /// Usable out-of-sector bytes exposed to callers per logical sector.
    pub fn oos_size_per_sec(&self) -> u32 {
        self.oos_size_per_sec
    }

    fn sec_to_page(&self, sec_ix: u32) -> (u32, u32) {
        (sec_ix / self.n_sec_per_pg, sec_ix % self.n_sec_per_pg)
    }

    fn read_status(&mut self) -> Result<u8> {
        let mut guard = ChipSelectGuard::new(&mut self.bsp);
        guard.bsp().cmd_wr(&[opcodes::READ_STATUS])?;
        let mut sr = [0u8; 1];
        guard.bsp().data_rd(&mut sr, self.part.bus_width)?;
        Ok(sr[0])
    }

    fn wait_op(&mut self) -> Result<()> {
        self.bsp.wait_while_busy(OP_TIMEOUT_US)?;
        let raw = self.read_status()?;
        let status = self.ext.status_chk(raw);
        if status.fail {
            log::warn!("program/erase status reported FAIL (raw={:#04x})", raw);
            return Err(Error::OpFailed);
        }
        Ok(())
    }

    fn setup_read(&mut self, row: u32, col: u32) -> Result<()> {
        let mut guard = ChipSelectGuard::new(&mut self.bsp);
        if self.small_page {
            let (_zone, opcode) = addr::small_page_zone(col);
            guard.bsp().cmd_wr(&[opcode])?;
            let addr_bytes = addr::format(self.addr_sizes, col % 256, row);
            guard.bsp().addr_wr(&addr_bytes)?;
        } else {
            guard.bsp().cmd_wr(&[opcodes::READ_0])?;
            let addr_bytes = addr::format(self.addr_sizes, col, row);
            guard.bsp().addr_wr(&addr_bytes)?;
            guard.bsp().cmd_wr(&[opcodes::READ_CONFIRM])?;
        }
        Ok(())
    }

    /// Read `len` octets starting at in-page byte offset `col` of page `row`
    /// into `buf`, without ECC verification or spare unpacking.
    pub fn pg_rd_raw(&mut self, row: u32, col: u32, buf: &mut [u8]) -> Result<()> {
        self.setup_read(row, col)?;
        self.bsp.wait_while_busy(OP_TIMEOUT_US)?;
        let mut guard = ChipSelectGuard::new(&mut self.bsp);
        guard.bsp().data_rd(buf, self.part.bus_width)?;
        Ok(())
    }

    /// Read the page's raw physical spare area (including notches).
    pub fn spare_rd_raw(&mut self, row: u32, buf: &mut [u8]) -> Result<()> {
        self.pg_rd_raw(row, self.part.pg_size, buf)
    }

    /// Read one sector's usable (notch-free) OOS bytes.
    pub fn oos_rd_raw(&mut self, sec_ix: u32, buf: &mut [u8]) -> Result<()> {
        if buf.len() as u32 != self.oos_size_per_sec {
            return Err(Error::InvalidLowParams);
        }
        let (row, sub) = self.sec_to_page(sec_ix);
        let seg = self.oos_segments[sub as usize];
        let mut phys = heapless::Vec::<u8, 256>::new();
        phys.resize(seg.phys_len as usize, 0).map_err(|_| Error::InvalidLowParams)?;
        self.pg_rd_raw(row, self.part.pg_size + seg.phys_start, &mut phys)?;
        spare::unpack(&mut phys, &self.part.free_spare_map, seg.phys_start);
        buf.copy_from_slice(&phys[..buf.len()]);
        Ok(())
    }

    /// Read one logical sector's data, verifying (and, where possible,
    /// correcting) it against the ECC stored in its OOS segment.
    ///
    /// Returns `Ok(())` on a clean read; an ECC-severity error (see
    /// [`crate::error::worse_ecc_outcome`]) if correction was needed, with
    /// `data`/`oos` already holding the corrected content.
    pub fn sec_rd(&mut self, sec_ix: u32, data: &mut [u8], oos: &mut [u8]) -> Result<()> {
        if data.len() as u32 != self.sector_size || oos.len() as u32 != self.oos_size_per_sec {
            return Err(Error::InvalidLowParams);
        }
        let (row, sub) = self.sec_to_page(sec_ix);
        let col = sub * self.sector_size;

        self.pg_rd_raw(row, col, data)?;

        let seg = self.oos_segments[sub as usize];
        let mut phys = heapless::Vec::<u8, 256>::new();
        phys.resize(seg.phys_len as usize, 0).map_err(|_| Error::InvalidLowParams)?;
        self.pg_rd_raw(row, self.part.pg_size + seg.phys_start, &mut phys)?;
        spare::unpack(&mut phys, &self.part.free_spare_map, seg.phys_start);

        oos.copy_from_slice(&phys[..oos.len()]);
        let ecc = &phys[oos.len()..oos.len() + self.rsvd_size as usize];

        let mut outcome = Ok(());
        let codeword_size = self.part.ecc_codeword_size.max(1) as usize;
        let parity_size = self.ext.ecc_parity_size() as usize;
        for (chunk, parity) in data
            .chunks_mut(codeword_size)
            .zip(ecc.chunks(parity_size.max(1)))
        {
            let verdict = self.ext.ecc_verify(chunk, parity).into_result();
            if matches!(verdict, Err(Error::EccUncorr)) {
                log::warn!("sector {} uncorrectable after ECC verify", sec_ix);
            } else if matches!(verdict, Err(Error::EccCriticalCorr)) {
                log::warn!("sector {} corrected near the ECC correction limit", sec_ix);
            }
            outcome = worse_ecc_outcome(outcome, verdict);
        }
        outcome
    }

    /// Program one logical sector's data and OOS bytes, computing and
    /// storing fresh ECC parity alongside.
    pub fn sec_wr(&mut self, sec_ix: u32, data: &[u8], oos: &[u8]) -> Result<()> {
        if data.len() as u32 != self.sector_size || oos.len() as u32 != self.oos_size_per_sec {
            return Err(Error::InvalidLowParams);
        }
        let (row, sub) = self.sec_to_page(sec_ix);
        let col = sub * self.sector_size;
        let seg = self.oos_segments[sub as usize];

        let codeword_size = self.part.ecc_codeword_size.max(1) as usize;
        let parity_size = self.ext.ecc_parity_size() as usize;
        let mut ecc = heapless::Vec::<u8, 128>::new();
        for chunk in data.chunks(codeword_size) {
            let start = ecc.len();
            ecc.resize(start + parity_size, 0)
                .map_err(|_| Error::InvalidLowParams)?;
            self.ext.ecc_calc(chunk, &mut ecc[start..])?;
        }

        let mut phys = heapless::Vec::<u8, 256>::new();
        phys.extend_from_slice(oos).map_err(|_| Error::InvalidLowParams)?;
        phys.extend_from_slice(&ecc).map_err(|_| Error::InvalidLowParams)?;
        phys.resize(seg.phys_len as usize, 0xFF)
            .map_err(|_| Error::InvalidLowParams)?;
        spare::pack(&mut phys, &self.part.free_spare_map, seg.phys_start);

        {
            let mut guard = ChipSelectGuard::new(&mut self.bsp);
            guard.bsp().cmd_wr(&[opcodes::PROGRAM_SETUP])?;
            let addr_bytes = addr::format(self.addr_sizes, col, row);
            guard.bsp().addr_wr(&addr_bytes)?;
            guard.bsp().data_wr(data, self.part.bus_width)?;
        }
        self.wait_op()?;

        {
            let mut guard = ChipSelectGuard::new(&mut self.bsp);
            guard.bsp().cmd_wr(&[opcodes::CHANGE_WRITE_COLUMN])?;
            let addr_bytes = addr::format(self.addr_sizes, self.part.pg_size + seg.phys_start, row);
            guard.bsp().addr_wr(&addr_bytes)?;
            guard.bsp().data_wr(&phys, self.part.bus_width)?;
            guard.bsp().cmd_wr(&[opcodes::PROGRAM_CONFIRM])?;
        }
        self.wait_op()
    }

    /// Erase the block containing page `row`.
    pub fn blk_erase(&mut self, blk_ix: u32) -> Result<()> {
        if blk_ix >= self.part.blk_cnt {
            return Err(Error::InvalidUnitNbr);
        }
        let row = blk_ix * self.part.pg_per_blk;
        {
            let mut guard = ChipSelectGuard::new(&mut self.bsp);
            guard.bsp().cmd_wr(&[opcodes::ERASE_SETUP])?;
            let addr_bytes = addr::format(self.addr_sizes, 0, row);
            guard
                .bsp()
                .addr_wr(&addr_bytes[addr_bytes.len() - self.addr_sizes.row_addr_size as usize..])?;
            guard.bsp().cmd_wr(&[opcodes::ERASE_CONFIRM])?;
        }
        self.wait_op()
    }

    /// Read one parameter-page copy at byte offset `rel_addr` within the
    /// ONFI parameter-page stream (copy `n` starts at `n * page_len`).
    pub fn param_pg_rd(&mut self, rel_addr: u32, buf: &mut [u8]) -> Result<()> {
        {
            let mut guard = ChipSelectGuard::new(&mut self.bsp);
            guard.bsp().cmd_wr(&[opcodes::READ_PARAM_PAGE])?;
            guard.bsp().addr_wr(&[0])?;
        }
        self.bsp.wait_while_busy(opcodes::RESET_TIMEOUT_US)?;
        if rel_addr > 0 {
            let mut guard = ChipSelectGuard::new(&mut self.bsp);
            guard.bsp().cmd_wr(&[opcodes::CHANGE_READ_COLUMN])?;
            let rel_bytes = rel_addr.to_le_bytes();
            guard.bsp().addr_wr(&rel_bytes[..2])?;
            guard.bsp().cmd_wr(&[opcodes::CHANGE_READ_COLUMN_CONFIRM])?;
        }
        let mut guard = ChipSelectGuard::new(&mut self.bsp);
        guard.bsp().data_rd(buf, BusWidth::Eight)
    }

    /// Dispatch a miscellaneous device-level operation.
    pub fn io_ctl(&mut self, op: IoCtlOp, buf: &mut [u8]) -> Result<()> {
        match op {
            IoCtlOp::ParamPgRd => self.param_pg_rd(0, buf),
            IoCtlOp::PhyRdPage => self.pg_rd_raw(0, 0, buf),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn region(o: u16, l: u16) -> FreeSpareRegion {
        FreeSpareRegion::new(o, l)
    }

    #[cfg(feature = "alloc")]
    const TEST_SECTOR_SIZE: u32 = 512;

    #[test]
    fn oos_segments_partition_free_area_evenly() {
        let free: HVec<FreeSpareRegion, 8> = [region(0, 4), region(6, 60)].into_iter().collect();
        let segs = build_oos_segments(&free, 4, 16);
        assert_eq!(segs.len(), 4);
        let total_phys: u32 = segs.iter().map(|s| s.phys_len).sum();
        assert_eq!(total_phys, segs.last().unwrap().phys_start + segs.last().unwrap().phys_len - segs[0].phys_start);
        for s in &segs {
            assert!(s.phys_len >= 16);
        }
    }

    #[test]
    fn oos_segments_span_a_notch_when_crossing_regions() {
        let free: HVec<FreeSpareRegion, 8> = [region(0, 8), region(10, 8)].into_iter().collect();
        // first segment wants 10 logical bytes: 8 from region0, crosses the (8,2) notch, 2 from region1
        let segs = build_oos_segments(&free, 1, 10);
        assert_eq!(segs[0].phys_start, 0);
        assert_eq!(segs[0].phys_len, 12); // 8 + notch(2) + 2
    }

    #[cfg(feature = "alloc")]
    #[test]
    fn sec_rd_after_sec_wr_round_trips_data_and_oos() {
        use crate::bsp::BusWidth;
        use crate::nand::part::DefectMarkType;
        use fs_sim::{SimNandBsp, XorParityExt};

        let free: HVec<FreeSpareRegion, 8> = [region(0, 64)].into_iter().collect();
        let part = NandPartData {
            blk_cnt: 2,
            pg_per_blk: 64,
            pg_size: 2048,
            spare_size: 64,
            bus_width: BusWidth::Eight,
            nbr_pgm_per_pg: 1,
            ecc_nbr_corr_bits: 1,
            ecc_codeword_size: 512,
            defect_mark_type: DefectMarkType::Page0Byte1,
            max_bad_blk_cnt: 20,
            max_blk_erase: 100_000,
            free_spare_map: free,
        };
        let total_pages = part.blk_cnt * part.pg_per_blk;
        let bsp = SimNandBsp::new(
            part.pg_size,
            part.spare_size as u32,
            part.pg_per_blk,
            total_pages,
            alloc::vec![0xFFu8; 256],
        );
        let mut ctrlr = NandCtrlr::new(bsp, XorParityExt::new(), part).unwrap();
        ctrlr.setup(TEST_SECTOR_SIZE).unwrap();

        let data = [0xAAu8; TEST_SECTOR_SIZE as usize];
        let oos_len = ctrlr.oos_size_per_sec() as usize;
        let oos: alloc::vec::Vec<u8> = alloc::vec![0x11u8; oos_len];
        ctrlr.sec_wr(0, &data, &oos).unwrap();

        let mut rd_data = [0u8; TEST_SECTOR_SIZE as usize];
        let mut rd_oos: alloc::vec::Vec<u8> = alloc::vec![0u8; oos_len];
        ctrlr.sec_rd(0, &mut rd_data, &mut rd_oos).unwrap();
        assert_eq!(rd_data, data);
        assert_eq!(rd_oos, oos);
    }

    #[cfg(feature = "alloc")]
    #[test]
    fn sec_rd_reports_uncorrectable_when_stored_codeword_is_corrupted() {
        use crate::bsp::BusWidth;
        use crate::nand::part::DefectMarkType;
        use fs_sim::{SimNandBsp, XorParityExt};

        let free: HVec<FreeSpareRegion, 8> = [region(0, 64)].into_iter().collect();
        let part = NandPartData {
            blk_cnt: 1,
            pg_per_blk: 4,
            pg_size: 2048,
            spare_size: 64,
            bus_width: BusWidth::Eight,
            nbr_pgm_per_pg: 1,
            ecc_nbr_corr_bits: 1,
            ecc_codeword_size: 512,
            defect_mark_type: DefectMarkType::Page0Byte1,
            max_bad_blk_cnt: 20,
            max_blk_erase: 100_000,
            free_spare_map: free,
        };
        let total_pages = part.blk_cnt * part.pg_per_blk;
        let bsp = SimNandBsp::new(
            part.pg_size,
            part.spare_size as u32,
            part.pg_per_blk,
            total_pages,
            alloc::vec![0xFFu8; 256],
        );
        let mut ctrlr = NandCtrlr::new(bsp, XorParityExt::new(), part).unwrap();
        ctrlr.setup(TEST_SECTOR_SIZE).unwrap();

        let data = [0xAAu8; TEST_SECTOR_SIZE as usize];
        let oos_len = ctrlr.oos_size_per_sec() as usize;
        let oos: alloc::vec::Vec<u8> = alloc::vec![0x11u8; oos_len];
        ctrlr.sec_wr(0, &data, &oos).unwrap();

        // Flip a data bit directly in the page underneath the controller,
        // bypassing sec_wr so the stored parity goes stale.
        let mut corrupt = [0xAAu8; TEST_SECTOR_SIZE as usize];
        corrupt[0] ^= 0x01;
        {
            let mut guard = crate::bsp::ChipSelectGuard::new(&mut ctrlr.bsp);
            guard.bsp().cmd_wr(&[opcodes::PROGRAM_SETUP]).unwrap();
            let addr_bytes = addr::format(ctrlr.addr_sizes, 0, 0);
            guard.bsp().addr_wr(&addr_bytes).unwrap();
            guard.bsp().data_wr(&corrupt, BusWidth::Eight).unwrap();
        }

        let mut rd_data = [0u8; TEST_SECTOR_SIZE as usize];
        let mut rd_oos: alloc::vec::Vec<u8> = alloc::vec![0u8; oos_len];
        let result = ctrlr.sec_rd(0, &mut rd_data, &mut rd_oos);
        assert_eq!(result, Err(Error::EccUncorr));
    }
}
