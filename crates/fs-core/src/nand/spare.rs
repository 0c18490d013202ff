//! Spare-area pack/unpack
//!
//! The physical spare area interleaves usable octets with vendor-reserved
//! "notches" (factory bad-block marks, vendor ECC areas in otherwise free
//! gaps). Callers work against a dense, notch-free logical buffer; these
//! functions insert/remove the notches when crossing into/out of the
//! physical representation.
//!
//! Grounded on `SparePack`/`SpareUnpack`/`SpareSplit`/`SpareJoin` in
//! `Dev/NAND/Ctrlr/fs_dev_nand_ctrlr_gen.c`, reworked as an explicit notch
//! list derived once from the free-spare map rather than a running cursor.

use heapless::Vec as HVec;

use super::part::FreeSpareRegion;

const MAX_NOTCHES: usize = super::part::MAX_FREE_SPARE_REGIONS;

/// A notch lying inside the requested segment, as `(local_offset, len)`
/// where `local_offset` is relative to the segment start.
type NotchList = HVec<(u32, u32), MAX_NOTCHES>;

fn notches_in_segment(free_regions: &[FreeSpareRegion], seg_start: u32, seg_end: u32) -> NotchList {
    let mut list = HVec::new();
    for i in 0..free_regions.len().saturating_sub(1) {
        let notch_start = free_regions[i].end();
        let notch_end = free_regions[i + 1].octet_offset as u32;
        if notch_end <= notch_start {
            continue;
        }
        let clip_start = notch_start.max(seg_start);
        let clip_end = notch_end.min(seg_end);
        if clip_start < clip_end {
            let _ = list.push((clip_start - seg_start, clip_end - clip_start));
        }
    }
    list
}

/// Shift `buf[at..buf.len()-gap_len]` right by `gap_len`, filling the
/// vacated `[at, at+gap_len)` window with `0xFF`.
fn splice_insert(buf: &mut [u8], at: usize, gap_len: usize) {
    let end = buf.len();
    debug_assert!(at + gap_len <= end);
    let mut i = end - gap_len;
    while i > at {
        i -= 1;
        buf[i + gap_len] = buf[i];
    }
    for b in &mut buf[at..at + gap_len] {
        *b = 0xFF;
    }
}

/// Shift `buf[at+gap_len..buf.len()]` left by `gap_len`, filling the
/// vacated tail `[buf.len()-gap_len, buf.len())` with `0xFF`.
fn splice_remove(buf: &mut [u8], at: usize, gap_len: usize) {
    let end = buf.len();
    debug_assert!(at + gap_len <= end);
    for i in (at + gap_len)..end {
        buf[i - gap_len] = buf[i];
    }
    for b in &mut buf[end - gap_len..end] {
        *b = 0xFF;
    }
}

/// Pack a dense logical buffer into its physical, notch-bearing layout.
///
/// `buf` is sized to the segment's full physical length; on entry its low
/// `buf.len() - total_notch_len` octets hold the logical content and the
/// remainder is unspecified. On return the notches have been spliced in at
/// their fixed physical offsets, filled with `0xFF`.
pub fn pack(buf: &mut [u8], free_regions: &[FreeSpareRegion], seg_start: u32) {
    let seg_end = seg_start + buf.len() as u32;
    for (local, len) in notches_in_segment(free_regions, seg_start, seg_end) {
        splice_insert(buf, local as usize, len as usize);
    }
}

/// Unpack a physical, notch-bearing buffer back into its dense logical form.
///
/// Inverse of [`pack`]: notches are removed in reverse physical order so an
/// earlier notch's offset is never invalidated by removing a later one.
pub fn unpack(buf: &mut [u8], free_regions: &[FreeSpareRegion], seg_start: u32) {
    let seg_end = seg_start + buf.len() as u32;
    let notches = notches_in_segment(free_regions, seg_start, seg_end);
    for &(local, len) in notches.iter().rev() {
        splice_remove(buf, local as usize, len as usize);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn regions(pairs: &[(u16, u16)]) -> HVec<FreeSpareRegion, MAX_NOTCHES> {
        pairs
            .iter()
            .map(|&(o, l)| FreeSpareRegion::new(o, l))
            .collect()
    }

    #[test]
    fn pack_then_unpack_recovers_logical_buffer_single_notch() {
        let free = regions(&[(0, 3), (5, 9)]);
        let logical: [u8; 12] = [1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12];

        let mut buf = [0u8; 14];
        buf[..12].copy_from_slice(&logical);
        pack(&mut buf, &free, 0);
        assert_eq!(&buf[0..3], &[1, 2, 3]);
        assert_eq!(&buf[3..5], &[0xFF, 0xFF]);
        assert_eq!(&buf[5..14], &[4, 5, 6, 7, 8, 9, 10, 11, 12]);

        unpack(&mut buf, &free, 0);
        assert_eq!(&buf[0..12], &logical);
    }

    #[test]
    fn pack_then_unpack_recovers_logical_buffer_multi_notch() {
        // regions: [0,3) free, notch (3,2), [5,9) free, notch (9,3), [12,17) free
        let free = regions(&[(0, 3), (5, 4), (12, 5)]);
        let logical: [u8; 12] = *b"ABCDEFGHIJKL";

        let mut buf = [0u8; 17];
        buf[..12].copy_from_slice(&logical);
        pack(&mut buf, &free, 0);

        assert_eq!(&buf[0..3], b"ABC");
        assert_eq!(&buf[3..5], &[0xFF, 0xFF]);
        assert_eq!(&buf[5..9], b"DEFG");
        assert_eq!(&buf[9..12], &[0xFF, 0xFF, 0xFF]);
        assert_eq!(&buf[12..17], b"HIJKL");

        unpack(&mut buf, &free, 0);
        assert_eq!(&buf[0..12], &logical);
    }

    #[test]
    fn no_notches_is_a_no_op() {
        let free = regions(&[(0, 16)]);
        let mut buf = [1, 2, 3, 4];
        let orig = buf;
        pack(&mut buf, &free, 0);
        assert_eq!(buf, orig);
        unpack(&mut buf, &free, 0);
        assert_eq!(buf, orig);
    }

    #[test]
    fn segment_offset_into_spare_area_is_honored() {
        // free regions describe the whole spare area; segment starts partway in.
        let free = regions(&[(0, 4), (4, 2), (10, 4), (14, 3), (20, 6)]);
        // segment covers spare-relative [10, 23): region(10,4) + notch(14,3) + region(20,3 of the 6)
        let logical: [u8; 7] = *b"WXYZwxy";
        let mut buf = [0u8; 10];
        buf[..7].copy_from_slice(&logical);
        pack(&mut buf, &free, 10);
        assert_eq!(&buf[0..4], b"WXYZ");
        assert_eq!(&buf[4..7], &[0xFF, 0xFF, 0xFF]);
        assert_eq!(&buf[7..10], b"wxy");

        unpack(&mut buf, &free, 10);
        assert_eq!(&buf[0..7], &logical);
    }
}
