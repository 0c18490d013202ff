//! RAM-disk block device
//!
//! A conformance reference for the [`fs_core::device::Device`] vtable: every
//! sector lives at a fixed offset in one in-memory buffer, so `rd`/`wr` are
//! a straight `copy_from_slice` with no controller, no BSP, and no ECC.
//! Useful for exercising the sector-API contract itself and for tests that
//! don't want real NAND/NOR timing in the loop.

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(feature = "alloc")]
extern crate alloc;

#[cfg(feature = "alloc")]
use alloc::vec;
#[cfg(feature = "alloc")]
use alloc::vec::Vec;

use fs_core::device::{Device, DeviceInfo, IoCtlOp};
use fs_core::error::{Error, Result};

/// Linear in-memory block device of fixed geometry.
#[cfg(feature = "alloc")]
pub struct RamDisk {
    sec_size: u32,
    data: Vec<u8>,
    open: bool,
}

#[cfg(feature = "alloc")]
impl RamDisk {
    /// Create a `sec_cnt`-sector device of `sec_size` octets per sector,
    /// erased (`0xFF`-filled).
    pub fn new(sec_size: u32, sec_cnt: u64) -> Self {
        Self {
            sec_size,
            data: vec![0xFFu8; sec_size as usize * sec_cnt as usize],
            open: false,
        }
    }

    /// Wrap pre-existing sector-aligned content instead of starting erased.
    pub fn with_data(sec_size: u32, data: Vec<u8>) -> Result<Self> {
        if data.len() as u64 % sec_size as u64 != 0 {
            return Err(Error::InvalidCfg);
        }
        Ok(Self {
            sec_size,
            data,
            open: false,
        })
    }

    /// The backing buffer, for test assertions.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    fn sec_cnt(&self) -> u64 {
        self.data.len() as u64 / self.sec_size as u64
    }

    fn bounds_ok(&self, start_sec: u64, cnt: u32, buf_len: usize) -> Result<(usize, usize)> {
        let end_sec = start_sec
            .checked_add(cnt as u64)
            .ok_or(Error::InvalidLowParams)?;
        if end_sec > self.sec_cnt() || buf_len as u64 != cnt as u64 * self.sec_size as u64 {
            return Err(Error::InvalidLowParams);
        }
        let start = start_sec as usize * self.sec_size as usize;
        let end = end_sec as usize * self.sec_size as usize;
        Ok((start, end))
    }
}

#[cfg(feature = "alloc")]
impl Device for RamDisk {
    const NAME: &'static str = "ramdisk";

    fn open(&mut self) -> Result<()> {
        self.open = true;
        Ok(())
    }

    fn close(&mut self) {
        self.open = false;
    }

    fn rd(&mut self, dest: &mut [u8], start_sec: u64, cnt: u32) -> Result<()> {
        if !self.open {
            return Err(Error::Io);
        }
        let (start, end) = self.bounds_ok(start_sec, cnt, dest.len())?;
        dest.copy_from_slice(&self.data[start..end]);
        Ok(())
    }

    fn wr(&mut self, src: &[u8], start_sec: u64, cnt: u32) -> Result<()> {
        if !self.open {
            return Err(Error::Io);
        }
        let (start, end) = self.bounds_ok(start_sec, cnt, src.len())?;
        self.data[start..end].copy_from_slice(src);
        Ok(())
    }

    fn query(&self) -> DeviceInfo {
        DeviceInfo {
            sec_size: self.sec_size,
            size: self.sec_cnt(),
            fixed: true,
        }
    }

    fn io_ctl(&mut self, op: IoCtlOp, buf: &mut [u8]) -> Result<()> {
        match op {
            IoCtlOp::NameGet => {
                let name = Self::NAME.as_bytes();
                if buf.len() < name.len() {
                    return Err(Error::InvalidLowParams);
                }
                buf[..name.len()].copy_from_slice(name);
                Ok(())
            }
            IoCtlOp::PhyStatus => Err(Error::InvalidIoCtl),
        }
    }
}

#[cfg(all(test, feature = "alloc"))]
mod tests {
    use super::*;

    #[test]
    fn write_then_read_round_trips() {
        let mut disk = RamDisk::new(512, 16);
        disk.open().unwrap();
        let src = [0xAAu8; 512 * 2];
        disk.wr(&src, 3, 2).unwrap();
        let mut dest = [0u8; 512 * 2];
        disk.rd(&mut dest, 3, 2).unwrap();
        assert_eq!(dest, src);
    }

    #[test]
    fn rd_rejects_out_of_range_sectors() {
        let mut disk = RamDisk::new(512, 4);
        disk.open().unwrap();
        let mut dest = [0u8; 512];
        assert_eq!(disk.rd(&mut dest, 3, 2), Err(Error::InvalidLowParams));
    }

    #[test]
    fn rd_before_open_fails() {
        let mut disk = RamDisk::new(512, 4);
        let mut dest = [0u8; 512];
        assert_eq!(disk.rd(&mut dest, 0, 1), Err(Error::Io));
    }

    #[test]
    fn query_reports_configured_geometry() {
        let disk = RamDisk::new(512, 32);
        let info = disk.query();
        assert_eq!(info.sec_size, 512);
        assert_eq!(info.size, 32);
        assert!(info.fixed);
    }

    #[test]
    fn name_get_returns_driver_name() {
        let mut disk = RamDisk::new(512, 4);
        let mut buf = [0u8; 16];
        disk.io_ctl(IoCtlOp::NameGet, &mut buf).unwrap();
        assert_eq!(&buf[..7], b"ramdisk");
    }
}
