//! Sector-API façade
//!
//! Unifies every driver family behind one trait so callers never need to
//! know whether they're talking to a NAND controller, a SPI NOR PHY, or a
//! linear RAM disk.
//!
//! Grounded on `rflasher-core::programmer::SpiMaster` being implemented
//! once per backend crate (`rflasher-dummy`, `rflasher-linux-spi`): here
//! the capability boundary is the storage device itself rather than the
//! bus master underneath it.

use crate::error::Result;

/// Device-level geometry returned by [`Device::query`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceInfo {
    /// Logical sector size in octets.
    pub sec_size: u32,
    /// Total sector count.
    pub size: u64,
    /// Whether the device's geometry is fixed for its lifetime (always
    /// `true` for the drivers in this crate; exists so callers don't need
    /// a separate capability query for removable media).
    pub fixed: bool,
}

/// Miscellaneous device-level operation dispatched through [`Device::io_ctl`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IoCtlOp {
    /// Request the device's human-readable name into the caller's buffer.
    NameGet,
    /// Request a low-level phy/part status snapshot; driver-defined layout.
    PhyStatus,
}

/// Capability set every storage driver in this crate exposes uniformly.
///
/// Mirrors the C vtable `{NameGet, Init, Open, Close, Rd, Wr, Query,
/// IO_Ctrl}`: `Init`/the name getter are associated items, the rest are
/// trait methods on an opened instance.
pub trait Device {
    /// Human-readable driver name, for diagnostics.
    const NAME: &'static str;

    /// Open the device, preparing it for `rd`/`wr`.
    fn open(&mut self) -> Result<()>;
    /// Close the device, releasing any hardware resources.
    fn close(&mut self);

    /// Read `cnt` sectors starting at `start_sec` into `dest`.
    ///
    /// `dest.len()` must equal `cnt * query().sec_size`.
    fn rd(&mut self, dest: &mut [u8], start_sec: u64, cnt: u32) -> Result<()>;
    /// Write `cnt` sectors starting at `start_sec` from `src`.
    ///
    /// `src.len()` must equal `cnt * query().sec_size`.
    fn wr(&mut self, src: &[u8], start_sec: u64, cnt: u32) -> Result<()>;

    /// Device geometry.
    fn query(&self) -> DeviceInfo;

    /// Dispatch a miscellaneous operation.
    fn io_ctl(&mut self, op: IoCtlOp, buf: &mut [u8]) -> Result<()>;
}
