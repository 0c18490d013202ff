//! Error types for fs-core
//!
//! This module provides a no_std compatible error type shared by every
//! subsystem in the crate: the BSP contracts, the NAND generic controller,
//! the ONFI part layer, and the NOR physical drivers.

use core::fmt;

/// Core error type - no_std compatible, Copy for efficiency
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    // Configuration errors
    /// Configuration struct violates constraints (e.g. sector size doesn't divide page size)
    InvalidCfg,
    /// Geometry or spare-map parsed from hardware is unsupported
    InvalidLowParams,
    /// No such unit number
    InvalidUnitNbr,
    /// Operation not available on this part (e.g. chip-erase on a part that lacks it)
    InvalidOp,
    /// Unknown I/O-ctl opcode
    InvalidIoCtl,

    // Bus / device faults
    /// Bus or command-level fault (bad ID, status FAIL)
    Io,
    /// `WaitWhileBusy` exceeded its bound
    Timeout,
    /// Scratch/descriptor allocation failed
    MemAlloc,

    // ECC outcomes (read sector)
    /// Data was corrected by ECC; still usable
    EccCorr,
    /// Data was corrected by ECC near the correction-capability limit
    EccCriticalCorr,
    /// Data is uncorrectable; treat as data loss
    EccUncorr,

    // Write protection
    /// Device reports software write protection
    WrProt,
    /// Erase/program status FAIL bit set after a successful wait
    OpFailed,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidCfg => write!(f, "invalid configuration"),
            Self::InvalidLowParams => write!(f, "invalid low-level device parameters"),
            Self::InvalidUnitNbr => write!(f, "invalid unit number"),
            Self::InvalidOp => write!(f, "operation not supported by this part"),
            Self::InvalidIoCtl => write!(f, "unknown I/O control opcode"),
            Self::Io => write!(f, "bus or command-level I/O fault"),
            Self::Timeout => write!(f, "operation timed out"),
            Self::MemAlloc => write!(f, "scratch or descriptor allocation failed"),
            Self::EccCorr => write!(f, "ECC corrected data"),
            Self::EccCriticalCorr => write!(f, "ECC corrected data near correction limit"),
            Self::EccUncorr => write!(f, "ECC uncorrectable error"),
            Self::WrProt => write!(f, "device is write protected"),
            Self::OpFailed => write!(f, "erase/program operation reported failure"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

/// Result type alias using the core Error type
pub type Result<T> = core::result::Result<T, Error>;

/// Host-facing error, `std`-only: attaches the operation name and unit
/// number to a core [`Error`] for a caller that logs or reports failures
/// rather than branching on their kind.
///
/// The no_std [`Error`] stays a plain `Copy` enum so it can propagate
/// through `no_std` call chains for free; this wrapper exists only where a
/// host-side caller under the `std` feature wants a `std::error::Error`
/// with context attached, the way `rflasher-linux-spi::LinuxSpiError`
/// wraps an `std::io::Error` with the path/mode/speed that was in flight.
#[cfg(feature = "std")]
#[derive(Debug, thiserror::Error)]
#[error("{op} (unit {unit_nbr}) failed: {source}")]
pub struct Report {
    /// Operation being attempted, e.g. `"sec_rd"` or `"onfi::open"`.
    pub op: &'static str,
    /// Unit number the operation targeted.
    pub unit_nbr: u32,
    /// Underlying error.
    #[source]
    pub source: Error,
}

#[cfg(feature = "std")]
impl Report {
    /// Attach `op`/`unit_nbr` context to `source`.
    pub fn new(op: &'static str, unit_nbr: u32, source: Error) -> Self {
        Self { op, unit_nbr, source }
    }
}

/// Ranks read-sector outcomes so the worst one always wins when combining the
/// status-check result with the post-read `ECC_Verify` result.
///
/// Ordering (worst first): uncorrectable > critical-corrected > corrected > ok.
pub fn worse_ecc_outcome(a: Result<()>, b: Result<()>) -> Result<()> {
    fn rank(r: &Result<()>) -> u8 {
        match r {
            Err(Error::EccUncorr) => 3,
            Err(Error::EccCriticalCorr) => 2,
            Err(Error::EccCorr) => 1,
            _ => 0,
        }
    }
    if rank(&a) >= rank(&b) {
        a
    } else {
        b
    }
}

/// Per-error-kind occurrence counters, opt in via the `alloc` feature.
///
/// Mirrors the opt-in bookkeeping shape of `rflasher-core`'s
/// `ChipTestStatus`: a plain struct of counters the caller updates after
/// each fallible call, not a background collector or a hook threaded
/// through every `Result`.
#[cfg(feature = "alloc")]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ErrorStats {
    /// `InvalidCfg` occurrences.
    pub invalid_cfg: u32,
    /// `InvalidLowParams` occurrences.
    pub invalid_low_params: u32,
    /// `InvalidUnitNbr` occurrences.
    pub invalid_unit_nbr: u32,
    /// `InvalidOp` occurrences.
    pub invalid_op: u32,
    /// `InvalidIoCtl` occurrences.
    pub invalid_io_ctl: u32,
    /// `Io` occurrences.
    pub io: u32,
    /// `Timeout` occurrences.
    pub timeout: u32,
    /// `MemAlloc` occurrences.
    pub mem_alloc: u32,
    /// `EccCorr` occurrences.
    pub ecc_corr: u32,
    /// `EccCriticalCorr` occurrences.
    pub ecc_critical_corr: u32,
    /// `EccUncorr` occurrences.
    pub ecc_uncorr: u32,
    /// `WrProt` occurrences.
    pub wr_prot: u32,
    /// `OpFailed` occurrences.
    pub op_failed: u32,
}

#[cfg(feature = "alloc")]
impl ErrorStats {
    /// Increment the counter matching `err`.
    pub fn record(&mut self, err: Error) {
        let counter = match err {
            Error::InvalidCfg => &mut self.invalid_cfg,
            Error::InvalidLowParams => &mut self.invalid_low_params,
            Error::InvalidUnitNbr => &mut self.invalid_unit_nbr,
            Error::InvalidOp => &mut self.invalid_op,
            Error::InvalidIoCtl => &mut self.invalid_io_ctl,
            Error::Io => &mut self.io,
            Error::Timeout => &mut self.timeout,
            Error::MemAlloc => &mut self.mem_alloc,
            Error::EccCorr => &mut self.ecc_corr,
            Error::EccCriticalCorr => &mut self.ecc_critical_corr,
            Error::EccUncorr => &mut self.ecc_uncorr,
            Error::WrProt => &mut self.wr_prot,
            Error::OpFailed => &mut self.op_failed,
        };
        *counter = counter.saturating_add(1);
    }

    /// Record the error carried by a failed `Result`; a successful one is a
    /// no-op.
    pub fn record_result<T>(&mut self, result: &Result<T>) {
        if let Err(err) = result {
            self.record(*err);
        }
    }
}
