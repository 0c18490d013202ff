//! NAND extension capability (ECC / status interpretation)
//!
//! A part family plugs in an [`Extension`] implementation that knows how to
//! interpret the device's status register and compute/verify ECC. The
//! generic controller is otherwise ECC-agnostic.
//!
//! Grounded on the `programmer`/feature-detection split in
//! `rflasher-core/src/programmer/traits.rs`: the controller holds a trait
//! object behind a capability boundary rather than matching on part type.

use crate::error::{Error, Result};

/// Outcome of verifying one ECC-protected codeword against its stored parity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EccOutcome {
    /// Data matched its parity; no correction needed.
    Ok,
    /// Data was corrected within the ECC's guaranteed correction strength.
    Corrected,
    /// Data was corrected but the bit-flip count approached the ECC's
    /// correction limit; the caller should treat the block as suspect.
    CriticalCorrected,
    /// Data could not be corrected.
    Uncorrectable,
}

impl EccOutcome {
    /// Map this outcome onto the crate-wide `Result`, per the error
    /// taxonomy's ECC severity ordering.
    pub fn into_result(self) -> Result<()> {
        match self {
            EccOutcome::Ok => Ok(()),
            EccOutcome::Corrected => Err(Error::EccCorr),
            EccOutcome::CriticalCorrected => Err(Error::EccCriticalCorr),
            EccOutcome::Uncorrectable => Err(Error::EccUncorr),
        }
    }
}

/// Decoded device status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceStatus {
    /// Device reports ready (not busy).
    pub ready: bool,
    /// Device reports the last program/erase operation failed.
    pub fail: bool,
}

/// Capability set a NAND part family provides for status interpretation and
/// ECC, on top of the generic controller's bus-level primitives.
pub trait Extension {
    /// One-time initialization (e.g. allocate ECC engine state).
    fn init(&mut self) -> Result<()>;

    /// Prepare the extension for a unit.
    fn open(&mut self) -> Result<()>;
    /// Release resources acquired by `open`.
    fn close(&mut self);

    /// Configure the extension for the part's codeword/page geometry.
    fn setup(&mut self, ecc_codeword_size: u16, ecc_nbr_corr_bits: u8) -> Result<()>;

    /// Octets of parity one codeword requires, given the geometry passed to
    /// `setup`. Used by the controller to size the ECC-reserved tail of each
    /// sector's OOS segment.
    fn ecc_parity_size(&self) -> u16;

    /// Decode a raw status register read into a [`DeviceStatus`].
    fn status_chk(&self, raw_status: u8) -> DeviceStatus;

    /// Compute ECC parity for one codeword, appending it to `ecc_out`.
    fn ecc_calc(&mut self, codeword: &[u8], ecc_out: &mut [u8]) -> Result<()>;

    /// Verify (and, if needed, correct in place) one codeword against its
    /// stored parity.
    fn ecc_verify(&mut self, codeword: &mut [u8], ecc: &[u8]) -> EccOutcome;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ecc_outcome_maps_to_expected_errors() {
        assert_eq!(EccOutcome::Ok.into_result(), Ok(()));
        assert_eq!(EccOutcome::Corrected.into_result(), Err(Error::EccCorr));
        assert_eq!(
            EccOutcome::CriticalCorrected.into_result(),
            Err(Error::EccCriticalCorr)
        );
        assert_eq!(
            EccOutcome::Uncorrectable.into_result(),
            Err(Error::EccUncorr)
        );
    }
}
