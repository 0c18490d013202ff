//! In-memory `Extension` test double
//!
//! Computes one parity octet per codeword by XOR-folding its bytes. This
//! has no correction capability at all (unlike a real Hamming/BCH engine),
//! which is the point: a parity mismatch can only ever be reported as
//! [`EccOutcome::Uncorrectable`], making it a direct way to exercise the
//! controller's uncorrectable-ECC escalation path without modeling a real
//! error-correcting code.

use fs_core::error::Result;
use fs_core::nand::ext::{DeviceStatus, EccOutcome, Extension};
use fs_core::nand::opcodes;

/// XOR-parity `Extension` test double.
#[derive(Debug, Default)]
pub struct XorParityExt {
    parity_size: u16,
}

impl XorParityExt {
    /// Build an extension; `setup` fills in the real parity size.
    pub fn new() -> Self {
        Self::default()
    }

    fn fold(codeword: &[u8]) -> u8 {
        codeword.iter().fold(0u8, |acc, &b| acc ^ b)
    }
}

impl Extension for XorParityExt {
    fn init(&mut self) -> Result<()> {
        Ok(())
    }

    fn open(&mut self) -> Result<()> {
        Ok(())
    }

    fn close(&mut self) {}

    fn setup(&mut self, _ecc_codeword_size: u16, _ecc_nbr_corr_bits: u8) -> Result<()> {
        self.parity_size = 1;
        Ok(())
    }

    fn ecc_parity_size(&self) -> u16 {
        self.parity_size
    }

    fn status_chk(&self, raw_status: u8) -> DeviceStatus {
        DeviceStatus {
            ready: raw_status & opcodes::SR_READY != 0,
            fail: raw_status & opcodes::SR_FAIL != 0,
        }
    }

    fn ecc_calc(&mut self, codeword: &[u8], ecc_out: &mut [u8]) -> Result<()> {
        ecc_out[0] = Self::fold(codeword);
        Ok(())
    }

    fn ecc_verify(&mut self, codeword: &mut [u8], ecc: &[u8]) -> EccOutcome {
        if Self::fold(codeword) == ecc[0] {
            EccOutcome::Ok
        } else {
            EccOutcome::Uncorrectable
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matching_parity_reports_ok() {
        let mut ext = XorParityExt::new();
        ext.setup(512, 1).unwrap();
        let mut ecc = [0u8; 1];
        ext.ecc_calc(&[1, 2, 3, 4], &mut ecc).unwrap();
        let mut data = [1u8, 2, 3, 4];
        assert_eq!(ext.ecc_verify(&mut data, &ecc), EccOutcome::Ok);
    }

    #[test]
    fn corrupted_codeword_reports_uncorrectable() {
        let mut ext = XorParityExt::new();
        ext.setup(512, 1).unwrap();
        let mut ecc = [0u8; 1];
        ext.ecc_calc(&[1, 2, 3, 4], &mut ecc).unwrap();
        let mut data = [1u8, 2, 3, 5];
        assert_eq!(ext.ecc_verify(&mut data, &ecc), EccOutcome::Uncorrectable);
    }
}
