//! Aggregate SPI NOR identification-table size (`std`-only)
//!
//! Mirrors `rflasher-chips-codegen`'s `once_cell::sync::Lazy` static chip
//! database: the per-family tables in [`super::phy`] are each small and
//! `const`, but a caller diagnosing "how many parts does this build
//! recognize" shouldn't re-sum them on every call. Computed once, cached
//! for the life of the process.

use once_cell::sync::Lazy;

use super::phy::{at25, sst25, stm25, w25q};

static SUPPORTED_PART_COUNT: Lazy<usize> =
    Lazy::new(|| at25::DEVICE_COUNT + w25q::DEVICE_COUNT + stm25::DEVICE_COUNT + sst25::DEVICE_COUNT);

/// Total number of distinct JEDEC device IDs recognized across every SPI
/// NOR family driver in this build.
pub fn supported_part_count() -> usize {
    *SUPPORTED_PART_COUNT
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_every_family_table() {
        assert_eq!(
            supported_part_count(),
            at25::DEVICE_COUNT + w25q::DEVICE_COUNT + stm25::DEVICE_COUNT + sst25::DEVICE_COUNT
        );
        assert!(supported_part_count() >= 4);
    }
}
