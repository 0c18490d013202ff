//! Process-wide extension registry
//!
//! A short-lived critical section guards an append-once list of descriptors
//! for the [`crate::nand::ext::Extension`] implementations active in the
//! process, mirroring how embedded `no_std` code in this corpus guards
//! shared global state with `spin::Mutex` instead of an OS-backed lock (see
//! `agb::save::flash::cached_chip_info`'s `OnceCell` for the single-entry
//! case; this registry generalizes it to many entries with duplicate
//! detection).
//!
//! Registration is advisory bookkeeping, not a capability check: the
//! controller works whether or not its extension is registered here. It
//! exists so a board bring-up routine can assert "exactly the extensions I
//! expect are wired in" without threading a list through every `setup()`
//! call.

use spin::Mutex;

use crate::error::{Error, Result};

/// Upper bound on distinct extensions one process registers.
const MAX_EXTENSIONS: usize = 16;

/// Identifies one registered extension for duplicate detection and lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtensionDescriptor {
    /// Stable name for the part family the extension serves (e.g. `"onfi"`).
    pub name: &'static str,
    /// ECC codeword size the extension was configured for, for diagnostics.
    pub ecc_codeword_size: u16,
}

static REGISTRY: Mutex<heapless::Vec<ExtensionDescriptor, MAX_EXTENSIONS>> =
    Mutex::new(heapless::Vec::new());

/// Register `desc`, acquiring the registry's critical section for the
/// duration of the check-then-insert.
///
/// Re-registering a descriptor with the same `name` is a no-op, not an
/// error: the registry only ever grows, and callers that race to register
/// the same extension during concurrent bring-up should not have to
/// coordinate among themselves first.
pub fn register(desc: ExtensionDescriptor) -> Result<()> {
    let mut reg = REGISTRY.lock();
    if reg.iter().any(|d| d.name == desc.name) {
        return Ok(());
    }
    reg.push(desc).map_err(|_| Error::MemAlloc)
}

/// Number of distinct extensions currently registered.
pub fn registered_count() -> usize {
    REGISTRY.lock().len()
}

/// Look up a previously registered descriptor by name.
pub fn lookup(name: &str) -> Option<ExtensionDescriptor> {
    REGISTRY.lock().iter().find(|d| d.name == name).copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    // The registry is a single process-wide static; tests share it, so each
    // uses a name unlikely to collide with another test's.
    #[test]
    fn register_then_lookup_round_trips() {
        register(ExtensionDescriptor {
            name: "test-register-then-lookup",
            ecc_codeword_size: 512,
        })
        .unwrap();
        let found = lookup("test-register-then-lookup").unwrap();
        assert_eq!(found.ecc_codeword_size, 512);
    }

    #[test]
    fn duplicate_registration_is_not_an_error() {
        let desc = ExtensionDescriptor {
            name: "test-duplicate-registration",
            ecc_codeword_size: 256,
        };
        register(desc).unwrap();
        let before = registered_count();
        register(desc).unwrap();
        assert_eq!(registered_count(), before);
    }

    #[test]
    fn unregistered_name_is_not_found() {
        assert!(lookup("test-never-registered-xyz").is_none());
    }
}
