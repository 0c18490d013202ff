//! Chip-select scoped guard
//!
//! Mirrors the source's `FS_ERR_CHK`-bracketed "release chip-select on any
//! exit path" idiom as an RAII guard: as soon as the guard is dropped — on
//! the success path or via `?` during an intermediate bus cycle — chip
//! select is deasserted exactly once.

/// Capability to assert/deassert chip select, shared by the NAND and SPI NOR
/// BSP contracts.
pub trait ChipSelect {
    /// Assert chip select. Must remain asserted until `chip_sel_dis`.
    fn chip_sel_en(&mut self);
    /// Deassert chip select.
    fn chip_sel_dis(&mut self);
}

/// Scoped chip-select window
///
/// Asserts chip select on construction and deasserts it on drop, regardless
/// of how the scope is exited (normal return or an early `?` return from a
/// fallible bus cycle performed through [`ChipSelectGuard::bsp`]).
pub struct ChipSelectGuard<'a, B: ChipSelect> {
    bsp: &'a mut B,
}

impl<'a, B: ChipSelect> ChipSelectGuard<'a, B> {
    /// Assert chip select and open a scoped window over `bsp`.
    pub fn new(bsp: &'a mut B) -> Self {
        bsp.chip_sel_en();
        Self { bsp }
    }

    /// Access the underlying BSP for bus cycles within the window.
    pub fn bsp(&mut self) -> &mut B {
        self.bsp
    }
}

impl<'a, B: ChipSelect> Drop for ChipSelectGuard<'a, B> {
    fn drop(&mut self) {
        self.bsp.chip_sel_dis();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct CountingBsp {
        en_count: u32,
        dis_count: u32,
    }

    impl ChipSelect for CountingBsp {
        fn chip_sel_en(&mut self) {
            self.en_count += 1;
        }
        fn chip_sel_dis(&mut self) {
            self.dis_count += 1;
        }
    }

    #[test]
    fn guard_releases_on_normal_drop() {
        let mut bsp = CountingBsp {
            en_count: 0,
            dis_count: 0,
        };
        {
            let _guard = ChipSelectGuard::new(&mut bsp);
        }
        assert_eq!(bsp.en_count, 1);
        assert_eq!(bsp.dis_count, 1);
    }

    #[test]
    fn guard_releases_on_early_return() {
        let mut bsp = CountingBsp {
            en_count: 0,
            dis_count: 0,
        };

        fn fallible(bsp: &mut CountingBsp) -> Result<(), ()> {
            let mut guard = ChipSelectGuard::new(bsp);
            let _ = guard.bsp();
            Err(())
        }

        let _ = fallible(&mut bsp);
        assert_eq!(bsp.en_count, 1);
        assert_eq!(bsp.dis_count, 1);
    }
}
