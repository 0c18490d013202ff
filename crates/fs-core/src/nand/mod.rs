//! Generic NAND driver stack
//!
//! [`ctrlr`] drives the small-page/large-page command protocol against any
//! [`crate::bsp::NandBsp`]; [`onfi`] discovers part geometry from a
//! device's ONFI parameter page; part families plug ECC/status
//! interpretation in through [`ext::Extension`].

pub mod addr;
pub mod ctrlr;
pub mod ext;
pub mod onfi;
pub mod opcodes;
pub mod part;
pub mod spare;

pub use ctrlr::{IoCtlOp, NandCtrlr};
pub use ext::{DeviceStatus, EccOutcome, Extension};
pub use part::{DefectMarkType, FreeSpareMap, FreeSpareRegion, NandPartData};
