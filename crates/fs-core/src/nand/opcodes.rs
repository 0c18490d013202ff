//! NAND wire-protocol opcodes
//!
//! Bit-exact command bytes per §6 of the governing specification; values are
//! shared by every part family the generic controller drives.

/// Reset
pub const RESET: u8 = 0xFF;
/// Read ID
pub const READ_ID: u8 = 0x90;
/// Read Parameter Page (ONFI)
pub const READ_PARAM_PAGE: u8 = 0xEC;

/// Page read (large page, zone A / start-of-page small page)
pub const READ_0: u8 = 0x00;
/// Page read confirm (large page second cycle)
pub const READ_CONFIRM: u8 = 0x30;
/// Page read, small-page zone B (columns 256..512 on an 8-bit bus)
pub const READ_ZONE_B: u8 = 0x01;
/// Page read, small-page zone C (columns >= 512)
pub const READ_ZONE_C: u8 = 0x50;
/// Change read column (large page)
pub const CHANGE_READ_COLUMN: u8 = 0x05;
/// Change read column confirm (large page)
pub const CHANGE_READ_COLUMN_CONFIRM: u8 = 0xE0;

/// Page program setup
pub const PROGRAM_SETUP: u8 = 0x80;
/// Page program confirm
pub const PROGRAM_CONFIRM: u8 = 0x10;
/// Change write column
pub const CHANGE_WRITE_COLUMN: u8 = 0x85;

/// Block erase setup
pub const ERASE_SETUP: u8 = 0x60;
/// Block erase confirm
pub const ERASE_CONFIRM: u8 = 0xD0;

/// Read status register
pub const READ_STATUS: u8 = 0x70;

/// Status register: operation failed
pub const SR_FAIL: u8 = 0x01;
/// Status register: device ready
pub const SR_READY: u8 = 0x40;

/// Small page size threshold; at or below this size a part uses the
/// small-page addressing/command protocol instead of the large-page one.
pub const SMALL_PAGE_SIZE: u32 = 512;

/// Reset wait bound in microseconds
pub const RESET_TIMEOUT_US: u32 = 1000;
