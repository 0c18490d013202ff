//! NOR opcodes
//!
//! JEDEC-standard SPI NOR command bytes plus the AMD/Intel-style parallel
//! NOR command values used by the `intel`/`sst39` drivers.

// ---------------------------------------------------------------------
// SPI: write control
// ---------------------------------------------------------------------

/// Write Enable
pub const WREN: u8 = 0x06;
/// Write Disable
pub const WRDI: u8 = 0x04;

// ---------------------------------------------------------------------
// SPI: status register
// ---------------------------------------------------------------------

/// Read Status Register 1
pub const RDSR: u8 = 0x05;
/// Write Status Register 1
pub const WRSR: u8 = 0x01;

/// Status register bit: write/erase/program in progress
pub const SR1_BUSY: u8 = 0x01;
/// Status register bit: Write Enable Latch set
pub const SR1_WEL: u8 = 0x02;

// ---------------------------------------------------------------------
// SPI: identification
// ---------------------------------------------------------------------

/// Read JEDEC ID (manufacturer + device ID)
pub const RDID: u8 = 0x9F;
/// Read SFDP/CFI parameter table
pub const RDSFDP: u8 = 0x5A;

// ---------------------------------------------------------------------
// SPI: read
// ---------------------------------------------------------------------

/// Read Data, 3-byte address
pub const READ: u8 = 0x03;
/// Fast Read, 3-byte address + one dummy byte
pub const FAST_READ: u8 = 0x0B;

// ---------------------------------------------------------------------
// SPI: program / erase
// ---------------------------------------------------------------------

/// Page Program, 3-byte address
pub const PP: u8 = 0x02;
/// Sector Erase (4 KiB), 3-byte address
pub const SE: u8 = 0x20;
/// Block Erase (64 KiB), 3-byte address
pub const BE: u8 = 0xD8;
/// Chip Erase
pub const CE: u8 = 0xC7;

/// Enter 4-byte address mode
pub const EN4B: u8 = 0xB7;
/// Exit 4-byte address mode
pub const EX4B: u8 = 0xE9;

// ---------------------------------------------------------------------
// SPI: AAI (Auto Address Increment) — SST25 family
// ---------------------------------------------------------------------

/// AAI Word-Program
pub const AAI_WORD_PROGRAM: u8 = 0xAD;
/// AAI Byte-Program (revision-A parts)
pub const AAI_BYTE_PROGRAM: u8 = 0xAF;

// ---------------------------------------------------------------------
// Parallel: CFI query (Intel-compatible)
// ---------------------------------------------------------------------

/// Enter CFI query mode
pub const CFI_QUERY: u16 = 0x0098;
/// Read-array / reset
pub const CMD_READ_ARRAY: u16 = 0x00FF;
/// Intel word program setup
pub const CMD_PROGRAM: u16 = 0x0040;
/// Intel block erase setup
pub const CMD_ERASE_SETUP: u16 = 0x0020;
/// Intel erase confirm
pub const CMD_ERASE_CONFIRM: u16 = 0x00D0;
/// Intel clear status register
pub const CMD_CLEAR_STATUS: u16 = 0x0050;
/// Intel read status register
pub const CMD_READ_STATUS: u16 = 0x0070;

/// Intel status register bit: Write State Machine ready
pub const INTEL_SR_WSMS: u16 = 0x0080;
/// Intel status register bit: erase error
pub const INTEL_SR_ERASE_ERR: u16 = 0x0020;
/// Intel status register bit: program error
pub const INTEL_SR_PROGRAM_ERR: u16 = 0x0010;
/// Intel status register bit: block-locked error
pub const INTEL_SR_LOCK_ERR: u16 = 0x0002;

// ---------------------------------------------------------------------
// Parallel: AMD/SST-style two-cycle unlock (SST39)
// ---------------------------------------------------------------------

/// First unlock cycle address
pub const SST39_UNLOCK_ADDR1: usize = 0x5555;
/// Second unlock cycle address
pub const SST39_UNLOCK_ADDR2: usize = 0x2AAA;
/// First unlock cycle data
pub const SST39_UNLOCK_DATA1: u16 = 0x00AA;
/// Second unlock cycle data
pub const SST39_UNLOCK_DATA2: u16 = 0x0055;
/// Software ID entry command
pub const SST39_CMD_SOFTWARE_ID: u16 = 0x0090;
/// Software ID exit / reset command
pub const SST39_CMD_RESET: u16 = 0x00F0;
/// Byte/word program command
pub const SST39_CMD_PROGRAM: u16 = 0x00A0;
/// Sector erase command
pub const SST39_CMD_SECTOR_ERASE: u16 = 0x0030;

/// Toggle-bit mask (DQ6) in the data bus read back during a poll
pub const SST39_TOGGLE_BIT: u16 = 0x0040;

/// JEDEC manufacturer ID recognized for the SST39 family.
pub const SST39_MANUFACTURER_ID: u16 = 0x00BF;
