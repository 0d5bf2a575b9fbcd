//! Binary layout of a dictionary file.
//!
//! ```text
//! ┌──────────────────────┐
//! │ u16 magic (0x78B1)   │
//! │ u8  version          │ ← header::parse() / header::write()
//! │ u16 options          │
//! ├──────────────────────┤
//! │ node                 │
//! │  u8 group count      │
//! │  group …             │ ← group::read_group()
//! ├──────────────────────┤
//! │ node …               │
//! └──────────────────────┘
//! ```
//!
//! Group layout:
//!
//! ```text
//! flags      | 2 bits children address width (00 none, 01 one, 10 two, 11 three bytes)
//!            | 1 bit  several characters
//!            | 1 bit  terminal
//!            | 1 bit  reserved
//!            | 1 bit  has bigrams
//!            | 2 bits reserved
//! chars      | one or more encoded characters, 0x1F terminated if several
//! frequency  | 1 byte, only if terminal
//! children   | 0..3 bytes, offset from the end of the fields above
//! bigrams    | chained attribute records while FLAG_ATTRIBUTE_HAS_NEXT is set:
//!            |   flags: has next (1) | negative (1) | address width (2) | frequency (4)
//!            |   1..3 bytes absolute offset from the end of the attribute flags
//! ```
//!
//! All addresses are relative to the first byte after the header, and all
//! multi-byte integers are big-endian.

pub mod group;
pub mod header;

pub const MAGIC_NUMBER: u16 = 0x78B1;
/// Magic (2) + version (1) + options (2).
pub const HEADER_SIZE: usize = 5;

pub const MASK_GROUP_ADDRESS_TYPE: u8 = 0xC0;
pub const FLAG_GROUP_ADDRESS_TYPE_NOADDRESS: u8 = 0x00;
pub const FLAG_GROUP_ADDRESS_TYPE_ONEBYTE: u8 = 0x40;
pub const FLAG_GROUP_ADDRESS_TYPE_TWOBYTES: u8 = 0x80;
pub const FLAG_GROUP_ADDRESS_TYPE_THREEBYTES: u8 = 0xC0;

pub const FLAG_HAS_MULTIPLE_CHARS: u8 = 0x20;
pub const FLAG_IS_TERMINAL: u8 = 0x10;
pub const FLAG_HAS_BIGRAMS: u8 = 0x04;

pub const FLAG_ATTRIBUTE_HAS_NEXT: u8 = 0x80;
pub const FLAG_ATTRIBUTE_OFFSET_NEGATIVE: u8 = 0x40;
pub const MASK_ATTRIBUTE_ADDRESS_TYPE: u8 = 0x30;
pub const FLAG_ATTRIBUTE_ADDRESS_TYPE_ONEBYTE: u8 = 0x10;
pub const FLAG_ATTRIBUTE_ADDRESS_TYPE_TWOBYTES: u8 = 0x20;
pub const FLAG_ATTRIBUTE_ADDRESS_TYPE_THREEBYTES: u8 = 0x30;
pub const FLAG_ATTRIBUTE_FREQUENCY: u8 = 0x0F;

pub const GROUP_CHARACTERS_TERMINATOR: u8 = 0x1F;

pub const GROUP_COUNT_SIZE: usize = 1;
pub const GROUP_TERMINATOR_SIZE: usize = 1;
pub const GROUP_FLAGS_SIZE: usize = 1;
pub const GROUP_FREQUENCY_SIZE: usize = 1;
pub const GROUP_MAX_ADDRESS_SIZE: usize = 3;
pub const GROUP_ATTRIBUTE_FLAGS_SIZE: usize = 1;
pub const GROUP_ATTRIBUTE_MAX_ADDRESS_SIZE: usize = 3;

/// Limited to 127 so the count byte never has its top bit set.
pub const MAX_CHARGROUPS_IN_A_NODE: usize = 127;
pub const MAX_TERMINAL_FREQUENCY: u32 = 255;
pub const MAX_BIGRAM_FREQUENCY: u8 = 0x0F;

/// Offsets are at most 3 bytes wide.
pub const MAX_ADDRESS: usize = 1 << 24;
