//! Variable-width offsets.
//!
//! An offset takes 1 byte if its magnitude is below 0x100, 2 bytes below
//! 0x10000 and 3 bytes otherwise. The sign of attribute offsets lives in the
//! attribute flags, never in the stored bytes.

use std::io::{Read, Write};

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};

use crate::makedict::format::*;
use crate::makedict::types::error::{MakedictError, Result};

/// Number of bytes needed to store the magnitude of `offset`.
pub fn address_width(offset: i64) -> Result<usize> {
    let magnitude = offset.unsigned_abs();
    if magnitude >= MAX_ADDRESS as u64 {
        return Err(MakedictError::DictionaryTooLarge {
            size: magnitude as usize,
        });
    }
    Ok(match magnitude {
        0..=0xFF => 1,
        0x100..=0xFFFF => 2,
        _ => 3,
    })
}

/// Width of an optional children offset; absent offsets take no space.
pub fn children_address_width(offset: Option<i64>) -> Result<usize> {
    offset.map_or(Ok(0), address_width)
}

/// Writes `value` on exactly `width` bytes.
pub fn write_address<W: Write>(dest: &mut W, value: u32, width: usize) -> Result<()> {
    match width {
        0 => {}
        1 => dest.write_u8(value as u8)?,
        2 => dest.write_u16::<BigEndian>(value as u16)?,
        3 => dest.write_u24::<BigEndian>(value)?,
        _ => {
            return Err(MakedictError::LayoutInvariant(format!(
                "Address {} has a strange size {}",
                value, width
            )))
        }
    }
    Ok(())
}

pub fn read_address<R: Read>(source: &mut R, width: usize) -> Result<u32> {
    Ok(match width {
        1 => u32::from(source.read_u8()?),
        2 => u32::from(source.read_u16::<BigEndian>()?),
        3 => source.read_u24::<BigEndian>()?,
        _ => {
            return Err(MakedictError::InvalidFormat(format!(
                "Invalid address width: {}",
                width
            )))
        }
    })
}

/// Group flag bits announcing the width of the children address.
pub fn group_address_flags(width: usize) -> Result<u8> {
    match width {
        0 => Ok(FLAG_GROUP_ADDRESS_TYPE_NOADDRESS),
        1 => Ok(FLAG_GROUP_ADDRESS_TYPE_ONEBYTE),
        2 => Ok(FLAG_GROUP_ADDRESS_TYPE_TWOBYTES),
        3 => Ok(FLAG_GROUP_ADDRESS_TYPE_THREEBYTES),
        _ => Err(MakedictError::LayoutInvariant(format!(
            "Node with a strange address width {}",
            width
        ))),
    }
}

pub fn group_address_width(flags: u8) -> usize {
    match flags & MASK_GROUP_ADDRESS_TYPE {
        FLAG_GROUP_ADDRESS_TYPE_ONEBYTE => 1,
        FLAG_GROUP_ADDRESS_TYPE_TWOBYTES => 2,
        FLAG_GROUP_ADDRESS_TYPE_THREEBYTES => 3,
        _ => 0,
    }
}

/// Builds the flags byte of an attribute record.
///
/// `frequency` is masked to its 4 bits.
pub fn attribute_flags(more: bool, offset: i64, frequency: u8) -> Result<u8> {
    let mut flags = if more { FLAG_ATTRIBUTE_HAS_NEXT } else { 0 };
    if offset < 0 {
        flags |= FLAG_ATTRIBUTE_OFFSET_NEGATIVE;
    }
    flags |= match address_width(offset)? {
        1 => FLAG_ATTRIBUTE_ADDRESS_TYPE_ONEBYTE,
        2 => FLAG_ATTRIBUTE_ADDRESS_TYPE_TWOBYTES,
        _ => FLAG_ATTRIBUTE_ADDRESS_TYPE_THREEBYTES,
    };
    Ok(flags | (frequency & FLAG_ATTRIBUTE_FREQUENCY))
}

/// Width announced by attribute flags. Zero means the record is malformed.
pub fn attribute_address_width(flags: u8) -> usize {
    match flags & MASK_ATTRIBUTE_ADDRESS_TYPE {
        FLAG_ATTRIBUTE_ADDRESS_TYPE_ONEBYTE => 1,
        FLAG_ATTRIBUTE_ADDRESS_TYPE_TWOBYTES => 2,
        FLAG_ATTRIBUTE_ADDRESS_TYPE_THREEBYTES => 3,
        _ => 0,
    }
}
