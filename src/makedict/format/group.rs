//! Decoding of a single character group from the node stream.

use std::io::Read;

use byteorder::ReadBytesExt;
use log::trace;

use super::{
    FLAG_ATTRIBUTE_FREQUENCY, FLAG_ATTRIBUTE_HAS_NEXT, FLAG_ATTRIBUTE_OFFSET_NEGATIVE,
    FLAG_HAS_BIGRAMS, FLAG_HAS_MULTIPLE_CHARS, FLAG_IS_TERMINAL, GROUP_ATTRIBUTE_FLAGS_SIZE,
    GROUP_FLAGS_SIZE, GROUP_FREQUENCY_SIZE, GROUP_TERMINATOR_SIZE,
};
use crate::makedict::codec::address::{attribute_address_width, group_address_width, read_address};
use crate::makedict::codec::chars::{char_size, read_char};
use crate::makedict::types::error::{MakedictError, Result};

/// An associated-word record whose target word is not resolved yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingAttribute {
    pub frequency: u8,
    /// Address of the target group, relative to the node stream.
    pub address: usize,
}

/// Everything stored in one group, with addresses made absolute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupInfo {
    pub original_address: usize,
    /// Address of the first byte after this group.
    pub end_address: usize,
    pub flags: u8,
    pub chars: Vec<char>,
    pub frequency: Option<u8>,
    pub children_address: Option<usize>,
    pub bigrams: Vec<PendingAttribute>,
}

/// Reads the group starting at `address` from `source`, which must be
/// positioned on its flags byte.
pub fn read_group<R: Read>(source: &mut R, address: usize) -> Result<GroupInfo> {
    let mut pointer = address;
    let flags = source.read_u8()?;
    pointer += GROUP_FLAGS_SIZE;

    let mut chars = Vec::new();
    if flags & FLAG_HAS_MULTIPLE_CHARS != 0 {
        while let Some(character) = read_char(source)? {
            pointer += char_size(character);
            chars.push(character);
        }
        pointer += GROUP_TERMINATOR_SIZE;
        if chars.is_empty() {
            return Err(MakedictError::InvalidFormat(format!(
                "Empty character run in group at {}",
                address
            )));
        }
    } else {
        let character = read_char(source)?.ok_or_else(|| {
            MakedictError::InvalidFormat(format!("Terminator as single character at {}", address))
        })?;
        pointer += char_size(character);
        chars.push(character);
    }

    let frequency = if flags & FLAG_IS_TERMINAL != 0 {
        pointer += GROUP_FREQUENCY_SIZE;
        Some(source.read_u8()?)
    } else {
        None
    };

    // Children offsets count from here, before the address bytes.
    let width = group_address_width(flags);
    let children_address = if width > 0 {
        let offset = read_address(source, width)? as usize;
        let children = pointer + offset;
        pointer += width;
        Some(children)
    } else {
        None
    };

    let mut bigrams = Vec::new();
    if flags & FLAG_HAS_BIGRAMS != 0 {
        loop {
            let attribute_flags = source.read_u8()?;
            pointer += GROUP_ATTRIBUTE_FLAGS_SIZE;
            let width = attribute_address_width(attribute_flags);
            if width == 0 {
                return Err(MakedictError::InvalidFormat(format!(
                    "Attribute with no address in group at {}",
                    address
                )));
            }
            let offset = i64::from(read_address(source, width)?);
            let target = if attribute_flags & FLAG_ATTRIBUTE_OFFSET_NEGATIVE != 0 {
                pointer as i64 - offset
            } else {
                pointer as i64 + offset
            };
            if target < 0 {
                return Err(MakedictError::InvalidFormat(format!(
                    "Attribute in group at {} points before the node stream",
                    address
                )));
            }
            pointer += width;
            bigrams.push(PendingAttribute {
                frequency: attribute_flags & FLAG_ATTRIBUTE_FREQUENCY,
                address: target as usize,
            });
            if attribute_flags & FLAG_ATTRIBUTE_HAS_NEXT == 0 {
                break;
            }
        }
    }

    trace!(
        "Group at {}: {:?} freq={:?} children={:?} bigrams={}",
        address,
        chars.iter().collect::<String>(),
        frequency,
        children_address,
        bigrams.len()
    );

    Ok(GroupInfo {
        original_address: address,
        end_address: pointer,
        flags,
        chars,
        frequency,
        children_address,
        bigrams,
    })
}
