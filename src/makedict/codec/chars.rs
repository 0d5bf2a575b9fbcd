//! Character encoding for group runs.
//!
//! Char format is:
//! - first byte in `0x20..=0xFF`: the byte is the ISO-8859-1 code point itself
//! - first byte `0x1F`: run terminator
//! - otherwise: `first << 16 | next << 8 | next`
//!
//! Unicode stops at `0x10FFFF`, so a real 3-byte character never starts
//! with `0x1F`. Control characters below `0x20` take 3 bytes.

use std::io::{Read, Write};

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};

use crate::makedict::format::{GROUP_CHARACTERS_TERMINATOR, GROUP_TERMINATOR_SIZE};
use crate::makedict::types::error::{MakedictError, Result};

const MINIMAL_ONE_BYTE_CHARACTER_VALUE: u32 = 0x20;
const MAXIMAL_ONE_BYTE_CHARACTER_VALUE: u32 = 0xFF;

/// Whether this character is stored on a single byte.
pub fn fits_on_one_byte(character: char) -> bool {
    let code = character as u32;
    (MINIMAL_ONE_BYTE_CHARACTER_VALUE..=MAXIMAL_ONE_BYTE_CHARACTER_VALUE).contains(&code)
}

/// Size of a character in encoded form, either 1 or 3 bytes.
pub fn char_size(character: char) -> usize {
    if fits_on_one_byte(character) {
        1
    } else {
        3
    }
}

pub fn char_array_size(chars: &[char]) -> usize {
    chars.iter().map(|&c| char_size(c)).sum()
}

/// Size of a group's character run, including the terminator when the run
/// holds more than one character.
pub fn group_characters_size(chars: &[char]) -> usize {
    let size = char_array_size(chars);
    if chars.len() > 1 {
        size + GROUP_TERMINATOR_SIZE
    } else {
        size
    }
}

/// Writes a character run without its terminator.
pub fn write_char_array<W: Write>(dest: &mut W, chars: &[char]) -> Result<()> {
    for &character in chars {
        if fits_on_one_byte(character) {
            dest.write_u8(character as u32 as u8)?;
        } else {
            dest.write_u24::<BigEndian>(character as u32)?;
        }
    }
    Ok(())
}

/// Reads one encoded character.
///
/// Returns `Ok(None)` when the terminator byte is found.
pub fn read_char<R: Read>(source: &mut R) -> Result<Option<char>> {
    let first = source.read_u8()?;
    if first == GROUP_CHARACTERS_TERMINATOR {
        return Ok(None);
    }
    let code = if u32::from(first) >= MINIMAL_ONE_BYTE_CHARACTER_VALUE {
        u32::from(first)
    } else {
        (u32::from(first) << 16) | u32::from(source.read_u16::<BigEndian>()?)
    };
    char::from_u32(code)
        .map(Some)
        .ok_or_else(|| MakedictError::InvalidFormat(format!("Invalid code point: {:#x}", code)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(chars: &[char]) -> Vec<u8> {
        let mut out = Vec::new();
        write_char_array(&mut out, chars).unwrap();
        out
    }

    #[test]
    fn latin1_range_is_one_byte() {
        assert_eq!(encode(&[' ']), vec![0x20]);
        assert_eq!(encode(&['a']), vec![0x61]);
        assert_eq!(encode(&['\u{FF}']), vec![0xFF]);
        assert_eq!(char_size('é'), 1);
    }

    #[test]
    fn everything_else_is_three_bytes() {
        assert_eq!(encode(&['\u{1F}']), vec![0x00, 0x00, 0x1F]);
        assert_eq!(encode(&['\n']), vec![0x00, 0x00, 0x0A]);
        assert_eq!(encode(&['\u{100}']), vec![0x00, 0x01, 0x00]);
        assert_eq!(encode(&['中']), vec![0x00, 0x4E, 0x2D]);
        assert_eq!(encode(&['\u{10FFFF}']), vec![0x10, 0xFF, 0xFF]);
    }

    #[test]
    fn terminator_never_leads_a_character() {
        for c in ['\0', '\u{1F}', '\u{1F00}', '\u{FFFF}', '\u{1F600}', '\u{10FFFF}'] {
            let bytes = encode(&[c]);
            assert_ne!(bytes[0], GROUP_CHARACTERS_TERMINATOR, "{:?}", c);
        }
    }

    #[test]
    fn reads_back_until_terminator() {
        let mut bytes = encode(&['h', '中', '\u{1F}', 'ÿ']);
        bytes.push(GROUP_CHARACTERS_TERMINATOR);
        let mut reader = bytes.as_slice();
        let mut chars = Vec::new();
        while let Some(c) = read_char(&mut reader).unwrap() {
            chars.push(c);
        }
        assert_eq!(chars, vec!['h', '中', '\u{1F}', 'ÿ']);
        assert!(reader.is_empty());
    }

    #[test]
    fn rejects_surrogates() {
        let bytes = [0x00u8, 0xD8, 0x00];
        assert!(matches!(
            read_char(&mut &bytes[..]),
            Err(MakedictError::InvalidFormat(_))
        ));
    }

    #[test]
    fn run_size_counts_terminator() {
        assert_eq!(group_characters_size(&['a']), 1);
        assert_eq!(group_characters_size(&['a', 'b']), 3);
        assert_eq!(group_characters_size(&['中', 'b']), 5);
    }
}
