//! Dictionary file header parsing and writing.
//!
//! ```text
//! [2 bytes] Magic number 0x78B1 (big-endian u16)
//! [1 byte ] Format version
//! [2 bytes] Options (big-endian u16, reserved)
//! ```

use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use log::{debug, trace};

use super::MAGIC_NUMBER;
use crate::makedict::types::{
    error::{MakedictError, Result},
    models::{DictionaryHeader, DictionaryOptions, FormatVersion},
};

/// Parses the header from the beginning of a dictionary file.
///
/// # Parameters
/// * `source` - Reader positioned at the start of the file
///
/// # Returns
/// The parsed header; the reader is left on the first byte of the node stream.
pub fn parse<R: Read>(source: &mut R) -> Result<DictionaryHeader> {
    // Step 1: Magic number
    let magic = source.read_u16::<BigEndian>()?;
    trace!("Magic number: {:#06x}", magic);
    if magic != MAGIC_NUMBER {
        return Err(MakedictError::BadMagic {
            expected: MAGIC_NUMBER,
            found: magic,
        });
    }

    // Step 2: Version, rejected if newer than what we can read
    let version = FormatVersion::try_from(source.read_u8()?)?;

    // Step 3: Reserved options
    let options = DictionaryOptions::try_from(source.read_u16::<BigEndian>()?)?;

    debug!(
        "Header parsed: version={}, options={:#06x}",
        version.as_u8(),
        options.bits()
    );
    Ok(DictionaryHeader { version, options })
}

/// Writes the header for `options` with the current format version.
pub fn write<W: Write>(dest: &mut W, options: DictionaryOptions) -> Result<()> {
    dest.write_u16::<BigEndian>(MAGIC_NUMBER)?;
    dest.write_u8(FormatVersion::CURRENT.as_u8())?;
    dest.write_u16::<BigEndian>(options.bits())?;
    Ok(())
}

/// Checks whether a file starts with the dictionary magic number.
///
/// Any I/O failure (missing file, file shorter than two bytes) counts as "no".
pub fn is_binary_dictionary<P: AsRef<Path>>(path: P) -> bool {
    let sniff = || -> std::io::Result<u16> {
        let mut file = File::open(path.as_ref())?;
        file.read_u16::<BigEndian>()
    };
    matches!(sniff(), Ok(magic) if magic == MAGIC_NUMBER)
}
