//! A length-prefixed ("Pascal") string reader.
//!
//! NE name tables (the resident-name table, the nonresident-name table, and
//! the imported-names table) encode every string as a single length byte
//! followed by that many bytes of ASCII, with no terminator. This is the
//! one reader every table walk in [`crate::ne::export`] and
//! [`crate::ne::import`] shares.

use crate::error::{Error, Result};
use scroll::{Pread, LE};

/// Reads the Pascal string at `*offset` in `bytes`, advancing `*offset`
/// past it (the length byte plus its contents).
///
/// Returns `Ok("")` for a zero-length string, which callers use as a table
/// terminator (the resident-name table ends at the first empty name).
pub fn read_pascal_str<'a>(bytes: &'a [u8], offset: &mut usize) -> Result<&'a str> {
    let len: u8 = bytes
        .gread_with(offset, LE)
        .map_err(|_| Error::Bounds("pascal string length"))?;
    let len = len as usize;
    if len == 0 {
        return Ok("");
    }
    let start = *offset;
    let end = start
        .checked_add(len)
        .ok_or(Error::Bounds("pascal string overflow"))?;
    if end > bytes.len() {
        return Err(Error::Bounds("pascal string body"));
    }
    let s = core::str::from_utf8(&bytes[start..end])
        .map_err(|_| Error::Malformed("pascal string is not valid UTF-8".into()))?;
    *offset = end;
    Ok(s)
}

/// Reads a Pascal string followed by a little-endian `u16`, the shape used
/// by every entry in the resident-name and nonresident-name tables (name,
/// ordinal).
pub fn read_pascal_str_with_u16<'a>(
    bytes: &'a [u8],
    offset: &mut usize,
) -> Result<(&'a str, u16)> {
    let name = read_pascal_str(bytes, offset)?;
    let ordinal = bytes
        .gread_with(offset, LE)
        .map_err(|_| Error::Bounds("name table ordinal"))?;
    Ok((name, ordinal))
}
