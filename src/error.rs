//! The single error type shared by every subsystem in this crate.
//!
//! Every public operation returns [`Result`]. There is no logging or retry
//! inside the core itself; callers decide what a failure means.

use core::fmt;

#[cfg(feature = "std")]
use std::io;

#[cfg(not(feature = "std"))]
use alloc::string::{String, ToString};
#[cfg(feature = "std")]
use std::string::ToString;

/// Everything that can go wrong while parsing, loading, relocating, or
/// registering an NE module.
#[derive(Debug)]
pub enum Error {
    /// A required argument was null, empty, or otherwise missing.
    NullArg(&'static str),
    /// A heap allocation failed (e.g. reserving a segment buffer).
    Alloc,
    /// Reading or writing the underlying byte image failed.
    #[cfg(feature = "std")]
    Io(io::Error),
    /// A `scroll` read/write failed (truncated buffer, bad context, ...).
    Scroll(scroll::Error),
    /// A computed offset or length would step outside the input buffer
    /// or a segment's allocation.
    Bounds(&'static str),
    /// The byte at offset 0 is not the `MZ` DOS-stub signature.
    NotMz,
    /// The header pointed to by byte 0x3C is not an `NE` header.
    NotNe,
    /// A table offset/length in the NE header does not fit in the image.
    BadOffset(&'static str),
    /// The NE header itself is malformed (bad size, both MZ and NE magic
    /// present at offset 0, etc).
    BadHeader(&'static str),
    /// A relocation or export referenced a segment number out of range.
    BadSegment(u16),
    /// A handle did not name a live entry in a module or stub table.
    BadHandle(u16),
    /// An enumerant (relocation type) outside the supported set.
    BadFunction(u8),
    /// An address type outside the supported set.
    BadAddressType(u8),
    /// A fixed-size table (module table, stub table, dependency list) is full.
    Capacity(&'static str),
    /// An import could not be resolved against any loaded module's exports.
    Unresolved,
    /// A module cannot be unloaded while another module depends on it.
    InUse(u16),
    /// A catch-all for malformed data that doesn't fit a narrower kind.
    Malformed(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::NullArg(what) => write!(f, "missing required argument: {what}"),
            Error::Alloc => write!(f, "allocation failed"),
            #[cfg(feature = "std")]
            Error::Io(e) => write!(f, "IO error: {e}"),
            Error::Scroll(e) => write!(f, "decode error: {e}"),
            Error::Bounds(what) => write!(f, "out of bounds: {what}"),
            Error::NotMz => write!(f, "missing MZ signature at offset 0"),
            Error::NotNe => write!(f, "missing NE signature at the header offset"),
            Error::BadOffset(what) => write!(f, "table offset out of range: {what}"),
            Error::BadHeader(what) => write!(f, "malformed NE header: {what}"),
            Error::BadSegment(n) => write!(f, "invalid segment number: {n}"),
            Error::BadHandle(h) => write!(f, "invalid handle: {h:#06x}"),
            Error::BadFunction(n) => write!(f, "unsupported relocation type: {n:#x}"),
            Error::BadAddressType(n) => write!(f, "unsupported address type: {n:#x}"),
            Error::Capacity(what) => write!(f, "table is full: {what}"),
            Error::Unresolved => write!(f, "import could not be resolved"),
            Error::InUse(h) => write!(f, "module {h:#06x} is still in use"),
            Error::Malformed(msg) => write!(f, "malformed entity: {msg}"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            Error::Scroll(e) => Some(e),
            _ => None,
        }
    }
}

#[cfg(feature = "std")]
impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error::Io(err)
    }
}

impl From<scroll::Error> for Error {
    fn from(err: scroll::Error) -> Self {
        Error::Scroll(err)
    }
}

/// Maps any error to a stable, human-readable string.
///
/// This is the `strerror`-equivalent helper called for in the design: a
/// single place a driver can go to translate a failure into text, without
/// needing to match on [`Error`] itself.
pub fn strerror(err: &Error) -> String {
    err.to_string()
}

pub type Result<T> = core::result::Result<T, Error>;
