//! The segment loader: lays each segment descriptor out as an owned,
//! zero-filled buffer and validates the entry point against it.

use crate::error::{Error, Result};
use crate::ne::header::{Context, SegmentDescriptor};

#[cfg(not(feature = "std"))]
use alloc::vec::Vec;

#[cfg(feature = "log")]
use log::debug;

/// One segment's runtime image: an owned buffer of at least
/// `segment.min_alloc()` bytes, the low `data_length` bytes copied from the
/// file, the remainder zero-filled.
#[derive(Debug, Clone)]
pub struct LoadedSegment {
    pub descriptor: SegmentDescriptor,
    pub buffer: Vec<u8>,
    /// Number of bytes at the start of `buffer` that came from the file.
    pub data_length: usize,
}

impl LoadedSegment {
    pub fn alloc_size(&self) -> usize {
        self.buffer.len()
    }
}

/// Loads every segment described by `ctx` from `image`, in order.
///
/// On any error no partially-built segments are returned to the caller:
/// the in-progress `Vec<LoadedSegment>` is simply dropped, which is the
/// safe-Rust equivalent of the rollback the original design calls for.
pub fn load_segments(ctx: &Context, image: &[u8]) -> Result<Vec<LoadedSegment>> {
    let mut segments = Vec::with_capacity(ctx.segments.len());
    for (i, descriptor) in ctx.segments.iter().enumerate() {
        let data_len = descriptor.data_length();
        let min_alloc = descriptor.min_alloc();
        let alloc = data_len.max(min_alloc);

        let mut buffer = Vec::new();
        buffer
            .try_reserve_exact(alloc)
            .map_err(|_| Error::Alloc)?;
        buffer.resize(alloc, 0);

        let mut data_length = 0;
        if let Some(file_offset) = descriptor.file_offset(ctx.header.alignment_shift as u32) {
            let end = file_offset
                .checked_add(data_len)
                .ok_or(Error::Bounds("segment file range"))?;
            if end > image.len() {
                return Err(Error::Bounds("segment file range exceeds image"));
            }
            buffer[..data_len].copy_from_slice(&image[file_offset..end]);
            data_length = data_len;
        }

        #[cfg(feature = "log")]
        debug!(
            "segment {}: alloc {} bytes, {} file-backed, flags {:#06x}",
            i, alloc, data_length, descriptor.flags
        );

        segments.push(LoadedSegment {
            descriptor: *descriptor,
            buffer,
            data_length,
        });
    }
    Ok(segments)
}

/// Validates the entry point recorded in the NE header against the loaded
/// segment set. `initial_cs == 0` means "no entry point" (a DLL) and is
/// always valid.
pub fn validate_entry_point(ctx: &Context, segments: &[LoadedSegment]) -> Result<()> {
    if ctx.header.initial_cs == 0 {
        return Ok(());
    }
    let index = ctx.header.initial_cs as usize - 1;
    let segment = segments
        .get(index)
        .ok_or(Error::BadSegment(ctx.header.initial_cs))?;
    if (ctx.header.initial_ip as usize) >= segment.alloc_size() {
        return Err(Error::Bounds("entry point IP exceeds segment allocation"));
    }
    Ok(())
}
