//! The export builder: walks the entry table's bundle grammar and the
//! resident-name table, and produces a sorted, lookup-ready export table.

use crate::error::{Error, Result};
use crate::ne::header::Context;
use crate::pascal::read_pascal_str_with_u16;
use scroll::{Pread, LE};

#[cfg(not(feature = "std"))]
use alloc::{string::{String, ToString}, vec::Vec};

/// One exported entry point: its 1-based ordinal, the 0-based segment it
/// lives in (the on-disk bundle `type`/segment byte is 1-based; this is
/// that value minus one), its in-segment offset, and the name it was
/// resolved to in the resident-name table, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportEntry {
    pub ordinal: u16,
    pub segment: u16,
    pub offset: u16,
    pub name: Option<String>,
}

/// A bundle header: a count byte and a type byte. `count == 0` marks the
/// end of the entry table; any nonzero `segment_indicator` names either a
/// fixed segment (1..=0xFE) or a movable-entry bundle (0xFF). `0x00` is a
/// "skip" bundle of `count` unused ordinals.
struct BundleHeader {
    count: u8,
    segment_indicator: u8,
}

const BUNDLE_SKIP: u8 = 0x00;
const BUNDLE_MOVABLE: u8 = 0xFF;

/// Parses the entry table into one [`ExportEntry`] per occupied ordinal
/// slot (skip bundles consume ordinal numbers but produce no entry).
fn parse_entry_table(bytes: &[u8]) -> Result<Vec<ExportEntry>> {
    let mut entries = Vec::new();
    let mut offset = 0usize;
    let mut ordinal: u16 = 1;

    loop {
        if offset >= bytes.len() {
            break;
        }
        let header: BundleHeader = {
            let count: u8 = bytes
                .gread_with(&mut offset, LE)
                .map_err(|_| Error::Bounds("entry bundle count"))?;
            if count == 0 {
                break;
            }
            let segment_indicator: u8 = bytes
                .gread_with(&mut offset, LE)
                .map_err(|_| Error::Bounds("entry bundle indicator"))?;
            BundleHeader { count, segment_indicator }
        };

        match header.segment_indicator {
            BUNDLE_SKIP => {
                ordinal = ordinal
                    .checked_add(header.count as u16)
                    .ok_or(Error::Bounds("ordinal overflow in skip bundle"))?;
            }
            BUNDLE_MOVABLE => {
                for _ in 0..header.count {
                    let _flags: u8 = bytes
                        .gread_with(&mut offset, LE)
                        .map_err(|_| Error::Bounds("movable entry flags"))?;
                    let _int3f: u16 = bytes
                        .gread_with(&mut offset, LE)
                        .map_err(|_| Error::Bounds("movable entry int3f"))?;
                    let segment: u8 = bytes
                        .gread_with(&mut offset, LE)
                        .map_err(|_| Error::Bounds("movable entry segment"))?;
                    let seg_offset: u16 = bytes
                        .gread_with(&mut offset, LE)
                        .map_err(|_| Error::Bounds("movable entry offset"))?;
                    entries.push(ExportEntry {
                        ordinal,
                        segment: (segment as u16).checked_sub(1).ok_or(Error::BadSegment(0))?,
                        offset: seg_offset,
                        name: None,
                    });
                    ordinal = ordinal.checked_add(1).ok_or(Error::Bounds("ordinal overflow"))?;
                }
            }
            fixed_segment => {
                for _ in 0..header.count {
                    let _flags: u8 = bytes
                        .gread_with(&mut offset, LE)
                        .map_err(|_| Error::Bounds("fixed entry flags"))?;
                    let seg_offset: u16 = bytes
                        .gread_with(&mut offset, LE)
                        .map_err(|_| Error::Bounds("fixed entry offset"))?;
                    entries.push(ExportEntry {
                        ordinal,
                        segment: fixed_segment as u16 - 1,
                        offset: seg_offset,
                        name: None,
                    });
                    ordinal = ordinal.checked_add(1).ok_or(Error::Bounds("ordinal overflow"))?;
                }
            }
        }
    }
    Ok(entries)
}

/// Walks the resident-name table, attaching each name to the
/// already-parsed entry with a matching ordinal. The first entry in the
/// resident-name table (the module's own name, ordinal 0) is skipped.
fn attach_names(entries: &mut [ExportEntry], resident_names: &[u8]) -> Result<()> {
    let mut offset = 0usize;
    let mut first = true;
    loop {
        if offset >= resident_names.len() {
            break;
        }
        let (name, ordinal) = read_pascal_str_with_u16(resident_names, &mut offset)?;
        if name.is_empty() {
            break;
        }
        if first {
            first = false;
            continue;
        }
        if let Some(entry) = entries.iter_mut().find(|e| e.ordinal == ordinal) {
            entry.name = Some(name.to_string());
        }
    }
    Ok(())
}

/// A module's full export surface: every occupied entry-table ordinal,
/// sorted by ordinal, with resident names attached where present.
#[derive(Debug, Clone, Default)]
pub struct ExportTable {
    entries: Vec<ExportEntry>,
}

impl ExportTable {
    /// Builds the export table from an already-parsed [`Context`] and the
    /// image it was parsed from.
    pub fn build(ctx: &Context, image: &[u8]) -> Result<Self> {
        let entry_bytes = ctx.entry_table.slice(image)?;
        let mut entries = parse_entry_table(entry_bytes)?;

        let resident_names = &image[ctx.resident_name_table.offset..];
        attach_names(&mut entries, resident_names)?;

        entries.sort_by_key(|e| e.ordinal);
        Ok(ExportTable { entries })
    }

    pub fn by_ordinal(&self, ordinal: u16) -> Option<&ExportEntry> {
        self.entries
            .binary_search_by_key(&ordinal, |e| e.ordinal)
            .ok()
            .map(|i| &self.entries[i])
    }

    pub fn by_name(&self, name: &str) -> Option<&ExportEntry> {
        self.entries.iter().find(|e| e.name.as_deref() == Some(name))
    }

    pub fn iter(&self) -> impl Iterator<Item = &ExportEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
