//! End-to-end coverage: build a complete synthetic NE image in memory and
//! drive it through parsing, segment loading, export resolution, and
//! relocation, including the stub-fallback path for an import that can't
//! be resolved from a single module in isolation.

use newexe::module_table::ModuleTable;
use newexe::ne::header::Context;
use newexe::ne::import::ModuleLookup;
use newexe::ne::{ExportTable, LoadedModule};
use newexe::stub_table::StubTable;

/// A tiny two-export, one-import module:
/// - one fixed-segment export at ordinal 1, resident-named "Entry"
/// - one relocation importing ordinal 7 from module ref 1 ("HOSTLIB")
fn build_image() -> Vec<u8> {
    let ne_offset = 0x40usize;
    let header_end = ne_offset + 64;
    let seg_table_off = header_end;
    let entry_table_off = seg_table_off + 8;
    // entry table: one fixed bundle (count 1, segment 1), terminator
    let entry_table = {
        let mut b = Vec::new();
        b.push(1);
        b.push(1);
        b.push(0x01);
        b.extend_from_slice(&0x0000u16.to_le_bytes());
        b.push(0);
        b
    };
    let resident_name_off = entry_table_off + entry_table.len();
    let resident_names = {
        let mut b = Vec::new();
        b.push(b"HOSTMOD".len() as u8);
        b.extend_from_slice(b"HOSTMOD");
        b.extend_from_slice(&0u16.to_le_bytes());
        b.push(b"Entry".len() as u8);
        b.extend_from_slice(b"Entry");
        b.extend_from_slice(&1u16.to_le_bytes());
        b.push(0);
        b
    };
    let module_ref_off = resident_name_off + resident_names.len();
    let module_ref_table = 0u16.to_le_bytes().to_vec(); // one entry -> imported_names[0]
    let imported_names_off = module_ref_off + module_ref_table.len();
    let imported_names = {
        let mut b = Vec::new();
        b.push(b"HOSTLIB".len() as u8);
        b.extend_from_slice(b"HOSTLIB");
        b
    };

    let header_tail_len = imported_names_off + imported_names.len();
    let align_shift = 4u32;
    let data_sector = (header_tail_len as u32).div_ceil(1 << align_shift);
    let data_off = (data_sector << align_shift) as usize;
    let data_len = 16usize;
    let reloc_off = data_off + data_len;

    let total_len = reloc_off + 2 + 8;
    let mut bytes = vec![0u8; total_len];

    bytes[0] = b'M';
    bytes[1] = b'Z';
    bytes[0x3C..0x40].copy_from_slice(&(ne_offset as u32).to_le_bytes());

    bytes[ne_offset] = b'N';
    bytes[ne_offset + 1] = b'E';
    bytes[ne_offset + 0x04..ne_offset + 0x06].copy_from_slice(&((entry_table_off - ne_offset) as u16).to_le_bytes());
    bytes[ne_offset + 0x06..ne_offset + 0x08].copy_from_slice(&(entry_table.len() as u16).to_le_bytes());
    bytes[ne_offset + 0x14..ne_offset + 0x16].copy_from_slice(&0u16.to_le_bytes()); // initial_ip
    bytes[ne_offset + 0x16..ne_offset + 0x18].copy_from_slice(&1u16.to_le_bytes()); // initial_cs
    bytes[ne_offset + 0x1C..ne_offset + 0x1E].copy_from_slice(&1u16.to_le_bytes()); // segment_count
    bytes[ne_offset + 0x1E..ne_offset + 0x20].copy_from_slice(&1u16.to_le_bytes()); // module_ref_count
    bytes[ne_offset + 0x22..ne_offset + 0x24].copy_from_slice(&((seg_table_off - ne_offset) as u16).to_le_bytes());
    bytes[ne_offset + 0x26..ne_offset + 0x28].copy_from_slice(&((resident_name_off - ne_offset) as u16).to_le_bytes());
    bytes[ne_offset + 0x28..ne_offset + 0x2A].copy_from_slice(&((module_ref_off - ne_offset) as u16).to_le_bytes());
    bytes[ne_offset + 0x2A..ne_offset + 0x2C].copy_from_slice(&((imported_names_off - ne_offset) as u16).to_le_bytes());
    bytes[ne_offset + 0x32..ne_offset + 0x34].copy_from_slice(&(align_shift as u16).to_le_bytes());

    bytes[seg_table_off..seg_table_off + 2].copy_from_slice(&(data_sector as u16).to_le_bytes());
    bytes[seg_table_off + 2..seg_table_off + 4].copy_from_slice(&(data_len as u16).to_le_bytes());
    bytes[seg_table_off + 4..seg_table_off + 6].copy_from_slice(&0x0100u16.to_le_bytes()); // HAS_RELOC
    bytes[seg_table_off + 6..seg_table_off + 8].copy_from_slice(&(data_len as u16).to_le_bytes());

    bytes[entry_table_off..entry_table_off + entry_table.len()].copy_from_slice(&entry_table);
    bytes[resident_name_off..resident_name_off + resident_names.len()].copy_from_slice(&resident_names);
    bytes[module_ref_off..module_ref_off + module_ref_table.len()].copy_from_slice(&module_ref_table);
    bytes[imported_names_off..imported_names_off + imported_names.len()].copy_from_slice(&imported_names);

    // Terminate the (single-entry) relocation chain at the patch site itself.
    bytes[data_off + 2..data_off + 4].copy_from_slice(&0xFFFFu16.to_le_bytes());

    bytes[reloc_off..reloc_off + 2].copy_from_slice(&1u16.to_le_bytes());
    bytes[reloc_off + 2] = 5; // OFF16
    bytes[reloc_off + 3] = 1; // IMP_ORD
    bytes[reloc_off + 4..reloc_off + 6].copy_from_slice(&2u16.to_le_bytes()); // target_offset
    bytes[reloc_off + 6..reloc_off + 8].copy_from_slice(&1u16.to_le_bytes()); // module_ref 1
    bytes[reloc_off + 8..reloc_off + 10].copy_from_slice(&7u16.to_le_bytes()); // ordinal 7

    bytes
}

struct NoHostLookup;
impl ModuleLookup for NoHostLookup {
    fn lookup_ordinal(&mut self, _: &str, _: u16) -> Option<(u16, u16)> {
        None
    }
    fn lookup_name(&mut self, _: &str, _: &str) -> Option<(u16, u16)> {
        None
    }
}

#[test]
fn parses_and_exposes_exports() {
    let image = build_image();
    let ctx = Context::parse_buffer(&image).unwrap();
    let exports = ExportTable::build(&ctx, &image).unwrap();
    assert_eq!(exports.len(), 1);
    let entry = exports.by_ordinal(1).unwrap();
    assert_eq!(entry.segment, 0);
    assert_eq!(entry.name.as_deref(), Some("Entry"));
    assert_eq!(exports.by_name("Entry").unwrap().ordinal, 1);
}

#[test]
fn load_and_relocate_falls_back_to_stub_when_import_unresolved() {
    let image = build_image();
    let mut module = LoadedModule::load(&image).unwrap();
    assert_eq!(module.exports.len(), 1);

    let mut stubs = StubTable::new();
    let mut lookup = NoHostLookup;
    module.relocate(&image, &mut lookup, &mut stubs).unwrap();

    assert_eq!(stubs.len(), 1);
    let stub = stubs.find_by_ordinal("HOSTLIB", 7).unwrap();
    assert!(!stub.removed);

    stubs.replace("HOSTLIB", 7).unwrap();
    let patched = stubs.find_by_ordinal("HOSTLIB", 7).unwrap();
    assert!(patched.removed);
}

#[test]
fn module_table_tracks_the_loaded_module_by_name() {
    let image = build_image();
    let module = LoadedModule::load(&image).unwrap();

    let mut modules = ModuleTable::new(4);
    let handle = modules.load("HOSTMOD", module).unwrap();
    assert_eq!(modules.refcount(handle).unwrap(), 1);
    assert_eq!(modules.find("HOSTMOD"), Some(handle));
    assert_eq!(modules.module(handle).unwrap().exports.len(), 1);
    modules.addref(handle).unwrap();
    assert_eq!(modules.unload(handle).unwrap(), false);
    assert_eq!(modules.unload(handle).unwrap(), true);
}
