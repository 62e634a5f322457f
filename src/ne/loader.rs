//! Pipeline glue: assembles the parser, segment loader, relocation
//! engine, and export/import resolution into one end-to-end load.
//!
//! [`LoadedModule::load`] stitches header, segments, and exports into one
//! struct the way a format's top-level `parse` entry point usually does;
//! [`LoadedModule::relocate`] is kept as a separate step since it needs a
//! resolver only the embedder's module registry can supply.

use crate::error::Result;
use crate::ne::export::ExportTable;
use crate::ne::header::Context;
use crate::ne::import::{ImportTable, ModuleLookup, ModuleRefResolver};
use crate::ne::reloc::{self, ImportResolver, ImportSelector};
use crate::ne::segment::{self, LoadedSegment};
use crate::stub_table::StubTable;

#[cfg(feature = "log")]
use log::debug;

/// A fully parsed and loaded NE module: segments materialized into owned
/// buffers and the export surface built, but relocations not yet applied
/// (that needs a resolver able to answer cross-module imports, which only
/// the embedder's module registry can provide).
pub struct LoadedModule {
    pub ctx: Context,
    pub segments: Vec<LoadedSegment>,
    pub exports: ExportTable,
}

impl LoadedModule {
    pub fn load(image: &[u8]) -> Result<Self> {
        let ctx = Context::parse_buffer(image)?;
        let segments = segment::load_segments(&ctx, image)?;
        segment::validate_entry_point(&ctx, &segments)?;
        let exports = ExportTable::build(&ctx, image)?;
        #[cfg(feature = "log")]
        debug!(
            "loaded module: {} segments, {} exports",
            segments.len(),
            exports.len()
        );
        Ok(LoadedModule { ctx, segments, exports })
    }

    /// Applies every segment's relocations, using `lookup` to resolve
    /// cross-module imports and `stubs` to record any that can't be
    /// resolved yet (scenario: a dependency module hasn't been loaded).
    /// Stub-backed sites are patched to `(0, 0)` and left queued in
    /// `stubs` for [`StubTable::replace`] once the real target is known.
    pub fn relocate(&mut self, image: &[u8], lookup: &mut impl ModuleLookup, stubs: &mut StubTable) -> Result<()> {
        let imports = ImportTable::new(&self.ctx, image)?;
        let imported_names = self.ctx.imported_names_table.slice(image).unwrap_or(&[]);

        for (i, descriptor) in self.ctx.segments.iter().enumerate() {
            let Some((file_offset, data_length)) = reloc::relocation_block_location(&self.ctx, descriptor) else {
                continue;
            };
            let records = reloc::parse_segment_relocations(image, file_offset, data_length)?;
            if records.is_empty() {
                continue;
            }

            let inner = ModuleRefResolver::new(
                ImportTable::new(&self.ctx, image)?,
                lookup,
            );
            let mut resolver = StubFallbackResolver {
                inner,
                imports: &imports,
                stubs,
            };
            reloc::apply(&mut self.segments[i].buffer, &records, imported_names, &mut resolver)?;
        }
        Ok(())
    }
}

/// Wraps an [`ImportResolver`] so an unresolved import registers a stub
/// and proceeds with a `(0, 0)` placeholder, instead of failing the whole
/// relocation pass.
struct StubFallbackResolver<'a, L> {
    inner: ModuleRefResolver<'a, L>,
    imports: &'a ImportTable<'a>,
    stubs: &'a mut StubTable,
}

impl<'a, L: ModuleLookup> ImportResolver for StubFallbackResolver<'a, L> {
    fn resolve(&mut self, module_ref: u16, selector: ImportSelector, imported_names: &[u8]) -> Option<(u16, u16)> {
        if let Some(target) = self.inner.resolve(module_ref, selector, imported_names) {
            return Some(target);
        }
        let module = self.imports.module_name(module_ref).ok()?;
        let (ordinal, api) = match selector {
            ImportSelector::Ordinal(ordinal) => (ordinal, None),
            ImportSelector::NameOffset(name_offset) => (0, Some(self.imports.imported_name(name_offset).ok()?)),
        };
        self.stubs.register(module, api, ordinal, "unresolved import", "").ok()?;
        #[cfg(feature = "log")]
        debug!("unresolved import for module {module} ordinal {ordinal}: registered stub");
        Some((0, 0))
    }
}
