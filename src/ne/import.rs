//! The import resolver: walks the module-reference table and the
//! imported-names table, and turns a relocation's `(module_ref, selector)`
//! pair into a concrete `(module_name, ordinal_or_name)` lookup.
//!
//! This module owns the table-walking; the actual cross-module lookup
//! (asking some other loaded module for its export) is left to a
//! caller-supplied [`ModuleLookup`], since that requires reaching outside
//! this image into whatever module registry the embedder maintains.

use crate::error::{Error, Result};
use crate::ne::header::Context;
use crate::ne::reloc::{ImportResolver, ImportSelector};
use crate::pascal::read_pascal_str;
use scroll::{Pread, LE};

/// Resolves an imported module's name and either ordinal or exported name
/// to a concrete `(segment, offset)`, the same 0-based shape
/// [`ImportResolver::resolve`] returns.
pub trait ModuleLookup {
    fn lookup_ordinal(&mut self, module_name: &str, ordinal: u16) -> Option<(u16, u16)>;
    fn lookup_name(&mut self, module_name: &str, name: &str) -> Option<(u16, u16)>;
}

/// A borrowed view over one image's module-reference table: `module_ref`
/// indices (1-based, as they appear in relocation records) to module
/// names, dereferenced through the imported-names table.
pub struct ImportTable<'a> {
    module_ref_table: &'a [u8],
    imported_names: &'a [u8],
}

impl<'a> ImportTable<'a> {
    pub fn new(ctx: &Context, image: &'a [u8]) -> Result<Self> {
        let module_ref_table = ctx.module_ref_table.slice(image)?;
        let imported_names = ctx.imported_names_table.slice(image).unwrap_or(&[]);
        Ok(ImportTable { module_ref_table, imported_names })
    }

    /// Looks up the module name for 1-based `module_ref`.
    pub fn module_name(&self, module_ref: u16) -> Result<&'a str> {
        if module_ref == 0 {
            return Err(Error::BadSegment(0));
        }
        let index = (module_ref as usize - 1) * 2;
        let name_offset: u16 = self
            .module_ref_table
            .pread_with(index, LE)
            .map_err(|_| Error::Bounds("module reference entry"))?;
        let mut offset = name_offset as usize;
        read_pascal_str(self.imported_names, &mut offset)
    }

    /// Reads the Pascal-encoded import name at `name_offset` within the
    /// imported-names table (used for `IMP_NAME` relocations).
    pub fn imported_name(&self, name_offset: u16) -> Result<&'a str> {
        let mut offset = name_offset as usize;
        read_pascal_str(self.imported_names, &mut offset)
    }
}

/// The concrete [`ImportResolver`] used by the loader: dereferences
/// `module_ref` through the image's own module-reference table, then
/// hands the module name and selector to a [`ModuleLookup`].
pub struct ModuleRefResolver<'a, L> {
    imports: ImportTable<'a>,
    lookup: &'a mut L,
}

impl<'a, L: ModuleLookup> ModuleRefResolver<'a, L> {
    pub fn new(imports: ImportTable<'a>, lookup: &'a mut L) -> Self {
        ModuleRefResolver { imports, lookup }
    }
}

impl<'a, L: ModuleLookup> ImportResolver for ModuleRefResolver<'a, L> {
    fn resolve(&mut self, module_ref: u16, selector: ImportSelector, _imported_names: &[u8]) -> Option<(u16, u16)> {
        let module_name = self.imports.module_name(module_ref).ok()?;
        match selector {
            ImportSelector::Ordinal(ordinal) => self.lookup.lookup_ordinal(module_name, ordinal),
            ImportSelector::NameOffset(name_offset) => {
                let name = self.imports.imported_name(name_offset).ok()?;
                self.lookup.lookup_name(module_name, name)
            }
        }
    }
}
