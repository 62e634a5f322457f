//! The stub table: an append-only log of placeholder entries registered
//! for imports that could not be resolved at load time. A later
//! `replace` marks an entry resolved without invalidating any index a
//! caller may have cached; nothing is ever physically deleted.

use crate::error::{Error, Result};

/// One stub slot, keyed by `(module, ordinal)`. `api` carries the
/// imported name when the relocation was by-name rather than by-ordinal;
/// `behavior` and `milestone` are free-form notes a caller can attach
/// when registering (commonly empty). `removed` is set by
/// [`StubTable::replace`] once the real target is known.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StubEntry {
    pub module: String,
    pub api: Option<String>,
    pub ordinal: u16,
    pub behavior: String,
    pub milestone: String,
    pub removed: bool,
}

/// Append-only stub registry, capacity-bounded and keyed by `(module,
/// ordinal)`.
#[derive(Debug)]
pub struct StubTable {
    entries: Vec<StubEntry>,
    capacity: usize,
}

impl StubTable {
    pub fn new() -> Self {
        StubTable::with_capacity(usize::MAX)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        StubTable { entries: Vec::new(), capacity }
    }

    /// Registers a stub for `(module, ordinal)`. If a matching entry
    /// already exists, this is a no-op (no duplicate is appended).
    /// Fails with [`Error::Capacity`] if the table is already full.
    pub fn register(
        &mut self,
        module: &str,
        api: Option<&str>,
        ordinal: u16,
        behavior: &str,
        milestone: &str,
    ) -> Result<()> {
        if self
            .entries
            .iter()
            .any(|e| e.module == module && e.ordinal == ordinal)
        {
            return Ok(());
        }
        if self.entries.len() >= self.capacity {
            return Err(Error::Capacity("stub table"));
        }
        self.entries.push(StubEntry {
            module: module.to_string(),
            api: api.map(str::to_string),
            ordinal,
            behavior: behavior.to_string(),
            milestone: milestone.to_string(),
            removed: false,
        });
        Ok(())
    }

    /// Marks the first matching, not-yet-removed `(module, ordinal)`
    /// entry as removed, without deleting it. `Error::Unresolved` if no
    /// such entry exists.
    pub fn replace(&mut self, module: &str, ordinal: u16) -> Result<()> {
        let entry = self
            .entries
            .iter_mut()
            .find(|e| e.module == module && e.ordinal == ordinal && !e.removed)
            .ok_or(Error::Unresolved)?;
        entry.removed = true;
        Ok(())
    }

    /// First matching entry regardless of `removed` state.
    pub fn find_by_ordinal(&self, module: &str, ordinal: u16) -> Option<&StubEntry> {
        self.entries.iter().find(|e| e.module == module && e.ordinal == ordinal)
    }

    /// First matching entry regardless of `removed` state. An empty
    /// `name` never matches.
    pub fn find_by_name(&self, module: &str, name: &str) -> Option<&StubEntry> {
        if name.is_empty() {
            return None;
        }
        self.entries
            .iter()
            .find(|e| e.module == module && e.api.as_deref() == Some(name))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for StubTable {
    fn default() -> Self {
        StubTable::new()
    }
}
