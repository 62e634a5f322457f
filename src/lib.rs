//! A parser, loader, and relocation engine for the 16-bit Windows NE
//! ("New Executable") format.
//!
//! [`ne::header::Context`] parses the MZ stub and NE header into typed,
//! bounds-checked table views; [`ne::segment`] materializes segment
//! descriptors into owned, zero-filled buffers; [`ne::reloc`] walks and
//! applies relocation chains against a resolver for imported references;
//! [`ne::export`] and [`ne::import`] build and dereference the
//! entry-table/name-table and module-reference/imported-names surfaces.
//! [`module_table`] and [`stub_table`] are the registries an embedder
//! uses to track loaded modules and defer unresolved imports.
//!
//! `no_std` is supported with the `alloc` feature; `std` (the default)
//! additionally enables reading images from disk and the `io::Error`
//! variant on [`error::Error`].

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(not(feature = "std"))]
extern crate alloc;

#[cfg(all(test, not(feature = "std")))]
extern crate std;

pub mod error;
pub mod ne;
pub mod pascal;

/// The module and stub registries are `std`-only: they're built on
/// `HashMap`, and exist for an embedder driving the loader end-to-end
/// rather than for the bounds-checked parsing core.
#[cfg(feature = "std")]
pub mod module_table;
#[cfg(feature = "std")]
pub mod stub_table;

pub use error::{Error, Result};
