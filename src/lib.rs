//! # dlltree
//!
//! DLL dependency audit for redistributable Windows binary bundles.
//!
//! Every DLL and EXE in a directory is inspected with `dumpbin`, and its
//! imports are classified as:
//!
//! - **bundled**: another file in the same directory
//! - **system**: shipped with Windows (known from the Windows SDK)
//! - **compiler-runtime**: part of the MSVC runtime redistributable
//! - **EXTERNAL**: none of the above, usually a packaging problem
//!
//! Files that no other file depends on are the roots of the resulting
//! dependency forest. Imports of the `LoadLibrary` family are reported too,
//! since they hint at dependencies that never show up as imports.

pub mod core;
pub mod error;
pub mod formatters;
pub mod parsers;
pub mod reference;
pub mod tools;

pub use error::{AuditError, Result};
