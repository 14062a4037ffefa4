use std::path::{Path, PathBuf};

use super::DllName;
use crate::error::{AuditError, Result};
use crate::parsers::{DependentsParser, ImportsParser};
use crate::tools::{dump_and_parse, DumpTool};

/// Loader functions whose import marks a file as loading libraries at runtime.
pub const LOADER_SYMBOLS: &[&str] = &[
    "LoadLibraryA",
    "LoadLibraryW",
    "LoadLibraryExA",
    "LoadLibraryExW",
];

/// Names under which the loader functions are imported.
pub const LOADER_LIBRARIES: &[&str] = &["KERNEL32.dll", "KERNEL32"];

/// Everything the resolver needs to know about one binary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    pub path: PathBuf,
    pub name: DllName,
    pub dependencies: Vec<DllName>,
    pub delay_load_dependencies: Vec<DllName>,
    pub dynamic_loads: Vec<String>,
}

/// Inspects single binaries through a [`DumpTool`].
pub struct FileInspector<'a, T: DumpTool + ?Sized> {
    tool: &'a T,
    dependents_parser: DependentsParser,
    imports_parser: ImportsParser,
}

impl<'a, T: DumpTool + ?Sized> FileInspector<'a, T> {
    pub fn new(tool: &'a T) -> Self {
        Self {
            tool,
            dependents_parser: DependentsParser::new(),
            imports_parser: ImportsParser::new(),
        }
    }

    pub fn inspect(&self, path: &Path) -> Result<FileRecord> {
        let name = path
            .file_name()
            .and_then(|name| name.to_str())
            .map(DllName::new)
            .ok_or_else(|| {
                AuditError::Config(format!("not a usable file name: {}", path.display()))
            })?;

        let dependencies = dump_and_parse(self.tool, &self.dependents_parser, path)?;
        let dynamic_loads = self.dynamic_loads(path)?;

        Ok(FileRecord {
            path: path.to_path_buf(),
            name,
            dependencies: dependencies.ordinary,
            delay_load_dependencies: dependencies.delay_load,
            dynamic_loads,
        })
    }

    /// Loader API functions imported by `path`, first occurrence order, no
    /// duplicates.
    pub fn dynamic_loads(&self, path: &Path) -> Result<Vec<String>> {
        let imports = dump_and_parse(self.tool, &self.imports_parser, path)?;

        let mut calls: Vec<String> = Vec::new();
        for (_, symbol) in imports.find(LOADER_SYMBOLS, LOADER_LIBRARIES) {
            if !calls.contains(&symbol) {
                calls.push(symbol);
            }
        }
        Ok(calls)
    }
}
