use crate::core::DllName;
use crate::error::{AuditError, Result};

use super::common::{parse_dump, Section};
use super::{DumpMode, RawDump, ReportParser};

pub const IMPORT_LIST_HEADER: &str = "Section contains the following imports:";
pub const DELAY_IMPORT_LIST_HEADER: &str = "Section contains the following delay load imports:";

const DLL_NAME_INDENT: &str = "    ";
const SYMBOL_INDENT: &str = "     ";

/// Symbols imported by name from one library.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportedLibrary {
    pub name: DllName,
    pub symbols: Vec<String>,
}

/// Imported libraries in dump order. Library lookup ignores case, symbol
/// comparison does not.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportTable {
    libraries: Vec<ImportedLibrary>,
}

impl ImportTable {
    pub fn libraries(&self) -> &[ImportedLibrary] {
        &self.libraries
    }

    pub fn get(&self, name: &DllName) -> Option<&ImportedLibrary> {
        self.libraries.iter().find(|library| &library.name == name)
    }

    pub fn len(&self) -> usize {
        self.libraries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.libraries.is_empty()
    }

    fn insert(&mut self, name: DllName, symbols: Vec<String>) {
        match self.libraries.iter_mut().find(|library| library.name == name) {
            Some(existing) => existing.symbols.extend(symbols),
            None => self.libraries.push(ImportedLibrary { name, symbols }),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SymbolImports {
    pub ordinary: ImportTable,
    pub delay_load: ImportTable,
}

impl SymbolImports {
    /// Find which of `symbols` are imported from any of `libraries`.
    ///
    /// Returns `(library, symbol)` pairs, library spelled as in the dump,
    /// ordinary imports before delay-load imports, then in the order of
    /// `libraries` and `symbols`.
    pub fn find(&self, symbols: &[&str], libraries: &[&str]) -> Vec<(DllName, String)> {
        let mut found = Vec::new();
        for table in [&self.ordinary, &self.delay_load] {
            for library in libraries {
                let Some(imported) = table.get(&DllName::new(*library)) else {
                    continue;
                };
                for symbol in symbols {
                    if imported.symbols.iter().any(|s| s == symbol) {
                        found.push((imported.name.clone(), symbol.to_string()));
                    }
                }
            }
        }
        found
    }
}

/// Parser for `/imports` reports.
pub struct ImportsParser;

impl ImportsParser {
    pub fn new() -> Self {
        Self
    }

    fn parse_table(&self, dump: &RawDump, section: &Section) -> Result<ImportTable> {
        let paragraphs = &section.paragraphs;
        if paragraphs.len() % 2 != 0 {
            return Err(AuditError::format(
                dump.path(),
                format!(
                    "unpaired paragraph under {:?} ({} paragraphs)",
                    section.header,
                    paragraphs.len()
                ),
            ));
        }

        let mut table = ImportTable::default();
        for pair in paragraphs.chunks_exact(2) {
            let name = self.library_name(dump, &pair[0])?;
            let symbols = self.symbol_names(dump, &name, &pair[1])?;
            table.insert(name, symbols);
        }
        Ok(table)
    }

    fn library_name(&self, dump: &RawDump, paragraph: &str) -> Result<DllName> {
        let first_line = paragraph.lines().next().unwrap_or_default();
        first_line
            .strip_prefix(DLL_NAME_INDENT)
            .filter(|rest| rest.chars().next().is_some_and(|c| !c.is_whitespace()))
            .map(|rest| DllName::new(rest.trim_end()))
            .ok_or_else(|| {
                AuditError::format(
                    dump.path(),
                    format!("expected a four-space indented library name, got {first_line:?}"),
                )
            })
    }

    fn symbol_names(&self, dump: &RawDump, library: &DllName, paragraph: &str) -> Result<Vec<String>> {
        if paragraph.trim().is_empty() {
            return Ok(Vec::new());
        }

        let mut symbols = Vec::new();
        for line in paragraph.lines().filter(|line| !line.trim().is_empty()) {
            if !line.starts_with(SYMBOL_INDENT) {
                return Err(AuditError::format(
                    dump.path(),
                    format!("unexpected line in symbol list of {library}: {line:?}"),
                ));
            }
            if let Some(symbol) = line.split_whitespace().last() {
                symbols.push(symbol.to_string());
            }
        }
        Ok(symbols)
    }
}

impl Default for ImportsParser {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportParser for ImportsParser {
    type Output = SymbolImports;

    fn mode(&self) -> DumpMode {
        DumpMode::Imports
    }

    fn parse(&self, dump: &RawDump) -> Result<SymbolImports> {
        let parsed = parse_dump(dump, true)?;
        let mut imports = SymbolImports::default();

        if let Some(section) = parsed.section(IMPORT_LIST_HEADER) {
            imports.ordinary = self.parse_table(dump, section)?;
        }
        if let Some(section) = parsed.section(DELAY_IMPORT_LIST_HEADER) {
            imports.delay_load = self.parse_table(dump, section)?;
        }

        Ok(imports)
    }
}
