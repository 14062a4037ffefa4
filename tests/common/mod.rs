//! Canned dumpbin output for tests.
#![allow(dead_code)]

use dlltree::core::{DependencyResolver, DllName, FileRecord, Forest, LibraryClassifier};
use dlltree::parsers::{DumpMode, RawDump};
use dlltree::tools::DumpTool;
use dlltree::{AuditError, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

const SUMMARY: &str = "  Summary\n\n        1000 .data\n        1000 .pdata\n        2000 .rdata\n        1000 .reloc\n        8000 .text\n";

/// A [`DumpTool`] answering from prepared text, keyed by file name.
#[derive(Default)]
pub struct CannedDumps {
    dumps: HashMap<(String, DumpMode), String>,
    calls: AtomicUsize,
}

impl CannedDumps {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, file: &str, mode: DumpMode, text: String) {
        self.dumps.insert((file.to_string(), mode), text);
    }

    /// Register both reports of a binary with the given imports.
    pub fn binary(&mut self, file: &str, deps: &[&str], delay: &[&str]) {
        self.binary_with_imports(file, deps, delay, &[], &[]);
    }

    pub fn binary_with_imports(
        &mut self,
        file: &str,
        deps: &[&str],
        delay: &[&str],
        imports: &[(&str, &[&str])],
        delay_imports: &[(&str, &[&str])],
    ) {
        self.add(file, DumpMode::Dependents, dependents_dump(file, deps, delay));
        self.add(file, DumpMode::Imports, imports_dump(file, imports, delay_imports));
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl DumpTool for CannedDumps {
    fn dump(&self, path: &Path, mode: DumpMode) -> Result<RawDump> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let file = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.dumps
            .get(&(file.clone(), mode))
            .map(|text| RawDump::new(path, text.clone()))
            .ok_or_else(|| AuditError::tool("canned", format!("no {mode:?} dump for {file}")))
    }

    fn tool_name(&self) -> &str {
        "canned"
    }
}

fn preamble(file: &str, file_type: &str) -> String {
    format!("Dump of file {file}\n\nFile Type: {file_type}\n\n")
}

fn file_type(file: &str) -> &'static str {
    if file.to_lowercase().ends_with(".exe") {
        "EXECUTABLE IMAGE"
    } else {
        "DLL"
    }
}

pub fn dependents_dump(file: &str, deps: &[&str], delay: &[&str]) -> String {
    let mut out = preamble(file, file_type(file));
    if !deps.is_empty() {
        out.push_str("  Image has the following dependencies:\n\n");
        for dep in deps {
            out.push_str(&format!("    {dep}\n"));
        }
        out.push('\n');
    }
    if !delay.is_empty() {
        out.push_str("  Image has the following delay load dependencies:\n\n");
        for dep in delay {
            out.push_str(&format!("    {dep}\n"));
        }
        out.push('\n');
    }
    out.push_str(SUMMARY);
    out
}

fn import_block(out: &mut String, library: &str, symbols: &[&str], delay: bool) {
    out.push_str(&format!("    {library}\n"));
    if delay {
        out.push_str("              00000001 Characteristics\n");
        out.push_str("      0000000180005000 Address of HMODULE\n");
        out.push_str("      0000000180005010 Import Address Table\n");
        out.push_str("      0000000180004200 Import Name Table\n");
        out.push_str("      0000000000000000 Bound Import Name Table\n");
        out.push_str("      0000000000000000 Unload Import Name Table\n");
        out.push_str("                     0 time date stamp\n");
    } else {
        out.push_str("             180003000 Import Address Table\n");
        out.push_str("             180004100 Import Name Table\n");
        out.push_str("                     0 time date stamp\n");
        out.push_str("                     0 Index of first forwarder reference\n");
    }

    if symbols.is_empty() {
        // Two blank lines: the symbol paragraph is empty.
        out.push_str("\n\n");
        return;
    }
    out.push('\n');
    for (hint, symbol) in symbols.iter().enumerate() {
        if delay {
            out.push_str(&format!(
                "            0000000180001{hint:03X}           0 {symbol}\n"
            ));
        } else {
            out.push_str(&format!("                         {:>3X} {symbol}\n", hint + 0x100));
        }
    }
    out.push('\n');
}

pub fn imports_dump(
    file: &str,
    imports: &[(&str, &[&str])],
    delay_imports: &[(&str, &[&str])],
) -> String {
    let mut out = preamble(file, file_type(file));
    if !imports.is_empty() {
        out.push_str("  Section contains the following imports:\n\n");
        for (library, symbols) in imports {
            import_block(&mut out, library, symbols, false);
        }
    }
    if !delay_imports.is_empty() {
        out.push_str("  Section contains the following delay load imports:\n\n");
        for (library, symbols) in delay_imports {
            import_block(&mut out, library, symbols, true);
        }
    }
    out.push_str(SUMMARY);
    out
}

pub fn archive_dump(file: &str, members: &[&str]) -> String {
    let mut out = preamble(file, "LIBRARY");
    for (offset, member) in members.iter().enumerate() {
        out.push_str(&format!(
            "Archive member name at {:X}: {member}               \n",
            0x8 + offset * 0x1A4
        ));
        out.push_str("FFFFFFFF time/date\n         uid\n         gid\n       0 mode\n      2E size\ncorrectly aligned\n\n");
    }
    out.push_str(SUMMARY);
    out
}

/// Create empty files named `names` in `dir`.
pub fn touch(dir: &Path, names: &[&str]) {
    for name in names {
        std::fs::write(dir.join(name), b"MZ").unwrap();
    }
}

/// An inspected file as the resolver receives it.
pub fn record(name: &str, deps: &[&str], delay: &[&str]) -> FileRecord {
    record_with_calls(name, deps, delay, &[])
}

pub fn record_with_calls(name: &str, deps: &[&str], delay: &[&str], calls: &[&str]) -> FileRecord {
    FileRecord {
        path: PathBuf::from("bundle").join(name),
        name: DllName::new(name),
        dependencies: deps.iter().map(|d| DllName::new(*d)).collect(),
        delay_load_dependencies: delay.iter().map(|d| DllName::new(*d)).collect(),
        dynamic_loads: calls.iter().map(|c| c.to_string()).collect(),
    }
}

/// A small classifier with a few well-known system and runtime DLLs.
pub fn classifier() -> LibraryClassifier {
    LibraryClassifier::new(
        ["KERNEL32.dll", "USER32.dll", "ntdll.dll", "msvcrt.dll"],
        ["VCRUNTIME140.dll", "MSVCP140.dll"],
    )
}

pub fn resolve(records: Vec<FileRecord>) -> Forest {
    DependencyResolver::new(&classifier()).resolve(records).unwrap()
}
