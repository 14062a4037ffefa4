mod common;

use common::CannedDumps;
use dlltree::core::{DllName, FileInspector};
use dlltree::parsers::DumpMode;
use dlltree::AuditError;
use std::path::Path;

#[test]
fn detects_loader_calls_and_delay_load_dependencies() {
    let mut tool = CannedDumps::new();
    tool.binary_with_imports(
        "x.dll",
        &["KERNEL32.dll"],
        &["KERNELBASE.dll"],
        &[("KERNEL32.dll", &["GetProcAddress", "LoadLibraryExW"])],
        &[("KERNELBASE.dll", &["Sleep"])],
    );

    let record = FileInspector::new(&tool)
        .inspect(Path::new("bundle/x.dll"))
        .unwrap();

    assert_eq!(record.name.as_str(), "x.dll");
    assert_eq!(record.dynamic_loads, vec!["LoadLibraryExW"]);
    assert_eq!(record.dependencies, vec![DllName::new("KERNEL32.dll")]);
    assert_eq!(
        record.delay_load_dependencies,
        vec![DllName::new("KERNELBASE.dll")]
    );
}

#[test]
fn loader_calls_are_listed_once_in_discovery_order() {
    let mut tool = CannedDumps::new();
    tool.binary_with_imports(
        "x.dll",
        &["kernel32.dll"],
        &[],
        &[("kernel32.dll", &["LoadLibraryW", "LoadLibraryA"])],
        &[("KERNEL32", &["LoadLibraryA", "LoadLibraryExA"])],
    );

    let record = FileInspector::new(&tool)
        .inspect(Path::new("x.dll"))
        .unwrap();
    assert_eq!(
        record.dynamic_loads,
        vec!["LoadLibraryA", "LoadLibraryW", "LoadLibraryExA"]
    );
}

#[test]
fn loader_symbols_from_other_libraries_are_ignored() {
    let mut tool = CannedDumps::new();
    tool.binary_with_imports(
        "x.dll",
        &["KERNELBASE.dll"],
        &[],
        &[("KERNELBASE.dll", &["LoadLibraryW"])],
        &[],
    );

    let record = FileInspector::new(&tool)
        .inspect(Path::new("x.dll"))
        .unwrap();
    assert!(record.dynamic_loads.is_empty());
}

#[test]
fn malformed_import_dump_fails_the_inspection() {
    let mut tool = CannedDumps::new();
    tool.add(
        "x.dll",
        DumpMode::Dependents,
        common::dependents_dump("x.dll", &["a.dll"], &[]),
    );
    tool.add("x.dll", DumpMode::Imports, "Dump of file x.dll\n".to_string());

    let err = FileInspector::new(&tool)
        .inspect(Path::new("x.dll"))
        .unwrap_err();
    assert!(matches!(err, AuditError::Format { .. }));
}

#[test]
fn tool_failure_fails_the_inspection() {
    let tool = CannedDumps::new();
    let err = FileInspector::new(&tool)
        .inspect(Path::new("missing.dll"))
        .unwrap_err();
    assert!(matches!(err, AuditError::Tool { .. }));
}
