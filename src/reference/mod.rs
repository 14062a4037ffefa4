//! Reference sets of library names used to classify external dependencies.

pub mod cache;
pub mod sdk;

use rayon::prelude::*;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use walkdir::WalkDir;

use crate::core::{worker_pool, DllName};
use crate::error::{AuditError, Result};
use crate::parsers::ArchiveMembersParser;
use crate::tools::{dump_and_parse, DumpTool};

pub use cache::ReferenceCache;

/// MSVC runtime version supported out of the box (Visual Studio 2015-2022).
pub const DEFAULT_RUNTIME_VERSION: u32 = 140;

const VC140_LIBRARIES: &[&str] = &[
    "CONCRT140.dll",
    "MSVCP140.dll",
    "VCCORLIB140.dll",
    "VCRUNTIME140.dll",
    "VCRUNTIME140_1.dll",
];

/// System DLLs that no SDK import library links to. `msvcrt.dll` is not meant
/// for applications but is commonly used anyway.
pub const EXTRA_SYSTEM_LIBRARIES: &[&str] = &["msvcrt.dll", "shcore.dll"];

/// Compiler-runtime DLL names for MSVC runtime `version`.
pub fn runtime_libraries(version: u32) -> Result<&'static [&'static str]> {
    match version {
        140 => Ok(VC140_LIBRARIES),
        _ => Err(AuditError::Config(format!(
            "VC runtime DLLs for version {version} are not known"
        ))),
    }
}

/// Import libraries whose members make up the system DLL set: every x64
/// user-mode library plus the universal CRT.
pub fn import_libraries(sdk_libs: &Path) -> Result<Vec<PathBuf>> {
    let um = sdk_libs.join("um").join("x64");
    if !um.is_dir() {
        return Err(AuditError::Config(format!("{} not found", um.display())));
    }

    let mut libs = Vec::new();
    for entry in WalkDir::new(&um).min_depth(1).max_depth(1) {
        let entry = entry.map_err(std::io::Error::from)?;
        let is_lib = entry
            .path()
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("lib"));
        if entry.file_type().is_file() && is_lib {
            libs.push(entry.into_path());
        }
    }
    libs.sort();
    libs.push(sdk_libs.join("ucrt").join("x64").join("ucrt.lib"));
    Ok(libs)
}

/// All DLLs linked by the SDK import libraries under `sdk_libs`, plus
/// [`EXTRA_SYSTEM_LIBRARIES`]. The libraries are dumped on a pool of
/// `threads` workers (zero: one per CPU).
pub fn system_libraries<T: DumpTool + ?Sized>(
    tool: &T,
    sdk_libs: &Path,
    threads: usize,
) -> Result<BTreeSet<DllName>> {
    let libs = import_libraries(sdk_libs)?;
    info!("Collecting system DLL names from {} import libraries", libs.len());

    let parser = ArchiveMembersParser::new();
    let per_lib: Vec<BTreeSet<DllName>> = worker_pool(threads)?.install(|| {
        libs.par_iter()
            .map(|lib| dump_and_parse(tool, &parser, lib))
            .collect::<Result<_>>()
    })?;

    let mut all: BTreeSet<DllName> = BTreeSet::new();
    let extras = EXTRA_SYSTEM_LIBRARIES.iter().map(|name| DllName::new(*name));
    for name in per_lib.into_iter().flatten().chain(extras) {
        all.insert(name);
    }
    Ok(all)
}

/// [`system_libraries`], served from `cache` when the SDK has not changed.
pub fn cached_system_libraries<T: DumpTool + ?Sized>(
    tool: &T,
    sdk_libs: &Path,
    cache: &ReferenceCache,
    threads: usize,
) -> Result<BTreeSet<DllName>> {
    if let Some(names) = cache.load(sdk_libs) {
        return Ok(names.into_iter().map(DllName::new).collect());
    }

    let libraries = system_libraries(tool, sdk_libs, threads)?;
    let names: Vec<String> = libraries.iter().map(|name| name.as_str().to_string()).collect();
    if let Err(err) = cache.store(sdk_libs, &names) {
        warn!("Failed to cache system DLL names: {err}");
    }
    Ok(libraries)
}

/// Read a newline-separated list of library names. Blank lines and lines
/// starting with `#` are skipped.
pub fn read_library_list(path: &Path) -> Result<Vec<DllName>> {
    let content = fs::read_to_string(path).map_err(|err| {
        AuditError::Config(format!("cannot read {}: {err}", path.display()))
    })?;
    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(DllName::new)
        .collect())
}
