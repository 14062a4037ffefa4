use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::error::{AuditError, Result};

const PROGRAM_FILES_X86: &str = "ProgramFiles(x86)";

/// Install root of the Windows `version` SDK, e.g.
/// `C:\Program Files (x86)\Windows Kits\10`.
pub fn windows_sdk_root(version: &str) -> Result<PathBuf> {
    let program_files = std::env::var_os(PROGRAM_FILES_X86).ok_or_else(|| {
        AuditError::Config(format!("{PROGRAM_FILES_X86} is not set; is this Windows?"))
    })?;
    let path = Path::new(&program_files).join("Windows Kits").join(version);
    if !path.exists() {
        return Err(AuditError::Config(format!(
            "Windows {version} SDK is not installed ({} not found)",
            path.display()
        )));
    }
    Ok(path)
}

/// `Lib\<latest>` directory of the Windows `version` SDK.
pub fn latest_windows_sdk_libs(version: &str) -> Result<PathBuf> {
    match version {
        "10" => latest_libs_in(&windows_sdk_root(version)?.join("Lib")),
        _ => Err(AuditError::Config(format!(
            "don't know how to find the Windows {version} SDK"
        ))),
    }
}

/// Newest `10.0.*` directory under an SDK `Lib` directory.
pub fn latest_libs_in(lib_root: &Path) -> Result<PathBuf> {
    let mut versions: Vec<(Vec<u64>, PathBuf)> = Vec::new();
    if lib_root.is_dir() {
        for entry in WalkDir::new(lib_root).min_depth(1).max_depth(1) {
            let entry = entry.map_err(std::io::Error::from)?;
            if !entry.file_type().is_dir() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            if name.starts_with("10.0.") {
                versions.push((version_key(&name), entry.into_path()));
            }
        }
    }

    versions
        .into_iter()
        .max_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(&b.1)))
        .map(|(_, path)| path)
        .ok_or_else(|| {
            AuditError::Config(format!(
                "Windows 10 SDK is not installed ({} not found)",
                lib_root.join("10.0.*").display()
            ))
        })
}

// "10.0.22621.0" sorts after "10.0.9600.0".
fn version_key(name: &str) -> Vec<u64> {
    name.split('.')
        .map(|part| part.parse().unwrap_or(0))
        .collect()
}
