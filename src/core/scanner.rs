use std::collections::HashSet;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::error::{AuditError, Result};

/// Extensions scanned when none are given.
pub const DEFAULT_EXTENSIONS: &[&str] = &["dll", "exe"];

/// Lists the binaries of one directory, non-recursively.
pub struct FileScanner;

impl FileScanner {
    pub fn new() -> Self {
        Self
    }

    /// Files directly in `root_path` whose extension matches one of
    /// `extensions`, ignoring case. Sorted by case-folded file name.
    pub fn scan_directory(&self, root_path: &Path, extensions: &[&str]) -> Result<Vec<PathBuf>> {
        if !root_path.is_dir() {
            return Err(AuditError::Config(format!(
                "not a directory: {}",
                root_path.display()
            )));
        }

        let wanted: HashSet<String> = extensions
            .iter()
            .map(|ext| ext.trim_start_matches('.').to_lowercase())
            .collect();

        let mut files = Vec::new();
        for entry in WalkDir::new(root_path)
            .min_depth(1)
            .max_depth(1)
            .follow_links(true)
        {
            let entry = entry.map_err(std::io::Error::from)?;
            if !entry.file_type().is_file() {
                continue;
            }
            let matches = entry
                .path()
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| wanted.contains(&ext.to_lowercase()));
            if matches {
                files.push(entry.into_path());
            }
        }

        files.sort_by_key(|path| {
            let name = path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default();
            (name.to_lowercase(), name)
        });
        Ok(files)
    }
}

impl Default for FileScanner {
    fn default() -> Self {
        Self::new()
    }
}
