use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::{DependencyResolver, FileInspector, FileRecord, FileScanner, Forest, LibraryClassifier};
use crate::error::{AuditError, Result};
use crate::tools::DumpTool;

/// Scans a directory, inspects every binary in parallel and resolves the
/// dependency forest.
pub struct DirectoryAnalyzer<'a, T: DumpTool + ?Sized> {
    file_scanner: FileScanner,
    tool: &'a T,
    classifier: &'a LibraryClassifier,
    threads: Option<usize>,
}

impl<'a, T: DumpTool + ?Sized> DirectoryAnalyzer<'a, T> {
    pub fn new(tool: &'a T, classifier: &'a LibraryClassifier) -> Self {
        Self {
            file_scanner: FileScanner::new(),
            tool,
            classifier,
            threads: None,
        }
    }

    /// Limit the inspection pool to `threads` workers. Zero or unset uses
    /// rayon's default (one per CPU).
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = (threads > 0).then_some(threads);
        self
    }

    pub fn analyze(&self, root_path: &Path, extensions: &[&str]) -> Result<Forest> {
        let files = self.file_scanner.scan_directory(root_path, extensions)?;
        info!("Found {} files to inspect in {}", files.len(), root_path.display());

        let records = self.inspect_all(&files)?;

        info!("Resolving dependencies...");
        DependencyResolver::new(self.classifier).resolve(records)
    }

    /// Inspect `files` on a bounded worker pool. The first failure aborts the
    /// whole run.
    pub fn inspect_all(&self, files: &[PathBuf]) -> Result<Vec<FileRecord>> {
        let pool = worker_pool(self.threads.unwrap_or(0))?;

        debug!(
            "Inspecting with {} on {} workers",
            self.tool.tool_name(),
            pool.current_num_threads()
        );

        let inspector = FileInspector::new(self.tool);
        pool.install(|| {
            files
                .par_iter()
                .map(|path| {
                    debug!("Inspecting {}", path.display());
                    inspector.inspect(path)
                })
                .collect()
        })
    }
}

/// A rayon pool with `threads` workers, or one per CPU when `threads` is zero.
pub fn worker_pool(threads: usize) -> Result<ThreadPool> {
    let mut pool = ThreadPoolBuilder::new();
    if threads > 0 {
        pool = pool.num_threads(threads);
    }
    pool.build()
        .map_err(|err| AuditError::Config(format!("cannot start worker pool: {err}")))
}
