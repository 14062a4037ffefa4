pub mod archive;
pub mod common;
pub mod dependents;
pub mod imports;

use std::path::{Path, PathBuf};

use crate::error::Result;

pub use archive::ArchiveMembersParser;
pub use common::{ParsedDump, Section};
pub use dependents::{DependencyLists, DependentsParser};
pub use imports::{ImportTable, ImportedLibrary, ImportsParser, SymbolImports};

/// Which report the inspection tool is asked to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DumpMode {
    Dependents,
    Imports,
    ArchiveMembers,
}

impl DumpMode {
    /// Command-line option selecting this report.
    pub fn option(self) -> &'static str {
        match self {
            DumpMode::Dependents => "/dependents",
            DumpMode::Imports => "/imports",
            DumpMode::ArchiveMembers => "/archivemembers",
        }
    }
}

/// Raw text of one dump, tagged with the binary it describes.
#[derive(Debug, Clone)]
pub struct RawDump {
    pub path: PathBuf,
    pub text: String,
}

impl RawDump {
    pub fn new(path: impl Into<PathBuf>, text: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            text: text.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// A parser for one kind of tool report.
pub trait ReportParser {
    type Output;

    /// The report this parser understands.
    fn mode(&self) -> DumpMode;

    fn parse(&self, dump: &RawDump) -> Result<Self::Output>;
}
