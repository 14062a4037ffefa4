//! Binary inspection tools that produce the textual reports consumed by
//! [`crate::parsers`].

pub mod dumpbin;

use std::path::Path;

use crate::error::Result;
use crate::parsers::{DumpMode, RawDump, ReportParser};

pub use dumpbin::{Dumpbin, ToolEnvironment};

/// Produces the raw textual dump of one binary.
///
/// Implementations are shared across the inspection worker pool.
pub trait DumpTool: Send + Sync {
    fn dump(&self, path: &Path, mode: DumpMode) -> Result<RawDump>;

    fn tool_name(&self) -> &str {
        "dumpbin"
    }
}

/// Dump `path` in the mode `parser` understands and parse the result.
pub fn dump_and_parse<T, P>(tool: &T, parser: &P, path: &Path) -> Result<P::Output>
where
    T: DumpTool + ?Sized,
    P: ReportParser,
{
    let dump = tool.dump(path, parser.mode())?;
    parser.parse(&dump)
}
