use crate::core::DllName;
use crate::error::{AuditError, Result};

use super::common::parse_dump;
use super::{DumpMode, RawDump, ReportParser};

pub const DEPENDENCY_LIST_HEADER: &str = "Image has the following dependencies:";
pub const DELAY_DEPENDENCY_LIST_HEADER: &str = "Image has the following delay load dependencies:";

/// Load-time and delay-load dependencies of one image, in dump order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencyLists {
    pub ordinary: Vec<DllName>,
    pub delay_load: Vec<DllName>,
}

/// Parser for `/dependents` reports.
pub struct DependentsParser;

impl DependentsParser {
    pub fn new() -> Self {
        Self
    }

    fn extract(&self, dump: &RawDump, body: &[String], header: &str) -> Result<Vec<DllName>> {
        match body {
            [paragraph] => Ok(paragraph
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(DllName::new)
                .collect()),
            _ => Err(AuditError::format(
                dump.path(),
                format!(
                    "expected exactly one paragraph under {header:?}, found {}",
                    body.len()
                ),
            )),
        }
    }
}

impl Default for DependentsParser {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportParser for DependentsParser {
    type Output = DependencyLists;

    fn mode(&self) -> DumpMode {
        DumpMode::Dependents
    }

    fn parse(&self, dump: &RawDump) -> Result<DependencyLists> {
        let parsed = parse_dump(dump, true)?;
        let mut lists = DependencyLists::default();

        if let Some(section) = parsed.section(DEPENDENCY_LIST_HEADER) {
            lists.ordinary = self.extract(dump, &section.paragraphs, DEPENDENCY_LIST_HEADER)?;
        }
        if let Some(section) = parsed.section(DELAY_DEPENDENCY_LIST_HEADER) {
            lists.delay_load =
                self.extract(dump, &section.paragraphs, DELAY_DEPENDENCY_LIST_HEADER)?;
        }

        Ok(lists)
    }
}
