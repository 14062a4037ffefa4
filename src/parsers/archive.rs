use std::collections::BTreeSet;

use crate::core::DllName;
use crate::error::Result;

use super::common::parse_dump;
use super::{DumpMode, RawDump, ReportParser};

const ARCHIVE_MEMBER_PREFIX: &str = "Archive member name at ";
const OBJECT_EXTENSION: &str = ".obj";

/// Parser for `/archivemembers` reports of import libraries.
///
/// Yields the set of DLLs an import library binds to. Linker members (`/`,
/// `//`) and static object members are skipped.
pub struct ArchiveMembersParser;

impl ArchiveMembersParser {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ArchiveMembersParser {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportParser for ArchiveMembersParser {
    type Output = BTreeSet<DllName>;

    fn mode(&self) -> DumpMode {
        DumpMode::ArchiveMembers
    }

    fn parse(&self, dump: &RawDump) -> Result<BTreeSet<DllName>> {
        // Preamble only; the member list is not laid out in sections.
        parse_dump(dump, false)?;

        let names = dump
            .text
            .lines()
            .filter(|line| line.starts_with(ARCHIVE_MEMBER_PREFIX))
            .filter_map(|line| line.split_whitespace().last())
            .map(|member| member.trim_end_matches('/'))
            .filter(|member| !member.is_empty())
            .map(DllName::new)
            .filter(|member| !member.ends_with_ignore_case(OBJECT_EXTENSION));

        // `insert` keeps the first spelling of a name.
        let mut members = BTreeSet::new();
        for name in names {
            members.insert(name);
        }
        Ok(members)
    }
}
