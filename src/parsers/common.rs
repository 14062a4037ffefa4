//! Layout shared by every dumpbin report: a two-paragraph preamble followed by
//! sections whose headers are indented by exactly two spaces.

use crate::error::{AuditError, Result};

use super::RawDump;

pub const FIRST_WORDS: &str = "Dump of file ";
pub const FILE_TYPE_PREFIX: &str = "File Type: ";
pub const SUMMARY_HEADER: &str = "Summary";

const SECTION_HEADER_INDENT: &str = "  ";

/// A section header and the paragraphs that follow it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub header: String,
    pub paragraphs: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct ParsedDump {
    /// Path as declared by the dump itself.
    pub file: String,
    pub file_type: String,
    /// Sections in dump order. Headers are unique.
    pub sections: Vec<Section>,
}

impl ParsedDump {
    pub fn section(&self, header: &str) -> Option<&Section> {
        self.sections.iter().find(|section| section.header == header)
    }
}

/// Normalize line endings and blank-line runs so that the text splits into
/// paragraphs on `"\n\n"`.
///
/// Two consecutive blank lines denote an empty paragraph; widening every
/// `"\n\n\n"` to `"\n\n\n\n"` keeps that paragraph when splitting.
pub fn normalize(text: &str) -> String {
    let unix = text.replace("\r\n", "\n");
    format!("{}\n", unix.trim()).replace("\n\n\n", "\n\n\n\n")
}

/// Split a normalized dump into paragraphs, without trailing newlines.
pub fn paragraphs(normalized: &str) -> Vec<&str> {
    normalized
        .split("\n\n")
        .map(|p| p.trim_end_matches('\n'))
        .collect()
}

/// Parse the preamble and, when `with_sections` is set, the section layout.
///
/// Dependency and import reports must contain a `Summary` section; archive
/// member reports are read line by line and skip section parsing.
pub fn parse_dump(dump: &RawDump, with_sections: bool) -> Result<ParsedDump> {
    let path = dump.path();
    let normalized = normalize(&dump.text);
    let mut paragraphs = paragraphs(&normalized).into_iter();

    let first = paragraphs.next().unwrap_or_default();
    let file = first.strip_prefix(FIRST_WORDS).ok_or_else(|| {
        AuditError::format(path, format!("expected dump to start with {FIRST_WORDS:?}"))
    })?;

    let second = paragraphs
        .next()
        .ok_or_else(|| AuditError::format(path, "missing file type paragraph"))?;
    let file_type = second.strip_prefix(FILE_TYPE_PREFIX).ok_or_else(|| {
        AuditError::format(
            path,
            format!("expected second paragraph to start with {FILE_TYPE_PREFIX:?}"),
        )
    })?;

    let sections = if with_sections {
        let sections = find_sections(dump, paragraphs)?;
        if !sections.iter().any(|s| s.header == SUMMARY_HEADER) {
            return Err(AuditError::format(path, "missing Summary section"));
        }
        sections
    } else {
        Vec::new()
    };

    Ok(ParsedDump {
        file: file.to_string(),
        file_type: file_type.to_string(),
        sections,
    })
}

fn is_section_header(paragraph: &str) -> bool {
    match paragraph.strip_prefix(SECTION_HEADER_INDENT) {
        Some(rest) => {
            rest.chars().next().is_some_and(|c| !c.is_whitespace()) && !paragraph.contains('\n')
        }
        None => false,
    }
}

fn find_sections<'a>(
    dump: &RawDump,
    paragraphs: impl Iterator<Item = &'a str>,
) -> Result<Vec<Section>> {
    let mut sections: Vec<Section> = Vec::new();

    for paragraph in paragraphs {
        if is_section_header(paragraph) {
            let header = paragraph.trim();
            if sections.iter().any(|s| s.header == header) {
                return Err(AuditError::format(
                    dump.path(),
                    format!("duplicate section header {header:?}"),
                ));
            }
            sections.push(Section {
                header: header.to_string(),
                paragraphs: Vec::new(),
            });
        } else {
            let current = sections.last_mut().ok_or_else(|| {
                AuditError::format(dump.path(), "body paragraph before first section header")
            })?;
            current.paragraphs.push(paragraph.to_string());
        }
    }

    Ok(sections)
}
