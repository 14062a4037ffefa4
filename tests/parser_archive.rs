mod common;

use dlltree::parsers::{ArchiveMembersParser, RawDump, ReportParser};
use dlltree::AuditError;

#[test]
fn import_library_members_name_their_dlls() {
    let text = common::archive_dump(
        "ucrt.lib",
        &[
            "/",
            "/",
            "//",
            "api-ms-win-crt-runtime-l1-1-0.dll/",
            "api-ms-win-crt-heap-l1-1-0.dll/",
            "API-MS-WIN-CRT-RUNTIME-L1-1-0.dll/",
            "d:\\os\\obj\\amd64fre\\minkernel\\crts\\ucrt\\stub.obj/",
            "ucrtbase.dll/",
        ],
    );
    let members = ArchiveMembersParser::new()
        .parse(&RawDump::new("ucrt.lib", text))
        .unwrap();

    let names: Vec<&str> = members.iter().map(|name| name.as_str()).collect();
    assert_eq!(
        names,
        vec![
            "api-ms-win-crt-heap-l1-1-0.dll",
            "api-ms-win-crt-runtime-l1-1-0.dll",
            "ucrtbase.dll",
        ]
    );
}

#[test]
fn object_members_are_dropped_regardless_of_case() {
    let text = common::archive_dump("x.lib", &["helper.OBJ/", "x.dll/"]);
    let members = ArchiveMembersParser::new()
        .parse(&RawDump::new("x.lib", text))
        .unwrap();
    assert_eq!(members.len(), 1);
}

#[test]
fn preamble_is_still_checked() {
    let err = ArchiveMembersParser::new()
        .parse(&RawDump::new("x.lib", "Archive member name at 8: x.dll/\n"))
        .unwrap_err();
    assert!(matches!(err, AuditError::Format { .. }));
}
