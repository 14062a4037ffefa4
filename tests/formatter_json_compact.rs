mod common;

use common::{record, record_with_calls, resolve};
use dlltree::formatters::JsonCompactFormatter;
use serde_json::Value;

#[test]
fn json_compact_formatter_outputs_valid_json() {
    let forest = resolve(vec![
        record_with_calls("x.dll", &["y.dll", "kernel32.dll"], &["z.dll"], &["LoadLibraryW"]),
        record("y.dll", &["libfoo.dll"], &[]),
        record("z.dll", &[], &[]),
    ]);

    let tmp = tempfile::NamedTempFile::new().unwrap();
    let path = tmp.path().with_extension("json");

    let fmt = JsonCompactFormatter::new();
    fmt.format_to_file(&forest, &path).unwrap();

    let data = std::fs::read_to_string(&path).unwrap();
    let v: Value = serde_json::from_str(&data).unwrap();

    assert_eq!(v["meta"]["files"].as_u64().unwrap(), 3);
    assert_eq!(v["meta"]["libraries"].as_u64().unwrap(), 5);
    assert_eq!(v["meta"]["edges"].as_u64().unwrap(), 4);
    assert_eq!(v["meta"]["roots"].as_u64().unwrap(), 1);

    // Bundled files first, then externals, each in name order.
    let nodes = v["nodes"].as_array().unwrap();
    let names: Vec<&str> = nodes.iter().map(|n| n["n"].as_str().unwrap()).collect();
    assert_eq!(names, vec!["x.dll", "y.dll", "z.dll", "kernel32.dll", "libfoo.dll"]);

    assert_eq!(v["roots"], serde_json::json!([0]));
    assert_eq!(nodes[0]["k"], "bundled");
    assert_eq!(nodes[0]["calls"], serde_json::json!(["LoadLibraryW"]));
    assert_eq!(nodes[0]["deps"], serde_json::json!([3, 1]));
    assert_eq!(nodes[0]["delay"], serde_json::json!([2]));
    assert_eq!(nodes[3]["k"], "system");
    assert_eq!(nodes[4]["k"], "EXTERNAL");
    assert!(nodes[4].get("deps").is_none());
}

#[test]
fn cyclic_forest_serializes() {
    let forest = resolve(vec![
        record("a.dll", &[], &["b.dll"]),
        record("b.dll", &[], &["a.dll"]),
    ]);
    let text = JsonCompactFormatter::new().format_forest(&forest).unwrap();
    let v: Value = serde_json::from_str(&text).unwrap();
    assert_eq!(v["nodes"][0]["delay"], serde_json::json!([1]));
    assert_eq!(v["nodes"][1]["delay"], serde_json::json!([0]));
}

#[test]
fn pretty_output_parses_to_the_same_value() {
    let forest = resolve(vec![record("a.dll", &["USER32.dll"], &[])]);
    let compact = JsonCompactFormatter::new().format_forest(&forest).unwrap();
    let pretty = JsonCompactFormatter::new()
        .with_pretty(true)
        .format_forest(&forest)
        .unwrap();
    assert!(!compact.contains('\n'));
    assert!(pretty.contains('\n'));
    let a: Value = serde_json::from_str(&compact).unwrap();
    let b: Value = serde_json::from_str(&pretty).unwrap();
    assert_eq!(a, b);
}
