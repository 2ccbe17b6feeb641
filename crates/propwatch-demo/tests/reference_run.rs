//! End-to-end runs of the demo against an in-memory stdout.

use std::cell::RefCell;
use std::io::{self, Write};
use std::rc::Rc;

use clap::Parser;
use propwatch_demo::{Cli, DemoError, run};
use serde_json::json;

#[derive(Clone, Default)]
struct SharedBuffer(Rc<RefCell<Vec<u8>>>);

impl SharedBuffer {
    fn text(&self) -> String {
        String::from_utf8(self.0.borrow().clone()).expect("utf8 output")
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn cli(args: &[&str]) -> Cli {
    let mut argv = vec!["propwatch-demo"];
    argv.extend_from_slice(args);
    Cli::try_parse_from(argv).expect("valid arguments")
}

#[test]
fn default_run_prints_shift_through_events() {
    let out = SharedBuffer::default();
    let summary = run(&cli(&[]), out.clone()).expect("run");

    assert_eq!(summary.reads, 10);
    assert_eq!(summary.writes, 9);
    assert_eq!(summary.removed, Some(json!(1)));
    assert_eq!(summary.snapshot, json!([2, 3, 4, 5, 6, 7, 8, 9, 0]));
    assert_eq!(summary.report.installed.len(), 10);

    let text = out.text();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 19 + 3);
    assert_eq!(lines[0], "read");
    for pair in lines[1..19].chunks(2) {
        assert_eq!(pair, ["read", "write"]);
    }
    assert_eq!(lines[19], "removed: 1");
    assert_eq!(lines[20], "snapshot: [2,3,4,5,6,7,8,9,0]");
    assert_eq!(lines[21], "reads: 10 writes: 9");
}

#[test]
fn rebind_run_is_silent() {
    let out = SharedBuffer::default();
    let summary = run(&cli(&["--removal", "rebind"]), out.clone()).expect("run");

    assert_eq!(summary.reads + summary.writes, 0);
    assert_eq!(summary.snapshot, json!([2, 3, 4, 5, 6, 7, 8, 9, 0]));
    assert!(out.text().starts_with("removed: 1\n"));
}

#[test]
fn verbose_events_carry_paths() {
    let out = SharedBuffer::default();
    run(&cli(&["--events", "verbose", "--remove", "8"]), out.clone()).expect("run");

    let text = out.text();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines[0], "read $[8]");
    assert_eq!(lines[1], "read $[9]");
    assert_eq!(lines[2], "write $[8]");
}

#[test]
fn json_events_are_one_object_per_line() {
    let out = SharedBuffer::default();
    run(&cli(&["--events", "json", "--no-remove"]), out.clone()).expect("run");

    let text = out.text();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 1, "no events without removal, only the summary");
    let summary: serde_json::Value = serde_json::from_str(lines[0]).expect("json summary");
    assert_eq!(summary["installed"], json!(10));
    assert_eq!(summary["removed"], serde_json::Value::Null);
}

#[test]
fn json_input_map_removes_by_name() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("doc.json");
    std::fs::write(&path, r#"{"a": [1, 2], "b": {"c": true}, "d": "x"}"#).expect("write input");

    let out = SharedBuffer::default();
    let input = path.to_str().expect("utf8 path");
    let summary = run(
        &cli(&["--input", input, "--remove", "b", "--events", "none"]),
        out.clone(),
    )
    .expect("run");

    assert_eq!(summary.report.containers, 3);
    assert_eq!(summary.report.installed.len(), 6);
    assert_eq!(summary.removed, Some(json!({"c": true})));
    assert_eq!(summary.snapshot, json!({"a": [1, 2], "d": "x"}));
    // Map removal drops the entry without going through its accessor.
    assert_eq!(summary.reads + summary.writes, 0);
}

#[test]
fn json_input_map_defaults_to_first_key() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("doc.json");
    std::fs::write(&path, r#"{"first": 1, "second": 2}"#).expect("write input");

    let input = path.to_str().expect("utf8 path");
    let summary = run(&cli(&["--input", input]), SharedBuffer::default()).expect("run");
    assert_eq!(summary.removed, Some(json!(1)));
    assert_eq!(summary.snapshot, json!({"second": 2}));
}

#[test]
fn missing_map_key_names_the_removal() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("doc.json");
    std::fs::write(&path, r#"{"a": 1}"#).expect("write input");

    let input = path.to_str().expect("utf8 path");
    let error = run(&cli(&["--input", input, "--remove", "nope"]), SharedBuffer::default())
        .expect_err("missing key");
    assert!(matches!(error, DemoError::Remove { .. }));
    assert_eq!(error.to_string(), r#"removing "nope" failed: key not found: "nope""#);
    assert_eq!(error.exit_code(), 3);
}

#[test]
fn scalar_input_is_rejected() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("scalar.json");
    std::fs::write(&path, "42").expect("write input");

    let input = path.to_str().expect("utf8 path");
    let error = run(&cli(&["--input", input]), SharedBuffer::default()).expect_err("scalar");
    assert!(matches!(error, DemoError::InvalidArgument { .. }));
    assert_eq!(error.exit_code(), 2);
}

#[test]
fn depth_limit_surfaces_as_observe_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("deep.json");
    std::fs::write(&path, "[[[1]]]").expect("write input");

    let input = path.to_str().expect("utf8 path");
    let error = run(&cli(&["--input", input, "--max-depth", "1"]), SharedBuffer::default())
        .expect_err("too deep");
    assert_eq!(error.exit_code(), 3);
}

#[test]
fn missing_input_is_an_io_error() {
    let error = run(
        &cli(&["--input", "/nonexistent/propwatch/input.json"]),
        SharedBuffer::default(),
    )
    .expect_err("missing file");
    assert!(matches!(error, DemoError::Io(_)));
}
