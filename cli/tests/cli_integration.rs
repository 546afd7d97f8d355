use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tempfile::TempDir;

const DATA: &str = r#"<http://ex.org/alice> <http://ex.org/age> "42"^^<http://www.w3.org/2001/XMLSchema#integer> <http://ex.org/people> .
<http://ex.org/bob> <http://ex.org/age> "7"^^<http://www.w3.org/2001/XMLSchema#integer> <http://ex.org/people> .
<http://ex.org/carol> <http://ex.org/age> "19.5"^^<http://www.w3.org/2001/XMLSchema#decimal> <http://ex.org/people> .
<http://ex.org/alice> <http://ex.org/name> "Alice" <http://ex.org/people> .
_:b0 <http://ex.org/knows> <http://ex.org/alice> .
"#;

fn quadkv() -> Command {
    Command::new(env!("CARGO_BIN_EXE_quadkv"))
}

fn write_data(dir: &TempDir) -> PathBuf {
    let path = dir.path().join("data.nq");
    fs::write(&path, DATA).expect("write nquads");
    path
}

fn run(cmd: &mut Command) -> String {
    let out: Output = cmd.output().expect("run quadkv");
    assert!(
        out.status.success(),
        "quadkv failed: {}",
        String::from_utf8_lossy(&out.stderr)
    );
    String::from_utf8(out.stdout).expect("utf8 stdout")
}

fn lines(s: &str) -> Vec<&str> {
    s.lines().filter(|l| !l.trim().is_empty()).collect()
}

#[test]
fn load_reports_quads_and_keys() {
    let dir = TempDir::new().unwrap();
    let data = write_data(&dir);
    let out = run(quadkv().arg("load").arg(&data).arg("--batch-size").arg("2"));
    assert!(out.contains("Loaded 5 quads into 6 indexes (30 keys)"), "{out}");
}

#[test]
fn query_filters_by_subject() {
    let dir = TempDir::new().unwrap();
    let data = write_data(&dir);
    let out = run(quadkv()
        .arg("query")
        .arg("--subject")
        .arg("http://ex.org/alice")
        .arg(&data));
    let found = lines(&out);
    assert_eq!(found.len(), 2, "{out}");
    assert!(found.iter().all(|l| l.starts_with("<http://ex.org/alice>")));
}

#[test]
fn query_numeric_range_in_value_order() {
    let dir = TempDir::new().unwrap();
    let data = write_data(&dir);
    let out = run(quadkv()
        .arg("query")
        .arg("--gt")
        .arg("\"10\"^^<http://www.w3.org/2001/XMLSchema#integer>")
        .arg(&data));
    let found = lines(&out);
    assert_eq!(found.len(), 2, "{out}");
    assert!(found[0].contains("\"19.5\""));
    assert!(found[1].contains("\"42\""));
}

#[test]
fn query_default_graph_and_limit() {
    let dir = TempDir::new().unwrap();
    let data = write_data(&dir);
    let out = run(quadkv().arg("query").arg("--graph").arg("default").arg(&data));
    assert_eq!(lines(&out).len(), 1, "{out}");

    let out = run(quadkv()
        .arg("query")
        .arg("--predicate")
        .arg("<http://ex.org/age>")
        .arg("--limit")
        .arg("1")
        .arg("--reverse")
        .arg(&data));
    let found = lines(&out);
    assert_eq!(found.len(), 1, "{out}");
    assert!(found[0].contains("\"42\""));
}

#[test]
fn explain_reports_the_chosen_index() {
    let out = run(quadkv()
        .arg("explain")
        .arg("--predicate")
        .arg("http://ex.org/p")
        .arg("--json"));
    let plan: serde_json::Value = serde_json::from_str(&out).expect("json plan");
    assert_eq!(plan["index"], "POGS");
    assert_eq!(plan["resorted"], false);
    assert_eq!(plan["order"], serde_json::json!(["object", "graph", "subject"]));

    let out = run(quadkv()
        .arg("explain")
        .arg("--predicate")
        .arg("http://ex.org/p")
        .arg("--order")
        .arg("S"));
    assert!(out.contains("resorted: true"), "{out}");
}

#[test]
fn keys_dump_one_index() {
    let dir = TempDir::new().unwrap();
    let data = write_data(&dir);
    let out = run(quadkv().arg("keys").arg("--index").arg("gspo").arg(&data));
    let keys = lines(&out);
    assert_eq!(keys.len(), 5, "{out}");
    assert!(keys.iter().all(|k| k.starts_with("GSPO\\0\\0")));
}

#[test]
fn custom_config_is_honored() {
    let dir = TempDir::new().unwrap();
    let data = write_data(&dir);
    let config = dir.path().join("store.json");
    fs::write(
        &config,
        r#"{"indexes": [["subject", "predicate", "object", "graph"]], "batch_size": 3}"#,
    )
    .unwrap();
    let out = run(quadkv().arg("--config").arg(&config).arg("load").arg(&data));
    assert!(out.contains("into 1 indexes (5 keys)"), "{out}");

    let out = run(quadkv()
        .arg("--config")
        .arg(&config)
        .arg("explain")
        .arg("--object")
        .arg("http://ex.org/o"));
    assert!(out.contains("index:    SPOG"), "{out}");
    assert!(out.contains("filtered: true"), "{out}");

    let out = run(quadkv()
        .arg("--config")
        .arg(&config)
        .arg("query")
        .arg("--object")
        .arg("http://ex.org/alice")
        .arg(&data));
    let found = lines(&out);
    assert_eq!(found.len(), 1, "{out}");
    assert!(found[0].starts_with("_:"), "{out}");
}

#[test]
fn query_graph_with_object_range() {
    let dir = TempDir::new().unwrap();
    let data = write_data(&dir);
    let out = run(quadkv()
        .arg("query")
        .arg("--graph")
        .arg("http://ex.org/people")
        .arg("--lt")
        .arg("\"20\"^^<http://www.w3.org/2001/XMLSchema#integer>")
        .arg(&data));
    let found = lines(&out);
    assert_eq!(found.len(), 2, "{out}");
    assert!(found[0].contains("\"7\""));
    assert!(found[1].contains("\"19.5\""));
}

#[test]
fn missing_file_fails() {
    let out = quadkv()
        .arg("load")
        .arg(Path::new("/definitely/not/here.ttl"))
        .output()
        .unwrap();
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("cannot open"));
}
