use std::path::{Path, PathBuf};
use std::process::{Command, Output};

const TOPO_YAML: &str = r#"
objects:
  - id: "e2:1/5153"
    type: entity
    kind: e2node
    labels: { role: leaf, zone: east, rack: "3" }
  - id: "e2:1/5154"
    type: entity
    kind: e2node
    labels: { role: leaf, zone: west, rack: "4" }
  - id: "e2:1/5155"
    type: entity
    kind: e2node
    labels: { role: spine, zone: east, rack: "9" }
  - id: "rel-1"
    type: relation
    kind: controls
    source: "e2t-1"
    target: "e2:1/5153"
    labels: { zone: east }
"#;

fn ranctl(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_ranctl"))
        .current_dir(dir)
        .env_remove("RUST_LOG")
        .arg("--state")
        .arg(dir.join("state.json"))
        .arg("--topo")
        .arg(dir.join("topo.yaml"))
        .args(args)
        .output()
        .expect("run ranctl")
}

fn stdout_of(dir: &Path, args: &[&str]) -> String {
    let output = ranctl(dir, args);
    if !output.status.success() {
        panic!(
            "ranctl {:?} failed: {}",
            args,
            String::from_utf8_lossy(&output.stderr)
        );
    }
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn topo_dir() -> (tempfile::TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().to_path_buf();
    std::fs::write(path.join("topo.yaml"), TOPO_YAML).unwrap();
    (dir, path)
}

#[test]
fn node_lifecycle() {
    let (_dir, path) = topo_dir();

    assert_eq!(stdout_of(&path, &["get", "plmnid"]), "314628\n");
    assert_eq!(
        stdout_of(
            &path,
            &["create", "node", "5153", "--cells", "21458294,21458295", "--service-models", "kpm,rc"]
        ),
        "Node 5153 created\n"
    );
    assert!(path.join("state.json").exists());

    let out = stdout_of(&path, &["update", "node", "5153", "--controllers", "e2t-1"]);
    assert_eq!(out, "Node 5153 updated\n");

    let out = stdout_of(&path, &["get", "node", "5153"]);
    assert!(out.contains("Service Models: kpm,rc"));
    assert!(out.contains("Controllers: e2t-1"));
    assert!(out.contains("Cell ECGIs: 21458294,21458295"));

    let out = stdout_of(&path, &["start", "5153"]);
    assert!(out.contains("Status: running"));

    let out = stdout_of(&path, &["get", "nodes", "--no-headers"]);
    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(lines.len(), 1);
    assert!(lines[0].starts_with("5153"));
    assert!(lines[0].contains("running"));

    assert_eq!(
        stdout_of(&path, &["delete", "node", "5153"]),
        "Node 5153 deleted\n"
    );
    assert!(!ranctl(&path, &["get", "node", "5153"]).status.success());
}

#[test]
fn create_existing_node_fails() {
    let (_dir, path) = topo_dir();
    stdout_of(&path, &["create", "node", "1"]);
    let output = ranctl(&path, &["create", "node", "1"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("already exists"));
}

#[test]
fn topo_get_entities_with_label_filters() {
    let (_dir, path) = topo_dir();
    let out = stdout_of(
        &path,
        &[
            "topo",
            "get",
            "entities",
            "--no-headers",
            "--label",
            "role=leaf, zone!=west, rack in (3,4,5)",
        ],
    );
    let ids: Vec<&str> = out
        .lines()
        .filter_map(|line| line.split_whitespace().next())
        .collect();
    assert_eq!(ids, vec!["e2:1/5153"]);
}

#[test]
fn topo_get_drops_unrecognized_clauses_unless_strict() {
    let (_dir, path) = topo_dir();
    let out = stdout_of(
        &path,
        &["topo", "get", "entities", "--no-headers", "--label", "garbage, role=spine"],
    );
    assert_eq!(out.lines().count(), 1);
    assert!(out.starts_with("e2:1/5155"));

    let output = ranctl(
        &path,
        &["topo", "get", "entities", "--strict", "--label", "garbage, role=spine"],
    );
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("garbage"));
}

#[test]
fn topo_relations_ignore_kind_query() {
    let (_dir, path) = topo_dir();
    let out = stdout_of(
        &path,
        &["topo", "get", "relations", "--kind", "kind=contains"],
    );
    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with("Relation ID"));
    assert!(lines[1].starts_with("rel-1"));
}

#[test]
fn topo_filters_reject_unclosed_list() {
    let (_dir, path) = topo_dir();
    let output = ranctl(&path, &["topo", "filters", "--label", "rack in (3,4"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("closing"));
}

#[test]
fn topo_filters_yaml_dump() {
    let (_dir, path) = topo_dir();
    let out = stdout_of(
        &path,
        &["topo", "filters", "--label", "zone=east", "--format", "yaml"],
    );
    let value: serde_yaml::Value = serde_yaml::from_str(&out).unwrap();
    assert_eq!(value["label_filters"][0]["key"], "zone");
}
