#![allow(missing_docs)]

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::cargo::cargo_bin_cmd;
use serde_json::{json, Value};
use tempfile::TempDir;

const RATINGS: &str = "\"User-ID\";\"ISBN\";\"Book-Rating\"\n\
\"11\";\"0440234743\";\"9\"\n\
\"11\";\"0971880107\";\"0\"\n\
\"12\";\"0440234743\";\"5\"\n\
\"12\";\"0345417623\";\"10\"\n";

struct Workspace {
    dir: TempDir,
    config: PathBuf,
}

impl Workspace {
    fn new() -> Self {
        let dir = TempDir::new().expect("tempdir");
        let config = dir.path().join("config.toml");
        fs::write(&config, "").expect("write config");
        Self { dir, config }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    fn write_dataset(&self, name: &str, value: Value) -> PathBuf {
        let path = self.path(name);
        fs::write(&path, serde_json::to_vec(&value).expect("json")).expect("write dataset");
        path
    }
}

fn triangle_dataset() -> Value {
    json!([
        { "user_id": "A", "item_id": "x" },
        { "user_id": "A", "item_id": "y" },
        { "user_id": "B", "item_id": "x" },
        { "user_id": "B", "item_id": "z" },
        { "user_id": "C", "item_id": "y" },
        { "user_id": "C", "item_id": "z" }
    ])
}

fn clustered_dataset() -> Value {
    let rows: Vec<Value> = (0..20)
        .flat_map(|user| {
            (0..5).map(move |item| {
                json!({
                    "user_id": format!("u{user}"),
                    "item_id": format!("c{}-{item}", user % 2),
                    "weight": 0.8
                })
            })
        })
        .collect();
    Value::Array(rows)
}

fn json_output(args: &[&str], config: &Path, extra: &[&Path]) -> Value {
    let mut cmd = cargo_bin_cmd!("pathrec");
    cmd.arg("--config").arg(config).args(["--format", "json"]);
    cmd.args(args);
    for path in extra {
        cmd.arg(path);
    }
    let output = cmd.assert().success().get_output().stdout.clone();
    serde_json::from_slice(&output).expect("valid json")
}

#[test]
fn prepare_converts_ratings_to_json() {
    let ws = Workspace::new();
    let ratings = ws.path("ratings.csv");
    fs::write(&ratings, RATINGS).unwrap();
    let out = ws.path("out/dataset.json");

    let mut cmd = cargo_bin_cmd!("pathrec");
    let stdout = cmd
        .args(["--format", "json", "prepare", "--ratings"])
        .arg(&ratings)
        .arg("--out")
        .arg(&out)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let report: Value = serde_json::from_slice(&stdout).expect("valid json");
    assert_eq!(report["rows"], 4);
    assert_eq!(report["interactions"], 3);
    assert_eq!(report["zero_ratings"], 1);

    let written: Value = serde_json::from_slice(&fs::read(&out).unwrap()).unwrap();
    assert_eq!(written[0]["user_id"], "11");
    assert_eq!(written[0]["weight"], 0.9);
}

#[test]
fn prepare_can_anonymize() {
    let ws = Workspace::new();
    let ratings = ws.path("ratings.csv");
    fs::write(&ratings, RATINGS).unwrap();
    let out = ws.path("anon.json");
    cargo_bin_cmd!("pathrec")
        .args(["--quiet", "prepare", "--anonymize", "--ratings"])
        .arg(&ratings)
        .arg("--out")
        .arg(&out)
        .assert()
        .success();
    let written: Value = serde_json::from_slice(&fs::read(&out).unwrap()).unwrap();
    let users: Vec<&str> = written
        .as_array()
        .unwrap()
        .iter()
        .map(|row| row["user_id"].as_str().unwrap())
        .collect();
    assert_eq!(users, vec!["user_0000", "user_0001", "user_0001"]);
}

#[test]
fn recommend_prints_ranked_items() {
    let ws = Workspace::new();
    let dataset = ws.write_dataset("triangle.json", triangle_dataset());
    let report = json_output(
        &["recommend", "--strategy", "baseline", "--user", "A", "--dataset"],
        &ws.config,
        &[&dataset],
    );
    assert_eq!(report["strategy"], "baseline");
    assert_eq!(report["known_user"], true);
    assert_eq!(report["items"][0]["item_id"], "z");
    assert_eq!(report["items"][0]["score"], 2.0);
    assert_eq!(report["items"].as_array().unwrap().len(), 1);
}

#[test]
fn recommend_with_neighbours_detects_first() {
    let ws = Workspace::new();
    let dataset = ws.write_dataset("triangle.json", triangle_dataset());
    let report = json_output(
        &["recommend", "--strategy", "neighbours", "--user", "A", "--dataset"],
        &ws.config,
        &[&dataset],
    );
    assert_eq!(report["items"][0]["item_id"], "z");
}

#[test]
fn recommend_for_unknown_user_is_empty() {
    let ws = Workspace::new();
    let dataset = ws.write_dataset("triangle.json", triangle_dataset());
    let report = json_output(
        &["recommend", "--user", "nobody", "--dataset"],
        &ws.config,
        &[&dataset],
    );
    assert_eq!(report["known_user"], false);
    assert!(report["items"].as_array().unwrap().is_empty());
}

#[test]
fn evaluate_reports_recall() {
    let ws = Workspace::new();
    let dataset = ws.write_dataset("clustered.json", clustered_dataset());
    let report = json_output(
        &["evaluate", "--strategy", "normalized", "--seed", "3", "--dataset"],
        &ws.config,
        &[&dataset],
    );
    assert_eq!(report["dataset_size"], 100);
    assert_eq!(report["test_size"], 10);
    assert_eq!(report["evaluation"]["strategy"], "normalized");
    assert!(report["neighbours"].is_null());
    let correct = report["evaluation"]["correctly_recommended"].as_u64().unwrap();
    let total = report["evaluation"]["total_held_out"].as_u64().unwrap();
    assert_eq!(total, 10);
    assert!(correct <= total);
}

#[test]
fn config_file_selects_the_strategy() {
    let ws = Workspace::new();
    fs::write(
        &ws.config,
        "[scoring]\nstrategy = \"neighbours\"\n\n[neighbours]\nparallel = true\n",
    )
    .unwrap();
    let dataset = ws.write_dataset("clustered.json", clustered_dataset());
    let report = json_output(&["evaluate", "--dataset"], &ws.config, &[&dataset]);
    assert_eq!(report["evaluation"]["strategy"], "neighbours");
    assert_eq!(report["neighbours"]["users"], 20);
}

#[test]
fn invalid_config_is_reported() {
    let ws = Workspace::new();
    fs::write(&ws.config, "[scoring]\ntop_k = 0\n").unwrap();
    let dataset = ws.write_dataset("triangle.json", triangle_dataset());
    let output = cargo_bin_cmd!("pathrec")
        .arg("--config")
        .arg(&ws.config)
        .args(["recommend", "--user", "A", "--dataset"])
        .arg(&dataset)
        .assert()
        .failure()
        .get_output()
        .stderr
        .clone();
    let stderr = String::from_utf8_lossy(&output);
    assert!(stderr.contains("scoring.top_k"), "stderr: {stderr}");
}

#[test]
fn unknown_strategy_is_rejected() {
    let ws = Workspace::new();
    let dataset = ws.write_dataset("triangle.json", triangle_dataset());
    cargo_bin_cmd!("pathrec")
        .arg("--config")
        .arg(&ws.config)
        .args(["recommend", "--strategy", "random", "--user", "A", "--dataset"])
        .arg(&dataset)
        .assert()
        .failure();
}
