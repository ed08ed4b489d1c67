//! Runs the `wl` binary against a scratch store.

use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

struct Sandbox {
    dir: TempDir,
}

impl Sandbox {
    fn new() -> Self {
        Self {
            dir: TempDir::new().expect("sandbox dir"),
        }
    }

    fn root(&self) -> &Path {
        self.dir.path()
    }

    fn store(&self) -> PathBuf {
        self.root().join("wishes_data.json")
    }

    fn wl(&self) -> Command {
        let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("wl");
        cmd.current_dir(self.root());
        cmd.env("WL_DATA_DIR", self.root().join("data"));
        cmd.env("WL_CONFIG_DIR", self.root().join("config"));
        cmd.env("WL_SHARE_BASE_URL", "https://wishes.example.app");
        cmd.env_remove("WL_STORE_PATH");
        cmd.env_remove("LOG");
        cmd.arg("--store").arg(self.store());
        cmd
    }

    fn json(&self, args: &[&str]) -> serde_json::Value {
        let output = self.wl().args(args).arg("--json").output().expect("run wl");
        serde_json::from_slice(&output.stdout).expect("json output")
    }
}

#[test]
fn score_reports_label_and_starting_probability() {
    let sandbox = Sandbox::new();
    sandbox
        .wl()
        .args(["score", "I wish to learn Spanish in 2026"])
        .assert()
        .success()
        .stdout(predicate::str::contains("POSITIVE (0.85)"))
        .stdout(predicate::str::contains("Starting probability: 77.0%"));
    assert!(!sandbox.store().exists());
}

#[test]
fn submit_show_support_round_trip() {
    let sandbox = Sandbox::new();

    let created = sandbox.json(&["submit", "I", "wish", "to", "travel", "the", "world"]);
    assert_eq!(created["status"], "created");
    assert_eq!(created["saved"], true);
    let id = created["wish_id"].as_str().expect("wish id").to_string();
    let initial = created["record"]["initial_probability"]
        .as_f64()
        .expect("probability");
    assert!(
        created["share_url"]
            .as_str()
            .expect("share url")
            .starts_with("https://wishes.example.app/?wish_id=")
    );

    sandbox
        .wl()
        .args(["show", &id])
        .assert()
        .success()
        .stdout(predicate::str::contains("Wish: I wish to travel the world"))
        .stdout(predicate::str::contains("0 supporters"));

    let first = sandbox.json(&["support", &id, "--supporter", "alice", "--increment", "5"]);
    assert_eq!(first["status"], "accepted");
    assert!((first["probability"].as_f64().expect("p") - (initial + 5.0)).abs() < 1e-9);

    let again = sandbox.json(&["support", &id, "--supporter", "alice", "--increment", "7"]);
    assert_eq!(again["status"], "already_supported");
    assert_eq!(again["accepted"], false);
    assert_eq!(again["probability"], first["probability"]);

    let shown = sandbox.json(&["show", &id]);
    assert_eq!(shown["record"]["supporters"], serde_json::json!(["alice"]));
    assert_eq!(shown["record"]["version"], 2);
}

#[test]
fn negative_wish_is_rejected_with_tips() {
    let sandbox = Sandbox::new();
    sandbox
        .wl()
        .args(["submit", "I don't want to fail, I am stressed and sad"])
        .assert()
        .code(4)
        .stdout(predicate::str::contains("does not read like a wish"))
        .stdout(predicate::str::contains("I wish"));
    assert!(!sandbox.store().exists());
}

#[test]
fn short_wish_is_an_error() {
    let sandbox = Sandbox::new();
    sandbox
        .wl()
        .args(["submit", "hi"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("at least 4"));
}

#[test]
fn missing_wish_exits_not_found() {
    let sandbox = Sandbox::new();
    sandbox
        .wl()
        .args(["show", "nonexistent"])
        .assert()
        .code(3)
        .stdout(predicate::str::contains("Wish not found"));

    let support = sandbox.json(&["support", "nonexistent", "--supporter", "carol"]);
    assert_eq!(support["status"], "not_found");
    assert_eq!(support["accepted"], false);
    assert_eq!(support["probability"], 0.0);
}

#[test]
fn share_link_rebuilds_wish_in_empty_store() {
    let origin = Sandbox::new();
    let created = origin.json(&["submit", "I hope to plant a forest"]);
    let id = created["wish_id"].as_str().expect("wish id").to_string();

    let link_output = origin
        .wl()
        .args(["share", &id])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let link = String::from_utf8(link_output).expect("utf8");
    let link = link.trim();
    assert!(link.contains("wish=I+hope+to+plant+a+forest"));

    let elsewhere = Sandbox::new();
    let visited = elsewhere.json(&["visit", link]);
    assert_eq!(visited["status"], "bootstrapped");
    assert_eq!(visited["wish_id"], id.as_str());
    assert_eq!(visited["record"]["wish_text"], "I hope to plant a forest");

    let again = elsewhere.json(&["visit", link]);
    assert_eq!(again["status"], "found");
}

#[test]
fn generated_supporters_each_count() {
    let sandbox = Sandbox::new();
    let created = sandbox.json(&["submit", "I want to finish my novel"]);
    let id = created["wish_id"].as_str().expect("wish id").to_string();

    let a = sandbox.json(&["support", &id]);
    let b = sandbox.json(&["support", &id]);
    assert_eq!(a["status"], "accepted");
    assert_eq!(b["status"], "accepted");
    assert_ne!(a["supporter"], b["supporter"]);

    let list = sandbox.json(&["list"]);
    assert_eq!(list[&id]["supporters"].as_array().map(Vec::len), Some(2));
}

#[test]
fn first_run_writes_user_config_and_reads_project_layer() {
    let sandbox = Sandbox::new();
    std::fs::write(sandbox.root().join("wishes.toml"), "[wish]\nmin_chars = 12\n")
        .expect("project config");

    sandbox
        .wl()
        .args(["submit", "I hope so"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("at least 12"));
    assert!(sandbox.root().join("config").join("config.toml").exists());

    std::fs::write(sandbox.root().join("config").join("config.toml"), "[store\n")
        .expect("break user config");
    sandbox
        .wl()
        .args(["score", "I wish to learn Spanish in 2026"])
        .assert()
        .success()
        .stderr(predicate::str::contains("config:"));
}
