use assert_cmd::cargo::{cargo_bin_cmd, CommandCargoExt};
use predicates::prelude::*;
use reqwest::blocking::Client;
use reqwest::redirect::Policy;
use reqwest::StatusCode;
use serde_json::{json, Value};
use std::net::TcpListener;
use std::process::{Child, Command};
use std::thread;
use std::time::Duration;

const CATALOG: &str = "tests/fixtures/catalog.csv";

struct TestDaemon {
    base_url: String,
    child: Child,
}

impl TestDaemon {
    fn spawn() -> Self {
        // Bind an ephemeral port first so we know which port to pass
        // to `gutensuggest serve`.
        let listener =
            TcpListener::bind("127.0.0.1:0").expect("bind ephemeral TCP listener for daemon");
        let addr = listener
            .local_addr()
            .expect("local_addr for daemon listener");
        let port = addr.port();
        drop(listener);

        let addr_arg = format!("127.0.0.1:{port}");
        let base_url = format!("http://{addr_arg}");

        // Capture daemon stdout/stderr to temp files for easier
        // debugging when tests fail.
        let log_dir = std::env::temp_dir();
        let stdout_path = log_dir.join(format!("gutensuggest_daemon_{port}_stdout.log"));
        let stderr_path = log_dir.join(format!("gutensuggest_daemon_{port}_stderr.log"));

        let stdout_file =
            std::fs::File::create(&stdout_path).expect("create daemon stdout log file");
        let stderr_file =
            std::fs::File::create(&stderr_path).expect("create daemon stderr log file");

        let mut cmd = Command::cargo_bin("gutensuggest").expect("locate gutensuggest binary");
        cmd.args([
            "serve",
            "--addr",
            &addr_arg,
            "--catalog",
            CATALOG,
            "--library-url",
            "https://www.gutenberg.org",
        ])
        .stdout(stdout_file)
        .stderr(stderr_file);
        let child = cmd.spawn().expect("spawn gutensuggest serve daemon");

        wait_for_health(&base_url);

        Self { base_url, child }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl Drop for TestDaemon {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

fn wait_for_health(base_url: &str) {
    let client = Client::new();
    let url = format!("{}/v1/health", base_url);

    let mut last_err = None;
    for _ in 0..150 {
        match client.get(&url).send() {
            Ok(resp) if resp.status().is_success() => return,
            Err(e) => {
                last_err = Some(format!("HTTP error: {}", e));
                thread::sleep(Duration::from_millis(100));
            }
            Ok(resp) => {
                last_err = Some(format!("unexpected status: {}", resp.status()));
                thread::sleep(Duration::from_millis(100));
            }
        }
    }

    panic!(
        "gutensuggest HTTP daemon did not become healthy in time. Last error: {}",
        last_err.unwrap_or_else(|| "unknown".to_string())
    );
}

fn displays(value: &Value) -> Vec<&str> {
    value["suggestions"]
        .as_array()
        .expect("suggestions array")
        .iter()
        .map(|s| s["display"].as_str().unwrap_or_default())
        .collect()
}

#[test]
fn cli_serve_health_endpoint_reports_ok_status() {
    let daemon = TestDaemon::spawn();
    let client = Client::new();

    let resp = client
        .get(daemon.url("/v1/health"))
        .send()
        .expect("health response");
    assert!(
        resp.status().is_success(),
        "health endpoint should return success status"
    );

    let value: Value = resp.json().expect("valid health JSON body");
    assert_eq!(value["status"], "ok");
}

#[test]
fn cli_serve_index_page_is_html() {
    let daemon = TestDaemon::spawn();
    let resp = Client::new()
        .get(daemon.url("/"))
        .send()
        .expect("index response");
    assert!(resp.status().is_success());
    let body = resp.text().expect("index body");
    assert!(body.contains("<html"));
}

#[test]
fn suggest_endpoint_accepts_query_string_and_json() {
    let daemon = TestDaemon::spawn();
    let client = Client::new();

    let from_query: Value = client
        .get(daemon.url("/v1/suggest"))
        .query(&[("query", "napoléon"), ("mode", "prefix"), ("field", "title")])
        .send()
        .expect("GET suggest")
        .json()
        .expect("GET suggest JSON");
    assert_eq!(displays(&from_query), vec!["Napoléon et la campagne de Russie"]);

    let from_json: Value = client
        .post(daemon.url("/v1/suggest"))
        .json(&json!({ "query": "^M(?:.*\\d+.*)+", "mode": "regex" }))
        .send()
        .expect("POST suggest")
        .json()
        .expect("POST suggest JSON");
    assert_eq!(displays(&from_json), vec!["M16 Rifle Manual"]);
}

#[test]
fn suggest_endpoint_never_fails_on_bad_regex() {
    let daemon = TestDaemon::spawn();
    let resp = Client::new()
        .get(daemon.url("/v1/suggest"))
        .query(&[("query", "(unclosed"), ("mode", "regex")])
        .send()
        .expect("GET suggest");
    assert_eq!(resp.status(), StatusCode::OK);

    let value: Value = resp.json().expect("suggest JSON");
    assert!(displays(&value).is_empty());
}

#[test]
fn resolve_and_go_endpoints_point_at_gutenberg() {
    let daemon = TestDaemon::spawn();
    let client = Client::builder()
        .redirect(Policy::none())
        .build()
        .expect("client");

    let resolved: Value = client
        .get(daemon.url("/v1/resolve"))
        .query(&[("query", "Treasure Island")])
        .send()
        .expect("resolve")
        .json()
        .expect("resolve JSON");
    assert_eq!(resolved["ok"], true);
    assert_eq!(resolved["url"], "https://www.gutenberg.org/ebooks/120");

    let fallback = client
        .get(daemon.url("/go"))
        .query(&[("query", "treasure isl")])
        .send()
        .expect("go");
    assert_eq!(fallback.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        fallback.headers()["location"],
        "https://www.gutenberg.org/ebooks/search/?query=treasure+isl"
    );

    let empty = client
        .get(daemon.url("/v1/resolve"))
        .query(&[("query", "")])
        .send()
        .expect("empty resolve");
    assert_eq!(empty.status(), StatusCode::BAD_REQUEST);
    let error: Value = empty.json().expect("error JSON");
    assert!(error["error"].as_str().unwrap_or_default().contains("empty"));
}

#[test]
fn catalog_info_reports_fixture_counts() {
    let daemon = TestDaemon::spawn();
    let info: Value = Client::new()
        .get(daemon.url("/v1/catalog/info"))
        .send()
        .expect("info")
        .json()
        .expect("info JSON");
    assert_eq!(info["titles"], 11);
    assert_eq!(info["authors"], 12);
    assert!(info["loaded_at"].is_string());
}

#[test]
fn cli_suggest_via_server_matches_local_suggest() {
    let daemon = TestDaemon::spawn();

    let mut local_cmd = cargo_bin_cmd!("gutensuggest");
    local_cmd.env_remove("GUTENSUGGEST_SERVER_URL");
    local_cmd.args(["suggest", "and", "--catalog", CATALOG, "--format", "json"]);
    let local_assert = local_cmd.assert().success();
    let local_value: Value =
        serde_json::from_slice(&local_assert.get_output().stdout).expect("valid local json");

    let mut server_cmd = cargo_bin_cmd!("gutensuggest");
    server_cmd.env("GUTENSUGGEST_SERVER_URL", &daemon.base_url);
    server_cmd.args(["suggest", "and", "--format", "json"]);
    let server_assert = server_cmd.assert().success();
    let server_value: Value =
        serde_json::from_slice(&server_assert.get_output().stdout).expect("valid server json");

    assert_eq!(
        local_value, server_value,
        "server-backed suggestions should match local suggestions"
    );
}

#[test]
fn cli_resolve_via_server_prints_url() {
    let daemon = TestDaemon::spawn();

    let mut cmd = cargo_bin_cmd!("gutensuggest");
    cmd.args([
        "resolve",
        "Ulysses",
        "--server",
        &daemon.base_url,
    ]);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("https://www.gutenberg.org/ebooks/4300"));
}

#[test]
fn cli_serve_fails_without_catalog() {
    let mut cmd = cargo_bin_cmd!("gutensuggest");
    cmd.args([
        "serve",
        "--addr",
        "127.0.0.1:0",
        "--catalog",
        "definitely/does/not/exist.csv",
    ]);
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("cannot start without a catalog"));
}
