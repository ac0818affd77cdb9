use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use tempfile::TempDir;

fn write_resource(dir: &TempDir, name: &str, domains: &[&str]) -> std::path::PathBuf {
    let domains = domains
        .iter()
        .map(|d| format!("\"{}\"", d))
        .collect::<Vec<_>>()
        .join(", ");
    let content = format!(
        "certificate_authority = \"lets-encrypt\"\ndomains = [{}]\nforce_destroy = true\n",
        domains
    );
    let path = dir.path().join(name);
    fs::write(&path, content).expect("write resource");
    path
}

#[test]
fn config_init_writes_example_file() {
    let dir = TempDir::new().expect("temp dir");
    let config_path = dir.path().join("fastly-tls.toml");

    let mut cmd = cargo_bin_cmd!("fastly-tls");
    cmd.args(["config", "init", "--path"])
        .arg(&config_path)
        .assert()
        .success();

    let content = fs::read_to_string(&config_path).expect("read config");
    assert!(content.contains("api_key_env = \"FASTLY_API_KEY\""));
    assert!(content.contains("state_dir"));
}

#[test]
fn config_init_refuses_to_overwrite() {
    let dir = TempDir::new().expect("temp dir");
    let config_path = dir.path().join("fastly-tls.toml");
    fs::write(&config_path, "# mine\n").expect("write config");

    let mut cmd = cargo_bin_cmd!("fastly-tls");
    cmd.args(["config", "init", "--path"])
        .arg(&config_path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("--force"));
}

#[test]
fn schema_outputs_valid_json() {
    let mut cmd = cargo_bin_cmd!("fastly-tls");
    let output = cmd.arg("schema").output().expect("run schema");

    assert!(output.status.success());

    let value: Value = serde_json::from_slice(&output.stdout).expect("valid json");
    assert_eq!(value["type_name"], "fastly_tls_subscription");
    assert!(value["attributes"].as_array().is_some_and(|a| !a.is_empty()));
}

#[test]
fn plan_fails_on_uppercase_domain() {
    let dir = TempDir::new().expect("temp dir");
    let resource = write_resource(&dir, "tls.toml", &["Example.com"]);

    let mut cmd = cargo_bin_cmd!("fastly-tls");
    cmd.current_dir(dir.path())
        .args(["plan", "--resource"])
        .arg(&resource)
        .assert()
        .failure()
        .stderr(predicate::str::contains("uppercase"));
}

#[test]
fn plan_without_state_creates() {
    let dir = TempDir::new().expect("temp dir");
    let resource = write_resource(&dir, "tls.toml", &["example.com"]);

    let mut cmd = cargo_bin_cmd!("fastly-tls");
    let output = cmd
        .current_dir(dir.path())
        .args(["plan", "--json", "--resource"])
        .arg(&resource)
        .output()
        .expect("run plan");

    assert!(output.status.success());

    let value: Value = serde_json::from_slice(&output.stdout).expect("valid json");
    assert_eq!(value["action"], "create");
}

#[test]
fn apply_with_memory_provider_writes_state() {
    let dir = TempDir::new().expect("temp dir");
    let resource = write_resource(&dir, "tls.toml", &["example.com", "www.example.com"]);
    let state = dir.path().join("state.json");

    let mut cmd = cargo_bin_cmd!("fastly-tls");
    cmd.current_dir(dir.path())
        .env("FASTLY_TLS__API__PROVIDER", "memory")
        .args(["apply", "--resource"])
        .arg(&resource)
        .arg("--state")
        .arg(&state)
        .assert()
        .success()
        .stdout(predicate::str::contains("Applied TLS subscription"));

    let content = fs::read_to_string(&state).expect("read state");
    let value: Value = serde_json::from_str(&content).expect("valid state json");
    assert_eq!(value["state"], "pending");
    assert_eq!(value["certificate_authority"], "lets-encrypt");
    assert_eq!(value["domains"].as_array().map(Vec::len), Some(2));
    assert_eq!(value["force_destroy"], true);

    let mut show = cargo_bin_cmd!("fastly-tls");
    show.current_dir(dir.path())
        .args(["show", "--flat", "--state"])
        .arg(&state)
        .assert()
        .success()
        .stdout(predicate::str::contains("domains.# = 2"));
}

#[test]
fn memory_provider_keeps_subscription_across_commands() {
    let dir = TempDir::new().expect("temp dir");
    let resource = write_resource(&dir, "tls.toml", &["example.com"]);
    let state = dir.path().join("s.json");

    let mut apply = cargo_bin_cmd!("fastly-tls");
    apply
        .current_dir(dir.path())
        .env("FASTLY_TLS__API__PROVIDER", "memory")
        .args(["apply", "--resource"])
        .arg(&resource)
        .arg("--state")
        .arg(&state)
        .assert()
        .success();

    let applied: Value =
        serde_json::from_str(&fs::read_to_string(&state).expect("read state")).expect("json");
    let id = applied["id"].as_str().expect("id").to_string();
    assert!(dir.path().join("memory-api.json").exists());

    let mut refresh = cargo_bin_cmd!("fastly-tls");
    refresh
        .current_dir(dir.path())
        .env("FASTLY_TLS__API__PROVIDER", "memory")
        .args(["refresh", "--state"])
        .arg(&state)
        .assert()
        .success()
        .stderr(predicate::str::contains("not found").not());

    let refreshed: Value =
        serde_json::from_str(&fs::read_to_string(&state).expect("state kept")).expect("json");
    assert_eq!(refreshed["id"], id.as_str());

    let mut reapply = cargo_bin_cmd!("fastly-tls");
    reapply
        .current_dir(dir.path())
        .env("FASTLY_TLS__API__PROVIDER", "memory")
        .args(["apply", "--resource"])
        .arg(&resource)
        .arg("--state")
        .arg(&state)
        .assert()
        .success()
        .stdout(predicate::str::contains("No changes"));

    let mut destroy = cargo_bin_cmd!("fastly-tls");
    destroy
        .current_dir(dir.path())
        .env("FASTLY_TLS__API__PROVIDER", "memory")
        .args(["destroy", "--state"])
        .arg(&state)
        .assert()
        .success()
        .stdout(predicate::str::contains(id.as_str()));

    assert!(!state.exists());
    let store = fs::read_to_string(dir.path().join("memory-api.json")).expect("read store");
    assert!(!store.contains(id.as_str()));
}

#[test]
fn destroy_without_state_fails() {
    let dir = TempDir::new().expect("temp dir");

    let mut cmd = cargo_bin_cmd!("fastly-tls");
    cmd.current_dir(dir.path())
        .env("FASTLY_TLS__API__PROVIDER", "memory")
        .arg("destroy")
        .assert()
        .failure()
        .stderr(predicate::str::contains("No state found"));
}
