//! Integration tests for the plugin-config binary.

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use tempfile::TempDir;

fn cmd(dir: &TempDir) -> Command {
    let mut cmd = cargo_bin_cmd!("plugin-config");
    cmd.env_remove("RUST_LOG")
        .env_remove("PLUGIN_CONFIG")
        .env_remove("PLUGIN_CONFIG_NEXT_GEN")
        .env_remove("PLUGIN_CONFIG_METADATA")
        .env_remove("PLUGIN_CONFIG_DIR")
        .env("PLUGIN_CONFIG_LOCK_TIMEOUT_SECS", "30")
        .arg("--config-dir")
        .arg(dir.path());
    cmd
}

fn seed_contexts(dir: &TempDir) {
    std::fs::write(
        dir.path().join("config-ng.yaml"),
        "contexts:\n- name: k1\n  target: kubernetes\n  clusterOpts:\n    path: /kube\n- name: t1\n  contextType: tanzu\ncurrentContext:\n  kubernetes: k1\n",
    )
    .unwrap();
}

#[test]
fn test_schema_outputs_valid_json() {
    let temp = TempDir::new().unwrap();
    cmd(&temp)
        .arg("schema")
        .assert()
        .success()
        .stdout(
            predicate::str::contains("\"$defs\"").or(predicate::str::contains("\"definitions\"")),
        )
        .stdout(predicate::str::contains("ClientConfig"));
}

#[test]
fn test_env_set_get_list_unset() {
    let temp = TempDir::new().unwrap();

    cmd(&temp).args(["env", "set", "REGION", "eu"]).assert().success();
    cmd(&temp)
        .args(["env", "get", "REGION"])
        .assert()
        .success()
        .stdout("eu\n");
    cmd(&temp)
        .args(["env", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("REGION: eu"));
    cmd(&temp).args(["env", "unset", "REGION"]).assert().success();
    cmd(&temp)
        .args(["env", "get", "REGION"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn test_repeated_set_reports_unchanged() {
    let temp = TempDir::new().unwrap();
    cmd(&temp)
        .args(["feature", "set", "global", "flag", "true"])
        .assert()
        .success();
    cmd(&temp)
        .args(["feature", "set", "global", "flag", "true"])
        .assert()
        .success()
        .stderr(predicate::str::contains("unchanged"));
    cmd(&temp)
        .args(["feature", "get", "global", "flag"])
        .assert()
        .success()
        .stdout("true\n");
}

#[test]
fn test_context_use_switches_and_evicts() {
    let temp = TempDir::new().unwrap();
    seed_contexts(&temp);

    cmd(&temp)
        .args(["context", "get", "--type", "kubernetes"])
        .assert()
        .success()
        .stdout(predicate::str::contains("name: k1"));

    cmd(&temp).args(["context", "use", "t1"]).assert().success();

    cmd(&temp)
        .args(["context", "list", "--current"])
        .assert()
        .success()
        .stdout(predicate::str::contains("tanzu:"))
        .stdout(predicate::str::contains("kubernetes:").not());
}

#[test]
fn test_context_list_includes_server_only_records() {
    let temp = TempDir::new().unwrap();
    std::fs::write(
        temp.path().join("config.yaml"),
        "servers:\n- name: legacy\n  type: managementcluster\n",
    )
    .unwrap();

    cmd(&temp)
        .args(["context", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("name: legacy"));
    cmd(&temp)
        .args(["server", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("type: managementcluster"));
}

#[test]
fn test_context_delete_missing_fails() {
    let temp = TempDir::new().unwrap();
    cmd(&temp)
        .args(["context", "delete", "ghost"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("ghost"));
}

#[test]
fn test_validate_reports_warnings() {
    let temp = TempDir::new().unwrap();
    seed_contexts(&temp);

    // k1 is server-representable but has no server record
    cmd(&temp)
        .arg("validate")
        .assert()
        .success()
        .stdout(predicate::str::contains("contexts.server_missing"));
}

#[test]
fn test_validate_empty_config_is_valid() {
    let temp = TempDir::new().unwrap();
    cmd(&temp)
        .arg("validate")
        .assert()
        .success()
        .stdout(predicate::str::contains("Configuration is valid"));
    assert!(!temp.path().join("config.yaml").exists());
}

#[test]
fn test_discovery_list_and_delete() {
    let temp = TempDir::new().unwrap();
    std::fs::write(
        temp.path().join("config.yaml"),
        "clientOptions:\n  cli:\n    discoverySources:\n    - oci:\n        name: default\n        image: registry/plugins:v1\n",
    )
    .unwrap();

    cmd(&temp)
        .args(["discovery", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("image: registry/plugins:v1"));
    cmd(&temp)
        .args(["discovery", "delete", "default"])
        .assert()
        .success();
    cmd(&temp)
        .args(["discovery", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("default").not());
}

#[test]
fn test_lock_timeout_exits_with_fatal_status() {
    let temp = TempDir::new().unwrap();
    // The test process holds the lock; the child has to give up
    let store = plugin_config_store(&temp);
    let _guard = store.acquire_lock().unwrap();

    cmd(&temp)
        .env("PLUGIN_CONFIG_LOCK_TIMEOUT_SECS", "1")
        .args(["env", "set", "KEY", "value"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("waiting for config lock"));
}

#[test]
fn test_parallel_processes_do_not_lose_writes() {
    let temp = TempDir::new().unwrap();
    let writers = 6;

    std::thread::scope(|s| {
        for w in 0..writers {
            let temp = &temp;
            s.spawn(move || {
                cmd(temp)
                    .args(["env", "set", &format!("PROC_{w}"), "set"])
                    .assert()
                    .success();
            });
        }
    });

    let out = cmd(&temp).args(["env", "list"]).assert().success();
    let stdout = String::from_utf8_lossy(&out.get_output().stdout).to_string();
    for w in 0..writers {
        assert!(stdout.contains(&format!("PROC_{w}: set")), "lost PROC_{w}:\n{stdout}");
    }
}

fn plugin_config_store(dir: &TempDir) -> plugin_config::ConfigStore {
    plugin_config::ConfigStore::builder()
        .config_dir(dir.path())
        .build()
        .unwrap()
}
