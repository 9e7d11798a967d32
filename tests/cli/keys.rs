//! Tests for `vault-render keys`.

use crate::support::*;
use serde_json::{json, Value};

#[test]
fn test_keys_lists_names_and_sources() {
    let vault = MockVault::start();
    vault.kv2("secret/a", json!({"DB_HOST": "a", "DB_USER": "app"}));
    vault.kv2("secret/b", json!({"DB_HOST": "b"}));

    let t = Test::new();
    let output = t.keys(&vault, "secret/a,secret/b");
    assert_success(&output);

    let out = stdout(&output);
    assert!(out.contains("DB_HOST  secret/b"), "got: {}", out);
    assert!(out.contains("DB_USER  secret/a"), "got: {}", out);
    assert!(out.contains("1 key(s) overridden"), "got: {}", out);
    assert_output_excludes(&output, "app\n");
}

#[test]
fn test_keys_json() {
    let vault = MockVault::start();
    vault.kv2("secret/a", json!({"API_KEY": "sk-live-123"}));

    let t = Test::new();
    let output = t
        .cmd_for(&vault)
        .args(["keys", "-s", "secret/a", "--json"])
        .output()
        .unwrap();
    assert_success(&output);

    let parsed: Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(parsed, json!([{"key": "API_KEY", "path": "secret/a"}]));
    assert_output_excludes(&output, "sk-live-123");
}

#[test]
fn test_keys_does_not_renew_token() {
    let vault = MockVault::start();
    vault.kv2("secret/a", json!({"A": "1"}));

    let t = Test::new();
    assert_success(&t.keys(&vault, "secret/a"));
    assert!(vault
        .requests()
        .iter()
        .all(|r| r.url.path() != "/v1/auth/token/renew-self"));
}

#[test]
fn test_keys_empty_record() {
    let vault = MockVault::start();
    vault.kv2("secret/empty", json!({}));

    let t = Test::new();
    let output = t.keys(&vault, "secret/empty");
    assert_success(&output);
    assert_stdout_contains(&output, "no secrets found");
}
