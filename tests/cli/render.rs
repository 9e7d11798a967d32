//! Tests for `vault-render render`.

use crate::support::*;
use serde_json::json;

#[test]
fn test_render_scenario() {
    let vault = MockVault::start();
    vault.renewal_ok();
    vault.kv2("secret/app/db", json!({"username": "admin", "password": "p@ss"}));
    vault.kv2("secret/app/api", json!({"my_api_key": "XYZ"}));

    let t = Test::with_template("app.conf", SCENARIO_TEMPLATE);
    let output = t.render(&vault, "app.conf", "secret/app/db,secret/app/api");

    assert_success(&output);
    assert_eq!(t.read("app.conf"), SCENARIO_RENDERED);
    assert_stdout_contains(&output, "rendered");
    assert_stderr_contains(&output, "NOPE");
}

#[test]
fn test_render_later_path_wins() {
    let vault = MockVault::start();
    vault.renewal_ok();
    vault.kv2("secret/a", json!({"DB_HOST": "a"}));
    vault.kv2("secret/b", json!({"DB_HOST": "b"}));

    let t = Test::with_template("db.conf", "host=%DB_HOST%\n");
    assert_success(&t.render(&vault, "db.conf", "secret/a,secret/b"));
    assert_eq!(t.read("db.conf"), "host=b\n");

    let t = Test::with_template("db.conf", "host=%DB_HOST%\n");
    assert_success(&t.render(&vault, "db.conf", "secret/b,secret/a"));
    assert_eq!(t.read("db.conf"), "host=a\n");
}

#[test]
fn test_render_fetches_paths_in_order() {
    let vault = MockVault::start();
    vault.renewal_ok();
    vault.kv2("secret/one", json!({"A": "1"}));
    vault.kv2("secret/two", json!({"B": "2"}));
    vault.kv2("secret/three", json!({"C": "3"}));

    let t = Test::with_template("t.txt", "%A%%B%%C%");
    assert_success(&t.render(&vault, "t.txt", "secret/two, secret/three ,secret/one"));
    assert_eq!(t.read("t.txt"), "123");
    assert_eq!(
        vault.fetched(),
        vec![
            "/v1/secret/data/two",
            "/v1/secret/data/three",
            "/v1/secret/data/one"
        ]
    );
}

#[test]
fn test_render_multiline_job_spec() {
    let vault = MockVault::start();
    vault.renewal_ok();
    vault.kv2(
        "secret/nomad/api",
        json!({"DB_HOST": "db.internal", "DB_PASSWORD": "p&ss\\1$0", "TLS_KEY": PEM_KEY}),
    );

    let t = Test::with_template("api.nomad", JOB_TEMPLATE);
    assert_success(&t.render(&vault, "api.nomad", "secret/nomad/api"));

    let expected = JOB_TEMPLATE
        .replace("%DB_HOST%", "db.internal")
        .replace("%DB_PASSWORD%", "p&ss\\1$0")
        .replace("%TLS_KEY%", PEM_KEY);
    assert_eq!(t.read("api.nomad"), expected);
}

#[test]
fn test_render_keeps_escaped_newline_literal() {
    let vault = MockVault::start();
    vault.renewal_ok();
    vault.kv2("secret/cert", json!({"CERT": "line1\\nline2"}));

    let t = Test::with_template("c.txt", "cert=%CERT%");
    assert_success(&t.render(&vault, "c.txt", "secret/cert"));
    assert_eq!(t.read("c.txt"), "cert=line1\\nline2");
}

#[test]
fn test_render_kv_v1() {
    let vault = MockVault::start();
    vault.renewal_ok();
    vault.kv1("kv/app", json!({"API_KEY": "v1-key"}));

    let t = Test::with_template("t.txt", "key=%API_KEY%");
    let output = t
        .cmd_for(&vault)
        .args(["render", "-t", "t.txt", "-s", "kv/app", "--kv-version", "1"])
        .output()
        .unwrap();
    assert_success(&output);
    assert_eq!(t.read("t.txt"), "key=v1-key");
    assert_eq!(vault.fetched(), vec!["/v1/kv/app"]);
}

#[test]
fn test_render_from_environment() {
    let vault = MockVault::start();
    vault.renewal_ok();
    vault.kv2("secret/app", json!({"K": "v"}));

    let t = Test::with_template("t.txt", "%K%");
    let output = t
        .cmd_for(&vault)
        .env("VAULT_RENDER_TEMPLATE", "t.txt")
        .env("VAULT_RENDER_SECRETS", "secret/app")
        .env("VAULT_RENDER_KV_VERSION", "2")
        .arg("render")
        .output()
        .unwrap();
    assert_success(&output);
    assert_eq!(t.read("t.txt"), "v");
}

#[test]
fn test_render_from_config_file() {
    let vault = MockVault::start();
    vault.renewal_ok();
    vault.kv2("secret/app", json!({"K": "from-file"}));

    let t = Test::with_template("t.txt", "%K%");
    t.write(
        ".vault-render.toml",
        &format!(
            "address = \"{}\"\ntemplate = \"t.txt\"\nsecrets = [\"secret/app\"]\n",
            vault.uri()
        ),
    );
    let output = t
        .cmd()
        .env("VAULT_TOKEN", TOKEN)
        .arg("render")
        .output()
        .unwrap();
    assert_success(&output);
    assert_eq!(t.read("t.txt"), "from-file");
}

#[test]
fn test_render_continues_when_renewal_denied() {
    let vault = MockVault::start();
    vault.renewal_denied();
    vault.kv2("secret/app", json!({"K": "v"}));

    let t = Test::with_template("t.txt", "%K%");
    let output = t.render(&vault, "t.txt", "secret/app");
    assert_success(&output);
    assert_stderr_contains(&output, "permission denied");
    assert_eq!(t.read("t.txt"), "v");
}

#[test]
fn test_render_sends_namespace_header() {
    let vault = MockVault::start();
    vault.renewal_ok();
    vault.kv2("secret/app", json!({"K": "v"}));

    let t = Test::with_template("t.txt", "%K%");
    let output = t
        .cmd_for(&vault)
        .env("VAULT_NAMESPACE", "team-a")
        .args(["render", "-t", "t.txt", "-s", "secret/app"])
        .output()
        .unwrap();
    assert_success(&output);

    let requests = vault.requests();
    assert!(!requests.is_empty());
    for request in requests {
        let ns = request.headers.get("X-Vault-Namespace").unwrap();
        assert_eq!(ns.to_str().unwrap(), "team-a");
    }
}

#[test]
fn test_render_leaves_no_artifacts() {
    let vault = MockVault::start();
    vault.renewal_ok();
    vault.kv2("secret/app", json!({"K": "v"}));

    let t = Test::with_template("t.txt", "%K%");
    let output = t
        .cmd_for(&vault)
        .args(["render", "-t", "t.txt", "-s", "secret/app", "--work-dir", "."])
        .output()
        .unwrap();
    assert_success(&output);
    assert_eq!(t.entries(), vec!["t.txt"]);
}

#[test]
fn test_render_never_prints_values() {
    let vault = MockVault::start();
    vault.renewal_ok();
    vault.kv2("secret/app", json!({"PASSWORD": "hunter2-very-secret"}));

    let t = Test::with_template("t.txt", "%PASSWORD%");
    let output = t
        .cmd_for(&vault)
        .args(["--verbose", "render", "-t", "t.txt", "-s", "secret/app"])
        .env("VAULT_RENDER_LOG", "vault_render=trace")
        .output()
        .unwrap();
    assert_success(&output);
    assert_output_excludes(&output, "hunter2-very-secret");
    assert_output_excludes(&output, TOKEN);
}

#[test]
fn test_render_without_placeholders_leaves_file() {
    let vault = MockVault::start();
    vault.renewal_ok();
    vault.kv2("secret/app", json!({"K": "v"}));

    let t = Test::with_template("t.txt", "plain text, 100% static\n");
    let output = t.render(&vault, "t.txt", "secret/app");
    assert_success(&output);
    assert_stdout_contains(&output, "unchanged");
    assert_eq!(t.read("t.txt"), "plain text, 100% static\n");
}

#[cfg(unix)]
#[test]
fn test_render_interrupt_removes_assignment_log() {
    use std::process::{Command, Stdio};
    use std::thread;
    use std::time::{Duration, Instant};

    let vault = MockVault::start();
    vault.renewal_ok();
    vault.kv2_delayed("secret/slow", json!({"K": "v"}), Duration::from_secs(10));

    let t = Test::with_template("t.txt", "x=%K%");
    let mut child = t
        .process_for(&vault)
        .args(["render", "--template", "t.txt", "--secrets", "secret/slow", "--work-dir", "."])
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .expect("failed to spawn vault-render");

    // The log appears next to the template once the fetch has started.
    let deadline = Instant::now() + Duration::from_secs(5);
    while t.entries().len() < 2 {
        assert!(Instant::now() < deadline, "assignment log never appeared");
        thread::sleep(Duration::from_millis(20));
    }
    thread::sleep(Duration::from_millis(300));

    let sent = Command::new("kill")
        .args(["-INT", &child.id().to_string()])
        .status()
        .expect("failed to run kill");
    assert!(sent.success());

    let status = child.wait().expect("failed to wait for vault-render");
    assert_eq!(status.code(), Some(130));
    assert_eq!(t.entries(), vec!["t.txt"]);
    assert_eq!(t.read("t.txt"), "x=%K%");
}
