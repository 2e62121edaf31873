use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

fn lease_binary() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // remove test binary name
    path.pop(); // remove deps/
    path.push("lease");
    path
}

fn setup_test_env() -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();

    let config_dir = root.join("config");
    fs::create_dir_all(&config_dir).unwrap();

    // Contract corpus: Store A has an end date but no area, Store B the
    // opposite, and one record is deliberately sparse.
    let contracts_dir = root.join("contratos");
    fs::create_dir_all(&contracts_dir).unwrap();
    fs::write(
        contracts_dir.join("loja_a.json"),
        r#"{
            "loja": { "nome_fantasia": "Loja A", "cnpj": "11.111.111/0001-11" },
            "contratos": [{
                "numero_contrato": "CT-0001",
                "objeto": { "piso": "L1", "loja": "101" },
                "vigencia": { "data_inicial": "2021-01-01", "data_final": "2026-01-01" }
            }]
        }"#,
    )
    .unwrap();
    fs::write(
        contracts_dir.join("loja_b.json"),
        r#"{
            "loja": { "nome_fantasia": "Loja B", "cnpj": "22.222.222/0001-22" },
            "contratos": [{
                "numero_contrato": "CT-0002",
                "objeto": { "area_privativa": "120", "piso": "L2", "loja": "205" }
            }]
        }"#,
    )
    .unwrap();
    fs::write(contracts_dir.join("loja_c.json"), r#"{ "loja": {} }"#).unwrap();

    let config_content = format!(
        r#"[db]
path = "{}/data/lease.sqlite"

[retrieval]
general_k = 100
"#,
        root.display()
    );

    let config_path = config_dir.join("lease.toml");
    fs::write(&config_path, config_content).unwrap();

    (tmp, config_path)
}

fn run_lease(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    let binary = lease_binary();
    let output = Command::new(&binary)
        .arg("--config")
        .arg(config_path.to_str().unwrap())
        .args(args)
        .env_remove("OPENAI_API_KEY")
        .output()
        .unwrap_or_else(|e| panic!("Failed to run lease binary at {:?}: {}", binary, e));

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let success = output.status.success();
    (stdout, stderr, success)
}

fn contracts_dir(config_path: &Path) -> String {
    let root = config_path.parent().unwrap().parent().unwrap();
    root.join("contratos").to_str().unwrap().to_string()
}

#[test]
fn test_init_creates_database() {
    let (_tmp, config_path) = setup_test_env();

    let (stdout, stderr, success) = run_lease(&config_path, &["init"]);
    assert!(success, "init failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("initialized"));
}

#[test]
fn test_init_idempotent() {
    let (_tmp, config_path) = setup_test_env();

    let (_, _, success1) = run_lease(&config_path, &["init"]);
    assert!(success1, "First init failed");

    let (_, _, success2) = run_lease(&config_path, &["init"]);
    assert!(success2, "Second init failed (not idempotent)");
}

#[test]
fn test_ingest_indexes_all_files() {
    let (_tmp, config_path) = setup_test_env();
    let dir = contracts_dir(&config_path);

    run_lease(&config_path, &["init"]);
    let (stdout, stderr, success) = run_lease(&config_path, &["ingest", &dir]);
    assert!(success, "ingest failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("documents indexed: 3"));
    assert!(stdout.contains("ok"));
}

#[test]
fn test_ingest_dry_run_writes_nothing() {
    let (_tmp, config_path) = setup_test_env();
    let dir = contracts_dir(&config_path);

    run_lease(&config_path, &["init"]);
    let (stdout, _, success) = run_lease(&config_path, &["ingest", &dir, "--dry-run"]);
    assert!(success);
    assert!(stdout.contains("dry-run"));
    assert!(stdout.contains("contract files found: 3"));

    let (stdout, _, _) = run_lease(&config_path, &["stores"]);
    assert!(
        stdout.contains("No contracts ingested"),
        "dry-run should not write, got: {}",
        stdout
    );
}

#[test]
fn test_reingest_replaces_wholesale() {
    let (tmp, config_path) = setup_test_env();
    let dir = contracts_dir(&config_path);

    run_lease(&config_path, &["init"]);
    run_lease(&config_path, &["ingest", &dir]);

    // Re-ingesting an unchanged directory yields the same corpus.
    let (stdout, _, success) = run_lease(&config_path, &["ingest", &dir]);
    assert!(success);
    assert!(stdout.contains("documents indexed: 3"));

    let (stores1, _, _) = run_lease(&config_path, &["stores"]);
    assert!(stores1.contains("total: 3"));

    // Removing a file and re-ingesting shrinks the corpus; nothing stale
    // survives the wholesale replace.
    fs::remove_file(tmp.path().join("contratos").join("loja_c.json")).unwrap();
    let (stdout, _, _) = run_lease(&config_path, &["ingest", &dir]);
    assert!(stdout.contains("documents indexed: 2"));

    let (stores2, _, _) = run_lease(&config_path, &["stores"]);
    assert!(stores2.contains("total: 2"));
}

#[test]
fn test_ingest_rejects_malformed_file() {
    let (tmp, config_path) = setup_test_env();
    let dir = contracts_dir(&config_path);

    run_lease(&config_path, &["init"]);
    fs::write(tmp.path().join("contratos").join("broken.json"), "{ nope").unwrap();

    let (_, stderr, success) = run_lease(&config_path, &["ingest", &dir]);
    assert!(!success, "ingest should fail on malformed JSON");
    assert!(stderr.contains("broken.json"), "stderr was: {}", stderr);

    // The failed run must not have committed a partial corpus.
    let (stdout, _, _) = run_lease(&config_path, &["stores"]);
    assert!(stdout.contains("No contracts ingested"));
}

#[test]
fn test_stores_lists_metadata_with_blanks() {
    let (_tmp, config_path) = setup_test_env();
    let dir = contracts_dir(&config_path);

    run_lease(&config_path, &["init"]);
    run_lease(&config_path, &["ingest", &dir]);

    let (stdout, _, success) = run_lease(&config_path, &["stores"]);
    assert!(success);
    assert!(stdout.contains("Loja A"));
    assert!(stdout.contains("CT-0001"));
    assert!(stdout.contains("2026-01-01"));
    assert!(stdout.contains("Loja B"));
    // The sparse record shows as blanks, not as an error.
    assert!(stdout.contains("total: 3"));
}

#[test]
fn test_ask_requires_api_key() {
    let (_tmp, config_path) = setup_test_env();
    let dir = contracts_dir(&config_path);

    run_lease(&config_path, &["init"]);
    run_lease(&config_path, &["ingest", &dir]);

    let (_, stderr, success) = run_lease(
        &config_path,
        &["ask", "Quais os vencimentos de todos os contratos?"],
    );
    assert!(!success, "ask should fail without an API key");
    assert!(stderr.contains("OPENAI_API_KEY"), "stderr was: {}", stderr);
}

#[test]
fn test_rejects_invalid_config() {
    let (tmp, config_path) = setup_test_env();

    fs::write(
        &config_path,
        format!(
            "[db]\npath = \"{}/data/lease.sqlite\"\n\n[retrieval]\ngeneral_k = 0\n",
            tmp.path().display()
        ),
    )
    .unwrap();

    let (_, stderr, success) = run_lease(&config_path, &["init"]);
    assert!(!success);
    assert!(stderr.contains("general_k"), "stderr was: {}", stderr);
}
