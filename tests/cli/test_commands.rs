use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::PathBuf;

fn bin() -> Command {
    Command::cargo_bin("orquestaconvert").unwrap()
}

fn fixture(relative: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(relative)
}

#[test]
fn test_convert_writes_workflow_to_stdout() {
    let expected = fs::read_to_string(fixture("orquesta/run_command_chain.yaml")).unwrap();
    bin()
        .arg("convert")
        .arg(fixture("mistral/run_command_chain.yaml"))
        .assert()
        .success()
        .stdout(expected);
}

#[test]
fn test_convert_yaql_expressions_flag() {
    bin()
        .args(["convert", "-e", "yaql"])
        .arg(fixture("mistral/gather_items_yaql.yaml"))
        .assert()
        .success()
        .stdout(predicate::str::contains("when: <% succeeded() %>"));
}

#[test]
fn test_convert_output_file() {
    let tmp = tempfile::TempDir::new().unwrap();
    let out = tmp.path().join("converted.yaml");
    bin()
        .args(["convert", "-o"])
        .arg(&out)
        .arg(fixture("mistral/run_command_chain.yaml"))
        .assert()
        .success()
        .stdout(predicate::str::is_empty());

    let expected = fs::read_to_string(fixture("orquesta/run_command_chain.yaml")).unwrap();
    assert_eq!(fs::read_to_string(out).unwrap(), expected);
}

#[test]
fn test_convert_unsupported_attribute_fails() {
    let tmp = tempfile::TempDir::new().unwrap();
    let wf = tmp.path().join("bad.yaml");
    fs::write(
        &wf,
        "version: '2.0'\nmypack.bad:\n  tasks:\n    stuck:\n      action: core.noop\n      timeout: 60\n",
    )
    .unwrap();

    bin()
        .arg("convert")
        .arg(&wf)
        .assert()
        .failure()
        .stderr(predicate::str::contains("timeout"))
        .stderr(predicate::str::contains("--force"));
}

#[test]
fn test_convert_force_downgrades_unsupported_attribute() {
    let tmp = tempfile::TempDir::new().unwrap();
    let wf = tmp.path().join("bad.yaml");
    fs::write(
        &wf,
        "version: '2.0'\nmypack.bad:\n  tasks:\n    stuck:\n      action: core.noop\n      timeout: 60\n",
    )
    .unwrap();

    bin()
        .args(["convert", "--force"])
        .arg(&wf)
        .assert()
        .success()
        .stdout(predicate::str::contains("timeout: 60"));
}

#[test]
fn test_convert_missing_file_fails() {
    bin()
        .args(["convert", "no-such-file.yaml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("ERROR:"));
}

#[test]
fn test_validate_accepts_orquesta_workflow() {
    bin()
        .args(["convert", "--validate", "--verbose"])
        .arg(fixture("orquesta/run_command_chain.yaml"))
        .assert()
        .success()
        .stdout(predicate::str::contains("Successfully validated workflow from"));
}

#[test]
fn test_validate_rejects_mistral_workflow() {
    bin()
        .args(["convert", "--validate"])
        .arg(fixture("mistral/run_command_chain.yaml"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed validation"));
}

/// Copies the fixture pack into a scratch directory, since convert-pack
/// rewrites the files in place.
fn copy_fixture_pack(tmp: &tempfile::TempDir) -> PathBuf {
    let actions_dir = tmp.path().join("actions");
    fs::create_dir_all(actions_dir.join("workflows")).unwrap();
    fs::copy(
        fixture("pack/actions/run_command_chain.yaml"),
        actions_dir.join("run_command_chain.yaml"),
    )
    .unwrap();
    fs::copy(
        fixture("pack/actions/workflows/run_command_chain.yaml"),
        actions_dir.join("workflows/run_command_chain.yaml"),
    )
    .unwrap();
    actions_dir
}

#[test]
fn test_convert_pack_list_workflows() {
    let tmp = tempfile::TempDir::new().unwrap();
    let actions_dir = copy_fixture_pack(&tmp);

    bin()
        .args(["convert-pack", "--list-workflows", "mistral-v2", "--actions-dir"])
        .arg(&actions_dir)
        .assert()
        .success()
        .stdout(predicate::str::contains("run_command_chain.yaml --> "));
}

#[test]
fn test_convert_pack_converts_and_reports_clean() {
    let tmp = tempfile::TempDir::new().unwrap();
    let actions_dir = copy_fixture_pack(&tmp);

    bin()
        .args(["convert-pack", "--actions-dir"])
        .arg(&actions_dir)
        .assert()
        .success();

    let converted =
        fs::read_to_string(actions_dir.join("workflows/run_command_chain.yaml")).unwrap();
    assert!(converted.starts_with("---\nversion: '1.0'\n"));
    assert!(fs::read_to_string(actions_dir.join("run_command_chain.yaml"))
        .unwrap()
        .contains("runner_type: orquesta"));
}

#[test]
fn test_version_flag() {
    bin()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}
