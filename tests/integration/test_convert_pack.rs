use orquestaconvert::core::expressions::converter::Dialect;
use orquestaconvert::pack;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const GOOD_WORKFLOW: &str = r#"---
version: '2.0'

mypack.good:
  description: converts cleanly
  tasks:
    first:
      action: core.local
      input:
        cmd: "{{ _.cmd }}"
      on-success:
        - second
    second:
      action: std.noop
"#;

const BAD_WORKFLOW: &str = r#"---
version: '2.0'

mypack.bad:
  tasks:
    stuck:
      action: core.noop
      timeout: 60
"#;

fn write_action(actions_dir: &Path, name: &str, runner_type: &str, workflow: &str) -> PathBuf {
    let metadata = format!(
        "---\nname: {name}\nrunner_type: {runner_type}\nentry_point: workflows/{workflow}\n",
    );
    let action_file = actions_dir.join(format!("{name}.yaml"));
    fs::write(&action_file, metadata).unwrap();
    action_file
}

fn setup_pack(workflows: &[(&str, &str)]) -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let actions_dir = tmp.path().join("actions");
    fs::create_dir_all(actions_dir.join("workflows")).unwrap();
    for (name, content) in workflows {
        write_action(&actions_dir, name, "mistral-v2", &format!("{name}.yaml"));
        fs::write(actions_dir.join("workflows").join(format!("{name}.yaml")), content).unwrap();
    }
    (tmp, actions_dir)
}

#[test]
fn test_workflow_files_filters_by_runner_type() {
    let (_tmp, actions_dir) = setup_pack(&[("good", GOOD_WORKFLOW)]);
    write_action(&actions_dir, "native", "orquesta", "native.yaml");
    write_action(&actions_dir, "python", "python-script", "python.yaml");

    let mistral = pack::workflow_files(&actions_dir, "mistral-v2").unwrap();
    assert_eq!(mistral.len(), 1);
    assert_eq!(mistral[0].action_file, actions_dir.join("good.yaml"));
    assert_eq!(
        mistral[0].workflow_file,
        actions_dir.join("workflows/good.yaml")
    );

    let orquesta = pack::workflow_files(&actions_dir, "orquesta").unwrap();
    assert_eq!(orquesta.len(), 1);
    assert_eq!(orquesta[0].action_file, actions_dir.join("native.yaml"));
}

#[test]
fn test_convert_pack_promotes_workflow_and_metadata() {
    let (_tmp, actions_dir) = setup_pack(&[("good", GOOD_WORKFLOW)]);

    let report = pack::convert_pack(&actions_dir, Dialect::Jinja, false).unwrap();
    assert!(report.is_clean());
    assert_eq!(report.distinct_failures(), 0);

    let workflow = fs::read_to_string(actions_dir.join("workflows/good.yaml")).unwrap();
    assert!(workflow.starts_with("---\nversion: '1.0'\n"));
    assert!(workflow.contains("'{{ ctx().cmd }}'"));

    let metadata = fs::read_to_string(actions_dir.join("good.yaml")).unwrap();
    assert!(metadata.contains("runner_type: orquesta"));

    // Backups and temp files are cleaned up on success.
    let leftovers: Vec<_> = fs::read_dir(actions_dir.join("workflows"))
        .unwrap()
        .map(|e| e.unwrap().file_name().into_string().unwrap())
        .filter(|name| name.contains(".bak.") || name.contains(".temp."))
        .collect();
    assert!(leftovers.is_empty(), "leftover files: {:?}", leftovers);
}

#[test]
fn test_convert_pack_rolls_back_failed_file() {
    let (_tmp, actions_dir) = setup_pack(&[("bad", BAD_WORKFLOW)]);

    let report = pack::convert_pack(&actions_dir, Dialect::Jinja, false).unwrap();
    assert_eq!(report.distinct_failures(), 1);

    // The failed file set is untouched: original workflow, original runner.
    let workflow = fs::read_to_string(actions_dir.join("workflows/bad.yaml")).unwrap();
    assert_eq!(workflow, BAD_WORKFLOW);
    let metadata = fs::read_to_string(actions_dir.join("bad.yaml")).unwrap();
    assert!(metadata.contains("runner_type: mistral-v2"));

    let rendered = report.render();
    assert!(rendered.starts_with("ERROR: Unable to convert all Mistral workflows.\n"));
    assert!(rendered.contains("timeout"));
    assert!(rendered.contains("Affected files:\n"));
    assert!(rendered.contains("workflows/bad.yaml"));
}

#[test]
fn test_convert_pack_continues_past_failures() {
    let (_tmp, actions_dir) = setup_pack(&[("bad", BAD_WORKFLOW), ("good", GOOD_WORKFLOW)]);

    let report = pack::convert_pack(&actions_dir, Dialect::Jinja, false).unwrap();
    assert_eq!(report.distinct_failures(), 1);

    // The good file still converted even though the bad one failed.
    let good = fs::read_to_string(actions_dir.join("workflows/good.yaml")).unwrap();
    assert!(good.starts_with("---\nversion: '1.0'\n"));
    let bad = fs::read_to_string(actions_dir.join("workflows/bad.yaml")).unwrap();
    assert_eq!(bad, BAD_WORKFLOW);
}

#[test]
fn test_convert_pack_records_empty_with_items_as_failure() {
    let empty_items: &str = r#"---
version: '2.0'

mypack.empty_items:
  tasks:
    fan_out:
      action: core.local
      with-items: []
"#;
    let (_tmp, actions_dir) =
        setup_pack(&[("empty_items", empty_items), ("good", GOOD_WORKFLOW)]);

    let report = pack::convert_pack(&actions_dir, Dialect::Jinja, false).unwrap();
    assert_eq!(report.distinct_failures(), 1);
    assert!(report.render().contains("empty list"));

    // The rest of the batch still converts.
    let good = fs::read_to_string(actions_dir.join("workflows/good.yaml")).unwrap();
    assert!(good.starts_with("---\nversion: '1.0'\n"));
}

#[test]
fn test_convert_pack_force_converts_the_unsupported_attribute() {
    let (_tmp, actions_dir) = setup_pack(&[("bad", BAD_WORKFLOW)]);

    let report = pack::convert_pack(&actions_dir, Dialect::Jinja, true).unwrap();
    assert!(report.is_clean());

    let workflow = fs::read_to_string(actions_dir.join("workflows/bad.yaml")).unwrap();
    assert!(workflow.starts_with("---\nversion: '1.0'\n"));
    assert!(workflow.contains("timeout: 60"));
}

#[test]
fn test_existing_backup_is_preserved_on_failure() {
    let (_tmp, actions_dir) = setup_pack(&[("bad", BAD_WORKFLOW)]);
    let backup = actions_dir.join(format!("workflows/bad.yaml.{}", pack::BACKUP_EXTENSION));
    fs::write(&backup, "original from interrupted run\n").unwrap();

    let report = pack::convert_pack(&actions_dir, Dialect::Jinja, false).unwrap();
    assert_eq!(report.distinct_failures(), 1);

    // Rollback restores from the pre-existing backup.
    let workflow = fs::read_to_string(actions_dir.join("workflows/bad.yaml")).unwrap();
    assert_eq!(workflow, "original from interrupted run\n");
}

#[test]
fn test_missing_actions_dir_is_an_error() {
    let tmp = TempDir::new().unwrap();
    let missing = tmp.path().join("does-not-exist");
    assert!(pack::convert_pack(&missing, Dialect::Jinja, false).is_err());
}
