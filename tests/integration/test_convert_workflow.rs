use orquestaconvert::core::convert;
use orquestaconvert::core::error::ErrorCategory;
use orquestaconvert::core::expressions::converter::Dialect;
use std::path::PathBuf;

fn fixture_path(relative: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(relative)
}

fn fixture_content(relative: &str) -> String {
    std::fs::read_to_string(fixture_path(relative)).unwrap()
}

#[test]
fn test_convert_jinja_chain_matches_fixture() {
    let result =
        convert::convert_file(&fixture_path("mistral/run_command_chain.yaml"), Dialect::Jinja, false)
            .unwrap();
    assert_eq!(result, fixture_content("orquesta/run_command_chain.yaml"));
}

#[test]
fn test_convert_yaql_with_items_and_retry_matches_fixture() {
    let result =
        convert::convert_file(&fixture_path("mistral/gather_items_yaql.yaml"), Dialect::Yaql, false)
            .unwrap();
    assert_eq!(result, fixture_content("orquesta/gather_items_yaql.yaml"));
}

#[test]
fn test_converted_output_is_valid_orquesta() {
    let result =
        convert::convert_file(&fixture_path("mistral/run_command_chain.yaml"), Dialect::Jinja, false)
            .unwrap();
    let value: serde_yaml::Value = serde_yaml::from_str(&result).unwrap();
    let body = value.as_mapping().unwrap();
    assert_eq!(
        body.get(serde_yaml::Value::from("version")),
        Some(&serde_yaml::Value::from("1.0"))
    );
}

#[test]
fn test_conversion_is_byte_deterministic() {
    let path = fixture_path("mistral/gather_items_yaql.yaml");
    let first = convert::convert_file(&path, Dialect::Yaql, false).unwrap();
    let second = convert::convert_file(&path, Dialect::Yaql, false).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_unsupported_task_attribute_errors_without_force() {
    let content = r#"
version: '2.0'
examples.slow:
  tasks:
    long_task:
      action: core.noop
      timeout: 60
"#;
    let err = convert::convert_str(content, Dialect::Jinja, false).unwrap_err();
    assert_eq!(err.category, ErrorCategory::UnsupportedFeature);
    assert!(err.message.contains("long_task"));
    assert!(err.message.contains("timeout"));
}

#[test]
fn test_unsupported_task_attribute_passes_through_with_force() {
    let content = r#"
version: '2.0'
examples.slow:
  tasks:
    long_task:
      action: core.noop
      timeout: 60
"#;
    let result = convert::convert_str(content, Dialect::Jinja, true).unwrap();
    assert!(result.contains("timeout: 60"));
}

#[test]
fn test_publish_conflict_is_never_downgraded() {
    let content = r#"
version: '2.0'
examples.conflicted:
  tasks:
    t1:
      action: core.noop
      publish:
        data: "{{ _.a }}"
      publish-on-error:
        data: "{{ _.b }}"
      on-success:
        - t2
    t2:
      action: core.noop
"#;
    for force in [false, true] {
        let err = convert::convert_str(content, Dialect::Jinja, force).unwrap_err();
        assert_eq!(err.category, ErrorCategory::PublishConflict);
    }
}

#[test]
fn test_validate_file_accepts_converted_fixture() {
    convert::validate_file(&fixture_path("orquesta/run_command_chain.yaml")).unwrap();
}

#[test]
fn test_validate_file_rejects_mistral_source() {
    let err = convert::validate_file(&fixture_path("mistral/run_command_chain.yaml")).unwrap_err();
    assert_eq!(err.category, ErrorCategory::Validation);
}
