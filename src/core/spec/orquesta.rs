use serde_yaml::{Mapping, Value};

const TRANSITION_ENTRY_KEYS: &[&str] = &["when", "publish", "do"];

/// Structural syntax check for a converted Orquesta workflow.
pub fn inspect_syntax(workflow: &Value) -> Option<String> {
    let Some(body) = workflow.as_mapping() else {
        return Some("workflow is not a mapping".to_string());
    };

    match body.get(Value::from("version")) {
        None => return Some("workflow is missing 'version'".to_string()),
        Some(version) => {
            if version.as_str() != Some("1.0") {
                return Some(format!("unsupported workflow version: {:?}", version));
            }
        }
    }

    super::inspect_tasks(body, inspect_task)
}

fn inspect_task(task_name: &str, task_spec: &Mapping) -> Option<String> {
    let Some(next) = task_spec.get(Value::from("next")) else {
        return None;
    };
    let Some(entries) = next.as_sequence() else {
        return Some(format!("'next' in task '{}' is not a list", task_name));
    };

    for entry in entries {
        let Some(entry_map) = entry.as_mapping() else {
            return Some(format!(
                "'next' in task '{}' contains an entry that is not a mapping",
                task_name
            ));
        };
        if entry_map.is_empty() {
            return Some(format!("'next' in task '{}' contains an empty entry", task_name));
        }
        for (key, value) in entry_map {
            let Some(key_name) = key.as_str() else {
                return Some(format!(
                    "'next' entry key in task '{}' is not a string",
                    task_name
                ));
            };
            if !TRANSITION_ENTRY_KEYS.contains(&key_name) {
                return Some(format!(
                    "'next' entry in task '{}' holds unexpected key '{}'",
                    task_name, key_name
                ));
            }
            let valid = match key_name {
                "when" => value.as_str().is_some(),
                _ => value.is_sequence(),
            };
            if !valid {
                return Some(format!(
                    "'{}' in a 'next' entry of task '{}' has the wrong type",
                    key_name, task_name
                ));
            }
        }
    }
    None
}
