use serde_yaml::{Mapping, Value};

const TRANSITION_KEYS: &[&str] = &["on-success", "on-error", "on-complete"];

/// Structural syntax check for a Mistral workflow body. Returns a
/// diagnostic string for the first problem found, or None when the
/// document is acceptable input for conversion.
pub fn inspect_syntax(workflow: &Value) -> Option<String> {
    let Some(body) = workflow.as_mapping() else {
        return Some("workflow is not a mapping".to_string());
    };

    if let Some(wf_type) = body.get(Value::from("type")) {
        if wf_type.as_str().is_none() {
            return Some("'type' is not a string".to_string());
        }
    }

    if let Some(input) = body.get(Value::from("input")) {
        if !matches!(input, Value::Sequence(_)) {
            return Some("'input' is not a list".to_string());
        }
    }

    if let Some(output) = body.get(Value::from("output")) {
        if !matches!(output, Value::Mapping(_)) {
            return Some("'output' is not a mapping".to_string());
        }
    }

    super::inspect_tasks(body, inspect_task)
}

fn inspect_task(task_name: &str, task_spec: &Mapping) -> Option<String> {
    for key in TRANSITION_KEYS {
        let Some(transitions) = task_spec.get(Value::from(*key)) else {
            continue;
        };
        let list = match transitions {
            Value::String(_) => continue,
            Value::Sequence(seq) => seq,
            _ => {
                return Some(format!(
                    "'{}' in task '{}' is not a string or list",
                    key, task_name
                ));
            }
        };
        for element in list {
            if !matches!(element, Value::String(_) | Value::Mapping(_)) {
                return Some(format!(
                    "'{}' in task '{}' contains an element that is not a string or mapping",
                    key, task_name
                ));
            }
        }
    }

    if let Some(publish) = task_spec.get(Value::from("publish")) {
        if !matches!(publish, Value::Mapping(_)) {
            return Some(format!("'publish' in task '{}' is not a mapping", task_name));
        }
    }
    if let Some(publish) = task_spec.get(Value::from("publish-on-error")) {
        if !matches!(publish, Value::Mapping(_)) {
            return Some(format!(
                "'publish-on-error' in task '{}' is not a mapping",
                task_name
            ));
        }
    }

    None
}
