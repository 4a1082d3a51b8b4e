pub mod mistral;
pub mod orquesta;

use serde_yaml::Value;

/// Shared structural checks over the `tasks` block. Returns the first
/// diagnostic found, in document order.
pub(crate) fn inspect_tasks(
    workflow: &serde_yaml::Mapping,
    check_task: impl Fn(&str, &serde_yaml::Mapping) -> Option<String>,
) -> Option<String> {
    let tasks = match workflow.get(Value::from("tasks")) {
        None | Some(Value::Null) => return None,
        Some(Value::Mapping(tasks)) => tasks,
        Some(_) => return Some("'tasks' is not a mapping".to_string()),
    };

    for (name, spec) in tasks {
        let Some(task_name) = name.as_str() else {
            return Some(format!("task name is not a string: {:?}", name));
        };
        let Some(task_spec) = spec.as_mapping() else {
            return Some(format!("task '{}' is not a mapping", task_name));
        };
        if let Some(diagnostic) = check_task(task_name, task_spec) {
            return Some(diagnostic);
        }
    }
    None
}
