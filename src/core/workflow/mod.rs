pub mod retry;
pub mod transitions;
pub mod with_items;

use crate::core::error::{AppError, ErrorCategory};
use crate::core::expressions::{self, mixed, ExpressionConverter};
use crate::utils::task_names::translate_task_name;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_yaml::{Mapping, Value};
use std::collections::HashSet;
use tracing::debug;

const WORKFLOW_TYPES: &[&str] = &["direct"];

const WORKFLOW_UNSUPPORTED_ATTRIBUTES: &[&str] = &["output-on-error"];

const TASK_UNSUPPORTED_ATTRIBUTES: &[&str] = &[
    "keep-result",
    "pause-before",
    "safe-rerun",
    "target",
    "timeout",
    "wait-after",
    "wait-before",
    "workflow",
];

// Built-in Mistral actions with no Orquesta runner equivalent.
const UNSUPPORTED_MISTRAL_ACTIONS: &[&str] =
    &["std.echo", "std.email", "std.javascript", "std.js", "std.ssh"];

const MISTRAL_ACTION_CONVERSION_TABLE: &[(&str, &str)] = &[
    ("std.fail", "fail"),
    ("std.http", "core.http"),
    ("std.mistral_http", "core.http"),
    ("std.noop", "core.noop"),
];

// ctx('name') / ctx("name") / ctx(name) / ctx().name
static CONTEXT_ACCESSOR_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"\bctx\(['"]?(\w+)['"]?\)|\bctx\(\)\.(\w+)\b"#).unwrap());

/// Walks a whole Mistral workflow body and reassembles it in Orquesta
/// vocabulary. The converter itself is stateless; per-task item variables
/// are threaded explicitly through the expression rewrites.
#[derive(Debug, Default)]
pub struct WorkflowConverter;

impl WorkflowConverter {
    pub fn new() -> Self {
        WorkflowConverter
    }

    /// Convert a workflow body. `expr_converter` selects the dialect used to
    /// wrap newly introduced guards; expressions already present keep the
    /// dialect they were written in.
    pub fn convert(
        &self,
        workflow: &Mapping,
        expr_converter: &dyn ExpressionConverter,
        force: bool,
    ) -> Result<Mapping, AppError> {
        let mut converted = Mapping::new();
        converted.insert(Value::from("version"), Value::from("1.0"));

        for attr in WORKFLOW_UNSUPPORTED_ATTRIBUTES {
            let Some(value) = workflow.get(Value::from(*attr)) else {
                continue;
            };
            if force {
                debug!(attribute = attr, "passing unsupported workflow attribute through");
                converted.insert(Value::from(*attr), value.clone());
            } else {
                return Err(AppError::new(
                    ErrorCategory::UnsupportedFeature,
                    format!(
                        "Workflow contains an attribute '{}' that is not supported in orquesta",
                        attr
                    ),
                )
                .with_code("WFC-WF-001")
                .with_suggestion("Rerun with --force to copy the attribute through unchanged"));
            }
        }

        if let Some(description) = workflow.get(Value::from("description")) {
            converted.insert(Value::from("description"), description.clone());
        }

        if let Some(wf_type) = workflow.get(Value::from("type")) {
            let type_name = wf_type.as_str().unwrap_or("");
            if !WORKFLOW_TYPES.contains(&type_name) {
                return Err(AppError::new(
                    ErrorCategory::UnsupportedFeature,
                    format!("Workflows of type '{}' are not supported in orquesta", type_name),
                )
                .with_code("WFC-WF-002"));
            }
        }

        if let Some(input) = workflow.get(Value::from("input")) {
            converted.insert(Value::from("input"), expressions::convert(input, &[]));
        }

        if let Some(vars) = workflow.get(Value::from("vars")) {
            let value = match vars {
                Value::Mapping(map) => dict_to_list(&expressions::convert_mapping(map, &[])),
                other => expressions::convert(other, &[]),
            };
            converted.insert(Value::from("vars"), value);
        }

        let mut output_vars = HashSet::new();
        if let Some(Value::Mapping(output)) = workflow.get(Value::from("output")) {
            let output_converted = expressions::convert_mapping(output, &[]);
            output_vars = extract_context_variables(&Value::Mapping(output_converted.clone()));
            converted.insert(Value::from("output"), dict_to_list(&output_converted));
        }

        if let Some(Value::Mapping(tasks)) = workflow.get(Value::from("tasks")) {
            let tasks_converted = self.convert_tasks(tasks, expr_converter, &output_vars, force)?;
            if !tasks_converted.is_empty() {
                converted.insert(Value::from("tasks"), Value::Mapping(tasks_converted));
            }
        }

        Ok(converted)
    }

    fn convert_tasks(
        &self,
        tasks: &Mapping,
        expr_converter: &dyn ExpressionConverter,
        output_vars: &HashSet<String>,
        force: bool,
    ) -> Result<Mapping, AppError> {
        let mut converted_tasks = Mapping::new();

        for (name, spec) in tasks {
            let task_name = name.as_str().ok_or_else(|| {
                AppError::new(
                    ErrorCategory::Structural,
                    format!("Task name is not a string: {:?}", name),
                )
                .with_code("WFC-TASK-001")
            })?;
            let task_spec = spec.as_mapping().ok_or_else(|| {
                AppError::new(
                    ErrorCategory::Structural,
                    format!("Task '{}' is not a mapping", task_name),
                )
                .with_code("WFC-TASK-001")
                .with_task(task_name)
            })?;

            let mut o_task = Mapping::new();

            for attr in TASK_UNSUPPORTED_ATTRIBUTES {
                let Some(value) = task_spec.get(Value::from(*attr)) else {
                    continue;
                };
                if force {
                    debug!(
                        task = task_name,
                        attribute = attr,
                        "passing unsupported task attribute through"
                    );
                    o_task.insert(Value::from(*attr), value.clone());
                } else {
                    return Err(AppError::new(
                        ErrorCategory::UnsupportedFeature,
                        format!(
                            "Task '{}' contains an attribute '{}' that is not supported in orquesta",
                            task_name, attr
                        ),
                    )
                    .with_code("WFC-TASK-002")
                    .with_task(task_name)
                    .with_suggestion(
                        "Rerun with --force to copy the attribute through unchanged",
                    ));
                }
            }

            let mut item_vars: Vec<String> = vec![];
            match task_spec.get(Value::from("with-items")) {
                Some(Value::Null) | None => {}
                Some(_) => {
                    let (with, vars) =
                        with_items::convert_with_items(task_name, task_spec, expr_converter)?;
                    o_task.insert(Value::from("with"), Value::Mapping(with));
                    item_vars = vars;
                }
            }

            if let Some(action) = task_spec.get(Value::from("action")) {
                o_task.insert(
                    Value::from("action"),
                    self.convert_action(task_name, action, &item_vars)?,
                );
            }

            if let Some(join) = task_spec.get(Value::from("join")) {
                o_task.insert(Value::from("join"), join.clone());
            }

            if let Some(retry_spec) = task_spec.get(Value::from("retry")) {
                o_task.insert(
                    Value::from("retry"),
                    retry::convert_retry(task_name, retry_spec, force)?,
                );
            }

            if let Some(Value::Mapping(input)) = task_spec.get(Value::from("input")) {
                o_task.insert(
                    Value::from("input"),
                    Value::Mapping(mixed::convert_mapping(input, &item_vars)),
                );
            }

            if let Some(next_spec) = transitions::convert_task_transitions(
                task_name,
                task_spec,
                expr_converter,
                output_vars,
            )? {
                for (key, value) in next_spec {
                    o_task.insert(key, value);
                }
            }

            converted_tasks.insert(
                Value::from(translate_task_name(task_name)),
                Value::Mapping(o_task),
            );
        }

        Ok(converted_tasks)
    }

    /// Actions may embed both dialects on one command line, so the mixed
    /// converter handles the string. Unsupported built-ins stay fatal even
    /// under force; the output would reference an action that cannot exist.
    fn convert_action(
        &self,
        task_name: &str,
        action: &Value,
        item_vars: &[String],
    ) -> Result<Value, AppError> {
        let action_str = action.as_str().ok_or_else(|| {
            AppError::new(
                ErrorCategory::Structural,
                format!("Action in task '{}' is not a string: {:?}", task_name, action),
            )
            .with_code("WFC-ACTION-001")
            .with_task(task_name)
        })?;

        let trimmed = action_str.trim();
        if UNSUPPORTED_MISTRAL_ACTIONS.contains(&trimmed) {
            return Err(AppError::new(
                ErrorCategory::UnsupportedFeature,
                format!(
                    "Action '{}' in task '{}' is not supported in orquesta",
                    trimmed, task_name
                ),
            )
            .with_code("WFC-ACTION-002")
            .with_task(task_name));
        }

        let mapped = MISTRAL_ACTION_CONVERSION_TABLE
            .iter()
            .find(|(mistral, _)| *mistral == trimmed)
            .map(|(_, orquesta)| *orquesta)
            .unwrap_or(action_str);

        Ok(Value::from(mixed::convert_string(mapped, item_vars)))
    }
}

/// Flatten `{a: 1, b: 2}` into `[{a: 1}, {b: 2}]`, preserving order. The
/// target dialect's `publish`, `vars`, and `output` blocks are lists of
/// single-key maps so duplicate keys and ordering serialize stably.
pub fn dict_to_list(map: &Mapping) -> Value {
    Value::Sequence(
        map.iter()
            .map(|(k, v)| {
                let mut single = Mapping::new();
                single.insert(k.clone(), v.clone());
                Value::Mapping(single)
            })
            .collect(),
    )
}

/// Collect every context-variable name referenced by already-converted
/// expressions anywhere under `value`.
pub fn extract_context_variables(value: &Value) -> HashSet<String> {
    let mut vars = HashSet::new();
    collect_context_variables(value, &mut vars);
    vars
}

fn collect_context_variables(value: &Value, vars: &mut HashSet<String>) {
    match value {
        Value::String(s) => {
            for caps in CONTEXT_ACCESSOR_PATTERN.captures_iter(s) {
                if let Some(name) = caps.get(1).or_else(|| caps.get(2)) {
                    vars.insert(name.as_str().to_string());
                }
            }
        }
        Value::Mapping(map) => {
            for (k, v) in map {
                collect_context_variables(k, vars);
                collect_context_variables(v, vars);
            }
        }
        Value::Sequence(seq) => {
            for item in seq {
                collect_context_variables(item, vars);
            }
        }
        _ => {}
    }
}
