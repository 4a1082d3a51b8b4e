use crate::core::error::{AppError, ErrorCategory};
use crate::core::expressions::{self, ExpressionConverter};
use crate::core::workflow::dict_to_list;
use crate::utils::task_names::translate_task_name;
use indexmap::IndexMap;
use serde_yaml::{Mapping, Value};
use std::collections::HashSet;

/// A task's transition list split by guard: bare next-task names, and task
/// names grouped under the guard expression they share. Grouping keeps all
/// transitions with a common expression in one `when:` clause.
#[derive(Debug, Default, PartialEq)]
pub struct TransitionGroups {
    pub simple: Vec<String>,
    pub by_expr: IndexMap<String, Vec<String>>,
}

impl TransitionGroups {
    pub fn len(&self) -> usize {
        self.simple.len() + self.by_expr.values().map(Vec::len).sum::<usize>()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Classify each element of an `on-success`/`on-error`/`on-complete` list.
/// A bare string names the next task; a mapping pairs next-task names with
/// the guard expression under which the transition fires. Anything else is
/// a structural error.
pub fn group_task_transitions(transitions: &Value) -> Result<TransitionGroups, AppError> {
    let mut groups = TransitionGroups::default();

    // A single string is treated as a one-element list.
    let list = match transitions {
        Value::String(s) => vec![Value::String(s.clone())],
        Value::Sequence(seq) => seq.clone(),
        Value::Null => vec![],
        other => {
            return Err(structural_transition_error(other));
        }
    };

    for transition in &list {
        match transition {
            Value::String(name) => groups.simple.push(name.clone()),
            Value::Mapping(map) => {
                for (task_name, expr) in map {
                    let (Some(task_name), Some(expr)) = (task_name.as_str(), expr.as_str())
                    else {
                        return Err(structural_transition_error(transition));
                    };
                    groups
                        .by_expr
                        .entry(expr.to_string())
                        .or_default()
                        .push(task_name.to_string());
                }
            }
            other => return Err(structural_transition_error(other)),
        }
    }

    Ok(groups)
}

fn structural_transition_error(value: &Value) -> AppError {
    AppError::new(
        ErrorCategory::Structural,
        format!("Task transition is not a \"string\" or \"dict\": {:?}", value),
    )
    .with_code("WFC-TRANS-001")
}

/// Build the single entry covering unguarded transitions:
///
/// ```yaml
/// on-success:
///   - do_thing_a
///   - do_thing_b
/// ```
///
/// becomes
///
/// ```yaml
/// next:
///   - when: "{{ succeeded() }}"
///     do: [do_thing_a, do_thing_b]
/// ```
///
/// `publish` must already be converted. The `when` key is omitted for the
/// on-complete category (no implicit guard).
pub fn convert_task_transition_simple(
    transitions: &[String],
    publish: &Mapping,
    category_guard: Option<&str>,
    expr_converter: &dyn ExpressionConverter,
) -> Mapping {
    let mut entry = Mapping::new();

    if let Some(guard) = category_guard {
        entry.insert(
            Value::from("when"),
            Value::from(expr_converter.wrap_expression(guard)),
        );
    }

    if !publish.is_empty() {
        entry.insert(Value::from("publish"), dict_to_list(publish));
    }

    if !transitions.is_empty() {
        entry.insert(
            Value::from("do"),
            Value::Sequence(transitions.iter().map(|t| Value::from(t.as_str())).collect()),
        );
    }

    entry
}

/// Build one entry per distinct guard expression. The category guard, when
/// present, is combined as `<category> and (<rewritten>)` and re-wrapped in
/// the guard expression's own delimiter style. Published values attach to
/// every branch that can produce a successor, not only the unguarded one.
pub fn convert_task_transition_expr(
    groups: &IndexMap<String, Vec<String>>,
    publish: &Mapping,
    category_guard: Option<&str>,
) -> Result<Vec<Mapping>, AppError> {
    let mut entries = Vec::new();
    for (expr, task_list) in groups {
        let converted = expressions::convert_string(expr, &[]);

        let when = match category_guard {
            Some(guard) => {
                let converter = expressions::get_converter(&converted).ok_or_else(|| {
                    AppError::new(
                        ErrorCategory::Structural,
                        format!("Transition guard is not a recognized expression: '{}'", expr),
                    )
                    .with_code("WFC-TRANS-002")
                })?;
                let bare = converter.unwrap_expression(&converted);
                converter.wrap_expression(&format!("{} and ({})", guard, bare))
            }
            None => converted,
        };

        let mut entry = Mapping::new();
        entry.insert(Value::from("when"), Value::from(when));
        if !publish.is_empty() {
            entry.insert(Value::from("publish"), dict_to_list(publish));
        }
        entry.insert(
            Value::from("do"),
            Value::Sequence(task_list.iter().map(|t| Value::from(t.as_str())).collect()),
        );
        entries.push(entry);
    }
    Ok(entries)
}

struct TransitionCategory {
    key: &'static str,
    guard: Option<&'static str>,
    publish: Mapping,
}

/// Merge a task's publish blocks and transition lists into the ordered
/// `next` list. Categories keep fixed semantics: on-success guards with
/// `succeeded()`, on-error with `failed()`, on-complete is unguarded.
pub fn convert_task_transitions(
    task_name: &str,
    task_spec: &Mapping,
    expr_converter: &dyn ExpressionConverter,
    output_vars: &HashSet<String>,
) -> Result<Option<Mapping>, AppError> {
    let publish = publish_map(task_spec, "publish");
    let publish_on_error = publish_map(task_spec, "publish-on-error");

    let publish_converted = expressions::convert_mapping(&publish, &[]);
    let publish_on_error_converted = expressions::convert_mapping(&publish_on_error, &[]);
    check_publish_conflicts(task_name, &publish_converted, &publish_on_error_converted)?;

    let categories = [
        TransitionCategory {
            key: "on-success",
            guard: Some("succeeded()"),
            publish: publish_converted,
        },
        TransitionCategory {
            key: "on-error",
            guard: Some("failed()"),
            publish: publish_on_error_converted,
        },
        TransitionCategory {
            key: "on-complete",
            guard: None,
            publish: Mapping::new(),
        },
    ];

    let mut next: Vec<Value> = Vec::new();
    for category in &categories {
        let transitions = task_spec
            .get(Value::from(category.key))
            .cloned()
            .unwrap_or(Value::Null);
        let groups = group_task_transitions(&transitions)?;

        // A publish value the workflow output depends on is load-bearing
        // even when nothing executes afterwards, so a publish-only entry is
        // still emitted for this category.
        let publish_to_workflow_context = category
            .publish
            .iter()
            .any(|(k, _)| k.as_str().is_some_and(|name| output_vars.contains(name)));

        if !groups.simple.is_empty() || publish_to_workflow_context {
            let entry = convert_task_transition_simple(
                &groups.simple,
                &category.publish,
                category.guard,
                expr_converter,
            );
            if !entry.is_empty() {
                next.push(Value::Mapping(entry));
            }
        }

        for entry in convert_task_transition_expr(&groups.by_expr, &category.publish, category.guard)? {
            next.push(Value::Mapping(entry));
        }
    }

    if next.is_empty() {
        return Ok(None);
    }

    normalize_transition_task_names(&mut next);

    let mut spec = Mapping::new();
    spec.insert(Value::from("next"), Value::Sequence(next));
    Ok(Some(spec))
}

fn publish_map(task_spec: &Mapping, key: &str) -> Mapping {
    match task_spec.get(Value::from(key)) {
        Some(Value::Mapping(map)) => map.clone(),
        _ => Mapping::new(),
    }
}

/// Same key with divergent post-rewrite values across publish and
/// publish-on-error is always fatal; picking one silently would change
/// behavior. Identical values are fine and each category keeps its copy.
fn check_publish_conflicts(
    task_name: &str,
    publish: &Mapping,
    publish_on_error: &Mapping,
) -> Result<(), AppError> {
    let conflicting: Vec<String> = publish
        .iter()
        .filter_map(|(key, value)| {
            let other = publish_on_error.get(key)?;
            if other != value {
                key.as_str().map(str::to_string)
            } else {
                None
            }
        })
        .collect();

    if conflicting.is_empty() {
        return Ok(());
    }

    Err(AppError::new(
        ErrorCategory::PublishConflict,
        format!(
            "Task '{}' publishes conflicting values for key(s) [{}] in 'publish' and 'publish-on-error'",
            task_name,
            conflicting.join(", ")
        ),
    )
    .with_code("WFC-PUBLISH-001")
    .with_task(task_name))
}

fn normalize_transition_task_names(next: &mut [Value]) {
    for entry in next.iter_mut() {
        let Some(map) = entry.as_mapping_mut() else {
            continue;
        };
        if let Some(Value::Sequence(task_list)) = map.get_mut(Value::from("do")) {
            for task in task_list.iter_mut() {
                if let Some(name) = task.as_str() {
                    *task = Value::from(translate_task_name(name));
                }
            }
        }
    }
}
