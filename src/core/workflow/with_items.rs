use crate::core::error::{AppError, ErrorCategory};
use crate::core::expressions::{self, ExpressionConverter};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_yaml::{Mapping, Value};

// "<var> in <expr>" where expr may be a wrapped expression or a bare
// literal such as a YAML-parsed list rendered back to a string.
static WITH_ITEMS_EXPR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(?P<var>\w+)\s+in\s+(?P<expr>(?:<%|\{\{)?\s*.+?\s*(?:%>|\}\})?)\s*$")
        .unwrap()
});

/// Convert a task's `with-items` (and optional `concurrency`) into the
/// target `with` block. Multiple item lists zip together:
///
/// ```yaml
/// with-items:
///   - i in <% $.listi %>
///   - j in <% $.listj %>
/// ```
///
/// becomes `items: i, j in <% zip(ctx().listi, ctx().listj) %>`.
///
/// Returns the `with` mapping together with the iteration variable names,
/// which the caller threads through the task's other expression rewrites so
/// `_.i` / `$.i` resolve to `item(i)` instead of `ctx().i`.
pub fn convert_with_items(
    task_name: &str,
    task_spec: &Mapping,
    expr_converter: &dyn ExpressionConverter,
) -> Result<(Mapping, Vec<String>), AppError> {
    let with_items = task_spec
        .get(Value::from("with-items"))
        .cloned()
        .unwrap_or(Value::Null);

    let items: Vec<String> = match with_items {
        Value::String(s) => vec![s],
        Value::Sequence(seq) => seq
            .into_iter()
            .map(|item| {
                item.as_str().map(str::to_string).ok_or_else(|| {
                    AppError::new(
                        ErrorCategory::Structural,
                        format!(
                            "with-items entry in task '{}' is not a string: {:?}",
                            task_name, item
                        ),
                    )
                    .with_code("WFC-ITEMS-001")
                    .with_task(task_name)
                })
            })
            .collect::<Result<_, _>>()?,
        other => {
            return Err(AppError::new(
                ErrorCategory::Structural,
                format!("with-items in task '{}' is not a string or list: {:?}", task_name, other),
            )
            .with_code("WFC-ITEMS-001")
            .with_task(task_name));
        }
    };

    if items.is_empty() {
        return Err(AppError::new(
            ErrorCategory::Structural,
            format!("with-items in task '{}' is an empty list", task_name),
        )
        .with_code("WFC-ITEMS-001")
        .with_task(task_name));
    }

    let mut var_list = Vec::with_capacity(items.len());
    let mut expr_list = Vec::with_capacity(items.len());
    let mut item_converter: Option<&'static dyn ExpressionConverter> = None;

    for item in &items {
        let caps = WITH_ITEMS_EXPR.captures(item).ok_or_else(|| {
            AppError::new(
                ErrorCategory::UnsupportedFeature,
                format!("Unrecognized with-items expression: '{}' in task '{}'", item, task_name),
            )
            .with_code("WFC-ITEMS-002")
            .with_task(task_name)
        })?;

        var_list.push(caps["var"].to_string());

        let mut expr = caps["expr"].to_string();
        item_converter = expressions::get_converter(&expr);
        if let Some(converter) = item_converter {
            let bare = converter.unwrap_expression(&expr);
            expr = converter.convert_string(&bare, &[]);
        }
        expr_list.push(expr);
    }

    let joined = if expr_list.len() > 1 {
        format!("zip({})", expr_list.join(", "))
    } else {
        expr_list.remove(0)
    };

    // Bare literals carry no dialect of their own; wrap with the workflow's
    // configured one.
    let converter = item_converter.unwrap_or(expr_converter);
    let items_value = format!("{} in {}", var_list.join(", "), converter.wrap_expression(&joined));

    let mut with = Mapping::new();
    with.insert(Value::from("items"), Value::from(items_value));

    if let Some(concurrency) = task_spec.get(Value::from("concurrency")) {
        with.insert(
            Value::from("concurrency"),
            expressions::convert(concurrency, &[]),
        );
    }

    Ok((with, var_list))
}
