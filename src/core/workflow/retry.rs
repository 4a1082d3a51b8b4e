use crate::core::error::{AppError, ErrorCategory};
use crate::core::expressions;
use crate::core::expressions::converter::Dialect;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_yaml::{Mapping, Value};
use tracing::warn;

// A single binary comparison with no boolean connectives. Operator chars
// are excluded from both operands so chained comparisons fail to match.
static SIMPLE_COMPARISON: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*([^<>=!]+?)\s*(==|!=|<=|>=|=|<|>)\s*([^<>=!]+?)\s*$").unwrap());

static BOOLEAN_CONNECTIVE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(and|or|not)\b").unwrap());

/// Convert a Mistral `retry` block. Mistral guards describe when retrying
/// continues or stops; the target dialect's `when` describes when a retry
/// fires, so continue-on must be logically inverted and break-on negated.
pub fn convert_retry(task_name: &str, retry: &Value, force: bool) -> Result<Value, AppError> {
    let retry_spec = retry.as_mapping().ok_or_else(|| {
        AppError::new(
            ErrorCategory::Structural,
            format!("Retry specification in task '{}' is not a mapping", task_name),
        )
        .with_code("WFC-RETRY-001")
        .with_task(task_name)
    })?;

    let continue_on = guard_string(retry_spec, "continue-on", task_name)?;
    let break_on = guard_string(retry_spec, "break-on", task_name)?;

    if let (Some(cont), Some(brk)) = (&continue_on, &break_on) {
        return Err(AppError::new(
            ErrorCategory::UnsupportedFeature,
            format!(
                "Cannot convert both continue-on ({}) and break-on ({}) expressions in task '{}'",
                cont, brk, task_name
            ),
        )
        .with_code("WFC-RETRY-002")
        .with_task(task_name)
        .with_suggestion(
            "Split the retry criteria into a single expression before converting",
        ));
    }

    let when = if let Some(expr) = &continue_on {
        Some(convert_guard(task_name, expr, GuardKind::ContinueOn, force)?)
    } else if let Some(expr) = &break_on {
        Some(convert_guard(task_name, expr, GuardKind::BreakOn, force)?)
    } else {
        None
    };

    let mut result = Mapping::new();
    if let Some(when) = when {
        result.insert(Value::from("when"), Value::from(when));
    }
    for (key, value) in retry_spec {
        if matches!(key.as_str(), Some("continue-on") | Some("break-on")) {
            continue;
        }
        result.insert(key.clone(), expressions::convert(value, &[]));
    }

    Ok(Value::Mapping(result))
}

#[derive(Clone, Copy)]
enum GuardKind {
    ContinueOn,
    BreakOn,
}

fn guard_string(
    retry_spec: &Mapping,
    key: &str,
    task_name: &str,
) -> Result<Option<String>, AppError> {
    match retry_spec.get(Value::from(key)) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(other) => Err(AppError::new(
            ErrorCategory::Structural,
            format!(
                "Retry '{}' in task '{}' is not a string: {:?}",
                key, task_name, other
            ),
        )
        .with_code("WFC-RETRY-003")
        .with_task(task_name)),
    }
}

fn convert_guard(
    task_name: &str,
    expr: &str,
    kind: GuardKind,
    force: bool,
) -> Result<String, AppError> {
    let converter = expressions::get_converter(expr).ok_or_else(|| {
        AppError::new(
            ErrorCategory::Structural,
            format!(
                "Retry guard in task '{}' is not a recognized expression: '{}'",
                task_name, expr
            ),
        )
        .with_code("WFC-RETRY-004")
        .with_task(task_name)
    })?;

    let bare = converter.unwrap_expression(expr);
    let rewritten = converter.convert_string(&bare, &[]);

    if let Some(inverted) = invert_comparison(&rewritten, converter.dialect()) {
        return Ok(converter.wrap_expression(&inverted));
    }

    match kind {
        // A compound stop condition negates cleanly.
        GuardKind::BreakOn => Ok(converter.wrap_expression(&format!("not ({})", rewritten))),
        // A compound continue condition cannot be inverted term by term, and
        // wrapping it in not() changes retry semantics on partial failures.
        GuardKind::ContinueOn => {
            let ambiguous = AppError::new(
                ErrorCategory::AmbiguousRewrite,
                format!(
                    "Cannot automatically invert the continue-on expression ({}) in task '{}'",
                    expr, task_name
                ),
            )
            .with_code("WFC-RETRY-005")
            .with_task(task_name)
            .with_suggestion(
                "Rerun with --force to keep the expression as-is, then invert it by hand",
            );

            if force && ambiguous.is_force_downgradable() {
                warn!(
                    task = task_name,
                    expression = expr,
                    "continue-on expression is too complex to invert and was kept \
                     as-is; see the Orquesta retry migration notes and review the \
                     converted workflow by hand"
                );
                Ok(converter.wrap_expression(&rewritten))
            } else {
                Err(ambiguous)
            }
        }
    }
}

/// Invert a simple binary comparison. Returns None when the expression is
/// compound or is not a comparison at all.
fn invert_comparison(expr: &str, dialect: Dialect) -> Option<String> {
    if BOOLEAN_CONNECTIVE.is_match(expr) {
        return None;
    }
    let caps = SIMPLE_COMPARISON.captures(expr)?;
    let inverted = invert_operator(&caps[2], dialect)?;
    Some(format!("{} {} {}", &caps[1], inverted, &caps[3]))
}

fn invert_operator(op: &str, dialect: Dialect) -> Option<&'static str> {
    let inverted = match op {
        "=" | "==" => "!=",
        "!=" => match dialect {
            Dialect::Yaql => "=",
            Dialect::Jinja => "==",
        },
        "<" => ">=",
        "<=" => ">",
        ">" => "<=",
        ">=" => "<",
        _ => return None,
    };
    Some(inverted)
}
