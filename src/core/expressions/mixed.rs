//! Conversion for strings that interleave Jinja and YAQL spans, e.g. action
//! command lines like `ping <% $.ping_flags %> {{ _.target_host }}`. Each
//! delimited span is unwrapped, rewritten with its own dialect's rules, and
//! re-wrapped in place; text outside the spans is left untouched.

use crate::core::expressions;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde_yaml::{Mapping, Value};
use tracing::warn;

static JINJA_SPAN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{\{\s*.+?\s*\}\}").unwrap());
static YAQL_SPAN: Lazy<Regex> = Lazy::new(|| Regex::new(r"<%\s*.+?\s*%>").unwrap());

/// Recursive value conversion mirroring the dispatcher, but routing every
/// embedded span through its own dialect.
pub fn convert(value: &Value, item_vars: &[String]) -> Value {
    match value {
        Value::Mapping(map) => Value::Mapping(convert_mapping(map, item_vars)),
        Value::Sequence(seq) => {
            Value::Sequence(seq.iter().map(|v| convert(v, item_vars)).collect())
        }
        Value::String(s) => Value::String(convert_string(s, item_vars)),
        Value::Bool(_) | Value::Null => value.clone(),
        Value::Number(n) if n.is_i64() || n.is_u64() => value.clone(),
        other => {
            warn!(
                "could not recognize expression '{:?}'; results may not be accurate",
                other
            );
            other.clone()
        }
    }
}

pub fn convert_mapping(map: &Mapping, item_vars: &[String]) -> Mapping {
    map.iter()
        .map(|(k, v)| (k.clone(), convert(v, item_vars)))
        .collect()
}

/// Two independent passes, one per dialect, over non-overlapping minimal
/// spans.
pub fn convert_string(text: &str, item_vars: &[String]) -> String {
    let text = JINJA_SPAN
        .replace_all(text, |caps: &Captures| convert_span(&caps[0], item_vars))
        .into_owned();
    YAQL_SPAN
        .replace_all(&text, |caps: &Captures| convert_span(&caps[0], item_vars))
        .into_owned()
}

fn convert_span(span: &str, item_vars: &[String]) -> String {
    match expressions::get_converter(span) {
        Some(converter) => {
            let bare = converter.unwrap_expression(span);
            let converted = converter.convert_string(&bare, item_vars);
            converter.wrap_expression(&converted)
        }
        None => span.to_string(),
    }
}
