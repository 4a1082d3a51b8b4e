pub mod converter;
pub mod jinja;
pub mod mixed;
pub mod yaql;

pub use converter::{Dialect, ExpressionConverter};

use serde_yaml::{Mapping, Value};
use tracing::warn;

/// Recursively convert every embedded expression in a YAML value.
///
/// Mappings and sequences recurse (mapping keys included) preserving
/// insertion order. Booleans, null, and integers pass through unchanged.
/// Anything else passes through with a non-fatal diagnostic.
pub fn convert(value: &Value, item_vars: &[String]) -> Value {
    match value {
        Value::Mapping(map) => Value::Mapping(convert_mapping(map, item_vars)),
        Value::Sequence(seq) => Value::Sequence(convert_sequence(seq, item_vars)),
        Value::String(expr) => Value::String(convert_string(expr, item_vars)),
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
        .map(|(k, v)| (convert(k, item_vars), convert(v, item_vars)))
        .collect()
}

pub fn convert_sequence(seq: &[Value], item_vars: &[String]) -> Vec<Value> {
    seq.iter().map(|v| convert(v, item_vars)).collect()
}

/// Rewrite a string through the converter whose delimiters it carries, or
/// return it untouched when it holds no recognizable expression.
pub fn convert_string(expr: &str, item_vars: &[String]) -> String {
    match get_converter(expr) {
        Some(converter) => converter.convert_string(expr, item_vars),
        None => expr.to_string(),
    }
}

/// Which dialect's delimiters the string carries, if any. A string holding
/// both kinds of delimiters reports the Jinja dialect; the mixed converter
/// handles each span independently.
pub fn expression_type(expr: &str) -> Option<Dialect> {
    for dialect in [Dialect::Jinja, Dialect::Yaql] {
        if dialect.converter().has_expression(expr) {
            return Some(dialect);
        }
    }
    None
}

pub fn get_converter(expr: &str) -> Option<&'static dyn ExpressionConverter> {
    expression_type(expr).map(|dialect| dialect.converter())
}

/// Strip the delimiters from a recognized expression; opaque literals come
/// back unchanged.
pub fn unwrap_expression(expr: &str) -> String {
    match get_converter(expr) {
        Some(converter) => converter.unwrap_expression(expr),
        None => expr.to_string(),
    }
}
