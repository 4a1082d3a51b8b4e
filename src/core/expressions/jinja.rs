use crate::core::expressions::converter::{Dialect, ExpressionConverter};
use once_cell::sync::Lazy;
use regex::Regex;

// {{ xxx }} -> xxx (greedy: first start token through last end token)
static UNWRAP_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{\{(.*)\}\}").unwrap());

static DETECT_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{\{.*?\}\}").unwrap());

// _.var -> ctx().var / item(var)
static CONTEXT_VARS_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b_\.(\w+)").unwrap());

pub struct JinjaExpressionConverter;

impl ExpressionConverter for JinjaExpressionConverter {
    fn dialect(&self) -> Dialect {
        Dialect::Jinja
    }

    fn wrap_expression(&self, expr: &str) -> String {
        format!("{{{{ {} }}}}", expr)
    }

    fn unwrap_expression(&self, expr: &str) -> String {
        UNWRAP_PATTERN
            .replace_all(expr, |caps: &regex::Captures| caps[1].trim().to_string())
            .into_owned()
    }

    fn has_expression(&self, text: &str) -> bool {
        DETECT_PATTERN.is_match(text)
    }

    fn context_vars_pattern(&self) -> &'static Regex {
        &CONTEXT_VARS_PATTERN
    }
}
