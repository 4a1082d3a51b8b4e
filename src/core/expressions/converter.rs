use once_cell::sync::Lazy;
use regex::{Captures, Regex};

// task('xxx').result -> result()
// The referenced task name is not checked against the enclosing task.
static TASK_RESULT_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"task\(["']?\w+["']?\)\.result"#).unwrap());

// st2kv.system.key -> st2kv('system.key')
static ST2KV_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"st2kv\.([\w.]+)").unwrap());

// env().st2_execution_id -> ctx().st2.action_execution_id
static ST2_EXECUTION_ID_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\benv\(\)\.st2_execution_id\b").unwrap());

// env().st2_action_api_url -> ctx().st2.api_url
static ST2_API_URL_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\benv\(\)\.st2_action_api_url\b").unwrap());

/// The two expression template languages found in Mistral workflows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    Jinja,
    Yaql,
}

impl Dialect {
    pub fn converter(&self) -> &'static dyn ExpressionConverter {
        match self {
            Dialect::Jinja => &super::jinja::JinjaExpressionConverter,
            Dialect::Yaql => &super::yaql::YaqlExpressionConverter,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Dialect::Jinja => "jinja",
            Dialect::Yaql => "yaql",
        }
    }
}

/// Rewrite rules shared by both dialects, parameterized on delimiter and
/// variable-root syntax. Each rewrite is a pure regex substitution and is
/// idempotent when applied to its own output.
pub trait ExpressionConverter: Sync {
    fn dialect(&self) -> Dialect;

    /// Surround a bare expression with the dialect's delimiter tokens.
    fn wrap_expression(&self, expr: &str) -> String;

    /// Strip the outermost delimiter pair, trimming surrounding whitespace.
    /// Matches the first start token through the last end token, so nested
    /// delimiters survive inside the captured body.
    fn unwrap_expression(&self, expr: &str) -> String;

    /// True iff the string contains at least one start+end delimiter pair.
    fn has_expression(&self, text: &str) -> bool;

    /// Pattern matching the dialect's implicit-root variable references.
    fn context_vars_pattern(&self) -> &'static Regex;

    /// `_.name` / `$.name` -> `item(name)` when the first path segment is an
    /// item variable, else `ctx().name`.
    fn convert_context_vars(&self, expr: &str, item_vars: &[String]) -> String {
        self.context_vars_pattern()
            .replace_all(expr, |caps: &Captures| {
                let name = &caps[1];
                if item_vars.iter().any(|v| v == name) {
                    format!("item({})", name)
                } else {
                    format!("ctx().{}", name)
                }
            })
            .into_owned()
    }

    /// Apply the five rewrites in fixed order to a bare expression.
    fn convert_string(&self, expr: &str, item_vars: &[String]) -> String {
        let expr = self.convert_context_vars(expr, item_vars);
        let expr = convert_task_result(&expr);
        let expr = convert_st2kv(&expr);
        let expr = convert_st2_execution_id(&expr);
        convert_st2_api_url(&expr)
    }
}

pub fn convert_task_result(expr: &str) -> String {
    TASK_RESULT_PATTERN.replace_all(expr, "result()").into_owned()
}

pub fn convert_st2kv(expr: &str) -> String {
    ST2KV_PATTERN
        .replace_all(expr, |caps: &Captures| format!("st2kv('{}')", &caps[1]))
        .into_owned()
}

pub fn convert_st2_execution_id(expr: &str) -> String {
    ST2_EXECUTION_ID_PATTERN
        .replace_all(expr, "ctx().st2.action_execution_id")
        .into_owned()
}

pub fn convert_st2_api_url(expr: &str) -> String {
    ST2_API_URL_PATTERN
        .replace_all(expr, "ctx().st2.api_url")
        .into_owned()
}
