use crate::core::expressions::converter::{Dialect, ExpressionConverter};
use once_cell::sync::Lazy;
use regex::Regex;

// <% xxx %> -> xxx (greedy: first start token through last end token)
static UNWRAP_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"<%(.*)%>").unwrap());

static DETECT_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"<%.*?%>").unwrap());

// $.var -> ctx().var / item(var)
static CONTEXT_VARS_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\$\.(\w+)").unwrap());

pub struct YaqlExpressionConverter;

impl ExpressionConverter for YaqlExpressionConverter {
    fn dialect(&self) -> Dialect {
        Dialect::Yaql
    }

    fn wrap_expression(&self, expr: &str) -> String {
        format!("<% {} %>", expr)
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unwrap_expression() {
        let result = YaqlExpressionConverter.unwrap_expression("<% $.test %>");
        assert_eq!(result, "$.test");
    }

    #[test]
    fn test_unwrap_expression_nested_delimiters() {
        let result = YaqlExpressionConverter.unwrap_expression("<% $.test <% abc %> %>");
        assert_eq!(result, "$.test <% abc %>");
    }

    #[test]
    fn test_wrap_unwrap_round_trip() {
        let wrapped = YaqlExpressionConverter.wrap_expression("$.test");
        assert_eq!(wrapped, "<% $.test %>");
        assert_eq!(YaqlExpressionConverter.unwrap_expression(&wrapped), "$.test");
    }

    #[test]
    fn test_convert_context_vars() {
        let result = YaqlExpressionConverter.convert_string("<% $.test %>", &[]);
        assert_eq!(result, "<% ctx().test %>");
    }

    #[test]
    fn test_convert_item_vars() {
        let item_vars = vec!["test".to_string()];
        let result = YaqlExpressionConverter.convert_string("<% $.test %>", &item_vars);
        assert_eq!(result, "<% item(test) %>");
    }

    #[test]
    fn test_convert_context_vars_multiple() {
        let result = YaqlExpressionConverter.convert_string("<% $.test + $.other %>", &[]);
        assert_eq!(result, "<% ctx().test + ctx().other %>");
    }

    #[test]
    fn test_convert_task_result() {
        let result = YaqlExpressionConverter.convert_string("<% task('abc').result %>", &[]);
        assert_eq!(result, "<% result() %>");
    }

    #[test]
    fn test_convert_st2kv() {
        let result = YaqlExpressionConverter.convert_string("<% st2kv.user.test.kv %>", &[]);
        assert_eq!(result, "<% st2kv('user.test.kv') %>");
    }

    #[test]
    fn test_convert_st2_helpers() {
        assert_eq!(
            YaqlExpressionConverter.convert_string("<% env().st2_execution_id %>", &[]),
            "<% ctx().st2.action_execution_id %>"
        );
        assert_eq!(
            YaqlExpressionConverter.convert_string("<% env().st2_action_api_url %>", &[]),
            "<% ctx().st2.api_url %>"
        );
    }

    #[test]
    fn test_convert_string_idempotent() {
        let once = YaqlExpressionConverter.convert_string("$.test = st2kv.a.b", &[]);
        let twice = YaqlExpressionConverter.convert_string(&once, &[]);
        assert_eq!(once, twice);
    }
}
