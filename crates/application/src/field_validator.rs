use std::collections::BTreeMap;
use std::sync::LazyLock;

use formweave_domain::{
    DocumentErrors, DocumentValues, ValidationRule, ValidationRuleType, value_of,
};
use regex::Regex;
use serde_json::Value;
use tracing::warn;

use crate::value_coercion::{is_present, to_number, to_text};

/// Validation rules per binding key.
pub type FieldRules = BTreeMap<String, Vec<ValidationRule>>;

static EMAIL_SHAPE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").ok());

/// Returns the message of the first rule `value` fails, if any.
#[must_use]
pub fn validate_value(value: &Value, rules: &[ValidationRule]) -> Option<String> {
    rules
        .iter()
        .find(|rule| !rule_accepts(value, rule))
        .map(|rule| rule.message().as_str().to_owned())
}

/// Validates every key in `rules_by_key` and returns the resulting error map.
#[must_use]
pub fn validate_document(values: &DocumentValues, rules_by_key: &FieldRules) -> DocumentErrors {
    rules_by_key
        .iter()
        .filter_map(|(key, rules)| {
            validate_value(value_of(values, key), rules).map(|message| (key.clone(), message))
        })
        .collect()
}

fn rule_accepts(value: &Value, rule: &ValidationRule) -> bool {
    match rule.rule_type() {
        ValidationRuleType::Required => match value {
            Value::Null => false,
            Value::String(text) => !text.trim().is_empty(),
            _ => true,
        },
        ValidationRuleType::Email => {
            !is_present(value)
                || EMAIL_SHAPE
                    .as_ref()
                    .is_none_or(|shape| shape.is_match(to_text(value).as_str()))
        }
        ValidationRuleType::Min => {
            let bound = rule.value().map_or(f64::NAN, to_number);
            !measure(value).is_some_and(|measure| measure < bound)
        }
        ValidationRuleType::Max => {
            let bound = rule.value().map_or(f64::NAN, to_number);
            !measure(value).is_some_and(|measure| measure > bound)
        }
        ValidationRuleType::Pattern => !is_present(value) || pattern_accepts(value, rule),
        ValidationRuleType::Custom => rule
            .validator()
            .is_none_or(|predicate| predicate.accepts(value)),
    }
}

// Strings measure by character count, numbers by magnitude; other shapes are unchecked.
fn measure(value: &Value) -> Option<f64> {
    match value {
        Value::String(text) => Some(text.chars().count() as f64),
        Value::Number(number) => number.as_f64(),
        _ => None,
    }
}

fn pattern_accepts(value: &Value, rule: &ValidationRule) -> bool {
    match rule.compiled_pattern() {
        None => true,
        Some(Ok(expression)) => expression.is_match(to_text(value).as_str()),
        Some(Err(error)) => {
            warn!(
                pattern = rule.pattern_text().unwrap_or_default(),
                error = %error,
                "invalid pattern rule is skipped"
            );
            true
        }
    }
}

#[cfg(test)]
mod tests {
    use formweave_domain::{ValidationRule, ValidationRuleType};
    use serde_json::json;

    use super::{FieldRules, validate_document, validate_value};

    fn rule(rule_type: ValidationRuleType, value: Option<serde_json::Value>, message: &str) -> ValidationRule {
        ValidationRule::new(rule_type, value, message).unwrap_or_else(|_| unreachable!())
    }

    #[test]
    fn first_failing_rule_wins() {
        let rules = vec![
            ValidationRule::required(Some("required")).unwrap_or_else(|_| unreachable!()),
            ValidationRule::pattern("^[0-9]+$", "digits only").unwrap_or_else(|_| unreachable!()),
        ];

        assert_eq!(validate_value(&json!(""), &rules), Some("required".to_owned()));
        assert_eq!(validate_value(&json!("12a"), &rules), Some("digits only".to_owned()));
        assert_eq!(validate_value(&json!("123"), &rules), None);
        assert_eq!(validate_value(&json!("anything"), &[]), None);
    }

    #[test]
    fn required_rejects_null_and_blank_text() {
        let rules = vec![ValidationRule::required(None).unwrap_or_else(|_| unreachable!())];
        assert!(validate_value(&json!(null), &rules).is_some());
        assert!(validate_value(&json!("   "), &rules).is_some());
        assert!(validate_value(&json!(0), &rules).is_none());
        assert!(validate_value(&json!(["a"]), &rules).is_none());
    }

    #[test]
    fn email_checks_only_present_values() {
        let rules = vec![ValidationRule::email(None).unwrap_or_else(|_| unreachable!())];
        assert!(validate_value(&json!(""), &rules).is_none());
        assert!(validate_value(&json!("x@y.com"), &rules).is_none());
        assert_eq!(
            validate_value(&json!("not-an-email"), &rules),
            Some("Please enter a valid email address".to_owned())
        );
        assert!(validate_value(&json!("a b@c.d"), &rules).is_some());
    }

    #[test]
    fn bounds_measure_text_length_and_numbers() {
        let rules = vec![
            ValidationRule::min_length(3, None).unwrap_or_else(|_| unreachable!()),
            ValidationRule::max_length(5, None).unwrap_or_else(|_| unreachable!()),
        ];

        assert_eq!(
            validate_value(&json!("ab"), &rules),
            Some("Must be at least 3 characters long".to_owned())
        );
        assert_eq!(
            validate_value(&json!("abcdef"), &rules),
            Some("Must not exceed 5 characters".to_owned())
        );
        assert!(validate_value(&json!("åäö"), &rules).is_none());
        assert!(validate_value(&json!(4), &rules).is_none());
        assert!(validate_value(&json!(9), &rules).is_some());
        assert!(validate_value(&json!(true), &rules).is_none());
    }

    #[test]
    fn invalid_pattern_passes() {
        let rules = vec![rule(ValidationRuleType::Pattern, Some(json!("([a-z")), "bad")];
        assert!(validate_value(&json!("value"), &rules).is_none());
    }

    #[test]
    fn pattern_is_compiled_once_across_validations() {
        let rules = vec![ValidationRule::pattern("^[a-z]+$", "lowercase only").unwrap_or_else(|_| unreachable!())];

        assert!(validate_value(&json!("abc"), &rules).is_none());
        let compiled = rules[0].compiled_pattern().and_then(Result::ok);
        assert_eq!(validate_value(&json!("ABC"), &rules).as_deref(), Some("lowercase only"));
        let reused = rules[0].compiled_pattern().and_then(Result::ok);

        assert!(matches!((compiled, reused), (Some(left), Some(right)) if std::ptr::eq(left, right)));
    }

    #[test]
    fn custom_predicate_decides() {
        let rules = vec![
            ValidationRule::custom(|value| value.as_str().is_some_and(|text| text.starts_with('Q')), "must start with Q")
                .unwrap_or_else(|_| unreachable!()),
        ];
        assert!(validate_value(&json!("Qry"), &rules).is_none());
        assert!(validate_value(&json!("abc"), &rules).is_some());

        let without_predicate = vec![rule(ValidationRuleType::Custom, None, "unused")];
        assert!(validate_value(&json!("abc"), &without_predicate).is_none());
    }

    #[test]
    fn document_validation_reports_failing_keys_only() {
        let mut rules_by_key = FieldRules::new();
        rules_by_key.insert(
            "email".to_owned(),
            vec![
                ValidationRule::required(None).unwrap_or_else(|_| unreachable!()),
                ValidationRule::email(None).unwrap_or_else(|_| unreachable!()),
            ],
        );
        rules_by_key.insert(
            "name".to_owned(),
            vec![ValidationRule::required(None).unwrap_or_else(|_| unreachable!())],
        );

        let values = match json!({"email": "not-an-email", "name": "Ada"}) {
            serde_json::Value::Object(values) => values,
            _ => unreachable!(),
        };
        let errors = validate_document(&values, &rules_by_key);

        assert_eq!(errors.len(), 1);
        assert_eq!(
            errors.get("email").map(String::as_str),
            Some("Please enter a valid email address")
        );
    }
}
