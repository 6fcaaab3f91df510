use formweave_domain::{Condition, ConditionOperator, DocumentValues, LogicalMode, value_of};
use serde_json::Value;
use tracing::warn;

use crate::value_coercion::{to_number, to_text, values_equal};

/// Returns whether a node guarded by `condition` is visible.
///
/// A missing condition means always visible.
#[must_use]
pub fn is_visible(condition: Option<&Condition>, values: &DocumentValues) -> bool {
    condition.is_none_or(|condition| evaluate_condition(condition, values))
}

/// Evaluates one condition against document values. Never fails.
///
/// Nested rules are all evaluated, then folded into the base result through
/// the condition's logic. Nested rules without logic are ignored.
#[must_use]
pub fn evaluate_condition(condition: &Condition, values: &DocumentValues) -> bool {
    let base = operator_matches(condition, value_of(values, condition.field().as_str()));
    if condition.rules().is_empty() {
        return base;
    }

    let nested: Vec<bool> = condition
        .rules()
        .iter()
        .map(|rule| evaluate_condition(rule, values))
        .collect();

    match condition.logic() {
        Some(LogicalMode::And) => base && nested.iter().all(|matched| *matched),
        Some(LogicalMode::Or) => base || nested.iter().any(|matched| *matched),
        None => {
            warn!(
                field = %condition.field(),
                nested_rules = nested.len(),
                "nested condition rules without logic are ignored"
            );
            base
        }
    }
}

fn operator_matches(condition: &Condition, field_value: &Value) -> bool {
    let operand = condition.value();
    match condition.operator() {
        ConditionOperator::Equals => values_equal(field_value, operand),
        ConditionOperator::NotEquals => !values_equal(field_value, operand),
        ConditionOperator::Contains => contains(field_value, operand),
        ConditionOperator::NotContains => !contains(field_value, operand),
        ConditionOperator::GreaterThan => to_number(field_value) > to_number(operand),
        ConditionOperator::LessThan => to_number(field_value) < to_number(operand),
        ConditionOperator::In => operand
            .as_array()
            .is_some_and(|items| items.iter().any(|item| values_equal(item, field_value))),
        ConditionOperator::NotIn => operand
            .as_array()
            .is_some_and(|items| !items.iter().any(|item| values_equal(item, field_value))),
        ConditionOperator::Unsupported(operator) => {
            warn!(
                field = %condition.field(),
                operator = %operator,
                "unsupported condition operator evaluates to false"
            );
            false
        }
    }
}

fn contains(field_value: &Value, operand: &Value) -> bool {
    match field_value {
        Value::Array(items) => items.iter().any(|item| values_equal(item, operand)),
        other => to_text(other).contains(to_text(operand).as_str()),
    }
}
