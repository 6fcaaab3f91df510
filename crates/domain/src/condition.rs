use formweave_core::{AppError, AppResult, NonEmptyString};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Comparison operator of one visibility condition.
///
/// Persisted schemas may carry operators this build does not know about; those
/// are kept verbatim in [`ConditionOperator::Unsupported`] so the document still
/// loads and the condition evaluates to `false`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ConditionOperator {
    /// Field value equals the operand.
    Equals,
    /// Field value does not equal the operand.
    NotEquals,
    /// Array membership or substring match.
    Contains,
    /// Negated array membership or substring match.
    NotContains,
    /// Numeric greater-than comparison.
    GreaterThan,
    /// Numeric less-than comparison.
    LessThan,
    /// Field value is a member of the operand array.
    In,
    /// Field value is not a member of the operand array.
    NotIn,
    /// Operator name not recognized by this build.
    Unsupported(String),
}

impl ConditionOperator {
    /// Returns stable storage value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Equals => "equals",
            Self::NotEquals => "notEquals",
            Self::Contains => "contains",
            Self::NotContains => "notContains",
            Self::GreaterThan => "greaterThan",
            Self::LessThan => "lessThan",
            Self::In => "in",
            Self::NotIn => "notIn",
            Self::Unsupported(raw) => raw.as_str(),
        }
    }

    /// Returns whether this operator is one of the known operators.
    #[must_use]
    pub fn is_supported(&self) -> bool {
        !matches!(self, Self::Unsupported(_))
    }
}

impl From<String> for ConditionOperator {
    fn from(value: String) -> Self {
        match value.as_str() {
            "equals" => Self::Equals,
            "notEquals" => Self::NotEquals,
            "contains" => Self::Contains,
            "notContains" => Self::NotContains,
            "greaterThan" => Self::GreaterThan,
            "lessThan" => Self::LessThan,
            "in" => Self::In,
            "notIn" => Self::NotIn,
            _ => Self::Unsupported(value),
        }
    }
}

impl From<ConditionOperator> for String {
    fn from(value: ConditionOperator) -> Self {
        match value {
            ConditionOperator::Unsupported(raw) => raw,
            known => known.as_str().to_owned(),
        }
    }
}

/// Combinator joining a condition with its nested rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogicalMode {
    /// Base result and every nested result must hold.
    And,
    /// Base result or any nested result must hold.
    Or,
}

impl LogicalMode {
    /// Returns stable storage value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::And => "and",
            Self::Or => "or",
        }
    }
}

/// Boolean rule over document values controlling node visibility.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    field: NonEmptyString,
    operator: ConditionOperator,
    #[serde(default)]
    value: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    logic: Option<LogicalMode>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    rules: Vec<Condition>,
}

impl Condition {
    /// Creates a leaf condition without nested rules.
    pub fn new(
        field: impl Into<String>,
        operator: ConditionOperator,
        value: Value,
    ) -> AppResult<Self> {
        Ok(Self {
            field: NonEmptyString::new(field)?,
            operator,
            value,
            logic: None,
            rules: Vec::new(),
        })
    }

    /// Attaches nested rules combined with this condition through `logic`.
    pub fn with_rules(mut self, logic: LogicalMode, rules: Vec<Condition>) -> AppResult<Self> {
        if rules.is_empty() {
            return Err(AppError::Validation(
                "nested condition groups must include at least one rule".to_owned(),
            ));
        }

        self.logic = Some(logic);
        self.rules = rules;
        Ok(self)
    }

    /// Returns the binding key read from document values.
    #[must_use]
    pub fn field(&self) -> &NonEmptyString {
        &self.field
    }

    /// Returns the comparison operator.
    #[must_use]
    pub fn operator(&self) -> &ConditionOperator {
        &self.operator
    }

    /// Returns the comparison operand.
    #[must_use]
    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Returns the optional combinator for nested rules.
    #[must_use]
    pub fn logic(&self) -> Option<LogicalMode> {
        self.logic
    }

    /// Returns nested rules in declared order.
    #[must_use]
    pub fn rules(&self) -> &[Condition] {
        &self.rules
    }

    /// Visits this condition and every nested rule depth-first.
    pub fn for_each(&self, visit: &mut impl FnMut(&Condition)) {
        visit(self);
        for rule in &self.rules {
            rule.for_each(visit);
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{Condition, ConditionOperator, LogicalMode};

    #[test]
    fn unknown_operator_survives_round_trip() {
        let parsed = serde_json::from_value::<Condition>(json!({
            "field": "plan",
            "operator": "startsWith",
            "value": "pro"
        }));
        assert!(parsed.is_ok());
        let parsed = parsed.unwrap_or_else(|_| unreachable!());

        assert_eq!(
            parsed.operator(),
            &ConditionOperator::Unsupported("startsWith".to_owned())
        );
        assert!(!parsed.operator().is_supported());

        let written = serde_json::to_value(&parsed).unwrap_or_else(|_| unreachable!());
        assert_eq!(written["operator"], json!("startsWith"));
    }

    #[test]
    fn nested_group_requires_rules() {
        let base = Condition::new("plan", ConditionOperator::Equals, json!("pro"))
            .unwrap_or_else(|_| unreachable!());
        assert!(base.with_rules(LogicalMode::And, Vec::new()).is_err());
    }

    #[test]
    fn condition_rejects_empty_field() {
        let result = Condition::new("  ", ConditionOperator::Equals, json!(true));
        assert!(result.is_err());
    }

    #[test]
    fn for_each_visits_nested_rules_in_order() {
        let nested = Condition::new("age", ConditionOperator::GreaterThan, json!(18))
            .unwrap_or_else(|_| unreachable!());
        let condition = Condition::new("plan", ConditionOperator::NotEquals, json!("free"))
            .and_then(|condition| condition.with_rules(LogicalMode::And, vec![nested]))
            .unwrap_or_else(|_| unreachable!());

        let mut fields = Vec::new();
        condition.for_each(&mut |rule| fields.push(rule.field().as_str().to_owned()));
        assert_eq!(fields, vec!["plan".to_owned(), "age".to_owned()]);
    }
}
