use std::fmt::{Debug, Formatter};
use std::sync::{Arc, OnceLock};

use formweave_core::{AppResult, NonEmptyString};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Supported validation rule kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationRuleType {
    /// Value must be present and not blank.
    Required,
    /// Present value must look like an email address.
    Email,
    /// Lower bound on string length or numeric magnitude.
    Min,
    /// Upper bound on string length or numeric magnitude.
    Max,
    /// Present value must match a regular expression.
    Pattern,
    /// In-process predicate must accept the value.
    Custom,
}

impl ValidationRuleType {
    /// Returns stable storage value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Required => "required",
            Self::Email => "email",
            Self::Min => "min",
            Self::Max => "max",
            Self::Pattern => "pattern",
            Self::Custom => "custom",
        }
    }
}

/// In-process predicate backing a custom validation rule.
///
/// Predicates cannot cross a process boundary, so they are never serialized.
#[derive(Clone)]
pub struct FieldPredicate(Arc<dyn Fn(&Value) -> bool + Send + Sync>);

impl FieldPredicate {
    /// Wraps a predicate closure.
    pub fn new(predicate: impl Fn(&Value) -> bool + Send + Sync + 'static) -> Self {
        Self(Arc::new(predicate))
    }

    /// Runs the predicate against one value.
    #[must_use]
    pub fn accepts(&self, value: &Value) -> bool {
        (self.0)(value)
    }
}

impl Debug for FieldPredicate {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str("FieldPredicate(..)")
    }
}

/// One constraint checked against a field value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationRule {
    #[serde(rename = "type")]
    rule_type: ValidationRuleType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    value: Option<Value>,
    message: NonEmptyString,
    #[serde(skip)]
    validator: Option<FieldPredicate>,
    #[serde(skip)]
    compiled_pattern: OnceLock<Result<Regex, regex::Error>>,
}

impl PartialEq for ValidationRule {
    // Predicates are excluded from equality.
    fn eq(&self, other: &Self) -> bool {
        self.rule_type == other.rule_type
            && self.value == other.value
            && self.message == other.message
    }
}

impl ValidationRule {
    /// Creates a validated rule without a predicate.
    pub fn new(
        rule_type: ValidationRuleType,
        value: Option<Value>,
        message: impl Into<String>,
    ) -> AppResult<Self> {
        Ok(Self {
            rule_type,
            value,
            message: NonEmptyString::new(message)?,
            validator: None,
            compiled_pattern: OnceLock::new(),
        })
    }

    /// Rule failing on absent, null or blank values.
    pub fn required(message: Option<&str>) -> AppResult<Self> {
        Self::new(
            ValidationRuleType::Required,
            None,
            message.unwrap_or("This field is required"),
        )
    }

    /// Rule failing on present values that do not look like an email address.
    pub fn email(message: Option<&str>) -> AppResult<Self> {
        Self::new(
            ValidationRuleType::Email,
            None,
            message.unwrap_or("Please enter a valid email address"),
        )
    }

    /// Rule enforcing a minimum string length or numeric value.
    pub fn min_length(length: u64, message: Option<&str>) -> AppResult<Self> {
        let message = message
            .map(ToOwned::to_owned)
            .unwrap_or_else(|| format!("Must be at least {length} characters long"));
        Self::new(ValidationRuleType::Min, Some(Value::from(length)), message)
    }

    /// Rule enforcing a maximum string length or numeric value.
    pub fn max_length(length: u64, message: Option<&str>) -> AppResult<Self> {
        let message = message
            .map(ToOwned::to_owned)
            .unwrap_or_else(|| format!("Must not exceed {length} characters"));
        Self::new(ValidationRuleType::Max, Some(Value::from(length)), message)
    }

    /// Rule requiring present values to match `pattern`.
    pub fn pattern(pattern: impl Into<String>, message: impl Into<String>) -> AppResult<Self> {
        Self::new(
            ValidationRuleType::Pattern,
            Some(Value::String(pattern.into())),
            message,
        )
    }

    /// Rule delegating to an in-process predicate.
    pub fn custom(
        predicate: impl Fn(&Value) -> bool + Send + Sync + 'static,
        message: impl Into<String>,
    ) -> AppResult<Self> {
        let mut rule = Self::new(ValidationRuleType::Custom, None, message)?;
        rule.validator = Some(FieldPredicate::new(predicate));
        Ok(rule)
    }

    /// Returns rule kind.
    #[must_use]
    pub fn rule_type(&self) -> ValidationRuleType {
        self.rule_type
    }

    /// Returns the optional operand (bound or pattern).
    #[must_use]
    pub fn value(&self) -> Option<&Value> {
        self.value.as_ref()
    }

    /// Returns the user-facing failure message.
    #[must_use]
    pub fn message(&self) -> &NonEmptyString {
        &self.message
    }

    /// Returns the in-process predicate, if any.
    #[must_use]
    pub fn validator(&self) -> Option<&FieldPredicate> {
        self.validator.as_ref()
    }

    /// Returns the pattern text for pattern rules.
    #[must_use]
    pub fn pattern_text(&self) -> Option<&str> {
        match self.rule_type {
            ValidationRuleType::Pattern => self.value.as_ref().and_then(Value::as_str),
            _ => None,
        }
    }

    /// Returns the compiled pattern for pattern rules.
    ///
    /// The expression is compiled on first use and shared by clones made
    /// afterwards.
    pub fn compiled_pattern(&self) -> Option<Result<&Regex, &regex::Error>> {
        let pattern = self.pattern_text()?;
        Some(
            self.compiled_pattern
                .get_or_init(|| Regex::new(pattern))
                .as_ref(),
        )
    }
}
