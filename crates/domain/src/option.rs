use std::collections::BTreeMap;

use formweave_core::{AppResult, NonEmptyString};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value, json};

/// Stored value of one selectable option.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OptionValue {
    /// Text option value.
    Text(String),
    /// Numeric option value.
    Number(Number),
}

impl OptionValue {
    /// Returns the option value as a document value.
    #[must_use]
    pub fn to_value(&self) -> Value {
        match self {
            Self::Text(text) => Value::String(text.clone()),
            Self::Number(number) => Value::Number(number.clone()),
        }
    }
}

impl From<&str> for OptionValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

/// One selectable option of a select, radio or checkbox node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectOption {
    /// Stored value.
    pub value: OptionValue,
    /// Display label.
    pub label: String,
    /// Whether the option is shown but not selectable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disabled: Option<bool>,
    /// Optional group heading.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
}

impl SelectOption {
    /// Creates an enabled, ungrouped option.
    #[must_use]
    pub fn new(value: impl Into<OptionValue>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
            disabled: None,
            group: None,
        }
    }
}

/// Bucket name used for options without a group.
pub const DEFAULT_OPTION_GROUP: &str = "default";

/// Buckets options by group, preserving first-appearance order of groups and
/// declared order of options inside each group.
#[must_use]
pub fn group_options(options: &[SelectOption]) -> Vec<(String, Vec<&SelectOption>)> {
    let mut groups: Vec<(String, Vec<&SelectOption>)> = Vec::new();
    for option in options {
        let group = option.group.as_deref().unwrap_or(DEFAULT_OPTION_GROUP);
        match groups.iter_mut().find(|(name, _)| name == group) {
            Some((_, bucket)) => bucket.push(option),
            None => groups.push((group.to_owned(), vec![option])),
        }
    }

    groups
}

/// HTTP method used by a remote option source.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    /// GET request.
    #[default]
    Get,
    /// POST request.
    Post,
}

/// Remote list of options for a select node.
///
/// Fetching is done by an external connector; the core only describes the
/// request and maps returned rows to options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionSource {
    url: NonEmptyString,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    method: Option<HttpMethod>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    headers: Option<BTreeMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    params: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    value_field: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    label_field: Option<String>,
}

impl OptionSource {
    /// Creates a GET option source for one URL.
    pub fn new(url: impl Into<String>) -> AppResult<Self> {
        Ok(Self {
            url: NonEmptyString::new(url)?,
            method: None,
            headers: None,
            params: None,
            value_field: None,
            label_field: None,
        })
    }

    /// Sets request query parameters.
    #[must_use]
    pub fn with_params(mut self, params: Map<String, Value>) -> Self {
        self.params = Some(params);
        self
    }

    /// Sets row field names used for option value and label.
    #[must_use]
    pub fn with_fields(mut self, value_field: Option<String>, label_field: Option<String>) -> Self {
        self.value_field = value_field;
        self.label_field = label_field;
        self
    }

    /// Returns request URL.
    #[must_use]
    pub fn url(&self) -> &NonEmptyString {
        &self.url
    }

    /// Returns request method, defaulting to GET.
    #[must_use]
    pub fn method(&self) -> HttpMethod {
        self.method.unwrap_or_default()
    }

    /// Returns request headers.
    #[must_use]
    pub fn headers(&self) -> Option<&BTreeMap<String, String>> {
        self.headers.as_ref()
    }

    /// Returns request query parameters.
    #[must_use]
    pub fn params(&self) -> Option<&Map<String, Value>> {
        self.params.as_ref()
    }

    /// Returns the cache key identifying this request.
    ///
    /// Headers and field mappings are not part of the signature.
    #[must_use]
    pub fn request_signature(&self) -> String {
        json!({
            "url": self.url.as_str(),
            "method": self.method,
            "params": self.params,
        })
        .to_string()
    }

    /// Maps raw rows returned by a connector to options.
    ///
    /// Non-array payloads map to no options. Values fall back from the
    /// configured value field to `id` and `value`; labels from the configured
    /// label field to `name`, `label` and finally the row text.
    #[must_use]
    pub fn options_from_rows(&self, rows: &Value) -> Vec<SelectOption> {
        let Some(rows) = rows.as_array() else {
            return Vec::new();
        };

        let value_field = self.value_field.as_deref().unwrap_or("value");
        let label_field = self.label_field.as_deref().unwrap_or("label");

        rows.iter()
            .map(|row| {
                let value = first_present(row, &[value_field, "id", "value"])
                    .map(option_value_from)
                    .unwrap_or_else(|| OptionValue::Text(String::new()));
                let label = first_present(row, &[label_field, "name", "label"])
                    .map(display_text)
                    .unwrap_or_else(|| display_text(row));

                SelectOption {
                    value,
                    label,
                    disabled: None,
                    group: None,
                }
            })
            .collect()
    }
}

fn first_present<'a>(row: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|key| row.get(*key))
        .find(|value| is_present(value))
}

fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::String(text) => !text.is_empty(),
        Value::Number(number) => number.as_f64().is_some_and(|number| number != 0.0),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn option_value_from(value: &Value) -> OptionValue {
    match value {
        Value::Number(number) => OptionValue::Number(number.clone()),
        other => OptionValue::Text(display_text(other)),
    }
}

fn display_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}
