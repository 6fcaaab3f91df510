use std::collections::BTreeMap;

use serde_json::{Map, Value};

/// Live binding-key to value map of one editing session.
pub type DocumentValues = Map<String, Value>;

/// At most one current error message per binding key.
pub type DocumentErrors = BTreeMap<String, String>;

/// Reads one binding key; absent keys read as `null`.
#[must_use]
pub fn value_of<'a>(values: &'a DocumentValues, key: &str) -> &'a Value {
    values.get(key).unwrap_or(&Value::Null)
}
