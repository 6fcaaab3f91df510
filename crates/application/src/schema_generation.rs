use std::str::FromStr;

use formweave_core::AppResult;
use formweave_domain::{
    ButtonNode, CheckboxNode, DocumentValues, FieldProps, FileNode, FormSchema, Node, NodeKind,
    RadioNode, SelectNode, SelectOption, TextInputNode, TextInputType, TextareaNode,
    ValidationRule,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Record operation a generated form performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmitAction {
    /// Insert a new record.
    Create,
    /// Change an existing record.
    Update,
    /// Remove an existing record.
    Delete,
}

impl SubmitAction {
    /// Returns the capitalized action name.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Create => "Create",
            Self::Update => "Update",
            Self::Delete => "Delete",
        }
    }
}

/// Length constraints of one column.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnConstraints {
    /// Maximum text length.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u32>,
    /// Minimum text length.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<u32>,
}

/// Column description supplied by a data-source connector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnSchema {
    /// Column name; becomes the binding key.
    pub name: String,
    /// Connector type name such as `string`, `number` or `array`.
    #[serde(rename = "type")]
    pub column_type: String,
    /// Whether the column accepts null.
    #[serde(default)]
    pub nullable: bool,
    /// Whether the column is the primary key.
    #[serde(default)]
    pub is_primary_key: bool,
    /// Length constraints.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constraints: Option<ColumnConstraints>,
}

impl ColumnSchema {
    fn is_array_type(&self) -> bool {
        self.column_type == "array" || self.column_type.contains("[]")
    }
}

/// How one column maps to a form field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnMapping {
    /// Source column.
    pub column: ColumnSchema,
    /// Node tag for the field; unknown tags become `text`.
    pub component_type: String,
    /// Field label.
    pub label: String,
    /// Whether the field is required.
    #[serde(default)]
    pub required: bool,
    /// Default value copied to initial values.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<Value>,
    /// Options for select and radio fields.
    #[serde(default)]
    pub options: Vec<SelectOption>,
}

/// Input of [`generate_form_schema`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormGenerationConfig {
    /// Form title.
    pub title: String,
    /// Form description.
    #[serde(default)]
    pub description: String,
    /// Record operation.
    pub submit_action: SubmitAction,
    /// Whether validation rules are generated.
    #[serde(default)]
    pub include_validation: bool,
    /// Whether column defaults become initial values.
    #[serde(default)]
    pub include_default_values: bool,
    /// Column mappings in field order.
    pub columns: Vec<ColumnMapping>,
}

/// Builds a form schema with one field per mapped column and a submit button.
pub fn generate_form_schema(config: &FormGenerationConfig) -> AppResult<FormSchema> {
    let mut nodes = Vec::with_capacity(config.columns.len() + 1);
    let mut initial_values = DocumentValues::new();

    for mapping in &config.columns {
        if mapping.column.is_primary_key && config.submit_action == SubmitAction::Create {
            continue;
        }

        nodes.push(field_node(mapping, config.include_validation)?);
        if config.include_default_values
            && let Some(default_value) = &mapping.default_value
        {
            initial_values.insert(mapping.column.name.clone(), default_value.clone());
        }
    }

    nodes.push(Node::new(
        "submit-button",
        NodeKind::Button(ButtonNode {
            label: format!("{} Record", config.submit_action.label()),
            variant: Some("primary".to_owned()),
            size: None,
            button_type: Some("submit".to_owned()),
            loading: None,
            icon: None,
            icon_position: None,
        }),
    )?);

    Ok(FormSchema::new(nodes)
        .with_title(config.title.clone())
        .with_description(config.description.clone())
        .with_initial_values(initial_values))
}

/// Rules implied by a column definition alone.
///
/// Non-nullable columns are required; email fields on string columns get an
/// email rule; length constraints become anchored pattern rules.
pub fn column_validation_rules(
    column: &ColumnSchema,
    component_type: Option<&str>,
) -> AppResult<Vec<ValidationRule>> {
    let mut rules = Vec::new();
    if !column.nullable {
        rules.push(ValidationRule::required(Some(
            format!("{} is required", column.name).as_str(),
        ))?);
    }
    if column.column_type == "string" && component_type == Some("email") {
        rules.push(ValidationRule::email(None)?);
    }
    rules.extend(length_rules(column.constraints.as_ref())?);
    Ok(rules)
}

fn field_node(mapping: &ColumnMapping, include_validation: bool) -> AppResult<Node> {
    let column = &mapping.column;
    let constraints = column.constraints.clone().unwrap_or_default();

    let mut field = FieldProps::new(column.name.as_str())?;
    field.label = Some(mapping.label.clone());
    field.required = Some(mapping.required);
    if include_validation {
        field.validation = mapping_validation_rules(mapping)?;
    }

    let kind = match mapping.component_type.as_str() {
        "textarea" => NodeKind::Textarea(TextareaNode {
            field,
            rows: Some(4),
            cols: None,
            min_length: None,
            max_length: constraints.max_length,
            resize: None,
        }),
        "select" => NodeKind::Select(SelectNode {
            field,
            options: mapping.options.clone(),
            multiple: Some(column.is_array_type()),
            data_source: None,
        }),
        "radio" => NodeKind::Radio(RadioNode {
            field,
            options: mapping.options.clone(),
        }),
        "checkbox" => NodeKind::Checkbox(CheckboxNode {
            field,
            options: None,
            single: None,
        }),
        "file" => NodeKind::File(FileNode {
            field,
            accept: None,
            multiple: None,
            max_size: None,
            max_files: None,
        }),
        other => match TextInputType::from_str(other) {
            Ok(input_type) => {
                let mut input = TextInputNode::new(input_type, field);
                input.max_length = constraints.max_length;
                input.min_length = constraints.min_length;
                NodeKind::TextInput(input)
            }
            Err(_) => NodeKind::TextInput(TextInputNode::new(TextInputType::Text, field)),
        },
    };

    Node::new(format!("field-{}", column.name), kind)
}

fn mapping_validation_rules(mapping: &ColumnMapping) -> AppResult<Vec<ValidationRule>> {
    let mut rules = Vec::new();
    if mapping.required {
        rules.push(ValidationRule::required(Some(
            format!("{} is required", mapping.label).as_str(),
        ))?);
    }
    if mapping.component_type == "email" {
        rules.push(ValidationRule::email(None)?);
    }
    rules.extend(length_rules(mapping.column.constraints.as_ref())?);
    Ok(rules)
}

fn length_rules(constraints: Option<&ColumnConstraints>) -> AppResult<Vec<ValidationRule>> {
    let mut rules = Vec::new();
    let Some(constraints) = constraints else {
        return Ok(rules);
    };

    if let Some(max_length) = constraints.max_length.filter(|length| *length > 0) {
        rules.push(ValidationRule::pattern(
            format!("^(?s).{{0,{max_length}}}$"),
            format!("Maximum length is {max_length} characters"),
        )?);
    }
    if let Some(min_length) = constraints.min_length.filter(|length| *length > 0) {
        rules.push(ValidationRule::pattern(
            format!("^(?s).{{{min_length},}}$"),
            format!("Minimum length is {min_length} characters"),
        )?);
    }
    Ok(rules)
}

#[cfg(test)]
mod tests;
