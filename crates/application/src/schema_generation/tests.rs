use formweave_domain::{NodeKind, SelectOption, ValidationRuleType};
use serde_json::json;

use crate::field_validator::validate_value;

use super::{
    ColumnConstraints, ColumnMapping, ColumnSchema, FormGenerationConfig, SubmitAction,
    column_validation_rules, generate_form_schema,
};

fn column(name: &str, column_type: &str) -> ColumnSchema {
    ColumnSchema {
        name: name.to_owned(),
        column_type: column_type.to_owned(),
        nullable: true,
        is_primary_key: false,
        constraints: None,
    }
}

fn mapping(column: ColumnSchema, component_type: &str, label: &str) -> ColumnMapping {
    ColumnMapping {
        column,
        component_type: component_type.to_owned(),
        label: label.to_owned(),
        required: false,
        default_value: None,
        options: Vec::new(),
    }
}

fn config(submit_action: SubmitAction, columns: Vec<ColumnMapping>) -> FormGenerationConfig {
    FormGenerationConfig {
        title: "Customers".to_owned(),
        description: "Customer record".to_owned(),
        submit_action,
        include_validation: true,
        include_default_values: true,
        columns,
    }
}

#[test]
fn create_forms_skip_primary_keys_and_end_with_submit_button() {
    let mut id_column = column("id", "integer");
    id_column.is_primary_key = true;
    let columns = vec![
        mapping(id_column, "number", "Id"),
        mapping(column("name", "string"), "text", "Name"),
    ];

    let schema = generate_form_schema(&config(SubmitAction::Create, columns))
        .unwrap_or_else(|_| unreachable!());

    let ids: Vec<&str> = schema.nodes().iter().map(|node| node.id().as_str()).collect();
    assert_eq!(ids, vec!["field-name", "submit-button"]);
    assert_eq!(schema.title(), Some("Customers"));

    let Some(NodeKind::Button(button)) = schema.nodes().last().map(|node| node.kind()) else {
        unreachable!()
    };
    assert_eq!(button.label, "Create Record");
    assert_eq!(button.button_type.as_deref(), Some("submit"));
}

#[test]
fn update_forms_keep_primary_keys() {
    let mut id_column = column("id", "integer");
    id_column.is_primary_key = true;

    let schema = generate_form_schema(&config(
        SubmitAction::Update,
        vec![mapping(id_column, "number", "Id")],
    ))
    .unwrap_or_else(|_| unreachable!());

    assert_eq!(schema.nodes().len(), 2);
    assert_eq!(schema.nodes()[0].tag(), "number");
}

#[test]
fn component_types_map_to_node_kinds() {
    let mut tags_column = column("tags", "text[]");
    tags_column.constraints = Some(ColumnConstraints {
        max_length: Some(10),
        min_length: None,
    });
    let mut notes_column = column("notes", "string");
    notes_column.constraints = Some(ColumnConstraints {
        max_length: Some(500),
        min_length: Some(2),
    });
    let mut tags = mapping(tags_column, "select", "Tags");
    tags.options = vec![SelectOption::new("vip", "VIP")];

    let schema = generate_form_schema(&config(
        SubmitAction::Create,
        vec![
            tags,
            mapping(notes_column, "textarea", "Notes"),
            mapping(column("rating", "integer"), "slider", "Rating"),
        ],
    ))
    .unwrap_or_else(|_| unreachable!());

    let nodes = schema.nodes();
    let NodeKind::Select(select) = nodes[0].kind() else {
        unreachable!()
    };
    assert_eq!(select.multiple, Some(true));
    assert_eq!(select.options.len(), 1);

    let NodeKind::Textarea(textarea) = nodes[1].kind() else {
        unreachable!()
    };
    assert_eq!(textarea.rows, Some(4));
    assert_eq!(textarea.max_length, Some(500));
    assert_eq!(textarea.min_length, None);

    assert_eq!(nodes[2].tag(), "text");
}

#[test]
fn text_family_inputs_carry_length_attributes() {
    let mut code_column = column("code", "string");
    code_column.constraints = Some(ColumnConstraints {
        max_length: Some(8),
        min_length: Some(3),
    });

    let schema = generate_form_schema(&config(
        SubmitAction::Create,
        vec![mapping(code_column, "password", "Code")],
    ))
    .unwrap_or_else(|_| unreachable!());

    let NodeKind::TextInput(input) = schema.nodes()[0].kind() else {
        unreachable!()
    };
    assert_eq!(schema.nodes()[0].tag(), "password");
    assert_eq!(input.max_length, Some(8));
    assert_eq!(input.min_length, Some(3));
}

#[test]
fn generated_rules_enforce_length_constraints() {
    let mut email_column = column("email", "string");
    email_column.constraints = Some(ColumnConstraints {
        max_length: Some(12),
        min_length: Some(6),
    });
    let mut email = mapping(email_column, "email", "Email");
    email.required = true;

    let schema = generate_form_schema(&config(SubmitAction::Create, vec![email]))
        .unwrap_or_else(|_| unreachable!());
    let rules = schema.nodes()[0].validation_rules();

    let kinds: Vec<ValidationRuleType> = rules.iter().map(|rule| rule.rule_type()).collect();
    assert_eq!(
        kinds,
        vec![
            ValidationRuleType::Required,
            ValidationRuleType::Email,
            ValidationRuleType::Pattern,
            ValidationRuleType::Pattern,
        ]
    );
    assert_eq!(
        validate_value(&json!(""), rules).as_deref(),
        Some("Email is required")
    );
    assert_eq!(validate_value(&json!("a@b.co"), rules), None);
    assert_eq!(
        validate_value(&json!("longer@example.com"), rules).as_deref(),
        Some("Maximum length is 12 characters")
    );
}

#[test]
fn validation_and_defaults_are_optional() {
    let mut country = mapping(column("country", "string"), "text", "Country");
    country.required = true;
    country.default_value = Some(json!("NO"));

    let mut without = config(SubmitAction::Create, vec![country.clone()]);
    without.include_validation = false;
    without.include_default_values = false;
    let bare = generate_form_schema(&without).unwrap_or_else(|_| unreachable!());
    assert!(bare.nodes()[0].validation_rules().is_empty());
    assert!(bare.initial_values().is_none_or(|values| values.is_empty()));

    let full = generate_form_schema(&config(SubmitAction::Create, vec![country]))
        .unwrap_or_else(|_| unreachable!());
    assert_eq!(full.nodes()[0].validation_rules().len(), 1);
    assert_eq!(
        full.initial_values().and_then(|values| values.get("country")),
        Some(&json!("NO"))
    );
}

#[test]
fn column_rules_follow_nullability_and_type() {
    let mut email_column = column("contact_email", "string");
    email_column.nullable = false;

    let rules = column_validation_rules(&email_column, Some("email"))
        .unwrap_or_else(|_| unreachable!());
    assert_eq!(rules.len(), 2);
    assert_eq!(rules[0].message().as_str(), "contact_email is required");

    let numeric = column_validation_rules(&column("age", "integer"), Some("email"))
        .unwrap_or_else(|_| unreachable!());
    assert!(numeric.is_empty());
}

#[test]
fn config_reads_from_camel_case_json() {
    let config: FormGenerationConfig = serde_json::from_value(json!({
        "title": "Orders",
        "submitAction": "update",
        "includeValidation": true,
        "columns": [{
            "column": {"name": "id", "type": "uuid", "isPrimaryKey": true},
            "componentType": "text",
            "label": "Id"
        }]
    }))
    .unwrap_or_else(|_| unreachable!());

    assert_eq!(config.submit_action, SubmitAction::Update);
    assert!(config.columns[0].column.is_primary_key);
    assert!(!config.include_default_values);
}
