use formweave_domain::{DocumentErrors, DocumentValues, FormSchema, Node};
use proptest::prelude::*;
use serde_json::{Value, json};

use super::{TreeRenderer, WidgetKind, render, rendered_ids};

fn values(raw: Value) -> DocumentValues {
    match raw {
        Value::Object(values) => values,
        _ => unreachable!(),
    }
}

fn nodes(raw: Value) -> Vec<Node> {
    serde_json::from_value(raw).unwrap_or_else(|_| unreachable!())
}

#[test]
fn visibility_follows_current_values() {
    let nodes = nodes(json!([{
        "id": "n1",
        "tag": "text",
        "name": "email",
        "visibleIf": {"field": "showEmail", "operator": "equals", "value": true}
    }]));

    let hidden = render(&nodes, &values(json!({"showEmail": false})));
    assert!(rendered_ids(&hidden).is_empty());

    let shown = render(&nodes, &values(json!({"showEmail": true})));
    assert_eq!(rendered_ids(&shown), vec!["n1"]);
    assert_eq!(shown[0].widget, WidgetKind::TextInput);
}

#[test]
fn unknown_tag_is_skipped_without_halting() {
    let nodes = nodes(json!([
        {"id": "a", "tag": "badge", "text": "A"},
        {"id": "b", "tag": "hologram"},
        {"id": "c", "tag": "badge", "text": "C"}
    ]));

    let rendered = render(&nodes, &DocumentValues::new());
    assert_eq!(rendered_ids(&rendered), vec!["a", "c"]);
}

#[test]
fn hidden_container_drops_descendants() {
    let nodes = nodes(json!([{
        "id": "wizard",
        "tag": "stepper",
        "visibleIf": {"field": "mode", "operator": "equals", "value": "guided"},
        "steps": [{"id": "s1", "label": "One", "content": [
            {"id": "name", "tag": "text", "name": "name"}
        ]}]
    }]));

    let rendered = render(&nodes, &values(json!({"mode": "expert"})));
    assert!(rendered.is_empty());
}

#[test]
fn visibility_recurses_into_every_region() {
    let nodes = nodes(json!([{
        "id": "tabs",
        "tag": "tabs",
        "tabs": [
            {"id": "personal", "label": "Personal", "content": [
                {"id": "name", "tag": "text", "name": "name"},
                {"id": "spouse", "tag": "text", "name": "spouse",
                 "visibleIf": {"field": "married", "operator": "equals", "value": true}}
            ]},
            {"id": "work", "label": "Work", "content": [
                {"id": "layout", "tag": "grid", "columns": 2, "children": [
                    {"id": "company", "tag": "text", "name": "company"},
                    {"id": "seats", "tag": "number", "name": "seats",
                     "visibleIf": {"field": "company", "operator": "notEquals", "value": ""}}
                ]}
            ]}
        ]
    }]));

    let rendered = render(&nodes, &values(json!({"married": false, "company": "Acme"})));
    assert_eq!(
        rendered_ids(&rendered),
        vec!["tabs", "name", "layout", "company", "seats"]
    );

    let tabs = &rendered[0];
    assert_eq!(tabs.regions.len(), 2);
    assert_eq!(tabs.regions[0].key, "tab:personal");
    assert_eq!(tabs.regions[1].label.as_deref(), Some("Work"));
}

#[test]
fn fields_carry_value_and_error() {
    let nodes = nodes(json!([
        {"id": "email", "tag": "email", "name": "email", "label": "Email"},
        {"id": "age", "tag": "number", "name": "age"}
    ]));
    let values = values(json!({"email": "bad"}));
    let mut errors = DocumentErrors::new();
    errors.insert("email".to_owned(), "Please enter a valid email address".to_owned());

    let rendered = TreeRenderer::new(&values, &errors).render(&nodes);

    let email = rendered[0].field.as_ref().unwrap_or_else(|| unreachable!());
    assert_eq!(email.value, json!("bad"));
    assert_eq!(email.label.as_deref(), Some("Email"));
    assert_eq!(
        email.error.as_deref(),
        Some("Please enter a valid email address")
    );

    let age = rendered[1].field.as_ref().unwrap_or_else(|| unreachable!());
    assert_eq!(age.value, Value::Null);
    assert!(age.error.is_none());
}

#[test]
fn card_and_modal_single_slots_render_as_regions() {
    let schema = FormSchema::from_json(
        &json!({"nodes": [{
            "id": "dialog",
            "tag": "modal",
            "title": "Confirm",
            "trigger": {"id": "open", "tag": "button", "label": "Open"},
            "content": [{"id": "card", "tag": "card", "content": [],
                         "footer": {"id": "ok", "tag": "button", "label": "OK"}}]
        }]})
        .to_string(),
    )
    .unwrap_or_else(|_| unreachable!());

    let rendered = render(schema.nodes(), &DocumentValues::new());
    assert_eq!(
        rendered_ids(&rendered),
        vec!["dialog", "open", "card", "ok"]
    );
    let keys: Vec<&str> = rendered[0]
        .regions
        .iter()
        .map(|region| region.key.as_str())
        .collect();
    assert_eq!(keys, vec!["trigger", "content"]);
}

fn guarded_node() -> impl Strategy<Value = Value> {
    (
        "[a-z]{1,6}",
        prop::sample::select(vec!["equals", "notEquals", "greaterThan", "lessThan", "contains", "in"]),
        prop_oneof![
            any::<i16>().prop_map(|number| json!(number)),
            "[a-c]{0,2}".prop_map(|text| json!(text)),
            any::<bool>().prop_map(|flag| json!(flag)),
            Just(json!(["a", "b", 1])),
        ],
    )
        .prop_map(|(id, operator, operand)| {
            json!({
                "id": id,
                "tag": "text",
                "name": id,
                "visibleIf": {"field": "toggle", "operator": operator, "value": operand}
            })
        })
}

proptest! {
    #[test]
    fn rendering_is_deterministic(
        children in prop::collection::vec(guarded_node(), 0..8),
        toggle in prop_oneof![
            any::<i16>().prop_map(|number| json!(number)),
            "[a-c]{0,2}".prop_map(|text| json!(text)),
            any::<bool>().prop_map(|flag| json!(flag)),
        ],
    ) {
        let nodes = nodes(json!([
            {"id": "grid", "tag": "grid", "columns": 3, "children": children.clone()},
            {"id": "list", "tag": "accordion", "panels": [
                {"id": "p1", "title": "Panel", "content": children}
            ]}
        ]));
        let values = values(json!({"toggle": toggle}));

        let first = render(&nodes, &values);
        let second = render(&nodes, &values);

        prop_assert_eq!(&first, &second);
        prop_assert_eq!(
            serde_json::to_string(&first).unwrap_or_default(),
            serde_json::to_string(&second).unwrap_or_default()
        );
    }
}
