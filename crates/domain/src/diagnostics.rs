use std::collections::HashMap;
use std::fmt::{Display, Formatter};

use crate::condition::Condition;
use crate::node::{Node, NodeKind};
use crate::schema::FormSchema;

/// Non-fatal schema problem. Documents with issues still load and render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaIssue {
    /// Two nodes share one id.
    DuplicateNodeId {
        /// Repeated id.
        node_id: String,
    },
    /// Two field nodes bind the same key; the last write wins.
    DuplicateBindingKey {
        /// Repeated binding key.
        key: String,
        /// Id of the later node.
        node_id: String,
    },
    /// Tag not recognized by this build; the node renders nothing.
    UnknownTag {
        /// Node id.
        node_id: String,
        /// Raw tag.
        tag: String,
    },
    /// Condition operator not recognized; the condition evaluates to false.
    UnsupportedOperator {
        /// Node carrying the condition.
        node_id: String,
        /// Raw operator.
        operator: String,
    },
    /// Nested condition rules without a combinator; they are ignored.
    RulesWithoutLogic {
        /// Node carrying the condition.
        node_id: String,
        /// Field of the condition holding the rules.
        field: String,
    },
    /// Pattern rule whose expression does not compile; the rule passes.
    InvalidPattern {
        /// Node carrying the rule.
        node_id: String,
        /// Raw pattern.
        pattern: String,
        /// Compiler message.
        reason: String,
    },
}

impl Display for SchemaIssue {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DuplicateNodeId { node_id } => write!(formatter, "duplicate node id '{node_id}'"),
            Self::DuplicateBindingKey { key, node_id } => write!(
                formatter,
                "binding key '{key}' on node '{node_id}' is already bound by another node"
            ),
            Self::UnknownTag { node_id, tag } => {
                write!(formatter, "node '{node_id}' has unknown tag '{tag}'")
            }
            Self::UnsupportedOperator { node_id, operator } => write!(
                formatter,
                "node '{node_id}' uses unsupported condition operator '{operator}'"
            ),
            Self::RulesWithoutLogic { node_id, field } => write!(
                formatter,
                "condition on '{field}' in node '{node_id}' has nested rules but no logic"
            ),
            Self::InvalidPattern {
                node_id,
                pattern,
                reason,
            } => write!(
                formatter,
                "node '{node_id}' has invalid pattern '{pattern}': {reason}"
            ),
        }
    }
}

impl FormSchema {
    /// Scans the tree for non-fatal issues, in walk order.
    #[must_use]
    pub fn diagnostics(&self) -> Vec<SchemaIssue> {
        let mut issues = Vec::new();
        let mut ids: HashMap<&str, usize> = HashMap::new();
        let mut keys: HashMap<&str, usize> = HashMap::new();

        for node in self.walk() {
            let node_id = node.id().as_str();
            let seen = ids.entry(node_id).or_default();
            *seen += 1;
            if *seen == 2 {
                issues.push(SchemaIssue::DuplicateNodeId {
                    node_id: node_id.to_owned(),
                });
            }

            if let Some(key) = node.binding_key() {
                let bound = keys.entry(key).or_default();
                *bound += 1;
                if *bound > 1 {
                    issues.push(SchemaIssue::DuplicateBindingKey {
                        key: key.to_owned(),
                        node_id: node_id.to_owned(),
                    });
                }
            }

            if let NodeKind::Unknown(unknown) = node.kind() {
                issues.push(SchemaIssue::UnknownTag {
                    node_id: node_id.to_owned(),
                    tag: unknown.tag.clone(),
                });
            }

            if let Some(condition) = node.visible_if() {
                condition_issues(node_id, condition, &mut issues);
            }

            pattern_issues(node, &mut issues);
        }

        issues
    }
}

fn condition_issues(node_id: &str, condition: &Condition, issues: &mut Vec<SchemaIssue>) {
    condition.for_each(&mut |rule| {
        if !rule.operator().is_supported() {
            issues.push(SchemaIssue::UnsupportedOperator {
                node_id: node_id.to_owned(),
                operator: rule.operator().as_str().to_owned(),
            });
        }
        if !rule.rules().is_empty() && rule.logic().is_none() {
            issues.push(SchemaIssue::RulesWithoutLogic {
                node_id: node_id.to_owned(),
                field: rule.field().as_str().to_owned(),
            });
        }
    });
}

fn pattern_issues(node: &Node, issues: &mut Vec<SchemaIssue>) {
    for rule in node.validation_rules() {
        let (Some(pattern), Some(Err(error))) = (rule.pattern_text(), rule.compiled_pattern())
        else {
            continue;
        };
        issues.push(SchemaIssue::InvalidPattern {
            node_id: node.id().as_str().to_owned(),
            pattern: pattern.to_owned(),
            reason: error.to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::SchemaIssue;
    use crate::schema::FormSchema;

    #[test]
    fn reports_issues_in_walk_order() {
        let schema: FormSchema = serde_json::from_value(json!({
            "nodes": [
                {
                    "id": "email",
                    "tag": "email",
                    "name": "contact",
                    "validation": [{"type": "pattern", "value": "([a-z", "message": "bad"}]
                },
                {
                    "id": "grid",
                    "tag": "grid",
                    "columns": 2,
                    "children": [
                        {"id": "phone", "tag": "text", "name": "contact"},
                        {"id": "email", "tag": "signature", "visibleIf": {
                            "field": "plan",
                            "operator": "startsWith",
                            "value": "p",
                            "rules": [{"field": "age", "operator": "greaterThan", "value": 3}]
                        }}
                    ]
                }
            ]
        }))
        .unwrap_or_else(|_| unreachable!());

        let issues = schema.diagnostics();
        assert_eq!(
            issues,
            vec![
                SchemaIssue::InvalidPattern {
                    node_id: "email".to_owned(),
                    pattern: "([a-z".to_owned(),
                    reason: issues
                        .iter()
                        .find_map(|issue| match issue {
                            SchemaIssue::InvalidPattern { reason, .. } => Some(reason.clone()),
                            _ => None,
                        })
                        .unwrap_or_default(),
                },
                SchemaIssue::DuplicateBindingKey {
                    key: "contact".to_owned(),
                    node_id: "phone".to_owned(),
                },
                SchemaIssue::DuplicateNodeId {
                    node_id: "email".to_owned(),
                },
                SchemaIssue::UnknownTag {
                    node_id: "email".to_owned(),
                    tag: "signature".to_owned(),
                },
                SchemaIssue::UnsupportedOperator {
                    node_id: "email".to_owned(),
                    operator: "startsWith".to_owned(),
                },
                SchemaIssue::RulesWithoutLogic {
                    node_id: "email".to_owned(),
                    field: "plan".to_owned(),
                },
            ]
        );
    }

    #[test]
    fn clean_schema_has_no_issues() {
        let schema: FormSchema = serde_json::from_value(json!({
            "nodes": [{"id": "n1", "tag": "text", "name": "email"}]
        }))
        .unwrap_or_else(|_| unreachable!());
        assert!(schema.diagnostics().is_empty());
    }
}
