use std::collections::{HashMap, HashSet};

use formweave_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::document::DocumentValues;
use crate::node::{Node, RegionSlotMut};

/// Declarative description of one form document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormSchema {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(default, alias = "components")]
    nodes: Vec<Node>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    initial_values: Option<DocumentValues>,
}

/// Named child sequence of one container node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegionRef {
    /// Container node id.
    pub node_id: String,
    /// Region key such as `content` or `tab:<id>`.
    pub region: String,
}

/// Insertion point in the root sequence or in a container region.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeSlot {
    /// Container region; `None` addresses the root sequence.
    pub parent: Option<RegionRef>,
    /// Position inside the sequence, clamped to its length.
    pub index: usize,
}

impl NodeSlot {
    /// Slot in the root sequence.
    #[must_use]
    pub fn root(index: usize) -> Self {
        Self {
            parent: None,
            index,
        }
    }

    /// Slot in one container region.
    #[must_use]
    pub fn in_region(node_id: impl Into<String>, region: impl Into<String>, index: usize) -> Self {
        Self {
            parent: Some(RegionRef {
                node_id: node_id.into(),
                region: region.into(),
            }),
            index,
        }
    }
}

impl FormSchema {
    /// Creates an untitled schema over a root node sequence.
    #[must_use]
    pub fn new(nodes: Vec<Node>) -> Self {
        Self {
            title: None,
            description: None,
            nodes,
            initial_values: None,
        }
    }

    /// Sets title.
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Sets description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets declared initial values.
    #[must_use]
    pub fn with_initial_values(mut self, initial_values: DocumentValues) -> Self {
        self.initial_values = Some(initial_values);
        self
    }

    /// Reads a schema from JSON text.
    pub fn from_json(raw: &str) -> AppResult<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Writes the schema as pretty-printed JSON.
    ///
    /// Function-valued members (custom predicates) are dropped.
    pub fn to_pretty_json(&self) -> AppResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Returns title.
    #[must_use]
    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    /// Returns description.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Returns root nodes in order.
    #[must_use]
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Returns declared initial values.
    #[must_use]
    pub fn initial_values(&self) -> Option<&DocumentValues> {
        self.initial_values.as_ref()
    }

    /// Returns every node depth-first, pre-order.
    #[must_use]
    pub fn walk(&self) -> Vec<&Node> {
        let mut visited = Vec::new();
        for node in &self.nodes {
            node.visit(&mut |node| visited.push(node));
        }
        visited
    }

    /// Finds a node anywhere in the tree.
    #[must_use]
    pub fn find_node(&self, node_id: &str) -> Option<&Node> {
        self.walk()
            .into_iter()
            .find(|node| node.id().as_str() == node_id)
    }

    /// Inserts a node subtree at `slot`.
    pub fn insert_node(&mut self, slot: NodeSlot, node: Node) -> AppResult<()> {
        let existing: HashSet<String> = self
            .walk()
            .into_iter()
            .map(|node| node.id().as_str().to_owned())
            .collect();
        let mut incoming = HashSet::new();
        let mut duplicate = None;
        node.visit(&mut |candidate| {
            let id = candidate.id().as_str();
            if duplicate.is_none() && (existing.contains(id) || !incoming.insert(id.to_owned())) {
                duplicate = Some(id.to_owned());
            }
        });
        if let Some(duplicate) = duplicate {
            return Err(AppError::Conflict(format!(
                "node id '{duplicate}' already exists"
            )));
        }

        let Some(parent) = slot.parent else {
            let index = slot.index.min(self.nodes.len());
            self.nodes.insert(index, node);
            return Ok(());
        };

        let container = self.find_node_mut(parent.node_id.as_str()).ok_or_else(|| {
            AppError::NotFound(format!("container node '{}' not found", parent.node_id))
        })?;
        let region = container
            .kind_mut()
            .regions_mut()
            .into_iter()
            .find_map(|(key, region)| (key == parent.region).then_some(region))
            .ok_or_else(|| {
                AppError::NotFound(format!(
                    "region '{}' not found on node '{}'",
                    parent.region, parent.node_id
                ))
            })?;

        match region {
            RegionSlotMut::Sequence(children) => {
                let index = slot.index.min(children.len());
                children.insert(index, node);
                Ok(())
            }
            RegionSlotMut::Optional(_) | RegionSlotMut::Required(_) => {
                Err(AppError::Validation(format!(
                    "region '{}' on node '{}' holds a single node",
                    parent.region, parent.node_id
                )))
            }
        }
    }

    /// Shallow-merges a JSON object patch over one node and re-reads it.
    ///
    /// The node id cannot change through a patch.
    pub fn update_node(&mut self, node_id: &str, patch: &Map<String, Value>) -> AppResult<()> {
        let mut tree_counts = HashMap::new();
        for node in self.walk() {
            *tree_counts.entry(node.id().as_str().to_owned()).or_insert(0_usize) += 1;
        }

        let node = self
            .find_node_mut(node_id)
            .ok_or_else(|| AppError::NotFound(format!("node '{node_id}' not found")))?;

        let Value::Object(mut fields) = serde_json::to_value(&*node)? else {
            return Err(AppError::Internal(format!(
                "node '{node_id}' did not serialize to an object"
            )));
        };
        for (key, value) in patch {
            if key == "id" {
                if value.as_str() != Some(node_id) {
                    return Err(AppError::Validation(format!(
                        "node id '{node_id}' cannot be changed"
                    )));
                }
                continue;
            }
            fields.insert(key.clone(), value.clone());
        }

        let updated: Node = serde_json::from_value(Value::Object(fields))?;

        // Only ids the patch adds are checked; duplicates already in the tree stay.
        let previous_counts = subtree_id_counts(node);
        if let Some(duplicate) = subtree_id_counts(&updated)
            .into_iter()
            .filter(|(id, count)| *count > previous_counts.get(id).copied().unwrap_or(0))
            .find(|(id, count)| {
                let outside = tree_counts.get(id).copied().unwrap_or(0)
                    - previous_counts.get(id).copied().unwrap_or(0);
                outside + count > 1
            })
            .map(|(id, _)| id)
        {
            return Err(AppError::Conflict(format!(
                "node id '{duplicate}' already exists"
            )));
        }

        *node = updated;
        Ok(())
    }

    /// Removes a node and its subtree, returning it.
    pub fn remove_node(&mut self, node_id: &str) -> AppResult<Node> {
        remove_from_sequence(&mut self.nodes, node_id)?
            .ok_or_else(|| AppError::NotFound(format!("node '{node_id}' not found")))
    }

    fn find_node_mut(&mut self, node_id: &str) -> Option<&mut Node> {
        self.nodes
            .iter_mut()
            .find_map(|node| find_in_node(node, node_id))
    }
}

fn subtree_id_counts(node: &Node) -> HashMap<String, usize> {
    let mut counts = HashMap::new();
    node.visit(&mut |candidate| {
        *counts.entry(candidate.id().as_str().to_owned()).or_insert(0) += 1;
    });
    counts
}

fn find_in_node<'a>(node: &'a mut Node, node_id: &str) -> Option<&'a mut Node> {
    if node.id().as_str() == node_id {
        return Some(node);
    }

    node.kind_mut()
        .regions_mut()
        .into_iter()
        .find_map(|(_, region)| match region {
            RegionSlotMut::Sequence(children) => children
                .iter_mut()
                .find_map(|child| find_in_node(child, node_id)),
            RegionSlotMut::Optional(child) => child
                .as_deref_mut()
                .and_then(|child| find_in_node(child, node_id)),
            RegionSlotMut::Required(child) => find_in_node(child, node_id),
        })
}

fn remove_from_sequence(nodes: &mut Vec<Node>, node_id: &str) -> AppResult<Option<Node>> {
    if let Some(position) = nodes.iter().position(|node| node.id().as_str() == node_id) {
        return Ok(Some(nodes.remove(position)));
    }

    for node in nodes.iter_mut() {
        if let Some(removed) = remove_from_node(node, node_id)? {
            return Ok(Some(removed));
        }
    }

    Ok(None)
}

fn remove_from_node(node: &mut Node, node_id: &str) -> AppResult<Option<Node>> {
    for (key, region) in node.kind_mut().regions_mut() {
        let removed = match region {
            RegionSlotMut::Sequence(children) => remove_from_sequence(children, node_id)?,
            RegionSlotMut::Optional(slot) => {
                if slot
                    .as_ref()
                    .is_some_and(|child| child.id().as_str() == node_id)
                {
                    slot.take().map(|child| *child)
                } else if let Some(child) = slot.as_deref_mut() {
                    remove_from_node(child, node_id)?
                } else {
                    None
                }
            }
            RegionSlotMut::Required(child) => {
                if child.id().as_str() == node_id {
                    return Err(AppError::Validation(format!(
                        "node '{node_id}' fills required region '{key}' and cannot be removed"
                    )));
                }
                remove_from_node(child, node_id)?
            }
        };

        if removed.is_some() {
            return Ok(removed);
        }
    }

    Ok(None)
}
