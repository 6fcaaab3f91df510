use formweave_domain::{DocumentErrors, DocumentValues, Node, NodeKind, value_of};
use serde::Serialize;
use serde_json::Value;
use tracing::warn;

use crate::rule_evaluator::is_visible;

/// Widget a visible node is dispatched to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum WidgetKind {
    /// Single-line input of any text-family type.
    TextInput,
    /// Multi-line input.
    Textarea,
    /// Drop-down select.
    Select,
    /// Radio group.
    Radio,
    /// Checkbox or checkbox list.
    Checkbox,
    /// File picker.
    File,
    /// Action button.
    Button,
    /// Data table.
    Table,
    /// Progress indicator.
    ProgressBar,
    /// Notification banner.
    Notification,
    /// Status badge.
    Badge,
    /// Breadcrumb trail.
    Breadcrumbs,
    /// Chip list.
    Chips,
    /// Tab strip.
    Tabs,
    /// Step navigation.
    Stepper,
    /// Collapsible panels.
    Accordion,
    /// Card frame.
    Card,
    /// Dialog.
    Modal,
    /// Layout grid.
    Grid,
    /// Hover or click tooltip.
    Tooltip,
}

impl WidgetKind {
    /// Selects the widget for a node kind; unknown tags have none.
    #[must_use]
    pub fn for_kind(kind: &NodeKind) -> Option<Self> {
        let widget = match kind {
            NodeKind::TextInput(_) => Self::TextInput,
            NodeKind::Textarea(_) => Self::Textarea,
            NodeKind::Select(_) => Self::Select,
            NodeKind::Radio(_) => Self::Radio,
            NodeKind::Checkbox(_) => Self::Checkbox,
            NodeKind::File(_) => Self::File,
            NodeKind::Button(_) => Self::Button,
            NodeKind::Table(_) => Self::Table,
            NodeKind::ProgressBar(_) => Self::ProgressBar,
            NodeKind::Notification(_) => Self::Notification,
            NodeKind::Badge(_) => Self::Badge,
            NodeKind::Breadcrumbs(_) => Self::Breadcrumbs,
            NodeKind::Chips(_) => Self::Chips,
            NodeKind::Tabs(_) => Self::Tabs,
            NodeKind::Stepper(_) => Self::Stepper,
            NodeKind::Accordion(_) => Self::Accordion,
            NodeKind::Card(_) => Self::Card,
            NodeKind::Modal(_) => Self::Modal,
            NodeKind::Grid(_) => Self::Grid,
            NodeKind::Tooltip(_) => Self::Tooltip,
            NodeKind::Unknown(_) => return None,
        };

        Some(widget)
    }
}

/// Binding state handed to a field widget.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderedField {
    /// Binding key.
    pub name: String,
    /// Field label.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Current document value.
    pub value: Value,
    /// Current error message.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Rendered child sequence of a container.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderedRegion {
    /// Region key.
    pub key: String,
    /// Region heading.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Visible children in order.
    pub nodes: Vec<RenderedNode>,
}

/// One visible node dispatched to its widget.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderedNode {
    /// Node id; the render key.
    pub id: String,
    /// Node tag.
    pub tag: String,
    /// Dispatched widget.
    pub widget: WidgetKind,
    /// Binding state for field nodes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<RenderedField>,
    /// Rendered child regions for containers.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub regions: Vec<RenderedRegion>,
}

/// Walks node sequences against one snapshot of values and errors.
#[derive(Debug, Clone, Copy)]
pub struct TreeRenderer<'a> {
    values: &'a DocumentValues,
    errors: &'a DocumentErrors,
}

impl<'a> TreeRenderer<'a> {
    /// Creates a renderer over one snapshot.
    #[must_use]
    pub fn new(values: &'a DocumentValues, errors: &'a DocumentErrors) -> Self {
        Self { values, errors }
    }

    /// Renders visible nodes in input order, recursing into containers.
    ///
    /// Hidden nodes and their descendants are omitted. Unknown tags are
    /// skipped without interrupting the remaining sequence.
    #[must_use]
    pub fn render(&self, nodes: &[Node]) -> Vec<RenderedNode> {
        nodes
            .iter()
            .filter_map(|node| self.render_node(node))
            .collect()
    }

    fn render_node(&self, node: &Node) -> Option<RenderedNode> {
        if !is_visible(node.visible_if(), self.values) {
            return None;
        }

        let Some(widget) = WidgetKind::for_kind(node.kind()) else {
            warn!(node_id = %node.id(), tag = %node.tag(), "unknown node tag is not rendered");
            return None;
        };

        let field = node.kind().field_props().map(|field| {
            let name = field.name.as_str();
            RenderedField {
                name: name.to_owned(),
                label: field.label.clone(),
                value: value_of(self.values, name).clone(),
                error: self.errors.get(name).cloned(),
            }
        });

        let regions = node
            .kind()
            .child_regions()
            .into_iter()
            .map(|region| RenderedRegion {
                key: region.key(),
                label: region.label.map(str::to_owned),
                nodes: self.render(region.nodes),
            })
            .collect();

        Some(RenderedNode {
            id: node.id().as_str().to_owned(),
            tag: node.tag().to_owned(),
            widget,
            field,
            regions,
        })
    }
}

/// Renders nodes against values with no errors attached.
#[must_use]
pub fn render(nodes: &[Node], values: &DocumentValues) -> Vec<RenderedNode> {
    TreeRenderer::new(values, &DocumentErrors::new()).render(nodes)
}

/// Collects ids of every rendered node, depth-first.
#[must_use]
pub fn rendered_ids(nodes: &[RenderedNode]) -> Vec<&str> {
    let mut ids = Vec::new();
    for node in nodes {
        ids.push(node.id.as_str());
        for region in &node.regions {
            ids.extend(rendered_ids(&region.nodes));
        }
    }
    ids
}

#[cfg(test)]
mod tests;
