use std::str::FromStr;

use formweave_core::{AppError, AppResult, NonEmptyString};
use serde::ser::{Error as _, SerializeMap};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::condition::Condition;
use crate::option::{OptionSource, SelectOption};
use crate::validation_rule::ValidationRule;

/// Generates a fresh node identifier of the form `<prefix>-<uuid>`.
#[must_use]
pub fn generate_node_id(prefix: &str) -> String {
    format!("{prefix}-{}", uuid::Uuid::new_v4().simple())
}

/// HTML-style input kind of a text-family field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum TextInputType {
    /// Free text.
    #[default]
    Text,
    /// Email address.
    Email,
    /// Masked password.
    Password,
    /// Number.
    Number,
    /// Calendar date.
    Date,
    /// Time of day.
    Time,
    /// Local date and time.
    DateTimeLocal,
}

impl TextInputType {
    /// Returns stable tag value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Email => "email",
            Self::Password => "password",
            Self::Number => "number",
            Self::Date => "date",
            Self::Time => "time",
            Self::DateTimeLocal => "datetime-local",
        }
    }
}

impl FromStr for TextInputType {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "text" => Ok(Self::Text),
            "email" => Ok(Self::Email),
            "password" => Ok(Self::Password),
            "number" => Ok(Self::Number),
            "date" => Ok(Self::Date),
            "time" => Ok(Self::Time),
            "datetime-local" => Ok(Self::DateTimeLocal),
            _ => Err(AppError::Validation(format!(
                "unknown text input type '{value}'"
            ))),
        }
    }
}

/// Properties shared by every node that binds to a document value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldProps {
    /// Binding key into document values.
    pub name: NonEmptyString,
    /// Field label.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Placeholder text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    /// Widget default used when the document has no value yet.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    /// Whether the widget accepts input.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disabled: Option<bool>,
    /// Whether the widget is marked required.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,
    /// Whether the widget is read-only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub read_only: Option<bool>,
    /// Validation rules checked in declared order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub validation: Vec<ValidationRule>,
}

impl FieldProps {
    /// Creates field props bound to `name`.
    pub fn new(name: impl Into<String>) -> AppResult<Self> {
        Ok(Self {
            name: NonEmptyString::new(name)?,
            label: None,
            placeholder: None,
            value: None,
            disabled: None,
            required: None,
            read_only: None,
            validation: Vec::new(),
        })
    }
}

/// Text-family input (`text`, `email`, `password`, `number`, `date`, `time`,
/// `datetime-local`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextInputNode {
    /// Input kind; serialized as the node tag.
    #[serde(skip)]
    pub input_type: TextInputType,
    /// Binding and validation props.
    #[serde(flatten)]
    pub field: FieldProps,
    /// Lower bound attribute.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<Value>,
    /// Upper bound attribute.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<Value>,
    /// Step attribute.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step: Option<Value>,
    /// Minimum length attribute.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_length: Option<u32>,
    /// Maximum length attribute.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u32>,
    /// Pattern attribute.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
}

impl TextInputNode {
    /// Creates a text-family input with no attributes.
    #[must_use]
    pub fn new(input_type: TextInputType, field: FieldProps) -> Self {
        Self {
            input_type,
            field,
            min: None,
            max: None,
            step: None,
            min_length: None,
            max_length: None,
            pattern: None,
        }
    }
}

/// Multi-line text input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextareaNode {
    /// Binding and validation props.
    #[serde(flatten)]
    pub field: FieldProps,
    /// Visible row count.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rows: Option<u32>,
    /// Visible column count.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cols: Option<u32>,
    /// Minimum length attribute.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_length: Option<u32>,
    /// Maximum length attribute.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u32>,
    /// Resize behaviour.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resize: Option<String>,
}

/// Drop-down select.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectNode {
    /// Binding and validation props.
    #[serde(flatten)]
    pub field: FieldProps,
    /// Static options.
    #[serde(default)]
    pub options: Vec<SelectOption>,
    /// Whether several options can be selected.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub multiple: Option<bool>,
    /// Remote option source replacing static options.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_source: Option<OptionSource>,
}

/// Radio group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RadioNode {
    /// Binding and validation props.
    #[serde(flatten)]
    pub field: FieldProps,
    /// Radio options.
    #[serde(default)]
    pub options: Vec<SelectOption>,
}

/// Single checkbox or checkbox list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckboxNode {
    /// Binding and validation props.
    #[serde(flatten)]
    pub field: FieldProps,
    /// Checkbox list options.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<SelectOption>>,
    /// Whether this is a single boolean checkbox.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub single: Option<bool>,
}

/// File picker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileNode {
    /// Binding and validation props.
    #[serde(flatten)]
    pub field: FieldProps,
    /// Accepted file types.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accept: Option<String>,
    /// Whether several files can be picked.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub multiple: Option<bool>,
    /// Maximum size per file in bytes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_size: Option<u64>,
    /// Maximum file count.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_files: Option<u32>,
}

/// Action button. Click handlers are in-process only and never serialized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ButtonNode {
    /// Display label.
    pub label: String,
    /// Visual variant.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variant: Option<String>,
    /// Visual size.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    /// `button`, `submit` or `reset`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub button_type: Option<String>,
    /// Whether a spinner is shown.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub loading: Option<bool>,
    /// Icon name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    /// Icon placement.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon_position: Option<String>,
}

/// Table column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableColumn {
    /// Row field shown in this column.
    pub key: String,
    /// Heading text.
    pub title: String,
    /// Whether sorting is enabled.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sortable: Option<bool>,
    /// Column width.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<Value>,
}

/// Table pagination settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TablePagination {
    /// Rows per page.
    pub page_size: u32,
    /// One-based current page.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_page: Option<u32>,
    /// Total row count.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<u64>,
}

/// Read-only data table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableNode {
    /// Column definitions.
    #[serde(default)]
    pub columns: Vec<TableColumn>,
    /// Opaque row data.
    #[serde(default)]
    pub data: Vec<Value>,
    /// Whether sorting is enabled.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sortable: Option<bool>,
    /// Pagination settings.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pagination: Option<TablePagination>,
    /// Whether entries can be selected.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selectable: Option<bool>,
}

/// Progress indicator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressBarNode {
    /// Current value.
    pub value: f64,
    /// Upper bound.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    /// Display label.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Visual variant.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variant: Option<String>,
    /// Whether the percentage is displayed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub show_percentage: Option<bool>,
}

/// Inline notification banner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationNode {
    /// Body text.
    pub message: String,
    /// Heading text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// `success`, `error`, `warning` or `info`.
    pub variant: String,
    /// Auto-dismiss delay in milliseconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<u64>,
    /// Screen or anchor position.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<String>,
}

/// Small status label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BadgeNode {
    /// Badge text.
    pub text: String,
    /// Visual variant.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variant: Option<String>,
    /// Visual size.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
}

/// One breadcrumb entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BreadcrumbItem {
    /// Display label.
    pub label: String,
    /// Link target.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,
    /// Whether this is the current page.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current: Option<bool>,
}

/// Breadcrumb trail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BreadcrumbsNode {
    /// Entries in display order.
    #[serde(default)]
    pub items: Vec<BreadcrumbItem>,
    /// Separator text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub separator: Option<String>,
    /// Maximum visible entries.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_items: Option<u32>,
}

/// One chip entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChipItem {
    /// Chip identifier.
    pub id: String,
    /// Display label.
    pub label: String,
    /// Value carried by the chip.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    /// Whether the chip can be removed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub removable: Option<bool>,
}

/// Chip list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChipsNode {
    /// Entries in display order.
    #[serde(default)]
    pub items: Vec<ChipItem>,
    /// Whether entries can be selected.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selectable: Option<bool>,
    /// Selected chip ids.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected: Option<Vec<String>>,
    /// Visual variant.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variant: Option<String>,
}

/// One tab of a tab group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TabItem {
    /// Region identifier.
    pub id: String,
    /// Display label.
    pub label: String,
    /// Nested nodes.
    #[serde(default)]
    pub content: Vec<Node>,
    /// Whether the entry is disabled.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disabled: Option<bool>,
    /// Icon name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

/// Tab group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TabsNode {
    /// Tabs in display order.
    #[serde(default)]
    pub tabs: Vec<TabItem>,
    /// Initially active tab id.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_tab: Option<String>,
}

/// One step of a stepper.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepItem {
    /// Region identifier.
    pub id: String,
    /// Display label.
    pub label: String,
    /// Nested nodes.
    #[serde(default)]
    pub content: Vec<Node>,
    /// Whether the step may be skipped.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub optional: Option<bool>,
    /// Whether the step is complete.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
}

/// Multi-step wizard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepperNode {
    /// Steps in display order.
    #[serde(default)]
    pub steps: Vec<StepItem>,
    /// Zero-based active step.
    #[serde(default)]
    pub current_step: u32,
    /// Whether steps can be skipped.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow_skip: Option<bool>,
}

/// One collapsible accordion panel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccordionPanel {
    /// Region identifier.
    pub id: String,
    /// Heading text.
    pub title: String,
    /// Nested nodes.
    #[serde(default)]
    pub content: Vec<Node>,
    /// Whether the entry is disabled.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disabled: Option<bool>,
}

/// Accordion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccordionNode {
    /// Panels in display order.
    #[serde(default)]
    pub panels: Vec<AccordionPanel>,
    /// Initially open panel ids.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_open: Option<Vec<String>>,
    /// Whether several panels may be open.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow_multiple: Option<bool>,
}

/// Card with optional header and footer nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardNode {
    /// Header node.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub header: Option<Box<Node>>,
    /// Nested nodes.
    #[serde(default)]
    pub content: Vec<Node>,
    /// Footer node.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub footer: Option<Box<Node>>,
    /// Visual variant.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variant: Option<String>,
}

/// Modal dialog opened by a trigger node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModalNode {
    /// Node opening the dialog.
    pub trigger: Box<Node>,
    /// Heading text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Nested nodes.
    #[serde(default)]
    pub content: Vec<Node>,
    /// Visual size.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    /// Whether clicking the overlay closes the dialog.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub close_on_overlay: Option<bool>,
}

/// Layout grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GridNode {
    /// Column count or template string.
    pub columns: Value,
    /// Gap between cells.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gap: Option<Value>,
    /// Child nodes.
    #[serde(default)]
    pub children: Vec<Node>,
}

/// Tooltip wrapping exactly one node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TooltipNode {
    /// Tooltip text.
    pub content: String,
    /// Child nodes.
    pub children: Box<Node>,
    /// Screen or anchor position.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<String>,
    /// `hover` or `click`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trigger: Option<String>,
}

/// Node whose tag this build does not recognize; kept verbatim.
#[derive(Debug, Clone, PartialEq)]
pub struct UnknownNode {
    /// Raw tag.
    pub tag: String,
    /// Raw tag-specific fields.
    pub fields: Map<String, Value>,
}

/// Tag-specific shape of a node.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// Text-family input.
    TextInput(TextInputNode),
    /// Multi-line text input.
    Textarea(TextareaNode),
    /// Drop-down select.
    Select(SelectNode),
    /// Radio group.
    Radio(RadioNode),
    /// Checkbox or checkbox list.
    Checkbox(CheckboxNode),
    /// File picker.
    File(FileNode),
    /// Action button.
    Button(ButtonNode),
    /// Data table.
    Table(TableNode),
    /// Progress indicator.
    ProgressBar(ProgressBarNode),
    /// Notification banner.
    Notification(NotificationNode),
    /// Status badge.
    Badge(BadgeNode),
    /// Breadcrumb trail.
    Breadcrumbs(BreadcrumbsNode),
    /// Chip list.
    Chips(ChipsNode),
    /// Tab group container.
    Tabs(TabsNode),
    /// Stepper container.
    Stepper(StepperNode),
    /// Accordion container.
    Accordion(AccordionNode),
    /// Card container.
    Card(CardNode),
    /// Modal container.
    Modal(ModalNode),
    /// Grid container.
    Grid(GridNode),
    /// Tooltip container.
    Tooltip(TooltipNode),
    /// Unrecognized tag.
    Unknown(UnknownNode),
}

/// Read-only view of one nested child sequence of a container.
#[derive(Debug, Clone, Copy)]
pub struct ChildRegion<'a> {
    /// Stable region key (`tab:<id>`, `content`, `header`, ...).
    key: RegionKey<'a>,
    /// Optional heading (tab label, step label, panel title).
    pub label: Option<&'a str>,
    /// Child nodes in order.
    pub nodes: &'a [Node],
}

impl ChildRegion<'_> {
    /// Returns the region key.
    #[must_use]
    pub fn key(&self) -> String {
        self.key.to_string()
    }
}

#[derive(Debug, Clone, Copy)]
enum RegionKey<'a> {
    Fixed(&'static str),
    Scoped(&'static str, &'a str),
}

impl std::fmt::Display for RegionKey<'_> {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Fixed(name) => formatter.write_str(name),
            Self::Scoped(scope, id) => write!(formatter, "{scope}:{id}"),
        }
    }
}

/// Mutable access to one child slot of a container.
pub(crate) enum RegionSlotMut<'a> {
    Sequence(&'a mut Vec<Node>),
    Optional(&'a mut Option<Box<Node>>),
    Required(&'a mut Box<Node>),
}

const TEXT_INPUT_TAGS: [&str; 7] = [
    "text",
    "email",
    "password",
    "number",
    "date",
    "time",
    "datetime-local",
];

impl NodeKind {
    /// Returns the tag value written to JSON.
    #[must_use]
    pub fn tag(&self) -> &str {
        match self {
            Self::TextInput(node) => node.input_type.as_str(),
            Self::Textarea(_) => "textarea",
            Self::Select(_) => "select",
            Self::Radio(_) => "radio",
            Self::Checkbox(_) => "checkbox",
            Self::File(_) => "file",
            Self::Button(_) => "button",
            Self::Table(_) => "table",
            Self::ProgressBar(_) => "progress-bar",
            Self::Notification(_) => "notification",
            Self::Badge(_) => "badge",
            Self::Breadcrumbs(_) => "breadcrumbs",
            Self::Chips(_) => "chips",
            Self::Tabs(_) => "tabs",
            Self::Stepper(_) => "stepper",
            Self::Accordion(_) => "accordion",
            Self::Card(_) => "card",
            Self::Modal(_) => "modal",
            Self::Grid(_) => "grid",
            Self::Tooltip(_) => "tooltip",
            Self::Unknown(node) => node.tag.as_str(),
        }
    }

    /// Reads tag-specific fields for one tag.
    ///
    /// Unrecognized tags produce [`NodeKind::Unknown`]; recognized tags with a
    /// malformed shape are rejected.
    pub fn from_tagged_fields(tag: &str, fields: Map<String, Value>) -> AppResult<Self> {
        fn read<T: serde::de::DeserializeOwned>(
            tag: &str,
            fields: Map<String, Value>,
        ) -> AppResult<T> {
            serde_json::from_value(Value::Object(fields)).map_err(|error| {
                AppError::Serialization(format!("invalid '{tag}' node: {error}"))
            })
        }

        let kind = match tag {
            text_tag if TEXT_INPUT_TAGS.contains(&text_tag) => {
                let mut node: TextInputNode = read(tag, fields)?;
                node.input_type = TextInputType::from_str(text_tag)?;
                Self::TextInput(node)
            }
            "textarea" => Self::Textarea(read(tag, fields)?),
            "select" => Self::Select(read(tag, fields)?),
            "radio" => Self::Radio(read(tag, fields)?),
            "checkbox" => Self::Checkbox(read(tag, fields)?),
            "file" => Self::File(read(tag, fields)?),
            "button" => Self::Button(read(tag, fields)?),
            "table" => Self::Table(read(tag, fields)?),
            "progress-bar" => Self::ProgressBar(read(tag, fields)?),
            "notification" => Self::Notification(read(tag, fields)?),
            "badge" => Self::Badge(read(tag, fields)?),
            "breadcrumbs" => Self::Breadcrumbs(read(tag, fields)?),
            "chips" => Self::Chips(read(tag, fields)?),
            "tabs" => Self::Tabs(read(tag, fields)?),
            "stepper" => Self::Stepper(read(tag, fields)?),
            "accordion" => Self::Accordion(read(tag, fields)?),
            "card" => Self::Card(read(tag, fields)?),
            "modal" => Self::Modal(read(tag, fields)?),
            "grid" => Self::Grid(read(tag, fields)?),
            "tooltip" => Self::Tooltip(read(tag, fields)?),
            _ => Self::Unknown(UnknownNode {
                tag: tag.to_owned(),
                fields,
            }),
        };

        Ok(kind)
    }

    /// Writes tag-specific fields, excluding the tag itself.
    pub fn to_fields(&self) -> Result<Map<String, Value>, serde_json::Error> {
        let value = match self {
            Self::TextInput(node) => serde_json::to_value(node)?,
            Self::Textarea(node) => serde_json::to_value(node)?,
            Self::Select(node) => serde_json::to_value(node)?,
            Self::Radio(node) => serde_json::to_value(node)?,
            Self::Checkbox(node) => serde_json::to_value(node)?,
            Self::File(node) => serde_json::to_value(node)?,
            Self::Button(node) => serde_json::to_value(node)?,
            Self::Table(node) => serde_json::to_value(node)?,
            Self::ProgressBar(node) => serde_json::to_value(node)?,
            Self::Notification(node) => serde_json::to_value(node)?,
            Self::Badge(node) => serde_json::to_value(node)?,
            Self::Breadcrumbs(node) => serde_json::to_value(node)?,
            Self::Chips(node) => serde_json::to_value(node)?,
            Self::Tabs(node) => serde_json::to_value(node)?,
            Self::Stepper(node) => serde_json::to_value(node)?,
            Self::Accordion(node) => serde_json::to_value(node)?,
            Self::Card(node) => serde_json::to_value(node)?,
            Self::Modal(node) => serde_json::to_value(node)?,
            Self::Grid(node) => serde_json::to_value(node)?,
            Self::Tooltip(node) => serde_json::to_value(node)?,
            Self::Unknown(node) => return Ok(node.fields.clone()),
        };

        match value {
            Value::Object(fields) => Ok(fields),
            _ => Err(serde_json::Error::custom("node fields must serialize to an object")),
        }
    }

    /// Returns binding props for field nodes.
    #[must_use]
    pub fn field_props(&self) -> Option<&FieldProps> {
        match self {
            Self::TextInput(node) => Some(&node.field),
            Self::Textarea(node) => Some(&node.field),
            Self::Select(node) => Some(&node.field),
            Self::Radio(node) => Some(&node.field),
            Self::Checkbox(node) => Some(&node.field),
            Self::File(node) => Some(&node.field),
            _ => None,
        }
    }

    /// Returns the natural empty document value for field nodes.
    #[must_use]
    pub fn empty_value(&self) -> Option<Value> {
        let value = match self {
            Self::TextInput(_) | Self::Textarea(_) | Self::Radio(_) => Value::String(String::new()),
            Self::Select(node) if node.multiple == Some(true) => Value::Array(Vec::new()),
            Self::Select(_) => Value::String(String::new()),
            Self::Checkbox(node) if node.single == Some(true) || node.options.is_none() => {
                Value::Bool(false)
            }
            Self::Checkbox(_) => Value::Array(Vec::new()),
            Self::File(node) if node.multiple == Some(true) => Value::Array(Vec::new()),
            Self::File(_) => Value::Null,
            _ => return None,
        };

        Some(value)
    }

    /// Returns whether this kind nests child nodes.
    #[must_use]
    pub fn is_container(&self) -> bool {
        matches!(
            self,
            Self::Tabs(_)
                | Self::Stepper(_)
                | Self::Accordion(_)
                | Self::Card(_)
                | Self::Modal(_)
                | Self::Grid(_)
                | Self::Tooltip(_)
        )
    }

    /// Returns nested child sequences in render order.
    #[must_use]
    pub fn child_regions(&self) -> Vec<ChildRegion<'_>> {
        match self {
            Self::Tabs(node) => node
                .tabs
                .iter()
                .map(|tab| ChildRegion {
                    key: RegionKey::Scoped("tab", tab.id.as_str()),
                    label: Some(tab.label.as_str()),
                    nodes: &tab.content,
                })
                .collect(),
            Self::Stepper(node) => node
                .steps
                .iter()
                .map(|step| ChildRegion {
                    key: RegionKey::Scoped("step", step.id.as_str()),
                    label: Some(step.label.as_str()),
                    nodes: &step.content,
                })
                .collect(),
            Self::Accordion(node) => node
                .panels
                .iter()
                .map(|panel| ChildRegion {
                    key: RegionKey::Scoped("panel", panel.id.as_str()),
                    label: Some(panel.title.as_str()),
                    nodes: &panel.content,
                })
                .collect(),
            Self::Card(node) => {
                let mut regions = Vec::with_capacity(3);
                if let Some(header) = &node.header {
                    regions.push(single_region("header", header));
                }
                regions.push(ChildRegion {
                    key: RegionKey::Fixed("content"),
                    label: None,
                    nodes: &node.content,
                });
                if let Some(footer) = &node.footer {
                    regions.push(single_region("footer", footer));
                }
                regions
            }
            Self::Modal(node) => vec![
                single_region("trigger", &node.trigger),
                ChildRegion {
                    key: RegionKey::Fixed("content"),
                    label: node.title.as_deref(),
                    nodes: &node.content,
                },
            ],
            Self::Grid(node) => vec![ChildRegion {
                key: RegionKey::Fixed("children"),
                label: None,
                nodes: &node.children,
            }],
            Self::Tooltip(node) => vec![single_region("children", &node.children)],
            _ => Vec::new(),
        }
    }

    pub(crate) fn regions_mut(&mut self) -> Vec<(String, RegionSlotMut<'_>)> {
        match self {
            Self::Tabs(node) => node
                .tabs
                .iter_mut()
                .map(|tab| {
                    (
                        format!("tab:{}", tab.id),
                        RegionSlotMut::Sequence(&mut tab.content),
                    )
                })
                .collect(),
            Self::Stepper(node) => node
                .steps
                .iter_mut()
                .map(|step| {
                    (
                        format!("step:{}", step.id),
                        RegionSlotMut::Sequence(&mut step.content),
                    )
                })
                .collect(),
            Self::Accordion(node) => node
                .panels
                .iter_mut()
                .map(|panel| {
                    (
                        format!("panel:{}", panel.id),
                        RegionSlotMut::Sequence(&mut panel.content),
                    )
                })
                .collect(),
            Self::Card(node) => vec![
                ("header".to_owned(), RegionSlotMut::Optional(&mut node.header)),
                ("content".to_owned(), RegionSlotMut::Sequence(&mut node.content)),
                ("footer".to_owned(), RegionSlotMut::Optional(&mut node.footer)),
            ],
            Self::Modal(node) => vec![
                ("trigger".to_owned(), RegionSlotMut::Required(&mut node.trigger)),
                ("content".to_owned(), RegionSlotMut::Sequence(&mut node.content)),
            ],
            Self::Grid(node) => vec![(
                "children".to_owned(),
                RegionSlotMut::Sequence(&mut node.children),
            )],
            Self::Tooltip(node) => vec![(
                "children".to_owned(),
                RegionSlotMut::Required(&mut node.children),
            )],
            _ => Vec::new(),
        }
    }
}

fn single_region<'a>(name: &'static str, node: &'a Node) -> ChildRegion<'a> {
    ChildRegion {
        key: RegionKey::Fixed(name),
        label: None,
        nodes: std::slice::from_ref(node),
    }
}

/// One schema-described unit of a form: a field, a button, or a container.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "NodeRecord")]
pub struct Node {
    id: NonEmptyString,
    visible_if: Option<Condition>,
    style: Option<Value>,
    class_name: Option<Value>,
    style_config: Option<Value>,
    kind: NodeKind,
}

impl Node {
    /// Creates an always-visible node without presentation data.
    pub fn new(id: impl Into<String>, kind: NodeKind) -> AppResult<Self> {
        Ok(Self {
            id: NonEmptyString::new(id)?,
            visible_if: None,
            style: None,
            class_name: None,
            style_config: None,
            kind,
        })
    }

    /// Sets the visibility condition.
    #[must_use]
    pub fn with_visible_if(mut self, condition: Condition) -> Self {
        self.visible_if = Some(condition);
        self
    }

    /// Returns the stable node identifier.
    #[must_use]
    pub fn id(&self) -> &NonEmptyString {
        &self.id
    }

    /// Returns the tag.
    #[must_use]
    pub fn tag(&self) -> &str {
        self.kind.tag()
    }

    /// Returns the tag-specific shape.
    #[must_use]
    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    pub(crate) fn kind_mut(&mut self) -> &mut NodeKind {
        &mut self.kind
    }

    /// Returns the visibility condition; `None` means always visible.
    #[must_use]
    pub fn visible_if(&self) -> Option<&Condition> {
        self.visible_if.as_ref()
    }

    /// Returns opaque inline style data.
    #[must_use]
    pub fn style(&self) -> Option<&Value> {
        self.style.as_ref()
    }

    /// Returns opaque class name data.
    #[must_use]
    pub fn class_name(&self) -> Option<&Value> {
        self.class_name.as_ref()
    }

    /// Returns opaque style configuration data.
    #[must_use]
    pub fn style_config(&self) -> Option<&Value> {
        self.style_config.as_ref()
    }

    /// Returns the binding key for field nodes.
    #[must_use]
    pub fn binding_key(&self) -> Option<&str> {
        self.kind.field_props().map(|field| field.name.as_str())
    }

    /// Returns validation rules for field nodes; empty for other nodes.
    #[must_use]
    pub fn validation_rules(&self) -> &[ValidationRule] {
        self.kind
            .field_props()
            .map(|field| field.validation.as_slice())
            .unwrap_or_default()
    }

    /// Visits this node and all descendants depth-first, pre-order.
    pub fn visit<'a>(&'a self, visit: &mut impl FnMut(&'a Node)) {
        visit(self);
        for region in self.kind.child_regions() {
            for child in region.nodes {
                child.visit(visit);
            }
        }
    }
}

impl Serialize for Node {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let fields = self.kind.to_fields().map_err(S::Error::custom)?;

        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("id", &self.id)?;
        map.serialize_entry("tag", self.kind.tag())?;
        for (key, value) in &fields {
            map.serialize_entry(key, value)?;
        }
        if let Some(visible_if) = &self.visible_if {
            map.serialize_entry("visibleIf", visible_if)?;
        }
        if let Some(style) = &self.style {
            map.serialize_entry("style", style)?;
        }
        if let Some(class_name) = &self.class_name {
            map.serialize_entry("className", class_name)?;
        }
        if let Some(style_config) = &self.style_config {
            map.serialize_entry("styleConfig", style_config)?;
        }
        map.end()
    }
}

/// Wire shape of a node before tag dispatch.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct NodeRecord {
    id: NonEmptyString,
    tag: Option<String>,
    #[serde(rename = "type")]
    legacy_type: Option<String>,
    visible_if: Option<Condition>,
    style: Option<Value>,
    class_name: Option<Value>,
    style_config: Option<Value>,
    #[serde(flatten)]
    fields: Map<String, Value>,
}

impl TryFrom<NodeRecord> for Node {
    type Error = AppError;

    fn try_from(mut record: NodeRecord) -> Result<Self, Self::Error> {
        // `type` only names the tag when `tag` is absent; otherwise it is a plain field.
        let tag = match (record.tag, record.legacy_type) {
            (Some(tag), Some(legacy_type)) => {
                record
                    .fields
                    .insert("type".to_owned(), Value::String(legacy_type));
                tag
            }
            (Some(tag), None) | (None, Some(tag)) => tag,
            (None, None) => {
                return Err(AppError::Validation(format!(
                    "node '{}' is missing a tag",
                    record.id
                )));
            }
        };

        Ok(Self {
            kind: NodeKind::from_tagged_fields(tag.as_str(), record.fields)?,
            id: record.id,
            visible_if: record.visible_if,
            style: record.style,
            class_name: record.class_name,
            style_config: record.style_config,
        })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{Node, NodeKind, TextInputType, generate_node_id};

    #[test]
    fn text_family_tag_is_preserved() {
        let node = serde_json::from_value::<Node>(json!({
            "id": "email",
            "tag": "email",
            "name": "email",
            "label": "Email Address",
            "validation": [{"type": "required", "message": "Email is required"}]
        }))
        .unwrap_or_else(|_| unreachable!());

        let NodeKind::TextInput(input) = node.kind() else {
            unreachable!()
        };
        assert_eq!(input.input_type, TextInputType::Email);
        assert_eq!(node.tag(), "email");
        assert_eq!(node.binding_key(), Some("email"));
        assert_eq!(node.validation_rules().len(), 1);

        let written = serde_json::to_value(&node).unwrap_or_else(|_| unreachable!());
        assert_eq!(written["tag"], json!("email"));
        assert!(written.get("type").is_none());
    }

    #[test]
    fn legacy_type_discriminant_is_accepted() {
        let node = serde_json::from_value::<Node>(json!({
            "id": "agree",
            "type": "checkbox",
            "name": "agree",
            "single": true
        }))
        .unwrap_or_else(|_| unreachable!());

        assert_eq!(node.tag(), "checkbox");
        assert_eq!(node.kind().empty_value(), Some(json!(false)));
    }

    #[test]
    fn unknown_tag_keeps_raw_fields() {
        let raw = json!({
            "id": "sig",
            "tag": "signature-pad",
            "penColor": "blue"
        });
        let node = serde_json::from_value::<Node>(raw.clone()).unwrap_or_else(|_| unreachable!());

        assert!(matches!(node.kind(), NodeKind::Unknown(_)));
        assert_eq!(node.tag(), "signature-pad");
        assert_eq!(
            serde_json::to_value(&node).unwrap_or_else(|_| unreachable!()),
            raw
        );
    }

    #[test]
    fn type_beside_tag_is_kept_as_a_field() {
        let raw = json!({
            "id": "sig",
            "tag": "signature-pad",
            "type": "vector"
        });
        let node = serde_json::from_value::<Node>(raw.clone()).unwrap_or_else(|_| unreachable!());

        let NodeKind::Unknown(unknown) = node.kind() else {
            unreachable!()
        };
        assert_eq!(node.tag(), "signature-pad");
        assert_eq!(unknown.fields.get("type"), Some(&json!("vector")));
        assert_eq!(
            serde_json::to_value(&node).unwrap_or_else(|_| unreachable!()),
            raw
        );

        let known = serde_json::from_value::<Node>(json!({
            "id": "agree",
            "tag": "checkbox",
            "type": "toggle",
            "name": "agree"
        }))
        .unwrap_or_else(|_| unreachable!());
        assert_eq!(known.tag(), "checkbox");
    }

    #[test]
    fn malformed_known_tag_is_rejected() {
        let result = serde_json::from_value::<Node>(json!({
            "id": "broken",
            "tag": "modal",
            "content": []
        }));
        assert!(result.is_err());
    }

    #[test]
    fn missing_tag_is_rejected() {
        let result = serde_json::from_value::<Node>(json!({"id": "n1", "name": "x"}));
        assert!(result.is_err());
    }

    #[test]
    fn card_regions_follow_header_content_footer_order() {
        let node = serde_json::from_value::<Node>(json!({
            "id": "card",
            "tag": "card",
            "header": {"id": "title", "tag": "badge", "text": "New"},
            "content": [{"id": "name", "tag": "text", "name": "name"}],
            "footer": {"id": "save", "tag": "button", "label": "Save"}
        }))
        .unwrap_or_else(|_| unreachable!());

        let keys: Vec<String> = node
            .kind()
            .child_regions()
            .iter()
            .map(|region| region.key())
            .collect();
        assert_eq!(keys, vec!["header", "content", "footer"]);

        let mut visited = Vec::new();
        node.visit(&mut |node| visited.push(node.id().as_str()));
        assert_eq!(visited, vec!["card", "title", "name", "save"]);
    }

    #[test]
    fn tab_regions_are_scoped_by_tab_id() {
        let node = serde_json::from_value::<Node>(json!({
            "id": "tabs",
            "tag": "tabs",
            "tabs": [
                {"id": "personal", "label": "Personal", "content": []},
                {"id": "work", "label": "Work", "content": []}
            ]
        }))
        .unwrap_or_else(|_| unreachable!());

        let regions = node.kind().child_regions();
        assert_eq!(regions[0].key(), "tab:personal");
        assert_eq!(regions[1].label, Some("Work"));
        assert!(node.kind().is_container());
    }

    #[test]
    fn generated_ids_use_prefix() {
        let id = generate_node_id("field");
        assert!(id.starts_with("field-"));
        assert_ne!(id, generate_node_id("field"));
    }
}
