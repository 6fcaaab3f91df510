//! Domain entities and invariants.

#![forbid(unsafe_code)]

mod condition;
mod diagnostics;
mod document;
mod node;
mod option;
mod schema;
mod validation_rule;

pub use condition::{Condition, ConditionOperator, LogicalMode};
pub use diagnostics::SchemaIssue;
pub use document::{DocumentErrors, DocumentValues, value_of};
pub use node::{
    AccordionNode, AccordionPanel, BadgeNode, BreadcrumbItem, BreadcrumbsNode, ButtonNode,
    CardNode, CheckboxNode, ChildRegion, ChipItem, ChipsNode, FieldProps, FileNode, GridNode,
    ModalNode, Node, NodeKind, NotificationNode, ProgressBarNode, RadioNode, SelectNode, StepItem,
    StepperNode, TabItem, TableColumn, TableNode, TablePagination, TabsNode, TextInputNode,
    TextInputType, TextareaNode, TooltipNode, UnknownNode, generate_node_id,
};
pub use option::{
    DEFAULT_OPTION_GROUP, HttpMethod, OptionSource, OptionValue, SelectOption, group_options,
};
pub use schema::{FormSchema, NodeSlot, RegionRef};
pub use validation_rule::{FieldPredicate, ValidationRule, ValidationRuleType};
