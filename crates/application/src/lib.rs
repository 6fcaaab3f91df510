//! Application services and ports.

#![forbid(unsafe_code)]

mod document_state_store;
mod field_validator;
mod form_assembler;
mod form_ports;
mod option_source_ports;
mod option_source_service;
mod rule_evaluator;
mod schema_generation;
mod schema_store_ports;
mod tree_renderer;
mod value_coercion;

pub use document_state_store::{DocumentSnapshot, DocumentStateStore, SubmitOutcome};
pub use field_validator::{FieldRules, validate_document, validate_value};
pub use form_assembler::{
    AssembledForm, FormAssembler, RenderedForm, collect_field_rules, seed_values,
};
pub use form_ports::SubmitHandler;
pub use option_source_ports::{OptionSourceCache, OptionSourceFetcher};
pub use option_source_service::{DEFAULT_OPTION_CACHE_TTL_SECONDS, OptionSourceService};
pub use rule_evaluator::{evaluate_condition, is_visible};
pub use schema_generation::{
    ColumnConstraints, ColumnMapping, ColumnSchema, FormGenerationConfig, SubmitAction,
    column_validation_rules, generate_form_schema,
};
pub use schema_store_ports::SchemaStore;
pub use tree_renderer::{
    RenderedField, RenderedNode, RenderedRegion, TreeRenderer, WidgetKind, render, rendered_ids,
};
