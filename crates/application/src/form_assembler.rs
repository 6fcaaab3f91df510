use std::sync::Arc;

use async_trait::async_trait;
use formweave_core::AppResult;
use formweave_domain::{DocumentErrors, DocumentValues, FormSchema};
use serde::Serialize;
use serde_json::Value;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::document_state_store::{DocumentStateStore, SubmitOutcome};
use crate::field_validator::FieldRules;
use crate::form_ports::SubmitHandler;
use crate::tree_renderer::{RenderedNode, TreeRenderer};

/// Builds a live form from a schema.
#[derive(Clone)]
pub struct FormAssembler {
    schema: FormSchema,
    submit_handler: Option<Arc<dyn SubmitHandler>>,
}

impl FormAssembler {
    /// Creates an assembler without a submit handler.
    #[must_use]
    pub fn new(schema: FormSchema) -> Self {
        Self {
            schema,
            submit_handler: None,
        }
    }

    /// Adds the handler receiving values after a passing validation.
    #[must_use]
    pub fn with_submit_handler(mut self, submit_handler: Arc<dyn SubmitHandler>) -> Self {
        self.submit_handler = Some(submit_handler);
        self
    }

    /// Collects field rules, seeds document values and returns the live form.
    #[must_use]
    pub fn assemble(self) -> AssembledForm {
        for issue in self.schema.diagnostics() {
            warn!(issue = %issue, "schema issue");
        }

        let field_rules = collect_field_rules(&self.schema);
        let values = seed_values(&self.schema);
        info!(
            title = self.schema.title().unwrap_or_default(),
            fields = values.len(),
            validated_fields = field_rules.len(),
            "form assembled"
        );

        AssembledForm {
            store: Arc::new(DocumentStateStore::new(values)),
            schema: self.schema,
            field_rules,
            submit_handler: self
                .submit_handler
                .unwrap_or_else(|| Arc::new(DiscardingSubmitHandler)),
        }
    }
}

/// Rules per binding key for every field node carrying validation rules.
///
/// When several nodes bind one key, the last node in walk order wins.
#[must_use]
pub fn collect_field_rules(schema: &FormSchema) -> FieldRules {
    schema
        .walk()
        .into_iter()
        .filter_map(|node| {
            let key = node.binding_key()?;
            let rules = node.validation_rules();
            (!rules.is_empty()).then(|| (key.to_owned(), rules.to_vec()))
        })
        .collect()
}

/// Declared initial values, completed with each field's default or empty value.
#[must_use]
pub fn seed_values(schema: &FormSchema) -> DocumentValues {
    let mut values = schema.initial_values().cloned().unwrap_or_default();
    for node in schema.walk() {
        let (Some(field), Some(empty)) = (node.kind().field_props(), node.kind().empty_value())
        else {
            continue;
        };

        values
            .entry(field.name.as_str().to_owned())
            .or_insert_with(|| field.value.clone().unwrap_or(empty));
    }
    values
}

/// Snapshot of a form ready for a host to draw.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderedForm {
    /// Form title.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Form description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Visible nodes.
    pub nodes: Vec<RenderedNode>,
    /// Current errors.
    pub errors: DocumentErrors,
    /// Whether a submission is in flight.
    pub is_submitting: bool,
    /// Store revision this snapshot was taken at.
    pub revision: u64,
}

/// Live form bound to one document state store.
pub struct AssembledForm {
    schema: FormSchema,
    field_rules: FieldRules,
    store: Arc<DocumentStateStore>,
    submit_handler: Arc<dyn SubmitHandler>,
}

impl AssembledForm {
    /// Returns the schema.
    #[must_use]
    pub fn schema(&self) -> &FormSchema {
        &self.schema
    }

    /// Returns collected field rules.
    #[must_use]
    pub fn field_rules(&self) -> &FieldRules {
        &self.field_rules
    }

    /// Returns the backing store.
    #[must_use]
    pub fn store(&self) -> &Arc<DocumentStateStore> {
        &self.store
    }

    /// Renders the schema against the current values and errors.
    #[must_use]
    pub fn render(&self) -> RenderedForm {
        let snapshot = self.store.snapshot();
        let nodes =
            TreeRenderer::new(&snapshot.values, &snapshot.errors).render(self.schema.nodes());

        RenderedForm {
            title: self.schema.title().map(str::to_owned),
            description: self.schema.description().map(str::to_owned),
            nodes,
            errors: snapshot.errors,
            is_submitting: snapshot.is_submitting,
            revision: snapshot.revision,
        }
    }

    /// Writes one value.
    pub fn update_field(&self, key: &str, value: Value) {
        self.store.update_field(key, value);
    }

    /// Validates one field against its collected rules.
    pub fn validate_field(&self, key: &str) -> Option<String> {
        self.store.validate_field(key, &self.field_rules)
    }

    /// Validates and submits. Handler failures are logged, never propagated.
    pub async fn submit(&self) -> SubmitOutcome {
        match self
            .store
            .submit(&self.field_rules, self.submit_handler.as_ref())
            .await
        {
            Ok(outcome) => outcome,
            Err(error) => {
                error!(error = %error, "submit handler failed");
                SubmitOutcome::HandlerFailed
            }
        }
    }

    /// Subscribes to value and error changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.store.subscribe()
    }
}

struct DiscardingSubmitHandler;

#[async_trait]
impl SubmitHandler for DiscardingSubmitHandler {
    async fn submit(&self, values: DocumentValues) -> AppResult<()> {
        debug!(fields = values.len(), "no submit handler configured");
        Ok(())
    }
}
