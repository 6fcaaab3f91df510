//! Formweave command-line composition root.

#![forbid(unsafe_code)]

mod cli_config;

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use formweave_application::{
    FormAssembler, FormGenerationConfig, OptionSourceService, SchemaStore, SubmitHandler,
    generate_form_schema,
};
use formweave_core::{AppError, AppResult};
use formweave_domain::DocumentValues;
use formweave_infrastructure::{
    InMemoryOptionSourceCache, JsonFileSchemaStore, StaticOptionSourceFetcher,
};
use serde_json::json;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::cli_config::{CliCommand, CliConfig};

struct LoggingSubmitHandler;

#[async_trait]
impl SubmitHandler for LoggingSubmitHandler {
    async fn submit(&self, values: DocumentValues) -> AppResult<()> {
        info!(field_count = values.len(), "form values submitted");
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = CliConfig::load()?;
    match &config.command {
        CliCommand::Render { schema_path } => render(&config, schema_path).await,
        CliCommand::Generate { config_path } => generate(config_path).await,
        CliCommand::List { schema_dir } => list(schema_dir).await,
    }
}

async fn render(config: &CliConfig, schema_path: &Path) -> AppResult<()> {
    let (store, name) = schema_store_for(schema_path)?;
    let mut schema = store.load(&name).await?;

    if let Some(values_path) = &config.values_path {
        let overrides: DocumentValues = serde_json::from_str(&read_file(values_path).await?)?;
        let mut values = schema.initial_values().cloned().unwrap_or_default();
        values.extend(overrides);
        schema = schema.with_initial_values(values);
    }

    let fetcher = match &config.option_rows_path {
        Some(path) => StaticOptionSourceFetcher::from_json(&read_file(path).await?)?,
        None => StaticOptionSourceFetcher::new(),
    };
    let option_service = OptionSourceService::new(Arc::new(fetcher)).with_cache(
        Arc::new(InMemoryOptionSourceCache::new()),
        config.option_cache_ttl_seconds,
    );
    let options = option_service.resolve_schema_options(&schema).await;

    let form = FormAssembler::new(schema)
        .with_submit_handler(Arc::new(LoggingSubmitHandler))
        .assemble();

    let submit_outcome = if config.submit {
        let outcome = form.submit().await;
        info!(?outcome, "submit pass finished");
        Some(outcome)
    } else {
        None
    };

    let output = json!({
        "form": form.render(),
        "options": options,
        "submitOutcome": submit_outcome,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

async fn generate(config_path: &Path) -> AppResult<()> {
    let config: FormGenerationConfig = serde_json::from_str(&read_file(config_path).await?)?;
    let schema = generate_form_schema(&config)?;

    for issue in schema.diagnostics() {
        warn!(issue = %issue, "generated schema issue");
    }

    println!("{}", schema.to_pretty_json()?);
    Ok(())
}

async fn list(schema_dir: &Path) -> AppResult<()> {
    let store = JsonFileSchemaStore::new(schema_dir);
    for name in store.list().await? {
        println!("{name}");
    }
    Ok(())
}

fn schema_store_for(schema_path: &Path) -> AppResult<(JsonFileSchemaStore, String)> {
    if schema_path.extension().and_then(|extension| extension.to_str()) != Some("json") {
        return Err(AppError::Validation(format!(
            "schema file '{}' must have a .json extension",
            schema_path.display()
        )));
    }

    let name = schema_path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .map(ToOwned::to_owned)
        .ok_or_else(|| {
            AppError::Validation(format!(
                "schema file '{}' has no usable name",
                schema_path.display()
            ))
        })?;
    let root = schema_path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));

    Ok((JsonFileSchemaStore::new(root), name))
}

async fn read_file(path: &Path) -> AppResult<String> {
    tokio::fs::read_to_string(path).await.map_err(|error| {
        AppError::Validation(format!("failed to read '{}': {error}", path.display()))
    })
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .with_writer(std::io::stderr)
        .init();
}
