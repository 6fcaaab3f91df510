use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use formweave_application::SchemaStore;
use formweave_core::{AppError, AppResult};
use formweave_domain::FormSchema;
use tracing::{debug, info};

const SCHEMA_FILE_EXTENSION: &str = "json";

/// Schema store keeping one pretty-printed JSON file per schema under a root directory.
#[derive(Debug, Clone)]
pub struct JsonFileSchemaStore {
    root: PathBuf,
}

impl JsonFileSchemaStore {
    /// Creates a store rooted at `root`. The directory is created on first save.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Returns the root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn schema_path(&self, name: &str) -> AppResult<PathBuf> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::Validation(
                "schema name must not be empty".to_owned(),
            ));
        }
        if name.starts_with('.') || name.contains(['/', '\\']) {
            return Err(AppError::Validation(format!(
                "schema name '{name}' must not contain path separators or start with a dot"
            )));
        }

        Ok(self
            .root
            .join(format!("{name}.{SCHEMA_FILE_EXTENSION}")))
    }
}

#[async_trait]
impl SchemaStore for JsonFileSchemaStore {
    async fn load(&self, name: &str) -> AppResult<FormSchema> {
        let path = self.schema_path(name)?;
        let raw = tokio::fs::read_to_string(&path)
            .await
            .map_err(|error| match error.kind() {
                ErrorKind::NotFound => AppError::NotFound(format!("schema '{name}' not found")),
                _ => AppError::Internal(format!(
                    "failed to read schema '{}': {error}",
                    path.display()
                )),
            })?;

        debug!(path = %path.display(), "schema loaded");
        FormSchema::from_json(&raw)
    }

    async fn save(&self, name: &str, schema: &FormSchema) -> AppResult<()> {
        let path = self.schema_path(name)?;
        let payload = schema.to_pretty_json()?;

        tokio::fs::create_dir_all(&self.root).await.map_err(|error| {
            AppError::Internal(format!(
                "failed to create schema directory '{}': {error}",
                self.root.display()
            ))
        })?;
        tokio::fs::write(&path, payload).await.map_err(|error| {
            AppError::Internal(format!(
                "failed to write schema '{}': {error}",
                path.display()
            ))
        })?;

        info!(path = %path.display(), "schema saved");
        Ok(())
    }

    async fn list(&self) -> AppResult<Vec<String>> {
        let mut entries = match tokio::fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(error) if error.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(error) => {
                return Err(AppError::Internal(format!(
                    "failed to list schemas in '{}': {error}",
                    self.root.display()
                )));
            }
        };

        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(|error| {
            AppError::Internal(format!(
                "failed to list schemas in '{}': {error}",
                self.root.display()
            ))
        })? {
            let path = entry.path();
            if path.extension().and_then(|extension| extension.to_str())
                != Some(SCHEMA_FILE_EXTENSION)
            {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) {
                names.push(stem.to_owned());
            }
        }

        names.sort();
        Ok(names)
    }
}
