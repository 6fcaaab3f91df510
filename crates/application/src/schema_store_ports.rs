use async_trait::async_trait;
use formweave_core::AppResult;
use formweave_domain::FormSchema;

/// Persistence port for named form schemas.
#[async_trait]
pub trait SchemaStore: Send + Sync {
    /// Loads one schema by name.
    async fn load(&self, name: &str) -> AppResult<FormSchema>;

    /// Saves one schema, replacing any schema with the same name.
    async fn save(&self, name: &str, schema: &FormSchema) -> AppResult<()>;

    /// Lists stored schema names in ascending order.
    async fn list(&self) -> AppResult<Vec<String>>;
}
