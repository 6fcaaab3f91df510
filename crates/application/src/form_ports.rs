use async_trait::async_trait;
use formweave_core::AppResult;
use formweave_domain::DocumentValues;

/// Caller-supplied receiver of validated document values.
#[async_trait]
pub trait SubmitHandler: Send + Sync {
    /// Receives a snapshot of the document values after a passing validation.
    async fn submit(&self, values: DocumentValues) -> AppResult<()>;
}
