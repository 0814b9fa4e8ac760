use crate::{GenerationOverrides, Result};
use async_trait::async_trait;

/// Something that turns a prompt into generated text.
///
/// [`crate::ProcessRunner`] is the production implementation; orchestration code depends
/// on this trait so it can be exercised without a model on disk.
#[async_trait]
pub trait InferenceEngine: Send + Sync {
    /// Successful results are never empty.
    async fn generate(&self, prompt: &str, overrides: GenerationOverrides) -> Result<String>;
}
