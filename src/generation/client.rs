use crate::error::{AppError, AppResult};
use anyhow::Result;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, error};

/// One structured-generation call
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    /// Short label used in logs and error messages
    pub name: &'static str,

    /// Fixed system instruction for this template
    pub system: String,

    /// Rendered user prompt
    pub prompt: String,

    /// Output schema the response must conform to
    pub schema: Value,
}

/// Structured generation backend trait
///
/// Implementations:
/// - `GeminiClient`: Gemini `generateContent` with a response schema
/// - Test doubles returning canned JSON
#[async_trait::async_trait]
pub trait StructuredGenerator: Send + Sync {
    /// Run the request and return the raw JSON object produced by the model
    async fn generate(&self, request: &GenerationRequest) -> Result<Value>;

    /// Backend name for logging
    fn name(&self) -> &str;
}

/// Run a request and decode the output into `T`.
///
/// Output that does not match `T` is an external-service failure, never a
/// partially populated value.
pub async fn generate_object<T: DeserializeOwned>(
    generator: &dyn StructuredGenerator,
    request: &GenerationRequest,
) -> AppResult<T> {
    debug!(
        "Requesting {} from {} (prompt {} chars)",
        request.name,
        generator.name(),
        request.prompt.len()
    );

    let value = generator.generate(request).await.map_err(|e| {
        error!("Generation of {} failed: {:#}", request.name, e);
        AppError::external("generation", e)
    })?;

    serde_json::from_value(value).map_err(|e| {
        error!("Generated {} does not match schema: {}", request.name, e);
        AppError::ExternalService {
            service: "generation",
            message: format!("{} does not match the requested schema: {}", request.name, e),
        }
    })
}
