use crate::error::InferenceError;
use async_trait::async_trait;
use serde_json::Value;

/// Sampling knobs for a single request.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GenerationParams {
    pub temperature: Option<f32>,
    /// Ask the service to answer with `application/json`.
    pub json_response: bool,
}

/// Prompt text, an optional response schema and the generation settings.
#[derive(Debug, Clone, PartialEq)]
pub struct InferenceRequest {
    pub prompt: String,
    pub response_schema: Option<Value>,
    pub params: GenerationParams,
}

impl InferenceRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            response_schema: None,
            params: GenerationParams::default(),
        }
    }

    /// Constrains the output to `schema`. Implies a JSON response.
    pub fn with_schema(mut self, schema: Value) -> Self {
        self.response_schema = Some(schema);
        self.params.json_response = true;
        self
    }

    pub fn json(mut self) -> Self {
        self.params.json_response = true;
        self
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.params.temperature = Some(temperature);
        self
    }
}

/// The remote model, seen as text (plus optional schema) in, text out.
///
/// Implementations must be safe to share between concurrent calls.
#[async_trait]
pub trait InferenceService: Send + Sync {
    async fn generate(&self, request: &InferenceRequest) -> Result<String, InferenceError>;

    fn model_name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_schema_implies_json() {
        let request = InferenceRequest::new("prompt")
            .with_schema(json!({ "type": "OBJECT" }))
            .temperature(0.1);

        assert!(request.params.json_response);
        assert_eq!(request.params.temperature, Some(0.1));
        assert!(request.response_schema.is_some());
    }

    #[test]
    fn test_plain_request_defaults() {
        let request = InferenceRequest::new("prompt");
        assert_eq!(request.params, GenerationParams::default());
        assert!(request.response_schema.is_none());
    }
}
