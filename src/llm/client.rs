use crate::config::AnalystConfig;
use crate::error::InferenceError;
use crate::llm::service::{InferenceRequest, InferenceService};
use crate::llm::types::*;
use async_trait::async_trait;
use log::debug;
use reqwest::Client;

const JSON_MIME_TYPE: &str = "application/json";

#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl GeminiClient {
    pub fn new(api_key: String, model: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key,
            base_url: crate::config::DEFAULT_BASE_URL.to_string(),
            model: model.into(),
        }
    }

    pub fn from_config(config: &AnalystConfig) -> Self {
        Self::new(config.api_key.clone(), config.model.clone()).with_base_url(&config.base_url)
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub(crate) async fn generate_content(
        &self,
        request: &InferenceRequest,
    ) -> Result<String, InferenceError> {
        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);

        let payload = GenerateContentRequest {
            contents: vec![Content::user(request.prompt.clone())],
            generation_config: GenerationConfig {
                temperature: request.params.temperature,
                response_mime_type: request
                    .params
                    .json_response
                    .then(|| JSON_MIME_TYPE.to_string()),
                response_schema: request.response_schema.clone(),
            },
        };

        debug!(
            "POST {} ({} prompt chars, schema: {})",
            url,
            request.prompt.len(),
            request.response_schema.is_some()
        );

        let res = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&payload)
            .send()
            .await?;
        let status = res.status();

        if !status.is_success() {
            let err_text = res.text().await?;
            return Err(InferenceError::Status {
                status: status.as_u16(),
                body: err_text,
            });
        }

        let body: GenerateContentResponse = res.json().await?;

        if let Some(reason) = body
            .prompt_feedback
            .as_ref()
            .and_then(|f| f.block_reason.clone())
        {
            return Err(InferenceError::Blocked(reason));
        }

        body.first_text().ok_or_else(|| {
            let finish = body
                .candidates
                .as_ref()
                .and_then(|c| c.first())
                .and_then(|c| c.finish_reason.clone())
                .unwrap_or_else(|| "no candidates returned".to_string());
            InferenceError::EmptyResponse(finish)
        })
    }
}

#[async_trait]
impl InferenceService for GeminiClient {
    async fn generate(&self, request: &InferenceRequest) -> Result<String, InferenceError> {
        self.generate_content(request).await
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

impl std::fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiClient")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_config() {
        let config = AnalystConfig::new("secret")
            .with_model("gemini-2.5-pro")
            .with_base_url("http://localhost:9999/v1beta/");
        let client = GeminiClient::from_config(&config);

        assert_eq!(client.model_name(), "gemini-2.5-pro");
        assert_eq!(client.base_url, "http://localhost:9999/v1beta");
    }

    #[test]
    fn test_debug_hides_key() {
        let client = GeminiClient::new("secret".to_string(), "gemini-2.5-flash");
        assert!(!format!("{:?}", client).contains("secret"));
    }
}
