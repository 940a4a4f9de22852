use crate::error::{AnalystError, Result};
use crate::validation::ResponseValidation;
use std::time::Duration;

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_CURRENCY_CODE: &str = "USD";

/// Everything an [`crate::AnalysisClient`] needs, passed in explicitly.
#[derive(Debug, Clone)]
pub struct AnalystConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    /// Three-letter code prefixed to every monetary amount the model writes.
    pub currency_code: String,
    /// Upper bound on each remote call. `None` waits indefinitely.
    pub request_timeout: Option<Duration>,
    pub validation: ResponseValidation,
}

impl AnalystConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            currency_code: DEFAULT_CURRENCY_CODE.to_string(),
            request_timeout: None,
            validation: ResponseValidation::default(),
        }
    }

    /// Reads `GEMINI_API_KEY` (or `API_KEY`) plus the optional overrides
    /// `GEMINI_MODEL`, `GEMINI_BASE_URL`, `ANALYST_CURRENCY` and
    /// `ANALYST_TIMEOUT_SECS`.
    pub fn from_env() -> Result<Self> {
        let api_key = non_empty_var("GEMINI_API_KEY")
            .or_else(|| non_empty_var("API_KEY"))
            .ok_or_else(|| {
                AnalystError::Config("GEMINI_API_KEY (or API_KEY) is not set".to_string())
            })?;

        let mut config = Self::new(api_key);
        if let Some(model) = non_empty_var("GEMINI_MODEL") {
            config.model = model;
        }
        if let Some(base_url) = non_empty_var("GEMINI_BASE_URL") {
            config.base_url = base_url;
        }
        if let Some(code) = non_empty_var("ANALYST_CURRENCY") {
            config.currency_code = code;
        }
        if let Some(secs) = non_empty_var("ANALYST_TIMEOUT_SECS") {
            let secs: u64 = secs.parse().map_err(|_| {
                AnalystError::Config(format!("ANALYST_TIMEOUT_SECS must be a whole number, got '{}'", secs))
            })?;
            config.request_timeout = Some(Duration::from_secs(secs));
        }

        config.validate()?;
        Ok(config)
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_currency_code(mut self, code: impl Into<String>) -> Self {
        self.currency_code = code.into();
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    pub fn with_validation(mut self, validation: ResponseValidation) -> Self {
        self.validation = validation;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.api_key.trim().is_empty() {
            return Err(AnalystError::Config("API key is required".to_string()));
        }
        if self.model.trim().is_empty() {
            return Err(AnalystError::Config("model name must not be empty".to_string()));
        }
        let code = &self.currency_code;
        if code.len() != 3 || !code.chars().all(|c| c.is_ascii_uppercase()) {
            return Err(AnalystError::Config(format!(
                "currency code must be three uppercase letters, got '{}'",
                code
            )));
        }
        if self.request_timeout.is_some_and(|t| t.is_zero()) {
            return Err(AnalystError::Config("request timeout must be non-zero".to_string()));
        }
        Ok(())
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
