use crate::config::AnalystConfig;
use crate::error::{
    AnalystError, FailureKind, InferenceError, ResponseError, Result, ShapeViolation,
};
use crate::llm::client::GeminiClient;
use crate::llm::prompts;
use crate::llm::service::{InferenceRequest, InferenceService};
use crate::schema::FinancialAnalysis;
use crate::validation::{advisory_warnings, validate_against_schema, ResponseValidation};
use log::{debug, error, info, warn};
use serde_json::Value;

const ANALYSIS_TEMPERATURE: f32 = 0.1;
const OUTLETS_TEMPERATURE: f32 = 0.0;

/// Turns CSV transaction data into reports, forecasts and answers by
/// delegating all of the financial reasoning to a remote model.
///
/// Each operation is a single independent request. The client keeps no state
/// between calls, so one instance can serve any number of concurrent callers.
pub struct AnalysisClient<S = GeminiClient> {
    service: S,
    config: AnalystConfig,
    analysis_schema: Value,
}

impl AnalysisClient<GeminiClient> {
    /// Builds a client backed by the Gemini REST API.
    ///
    /// Fails immediately if the configuration has no API key.
    pub fn new(config: AnalystConfig) -> Result<Self> {
        config.validate()?;
        let service = GeminiClient::from_config(&config);
        Self::with_service(service, config)
    }

    pub fn from_env() -> Result<Self> {
        Self::new(AnalystConfig::from_env()?)
    }
}

impl<S: InferenceService> AnalysisClient<S> {
    /// Builds a client on top of any inference backend.
    pub fn with_service(service: S, config: AnalystConfig) -> Result<Self> {
        config.validate()?;
        let schema = FinancialAnalysis::response_schema().map_err(|e| {
            AnalystError::Config(format!("could not build the analysis response schema: {}", e))
        })?;

        Ok(Self {
            service,
            config,
            analysis_schema: schema,
        })
    }

    pub fn config(&self) -> &AnalystConfig {
        &self.config
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    /// The schema sent with every analysis request.
    pub fn analysis_schema(&self) -> &Value {
        &self.analysis_schema
    }

    /// Full report: statements, ratios, charts and commentary.
    ///
    /// With `outlet`, the model is told to restrict everything to that outlet;
    /// otherwise it reports on all outlets combined.
    pub async fn analyze_financial_data(
        &self,
        csv_data: &str,
        outlet: Option<&str>,
    ) -> Result<FinancialAnalysis> {
        let outlet = outlet.map(str::trim).filter(|o| !o.is_empty());
        info!(
            "Running financial analysis ({} CSV bytes, scope: {})",
            csv_data.len(),
            outlet.unwrap_or("all outlets")
        );

        self.try_analyze(csv_data, outlet)
            .await
            .map_err(|e| fail("Financial analysis", e, |kind| AnalystError::AnalysisFailed { kind }))
    }

    /// Short plain-text projection under the given growth assumptions.
    /// Percentages are signed, e.g. `-3.0` for a 3% decline.
    pub async fn get_updated_forecast(
        &self,
        csv_data: &str,
        revenue_growth_pct: f64,
        expense_growth_pct: f64,
    ) -> Result<String> {
        info!(
            "Updating forecast (revenue {:+}%, expenses {:+}%)",
            revenue_growth_pct, expense_growth_pct
        );

        self.try_forecast(csv_data, revenue_growth_pct, expense_growth_pct)
            .await
            .map_err(|e| fail("Forecast update", e, |kind| AnalystError::ForecastFailed { kind }))
    }

    /// Distinct outlet names found in the data, or an empty list.
    ///
    /// Never fails: outlet detection is optional, so any transport or parse
    /// problem is logged and reported as "no outlets".
    pub async fn get_outlets(&self, csv_data: &str) -> Vec<String> {
        match self.try_outlets(csv_data).await {
            Ok(outlets) => {
                info!("Detected {} outlet(s)", outlets.len());
                outlets
            }
            Err(e) => {
                warn!("Outlet detection failed ({}), treating as no outlets: {}", e.kind(), e);
                Vec::new()
            }
        }
    }

    /// Free-form question answered strictly from the CSV content.
    pub async fn query_data(&self, csv_data: &str, query: &str) -> Result<String> {
        info!("Answering data query ({} chars)", query.len());

        self.try_query(csv_data, query)
            .await
            .map_err(|e| fail("Data query", e, |kind| AnalystError::QueryFailed { kind }))
    }

    async fn try_analyze(
        &self,
        csv_data: &str,
        outlet: Option<&str>,
    ) -> std::result::Result<FinancialAnalysis, ResponseError> {
        require_csv(csv_data)?;

        let request = InferenceRequest::new(prompts::analysis_prompt(
            csv_data,
            outlet,
            &self.config.currency_code,
        ))
        .with_schema(self.analysis_schema.clone())
        .temperature(ANALYSIS_TEMPERATURE);

        let raw = self.dispatch(&request).await?;
        let analysis = self.decode_analysis(&raw)?;

        for warning in advisory_warnings(&analysis) {
            warn!("Analysis response: {}", warning);
        }
        Ok(analysis)
    }

    async fn try_forecast(
        &self,
        csv_data: &str,
        revenue_growth_pct: f64,
        expense_growth_pct: f64,
    ) -> std::result::Result<String, ResponseError> {
        require_csv(csv_data)?;
        if !revenue_growth_pct.is_finite() || !expense_growth_pct.is_finite() {
            return Err(ResponseError::InvalidInput(
                "growth percentages must be finite numbers".to_string(),
            ));
        }

        let request = InferenceRequest::new(prompts::forecast_prompt(
            csv_data,
            revenue_growth_pct,
            expense_growth_pct,
            &self.config.currency_code,
        ));
        let raw = self.dispatch(&request).await?;
        Ok(raw.trim().to_string())
    }

    async fn try_outlets(&self, csv_data: &str) -> std::result::Result<Vec<String>, ResponseError> {
        require_csv(csv_data)?;

        let request = InferenceRequest::new(prompts::outlets_prompt(csv_data))
            .json()
            .temperature(OUTLETS_TEMPERATURE);
        let raw = self.dispatch(&request).await?;
        parse_outlets(&raw)
    }

    async fn try_query(&self, csv_data: &str, query: &str) -> std::result::Result<String, ResponseError> {
        require_csv(csv_data)?;
        if query.trim().is_empty() {
            return Err(ResponseError::InvalidInput("query is empty".to_string()));
        }

        let request = InferenceRequest::new(prompts::query_prompt(
            csv_data,
            query,
            &self.config.currency_code,
        ));
        let raw = self.dispatch(&request).await?;
        Ok(raw.trim().to_string())
    }

    /// Sends one request, bounded by the configured timeout if there is one.
    async fn dispatch(&self, request: &InferenceRequest) -> std::result::Result<String, ResponseError> {
        debug!(
            "Sending request to {} (json: {}, temperature: {:?})",
            self.service.model_name(),
            request.params.json_response,
            request.params.temperature
        );

        let raw = match self.config.request_timeout {
            Some(limit) => tokio::time::timeout(limit, self.service.generate(request))
                .await
                .map_err(|_| InferenceError::Timeout(limit))??,
            None => self.service.generate(request).await?,
        };

        debug!("Received {} response chars", raw.len());
        Ok(raw)
    }

    fn decode_analysis(&self, raw: &str) -> std::result::Result<FinancialAnalysis, ResponseError> {
        let value: Value = serde_json::from_str(strip_code_fence(raw))?;

        if self.config.validation == ResponseValidation::Strict {
            let violations = validate_against_schema(&self.analysis_schema, &value);
            if !violations.is_empty() {
                return Err(ResponseError::Shape(violations));
            }
        }

        serde_json::from_value(value).map_err(|e| {
            ResponseError::Shape(vec![ShapeViolation {
                path: "$".to_string(),
                problem: e.to_string(),
            }])
        })
    }
}

/// Logs the full cause, then hands back only the opaque operation error.
fn fail(
    operation: &str,
    cause: ResponseError,
    wrap: impl FnOnce(FailureKind) -> AnalystError,
) -> AnalystError {
    let kind = cause.kind();
    error!("{} failed ({}): {}", operation, kind, cause);
    wrap(kind)
}

fn require_csv(csv_data: &str) -> std::result::Result<(), ResponseError> {
    if csv_data.trim().is_empty() {
        return Err(ResponseError::InvalidInput("CSV data is empty".to_string()));
    }
    Ok(())
}

/// Accepts only a JSON array made entirely of strings.
pub(crate) fn parse_outlets(raw: &str) -> std::result::Result<Vec<String>, ResponseError> {
    let value: Value = serde_json::from_str(strip_code_fence(raw))?;
    let Value::Array(items) = value else {
        return Err(ResponseError::Shape(vec![ShapeViolation {
            path: "$".to_string(),
            problem: "expected an array of outlet names".to_string(),
        }]));
    };

    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| match item {
            Value::String(name) => Ok(name),
            _ => Err(ResponseError::Shape(vec![ShapeViolation {
                path: format!("$[{}]", index),
                problem: "outlet name is not a string".to_string(),
            }])),
        })
        .collect()
}

/// Removes a surrounding Markdown code fence such as ```` ```json ... ``` ````.
pub(crate) fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let Some(body) = rest.strip_suffix("```") else {
        return trimmed;
    };
    // Drop the info string ("json") on the opening line.
    match body.split_once('\n') {
        Some((_, inner)) => inner.trim(),
        None => body.trim(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_code_fence() {
        assert_eq!(strip_code_fence("```json\n[\"A\"]\n```"), "[\"A\"]");
        assert_eq!(strip_code_fence("```\n{}\n```"), "{}");
        assert_eq!(strip_code_fence("  [1, 2]  "), "[1, 2]");
        assert_eq!(strip_code_fence("```json"), "```json");
    }

    #[test]
    fn test_parse_outlets() {
        let outlets = parse_outlets(r#"["Outlet A", "Outlet B"]"#).unwrap();
        assert_eq!(outlets, vec!["Outlet A", "Outlet B"]);

        assert!(parse_outlets("[]").unwrap().is_empty());
        assert_eq!(parse_outlets("not json").unwrap_err().kind(), FailureKind::Parse);
        assert_eq!(parse_outlets(r#"{"outlets": []}"#).unwrap_err().kind(), FailureKind::Shape);

        let err = parse_outlets(r#"["A", 2]"#).unwrap_err();
        match err {
            ResponseError::Shape(v) => assert_eq!(v[0].path, "$[1]"),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_require_csv() {
        assert!(require_csv("a,b\n1,2").is_ok());
        assert_eq!(require_csv(" \n ").unwrap_err().kind(), FailureKind::InvalidInput);
    }
}
