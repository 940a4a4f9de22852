#![allow(dead_code)]

use async_trait::async_trait;
use csv_financial_analyst::{
    AnalysisClient, AnalystConfig, InferenceError, InferenceRequest, InferenceService,
};
use std::sync::Mutex;
use std::time::Duration;

pub const ANALYSIS_JSON: &str = include_str!("../fixtures/analysis.json");

pub const CSV: &str = "date,outlet,category,description,amount\n\
2024-01-05,Downtown,Revenue,Sales,38000\n\
2024-01-31,Downtown,Expense,Payroll,12000\n\
2024-02-05,Harbour,Revenue,Sales,40000\n\
2024-02-28,Harbour,Expense,Rent,5000\n";

pub enum Reply {
    Text(String),
    Fail,
    Hang,
}

/// Deterministic stand-in for the remote model that records every request.
pub struct StubService {
    reply: Reply,
    requests: Mutex<Vec<InferenceRequest>>,
}

impl StubService {
    pub fn replying(text: impl Into<String>) -> Self {
        Self::new(Reply::Text(text.into()))
    }

    pub fn failing() -> Self {
        Self::new(Reply::Fail)
    }

    pub fn hanging() -> Self {
        Self::new(Reply::Hang)
    }

    fn new(reply: Reply) -> Self {
        Self {
            reply,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<InferenceRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn last_prompt(&self) -> String {
        self.requests()
            .last()
            .map(|r| r.prompt.clone())
            .expect("no request was sent")
    }
}

#[async_trait]
impl InferenceService for StubService {
    async fn generate(&self, request: &InferenceRequest) -> Result<String, InferenceError> {
        self.requests.lock().unwrap().push(request.clone());
        match &self.reply {
            Reply::Text(text) => Ok(text.clone()),
            Reply::Fail => Err(InferenceError::Status {
                status: 503,
                body: "upstream secret-detail unavailable".to_string(),
            }),
            Reply::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Err(InferenceError::Other("woke up".to_string()))
            }
        }
    }

    fn model_name(&self) -> &str {
        "stub-model"
    }
}

pub fn client_with(service: StubService) -> AnalysisClient<StubService> {
    AnalysisClient::with_service(service, AnalystConfig::new("test-key")).unwrap()
}
